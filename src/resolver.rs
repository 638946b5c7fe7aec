use std::collections::HashMap;

use crate::{
    baike,
    catalog::Celebrity,
    config::{Config, WikiRef},
    error::AssetResult,
    http::Fetch,
    source::{self, Source},
    wikipedia,
};

async fn fetch_fallback<F: Fetch>(
    fetcher: &F,
    celebrity: &Celebrity,
    fallback_url: &str,
) -> AssetResult<Source> {
    match wikipedia::wiki_ref_from_url(fallback_url, &celebrity.wiki_title) {
        Some(wiki) => wikipedia::fetch_source(fetcher, &wiki).await,
        None => source::fetch_page_source(fetcher, fallback_url).await,
    }
}

/// first usable source for a celebrity, or the error of the last lookup tried
pub async fn resolve<F: Fetch>(
    fetcher: &F,
    celebrity: &Celebrity,
    fallbacks: &HashMap<String, String>,
    cfg: &Config,
) -> AssetResult<Source> {
    let name = celebrity.name.as_str();

    if cfg.is_baike_preferred(name) {
        match baike::fetch_source(fetcher, name).await {
            Ok(source) => return Ok(source),
            Err(e) => log::debug!("Preferred Baike lookup for {} failed: {}", name, e),
        }
    }

    if let Some(wiki) = cfg.wiki_overrides.get(name) {
        match wikipedia::fetch_source(fetcher, wiki).await {
            Ok(source) => return Ok(source),
            Err(e) => log::debug!("Wikipedia override for {} failed: {}", name, e),
        }
    }

    let own = WikiRef {
        lang: celebrity.wiki_lang.clone(),
        title: celebrity.wiki_title.clone(),
    };
    match wikipedia::fetch_source(fetcher, &own).await {
        Ok(source) => return Ok(source),
        Err(e) => log::debug!("Wikipedia lookup for {} failed: {}", name, e),
    }

    if let Some(fallback_url) = fallbacks.get(name) {
        match fetch_fallback(fetcher, celebrity, fallback_url).await {
            Ok(source) => return Ok(source),
            Err(e) => log::debug!("Fallback {} for {} failed: {}", fallback_url, name, e),
        }
    }

    // the Baike lookup always runs last, so its error is the one reported
    baike::fetch_source(fetcher, name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::FakeFetcher;

    const YAO_SUMMARY: &str = r#"{ "originalimage": { "source": "https://upload.wikimedia.org/yao.jpg" } }"#;

    fn celebrity(name: &str, lang: &str, title: &str) -> Celebrity {
        Celebrity {
            name: name.to_string(),
            wiki_lang: lang.to_string(),
            wiki_title: title.to_string(),
        }
    }

    fn card(name: &str) -> String {
        baike::lemma_card_url(name).unwrap().to_string()
    }

    #[tokio::test]
    async fn test_own_wikipedia_page() {
        let fetcher = FakeFetcher::default().with(
            "https://en.wikipedia.org/api/rest_v1/page/summary/Yao_Ming",
            200,
            YAO_SUMMARY,
        );
        let source = resolve(
            &fetcher,
            &celebrity("Yao Ming", "en", "Yao_Ming"),
            &HashMap::new(),
            &Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(source.provider, "EN Wikipedia");
        assert!(!fetcher.requested(&card("Yao Ming")));
    }

    #[tokio::test]
    async fn test_preferred_baike_comes_first() {
        let fetcher = FakeFetcher::default()
            .with(
                &card("张耀"),
                200,
                r#"{ "url": "https://baike.baidu.com/item/x", "image": "https://bkimg.cdn.bcebos.com/z" }"#,
            )
            .with(
                "https://zh.wikipedia.org/api/rest_v1/page/summary/Zhang",
                200,
                YAO_SUMMARY,
            );
        let source = resolve(
            &fetcher,
            &celebrity("张耀", "zh", "Zhang"),
            &HashMap::new(),
            &Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(source.provider, "Baidu Baike");
        assert!(!fetcher.requested("https://zh.wikipedia.org/api/rest_v1/page/summary/Zhang"));
    }

    #[tokio::test]
    async fn test_override_precedes_own_page() {
        let fetcher = FakeFetcher::default().with(
            "https://en.wikipedia.org/api/rest_v1/page/summary/Lee_Jeno",
            200,
            r#"{ "thumbnail": { "source": "https://upload.wikimedia.org/jeno.jpg" } }"#,
        );
        let source = resolve(
            &fetcher,
            &celebrity("李在玟", "zh", "Li"),
            &HashMap::new(),
            &Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(source.image_url, "https://upload.wikimedia.org/jeno.jpg");
        assert_eq!(source.provider, "EN Wikipedia");
    }

    #[tokio::test]
    async fn test_wikipedia_fallback_url_is_looked_up_by_title() {
        let fetcher = FakeFetcher::default().with(
            "https://ko.wikipedia.org/api/rest_v1/page/summary/%EC%A0%9C%EB%85%B8",
            200,
            YAO_SUMMARY,
        );
        let fallbacks = HashMap::from([(
            "Jeno".to_string(),
            "https://ko.wikipedia.org/wiki/%EC%A0%9C%EB%85%B8".to_string(),
        )]);
        let source = resolve(
            &fetcher,
            &celebrity("Jeno", "en", "Missing"),
            &fallbacks,
            &Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(source.provider, "KO Wikipedia");
    }

    #[tokio::test]
    async fn test_generic_fallback_then_baike() {
        let fallbacks = HashMap::from([(
            "Someone".to_string(),
            "https://www.imdb.com/name/nm1".to_string(),
        )]);

        let fetcher = FakeFetcher::default().with(
            "https://www.imdb.com/name/nm1",
            200,
            r#"<meta property="og:image" content="https://m.media-amazon.com/p.jpg">"#,
        );
        let source = resolve(
            &fetcher,
            &celebrity("Someone", "en", "Missing"),
            &fallbacks,
            &Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(source.provider, "www.imdb.com");

        let fetcher = FakeFetcher::default().with(
            &card("Someone"),
            200,
            r#"{ "url": "https://baike.baidu.com/item/s", "image": "https://bkimg.cdn.bcebos.com/s" }"#,
        );
        let source = resolve(
            &fetcher,
            &celebrity("Someone", "en", "Missing"),
            &fallbacks,
            &Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(source.provider, "Baidu Baike");
        assert!(fetcher.requested("https://www.imdb.com/name/nm1"));
    }

    #[tokio::test]
    async fn test_last_error_is_returned() {
        let fetcher = FakeFetcher::default();
        let error = resolve(
            &fetcher,
            &celebrity("Nobody", "en", "Nobody"),
            &HashMap::new(),
            &Config::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(error.to_string(), "Baidu Baike API HTTP 404");
    }
}
