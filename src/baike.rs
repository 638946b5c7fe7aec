use reqwest::Url;
use serde::Deserialize;

use crate::{
    error::{AssetError, AssetResult},
    global::{BAIKE_API_URL, BAIKE_ITEM_URL, BAIKE_PROVIDER},
    http::Fetch,
    source::{self, Source},
};

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
struct LemmaCardDto {
    url: Option<String>,
    wap_url: Option<String>,
    image: Option<String>,
}

pub fn lemma_card_url(name: &str) -> AssetResult<Url> {
    let mut url = source::parse_url(BAIKE_API_URL)?;
    url.query_pairs_mut()
        .append_pair("scope", "103")
        .append_pair("format", "json")
        .append_pair("appid", "379020")
        .append_pair("bk_key", name)
        .append_pair("bk_length", "600");
    Ok(url)
}

pub fn item_url(name: &str) -> AssetResult<Url> {
    let mut url = source::parse_url(BAIKE_ITEM_URL)?;
    url.path_segments_mut()
        .map_err(|_| AssetError::not_found("Invalid Baike item URL"))?
        .push(name);
    Ok(url)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub async fn fetch_source<F: Fetch>(fetcher: &F, name: &str) -> AssetResult<Source> {
    let url = lemma_card_url(name)?;
    let page = fetcher.get_page(&url).await?;
    if !page.is_ok() {
        return Err(AssetError::Status {
            context: "Baidu Baike API".to_string(),
            status: page.status,
        });
    }

    let card: LemmaCardDto = serde_json::from_str(&page.body).map_err(|e| AssetError::Parse {
        context: format!("Baidu Baike card for {name}"),
        source: e,
    })?;

    let Some(page_url) = non_empty(&card.url).or_else(|| non_empty(&card.wap_url)) else {
        log::debug!("Baike card for {} has no page, guessing the item URL", name);
        return source::fetch_page_source(fetcher, item_url(name)?.as_str()).await;
    };
    let page_url = source::ensure_https(page_url);

    match non_empty(&card.image) {
        Some(image) => Ok(Source {
            image_url: source::ensure_https(image),
            page_url,
            provider: BAIKE_PROVIDER.to_string(),
        }),
        None => source::fetch_page_source(fetcher, &page_url).await,
    }
}
