use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use serde::Deserialize;

use crate::{
    config::WikiRef,
    error::{AssetError, AssetResult},
    global::WIKIPEDIA_NOT_FOUND_TYPE,
    http::Fetch,
    source::{self, Source},
};

#[derive(Deserialize, Default, Debug)]
struct ImageDto {
    source: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
struct PageLinkDto {
    page: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
struct ContentUrlsDto {
    desktop: Option<PageLinkDto>,
    mobile: Option<PageLinkDto>,
}

#[derive(Deserialize, Default, Debug)]
struct SummaryDto {
    #[serde(rename = "type")]
    kind: Option<String>,
    originalimage: Option<ImageDto>,
    thumbnail: Option<ImageDto>,
    content_urls: Option<ContentUrlsDto>,
}

impl SummaryDto {
    fn image(&self) -> Option<&str> {
        [&self.originalimage, &self.thumbnail]
            .into_iter()
            .flatten()
            .find_map(|image| image.source.as_deref())
    }

    fn page(&self) -> Option<&str> {
        let urls = self.content_urls.as_ref()?;
        [&urls.desktop, &urls.mobile]
            .into_iter()
            .flatten()
            .find_map(|link| link.page.as_deref())
    }
}

/// titles go in as a single segment, everything but unreserved characters escaped
const TITLE_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn wiki_url(lang: &str, prefix: &str, title: &str) -> AssetResult<Url> {
    let title = utf8_percent_encode(title, TITLE_SEGMENT);
    source::parse_url(&format!("https://{lang}.wikipedia.org/{prefix}/{title}"))
}

pub fn summary_url(lang: &str, title: &str) -> AssetResult<Url> {
    wiki_url(lang, "api/rest_v1/page/summary", title)
}

pub fn article_url(lang: &str, title: &str) -> AssetResult<Url> {
    wiki_url(lang, "wiki", title)
}

/// `https://ko.wikipedia.org/wiki/%EC%A0%9C%EB%85%B8` → ko / 제노
pub fn wiki_ref_from_url(page_url: &str, default_title: &str) -> Option<WikiRef> {
    let url = Url::parse(page_url).ok()?;
    let host = url.host_str()?;
    if !host.contains("wikipedia.org") {
        return None;
    }

    let lang = host.split('.').next()?.to_string();
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let title = if last.is_empty() {
        default_title.to_string()
    } else {
        percent_decode_str(last).decode_utf8_lossy().into_owned()
    };

    Some(WikiRef { lang, title })
}

async fn fetch_article_image<F: Fetch>(fetcher: &F, page_url: &str) -> AssetResult<Option<String>> {
    let url = source::parse_url(page_url)?;
    let page = fetcher.get_page(&url).await?;
    if !page.is_ok() {
        log::debug!("Wikipedia article {} returned HTTP {}", page_url, page.status);
        return Ok(None);
    }
    Ok(source::extract_og_image(&page.body))
}

pub async fn fetch_source<F: Fetch>(fetcher: &F, wiki: &WikiRef) -> AssetResult<Source> {
    let url = summary_url(&wiki.lang, &wiki.title)?;
    let page = fetcher.get_page(&url).await?;
    if !page.is_ok() {
        return Err(AssetError::Status {
            context: format!("Wikipedia summary for {}", wiki.title),
            status: page.status,
        });
    }

    let summary: SummaryDto = serde_json::from_str(&page.body).map_err(|e| AssetError::Parse {
        context: format!("Wikipedia summary for {}", wiki.title),
        source: e,
    })?;
    if summary.kind.as_deref() == Some(WIKIPEDIA_NOT_FOUND_TYPE) {
        return Err(AssetError::not_found("Wikipedia page not found"));
    }

    let page_url = match summary.page() {
        Some(page) => page.to_string(),
        None => article_url(&wiki.lang, &wiki.title)?.to_string(),
    };
    let provider = format!("{} Wikipedia", wiki.lang.to_uppercase());

    if let Some(image) = summary.image() {
        return Ok(Source {
            image_url: source::ensure_https(image),
            page_url,
            provider,
        });
    }

    log::debug!("Summary for {} has no image, trying the article", wiki.title);
    match fetch_article_image(fetcher, &page_url).await? {
        Some(image_url) => Ok(Source {
            image_url,
            page_url,
            provider,
        }),
        None => Err(AssetError::not_found("Wikipedia summary missing images")),
    }
}
