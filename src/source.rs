use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::{
    error::{AssetError, AssetResult},
    global::{BAIKE_HOST, BAIKE_PROVIDER},
    http::Fetch,
};

static OG_IMAGE_PROPERTY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+property="og:image"[^>]+content="([^"]+)""#)
        .expect("og:image pattern is valid")
});

static OG_IMAGE_CONTENT_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+content="([^"]+)"[^>]+property="og:image""#)
        .expect("og:image pattern is valid")
});

static IMAGE_SRC_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)rel="image_src"[^>]+href="([^"]+)""#).expect("image_src pattern is valid")
});

/// where a portrait comes from and who to credit for it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub image_url: String,
    pub page_url: String,
    pub provider: String,
}

pub fn ensure_https(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{rest}")
    } else {
        url.to_string()
    }
}

pub fn parse_url(url: &str) -> AssetResult<Url> {
    Url::parse(url).map_err(|e| AssetError::not_found(format!("Invalid URL '{url}': {e}")))
}

/// `og:image` in either attribute order
pub fn extract_og_image(html: &str) -> Option<String> {
    OG_IMAGE_PROPERTY_FIRST
        .captures(html)
        .or_else(|| OG_IMAGE_CONTENT_FIRST.captures(html))
        .map(|c| ensure_https(&c[1]))
}

pub fn extract_page_image(html: &str) -> Option<String> {
    extract_og_image(html).or_else(|| {
        IMAGE_SRC_LINK
            .captures(html)
            .map(|c| ensure_https(&c[1]))
    })
}

pub fn provider_for(page_url: &str) -> String {
    if page_url.contains(BAIKE_HOST) {
        return BAIKE_PROVIDER.to_string();
    }
    Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// scrape any page for the image it advertises to link previews
pub async fn fetch_page_source<F: Fetch>(fetcher: &F, page_url: &str) -> AssetResult<Source> {
    let url = parse_url(page_url)?;
    let page = fetcher.get_page(&url).await?;
    if !page.is_ok() {
        return Err(AssetError::Status {
            context: "Fallback page".to_string(),
            status: page.status,
        });
    }

    let image_url = extract_page_image(&page.body)
        .ok_or_else(|| AssetError::not_found("Fallback page missing og:image"))?;

    Ok(Source {
        image_url,
        page_url: page_url.to_string(),
        provider: provider_for(page_url),
    })
}
