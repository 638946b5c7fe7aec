use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AssetError, AssetResult},
    extend::CutePath,
};

static CELEBRITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#""displayName"\s*:\s*"([^"]+)"\s*,\s*"wiki"\s*:\s*\{\s*"lang"\s*:\s*"([^"]+)"\s*,\s*"title"\s*:\s*"([^"]+)""#,
    )
    .expect("celebrity pattern is valid")
});

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("url pattern is valid"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Celebrity {
    pub name: String,
    pub wiki_lang: String,
    pub wiki_title: String,
}

/// celebrities in order of first appearance on the page
pub fn parse_celebrities(html: &str) -> Vec<Celebrity> {
    let mut seen = HashSet::new();
    let mut celebrities = Vec::new();

    for captures in CELEBRITY_PATTERN.captures_iter(html) {
        let name = &captures[1];
        if !seen.insert(name.to_string()) {
            continue;
        }
        celebrities.push(Celebrity {
            name: name.to_string(),
            wiki_lang: captures[2].trim().to_string(),
            wiki_title: captures[3].trim().to_string(),
        });
    }

    celebrities
}

pub fn load_celebrities(people_html: &Path) -> AssetResult<Vec<Celebrity>> {
    let html = fs::read_to_string(people_html)
        .map_err(|e| AssetError::fs(people_html, "reading the quiz page", e))?;
    let celebrities = parse_celebrities(&html);
    log::info!(
        "Parsed {} celebrities from {}",
        celebrities.len(),
        people_html.cute_path()
    );
    Ok(celebrities)
}

pub fn parse_fallback_sources(text: &str) -> HashMap<String, String> {
    let mut fallback = HashMap::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (name, rest) = line.split_once(',').unwrap_or((line, ""));
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if let Some(url) = URL_PATTERN.find(rest) {
            fallback.insert(name.to_string(), url.as_str().to_string());
        }
    }

    fallback
}

/// a missing list is not an error, there is just nothing to fall back to
pub fn load_fallback_sources(list: Option<&Path>) -> HashMap<String, String> {
    let Some(list) = list else {
        return HashMap::new();
    };

    match fs::read_to_string(list) {
        Ok(text) => {
            let fallback = parse_fallback_sources(&text);
            log::info!(
                "Loaded {} fallback sources from {}",
                fallback.len(),
                list.cute_path()
            );
            fallback
        }
        Err(e) => {
            log::debug!("No fallback list at {}: {}", list.cute_path(), e);
            HashMap::new()
        }
    }
}
