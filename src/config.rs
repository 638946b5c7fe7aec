use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{extend::CutePath, global::*};

#[derive(serde::Deserialize, serde::Serialize, PartialEq, Eq, Debug, Clone)]
pub struct WikiRef {
    pub lang: String,
    pub title: String,
}

#[derive(serde::Deserialize, serde::Serialize, PartialEq, Debug, Clone)]
pub struct Config {
    /// quiz page the celebrity list is read from, relative to the root
    #[serde(default = "default_people_html")]
    pub people_html: PathBuf,
    #[serde(default = "default_asset_dir")]
    pub asset_dir: String,
    /// optional `<name>,<url>` list of pages to scrape when Wikipedia fails
    #[serde(default)]
    pub fallback_list: Option<PathBuf>,
    #[serde(default = "default_baike_preferred")]
    pub baike_preferred: Vec<String>,
    #[serde(default = "default_wiki_overrides")]
    pub wiki_overrides: BTreeMap<String, WikiRef>,
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_max_asset_kib")]
    pub max_asset_kib: u64,
    #[serde(default)]
    pub force_download: bool,
}

fn default_people_html() -> PathBuf {
    PathBuf::from(DEFAULT_PEOPLE_HTML)
}

fn default_asset_dir() -> String {
    DEFAULT_ASSET_DIR.to_string()
}

fn default_baike_preferred() -> Vec<String> {
    ["周柯宇", "姚明明", "张耀", "李马克", "王皓轩", "赖冠霖", "魏子越"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_wiki_overrides() -> BTreeMap<String, WikiRef> {
    BTreeMap::from([(
        "李在玟".to_string(),
        WikiRef {
            lang: "en".to_string(),
            title: "Lee_Jeno".to_string(),
        },
    )])
}

fn default_throttle_ms() -> u64 {
    DEFAULT_THROTTLE_MS
}

fn default_max_asset_kib() -> u64 {
    DEFAULT_MAX_ASSET_KIB
}

impl Default for Config {
    fn default() -> Self {
        Self {
            people_html: default_people_html(),
            asset_dir: default_asset_dir(),
            fallback_list: None,
            baike_preferred: default_baike_preferred(),
            wiki_overrides: default_wiki_overrides(),
            throttle_ms: default_throttle_ms(),
            max_asset_kib: default_max_asset_kib(),
            force_download: false,
        }
    }
}

impl Config {
    /// asset directory as written into manifest paths, no leading `./` and no trailing slash
    pub fn asset_prefix(&self) -> String {
        let dir = self.asset_dir.replace('\\', "/");
        let mut prefix = dir.as_str();
        while let Some(rest) = prefix.strip_prefix("./") {
            prefix = rest;
        }
        prefix.trim_end_matches('/').to_string()
    }

    pub fn max_asset_bytes(&self) -> u64 {
        self.max_asset_kib * 1024
    }

    pub fn is_baike_preferred(&self, name: &str) -> bool {
        self.baike_preferred.iter().any(|n| n == name)
    }
}

/// config as stored on disk, `None` when missing or unreadable as JSON
fn read_stored(config_path: &Path) -> Option<(String, Config)> {
    let stored = match fs::read_to_string(config_path) {
        Ok(stored) => stored,
        Err(e) => {
            log::info!("No readable config at {}: {}", config_path.cute_path(), e);
            return None;
        }
    };

    match serde_json::from_str(&stored) {
        Ok(cfg) => Some((stored, cfg)),
        Err(e) => {
            crate::println_info!(
                "{} is not valid JSON ({}), replacing it with the defaults",
                config_path.cute_path(),
                e
            );
            None
        }
    }
}

/// load the site config, writing it back when it is missing, malformed or lacks fields
pub fn load(config_path: &Path) -> Config {
    log::debug!("Loading config from: {}", config_path.cute_path());

    let Some((stored, cfg)) = read_stored(config_path) else {
        let cfg = Config::default();
        save(config_path, &cfg);
        return cfg;
    };

    let complete = serde_json::to_string_pretty(&cfg).unwrap_or_default();
    if !complete.is_empty() && stored.trim() != complete.trim() {
        log::info!("Filling in missing config fields in {}", config_path.cute_path());
        save(config_path, &cfg);
    }

    log::debug!(
        "Assets in {}, {} Baike-first names, {} Wikipedia overrides",
        cfg.asset_prefix(),
        cfg.baike_preferred.len(),
        cfg.wiki_overrides.len()
    );
    cfg
}

pub fn save(config_path: &Path, config: &Config) {
    let config_json = match serde_json::to_string_pretty(config) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Could not serialize config: {}", e);
            return;
        }
    };

    if let Some(parent) = config_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            crate::println_error!("Error while creating {}: {}", parent.cute_path(), e);
            return;
        }
    }

    match fs::write(config_path, config_json) {
        Ok(_) => log::debug!("Saved config to: {}", config_path.cute_path()),
        Err(e) => crate::println_error!("Error while saving config: {}", e),
    }
}
