use std::time::Duration;

pub const TOOL_DIR: &str = ".people-assets";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = "log.log";

pub const DEFAULT_PEOPLE_HTML: &str = "people.html";
pub const DEFAULT_ASSET_DIR: &str = "assets/people";

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const CATALOG_FILE_NAME: &str = "catalog.csv";
pub const MAPPING_FILE_NAME: &str = "celebrity-assets.js";
pub const FAILURES_FILE_NAME: &str = "download_failures.json";

/// global the quiz page reads the attribution mapping from
pub const MAPPING_GLOBAL: &str = "CELEBRITY_ASSETS";

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];
pub const DEFAULT_EXTENSION: &str = "jpg";

pub const DEFAULT_MAX_ASSET_KIB: u64 = 400;
pub const DEFAULT_THROTTLE_MS: u64 = 50;

pub const MAX_DOWNLOAD_ATTEMPTS: usize = 2;
pub const RETRY_DELAY_MS: u64 = 1500;
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(25);

pub const FORCE_ENV_VAR: &str = "FORCE_DOWNLOAD_ASSETS";

pub const WIKIPEDIA_NOT_FOUND_TYPE: &str = "https://mediawiki.org/wiki/HyperSwitch/errors/not_found";
pub const BAIKE_API_URL: &str = "https://baike.baidu.com/api/openapi/BaikeLemmaCardApi";
pub const BAIKE_ITEM_URL: &str = "https://baike.baidu.com/item";
pub const BAIKE_HOST: &str = "baike.baidu.com";
pub const BAIKE_PROVIDER: &str = "Baidu Baike";

pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%f";
pub const LOG_LEVEL: &str = "debug";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0 Safari/537.36";
