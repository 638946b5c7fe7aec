use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::{
    cache,
    catalog::{self, Celebrity},
    config::Config,
    error::{AssetError, AssetResult},
    extend::CutePath,
    global::*,
    http::Fetch,
    manifest::{self, AssetRecord, Failure},
    misc, resolver,
};

static RESERVED_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]+"#).expect("filename pattern is valid"));

pub struct FetchSummary {
    pub records: Vec<AssetRecord>,
    pub failures: Vec<Failure>,
    pub failures_path: PathBuf,
}

/// extension for an image URL, `.jpeg` is written as `.jpg`
pub fn determine_extension(image_url: &str) -> &'static str {
    let url_path = Url::parse(image_url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| image_url.split(['?', '#']).next().unwrap_or_default().to_string());

    let ext = Path::new(&url_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match ext.as_deref() {
        Some("jpeg") => DEFAULT_EXTENSION,
        Some(ext) => SUPPORTED_EXTENSIONS
            .iter()
            .find(|&&supported| supported == ext)
            .copied()
            .unwrap_or(DEFAULT_EXTENSION),
        None => DEFAULT_EXTENSION,
    }
}

pub fn sanitize_filename(name: &str, ext: &str) -> String {
    let safe = RESERVED_FILENAME_CHARS.replace_all(name, "_").replace(' ', "");
    format!("{safe}.{ext}")
}

/// sanitized file name, suffixed `_2`, `_3`, ... while another record already owns it
pub fn claim_filename(name: &str, ext: &str, prefix: &str, claimed: &HashSet<String>) -> String {
    let file_name = sanitize_filename(name, ext);
    if !claimed.contains(&format!("{prefix}/{file_name}")) {
        return file_name;
    }

    let stem = file_name.strip_suffix(&format!(".{ext}")).unwrap_or(&file_name);
    (2..)
        .map(|n| format!("{stem}_{n}.{ext}"))
        .find(|candidate| !claimed.contains(&format!("{prefix}/{candidate}")))
        .unwrap_or_else(|| file_name.clone())
}

/// `YaoMing.jpg` is written as `YaoMing.jpg.part` until the download completes
fn partial_path(dest: &Path) -> PathBuf {
    let mut file_name = dest.file_name().unwrap_or_default().to_os_string();
    file_name.push(".part");
    dest.with_file_name(file_name)
}

fn setup_progress_bars(total: u64) -> (ProgressBar, ProgressBar) {
    let multi_progress = MultiProgress::new();

    let file_progress = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.white} {wide_msg:!.green.bold}  {bytes:>10} / {total_bytes:>10}  {bytes_per_sec:>10}",
    ) {
        file_progress.set_style(style);
    }

    let total_progress = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "[{bar:50.green/white}] {pos:>4} / {len:>4}  {wide_msg:!}",
    ) {
        total_progress.set_style(style.progress_chars("■■□"));
    }

    let file_progress = multi_progress.add(file_progress);
    let total_progress = multi_progress.add(total_progress);

    (file_progress, total_progress)
}

/// print above the bars, or plainly when they are not drawn
fn report(total_pb: &ProgressBar, line: String) {
    if total_pb.is_hidden() {
        println!("{line}");
    } else {
        total_pb.println(line);
    }
}

async fn download_with_retry<F: Fetch>(
    fetcher: &F,
    image_url: &str,
    dest: &Path,
    file_pb: &ProgressBar,
    name: &str,
) -> AssetResult<u64> {
    let partial = partial_path(dest);
    for attempt in 1..=MAX_DOWNLOAD_ATTEMPTS {
        log::debug!("Download attempt {} for {}: {}", attempt, name, image_url);
        match fetcher.download(image_url, &partial, file_pb).await {
            Ok(size) => {
                fs::rename(&partial, dest).map_err(|e| AssetError::fs(dest, "file rename", e))?;
                return Ok(size);
            }
            Err(e) => {
                log::warn!("Attempt {}: Download of {} failed: {}", attempt, name, e);
                let _ = fs::remove_file(&partial);
                if attempt == MAX_DOWNLOAD_ATTEMPTS {
                    return Err(e);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
    }

    Err(AssetError::DownloadFailed {
        name: name.to_string(),
        attempts: MAX_DOWNLOAD_ATTEMPTS,
    })
}

async fn fetch_one<F: Fetch>(
    fetcher: &F,
    celebrity: &Celebrity,
    fallbacks: &HashMap<String, String>,
    cfg: &Config,
    asset_dir: &Path,
    claimed: &HashSet<String>,
    file_pb: &ProgressBar,
    total_pb: &ProgressBar,
) -> AssetResult<AssetRecord> {
    let source = resolver::resolve(fetcher, celebrity, fallbacks, cfg).await?;
    log::info!(
        "Resolved {} to {} ({})",
        celebrity.name,
        source.image_url,
        source.provider
    );

    let prefix = cfg.asset_prefix();
    let file_name = claim_filename(
        &celebrity.name,
        determine_extension(&source.image_url),
        &prefix,
        claimed,
    );
    let dest = asset_dir.join(&file_name);
    let size = download_with_retry(fetcher, &source.image_url, &dest, file_pb, &celebrity.name).await?;

    if size > cfg.max_asset_bytes() {
        let message = format!(
            "{} is {}, above the {} limit",
            dest.cute_path(),
            misc::human_readable_bytes(size),
            misc::human_readable_bytes(cfg.max_asset_bytes())
        );
        report(total_pb, format!("{}{}", misc::prefix("warning"), message));
        log::warn!("{}", message);
    }

    Ok(AssetRecord {
        name: celebrity.name.clone(),
        path: format!("{}/{}", prefix, file_name),
        source_label: source.provider,
        source_url: source.page_url,
        image_url: Some(source.image_url),
    })
}

/// resolve and download every portrait the quiz page names, then rewrite the manifest
pub async fn run<F: Fetch>(fetcher: &F, root: &Path, cfg: &Config) -> AssetResult<FetchSummary> {
    let people_html = root.join(&cfg.people_html);
    let celebrities = catalog::load_celebrities(&people_html)?;
    if celebrities.is_empty() {
        return Err(AssetError::not_found(format!(
            "No celebrities parsed from {}",
            people_html.cute_path()
        )));
    }

    let fallback_list = cfg.fallback_list.as_ref().map(|list| root.join(list));
    let fallbacks = catalog::load_fallback_sources(fallback_list.as_deref());

    let asset_dir = root.join(&cfg.asset_dir);
    fs::create_dir_all(&asset_dir)
        .map_err(|e| AssetError::fs(&asset_dir, "directory creation", e))?;

    let cache = if cfg.force_download {
        log::info!("Forced download, ignoring previous manifest");
        HashMap::new()
    } else {
        cache::get_cache(&asset_dir)
    };

    crate::println_info!(
        "Fetching portraits for {} celebrities into {}",
        celebrities.len(),
        asset_dir.cute_path()
    );

    let total = celebrities.len();
    let (file_pb, total_pb) = setup_progress_bars(total as u64);
    let mut records = Vec::with_capacity(total);
    let mut failures = Vec::new();
    let mut claimed: HashSet<String> = celebrities
        .iter()
        .filter_map(|c| cache::cached_record(&cache, &c.name, root))
        .map(|record| record.path.clone())
        .collect();

    for (idx, celebrity) in celebrities.iter().enumerate() {
        let label = format!("[{}/{}] {}", idx + 1, total, celebrity.name);
        total_pb.set_message(celebrity.name.clone());

        if let Some(record) = cache::cached_record(&cache, &celebrity.name, root) {
            log::info!("{} skip (cached)", label);
            report(&total_pb, format!("{}{} (cached)", misc::prefix("skipped"), label));
            records.push(record.clone());
            total_pb.inc(1);
            continue;
        }

        match fetch_one(
            fetcher,
            celebrity,
            &fallbacks,
            cfg,
            &asset_dir,
            &claimed,
            &file_pb,
            &total_pb,
        )
        .await
        {
            Ok(record) => {
                log::info!("{} done", label);
                claimed.insert(record.path.clone());
                report(&total_pb, format!("{}{}", misc::prefix("done"), label));
                records.push(record);
            }
            Err(e) => {
                log::error!("{} failed: {}", label, e);
                report(&total_pb, format!("{}{} ({})", misc::prefix("failed"), label, e));
                failures.push(Failure {
                    name: celebrity.name.clone(),
                    error: e.to_string(),
                });
            }
        }
        total_pb.inc(1);

        if cfg.throttle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(cfg.throttle_ms)).await;
        }
    }

    file_pb.finish_and_clear();
    total_pb.finish_and_clear();

    if !records.is_empty() {
        manifest::write_outputs(&asset_dir, &records)?;
    }
    let failures_path = manifest::write_failures(&asset_dir, &failures)?;

    Ok(FetchSummary {
        records,
        failures,
        failures_path,
    })
}
