mod baike;
mod cache;
mod catalog;
mod check;
mod config;
mod error;
mod extend;
mod fetch;
mod global;
mod http;
mod manifest;
mod misc;
mod resolver;
mod source;
mod wikipedia;

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use colored::Colorize;
use simple_log::LogConfigBuilder;

use crate::{extend::CutePath, global::*};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Site root containing people.html, default is the current directory
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Custom config path, default is <root>/.people-assets/config.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lint the manifest against the files on disk instead of downloading
    #[arg(long)]
    check: bool,

    /// Treat check warnings (size, orphans, duplicates) as errors
    #[arg(long, requires = "check")]
    strict: bool,

    /// Re-download every portrait, ignoring the previous manifest
    #[arg(short, long, env = FORCE_ENV_VAR, value_parser = clap::builder::FalseyValueParser::new())]
    force: bool,

    /// List of `<name>,<url>` pages to fall back to
    #[arg(long)]
    fallback_list: Option<PathBuf>,

    /// Pause between celebrities in milliseconds
    #[arg(long)]
    throttle_ms: Option<u64>,
}

fn setup_logging(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let tool_dir = root.join(TOOL_DIR);
    fs::create_dir_all(&tool_dir)?;

    let log_file = tool_dir.join(LOG_FILE_NAME);

    if log_file.exists() {
        fs::remove_file(&log_file)?;
    }

    let log_file_str = log_file
        .to_str()
        .ok_or_else(|| format!("Log file path {} is not valid UTF-8", log_file.display()))?;

    let logger_config = LogConfigBuilder::builder()
        .path(log_file_str)
        .time_format(LOG_TIME_FORMAT)
        .level(LOG_LEVEL)
        .map_err(|e| format!("Failed to configure logger: {}", e))?
        .output_file()
        .build();

    simple_log::new(logger_config)?;
    log::info!("Logging initialized, log file: {}", log_file.cute_path());
    Ok(())
}

fn resolve_config_path(args: &Args, root: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(match &args.config {
        Some(custom) if custom.is_absolute() => custom.clone(),
        Some(custom) => env::current_dir()?.join(custom),
        None => root.join(TOOL_DIR).join(CONFIG_FILE_NAME),
    })
}

fn apply_args(cfg: &mut config::Config, args: &Args) {
    if args.force {
        cfg.force_download = true;
    }
    if let Some(list) = &args.fallback_list {
        cfg.fallback_list = Some(list.clone());
    }
    if let Some(throttle_ms) = args.throttle_ms {
        cfg.throttle_ms = throttle_ms;
    }
}

async fn run_fetch(root: &Path, cfg: &config::Config) -> Result<bool, Box<dyn std::error::Error>> {
    let summary = fetch::run(&http::HttpFetcher, root, cfg).await?;

    if summary.failures.is_empty() {
        println_info!(
            "All downloads succeeded, {} portraits registered",
            summary.records.len()
        );
    } else {
        println!(
            "\n{}",
            format!(
                "{} downloads failed. See {}",
                summary.failures.len(),
                summary.failures_path.cute_path()
            )
            .yellow()
        );
        log::warn!("{} downloads failed", summary.failures.len());
    }

    // per-celebrity failures go to the failure log, not the exit code
    Ok(true)
}

fn run_check(root: &Path, cfg: &config::Config, strict: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let report = check::run(root, cfg)?;
    check::print_report(&report);
    Ok(report.passed(strict))
}

async fn run_tool() -> Result<bool, Box<dyn std::error::Error>> {
    let args = Args::parse();

    let root = match &args.root {
        Some(root) => root.clone(),
        None => env::current_dir()?,
    };
    setup_logging(&root)?;

    log::info!("people-assets v{} starting up", env!("CARGO_PKG_VERSION"));
    log::info!("Command line arguments: {:?}", args);
    log::info!("Using site root: {}", root.cute_path());

    let config_path = resolve_config_path(&args, &root)?;
    if args.config.is_some() {
        log::info!("Using custom config path: {}", config_path.cute_path());
    }

    let mut cfg = config::load(&config_path);
    apply_args(&mut cfg, &args);

    if args.check {
        run_check(&root, &cfg, args.strict)
    } else {
        run_fetch(&root, &cfg).await
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    #[cfg(windows)]
    {
        let _ = colored::control::set_virtual_terminal(true);
    }

    match run_tool().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            println_error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_force_from_environment() {
        env::remove_var(FORCE_ENV_VAR);
        let args = Args::try_parse_from(["people-assets"]).unwrap();
        assert!(!args.force);

        env::set_var(FORCE_ENV_VAR, "1");
        let args = Args::try_parse_from(["people-assets"]).unwrap();
        env::remove_var(FORCE_ENV_VAR);
        assert!(args.force);
    }

    #[test]
    #[serial]
    fn test_args_override_config() {
        env::remove_var(FORCE_ENV_VAR);
        let args = Args::try_parse_from([
            "people-assets",
            "--force",
            "--throttle-ms",
            "0",
            "--fallback-list",
            "list.txt",
        ])
        .unwrap();

        let mut cfg = config::Config::default();
        apply_args(&mut cfg, &args);
        assert!(cfg.force_download);
        assert_eq!(cfg.throttle_ms, 0);
        assert_eq!(cfg.fallback_list, Some(PathBuf::from("list.txt")));
    }

    #[test]
    #[serial]
    fn test_strict_requires_check() {
        env::remove_var(FORCE_ENV_VAR);
        assert!(Args::try_parse_from(["people-assets", "--strict"]).is_err());
        let args = Args::try_parse_from(["people-assets", "--check", "--strict"]).unwrap();
        assert!(args.check && args.strict);
    }

    #[test]
    fn test_default_config_path() {
        let args = Args {
            root: None,
            config: None,
            check: false,
            strict: false,
            force: false,
            fallback_list: None,
            throttle_ms: None,
        };
        let path = resolve_config_path(&args, Path::new("/site")).unwrap();
        assert_eq!(path, Path::new("/site/.people-assets/config.json"));
    }
}
