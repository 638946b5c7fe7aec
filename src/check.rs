use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::Path,
};

use reqwest::Url;
use walkdir::WalkDir;

use crate::{
    config::Config,
    error::AssetResult,
    extend::{Blake3Path, CutePath},
    global::SUPPORTED_EXTENSIONS,
    manifest::{self, AssetRecord},
    misc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueKind {
    EmptyName,
    DuplicateName,
    EmptySourceLabel,
    EmptySourceUrl,
    InvalidSourceUrl(String),
    OutsideAssetDir,
    UnsupportedExtension,
    MissingFile,
    DuplicatePath { other: String },
    Oversized { size: u64, limit: u64 },
    DuplicateContent { other: String },
    Orphan,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::Oversized { .. } | IssueKind::DuplicateContent { .. } | IssueKind::Orphan => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::EmptyName => f.write_str("entry has no name"),
            IssueKind::DuplicateName => f.write_str("name is registered more than once"),
            IssueKind::EmptySourceLabel => f.write_str("sourceLabel is empty"),
            IssueKind::EmptySourceUrl => f.write_str("sourceUrl is empty"),
            IssueKind::InvalidSourceUrl(reason) => write!(f, "sourceUrl is invalid: {}", reason),
            IssueKind::OutsideAssetDir => f.write_str("path is outside the asset directory"),
            IssueKind::UnsupportedExtension => f.write_str("path has an unsupported image extension"),
            IssueKind::MissingFile => f.write_str("file does not exist"),
            IssueKind::DuplicatePath { other } => {
                write!(f, "path is already registered for {}", other)
            }
            IssueKind::Oversized { size, limit } => write!(
                f,
                "file is {}, above the {} limit",
                misc::human_readable_bytes(*size),
                misc::human_readable_bytes(*limit)
            ),
            IssueKind::DuplicateContent { other } => {
                write!(f, "file is identical to the one registered for {}", other)
            }
            IssueKind::Orphan => f.write_str("file is not registered in the manifest"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    /// record name, or the file path for orphans
    pub subject: String,
    pub kind: IssueKind,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.kind)
    }
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub records: usize,
    pub issues: Vec<Issue>,
}

impl CheckReport {
    fn push(&mut self, subject: &str, kind: IssueKind) {
        self.issues.push(Issue {
            subject: subject.to_string(),
            kind,
        });
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.kind.severity() == severity)
            .count()
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn passed(&self, strict: bool) -> bool {
        self.errors() == 0 && (!strict || self.warnings() == 0)
    }

    pub fn kinds_for(&self, subject: &str) -> Vec<&IssueKind> {
        self.issues
            .iter()
            .filter(|issue| issue.subject == subject)
            .map(|issue| &issue.kind)
            .collect()
    }
}

fn has_supported_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

fn is_inside(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|rest| !rest.is_empty() && !rest.split('/').any(|s| s == ".." || s.is_empty()))
        .unwrap_or(false)
}

fn check_source_url(url: &str) -> Option<IssueKind> {
    if url.trim().is_empty() {
        return Some(IssueKind::EmptySourceUrl);
    }
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => None,
        Ok(parsed) => Some(IssueKind::InvalidSourceUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        ))),
        Err(e) => Some(IssueKind::InvalidSourceUrl(e.to_string())),
    }
}

/// lint the records against each other and against the files on disk
pub fn check_records(records: &[AssetRecord], root: &Path, cfg: &Config) -> CheckReport {
    let prefix = cfg.asset_prefix();
    let limit = cfg.max_asset_bytes();

    let mut report = CheckReport {
        records: records.len(),
        issues: vec![],
    };
    let mut names = HashSet::new();
    let mut hashes: HashMap<String, &str> = HashMap::new();
    let mut paths: HashMap<&str, &str> = HashMap::new();

    for record in records {
        let subject = if record.name.is_empty() {
            report.push(&record.path, IssueKind::EmptyName);
            record.path.as_str()
        } else {
            record.name.as_str()
        };

        if !record.name.is_empty() && !names.insert(record.name.as_str()) {
            report.push(subject, IssueKind::DuplicateName);
        }
        if record.source_label.trim().is_empty() {
            report.push(subject, IssueKind::EmptySourceLabel);
        }
        if let Some(kind) = check_source_url(&record.source_url) {
            report.push(subject, kind);
        }

        if !is_inside(&record.path, &prefix) {
            report.push(subject, IssueKind::OutsideAssetDir);
        }
        if !has_supported_extension(&record.path) {
            report.push(subject, IssueKind::UnsupportedExtension);
        }

        let shared_path = paths.get(record.path.as_str()).copied();
        match shared_path {
            Some(other) => report.push(
                subject,
                IssueKind::DuplicatePath {
                    other: other.to_string(),
                },
            ),
            None => {
                paths.insert(record.path.as_str(), subject);
            }
        }

        let file = root.join(&record.path);
        let metadata = match file.metadata() {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                report.push(subject, IssueKind::MissingFile);
                continue;
            }
        };

        if metadata.len() > limit {
            report.push(
                subject,
                IssueKind::Oversized {
                    size: metadata.len(),
                    limit,
                },
            );
        }

        if shared_path.is_some() {
            continue;
        }
        match file.get_blake3() {
            Ok(hash) => {
                if let Some(other) = hashes.get(&hash) {
                    report.push(
                        subject,
                        IssueKind::DuplicateContent {
                            other: other.to_string(),
                        },
                    );
                } else {
                    hashes.insert(hash, subject);
                }
            }
            Err(e) => log::warn!("Could not hash {}: {}", file.cute_path(), e),
        }
    }

    let registered: HashSet<&str> = records.iter().map(|r| r.path.as_str()).collect();
    let asset_dir = root.join(&prefix);
    for entry in WalkDir::new(&asset_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative.cute_path();
        if has_supported_extension(&relative) && !registered.contains(relative.as_str()) {
            report.push(&relative, IssueKind::Orphan);
        }
    }

    report
}

pub fn run(root: &Path, cfg: &Config) -> AssetResult<CheckReport> {
    let manifest_path = manifest::manifest_path(&root.join(&cfg.asset_dir));
    crate::println_info!("Checking {}", manifest_path.cute_path());

    let records = manifest::read_manifest(&manifest_path)?;
    Ok(check_records(&records, root, cfg))
}

pub fn print_report(report: &CheckReport) {
    for issue in &report.issues {
        match issue.kind.severity() {
            Severity::Warning => {
                println!("{}{}", misc::prefix("warning"), issue);
                log::warn!("{}", issue);
            }
            Severity::Error => crate::println_error!("{}", issue),
        }
    }

    crate::println_info!(
        "Checked {} records: {} errors, {} warnings",
        report.records,
        report.errors(),
        report.warnings()
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn record(name: &str, path: &str) -> AssetRecord {
        AssetRecord {
            name: name.to_string(),
            path: path.to_string(),
            source_label: "EN Wikipedia".to_string(),
            source_url: "https://en.wikipedia.org/wiki/X".to_string(),
            image_url: None,
        }
    }

    fn site(files: &[(&str, &str)]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        for (path, bytes) in files {
            let file = root.path().join(path);
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, bytes).unwrap();
        }
        root
    }

    #[test]
    fn test_clean_manifest() {
        let root = site(&[
            ("assets/people/a.jpg", "a"),
            ("assets/people/b.png", "b"),
            ("assets/people/manifest.json", "[]"),
        ]);
        let records = [
            record("A", "assets/people/a.jpg"),
            record("B", "assets/people/b.png"),
        ];

        let report = check_records(&records, root.path(), &Config::default());
        assert!(report.issues.is_empty());
        assert!(report.passed(true));
        assert_eq!(report.records, 2);
    }

    #[test]
    fn test_attribution_and_path_errors() {
        let root = site(&[("assets/people/a.jpg", "a"), ("other/c.jpg", "c")]);
        let mut unlabeled = record("A", "assets/people/a.jpg");
        unlabeled.source_label = "  ".to_string();
        unlabeled.source_url = String::new();
        let mut bad_url = record("B", "assets/people/missing.jpg");
        bad_url.source_url = "ftp://example.com/x".to_string();
        let records = [
            unlabeled,
            bad_url,
            record("C", "other/c.jpg"),
            record("D", "assets/people/../people/a.jpg"),
            record("E", "assets/people/e.svg"),
            record("A", "assets/people/a.jpg"),
        ];

        let report = check_records(&records, root.path(), &Config::default());

        assert_eq!(
            report.kinds_for("A"),
            vec![
                &IssueKind::EmptySourceLabel,
                &IssueKind::EmptySourceUrl,
                &IssueKind::DuplicateName,
                &IssueKind::DuplicatePath {
                    other: "A".to_string()
                },
            ]
        );
        assert_eq!(
            report.kinds_for("B"),
            vec![
                &IssueKind::InvalidSourceUrl("unsupported scheme 'ftp'".to_string()),
                &IssueKind::MissingFile,
            ]
        );
        assert_eq!(report.kinds_for("C"), vec![&IssueKind::OutsideAssetDir]);
        assert_eq!(
            report.kinds_for("D"),
            vec![
                &IssueKind::OutsideAssetDir,
                &IssueKind::DuplicateContent {
                    other: "A".to_string()
                },
            ]
        );
        assert_eq!(
            report.kinds_for("E"),
            vec![&IssueKind::UnsupportedExtension, &IssueKind::MissingFile]
        );
        assert!(!report.passed(false));
    }

    #[test]
    fn test_oversized_and_orphans_are_warnings() {
        let big = "0".repeat(2048);
        let root = site(&[
            ("assets/people/big.webp", big.as_str()),
            ("assets/people/stray.gif", "gif"),
            ("assets/people/nested/stray.PNG", "png"),
            ("assets/people/catalog.csv", "name"),
        ]);
        let cfg = Config {
            max_asset_kib: 1,
            ..Config::default()
        };

        let report = check_records(&[record("Big", "assets/people/big.webp")], root.path(), &cfg);

        assert_eq!(
            report.kinds_for("Big"),
            vec![&IssueKind::Oversized {
                size: 2048,
                limit: 1024
            }]
        );
        assert_eq!(report.kinds_for("assets/people/nested/stray.PNG"), vec![&IssueKind::Orphan]);
        assert_eq!(report.kinds_for("assets/people/stray.gif"), vec![&IssueKind::Orphan]);
        assert_eq!(report.errors(), 0);
        assert_eq!(report.warnings(), 3);
        assert!(report.passed(false));
        assert!(!report.passed(true));
    }

    #[test]
    fn test_shared_path_is_error() {
        let root = site(&[("assets/people/YaoMing.jpg", "yao")]);
        let records = [
            record("Yao Ming", "assets/people/YaoMing.jpg"),
            record("YaoMing", "assets/people/YaoMing.jpg"),
        ];

        let report = check_records(&records, root.path(), &Config::default());
        assert!(report.kinds_for("Yao Ming").is_empty());
        assert_eq!(
            report.kinds_for("YaoMing"),
            vec![&IssueKind::DuplicatePath {
                other: "Yao Ming".to_string()
            }]
        );
        assert!(!report.passed(false));
    }

    #[test]
    fn test_dot_relative_asset_dir() {
        let root = site(&[("assets/people/a.jpg", "a")]);
        let cfg = Config {
            asset_dir: "./assets/people/".to_string(),
            ..Config::default()
        };

        let report = check_records(&[record("A", "assets/people/a.jpg")], root.path(), &cfg);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_empty_name_is_reported_by_path() {
        let root = site(&[("assets/people/a.jpg", "a")]);
        let report = check_records(&[record("", "assets/people/a.jpg")], root.path(), &Config::default());
        assert_eq!(report.kinds_for("assets/people/a.jpg"), vec![&IssueKind::EmptyName]);
    }

    #[test]
    fn test_run_requires_manifest() {
        let root = site(&[]);
        assert!(run(root.path(), &Config::default()).is_err());

        let root = site(&[
            ("assets/people/a.jpg", "a"),
            (
                "assets/people/manifest.json",
                r#"[{ "name": "A", "path": "assets/people/a.jpg", "provider": "EN Wikipedia", "sourceUrl": "https://en.wikipedia.org/wiki/A" }]"#,
            ),
        ]);
        let report = run(root.path(), &Config::default()).unwrap();
        assert!(report.passed(true));
    }

    #[test]
    fn test_issue_display() {
        let issue = Issue {
            subject: "Big".to_string(),
            kind: IssueKind::Oversized {
                size: 500 * 1024,
                limit: 400 * 1024,
            },
        };
        assert_eq!(issue.to_string(), "Big: file is 500.00KB, above the 400.00KB limit");
    }
}
