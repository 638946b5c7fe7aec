use std::{
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{AssetError, AssetResult},
    extend::CutePath,
    global::*,
};

/// one portrait and its attribution, as the quiz page consumes it
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub name: String,
    pub path: String,
    #[serde(alias = "provider", default)]
    pub source_label: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Failure {
    pub name: String,
    pub error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingEntry<'a> {
    path: &'a str,
    source_label: &'a str,
    source_url: &'a str,
}

pub fn manifest_path(asset_dir: &Path) -> PathBuf {
    asset_dir.join(MANIFEST_FILE_NAME)
}

pub fn read_manifest(path: &Path) -> AssetResult<Vec<AssetRecord>> {
    let raw = fs::read_to_string(path).map_err(|e| AssetError::fs(path, "manifest read", e))?;
    serde_json::from_str(&raw).map_err(|e| AssetError::Parse {
        context: path.cute_path(),
        source: e,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> AssetResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| AssetError::Parse {
        context: path.cute_path(),
        source: e,
    })?;
    fs::write(path, json).map_err(|e| AssetError::fs(path, "file write", e))
}

fn write_catalog(path: &Path, records: &[AssetRecord]) -> AssetResult<()> {
    let to_fs = |e: csv::Error| AssetError::fs(path, "catalog write", io::Error::from(e));

    let mut writer = csv::Writer::from_path(path).map_err(to_fs)?;
    for record in records {
        writer.serialize(record).map_err(to_fs)?;
    }
    writer
        .flush()
        .map_err(|e| AssetError::fs(path, "catalog write", e))
}

/// `window.CELEBRITY_ASSETS = {...};` keyed by name, in manifest order
pub fn render_mapping(records: &[AssetRecord]) -> AssetResult<String> {
    let mut js = format!("window.{MAPPING_GLOBAL} = {{\n");
    for record in records {
        let entry = MappingEntry {
            path: &record.path,
            source_label: &record.source_label,
            source_url: &record.source_url,
        };
        let to_parse = |e| AssetError::Parse {
            context: format!("mapping entry for {}", record.name),
            source: e,
        };
        let key = serde_json::to_string(&record.name).map_err(to_parse)?;
        let value = serde_json::to_string(&entry).map_err(to_parse)?;
        let _ = writeln!(js, "  {key}: {value},");
    }
    js.push_str("};\n");
    Ok(js)
}

pub fn write_outputs(asset_dir: &Path, records: &[AssetRecord]) -> AssetResult<()> {
    write_catalog(&asset_dir.join(CATALOG_FILE_NAME), records)?;
    write_json(&manifest_path(asset_dir), &records)?;

    let mapping_path = asset_dir.join(MAPPING_FILE_NAME);
    fs::write(&mapping_path, render_mapping(records)?)
        .map_err(|e| AssetError::fs(&mapping_path, "file write", e))?;

    log::info!(
        "Wrote {} records to {}",
        records.len(),
        asset_dir.cute_path()
    );
    Ok(())
}

/// failures are written when present, a stale log is removed otherwise
pub fn write_failures(asset_dir: &Path, failures: &[Failure]) -> AssetResult<PathBuf> {
    let path = asset_dir.join(FAILURES_FILE_NAME);
    if failures.is_empty() {
        if path.exists() {
            fs::remove_file(&path).map_err(|e| AssetError::fs(&path, "failure log removal", e))?;
        }
    } else {
        write_json(&path, &failures)?;
    }
    Ok(path)
}
