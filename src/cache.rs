use std::{collections::HashMap, path::Path};

use crate::manifest::{self, AssetRecord};

/// records of the previous run keyed by name, empty when there is no usable manifest
pub fn get_cache(asset_dir: &Path) -> HashMap<String, AssetRecord> {
    let manifest_path = manifest::manifest_path(asset_dir);
    if !manifest_path.exists() {
        return HashMap::new();
    }

    match manifest::read_manifest(&manifest_path) {
        Ok(records) => records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect(),
        Err(e) => {
            log::warn!("Ignoring previous manifest: {}", e);
            HashMap::new()
        }
    }
}

/// a cached record is only reusable while its file is still on disk
pub fn cached_record<'a>(
    cache: &'a HashMap<String, AssetRecord>,
    name: &str,
    root: &Path,
) -> Option<&'a AssetRecord> {
    cache
        .get(name)
        .filter(|record| !record.path.is_empty() && root.join(&record.path).is_file())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_cache_from_manifest() {
        let root = tempfile::tempdir().unwrap();
        let asset_dir = root.path().join("assets/people");
        fs::create_dir_all(&asset_dir).unwrap();

        let kept = AssetRecord {
            name: "Yao Ming".to_string(),
            path: "assets/people/YaoMing.jpg".to_string(),
            source_label: "EN Wikipedia".to_string(),
            source_url: "https://en.wikipedia.org/wiki/Yao_Ming".to_string(),
            image_url: None,
        };
        let gone = AssetRecord {
            name: "Gone".to_string(),
            path: "assets/people/Gone.jpg".to_string(),
            ..kept.clone()
        };
        manifest::write_outputs(&asset_dir, &[kept.clone(), gone]).unwrap();
        fs::write(asset_dir.join("YaoMing.jpg"), b"jpg").unwrap();

        let cache = get_cache(&asset_dir);
        assert_eq!(cache.len(), 2);
        assert_eq!(cached_record(&cache, "Yao Ming", root.path()), Some(&kept));
        assert_eq!(cached_record(&cache, "Gone", root.path()), None);
        assert_eq!(cached_record(&cache, "Unknown", root.path()), None);
    }

    #[test]
    fn test_broken_manifest_is_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(manifest::manifest_path(dir.path()), "not json").unwrap();
        assert!(get_cache(dir.path()).is_empty());
        assert!(get_cache(&dir.path().join("missing")).is_empty());
    }
}
