use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use basalt_build_model::TargetInfo;
use basalt_core::Label;
use rayon::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum TargetStoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The immutable target universe a single resolution runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetStore {
    targets: BTreeMap<Label, TargetInfo>,
}

impl TargetStore {
    pub fn new(targets: BTreeMap<Label, TargetInfo>) -> Self {
        Self { targets }
    }

    pub fn get(&self, label: &Label) -> Option<&TargetInfo> {
        self.targets.get(label)
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.targets.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &TargetInfo)> {
        self.targets.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<Label, TargetInfo> {
        &self.targets
    }
}

#[derive(Debug, Clone)]
struct CachedDescriptor {
    modified: SystemTime,
    info: TargetInfo,
}

/// Reads aspect-output descriptor files into a [`TargetStore`].
///
/// Descriptors are cached per file keyed by last-modified time, so repeated
/// resolutions only re-parse files the aspect rewrote. The cache is shared
/// by the rayon workers populating the store.
#[derive(Debug, Default)]
pub struct TargetInfoReader {
    cache: Mutex<HashMap<PathBuf, CachedDescriptor>>,
}

impl TargetInfoReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all descriptor files and assemble the target map.
    ///
    /// When an aspect shadow graph exports two descriptors with the same
    /// label, the one carrying JVM facts wins; shadow entries only ever
    /// split off language-specific detail, and the JVM record is the one
    /// the pipeline keys off.
    pub fn read_target_map(&self, files: &[PathBuf]) -> Result<TargetStore, TargetStoreError> {
        let descriptors: Vec<TargetInfo> = files
            .par_iter()
            .map(|path| self.read_descriptor(path))
            .collect::<Result<_, _>>()?;

        let mut targets: BTreeMap<Label, TargetInfo> = BTreeMap::new();
        for info in descriptors {
            match targets.get(&info.id) {
                Some(existing) if existing.jvm.is_some() || info.jvm.is_none() => {}
                _ => {
                    targets.insert(info.id.clone(), info);
                }
            }
        }
        Ok(TargetStore::new(targets))
    }

    fn read_descriptor(&self, path: &Path) -> Result<TargetInfo, TargetStoreError> {
        let modified = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| TargetStoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(cached) = self
            .cache
            .lock()
            .expect("target descriptor cache lock poisoned")
            .get(path)
        {
            if cached.modified == modified {
                return Ok(cached.info.clone());
            }
        }

        let data = std::fs::read_to_string(path).map_err(|source| TargetStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let info: TargetInfo =
            serde_json::from_str(&data).map_err(|source| TargetStoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            target = "basalt.bazel",
            path = %path.display(),
            label = %info.id,
            "parsed target descriptor"
        );

        self.cache
            .lock()
            .expect("target descriptor cache lock poisoned")
            .insert(
                path.to_path_buf(),
                CachedDescriptor {
                    modified,
                    info: info.clone(),
                },
            );
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_build_model::JvmTargetInfo;

    fn write_descriptor(dir: &Path, name: &str, info: &TargetInfo) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(info).unwrap()).unwrap();
        path
    }

    #[test]
    fn reads_descriptors_into_store() {
        let dir = tempfile::tempdir().unwrap();
        let a = TargetInfo {
            id: Label::new("//a:a"),
            kind: "java_library".to_string(),
            ..TargetInfo::default()
        };
        let b = TargetInfo {
            id: Label::new("//b:b"),
            kind: "java_library".to_string(),
            ..TargetInfo::default()
        };
        let files = vec![
            write_descriptor(dir.path(), "a.json", &a),
            write_descriptor(dir.path(), "b.json", &b),
        ];

        let reader = TargetInfoReader::new();
        let store = reader.read_target_map(&files).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&Label::new("//a:a")), Some(&a));
    }

    #[test]
    fn duplicate_labels_prefer_jvm_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        let shadow = TargetInfo {
            id: Label::new("//a:a"),
            kind: "java_proto_library".to_string(),
            ..TargetInfo::default()
        };
        let jvm = TargetInfo {
            id: Label::new("//a:a"),
            kind: "java_library".to_string(),
            jvm: Some(JvmTargetInfo::default()),
            ..TargetInfo::default()
        };
        let files = vec![
            write_descriptor(dir.path(), "shadow.json", &shadow),
            write_descriptor(dir.path(), "jvm.json", &jvm),
        ];

        let reader = TargetInfoReader::new();
        let store = reader.read_target_map(&files).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&Label::new("//a:a")), Some(&jvm));
    }

    #[test]
    fn cache_is_invalidated_when_the_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = TargetInfo {
            id: Label::new("//a:a"),
            kind: "java_library".to_string(),
            ..TargetInfo::default()
        };
        let path = write_descriptor(dir.path(), "a.json", &v1);

        let reader = TargetInfoReader::new();
        let store = reader.read_target_map(std::slice::from_ref(&path)).unwrap();
        assert_eq!(store.get(&Label::new("//a:a")).unwrap().kind, "java_library");

        let v2 = TargetInfo {
            kind: "java_binary".to_string(),
            ..v1
        };
        std::fs::write(&path, serde_json::to_string(&v2).unwrap()).unwrap();
        // Push the mtime forward explicitly; some filesystems have coarse
        // timestamp granularity.
        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(later).unwrap();

        let store = reader.read_target_map(std::slice::from_ref(&path)).unwrap();
        assert_eq!(store.get(&Label::new("//a:a")).unwrap().kind, "java_binary");
    }
}
