use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use basalt_build_model::FileLocation;
use basalt_core::Label;

use crate::info::BazelInfo;

/// How a [`FileLocation`] must be resolved to an absolute path.
///
/// The four cases are mutually exclusive and priority-ordered; a location
/// is classified exactly once and then resolved per its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLocationKind {
    /// The reported relative path is already an absolute path on disk.
    Absolute,
    /// A checked-in source file of the main workspace.
    MainWorkspaceSource,
    /// A file materialized under an external repository in the output base.
    ExternalWorkspace,
    /// A generated artifact under the execution root.
    BuildOutput,
}

impl FileLocationKind {
    pub fn classify(location: &FileLocation) -> Self {
        if location.relative_path.starts_with('/') && Path::new(&location.relative_path).exists() {
            Self::Absolute
        } else if location.is_source && !location.is_external {
            Self::MainWorkspaceSource
        } else if location
            .root_execution_path_fragment
            .starts_with("external/")
        {
            Self::ExternalWorkspace
        } else {
            Self::BuildOutput
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("label {label} is not under the main repository prefix {prefix}")]
    NotMainRepository { label: String, prefix: &'static str },

    #[error("label {label} does not contain exactly one ':'")]
    Malformed { label: String },
}

/// Resolves build-tool file locations against the workspace layout.
///
/// Resolution results are memoized; the resolver is shared read-only by
/// parallel per-target work, so the memo tables live behind mutexes.
#[derive(Debug)]
pub struct PathsResolver {
    info: BazelInfo,
    resolved: Mutex<HashMap<FileLocation, PathBuf>>,
}

impl PathsResolver {
    pub fn new(info: BazelInfo) -> Self {
        Self {
            info,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub fn info(&self) -> &BazelInfo {
        &self.info
    }

    pub fn workspace_root(&self) -> &Path {
        &self.info.workspace_root
    }

    pub fn resolve(&self, location: &FileLocation) -> PathBuf {
        if let Some(path) = self
            .resolved
            .lock()
            .expect("paths resolver lock poisoned")
            .get(location)
        {
            return path.clone();
        }

        let path = self.resolve_uncached(location);
        self.resolved
            .lock()
            .expect("paths resolver lock poisoned")
            .insert(location.clone(), path.clone());
        path
    }

    fn resolve_uncached(&self, location: &FileLocation) -> PathBuf {
        match FileLocationKind::classify(location) {
            FileLocationKind::Absolute => PathBuf::from(&location.relative_path),
            FileLocationKind::MainWorkspaceSource => {
                self.info.workspace_root.join(&location.relative_path)
            }
            FileLocationKind::ExternalWorkspace => self.info.output_base.join(
                Path::new(&location.root_execution_path_fragment).join(&location.relative_path),
            ),
            FileLocationKind::BuildOutput => self.resolve_output(
                &Path::new(&location.root_execution_path_fragment).join(&location.relative_path),
            ),
        }
    }

    /// Resolve an execution-root-relative path, as reported by usage reports.
    pub fn resolve_output(&self, exec_root_relative: &Path) -> PathBuf {
        if exec_root_relative.starts_with("external") {
            self.info.output_base.join(exec_root_relative)
        } else {
            self.info.exec_root.join(exec_root_relative)
        }
    }

    /// The directory a main-repository label points into.
    pub fn label_to_directory(&self, label: &Label) -> Result<PathBuf, LabelError> {
        let relative = self.extract_relative_path(label)?;
        Ok(self.info.workspace_root.join(relative))
    }

    /// The package path of a main-repository label (`@//a/b:c` -> `a/b`).
    ///
    /// Labels outside the main repository indicate a workspace layout this
    /// resolver was not built for; that is a hard error, not a fallback.
    pub fn extract_relative_path(&self, label: &Label) -> Result<String, LabelError> {
        let prefix = self.info.main_repository_prefix();
        let Some(without_prefix) = label.as_str().strip_prefix(prefix) else {
            return Err(LabelError::NotMainRepository {
                label: label.to_string(),
                prefix,
            });
        };

        let mut parts = without_prefix.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(package), Some(_name), None) => Ok(package.to_string()),
            _ => Err(LabelError::Malformed {
                label: label.to_string(),
            }),
        }
    }
}
