use std::path::PathBuf;

/// The Bazel release the workspace runs, reduced to what label handling
/// actually depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BazelRelease {
    pub major: u32,
}

impl BazelRelease {
    pub fn new(major: u32) -> Self {
        Self { major }
    }

    /// The prefix main-repository labels carry when Bazel stringifies them.
    ///
    /// Since Bazel 6, main-repository targets render as `@//`-prefixed
    /// labels (`@@//` under bzlmod), contrary to the bare `//` of older
    /// releases.
    pub fn main_repository_prefix(&self, bzlmod_enabled: bool) -> &'static str {
        if self.major < 6 {
            "//"
        } else if bzlmod_enabled {
            "@@//"
        } else {
            "@//"
        }
    }
}

/// Workspace facts obtained from `bazel info` by an out-of-scope collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BazelInfo {
    pub workspace_root: PathBuf,
    pub exec_root: PathBuf,
    pub output_base: PathBuf,
    pub release: BazelRelease,
    pub bzlmod_enabled: bool,
}

impl BazelInfo {
    pub fn main_repository_prefix(&self) -> &'static str {
        self.release.main_repository_prefix(self.bzlmod_enabled)
    }

    /// The file name of the `bazel-<execroot>` convenience symlink.
    pub fn exec_root_symlink_name(&self) -> String {
        let name = self
            .exec_root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect()
    }
}
