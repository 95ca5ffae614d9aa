use std::path::PathBuf;

/// User configuration a resolution runs under.
///
/// Assembled by the configuration layer (project view parsing is out of
/// scope); the pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceContext {
    /// How many dependency hops from the root targets are opened as
    /// editable modules. `None` means unlimited.
    pub import_depth: Option<usize>,
    /// Configured scope entries, e.g. `//server/...` or `//tools:all`.
    pub targets: Vec<String>,
    /// Rule sets the user explicitly enabled language support for.
    ///
    /// Consumed by the aspect/build collaborator; carried here so one
    /// context describes the whole resolution request.
    pub enabled_rules: Vec<String>,
    /// Whether `manual` targets are passed to the build.
    ///
    /// Like `enabled_rules`, this steers the build invocation, not the
    /// mapping itself.
    pub build_manual_targets: bool,
    pub workspace_root: PathBuf,
}

impl WorkspaceContext {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            import_depth: Some(0),
            targets: Vec::new(),
            enabled_rules: Vec::new(),
            build_manual_targets: false,
            workspace_root: workspace_root.into(),
        }
    }

    /// Whether the configured scope covers the entire workspace.
    pub fn is_full_workspace_import(&self) -> bool {
        self.targets.iter().any(|spec| spec.starts_with("//..."))
    }
}
