use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use basalt_bazel::PathsResolver;
use basalt_core::Label;

use crate::model::{Module, SourceSet, Tag};
use crate::workspace_context::WorkspaceContext;

/// Fills the gaps the IDE's project tree cannot tolerate.
///
/// The tree view expects the configured import scope to be contiguously
/// covered by module source roots; directories in scope that no real
/// module covers are backed by synthetic NoBuild placeholder modules.
#[derive(Debug)]
pub struct ProjectTreeViewFix<'a> {
    paths: &'a PathsResolver,
}

impl<'a> ProjectTreeViewFix<'a> {
    pub fn new(paths: &'a PathsResolver) -> Self {
        Self { paths }
    }

    pub fn apply(&self, modules: Vec<Module>, context: &WorkspaceContext) -> Vec<Module> {
        if context.is_full_workspace_import() {
            self.fix_full_workspace(modules)
        } else {
            self.fix_explicit_scopes(modules, context)
        }
    }

    /// Full-workspace scope: the workspace root itself must be a module
    /// root. At most one synthetic module is ever added.
    fn fix_full_workspace(&self, mut modules: Vec<Module>) -> Vec<Module> {
        let workspace_root = self.paths.workspace_root().to_path_buf();
        let exclude_dirs = self.convenience_symlinks();

        if existing_source_roots(&modules).contains(&workspace_root) {
            // A real module already covers the root; attach the symlink
            // exclusions to it instead of adding a placeholder.
            for module in &mut modules {
                if module.source_set.source_roots.contains(&workspace_root) {
                    module.outputs.extend(exclude_dirs.iter().cloned());
                }
            }
            return modules;
        }

        modules.push(synthetic_module(
            "workspace-root",
            workspace_root,
            exclude_dirs,
        ));
        modules
    }

    /// Bazel's convenience symlinks at the workspace root; the IDE must
    /// exclude them or the tree fills with build outputs.
    fn convenience_symlinks(&self) -> BTreeSet<PathBuf> {
        let workspace_root = self.paths.workspace_root();
        let mut names = vec![
            "out".to_string(),
            "testlogs".to_string(),
            "bin".to_string(),
        ];
        names.push(self.paths.info().exec_root_symlink_name());
        names
            .into_iter()
            .map(|name| workspace_root.join(format!("bazel-{name}")))
            .collect()
    }

    /// Explicit scope entries: each surviving expected root directory not
    /// covered by a real module's source root gets a placeholder.
    fn fix_explicit_scopes(
        &self,
        mut modules: Vec<Module>,
        context: &WorkspaceContext,
    ) -> Vec<Module> {
        let existing = existing_source_roots(&modules);
        let workspace_root = self.paths.workspace_root().to_path_buf();

        for dir in self.expected_root_dirs(context) {
            if existing.contains(&dir) {
                continue;
            }
            let name = match dir.strip_prefix(&workspace_root) {
                Ok(relative) => format!("{}-modules-root", relative.display()),
                Err(_) => format!("{}-modules-root", dir.display()),
            };
            modules.push(synthetic_module(&name, dir, BTreeSet::new()));
        }
        modules
    }

    /// The root directories the configured scope entries imply: normalize
    /// each entry, drop the ones that do not exist on disk, sort, and
    /// collapse entries nested under an already-kept entry so nested scopes
    /// do not produce nested placeholders.
    fn expected_root_dirs(&self, context: &WorkspaceContext) -> Vec<PathBuf> {
        let workspace_root = self.paths.workspace_root();

        let mut dirs: Vec<PathBuf> = context
            .targets
            .iter()
            .map(|spec| strip_scope_suffixes(strip_scope_prefixes(spec)))
            .map(|relative| workspace_root.join(relative))
            .filter(|dir| dir.exists())
            .collect();
        dirs.sort();
        dirs.dedup();

        let mut kept: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            match kept.last() {
                Some(current) if dir.starts_with(current) => {}
                _ => kept.push(dir),
            }
        }
        kept
    }
}

fn existing_source_roots(modules: &[Module]) -> BTreeSet<PathBuf> {
    modules
        .iter()
        .flat_map(|module| module.source_set.source_roots.iter().cloned())
        .collect()
}

fn strip_scope_suffixes(spec: &str) -> &str {
    let mut spec = spec;
    for suffix in [":all", "...", "/"] {
        spec = spec.strip_suffix(suffix).unwrap_or(spec);
    }
    spec
}

fn strip_scope_prefixes(spec: &str) -> &str {
    spec.strip_prefix("//").unwrap_or(spec)
}

fn synthetic_module(name: &str, base_directory: PathBuf, outputs: BTreeSet<PathBuf>) -> Module {
    Module {
        label: Label::new(name),
        is_synthetic: true,
        direct_dependencies: Vec::new(),
        languages: BTreeSet::new(),
        tags: BTreeSet::from([Tag::NoBuild]),
        base_directory: base_directory.clone(),
        source_set: SourceSet::default(),
        resources: BTreeSet::from([base_directory]),
        outputs,
        source_dependencies: BTreeSet::new(),
        language_data: None,
        environment: BTreeMap::new(),
    }
}

