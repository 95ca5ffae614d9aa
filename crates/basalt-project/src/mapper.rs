use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use basalt_bazel::{PathsResolver, TargetStore};
use basalt_build_model::TargetInfo;
use basalt_core::Label;
use rayon::prelude::*;

use crate::dependency_graph::DependencyGraph;
use crate::languages::LanguagePluginRegistry;
use crate::libraries::{concatenate_maps, LibrariesByTarget, LibraryResolver};
use crate::model::{Library, Module, Project, Tag};
use crate::module_graph::transform_bottom_up;
use crate::modules::{reverse_source_entries, ModuleBuilder};
use crate::tree_fix::ProjectTreeViewFix;
use crate::workspace_context::WorkspaceContext;
use crate::Result;

/// Source extensions that mark a target as carrying editable code.
const KNOWN_SOURCE_EXTENSIONS: [&str; 6] = [".java", ".kt", ".scala", ".py", ".sh", ".rs"];

/// Rule kinds imported as modules even without recognizable sources.
const KNOWN_BUILDABLE_KINDS: [&str; 9] = [
    "java_library",
    "java_binary",
    "kt_jvm_library",
    "kt_jvm_binary",
    "scala_library",
    "scala_binary",
    "rust_test",
    "rust_doc",
    "rust_doc_test",
];

/// Maps the exported build graph to the IDE project model.
#[derive(Debug)]
pub struct ProjectMapper {
    paths: Arc<PathsResolver>,
    plugins: LanguagePluginRegistry,
}

impl ProjectMapper {
    pub fn new(paths: Arc<PathsResolver>) -> Self {
        let plugins = LanguagePluginRegistry::new(paths.clone());
        Self { paths, plugins }
    }

    pub fn create_project(
        &self,
        store: &TargetStore,
        root_targets: &BTreeSet<Label>,
        all_target_names: &[Label],
        context: &WorkspaceContext,
    ) -> Result<Project> {
        let graph = DependencyGraph::new(store.as_map());
        let roots: Vec<Label> = root_targets.iter().cloned().collect();

        let targets_to_import: Vec<&TargetInfo> = stage("select targets", || {
            graph
                .all_targets_at_depth(context.import_depth, &roots)
                .into_iter()
                .filter(|info| self.is_workspace_target(info))
                .collect()
        });
        let imported_labels: BTreeSet<&Label> =
            targets_to_import.iter().map(|info| &info.id).collect();

        let targets_as_libraries: BTreeMap<&Label, &TargetInfo> = stage("targets as libraries", || {
            store
                .iter()
                .filter(|(label, _)| !imported_labels.contains(label))
                .collect()
        });

        let libraries = LibraryResolver::new(&self.paths);
        let annotation_processor_libraries = stage("annotation processor libraries", || {
            libraries.annotation_processor_libraries(&targets_to_import)
        });
        let stdlib_libraries = stage("kotlin stdlib libraries", || {
            libraries.kotlin_stdlib_libraries(&targets_to_import)
        });
        let libraries_from_deps =
            concatenate_maps(&[&annotation_processor_libraries, &stdlib_libraries]);

        let mut libraries_to_import: BTreeMap<Label, Library> =
            stage("libraries from targets and deps", || {
                let mut merged = libraries.libraries_from_excluded_targets(&targets_as_libraries);
                merged.extend(
                    libraries_from_deps
                        .values()
                        .flatten()
                        .map(|library| (library.label.clone(), library.clone())),
                );
                merged
            });

        let imported_by_label: BTreeMap<&Label, &TargetInfo> = targets_to_import
            .iter()
            .map(|info| (&info.id, *info))
            .collect();
        let jdeps_libraries = stage("libraries from jdeps", || {
            libraries.jdeps_libraries(&imported_by_label, &libraries_from_deps, &libraries_to_import)
        })?;
        libraries_to_import.extend(
            jdeps_libraries
                .values()
                .flatten()
                .map(|library| (library.label.clone(), library.clone())),
        );

        let extra_libraries = concatenate_maps(&[&libraries_from_deps, &jdeps_libraries]);

        let modules = stage("create modules", || {
            self.create_modules(&targets_to_import, &graph, &extra_libraries)
        })?;

        let modules = stage("post-process modules", || {
            transform_bottom_up(modules, |module, done| {
                self.plugins.plugin_for(&module.languages).post_process(module, done)
            })
        })?;

        let modules = stage("fix project tree", || {
            ProjectTreeViewFix::new(&self.paths).apply(modules, context)
        });

        let source_to_target = stage("build reverse sources", || {
            modules.iter().flat_map(reverse_source_entries).collect()
        });

        let invalid_targets = stage("collect invalid targets", || {
            self.invalid_targets(all_target_names, &imported_labels)
        });

        Ok(Project {
            workspace_root: self.paths.workspace_root().to_path_buf(),
            modules,
            source_to_target,
            libraries: libraries_to_import,
            invalid_targets,
        })
    }

    /// Build modules in parallel; results are collected in input order, so
    /// the final module list stays deterministic regardless of scheduling.
    /// NoIde modules participate in everything above but are dropped here,
    /// after every module's dependency edges have been computed.
    fn create_modules(
        &self,
        targets_to_import: &[&TargetInfo],
        graph: &DependencyGraph<'_>,
        extra_libraries: &LibrariesByTarget,
    ) -> Result<Vec<Module>> {
        let builder = ModuleBuilder::new(&self.paths, &self.plugins);
        let modules: Vec<Module> = targets_to_import
            .par_iter()
            .map(|info| {
                let extra = extra_libraries
                    .get(&info.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                builder.build(info, graph, extra)
            })
            .collect::<Result<_>>()?;

        Ok(modules
            .into_iter()
            .filter(|module| !module.tags.contains(&Tag::NoIde))
            .collect())
    }

    /// A target is opened as a module when it lives in the main repository
    /// and either carries recognizable sources or is of a known buildable
    /// kind. Everything else becomes a library or an invalid target.
    fn is_workspace_target(&self, info: &TargetInfo) -> bool {
        info.id
            .has_repository_prefix(self.paths.info().main_repository_prefix())
            && (has_known_sources(info) || KNOWN_BUILDABLE_KINDS.contains(&info.kind.as_str()))
    }

    fn invalid_targets(
        &self,
        all_target_names: &[Label],
        imported_labels: &BTreeSet<&Label>,
    ) -> Vec<Label> {
        let prefix = self.paths.info().main_repository_prefix();
        all_target_names
            .iter()
            .filter(|label| !crate::is_bookkeeping_target(label, prefix))
            .filter(|label| !imported_labels.contains(label))
            .cloned()
            .collect()
    }
}

fn has_known_sources(info: &TargetInfo) -> bool {
    info.sources.iter().any(|source| {
        KNOWN_SOURCE_EXTENSIONS
            .iter()
            .any(|ext| source.relative_path.ends_with(ext))
    })
}

/// Run one pipeline stage, logging its wall time.
pub(crate) fn stage<T>(name: &str, run: impl FnOnce() -> T) -> T {
    let started = Instant::now();
    let result = run();
    tracing::debug!(
        target = "basalt.project",
        stage = name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "stage finished"
    );
    result
}
