//! The Basalt project resolution pipeline.
//!
//! Turns a Bazel workspace's exported build graph into a normalized IDE
//! project model:
//! - depth-bounded selection of the targets to open as editable modules
//! - library inference for everything else (excluded targets, annotation
//!   processor outputs, the shared Kotlin stdlib, toolchain-injected jars
//!   discovered via jdeps usage reports)
//! - per-target module construction with language plugin hook points
//! - synthetic placeholder modules for IDE tree completeness
//! - a cycle-safe bottom-up transform over the module graph
//!
//! Every resolution rebuilds the full model from the supplied inputs; the
//! resulting [`Project`] replaces the previously cached one wholesale.

mod dependency_graph;
pub mod languages;
mod libraries;
mod mapper;
mod model;
mod module_graph;
mod modules;
mod provider;
mod resolver;
mod target_kind;
mod tree_fix;
mod workspace_context;

pub use crate::{
    dependency_graph::DependencyGraph,
    libraries::{LibrariesByTarget, LibraryResolver},
    mapper::ProjectMapper,
    model::{Language, Library, Module, Project, SourceSet, Tag},
    module_graph::{transform_bottom_up, ModuleGraphError},
    modules::ModuleBuilder,
    provider::ProjectProvider,
    resolver::{ProjectResolver, ResolveInputs},
    target_kind::resolve_tags,
    tree_fix::ProjectTreeViewFix,
    workspace_context::WorkspaceContext,
};

use basalt_core::Label;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Label(#[from] basalt_bazel::LabelError),

    #[error(transparent)]
    Store(#[from] basalt_bazel::TargetStoreError),

    #[error(transparent)]
    Graph(#[from] ModuleGraphError),
}

pub type Result<T> = std::result::Result<T, ProjectError>;

/// Targets under this package are resolver bookkeeping, not user code, and
/// never count as invalid just because they were not imported.
pub(crate) fn is_bookkeeping_target(label: &Label, main_repository_prefix: &str) -> bool {
    label
        .as_str()
        .strip_prefix(main_repository_prefix)
        .is_some_and(|rest| rest.starts_with(".basalt"))
}
