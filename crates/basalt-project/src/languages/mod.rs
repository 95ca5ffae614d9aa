//! Language plugin hook points.
//!
//! Per-language detail extraction belongs to plugin implementations; the
//! pipeline only depends on this interface and on the registry's dispatch
//! by language set.

mod jvm;

pub use jvm::{JvmLanguagePlugin, JvmModuleData};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use basalt_bazel::PathsResolver;
use basalt_build_model::TargetInfo;
use basalt_core::Label;

use crate::dependency_graph::DependencyGraph;
use crate::model::{Language, Module};

/// Per-language module facts, owned by the plugin that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageData {
    Jvm(JvmModuleData),
}

/// The capability interface a language integration implements.
///
/// All methods have conservative defaults so a plugin only overrides what
/// its language actually needs.
pub trait LanguagePlugin: Send + Sync + fmt::Debug {
    /// Language-specific module facts, opaque to the pipeline.
    fn resolve_module(&self, _target: &TargetInfo) -> Option<LanguageData> {
        None
    }

    /// Source artifacts of the target's dependencies, for navigation.
    fn dependency_sources(
        &self,
        _target: &TargetInfo,
        _graph: &DependencyGraph<'_>,
    ) -> BTreeSet<PathBuf> {
        BTreeSet::new()
    }

    /// The source root a source file belongs to, if the plugin can tell.
    fn calculate_source_root(&self, _source: &Path) -> Option<PathBuf> {
        None
    }

    /// Rewrite a module once all of its in-graph dependencies have been
    /// post-processed; `processed` holds the already-transformed
    /// dependencies. Must preserve the module's label.
    fn post_process(&self, module: Module, _processed: &BTreeMap<Label, Module>) -> Module {
        module
    }
}

/// Plugin that applies to languages without a dedicated integration.
#[derive(Debug, Default)]
pub struct NoopLanguagePlugin;

impl LanguagePlugin for NoopLanguagePlugin {}

/// Selects the plugin responsible for a module's language set.
#[derive(Debug)]
pub struct LanguagePluginRegistry {
    jvm: JvmLanguagePlugin,
    noop: NoopLanguagePlugin,
}

impl LanguagePluginRegistry {
    pub fn new(paths: Arc<PathsResolver>) -> Self {
        Self {
            jvm: JvmLanguagePlugin::new(paths),
            noop: NoopLanguagePlugin,
        }
    }

    pub fn plugin_for(&self, languages: &BTreeSet<Language>) -> &dyn LanguagePlugin {
        if languages.contains(&Language::Scala)
            || languages.contains(&Language::Java)
            || languages.contains(&Language::Kotlin)
        {
            &self.jvm
        } else {
            &self.noop
        }
    }
}
