use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use basalt_bazel::PathsResolver;
use basalt_build_model::TargetInfo;
use basalt_core::Label;

use crate::dependency_graph::DependencyGraph;
use crate::languages::LanguagePluginRegistry;
use crate::model::{Language, Module, SourceSet};
use crate::target_kind::resolve_tags;
use crate::{Library, Result};

/// Builds one [`Module`] per imported target.
#[derive(Debug)]
pub struct ModuleBuilder<'a> {
    paths: &'a PathsResolver,
    plugins: &'a LanguagePluginRegistry,
}

impl<'a> ModuleBuilder<'a> {
    pub fn new(paths: &'a PathsResolver, plugins: &'a LanguagePluginRegistry) -> Self {
        Self { paths, plugins }
    }

    /// Build the module for `target`, with `extra_libraries` contributing
    /// the dependency edges resolved by the library pass.
    pub fn build(
        &self,
        target: &TargetInfo,
        graph: &DependencyGraph<'_>,
        extra_libraries: &[Library],
    ) -> Result<Module> {
        let direct_dependencies: Vec<Label> = target
            .dependency_labels()
            .cloned()
            .chain(extra_libraries.iter().map(|library| library.label.clone()))
            .collect();

        let languages = Language::infer(target);
        let tags = resolve_tags(target);
        let base_directory = self.paths.label_to_directory(&target.id)?;
        let plugin = self.plugins.plugin_for(&languages);

        let source_set = self.resolve_source_set(target, plugin);
        let resources = target
            .resources
            .iter()
            .map(|resource| self.paths.resolve(resource))
            .collect();
        let language_data = plugin.resolve_module(target);
        let source_dependencies = plugin.dependency_sources(target, graph);
        let environment = resolve_environment(target);

        Ok(Module {
            label: target.id.clone(),
            is_synthetic: false,
            direct_dependencies,
            languages,
            tags,
            base_directory,
            source_set,
            resources,
            outputs: BTreeSet::new(),
            source_dependencies,
            language_data,
            environment,
        })
    }

    fn resolve_source_set(
        &self,
        target: &TargetInfo,
        plugin: &dyn crate::languages::LanguagePlugin,
    ) -> SourceSet {
        let mut sources = BTreeSet::new();
        for location in &target.sources {
            let path = self.paths.resolve(location);
            if !path.exists() {
                tracing::warn!(
                    target = "basalt.project",
                    label = %target.id,
                    path = %path.display(),
                    "source file does not exist; dropping from source set"
                );
                continue;
            }
            sources.insert(path);
        }

        let source_roots = sources
            .iter()
            .filter_map(|source| plugin.calculate_source_root(source))
            .collect();

        SourceSet {
            sources,
            source_roots,
        }
    }
}

/// Process environment entries the target asked to inherit, overlaid by
/// its own explicit environment (the target's entries win).
fn resolve_environment(target: &TargetInfo) -> BTreeMap<String, String> {
    let mut environment: BTreeMap<String, String> = target
        .env_inherit
        .iter()
        .filter_map(|name| std::env::var(name).ok().map(|value| (name.clone(), value)))
        .collect();
    environment.extend(
        target
            .env
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    environment
}

/// Reverse index entry paths for one module: its sources and resources.
pub(crate) fn reverse_source_entries(module: &Module) -> impl Iterator<Item = (PathBuf, Label)> + '_ {
    module
        .source_set
        .sources
        .iter()
        .chain(module.resources.iter())
        .map(move |path| (path.clone(), module.label.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_environment_wins_over_inherited() {
        let unique_name = "BASALT_MODULES_TEST_ENV";
        std::env::set_var(unique_name, "from-process");

        let target = TargetInfo {
            id: Label::new("//a:a"),
            env_inherit: vec![unique_name.to_string(), "BASALT_UNSET_ENV".to_string()],
            env: BTreeMap::from([(unique_name.to_string(), "from-target".to_string())]),
            ..TargetInfo::default()
        };

        let environment = resolve_environment(&target);
        assert_eq!(
            environment.get(unique_name).map(String::as_str),
            Some("from-target")
        );
        assert!(!environment.contains_key("BASALT_UNSET_ENV"));

        std::env::remove_var(unique_name);
    }
}
