use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use basalt_bazel::PathsResolver;
use basalt_build_model::TargetInfo;

use super::{LanguageData, LanguagePlugin};
use crate::dependency_graph::DependencyGraph;

/// Directory names that conventionally mark a JVM source root
/// (`src/main/java`, `src/test/kotlin`, ...).
const SOURCE_ROOT_MARKERS: [&str; 3] = ["java", "kotlin", "scala"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JvmModuleData {
    /// The target's own binary jars.
    pub jars: BTreeSet<PathBuf>,
}

/// Shared plugin for Java, Kotlin and Scala targets.
#[derive(Debug)]
pub struct JvmLanguagePlugin {
    paths: Arc<PathsResolver>,
}

impl JvmLanguagePlugin {
    pub fn new(paths: Arc<PathsResolver>) -> Self {
        Self { paths }
    }
}

impl LanguagePlugin for JvmLanguagePlugin {
    fn resolve_module(&self, target: &TargetInfo) -> Option<LanguageData> {
        let jars: BTreeSet<PathBuf> = target
            .binary_jars()
            .map(|jar| self.paths.resolve(jar))
            .collect();
        Some(LanguageData::Jvm(JvmModuleData { jars }))
    }

    fn dependency_sources(
        &self,
        target: &TargetInfo,
        graph: &DependencyGraph<'_>,
    ) -> BTreeSet<PathBuf> {
        graph
            .transitive_dependencies(&target.id)
            .into_iter()
            .flat_map(|dep| dep.source_jars())
            .map(|jar| self.paths.resolve(jar))
            .collect()
    }

    fn calculate_source_root(&self, source: &Path) -> Option<PathBuf> {
        for ancestor in source.ancestors().skip(1) {
            let Some(name) = ancestor.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if SOURCE_ROOT_MARKERS.contains(&name) {
                return Some(ancestor.to_path_buf());
            }
        }
        source.parent().map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_bazel::{BazelInfo, BazelRelease};

    fn plugin() -> JvmLanguagePlugin {
        JvmLanguagePlugin::new(Arc::new(PathsResolver::new(BazelInfo {
            workspace_root: PathBuf::from("/ws"),
            exec_root: PathBuf::from("/cache/execroot/ws"),
            output_base: PathBuf::from("/cache"),
            release: BazelRelease::new(5),
            bzlmod_enabled: false,
        })))
    }

    #[test]
    fn source_root_stops_at_conventional_marker() {
        let plugin = plugin();
        assert_eq!(
            plugin.calculate_source_root(Path::new("/ws/server/src/main/java/com/x/A.java")),
            Some(PathBuf::from("/ws/server/src/main/java"))
        );
    }

    #[test]
    fn source_root_falls_back_to_the_parent_directory() {
        let plugin = plugin();
        assert_eq!(
            plugin.calculate_source_root(Path::new("/ws/tools/Gen.kt")),
            Some(PathBuf::from("/ws/tools"))
        );
    }
}
