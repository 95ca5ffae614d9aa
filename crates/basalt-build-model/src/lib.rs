//! Aspect descriptor model shared across Basalt's Bazel integration.
//!
//! These types mirror the per-target descriptors an aspect run exports for
//! every node of the build graph. They are produced externally and consumed
//! read-only by the resolution pipeline; this crate is pure data.

use std::collections::BTreeMap;

use basalt_core::Label;
use serde::{Deserialize, Serialize};

/// A file path as reported by the build tool.
///
/// Locations are workspace-relative for checked-in sources and
/// execution-root-relative for generated artifacts; resolution to an
/// absolute path is a consumer concern (`basalt-bazel`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    pub relative_path: String,
    #[serde(default)]
    pub root_execution_path_fragment: String,
    #[serde(default)]
    pub is_source: bool,
    #[serde(default)]
    pub is_external: bool,
}

impl FileLocation {
    pub fn source(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            root_execution_path_fragment: String::new(),
            is_source: true,
            is_external: false,
        }
    }

    pub fn output(
        root_execution_path_fragment: impl Into<String>,
        relative_path: impl Into<String>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            root_execution_path_fragment: root_execution_path_fragment.into(),
            is_source: false,
            is_external: false,
        }
    }

}

/// A declared dependency edge of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub id: Label,
}

impl Dependency {
    pub fn new(id: impl Into<Label>) -> Self {
        Self { id: id.into() }
    }
}

/// Binary/interface/source jars produced for one compilation output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JarGroup {
    #[serde(default)]
    pub binary_jars: Vec<FileLocation>,
    #[serde(default)]
    pub interface_jars: Vec<FileLocation>,
    #[serde(default)]
    pub source_jars: Vec<FileLocation>,
}

/// JVM-specific facts exported for a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmTargetInfo {
    /// Jars produced by the target itself.
    #[serde(default)]
    pub jars: Vec<JarGroup>,
    /// Jars produced by annotation processing for this target.
    #[serde(default)]
    pub generated_jars: Vec<JarGroup>,
    /// Compiler-emitted usage reports (one per compilation action).
    #[serde(default)]
    pub jdeps: Vec<FileLocation>,
    /// The full compile classpath the toolchain passed to the compiler.
    #[serde(default)]
    pub compile_classpath: Vec<FileLocation>,
}

/// A single build target's exported descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub id: Label,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub sources: Vec<FileLocation>,
    #[serde(default)]
    pub resources: Vec<FileLocation>,
    /// Free-form rule tags (`manual`, `no-ide`, ...).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Environment explicitly set on the target.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Environment variable names the target inherits from the process.
    #[serde(default)]
    pub env_inherit: Vec<String>,
    #[serde(default)]
    pub jvm: Option<JvmTargetInfo>,
}

impl TargetInfo {
    pub fn dependency_labels(&self) -> impl Iterator<Item = &Label> {
        self.dependencies.iter().map(|dep| &dep.id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Jars other targets compile against (binary outputs).
    pub fn binary_jars(&self) -> impl Iterator<Item = &FileLocation> {
        self.jvm
            .iter()
            .flat_map(|jvm| jvm.jars.iter())
            .flat_map(|group| group.binary_jars.iter())
    }

    /// ABI-only jars used for compile-only edges.
    pub fn interface_jars(&self) -> impl Iterator<Item = &FileLocation> {
        self.jvm
            .iter()
            .flat_map(|jvm| jvm.jars.iter())
            .flat_map(|group| group.interface_jars.iter())
    }

    /// Source jars attached to the target's own outputs.
    pub fn source_jars(&self) -> impl Iterator<Item = &FileLocation> {
        self.jvm
            .iter()
            .flat_map(|jvm| jvm.jars.iter())
            .flat_map(|group| group.source_jars.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_roundtrips_with_defaults() {
        let json = r#"{"id": "//a:a", "kind": "java_library"}"#;
        let info: TargetInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id, Label::new("//a:a"));
        assert_eq!(info.kind, "java_library");
        assert!(info.dependencies.is_empty());
        assert!(info.jvm.is_none());
    }

    #[test]
    fn jar_accessors_flatten_groups() {
        let info = TargetInfo {
            id: Label::new("//a:a"),
            jvm: Some(JvmTargetInfo {
                jars: vec![
                    JarGroup {
                        binary_jars: vec![FileLocation::output("bazel-out/bin", "a/liba.jar")],
                        ..JarGroup::default()
                    },
                    JarGroup {
                        binary_jars: vec![FileLocation::output("bazel-out/bin", "a/liba2.jar")],
                        source_jars: vec![FileLocation::output("bazel-out/bin", "a/liba-src.jar")],
                        ..JarGroup::default()
                    },
                ],
                ..JvmTargetInfo::default()
            }),
            ..TargetInfo::default()
        };

        assert_eq!(info.binary_jars().count(), 2);
        assert_eq!(info.source_jars().count(), 1);
        assert_eq!(info.interface_jars().count(), 0);
    }
}
