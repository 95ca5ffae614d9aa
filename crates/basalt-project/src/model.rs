use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use basalt_build_model::TargetInfo;
use basalt_core::Label;

use crate::languages::LanguageData;

/// Languages the resolver can recognize from a target's sources or kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    Java,
    Kotlin,
    Scala,
    Cpp,
    Python,
    Rust,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Java,
        Language::Kotlin,
        Language::Scala,
        Language::Cpp,
        Language::Python,
        Language::Rust,
    ];

    /// Source file extensions associated with the language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Java => &[".java"],
            Language::Kotlin => &[".kt", ".kts"],
            Language::Scala => &[".scala"],
            Language::Cpp => &[".cpp", ".cc", ".cxx", ".h", ".hpp"],
            Language::Python => &[".py"],
            Language::Rust => &[".rs"],
        }
    }

    /// Rule kinds that produce a binary for the language without listing
    /// sources directly.
    pub fn binary_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Java => &["java_binary"],
            Language::Kotlin => &["kt_jvm_binary"],
            Language::Scala => &["scala_binary"],
            Language::Cpp => &["cc_binary"],
            Language::Python => &["py_binary"],
            Language::Rust => &["rust_binary"],
        }
    }

    /// Infer a target's languages from its source extensions, falling back
    /// to its rule kind when the target lists no sources.
    pub fn infer(target: &TargetInfo) -> BTreeSet<Language> {
        if target.sources.is_empty() {
            Language::ALL
                .into_iter()
                .filter(|language| language.binary_kinds().contains(&target.kind.as_str()))
                .collect()
        } else {
            target
                .sources
                .iter()
                .flat_map(|source| {
                    Language::ALL.into_iter().filter(|language| {
                        language
                            .extensions()
                            .iter()
                            .any(|ext| source.relative_path.ends_with(ext))
                    })
                })
                .collect()
        }
    }
}

/// Classification tags attached to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Application,
    Test,
    Library,
    Manual,
    NoIde,
    NoBuild,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    pub sources: BTreeSet<PathBuf>,
    pub source_roots: BTreeSet<PathBuf>,
}

/// The IDE-facing analog of an editable, buildable target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub label: Label,
    /// Fabricated by the resolver for tree completeness, not backed by a
    /// real target.
    pub is_synthetic: bool,
    /// Ordered edges to other modules and libraries of the same project.
    pub direct_dependencies: Vec<Label>,
    pub languages: BTreeSet<Language>,
    pub tags: BTreeSet<Tag>,
    pub base_directory: PathBuf,
    pub source_set: SourceSet,
    pub resources: BTreeSet<PathBuf>,
    pub outputs: BTreeSet<PathBuf>,
    /// Source artifacts of dependencies, for jump-to-source navigation.
    pub source_dependencies: BTreeSet<PathBuf>,
    pub language_data: Option<LanguageData>,
    pub environment: BTreeMap<String, String>,
}

/// The IDE-facing analog of a prebuilt, non-editable dependency artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub label: Label,
    /// Binary artifacts.
    pub outputs: BTreeSet<PathBuf>,
    /// Source artifacts.
    pub sources: BTreeSet<PathBuf>,
    pub dependencies: Vec<Label>,
    /// ABI-only artifacts used for compile-only edges.
    pub interface_jars: BTreeSet<PathBuf>,
}

/// The resolved project model, rebuilt wholesale on every resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub workspace_root: PathBuf,
    pub modules: Vec<Module>,
    /// Reverse index from source and resource files to their owning target.
    pub source_to_target: BTreeMap<PathBuf, Label>,
    pub libraries: BTreeMap<Label, Library>,
    /// Target names known to the build tool that did not resolve to a module.
    pub invalid_targets: Vec<Label>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_build_model::FileLocation;

    #[test]
    fn languages_inferred_from_source_extensions() {
        let target = TargetInfo {
            id: Label::new("//a:a"),
            kind: "kt_jvm_library".to_string(),
            sources: vec![
                FileLocation::source("a/A.kt"),
                FileLocation::source("a/B.java"),
            ],
            ..TargetInfo::default()
        };
        assert_eq!(
            Language::infer(&target),
            BTreeSet::from([Language::Kotlin, Language::Java])
        );
    }

    #[test]
    fn sourceless_targets_fall_back_to_binary_kind() {
        let target = TargetInfo {
            id: Label::new("//a:bin"),
            kind: "java_binary".to_string(),
            ..TargetInfo::default()
        };
        assert_eq!(Language::infer(&target), BTreeSet::from([Language::Java]));

        let unknown = TargetInfo {
            id: Label::new("//a:gen"),
            kind: "genrule".to_string(),
            ..TargetInfo::default()
        };
        assert!(Language::infer(&unknown).is_empty());
    }
}
