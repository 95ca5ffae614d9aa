use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use basalt_bazel::{read_usage_report, PathsResolver};
use basalt_build_model::{FileLocation, TargetInfo};
use basalt_core::Label;

use crate::model::{Language, Library};
use crate::Result;

/// Where the Kotlin rules materialize the compiler distribution; classpath
/// entries under `lib/` there are the runtime's standard library jars.
const KOTLIN_STDLIB_ROOT_EXECUTION: &str = "external/com_github_jetbrains_kotlin";
const KOTLIN_STDLIB_RELATIVE_PATH_PREFIX: &str = "lib/";
const KOTLIN_STDLIB_LABEL: &str = "rules_kotlin_kotlin-stdlibs";

/// Extra library edges keyed by the target that owns them.
pub type LibrariesByTarget = BTreeMap<Label, Vec<Library>>;

/// Computes the non-module ("library") side of the dependency graph from
/// its four sources: excluded targets, annotation processor outputs, the
/// shared Kotlin stdlib aggregate, and jdeps-discovered implicit jars.
#[derive(Debug)]
pub struct LibraryResolver<'a> {
    paths: &'a PathsResolver,
}

impl<'a> LibraryResolver<'a> {
    pub fn new(paths: &'a PathsResolver) -> Self {
        Self { paths }
    }

    /// One library per known target that did not qualify as a module.
    pub fn libraries_from_excluded_targets(
        &self,
        targets: &BTreeMap<&Label, &TargetInfo>,
    ) -> BTreeMap<Label, Library> {
        targets
            .iter()
            .map(|(label, info)| {
                let library = Library {
                    label: (*label).clone(),
                    outputs: self.resolve_set(info.binary_jars()),
                    sources: self.resolve_set(info.source_jars()),
                    dependencies: info.dependency_labels().cloned().collect(),
                    interface_jars: self.resolve_set(info.interface_jars()),
                };
                ((*label).clone(), library)
            })
            .collect()
    }

    /// One `<label>_generated` library per imported target with annotation
    /// processor output jars, owned by exactly that target.
    pub fn annotation_processor_libraries(
        &self,
        targets_to_import: &[&TargetInfo],
    ) -> LibrariesByTarget {
        targets_to_import
            .iter()
            .filter_map(|info| {
                let jvm = info.jvm.as_ref()?;
                if jvm.generated_jars.is_empty() {
                    return None;
                }
                let library = Library {
                    label: Label::new(format!("{}_generated", info.id)),
                    outputs: self.resolve_set(
                        jvm.generated_jars.iter().flat_map(|group| &group.binary_jars),
                    ),
                    sources: self.resolve_set(
                        jvm.generated_jars.iter().flat_map(|group| &group.source_jars),
                    ),
                    dependencies: Vec::new(),
                    interface_jars: BTreeSet::new(),
                };
                Some((info.id.clone(), vec![library]))
            })
            .collect()
    }

    /// The single project-wide Kotlin stdlib aggregate.
    ///
    /// Stdlib jars appear on the compile classpath of every Kotlin target;
    /// aggregating all matches into one shared node keeps the project from
    /// growing a per-target copy of the same jars.
    pub fn kotlin_stdlib_libraries(&self, targets_to_import: &[&TargetInfo]) -> LibrariesByTarget {
        let stdlib_jars: BTreeSet<PathBuf> = targets_to_import
            .iter()
            .flat_map(|info| self.stdlib_classpath_entries(info))
            .map(|entry| self.paths.resolve(entry))
            .collect();
        if stdlib_jars.is_empty() {
            return LibrariesByTarget::new();
        }

        let library = Library {
            label: Label::new(KOTLIN_STDLIB_LABEL),
            outputs: stdlib_jars,
            sources: BTreeSet::new(),
            dependencies: Vec::new(),
            interface_jars: BTreeSet::new(),
        };

        targets_to_import
            .iter()
            .filter(|info| self.stdlib_classpath_entries(info).next().is_some())
            .map(|info| (info.id.clone(), vec![library.clone()]))
            .collect()
    }

    fn stdlib_classpath_entries<'t>(
        &self,
        info: &'t TargetInfo,
    ) -> impl Iterator<Item = &'t FileLocation> {
        info.jvm
            .iter()
            .flat_map(|jvm| jvm.compile_classpath.iter())
            .filter(|entry| is_kotlin_stdlib_path(entry))
    }

    /// Jars the toolchain injected behind the target's back.
    ///
    /// A target's usage report can name jars that are not reachable through
    /// its declared dependencies (toolchain-injected, rule-injected). Those
    /// jars, and only those, become minimal implicit libraries: reported
    /// jars minus everything reachable through the target's declared deps
    /// and already-resolved extra library edges.
    pub fn jdeps_libraries(
        &self,
        targets_to_import: &BTreeMap<&Label, &TargetInfo>,
        library_dependencies: &LibrariesByTarget,
        libraries_to_import: &BTreeMap<Label, Library>,
    ) -> Result<LibrariesByTarget> {
        let mut shared: BTreeMap<Label, Library> = BTreeMap::new();
        let mut result = LibrariesByTarget::new();

        for (label, info) in targets_to_import {
            if !target_supports_jdeps(info) {
                continue;
            }

            let closure_jars = self.output_jars_from_transitive_deps(
                info,
                targets_to_import,
                library_dependencies,
                libraries_to_import,
            );
            let reported_jars = self.jars_from_usage_reports(info)?;

            let implicit: Vec<&PathBuf> = reported_jars.difference(&closure_jars).collect();
            if implicit.is_empty() {
                continue;
            }

            let libraries = implicit
                .into_iter()
                .map(|jar| {
                    shared
                        .entry(synthetic_label(jar))
                        .or_insert_with(|| Library {
                            label: synthetic_label(jar),
                            outputs: BTreeSet::from([jar.clone()]),
                            sources: BTreeSet::new(),
                            dependencies: Vec::new(),
                            interface_jars: BTreeSet::new(),
                        })
                        .clone()
                })
                .collect();
            result.insert((*label).clone(), libraries);
        }

        Ok(result)
    }

    /// Every binary/interface jar reachable from the target's declared
    /// dependencies and extra library edges, by iterative frontier
    /// expansion over both target and library edges.
    fn output_jars_from_transitive_deps(
        &self,
        info: &TargetInfo,
        targets_to_import: &BTreeMap<&Label, &TargetInfo>,
        library_dependencies: &LibrariesByTarget,
        libraries_to_import: &BTreeMap<Label, Library>,
    ) -> BTreeSet<PathBuf> {
        let mut visited: BTreeSet<Label> = BTreeSet::new();
        let mut frontier: Vec<Label> = info.dependency_labels().cloned().collect();
        frontier.extend(
            library_dependencies
                .get(&info.id)
                .into_iter()
                .flatten()
                .map(|library| library.label.clone()),
        );

        while let Some(current) = frontier.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(target) = targets_to_import.get(&current) {
                frontier.extend(target.dependency_labels().cloned());
                frontier.extend(
                    library_dependencies
                        .get(&current)
                        .into_iter()
                        .flatten()
                        .map(|library| library.label.clone()),
                );
            }
            if let Some(library) = libraries_to_import.get(&current) {
                frontier.extend(library.dependencies.iter().cloned());
            }
        }

        let mut jars = BTreeSet::new();
        for label in &visited {
            if let Some(target) = targets_to_import.get(label) {
                jars.extend(
                    target
                        .binary_jars()
                        .chain(target.interface_jars())
                        .map(|jar| self.paths.resolve(jar)),
                );
            }
            if let Some(library) = libraries_to_import.get(label) {
                jars.extend(library.outputs.iter().cloned());
                jars.extend(library.interface_jars.iter().cloned());
            }
        }
        jars
    }

    fn jars_from_usage_reports(&self, info: &TargetInfo) -> Result<BTreeSet<PathBuf>> {
        let mut jars = BTreeSet::new();
        for report in info.jvm.iter().flat_map(|jvm| jvm.jdeps.iter()) {
            let report_path = self.paths.resolve(report);
            for exec_root_relative in read_usage_report(&report_path)? {
                jars.insert(self.paths.resolve_output(&exec_root_relative));
            }
        }
        Ok(jars)
    }

    fn resolve_set<'t>(
        &self,
        locations: impl IntoIterator<Item = &'t FileLocation>,
    ) -> BTreeSet<PathBuf> {
        locations
            .into_iter()
            .map(|location| self.paths.resolve(location))
            .collect()
    }
}

/// Union of per-target library maps; a target owning edges in several maps
/// owns their concatenation.
pub fn concatenate_maps(maps: &[&LibrariesByTarget]) -> LibrariesByTarget {
    let mut result = LibrariesByTarget::new();
    for map in maps {
        for (label, libraries) in *map {
            result
                .entry(label.clone())
                .or_default()
                .extend(libraries.iter().cloned());
        }
    }
    result
}

/// Only languages whose toolchain emits a post-compile usage report
/// qualify for implicit dependency discovery.
fn target_supports_jdeps(info: &TargetInfo) -> bool {
    let jvm_family = BTreeSet::from([Language::Java, Language::Kotlin, Language::Scala]);
    Language::infer(info).is_subset(&jvm_family)
}

fn is_kotlin_stdlib_path(entry: &FileLocation) -> bool {
    entry.root_execution_path_fragment == KOTLIN_STDLIB_ROOT_EXECUTION
        && entry
            .relative_path
            .starts_with(KOTLIN_STDLIB_RELATIVE_PATH_PREFIX)
}

/// A deterministic label for an implicit jar: the sanitized file name plus
/// a stable hash of the full path, so two targets reporting the same jar
/// share one library node.
fn synthetic_label(jar: &Path) -> Label {
    let digest = blake3::hash(jar.to_string_lossy().as_bytes()).to_hex();
    let name: String = jar
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    Label::new(format!("{name}-{digest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_labels_are_stable_and_collision_resistant() {
        let a = synthetic_label(Path::new("/out/bin/guava.jar"));
        let b = synthetic_label(Path::new("/out/bin/guava.jar"));
        let c = synthetic_label(Path::new("/other/bin/guava.jar"));

        assert_eq!(a, b);
        assert_ne!(a, c, "same file name under different paths must differ");
        assert!(a.as_str().starts_with("guava-jar-"));
    }

    #[test]
    fn stdlib_path_matching_requires_root_and_prefix() {
        assert!(is_kotlin_stdlib_path(&FileLocation {
            relative_path: "lib/kotlin-stdlib.jar".to_string(),
            root_execution_path_fragment: KOTLIN_STDLIB_ROOT_EXECUTION.to_string(),
            is_source: false,
            is_external: true,
        }));
        assert!(!is_kotlin_stdlib_path(&FileLocation {
            relative_path: "bin/kotlin-compiler.jar".to_string(),
            root_execution_path_fragment: KOTLIN_STDLIB_ROOT_EXECUTION.to_string(),
            is_source: false,
            is_external: true,
        }));
        assert!(!is_kotlin_stdlib_path(&FileLocation {
            relative_path: "lib/other.jar".to_string(),
            root_execution_path_fragment: "external/other_repo".to_string(),
            is_source: false,
            is_external: true,
        }));
    }
}
