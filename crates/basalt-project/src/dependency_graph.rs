use std::collections::{BTreeMap, HashSet};

use basalt_build_model::TargetInfo;
use basalt_core::Label;

/// A read-only index over the target universe answering reachability
/// questions. Not persisted; rebuilt per resolution.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    targets: &'a BTreeMap<Label, TargetInfo>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(targets: &'a BTreeMap<Label, TargetInfo>) -> Self {
        Self { targets }
    }

    /// All targets reachable from `roots` within `depth` dependency hops.
    ///
    /// Depth 0 returns exactly the root targets; each further hop adds the
    /// direct dependencies of everything already included. `None` expands
    /// until the frontier is exhausted. Labels absent from the store are
    /// skipped, not treated as errors. The result order is deterministic:
    /// roots in the given order, then breadth-first discovery order.
    pub fn all_targets_at_depth(
        &self,
        depth: Option<usize>,
        roots: &[Label],
    ) -> Vec<&'a TargetInfo> {
        let mut result = Vec::new();
        let mut seen: HashSet<&Label> = HashSet::new();
        let mut frontier: Vec<&Label> = roots.iter().collect();
        let mut hops = 0usize;

        loop {
            let mut next = Vec::new();
            for label in frontier {
                let Some(info) = self.targets.get(label) else {
                    continue;
                };
                if !seen.insert(&info.id) {
                    continue;
                }
                result.push(info);
                next.extend(info.dependency_labels());
            }

            if next.is_empty() || depth.is_some_and(|limit| hops >= limit) {
                break;
            }
            hops += 1;
            frontier = next;
        }

        result
    }

    /// Every target reachable from `label`'s declared dependencies,
    /// excluding `label` itself. Iterative, so dependency cycles in the
    /// input cannot recurse unboundedly.
    pub fn transitive_dependencies(&self, label: &Label) -> Vec<&'a TargetInfo> {
        let mut result = Vec::new();
        let mut seen: HashSet<&Label> = HashSet::new();
        seen.insert(label);

        let mut worklist: Vec<&Label> = match self.targets.get(label) {
            Some(info) => info.dependency_labels().collect(),
            None => return result,
        };

        while let Some(current) = worklist.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(info) = self.targets.get(current) {
                result.push(info);
                worklist.extend(info.dependency_labels());
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_build_model::Dependency;

    fn target(id: &str, deps: &[&str]) -> TargetInfo {
        TargetInfo {
            id: Label::new(id),
            dependencies: deps.iter().map(|dep| Dependency::new(*dep)).collect(),
            ..TargetInfo::default()
        }
    }

    fn universe(targets: &[TargetInfo]) -> BTreeMap<Label, TargetInfo> {
        targets
            .iter()
            .map(|info| (info.id.clone(), info.clone()))
            .collect()
    }

    fn labels(targets: &[&TargetInfo]) -> Vec<String> {
        targets.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn depth_zero_returns_exactly_the_roots() {
        let targets = universe(&[target("//a:a", &["//b:b"]), target("//b:b", &[])]);
        let graph = DependencyGraph::new(&targets);

        let result = graph.all_targets_at_depth(Some(0), &[Label::new("//a:a")]);
        assert_eq!(labels(&result), vec!["//a:a"]);
    }

    #[test]
    fn results_grow_monotonically_with_depth() {
        let targets = universe(&[
            target("//a:a", &["//b:b"]),
            target("//b:b", &["//c:c"]),
            target("//c:c", &[]),
        ]);
        let graph = DependencyGraph::new(&targets);
        let roots = [Label::new("//a:a")];

        let mut previous = Vec::new();
        for depth in 0..4 {
            let current = labels(&graph.all_targets_at_depth(Some(depth), &roots));
            assert!(
                current.len() >= previous.len(),
                "depth {depth} shrank the result"
            );
            assert!(current.starts_with(&previous));
            previous = current;
        }
        assert_eq!(previous, vec!["//a:a", "//b:b", "//c:c"]);
    }

    #[test]
    fn unknown_labels_are_skipped_not_errors() {
        let targets = universe(&[target("//a:a", &["@maven//:external", "//b:b"])]);
        let graph = DependencyGraph::new(&targets);

        let result = graph.all_targets_at_depth(None, &[Label::new("//a:a")]);
        assert_eq!(labels(&result), vec!["//a:a"]);
    }

    #[test]
    fn unlimited_depth_terminates_on_cycles() {
        let targets = universe(&[target("//a:a", &["//b:b"]), target("//b:b", &["//a:a"])]);
        let graph = DependencyGraph::new(&targets);

        let result = graph.all_targets_at_depth(None, &[Label::new("//a:a")]);
        assert_eq!(labels(&result), vec!["//a:a", "//b:b"]);
    }

    #[test]
    fn transitive_dependencies_exclude_the_target_itself() {
        let targets = universe(&[
            target("//a:a", &["//b:b"]),
            target("//b:b", &["//c:c", "//a:a"]),
            target("//c:c", &[]),
        ]);
        let graph = DependencyGraph::new(&targets);

        let mut result = labels(&graph.transitive_dependencies(&Label::new("//a:a")));
        result.sort();
        assert_eq!(result, vec!["//b:b", "//c:c"]);
    }
}
