use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use basalt_bazel::{BazelInfo, BazelRelease, PathsResolver};
use basalt_build_model::{FileLocation, TargetInfo};
use basalt_core::Label;
use basalt_project::{ProjectProvider, ProjectResolver, ResolveInputs, WorkspaceContext};

struct TestWorkspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
    descriptor_dir: PathBuf,
    paths: Arc<PathsResolver>,
}

impl TestWorkspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("workspace");
        let descriptor_dir = dir.path().join("aspect-out");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&descriptor_dir).unwrap();

        let paths = Arc::new(PathsResolver::new(BazelInfo {
            workspace_root: root.clone(),
            exec_root: dir.path().join("execroot").join("workspace"),
            output_base: dir.path().join("output_base"),
            release: BazelRelease::new(5),
            bzlmod_enabled: false,
        }));

        Self {
            _dir: dir,
            root,
            descriptor_dir,
            paths,
        }
    }

    fn write_descriptor(&self, name: &str, info: &TargetInfo) -> PathBuf {
        let path = self.descriptor_dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(info).unwrap()).unwrap();
        path
    }

    fn write_source(&self, relative: &str) -> FileLocation {
        let path = self.root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
        FileLocation::source(relative)
    }

    fn provider(&self) -> ProjectProvider {
        let context = WorkspaceContext {
            import_depth: Some(0),
            ..WorkspaceContext::new(&self.root)
        };
        ProjectProvider::new(ProjectResolver::new(self.paths.clone(), context))
    }
}

fn inputs(ws: &TestWorkspace) -> ResolveInputs {
    let target = TargetInfo {
        id: Label::new("//a:a"),
        kind: "java_library".to_string(),
        sources: vec![ws.write_source("a/A.java")],
        ..TargetInfo::default()
    };
    ResolveInputs {
        descriptor_files: vec![ws.write_descriptor("a.json", &target)],
        root_targets: BTreeSet::from([Label::new("//a:a")]),
        all_target_names: Vec::new(),
    }
}

#[test]
fn get_serves_the_cached_project() {
    let ws = TestWorkspace::new();
    let provider = ws.provider();
    let inputs = inputs(&ws);

    assert!(provider.current().is_none());
    let first = provider.get(&inputs).unwrap();
    let second = provider.get(&inputs).unwrap();
    assert!(Arc::ptr_eq(&first, &second), "cached value is reused");
    assert_eq!(first.modules.len(), 1);
}

#[test]
fn refresh_replaces_the_cached_project_wholesale() {
    let ws = TestWorkspace::new();
    let provider = ws.provider();
    let inputs = inputs(&ws);

    let first = provider.get(&inputs).unwrap();
    let refreshed = provider.refresh(&inputs).unwrap();
    assert!(!Arc::ptr_eq(&first, &refreshed), "refresh recomputes");
    assert_eq!(*first, *refreshed, "same inputs resolve structurally equal");

    let current = provider.current().unwrap();
    assert!(Arc::ptr_eq(&refreshed, &current));
}

#[test]
fn concurrent_first_callers_resolve_once() {
    let ws = TestWorkspace::new();
    let provider = Arc::new(ws.provider());
    let inputs = Arc::new(inputs(&ws));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let provider = provider.clone();
        let inputs = inputs.clone();
        handles.push(std::thread::spawn(move || provider.get(&inputs).unwrap()));
    }

    let projects: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    for project in &projects {
        assert!(
            Arc::ptr_eq(project, &projects[0]),
            "all callers share one resolution"
        );
    }
}
