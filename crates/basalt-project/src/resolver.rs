use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use basalt_bazel::{PathsResolver, TargetInfoReader};
use basalt_core::Label;

use crate::mapper::{stage, ProjectMapper};
use crate::model::Project;
use crate::workspace_context::WorkspaceContext;
use crate::Result;

/// Everything one resolution consumes, produced by the build-invocation
/// collaborator (aspect run + build tool queries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveInputs {
    /// Aspect-output descriptor files, one per exported target.
    pub descriptor_files: Vec<PathBuf>,
    /// User/workspace-configured entry points.
    pub root_targets: BTreeSet<Label>,
    /// Every target name known to the build tool; only used to compute
    /// the invalid-target list.
    pub all_target_names: Vec<Label>,
}

/// Reads the target universe and constructs the [`Project`] instance.
#[derive(Debug)]
pub struct ProjectResolver {
    reader: TargetInfoReader,
    mapper: ProjectMapper,
    context: WorkspaceContext,
}

impl ProjectResolver {
    pub fn new(paths: Arc<PathsResolver>, context: WorkspaceContext) -> Self {
        Self {
            reader: TargetInfoReader::new(),
            mapper: ProjectMapper::new(paths),
            context,
        }
    }

    pub fn context(&self) -> &WorkspaceContext {
        &self.context
    }

    pub fn resolve(&self, inputs: &ResolveInputs) -> Result<Project> {
        let store = stage("parse aspect outputs", || {
            self.reader.read_target_map(&inputs.descriptor_files)
        })?;
        stage("map to internal model", || {
            self.mapper.create_project(
                &store,
                &inputs.root_targets,
                &inputs.all_target_names,
                &self.context,
            )
        })
    }
}
