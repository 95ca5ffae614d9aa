use std::sync::{Arc, Mutex};

use crate::model::Project;
use crate::resolver::{ProjectResolver, ResolveInputs};
use crate::Result;

/// Serves the current project, resolving at most once at a time.
///
/// A resolution either fully completes or fails; the cached project is
/// only ever replaced wholesale, never mutated. Callers that can live with
/// a stale model read the cache; callers that asked for a fresh model
/// queue up behind the single-writer gate.
#[derive(Debug)]
pub struct ProjectProvider {
    resolver: ProjectResolver,
    cached: Mutex<Option<Arc<Project>>>,
    refresh_gate: Mutex<()>,
}

impl ProjectProvider {
    pub fn new(resolver: ProjectResolver) -> Self {
        Self {
            resolver,
            cached: Mutex::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// The most recently resolved project, if any.
    pub fn current(&self) -> Option<Arc<Project>> {
        self.cached
            .lock()
            .expect("project cache lock poisoned")
            .clone()
    }

    /// The cached project, or a fresh resolution when none exists yet.
    ///
    /// Concurrent first callers block on the gate; only one of them
    /// resolves, the rest are served its result.
    pub fn get(&self, inputs: &ResolveInputs) -> Result<Arc<Project>> {
        if let Some(project) = self.current() {
            return Ok(project);
        }

        let _gate = self
            .refresh_gate
            .lock()
            .expect("project refresh gate poisoned");
        if let Some(project) = self.current() {
            return Ok(project);
        }
        self.resolve_and_store(inputs)
    }

    /// Resolve from scratch, replacing the cached project atomically.
    pub fn refresh(&self, inputs: &ResolveInputs) -> Result<Arc<Project>> {
        let _gate = self
            .refresh_gate
            .lock()
            .expect("project refresh gate poisoned");
        self.resolve_and_store(inputs)
    }

    fn resolve_and_store(&self, inputs: &ResolveInputs) -> Result<Arc<Project>> {
        let project = Arc::new(self.resolver.resolve(inputs)?);
        *self.cached.lock().expect("project cache lock poisoned") = Some(project.clone());
        Ok(project)
    }
}
