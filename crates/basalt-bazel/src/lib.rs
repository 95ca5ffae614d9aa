//! Bazel workspace integration for Basalt.
//!
//! This crate covers the Bazel-specific ground the resolution pipeline
//! stands on:
//! - workspace metadata (`BazelInfo`, main-repository label prefixes)
//! - classification and resolution of build-tool file locations
//! - the aspect-output target store with a concurrent mtime-keyed cache
//! - parsing of compiler-emitted dependency usage reports (jdeps)
//!
//! Running Bazel itself (queries, aspect builds) is a collaborator
//! concern and intentionally absent here.

mod info;
mod jdeps;
mod paths;
mod target_store;

pub use crate::{
    info::{BazelInfo, BazelRelease},
    jdeps::{parse_usage_report, read_usage_report},
    paths::{FileLocationKind, LabelError, PathsResolver},
    target_store::{TargetInfoReader, TargetStore, TargetStoreError},
};
