//! Hole reachability analysis
//!
//! The pipeline evaluates each hole's geometry, classifies it against the
//! configured thresholds, rolls statuses up to object flags and summarizes
//! the run.

pub mod aggregate;
pub mod classify;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod stats;
pub mod validate;

pub use aggregate::{ObjectAggregator, ObjectFlags, ObjectGroups};
pub use classify::{Classification, HoleClassifier, Reachability, Severity, Thresholds};
pub use geometry::{Geometry, VolumeModel};
pub use model::{Dataset, HoleRecord, ObjectRecord};
pub use pipeline::{analyze, Analysis, AnnotatedHole, AnnotatedObject, Pipeline, RunSettings};
pub use stats::{Distribution, Metric, Summary};
