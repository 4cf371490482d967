//! Spray mission plan annotation
//!
//! Two passes over QGC WPL mission plans for a front/back nozzle sprayer:
//! [`OrientationAnnotator`] picks the nozzle set for every spray leg from the
//! drone heading and travel direction, and [`LookaheadInserter`] adds distance
//! triggered switch commands ahead of every "spray off" waypoint.

pub mod annotate;
pub mod error;
pub mod geometry;
pub mod mission_file;
pub mod report;
pub mod types;

pub use annotate::{
    resolve_command, run_pipeline, ActuatorCommand, Annotated, HeadingWindow, LookaheadConfig,
    LookaheadInserter, OrientationAnnotator,
};
pub use error::{AnnotateError, Diagnostic, DiagnosticKind, MissionFileError, Severity};
pub use geometry::{GeoPoint, GeoScale};
pub use types::{ActuatorCode, CommandRecord, MissionPlan};
