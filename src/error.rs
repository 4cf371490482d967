use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal annotation errors: the run aborts and no plan is produced
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnotateError {
    #[error("record {index}: spray activation before any CONDITION_YAW set the drone heading")]
    NoReferenceHeading { index: usize },

    #[error("record {index}: metric scale needed before the first WAYPOINT")]
    MissingInitialWaypoint { index: usize },
}

/// Errors from reading or writing QGC WPL mission files
#[derive(Error, Debug)]
pub enum MissionFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing or unsupported header, expected \"QGC WPL 110\", found {0:?}")]
    BadHeader(String),

    #[error("line {line}: expected 12 tab separated fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: cannot parse column {column} value {value:?}")]
    BadValue {
        line: usize,
        column: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// CONDITION_DISTANCE already present in a plan handed to the inserter
    MisplacedCommand,
    /// Spray activation without trailing waypoints to measure
    MissingLookahead,
    /// Deactivation waypoint already preceded by distance triggered commands
    AlreadyAnnotated,
    /// Spray activation whose param2 is not a whole positive nozzle code
    InvalidActuatorCode,
}

/// Non-fatal finding, recorded and logged while the pass continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Position of the offending record in the input plan
    pub index: usize,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(index: usize, kind: DiagnosticKind, severity: Severity, message: String) -> Self {
        Self {
            index,
            kind,
            severity,
            message,
        }
    }

    /// Emit through the `log` facade.
    pub fn log(&self) {
        match self.severity {
            Severity::Warning => log::warn!("Parser[{}]: {}", self.index, self.message),
            Severity::Error => log::error!("Parser[{}]: {}", self.index, self.message),
        }
    }
}
