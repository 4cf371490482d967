pub mod lookahead;
pub mod orientation;

pub use lookahead::{resolve_command, ActuatorCommand, LookaheadConfig, LookaheadInserter};
pub use orientation::{HeadingWindow, OrientationAnnotator};

use crate::error::{AnnotateError, Diagnostic, DiagnosticKind, Severity};
use crate::types::MissionPlan;

/// Output of an annotation pass: the new plan plus everything worth reporting.
#[derive(Clone, Debug, Default)]
pub struct Annotated {
    pub plan: MissionPlan,
    pub diagnostics: Vec<Diagnostic>,
}

impl Annotated {
    pub fn new(plan: MissionPlan) -> Self {
        Self {
            plan,
            diagnostics: Vec::new(),
        }
    }

    /// Record and log a non-fatal finding.
    pub(crate) fn report(
        &mut self,
        index: usize,
        kind: DiagnosticKind,
        severity: Severity,
        message: String,
    ) {
        let diagnostic = Diagnostic::new(index, kind, severity, message);
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

/// Front/back resolution followed by lookahead insertion.
///
/// Diagnostics of both passes are concatenated; indices refer to the plan each
/// pass received.
pub fn run_pipeline(
    plan: &MissionPlan,
    config: &LookaheadConfig,
) -> Result<Annotated, AnnotateError> {
    let oriented = OrientationAnnotator::new().annotate(plan)?;
    let inserted = LookaheadInserter::new(config.clone()).insert(&oriented.plan);

    let mut diagnostics = oriented.diagnostics;
    diagnostics.extend(inserted.diagnostics);
    Ok(Annotated {
        plan: inserted.plan,
        diagnostics,
    })
}
