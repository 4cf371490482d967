//! Distance triggered spray switching
//!
//! For every waypoint that is followed by "spray off", inserts up to two
//! CONDITION_DISTANCE + DO_SEND_SCRIPT_MESSAGE couples in front of the waypoint
//! so the nozzles switch before the vehicle reaches it. The far couple goes
//! first, the near one directly before the waypoint.

use serde::{Deserialize, Serialize};

use super::Annotated;
use crate::error::{DiagnosticKind, Severity};
use crate::types::{ActuatorCode, CommandRecord, MissionPlan};

/// Nozzle code to send when a distance trigger fires
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ActuatorCommand {
    /// Send the opposite of whatever is spraying (front <-> back)
    AutoInvert,
    Explicit(ActuatorCode),
}

impl From<u32> for ActuatorCommand {
    /// `0` is the command line convention for auto-invert.
    fn from(raw: u32) -> Self {
        if raw == 0 {
            ActuatorCommand::AutoInvert
        } else {
            ActuatorCommand::Explicit(ActuatorCode(raw))
        }
    }
}

impl From<ActuatorCommand> for u32 {
    fn from(command: ActuatorCommand) -> Self {
        match command {
            ActuatorCommand::AutoInvert => 0,
            ActuatorCommand::Explicit(code) => code.value(),
        }
    }
}

/// Explicit codes win; auto-invert swaps the active nozzle pairs.
pub fn resolve_command(requested: ActuatorCommand, active: ActuatorCode) -> ActuatorCode {
    match requested {
        ActuatorCommand::Explicit(code) => code,
        ActuatorCommand::AutoInvert => active.swapped(),
    }
}

/// Insertion parameters. A distance of 0 disables its couple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LookaheadConfig {
    /// Meters before the waypoint for the near couple
    pub near_distance: f64,
    pub near_command: ActuatorCommand,
    /// Meters before the waypoint for the far couple
    pub far_distance: f64,
    pub far_command: ActuatorCommand,
}

impl Default for LookaheadConfig {
    fn default() -> Self {
        Self {
            near_distance: 3.0,
            near_command: ActuatorCommand::AutoInvert,
            far_distance: 6.0,
            far_command: ActuatorCommand::Explicit(ActuatorCode(15)),
        }
    }
}

impl LookaheadConfig {
    /// Enabled couples in output order (far first)
    fn couples(&self) -> impl Iterator<Item = (f64, ActuatorCommand)> {
        [
            (self.far_distance, self.far_command),
            (self.near_distance, self.near_command),
        ]
        .into_iter()
        .filter(|(distance, _)| *distance != 0.0)
    }
}

pub struct LookaheadInserter {
    config: LookaheadConfig,
}

impl LookaheadInserter {
    pub fn new(config: LookaheadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LookaheadConfig {
        &self.config
    }

    /// Build a new plan with distance triggers inserted before every
    /// "waypoint, spray off" pair that follows a spray activation.
    pub fn insert(&self, plan: &MissionPlan) -> Annotated {
        let mut out = Annotated::new(MissionPlan::with_capacity(plan.len() + 8));
        let mut active: Option<ActuatorCode> = None;

        for (i, record) in plan.iter().enumerate() {
            if record.is_condition_distance() {
                out.report(
                    i,
                    DiagnosticKind::MisplacedCommand,
                    Severity::Error,
                    "CONDITION_DISTANCE should not be in a plan before insertion".to_string(),
                );
            } else if record.is_spray_activation() {
                if !is_triggered(plan, i) {
                    match record.actuator_code() {
                        Some(code) => {
                            log::info!("Parser[{}]: spray command found [{}]", i, code);
                            active = Some(code);
                        }
                        None => out.report(
                            i,
                            DiagnosticKind::InvalidActuatorCode,
                            Severity::Error,
                            format!(
                                "spray command {} is not a nozzle code; active command kept",
                                record.param2
                            ),
                        ),
                    }
                }
            } else if record.is_waypoint() && deactivates_next(plan, i) {
                if let Some(code) = active {
                    if i > 0 && is_triggered(plan, i - 1) {
                        out.report(
                            i,
                            DiagnosticKind::AlreadyAnnotated,
                            Severity::Warning,
                            "WP with 'stop spraying' already has distance triggers".to_string(),
                        );
                    } else {
                        log::info!(
                            "Parser[{}]: WP with 'stop spraying' found; inserting conditions before the WP",
                            i
                        );
                        self.push_couples(&mut out.plan, code);
                    }
                }
            }

            out.plan.push(record.clone());
        }

        out.plan.renumber();
        out
    }

    fn push_couples(&self, plan: &mut MissionPlan, active: ActuatorCode) {
        for (distance, command) in self.config.couples() {
            let code = resolve_command(command, active);
            plan.push(CommandRecord::condition_distance(distance));
            plan.push(CommandRecord::spray(code.value()));
            log::info!(
                "CONDITION_DISTANCE+DO_SEND_SCRIPT_MESSAGE couple added: dist={}m; cmd={} [{}]",
                distance,
                code,
                active
            );
        }
    }
}

/// Spray message armed by the CONDITION_DISTANCE right before it
fn is_triggered(plan: &MissionPlan, index: usize) -> bool {
    index > 0
        && plan
            .get(index - 1)
            .map(|prev| prev.is_condition_distance())
            .unwrap_or(false)
        && plan
            .get(index)
            .map(|r| r.is_spray_activation())
            .unwrap_or(false)
}

fn deactivates_next(plan: &MissionPlan, index: usize) -> bool {
    plan.get(index + 1)
        .map(|next| next.is_spray_deactivation())
        .unwrap_or(false)
}
