//! Front/back nozzle resolution
//!
//! Walks a mission plan once. CONDITION_YAW fixes the drone heading, the first
//! WAYPOINT fixes the metric scale, and every spray activation gets its nozzle
//! code (param2) chosen from the direction of travel relative to the heading,
//! plus the 3D length of the following waypoint run (param3).

use super::Annotated;
use crate::error::{AnnotateError, DiagnosticKind, Severity};
use crate::geometry::{round_cm, GeoPoint, GeoScale};
use crate::types::{ActuatorCode, CommandRecord, MissionPlan};

/// Admissible bearing window derived from the drone heading.
///
/// Always 180 degrees wide. Bounds are kept in [0, 360); when the window wraps
/// through north, `min_deg > max_deg`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingWindow {
    pub heading_deg: f64,
    pub min_deg: f64,
    pub max_deg: f64,
    /// Window covers the opposite half plane; membership must be flipped
    pub invert: bool,
}

impl HeadingWindow {
    pub fn from_heading(heading_deg: f64) -> Self {
        // Branch boundaries (<90, >180, else) are intentional: 90 and 180 both
        // take the centered window.
        let (min_deg, max_deg, invert) = if heading_deg < 90.0 {
            (heading_deg + 90.0, heading_deg + 270.0, true)
        } else if heading_deg > 180.0 {
            (heading_deg - 270.0, heading_deg - 90.0, true)
        } else {
            (heading_deg - 90.0, heading_deg + 90.0, false)
        };

        Self {
            heading_deg,
            min_deg: min_deg.rem_euclid(360.0),
            max_deg: max_deg.rem_euclid(360.0),
            invert,
        }
    }

    /// Angular width, measured clockwise from `min_deg` to `max_deg`
    pub fn width_deg(&self) -> f64 {
        let width = (self.max_deg - self.min_deg).rem_euclid(360.0);
        if width == 0.0 {
            360.0
        } else {
            width
        }
    }

    /// Strict membership test, bounds excluded.
    pub fn contains(&self, bearing_deg: f64) -> bool {
        let b = bearing_deg.rem_euclid(360.0);
        if self.min_deg <= self.max_deg {
            b > self.min_deg && b < self.max_deg
        } else {
            b > self.min_deg || b < self.max_deg
        }
    }

    /// Flying on the drone's own side of the heading sprays with the back
    /// nozzles, otherwise with the front ones.
    pub fn resolve(&self, bearing_deg: f64) -> ActuatorCode {
        let same_side = self.contains(bearing_deg) != self.invert;
        if same_side {
            ActuatorCode::BACK
        } else {
            ActuatorCode::FRONT
        }
    }
}

fn position_of(record: &CommandRecord) -> GeoPoint {
    GeoPoint::new(record.x, record.y, record.z)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OrientationAnnotator;

impl OrientationAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Resolve every spray activation of `plan` into a concrete front/back code.
    ///
    /// The input is left untouched; the returned plan has the same records in
    /// the same order with param2/param3 of activations overwritten.
    pub fn annotate(&self, plan: &MissionPlan) -> Result<Annotated, AnnotateError> {
        let mut out = Annotated::new(plan.clone());
        let mut window: Option<HeadingWindow> = None;
        let mut scale: Option<GeoScale> = None;
        let mut position: Option<GeoPoint> = None;

        for (i, record) in plan.iter().enumerate() {
            if record.is_condition_yaw() {
                let w = HeadingWindow::from_heading(record.param1);
                log::info!(
                    "Parser[{}]: drone orientation set to {:.0}deg; min={:.0}deg; max={:.0}deg; invert={}",
                    i,
                    w.heading_deg,
                    w.min_deg,
                    w.max_deg,
                    w.invert
                );
                window = Some(w);
                continue;
            }

            if record.is_waypoint() {
                let point = position_of(record);
                if scale.is_none() {
                    let s = GeoScale::at_latitude(point.lat);
                    log::info!(
                        "Parser[{}]: first WP found; lat_factor={:.3}; lon_factor={:.3}",
                        i,
                        s.lat_m_per_deg,
                        s.lon_m_per_deg
                    );
                    scale = Some(s);
                }
                position = Some(point);
                continue;
            }

            if !record.is_spray_activation() {
                continue;
            }

            let window = window.ok_or(AnnotateError::NoReferenceHeading { index: i })?;
            let (scale, from) = match (scale, position) {
                (Some(s), Some(p)) => (s, p),
                _ => return Err(AnnotateError::MissingInitialWaypoint { index: i }),
            };

            let run = waypoint_run(plan, i + 1);
            let target = match run.first() {
                Some(first) => Some(*first),
                None => {
                    out.report(
                        i,
                        DiagnosticKind::MissingLookahead,
                        Severity::Error,
                        "at least one WP is needed right after a spray command".to_string(),
                    );
                    next_waypoint(plan, i + 1)
                }
            };
            let Some(target) = target else {
                continue;
            };

            let bearing = scale.bearing_deg(&from, &target);
            let code = window.resolve(bearing);
            let distance = if run.is_empty() {
                None
            } else {
                Some(round_cm(scale.path_length_m(&from, &run)))
            };

            if let Some(slot) = out.plan.get_mut(i) {
                slot.param2 = code.value() as f64;
                if let Some(distance) = distance {
                    slot.param3 = distance;
                }
            }

            log::info!(
                "Parser[{}]: spray command issued; drone={:.0}deg; flight={:.0}deg; cmd={}; distance={:.2}m; wps={}",
                i,
                window.heading_deg,
                bearing,
                code,
                distance.unwrap_or(record.param3),
                run.len()
            );
        }

        Ok(out)
    }
}

/// Positions of the contiguous WAYPOINT records starting at `start`
fn waypoint_run(plan: &MissionPlan, start: usize) -> Vec<GeoPoint> {
    plan.records()
        .get(start..)
        .unwrap_or(&[])
        .iter()
        .take_while(|r| r.is_waypoint())
        .map(position_of)
        .collect()
}

fn next_waypoint(plan: &MissionPlan, start: usize) -> Option<GeoPoint> {
    plan.records()
        .get(start..)
        .unwrap_or(&[])
        .iter()
        .find(|r| r.is_waypoint())
        .map(position_of)
}
