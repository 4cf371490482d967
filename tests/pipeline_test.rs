use approx::assert_abs_diff_eq;

use mission_annotator::geometry::round_cm;
use mission_annotator::mission_file::{read_mission, write_mission, WPL_HEADER};
use mission_annotator::types::{CMD_CONDITION_DISTANCE, CMD_DO_SEND_SCRIPT_MESSAGE, CMD_WAYPOINT};
use mission_annotator::{
    run_pipeline, AnnotateError, DiagnosticKind, GeoScale, LookaheadConfig, LookaheadInserter,
    MissionPlan, OrientationAnnotator,
};

/// Home, takeoff, heading 90, one eastbound spray run, RTL
const RAW_PLAN: &str = "QGC WPL 110
0\t1\t0\t16\t0\t0\t0\t0\t47.0\t8.0\t0\t1
1\t0\t3\t22\t0\t0\t0\t0\t0\t0\t10\t1
2\t0\t3\t115\t90\t0\t0\t0\t0\t0\t0\t1
3\t0\t3\t16\t0\t0\t0\t0\t47.0\t8.0\t10\t1
4\t0\t3\t217\t2\t1\t0\t0\t0\t0\t0\t1
5\t0\t3\t16\t0\t0\t0\t0\t47.0\t8.0005\t10\t1
6\t0\t3\t16\t0\t0\t0\t0\t47.0\t8.001\t10\t1
7\t0\t3\t217\t2\t0\t0\t0\t0\t0\t0\t1
8\t0\t3\t20\t0\t0\t0\t0\t0\t0\t0\t1
";

fn load(text: &str) -> MissionPlan {
    read_mission(text.as_bytes()).expect("valid mission text")
}

fn to_text(plan: &MissionPlan) -> String {
    let mut buf = Vec::new();
    write_mission(&mut buf, plan).expect("write to memory");
    String::from_utf8(buf).expect("utf8 output")
}

#[test]
fn test_front_back_annotation_from_text() {
    let plan = load(RAW_PLAN);
    let out = OrientationAnnotator::new().annotate(&plan).unwrap();
    assert!(out.diagnostics.is_empty());

    let spray = out.plan.get(4).unwrap();
    // eastbound with heading 90: back nozzles
    assert_eq!(spray.param2, 3.0);

    let scale = GeoScale::at_latitude(47.0);
    let expected = round_cm(0.001 * scale.lon_m_per_deg);
    assert_abs_diff_eq!(spray.param3, expected, epsilon = 0.011);
}

#[test]
fn test_full_pipeline_output() {
    let plan = load(RAW_PLAN);
    let out = run_pipeline(&plan, &LookaheadConfig::default()).unwrap();
    assert!(out.diagnostics.is_empty());

    let commands: Vec<u16> = out.plan.iter().map(|r| r.command).collect();
    assert_eq!(
        commands,
        vec![
            CMD_WAYPOINT,
            22,
            115,
            CMD_WAYPOINT,
            CMD_DO_SEND_SCRIPT_MESSAGE,
            CMD_WAYPOINT,
            CMD_CONDITION_DISTANCE,
            CMD_DO_SEND_SCRIPT_MESSAGE,
            CMD_CONDITION_DISTANCE,
            CMD_DO_SEND_SCRIPT_MESSAGE,
            CMD_WAYPOINT,
            CMD_DO_SEND_SCRIPT_MESSAGE,
            20,
        ]
    );

    // far couple: 6 m, explicit 15; near couple: 3 m, inverted 3 -> 12
    assert_eq!(out.plan.get(6).unwrap().param1, 6.0);
    assert_eq!(out.plan.get(7).unwrap().param2, 15.0);
    assert_eq!(out.plan.get(8).unwrap().param1, 3.0);
    assert_eq!(out.plan.get(9).unwrap().param2, 12.0);

    let text = to_text(&out.plan);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], WPL_HEADER);
    assert_eq!(lines.len(), 14);
    assert!(lines[13].starts_with("12\t0\t3\t20\t"));
}

#[test]
fn test_second_insertion_pass_is_stable() {
    let plan = load(RAW_PLAN);
    let first = run_pipeline(&plan, &LookaheadConfig::default()).unwrap();

    let reread = load(&to_text(&first.plan));
    let second = LookaheadInserter::new(LookaheadConfig::default()).insert(&reread);

    assert_eq!(second.plan, first.plan);
    assert_eq!(second.count(DiagnosticKind::AlreadyAnnotated), 1);
    assert_eq!(second.plan.count_command(CMD_CONDITION_DISTANCE), 2);
}

#[test]
fn test_missing_heading_aborts_pipeline() {
    let without_yaw: String = RAW_PLAN
        .lines()
        .filter(|line| !line.contains("\t115\t"))
        .map(|line| format!("{}\n", line))
        .collect();
    let plan = load(&without_yaw);

    let err = run_pipeline(&plan, &LookaheadConfig::default()).unwrap_err();
    assert_eq!(err, AnnotateError::NoReferenceHeading { index: 3 });
}
