use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use mission_annotator::mission_file::{read_mission_file, write_mission_file};
use mission_annotator::report::RunReport;
use mission_annotator::{
    ActuatorCommand, Annotated, LookaheadConfig, LookaheadInserter, MissionPlan,
    OrientationAnnotator,
};

#[derive(Parser, Debug)]
#[command(name = "mission_annotator")]
#[command(
    version,
    about = "Front/back spray annotation for QGC WPL mission plans",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    tool: Tool,

    /// Output directory (file keeps the input name)
    #[arg(long, global = true, default_value = "out")]
    out_dir: PathBuf,

    /// Log directory (log_file.txt, archived inputs, reports)
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    /// Remove everything in the output directory first
    #[arg(long, global = true)]
    cleanup: bool,

    /// Keep an unmodified copy of the input in the log directory
    #[arg(long, global = true)]
    archive_input: bool,

    /// Write a JSON run report into the log directory
    #[arg(long, global = true)]
    report: bool,
}

#[derive(Subcommand, Debug)]
enum Tool {
    /// Resolve front/back nozzle codes and leg distances of spray commands
    FrontBack {
        /// Mission plan to annotate
        #[arg(long)]
        input: PathBuf,
    },
    /// Insert CONDITION_DISTANCE triggers before every 'spray off' waypoint
    InsertDistance {
        /// Mission plan to annotate
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        lookahead: LookaheadArgs,
    },
    /// front-back followed by insert-distance
    Pipeline {
        /// Mission plan to annotate
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        lookahead: LookaheadArgs,
    },
}

impl Tool {
    fn name(&self) -> &'static str {
        match self {
            Tool::FrontBack { .. } => "front-back",
            Tool::InsertDistance { .. } => "insert-distance",
            Tool::Pipeline { .. } => "pipeline",
        }
    }

    fn input(&self) -> &Path {
        match self {
            Tool::FrontBack { input }
            | Tool::InsertDistance { input, .. }
            | Tool::Pipeline { input, .. } => input.as_path(),
        }
    }

    fn lookahead(&self) -> Option<LookaheadConfig> {
        match self {
            Tool::FrontBack { .. } => None,
            Tool::InsertDistance { lookahead, .. } | Tool::Pipeline { lookahead, .. } => {
                Some(lookahead.config())
            }
        }
    }
}

#[derive(clap::Args, Debug)]
struct LookaheadArgs {
    /// Near trigger distance in meters (0 = no near trigger)
    #[arg(long, default_value = "3", value_parser = parse_distance)]
    near_distance: f64,

    /// Nozzle code for the near trigger (0 = invert the active one)
    #[arg(long, default_value = "0")]
    near_command: u32,

    /// Far trigger distance in meters (0 = no far trigger)
    #[arg(long, default_value = "6", value_parser = parse_distance)]
    far_distance: f64,

    /// Nozzle code for the far trigger (0 = invert the active one)
    #[arg(long, default_value = "15")]
    far_command: u32,
}

impl LookaheadArgs {
    fn config(&self) -> LookaheadConfig {
        LookaheadConfig {
            near_distance: self.near_distance,
            near_command: ActuatorCommand::from(self.near_command),
            far_distance: self.far_distance,
            far_command: ActuatorCommand::from(self.far_command),
        }
    }
}

fn parse_distance(text: &str) -> Result<f64, String> {
    let value: f64 = text
        .parse()
        .map_err(|_| format!("'{}' is not a number", text))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("distance must be >= 0 meters, got {}", text));
    }
    Ok(value)
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("log_file.txt");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:5}: {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
    Ok(())
}

fn cleanup_folder(folder: &Path) -> std::io::Result<()> {
    if !folder.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn annotate(tool: &Tool, plan: &MissionPlan) -> Result<Annotated> {
    let annotated = match tool {
        Tool::FrontBack { .. } => OrientationAnnotator::new().annotate(plan)?,
        Tool::InsertDistance { lookahead, .. } => {
            LookaheadInserter::new(lookahead.config()).insert(plan)
        }
        Tool::Pipeline { lookahead, .. } => {
            mission_annotator::run_pipeline(plan, &lookahead.config())?
        }
    };
    Ok(annotated)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_dir)?;

    let tool = &args.tool;
    log::info!("#####################################################");
    log::info!(
        "#   mission_annotator {} V{}",
        tool.name(),
        env!("CARGO_PKG_VERSION")
    );
    log::info!("#####################################################");
    if let Some(cfg) = tool.lookahead() {
        log::info!(
            "Config: near_distance={}; near_command={}; far_distance={}; far_command={}",
            cfg.near_distance,
            u32::from(cfg.near_command),
            cfg.far_distance,
            u32::from(cfg.far_command)
        );
        println!(
            "Config: near_distance={}; near_command={}; far_distance={}; far_command={};",
            cfg.near_distance,
            u32::from(cfg.near_command),
            cfg.far_distance,
            u32::from(cfg.far_command)
        );
    }

    let input = tool.input();
    let file_name = input
        .file_name()
        .with_context(|| format!("input {} has no file name", input.display()))?;
    let output = args.out_dir.join(file_name);

    if args.cleanup {
        cleanup_folder(&args.out_dir)
            .with_context(|| format!("cleaning {}", args.out_dir.display()))?;
    }
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating output directory {}", args.out_dir.display()))?;

    log::info!("Starting to parse <{}>", input.display());
    let plan = read_mission_file(input)
        .with_context(|| format!("reading mission plan {}", input.display()))?;

    if args.archive_input {
        let archived = args.log_dir.join(file_name);
        fs::copy(input, &archived)
            .with_context(|| format!("archiving input to {}", archived.display()))?;
    }

    let annotated = match annotate(tool, &plan) {
        Ok(a) => a,
        Err(e) => {
            log::error!("Main    : aborted: {:#}", e);
            return Err(e.context(format!("annotating {}", input.display())));
        }
    };

    write_mission_file(&output, &annotated.plan)
        .with_context(|| format!("writing {}", output.display()))?;
    log::info!("Outputfile <{}> generated", output.display());

    if args.report {
        let mut report = RunReport::new(tool.name(), input, &output)
            .with_diagnostics(&annotated.diagnostics);
        report.records_in = plan.len();
        report.records_out = annotated.plan.len();
        report.lookahead = tool.lookahead();

        let report_path = args
            .log_dir
            .join(format!("{}.report.json", file_name.to_string_lossy()));
        report
            .save(&report_path)
            .with_context(|| format!("writing report {}", report_path.display()))?;
        log::info!("Report <{}> generated", report_path.display());
    }

    if !annotated.diagnostics.is_empty() {
        println!(
            "{} diagnostic(s), see {}",
            annotated.diagnostics.len(),
            args.log_dir.join("log_file.txt").display()
        );
    }
    log::info!("Main    : done.");
    println!("Outputfile <{}> generated", output.display());
    Ok(())
}
