use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sched_core::{adapt, materialize, validate, Solver};
use types::{RawInput, SolveEnvelope, SolveParams, SolverKind};

/// Single-shot batch entry point: reads a normalized input record, solves it
/// in-process, and writes the JSON outputs and Markdown report to disk.
#[derive(Parser, Debug)]
#[command(name = "unischedule-cli", about = "Builds a master schedule from a normalized input record")]
struct Args {
    #[arg(long)]
    input: PathBuf,

    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = SolverArg::Milp)]
    solver: SolverArg,

    #[arg(long)]
    time_limit_secs: Option<u64>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum SolverArg {
    Milp,
    Greedy,
}

impl From<SolverArg> for SolverKind {
    fn from(s: SolverArg) -> Self {
        match s {
            SolverArg::Milp => SolverKind::Milp,
            SolverArg::Greedy => SolverKind::Greedy,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let args = Args::parse();

    let raw = fs::read_to_string(&args.input).unwrap_or_else(|e| {
        error!(path = %args.input.display(), error = %e, "could not read input file");
        std::process::exit(exitcode::NOINPUT);
    });

    let raw: RawInput = serde_json::from_str(&raw).unwrap_or_else(|e| {
        error!(error = %e, "could not parse input file as JSON");
        std::process::exit(exitcode::DATAERR);
    });

    let instance = adapt(&raw).unwrap_or_else(|e| {
        error!(error = %e, "could not adapt input into a scheduling instance");
        std::process::exit(exitcode::DATAERR);
    });

    if let Err(e) = validate(&instance) {
        error!(error = %e, "instance failed validation");
        std::process::exit(exitcode::DATAERR);
    }

    info!(
        students = instance.students.len(),
        courses = instance.courses.len(),
        "solving"
    );

    let env = SolveEnvelope {
        instance: instance.clone(),
        params: SolveParams {
            solver: args.solver.into(),
            time_limit_secs: args.time_limit_secs,
            seed: 0,
        },
    };

    let result = match env.params.solver {
        SolverKind::Milp => solver_milp::MilpSolver::new().solve(env).await,
        SolverKind::Greedy => solver_heur::HeurSolver::new().solve(env).await,
    }
    .unwrap_or_else(|e| {
        error!(error = %e, "solve failed");
        std::process::exit(exitcode::SOFTWARE);
    });

    info!(status = %result.status, objective = result.objective, "solve finished");

    let schedule = materialize(&instance, &result.assignments);
    let report_md = report::render(&instance, &result, &schedule);

    if let Err(e) = fs::create_dir_all(&args.out_dir) {
        error!(path = %args.out_dir.display(), error = %e, "could not create output directory");
        std::process::exit(exitcode::IOERR);
    }

    let writes: [(&str, serde_json::Result<String>); 3] = [
        (
            "student_schedules.json",
            serde_json::to_string_pretty(&schedule.student_schedules),
        ),
        (
            "teacher_schedules.json",
            serde_json::to_string_pretty(&schedule.teacher_schedules),
        ),
        (
            "statistics.json",
            serde_json::to_string_pretty(&schedule.stats),
        ),
    ];

    for (name, body) in writes {
        let body = body.unwrap_or_else(|e| {
            error!(file = name, error = %e, "could not serialize output");
            std::process::exit(exitcode::SOFTWARE);
        });
        if let Err(e) = fs::write(args.out_dir.join(name), body) {
            error!(file = name, error = %e, "could not write output file");
            std::process::exit(exitcode::IOERR);
        }
    }

    if let Err(e) = fs::write(args.out_dir.join("report.md"), &report_md) {
        error!(error = %e, "could not write report.md");
        std::process::exit(exitcode::IOERR);
    }

    info!(out_dir = %args.out_dir.display(), "wrote all outputs");
}
