//! Command-line interface for grading courses and producing analytics.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gradeforge", version, about = "Assignment grading and analytics engine")]
struct Cli {
    /// Raise log verbosity to debug
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a course file and print analytics
    Run {
        /// Path to .toml course file or directory
        #[arg(long)]
        course: PathBuf,

        /// Output directory for JSON artifacts (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also build and save per-student academic reports
        #[arg(long)]
        reports: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Build one student's academic report
    Report {
        /// Path to .toml course file
        #[arg(long)]
        course: PathBuf,

        /// Student email as listed in the course file
        #[arg(long)]
        student: String,

        /// Write the report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate course TOML files
    Validate {
        /// Path to course file or directory
        #[arg(long)]
        course: PathBuf,
    },

    /// Create starter config and example course file
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "gradeforge=debug"
    } else {
        "gradeforge=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().unwrap()),
        )
        .init();

    let result = match cli.command {
        Commands::Run {
            course,
            output,
            reports,
            config,
        } => commands::run::execute(course, output, reports, config).await,
        Commands::Report {
            course,
            student,
            output,
            config,
        } => commands::report::execute(course, student, output, config).await,
        Commands::Validate { course } => commands::validate::execute(course),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
