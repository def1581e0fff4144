mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    code::CodeSubcommand, config::ConfigSubcommand, context::ContextSubcommand,
    decision::DecisionSubcommand, evidence::EvidenceSubcommand,
    governance::GovernanceSubcommand, session::SessionSubcommand, spec::SpecSubcommand,
    test::TestSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rjw",
    about = "Evidence-first development: research, decide, specify, test, then code",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .rjw/ or .git/)
    #[arg(long, global = true, env = "RJW_ROOT")]
    root: Option<PathBuf>,

    /// Session snapshot to load and save
    #[arg(long, global = true, env = "RJW_SESSION", default_value = "default")]
    session: String,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log at INFO instead of WARN
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize rjw in the current project
    Init,

    /// List and inspect saved sessions
    Session {
        #[command(subcommand)]
        subcommand: SessionSubcommand,
    },

    /// Harvest and list research evidence
    Evidence {
        #[command(subcommand)]
        subcommand: EvidenceSubcommand,
    },

    /// Record decisions backed by evidence
    Decision {
        #[command(subcommand)]
        subcommand: DecisionSubcommand,
    },

    /// Create specs backed by evidence and decisions
    Spec {
        #[command(subcommand)]
        subcommand: SpecSubcommand,
    },

    /// Register tests against specs
    Test {
        #[command(subcommand)]
        subcommand: TestSubcommand,
    },

    /// Guarded code writes and traceability queries
    Code {
        #[command(subcommand)]
        subcommand: CodeSubcommand,
    },

    /// Ask for autonomous approval of an action
    Approve {
        /// What the agent wants to do
        action: String,
        /// Workflow phase whose checklist applies
        #[arg(long)]
        phase: String,
        /// Risk level (minimal..critical, or streamlined/prototype/yolo)
        #[arg(long, default_value = "medium")]
        risk: String,
        #[command(flatten)]
        facts: cmd::approve::FactArgs,
    },

    /// Trust ladder, YOLO mode and the approval log
    Governance {
        #[command(subcommand)]
        subcommand: GovernanceSubcommand,
    },

    /// Build and curate task context indexes
    Context {
        #[command(subcommand)]
        subcommand: ContextSubcommand,
    },

    /// Show the guard's operation log
    Log {
        /// Only the most recent N entries
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let session = cli.session.as_str();

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Session { subcommand } => cmd::session::run(&root, session, subcommand, cli.json),
        Commands::Evidence { subcommand } => {
            cmd::evidence::run(&root, session, subcommand, cli.json)
        }
        Commands::Decision { subcommand } => {
            cmd::decision::run(&root, session, subcommand, cli.json)
        }
        Commands::Spec { subcommand } => cmd::spec::run(&root, session, subcommand, cli.json),
        Commands::Test { subcommand } => cmd::test::run(&root, session, subcommand, cli.json),
        Commands::Code { subcommand } => cmd::code::run(&root, session, subcommand, cli.json),
        Commands::Approve {
            action,
            phase,
            risk,
            facts,
        } => cmd::approve::run(&root, session, &action, &phase, &risk, facts, cli.json),
        Commands::Governance { subcommand } => {
            cmd::governance::run(&root, session, subcommand, cli.json)
        }
        Commands::Context { subcommand } => {
            cmd::context::run(&root, session, subcommand, cli.json)
        }
        Commands::Log { limit } => cmd::log::run(&root, session, limit, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
