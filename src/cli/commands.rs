use crate::phase::Phase;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Local decision engine for routing work to specialized agents
#[derive(Parser, Debug)]
#[command(
    name = "pathfinder",
    about = "Classify a workspace and route tasks to specialized agents",
    version,
    author,
    long_about = "pathfinder inspects a workspace (language, frameworks, capabilities, \
                  lifecycle phase), picks the agents best suited to a request, scores how \
                  confident that choice is and runs the selected agents in order."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "Configuration file (overrides PATHFINDER_CONFIG)"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(
        short = 'f',
        long,
        global = true,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Describe a workspace",
        long_about = "Runs every detector over the workspace and prints the merged descriptor: \
                      language, framework, capabilities, signals and project type.\n\n\
                      Examples:\n  \
                      pathfinder scan\n  \
                      pathfinder scan /path/to/repo --format json"
    )]
    Scan(ScanArgs),

    #[command(
        about = "Detect the lifecycle phase of a workspace",
        long_about = "Classifies the workspace as discovery, build or ship and prints the \
                      scores, measured signals and recommendations.\n\n\
                      Examples:\n  \
                      pathfinder phase\n  \
                      pathfinder phase /path/to/repo --phase ship"
    )]
    Phase(PhaseArgs),

    #[command(
        about = "Preview the dispatch plan and route for a request",
        long_about = "Scans the workspace, selects agents for the request and scores the \
                      decision without running anything. Signals not given on the command \
                      line are estimated from the plan.\n\n\
                      Examples:\n  \
                      pathfinder route --intent \"audit release readiness\"\n  \
                      pathfinder route . --intent \"add tests\" --keywords-score 0.9"
    )]
    Route(RouteArgs),

    #[command(
        about = "Route a request and run the selected agents",
        long_about = "Full pipeline: scan, route, score, run every selected agent and record \
                      the run in the history log. Exits with code 2 when any agent failed."
    )]
    Run(RunArgs),

    #[command(about = "Show the resolved configuration")]
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to workspace (defaults to current directory)"
    )]
    pub workspace_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PhaseArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to workspace (defaults to current directory)"
    )]
    pub workspace_path: Option<PathBuf>,

    #[arg(long, value_parser = parse_phase, help = "Force a phase (discovery, build, ship)")]
    pub phase: Option<Phase>,
}

/// Signal values that replace the estimated ones
#[derive(Args, Debug, Clone, Default)]
pub struct SignalArgs {
    #[arg(long, value_name = "0..1", value_parser = parse_unit)]
    pub keywords_score: Option<f64>,

    #[arg(long, value_name = "0..1", value_parser = parse_unit)]
    pub profile_match_score: Option<f64>,

    #[arg(long, value_name = "0..1", value_parser = parse_unit)]
    pub historical_success_score: Option<f64>,

    #[arg(long, value_name = "0..1", value_parser = parse_unit)]
    pub complexity_estimate: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct RouteArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to workspace (defaults to current directory)"
    )]
    pub workspace_path: Option<PathBuf>,

    #[arg(short = 'i', long, value_name = "TEXT", help = "What should be done")]
    pub intent: String,

    #[arg(long, value_name = "N", help = "Maximum number of agents to select")]
    pub max_agents: Option<usize>,

    #[arg(long, value_name = "ID", help = "Correlation id for telemetry")]
    pub prompt_id: Option<String>,

    #[arg(long, value_parser = parse_phase, help = "Phase hint forwarded to agents")]
    pub phase: Option<Phase>,

    #[command(flatten)]
    pub signals: SignalArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub route: RouteArgs,

    #[arg(long, value_name = "ID", help = "Knowledge base identifier passed to agents")]
    pub knowledge_base: Option<String>,

    #[arg(
        long = "snippet",
        value_name = "TEXT",
        help = "Context snippet passed to agents (repeatable)"
    )]
    pub snippets: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_phase(s: &str) -> Result<Phase, String> {
    s.parse()
}

fn parse_unit(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("Value must be between 0 and 1, got {}", value));
    }
    Ok(value)
}
