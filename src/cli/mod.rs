pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{
    CliArgs, Commands, OutputFormatArg, PhaseArgs, RouteArgs, RunArgs, ScanArgs, SignalArgs,
};
pub use output::{OutputFormat, OutputFormatter};
