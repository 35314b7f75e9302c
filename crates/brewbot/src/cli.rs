//! Clap derive structures for the `brewbot` CLI.
//!
//! Also compiled by `build.rs` for man pages, so this file may only use
//! clap, clap_complete, humantime and std.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// brewbot -- drive a coffee machine controller from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "brewbot",
    version,
    about = "Brew coffee on a brewbot controller, or simulate one",
    long_about = "Talks to a brewbot controller over its HTTP status/command interface.\n\n\
        `brewbot brew` walks through a full brew (grind, then dispense);\n\
        `brewbot serve` runs a simulated controller for development.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller URL (overrides the config file)
    #[arg(long, short = 'c', env = "BREWBOT_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BREWBOT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip prompts (answer yes to every instruction)
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, env = "BREWBOT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the controller's current status
    #[command(alias = "st")]
    Status,

    /// Send one step command to the controller
    #[command(alias = "cmd")]
    Command(CommandArgs),

    /// Override sensors or status on a simulated controller
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Walk through a full brew: grind, then dispense
    Brew(BrewArgs),

    /// Run a simulated controller with the HTTP interface
    Serve(ServeArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CommandArgs {
    #[arg(value_enum)]
    pub step: StepArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StepArg {
    /// START_GRIND
    Grind,
    /// START_DISPENSE
    Dispense,
}

// ── Simulate ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Water tank level in percent (0-100)
    #[arg(long)]
    pub water_level: Option<f64>,

    /// Bean hopper level in percent (0-100)
    #[arg(long)]
    pub bean_level: Option<f64>,

    /// Boiler temperature in °C
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Force the machine status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Cup present under the grinder
    #[arg(long)]
    pub grinder_cup: Option<bool>,

    /// Cup present under the dispenser
    #[arg(long)]
    pub dispenser_cup: Option<bool>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Idle,
    Grind,
    UserPrompt,
    Pump,
    Heat,
    Dispense,
    Error,
}

// ── Brew ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BrewArgs {
    /// Label for this brew, shown in the summary
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// How often to poll the controller (e.g. "500ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// With --yes, give up after this many retries that leave the brew
    /// in the same phase
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,
}

// ── Serve ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, short = 'b', env = "BREWBOT_BIND")]
    pub bind: Option<SocketAddr>,

    /// Grinding time (e.g. "5s")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub grind_time: Option<Duration>,

    /// Pumping time
    #[arg(long, value_parser = humantime::parse_duration)]
    pub pump_time: Option<Duration>,

    /// Heating time
    #[arg(long, value_parser = humantime::parse_duration)]
    pub heat_time: Option<Duration>,

    /// Dispensing time
    #[arg(long, value_parser = humantime::parse_duration)]
    pub dispense_time: Option<Duration>,

    /// Beans in the hopper at startup, in grams
    #[arg(long)]
    pub beans: Option<f64>,

    /// Water in the tank at startup, in mL
    #[arg(long)]
    pub water: Option<f64>,

    /// Reject commands while the relevant cup is missing
    #[arg(long)]
    pub require_cups: bool,
}

// ── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
