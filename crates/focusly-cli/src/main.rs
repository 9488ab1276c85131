use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod sinks;

#[derive(Parser)]
#[command(name = "focusly", version, about = "Focusly focus timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run and inspect the focus timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Timer presets
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Session journal
    Journal {
        #[command(subcommand)]
        action: commands::journal::JournalAction,
    },
    /// Break activities
    Activity {
        #[command(subcommand)]
        action: commands::activity::ActivityAction,
    },
    /// Calendar-aware scheduling
    Calendar(commands::calendar::CalendarArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("FOCUSLY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("focusly_cli=info,focusly_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Journal { action } => commands::journal::run(action),
        Commands::Activity { action } => commands::activity::run(action),
        Commands::Calendar(args) => commands::calendar::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
