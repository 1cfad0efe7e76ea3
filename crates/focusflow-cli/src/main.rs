use clap::{Parser, Subcommand};
use focusflow_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusflow", version, about = "Focusflow interval timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Built-in focus techniques
    Technique {
        #[command(subcommand)]
        action: commands::technique::TechniqueAction,
    },
    /// Custom sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Print the resolved interval plan
    Plan(commands::timer::PlanArgs),
    /// Tick a session synchronously and print what happened
    Simulate(commands::timer::SimulateArgs),
    /// Run a focus session in real time
    Run(commands::timer::RunArgs),
    /// Finished focus sessions
    History {
        /// Number of sessions to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env("FOCUSFLOW_LOG")
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = Config::load();
    init_tracing(
        config
            .as_ref()
            .map(|c| c.logging.filter.as_str())
            .unwrap_or("info"),
    );

    let result = match (cli.command, config) {
        (Commands::Config { action }, loaded) => commands::config::run(action, loaded),
        (_, Err(e)) => Err(e.into()),
        (Commands::Technique { action }, Ok(config)) => commands::technique::run(action, &config),
        (Commands::Session { action }, Ok(config)) => commands::session::run(action, &config),
        (Commands::Plan(args), Ok(config)) => commands::timer::plan(args, &config),
        (Commands::Simulate(args), Ok(config)) => commands::timer::simulate(args, &config),
        (Commands::Run(args), Ok(config)) => commands::timer::run(args, &config),
        (Commands::History { limit }, Ok(_)) => commands::history::run(limit),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
