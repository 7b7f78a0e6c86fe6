pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cotiza_core::config::{AppConfig, LoadOptions, LogFormat};
use cotiza_core::AmountBasis;
use cotiza_render::Brand;

#[derive(Debug, Parser)]
#[command(
    name = "cotiza",
    about = "Quote parsing and PDF rendering CLI",
    long_about = "Parse free-text quotes into structured records and render them as paginated PDF documents.",
    after_help = "Examples:\n  cotiza parse pedido.txt\n  cotiza render --brand eco-rural --id chat-42 pedido.txt\n  cotiza config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a cotiza.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Parse quote text (file or stdin) and print the structured quote as JSON")]
    Parse(ParseCommand),
    #[command(about = "Parse quote text and render it as a branded PDF document")]
    Render(RenderCommand),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

#[derive(Debug, Args)]
struct ParseCommand {
    #[arg(long, default_value = "line", help = "How item amounts are read: line|unit")]
    basis: AmountBasis,
    #[arg(help = "Input file; reads stdin when omitted or `-`")]
    input: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RenderCommand {
    #[arg(long, help = "Document brand: publicom|eco-rural")]
    brand: Brand,
    #[arg(long, default_value = "line", help = "How item amounts are read: line|unit")]
    basis: AmountBasis,
    #[arg(long, help = "Identifier embedded in the output file name")]
    id: Option<String>,
    #[arg(long, help = "Output directory, overrides render.output_dir")]
    out: Option<PathBuf>,
    #[arg(long, help = "Assets directory, overrides render.assets_dir")]
    assets: Option<PathBuf>,
    #[arg(help = "Input file; reads stdin when omitted or `-`")]
    input: Option<PathBuf>,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) =
        AppConfig::load(LoadOptions { config_path: cli.config.clone(), ..LoadOptions::default() })
    {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Parse(args) => commands::parse::run(commands::parse::ParseArgs {
            config_path: cli.config,
            basis: args.basis,
            input: args.input,
        }),
        Command::Render(args) => commands::render::run(commands::render::RenderArgs {
            config_path: cli.config,
            brand: args.brand,
            basis: args.basis,
            identifier: args.id,
            output_dir: args.out,
            assets_dir: args.assets,
            input: args.input,
        }),
        Command::Config => commands::config::run(cli.config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr; stdout is reserved for command outcomes.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
