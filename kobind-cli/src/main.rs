use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kobind", version, about = "Server-side data-bind renderer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against a JSON view model.
    Render {
        /// Template file
        template: PathBuf,
        /// JSON data file (without it the template is only normalized)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
        /// TOML render options
        #[arg(long)]
        config: Option<PathBuf>,
        /// Fail on directives that cannot be resolved
        #[arg(long)]
        strict: bool,
    },
    /// Check markers and directive syntax without rendering.
    Check {
        template: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            template,
            data,
            out,
            config,
            strict,
        } => kobind_cli::render_cmd(
            &template,
            data.as_deref(),
            out.as_deref(),
            config.as_deref(),
            strict,
        )?,
        Commands::Check { template, config } => {
            let count = kobind_cli::check_cmd(&template, config.as_deref())?;
            println!("{}: {count} directive(s) ok", template.display());
        }
    }
    Ok(())
}
