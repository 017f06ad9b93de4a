//! Studyforge CLI binary.
//!
//! This binary provides command-line access to the dispatch core:
//! - Register, rank, test and restore AI providers
//! - Inspect and override tier limits
//! - Inspect usage and quota decisions
//! - Send prompts through the dispatcher

use clap::Parser;
use studyforge::{Principal, StudyforgeConfig, init_console_telemetry};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{
        Cli, Commands, ask, handle_limit_command, handle_provider_command, open_core, show_quota,
        show_usage,
    };

    // Secrets (DATABASE_URL, API keys) may live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_console_telemetry()?;

    let config = StudyforgeConfig::load()?;
    let core = open_core(&config).await?;

    match cli.command {
        Commands::Providers(cmd) => handle_provider_command(&core, cmd, cli.json).await?,
        Commands::Limits(cmd) => handle_limit_command(&core, cmd, cli.json).await?,
        Commands::Usage { principal } => show_usage(&core, principal, cli.json).await?,
        Commands::Quota {
            principal,
            tier,
            tokens,
        } => show_quota(&core, principal, tier, tokens, cli.json).await?,
        Commands::Ask {
            prompt,
            principal,
            tier,
            unmetered,
            max_tokens,
        } => {
            ask(
                &core,
                prompt,
                Principal::new(principal, tier),
                unmetered,
                max_tokens,
                cli.json,
            )
            .await?
        }
    }

    Ok(())
}
