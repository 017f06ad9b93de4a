//! Provider administration commands.

use super::commands::ProviderCommands;
use super::output::{emit, print_provider};
use studyforge::{ConfigError, NewProviderConfig, ProviderId, Studyforge, StudyforgeResult};

/// Handle provider subcommands.
pub async fn handle_provider_command(
    core: &Studyforge,
    cmd: ProviderCommands,
    json: bool,
) -> StudyforgeResult<()> {
    match cmd {
        ProviderCommands::List => {
            let providers = core.list_providers().await?;
            emit(json, &providers, |providers| {
                if providers.is_empty() {
                    println!("No providers configured");
                }
                providers.iter().for_each(print_provider);
            })
        }
        ProviderCommands::Add {
            kind,
            model,
            key_env,
            priority,
            base_url,
            temperature,
        } => {
            let key = std::env::var(&key_env).map_err(|_| {
                ConfigError::new(format!("Environment variable {} is not set", key_env))
            })?;
            let mut builder = NewProviderConfig::builder();
            builder
                .provider_kind(kind)
                .model(model)
                .secret_credential(key)
                .priority(priority);
            if let Some(url) = base_url {
                builder.base_url(url);
            }
            if let Some(t) = temperature {
                builder.temperature(t);
            }
            let new = builder
                .build()
                .map_err(|e| ConfigError::new(e.to_string()))?;
            let config = core.add_provider(new).await?;
            emit(json, &config, print_provider)
        }
        ProviderCommands::Priority { id, priority } => {
            let config = core.set_priority(ProviderId::new(id), priority).await?;
            emit(json, &config, print_provider)
        }
        ProviderCommands::Exhaust { id, reason } => {
            let config = core.mark_exhausted(ProviderId::new(id), reason).await?;
            emit(json, &config, print_provider)
        }
        ProviderCommands::Restore { id } => {
            let config = core.restore_provider(ProviderId::new(id)).await?;
            emit(json, &config, print_provider)
        }
        ProviderCommands::Enable { id } => {
            let config = core.set_enabled(ProviderId::new(id), true).await?;
            emit(json, &config, print_provider)
        }
        ProviderCommands::Disable { id } => {
            let config = core.set_enabled(ProviderId::new(id), false).await?;
            emit(json, &config, print_provider)
        }
        ProviderCommands::Remove { id } => {
            core.remove_provider(ProviderId::new(id)).await?;
            emit(json, &id, |id| println!("Removed provider {}", id))
        }
        ProviderCommands::Test { id } => {
            let outcome = core.test_provider(ProviderId::new(id)).await?;
            emit(json, &outcome, |o| {
                print_provider(&o.provider);
                match (&o.response_preview, &o.error) {
                    (Some(preview), _) => println!("  ok in {} ms: {}", o.latency_ms, preview),
                    (None, Some(err)) => println!("  failed in {} ms: {}", o.latency_ms, err),
                    (None, None) => println!("  failed in {} ms", o.latency_ms),
                }
            })
        }
        ProviderCommands::Health => {
            let health = core.registry_health().await?;
            emit(json, &health, |h| {
                println!(
                    "{} providers: {} active, {} failing, {} exhausted",
                    h.total, h.active, h.failing, h.exhausted
                );
                if h.all_exhausted() {
                    println!("All providers exhausted: dispatching in degraded mode");
                }
            })
        }
    }
}
