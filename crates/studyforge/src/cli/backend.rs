//! Choosing and preparing the store backend.

use studyforge::{NewProviderConfig, ProviderKind, Studyforge, StudyforgeConfig, StudyforgeResult};
use tracing::{info, warn};

/// API key variables picked up in in-memory mode, with the model and
/// priority each seeds.
const SEED_PROVIDERS: &[(&str, ProviderKind, &str, i32)] = &[
    ("GROQ_API_KEY", ProviderKind::Groq, "llama-3.1-8b-instant", 10),
    ("GEMINI_API_KEY", ProviderKind::Gemini, "gemini-1.5-flash", 20),
    ("OPENAI_API_KEY", ProviderKind::OpenAi, "gpt-4o-mini", 30),
    ("ANTHROPIC_API_KEY", ProviderKind::Anthropic, "claude-3-5-haiku-latest", 40),
    ("OPENROUTER_API_KEY", ProviderKind::OpenRouter, "meta-llama/llama-3.1-8b-instruct", 50),
];

/// Open the core over PostgreSQL when `DATABASE_URL` is set (with the
/// `database` feature), otherwise over in-memory stores seeded from API key
/// environment variables.
pub async fn open_core(config: &StudyforgeConfig) -> StudyforgeResult<Studyforge> {
    #[cfg(feature = "database")]
    {
        match studyforge::database_url() {
            Ok(url) => return Studyforge::postgres(config, &url),
            Err(_) => warn!("DATABASE_URL not set, changes will not outlive this process"),
        }
    }
    #[cfg(not(feature = "database"))]
    warn!("Built without the database feature, changes will not outlive this process");

    let core = Studyforge::in_memory(config)?;
    seed_from_env(&core).await?;
    Ok(core)
}

async fn seed_from_env(core: &Studyforge) -> StudyforgeResult<()> {
    for (var, kind, model, priority) in SEED_PROVIDERS {
        let Ok(key) = std::env::var(var) else {
            continue;
        };
        let new = NewProviderConfig::builder()
            .provider_kind(*kind)
            .model(*model)
            .secret_credential(key)
            .priority(*priority)
            .build()
            .map_err(|e| studyforge::ConfigError::new(e.to_string()))?;
        let config = core.add_provider(new).await?;
        info!(provider = %config.label(), source = var, "Seeded provider");
    }
    Ok(())
}
