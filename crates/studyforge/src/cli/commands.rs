//! CLI command definitions.

use clap::{Parser, Subcommand};
use studyforge::{ProviderKind, SubscriptionTier};

/// Studyforge - quota-aware AI dispatch administration
#[derive(Parser, Debug)]
#[command(name = "studyforge")]
#[command(about = "Manage AI providers, tier limits and usage for Studyforge", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provider registry administration
    #[command(subcommand)]
    Providers(ProviderCommands),

    /// Tier limit policies
    #[command(subcommand)]
    Limits(LimitCommands),

    /// Show a principal's usage counters
    Usage {
        /// Principal id
        principal: String,
    },

    /// Check whether a principal may spend tokens now
    Quota {
        /// Principal id
        principal: String,

        /// Subscription tier
        #[arg(long, default_value = "free")]
        tier: SubscriptionTier,

        /// Tokens the next call needs
        #[arg(long)]
        tokens: u64,
    },

    /// Send a prompt through the dispatcher
    Ask {
        /// Prompt text
        prompt: String,

        /// Principal to charge
        #[arg(long, default_value = "cli")]
        principal: String,

        /// Subscription tier of the principal
        #[arg(long, default_value = "free")]
        tier: SubscriptionTier,

        /// Skip quota checks and accounting
        #[arg(long)]
        unmetered: bool,

        /// Maximum response tokens
        #[arg(long)]
        max_tokens: Option<u32>,
    },
}

/// Provider subcommands
#[derive(Subcommand, Debug)]
pub enum ProviderCommands {
    /// List providers in selection order
    List,

    /// Register a provider
    Add {
        /// Backend family (openai, anthropic, gemini, groq, openrouter, custom)
        #[arg(long)]
        kind: ProviderKind,

        /// Model name
        #[arg(long)]
        model: String,

        /// Environment variable holding the API key
        #[arg(long)]
        key_env: String,

        /// Lower numbers are tried first
        #[arg(long, default_value = "100")]
        priority: i32,

        /// Endpoint override (required for custom providers)
        #[arg(long)]
        base_url: Option<String>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,
    },

    /// Change a provider's priority
    Priority {
        /// Provider id
        id: i64,
        /// New priority
        priority: i32,
    },

    /// Mark a provider's credits exhausted
    Exhaust {
        /// Provider id
        id: i64,
        /// Reason recorded on the provider
        #[arg(long, default_value = "Marked exhausted by administrator")]
        reason: String,
    },

    /// Return an exhausted or failing provider to rotation
    Restore {
        /// Provider id
        id: i64,
    },

    /// Make a provider the active one
    Enable {
        /// Provider id
        id: i64,
    },

    /// Clear a provider's active flag
    Disable {
        /// Provider id
        id: i64,
    },

    /// Delete a provider
    Remove {
        /// Provider id
        id: i64,
    },

    /// Send a probe prompt to one provider
    Test {
        /// Provider id
        id: i64,
    },

    /// Provider counts by health
    Health,
}

/// Limit policy subcommands
#[derive(Subcommand, Debug)]
pub enum LimitCommands {
    /// Effective limits for every tier
    List,

    /// Store a tier's limits
    Set {
        /// Tier
        tier: SubscriptionTier,

        /// Daily token ceiling
        #[arg(long)]
        daily: u64,

        /// Monthly token ceiling
        #[arg(long)]
        monthly: u64,

        /// Description shown to administrators
        #[arg(long)]
        description: Option<String>,
    },

    /// Revert a tier to its default limits
    Clear {
        /// Tier
        tier: SubscriptionTier,
    },
}
