use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Parley chat relay server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "parley-server", version, about = "Parley chat relay server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PARLEY_PORT", default_value = "3000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "PARLEY_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./parley.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "PARLEY_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Chat behavior configuration (loaded from [chat] section in TOML)
    #[arg(skip)]
    #[serde(default)]
    pub chat: Option<ChatConfig>,
}

/// Configuration for the chat relay's message filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Additional banned words appended to the built-in profanity list
    #[serde(default)]
    pub banned_words: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "0.0.0.0".to_string(),
            config: "./parley.toml".to_string(),
            json_logs: false,
            generate_config: false,
            chat: None,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (PARLEY_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("PARLEY_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Parley Chat Relay Server Configuration
# Place this file at ./parley.toml or specify with --config <path>
# All settings can be overridden via environment variables (PARLEY_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 3000)
# port = 3000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# ---- Chat ----
# [chat]

# Additional banned words appended to the built-in profanity list.
# Matching is case-insensitive and word-boundary aware.
# banned_words = []
"#
    .to_string()
}
