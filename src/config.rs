use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub connection_string: String, // DuckDB file path, or ":memory:"
    pub pool_size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub backend: String, // "gemini", "remote", or "ollama"
    pub model: String,   // Model name
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "pretty" or "json"
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
    /// Expose internal error details in HTTP responses.
    pub debug: bool,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// DuckDB database file
    #[arg(long, value_name = "PATH")]
    pub database: Option<String>,

    /// Return internal error details to clients
    #[arg(long)]
    pub debug: bool,
}

const ENV_PREFIX: &str = "NL_SHOP";

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config_builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/nl-shop/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // Environment variables, e.g. NL_SHOP__LLM__API_KEY
        config_builder = config_builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("web.cors_origins"),
        );

        // Build the config
        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;
        config.apply_args(args);

        Ok(config)
    }

    /// Command line flags win over every other source.
    fn apply_args(&mut self, args: &CliArgs) {
        if let Some(host) = &args.host {
            self.web.host = host.clone();
        }
        if let Some(port) = args.port {
            self.web.port = port;
        }
        if let Some(database) = &args.database {
            self.database.connection_string = database.clone();
        }
        if args.debug {
            self.debug = true;
        }
    }
}

// Default implementation
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                connection_string: "nl-shop.duckdb".to_string(),
                pool_size: 5,
            },
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 8001,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:3001".to_string(),
                ],
            },
            llm: LlmConfig {
                backend: "gemini".to_string(),
                model: "gemini-1.5-flash".to_string(),
                api_key: None,
                api_url: None,
                temperature: 0.1,
                timeout_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_args_override_defaults() {
        let mut config = AppConfig::default();
        let args = CliArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            database: Some(":memory:".to_string()),
            debug: true,
            ..Default::default()
        };

        config.apply_args(&args);

        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.database.connection_string, ":memory:");
        assert!(config.debug);
    }

    #[test]
    fn test_absent_flags_keep_values() {
        let mut config = AppConfig::default();
        config.apply_args(&CliArgs::default());

        assert_eq!(config.web.port, 8001);
        assert!(!config.debug);
        assert_eq!(config.llm.backend, "gemini");
    }

    #[test]
    fn test_file_layer_over_defaults() {
        let path = std::env::temp_dir().join(format!("nl-shop-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[web]\nport = 8123\n\n[llm]\nbackend = \"ollama\"\nmodel = \"llama3\""
        )
        .unwrap();

        let args = CliArgs {
            config: Some(path.clone()),
            ..Default::default()
        };
        let config = AppConfig::new(&args).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.llm.backend, "ollama");
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.web.port, 8123);
        // Untouched keys fall back to defaults
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.database.pool_size, 5);
    }
}
