use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelaySettings {
    pub application: ApplicationSettings,
    pub upstream: UpstreamSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the Oblio REST API. All forwarded endpoints are joined
    /// onto this.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Path of the single JSON file the session is persisted in
    pub session_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.oblio.eu/api".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            session_file: "oblio_session.json".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RelaySettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - Logger initialization fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging)?;
        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `OBLIO_RELAY_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("OBLIO_RELAY_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                settings = basic_toml::from_str(&secrets_toml_content)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ OBLIO_RELAY_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_upstream_env_overrides(&mut settings.upstream);
        Self::apply_storage_env_overrides(&mut settings.storage);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    fn apply_upstream_env_overrides(upstream_settings: &mut UpstreamSettings) {
        if let Ok(base_url) = std::env::var("OBLIO_BASE_URL") {
            upstream_settings.base_url = base_url;
        }
    }

    fn apply_storage_env_overrides(storage_settings: &mut StorageSettings) {
        if let Ok(session_file) = std::env::var("OBLIO_SESSION_FILE") {
            storage_settings.session_file = session_file;
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            logging_settings.level = level;
        }
    }

    /// Initialize the logger from the configured level; `RUST_LOG` wins when
    /// set
    ///
    /// # Errors
    ///
    /// Returns an error if a logger was already installed
    fn initialize_logging(logging: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
        let env = env_logger::Env::default().default_filter_or(&logging.level);
        env_logger::Builder::from_env(env).try_init()?;
        Ok(())
    }

    /// Load environment variables from a `.env` file if present
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get the list of allowed CORS origins
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_point_at_oblio() {
        let settings = RelaySettings::default();
        assert_eq!(settings.upstream.base_url, "https://www.oblio.eu/api");
        assert_eq!(settings.storage.session_file, "oblio_session.json");
        assert_eq!(settings.get_bind_address(), "0.0.0.0:8080");
    }

    #[test]
    #[serial]
    fn env_overrides_take_priority() {
        std::env::set_var("OBLIO_BASE_URL", "http://127.0.0.1:9999/api");
        std::env::set_var("PORT", "9090");
        std::env::set_var("OBLIO_SESSION_FILE", "/tmp/session.json");

        let mut settings = RelaySettings::default();
        RelaySettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.upstream.base_url, "http://127.0.0.1:9999/api");
        assert_eq!(settings.application.port, 9090);
        assert_eq!(settings.storage.session_file, "/tmp/session.json");

        std::env::remove_var("OBLIO_BASE_URL");
        std::env::remove_var("PORT");
        std::env::remove_var("OBLIO_SESSION_FILE");
    }

    #[test]
    #[serial]
    fn invalid_port_override_is_ignored() {
        std::env::set_var("PORT", "not-a-port");

        let mut settings = RelaySettings::default();
        RelaySettings::apply_env_overrides(&mut settings);
        assert_eq!(settings.application.port, 8080);

        std::env::remove_var("PORT");
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let mut settings = RelaySettings::default();
        settings.application.cors_origins =
            "http://localhost:3000, https://console.example.com ,".to_string();

        assert_eq!(
            settings.get_cors_origins(),
            vec![
                "http://localhost:3000".to_string(),
                "https://console.example.com".to_string(),
            ]
        );
    }
}
