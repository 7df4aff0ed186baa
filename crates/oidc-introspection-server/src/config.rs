use std::net::SocketAddr;

use oidc_introspection::{IntrospectionConfig, RegisteredService, TokenRecord};
use serde::{Deserialize, Serialize};

/// Default configuration file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "oidc-introspection.toml";

/// Prefix of environment variable overrides, e.g. `OIDC_INTROSPECTION__SERVER__PORT=9090`.
pub const ENV_PREFIX: &str = "OIDC_INTROSPECTION";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Introspection endpoint configuration
    #[serde(default)]
    pub introspection: IntrospectionConfig,
    /// Registered services seeded into the in-memory catalog
    #[serde(default)]
    pub services: Vec<RegisteredService>,
    /// Tokens seeded into the in-memory resolver
    #[serde(default)]
    pub tokens: Vec<TokenRecord>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        self.introspection
            .validate()
            .map_err(|e| format!("introspection: {e}"))?;
        for service in &self.services {
            service
                .validate()
                .map_err(|e| format!("services[{}]: {e}", service.id))?;
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::{AppConfig, DEFAULT_CONFIG_FILE, ENV_PREFIX};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Loads the configuration file (if it exists) overlaid by environment overrides.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.addr().port(), 8080);
    }

    #[test]
    fn test_rejects_bad_logging_level() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_service_pattern() {
        let mut cfg = AppConfig::default();
        cfg.services
            .push(RegisteredService::new(1, "Broken", "https://(", "broken-client"));
        let err = cfg.validate().unwrap_err();
        assert!(err.starts_with("services[1]"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[server]
port = 9443

[logging]
level = "debug"

[introspection]
issuer = "https://sso.example.org/oidc"

[[services]]
id = 1
name = "Sample SP"
service_id = "https://sp\\.example.*"
client_id = "sp-client"
client_secret = "sp-secret"

[[tokens]]
id = "AT-1"
service = "https://sp.example"
client_id = "sp-client"
principal = "casuser"
scopes = ["openid", "profile"]
issued_at = 1700000000
"#
        )
        .unwrap();

        let cfg = loader::load_config(file.path().to_str()).unwrap();
        assert_eq!(cfg.server.port, 9443);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.introspection.issuer, "https://sso.example.org/oidc");
        assert_eq!(cfg.services.len(), 1);
        assert_eq!(cfg.services[0].client_secret.as_deref(), Some("sp-secret"));
        assert_eq!(cfg.tokens[0].scope_string(), "openid profile");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let cfg = loader::load_config(Some("/nonexistent/oidc-introspection.toml")).unwrap();
        assert_eq!(cfg.introspection.endpoint_path(), "/oidc/introspect");
    }
}
