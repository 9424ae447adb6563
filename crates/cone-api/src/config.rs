//! API configuration.

use std::path::PathBuf;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Serve HTTPS when the certificate and key are present
    pub use_https: bool,
    /// PEM certificate chain
    pub tls_cert_path: PathBuf,
    /// PEM private key
    pub tls_key_path: PathBuf,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            use_https: true,
            tls_cert_path: PathBuf::from("./certs/inference-cert.pem"),
            tls_key_path: PathBuf::from("./certs/inference-key.pem"),
            cors_origins: vec!["*".to_string()],
            max_body_size: 10 * 1024 * 1024, // 10MB
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            use_https: std::env::var("USE_HTTPS")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.use_https),
            tls_cert_path: std::env::var("TLS_CERT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tls_cert_path),
            tls_key_path: std::env::var("TLS_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tls_key_path),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.metrics_enabled),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        is_production_environment(&self.environment)
    }

    /// Whether HTTPS is requested and both PEM files exist.
    pub fn tls_available(&self) -> bool {
        self.use_https && self.tls_cert_path.is_file() && self.tls_key_path.is_file()
    }
}

/// Whether an `ENVIRONMENT` value names production, ignoring case.
pub fn is_production_environment(environment: &str) -> bool {
    environment.trim().eq_ignore_ascii_case("production")
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 5001);
        assert!(config.use_https);
        assert_eq!(config.tls_cert_path, PathBuf::from("./certs/inference-cert.pem"));
        assert!(!config.is_production());
    }

    #[test]
    fn test_production_environment() {
        assert!(is_production_environment("production"));
        assert!(is_production_environment("Production"));
        assert!(is_production_environment(" PRODUCTION "));
        assert!(!is_production_environment("development"));
        assert!(!is_production_environment(""));

        let config = ApiConfig {
            environment: "PRODUCTION".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.is_production());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }

    #[test]
    fn test_tls_unavailable_without_files() {
        let config = ApiConfig {
            tls_cert_path: PathBuf::from("/nonexistent/cert.pem"),
            tls_key_path: PathBuf::from("/nonexistent/key.pem"),
            ..ApiConfig::default()
        };
        assert!(!config.tls_available());

        let disabled = ApiConfig {
            use_https: false,
            ..ApiConfig::default()
        };
        assert!(!disabled.tls_available());
    }
}
