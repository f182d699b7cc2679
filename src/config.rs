//! Runtime configuration loaded from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CLIENTES_DB: &str = "clientes.db";
const DEFAULT_PRODUTOS_DB: &str = "produtos.db";
const DEFAULT_TEMPLATES_DIR: &str = "templates";
const DEFAULT_IMAGE_FETCH_TIMEOUT_SECS: u64 = 20;
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub clientes_db_path: PathBuf,
    pub produtos_db_path: PathBuf,
    pub templates_dir: PathBuf,
    /// Directory for staging downloaded product images.
    pub scratch_dir: PathBuf,
    pub image_fetch_timeout: Duration,
    pub chrome_executable: Option<PathBuf>,
    /// CDP request ceiling; page loads are allowed to take this long.
    pub render_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            clientes_db_path: PathBuf::from(DEFAULT_CLIENTES_DB),
            produtos_db_path: PathBuf::from(DEFAULT_PRODUTOS_DB),
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            scratch_dir: env::temp_dir(),
            image_fetch_timeout: Duration::from_secs(DEFAULT_IMAGE_FETCH_TIMEOUT_SECS),
            chrome_executable: None,
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            clientes_db_path: path_var("CLIENTES_DB_PATH").unwrap_or(defaults.clientes_db_path),
            produtos_db_path: path_var("PRODUTOS_DB_PATH").unwrap_or(defaults.produtos_db_path),
            templates_dir: path_var("TEMPLATES_DIR").unwrap_or(defaults.templates_dir),
            scratch_dir: path_var("SCRATCH_DIR").unwrap_or(defaults.scratch_dir),
            image_fetch_timeout: secs_var("IMAGE_FETCH_TIMEOUT_SECS")?
                .unwrap_or(defaults.image_fetch_timeout),
            chrome_executable: path_var("CHROME_EXECUTABLE"),
            render_timeout: secs_var("RENDER_TIMEOUT_SECS")?.unwrap_or(defaults.render_timeout),
        })
    }

    pub fn template_path(&self) -> PathBuf {
        self.templates_dir.join("template.html")
    }

    pub fn public_dir(&self) -> PathBuf {
        self.templates_dir.join("public")
    }

    pub fn style_path(&self) -> PathBuf {
        self.public_dir().join("style.css")
    }

    pub fn logo_path(&self) -> PathBuf {
        self.public_dir().join("logo.png")
    }
}

fn path_var(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn secs_var(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
        _ => Err(ConfigError::InvalidNumber { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_follow_templates_dir() {
        let config = AppConfig {
            templates_dir: PathBuf::from("/srv/docs"),
            ..AppConfig::default()
        };
        assert_eq!(config.template_path(), PathBuf::from("/srv/docs/template.html"));
        assert_eq!(config.style_path(), PathBuf::from("/srv/docs/public/style.css"));
        assert_eq!(config.logo_path(), PathBuf::from("/srv/docs/public/logo.png"));
    }

    #[test]
    fn test_default_image_timeout_is_twenty_seconds() {
        assert_eq!(AppConfig::default().image_fetch_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        env::set_var("IMAGE_FETCH_TIMEOUT_SECS_TEST_ONLY", "abc");
        let result = secs_var("IMAGE_FETCH_TIMEOUT_SECS_TEST_ONLY");
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
        env::remove_var("IMAGE_FETCH_TIMEOUT_SECS_TEST_ONLY");
    }

    #[test]
    fn test_missing_timeout_is_none() {
        assert!(secs_var("IMAGE_FETCH_TIMEOUT_SECS_NEVER_SET").unwrap().is_none());
    }
}
