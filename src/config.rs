use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_FLAGS_PATH: &str = "flags.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("{0} missing, it is required")]
    Missing(&'static str),

    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub flags_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, EnvError> {
        let _ = dotenv().is_ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any variable source
    pub fn from_vars<F>(lookup: F) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT").ok_or(EnvError::Missing("PORT"))?;
        let port = port.parse().map_err(|_| EnvError::Invalid {
            name: "PORT",
            expected: "u16 number",
            value: port.clone(),
        })?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let flags_path = lookup("FLAGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FLAGS_PATH));

        Ok(Self {
            host,
            port,
            flags_path,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[("PORT", "8080")])).unwrap();

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.flags_path, PathBuf::from("flags.json"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("PORT", "9000"),
            ("HOST", "0.0.0.0"),
            ("FLAGS_PATH", "/etc/flags/prod.json"),
        ]))
        .unwrap();

        assert_eq!(config.addr(), "0.0.0.0:9000");
        assert_eq!(config.flags_path, PathBuf::from("/etc/flags/prod.json"));
    }

    #[test]
    fn test_missing_port() {
        assert_eq!(
            Config::from_vars(vars(&[])),
            Err(EnvError::Missing("PORT"))
        );
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_vars(vars(&[("PORT", "99999")]));

        assert!(matches!(result, Err(EnvError::Invalid { name: "PORT", .. })));
    }
}
