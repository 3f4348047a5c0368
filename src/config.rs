use anyhow::{bail, Context, Result};
use std::{env, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressBackend {
    Memory,
    File(PathBuf),
    Postgres(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub progress: ProgressBackend,
    pub certificate_service_url: Option<String>,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Same as [`Config::from_env`], with the variable source injected.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("PORT is not a port number: {p}"))?,
            None => 8081,
        };

        let progress = match get("PROGRESS_BACKEND").as_deref().unwrap_or("file") {
            "memory" => ProgressBackend::Memory,
            "file" => ProgressBackend::File(
                get("PROGRESS_FILE")
                    .unwrap_or_else(|| "./data/progress.json".into())
                    .into(),
            ),
            "postgres" => ProgressBackend::Postgres(
                get("DATABASE_URL").context("DATABASE_URL not set")?,
            ),
            other => bail!("unknown PROGRESS_BACKEND: {other}"),
        };

        Ok(Self {
            host,
            port,
            progress,
            certificate_service_url: get("CERTIFICATE_SERVICE_URL").filter(|s| !s.is_empty()),
            static_dir: get("STATIC_DIR")
                .unwrap_or_else(|| "./frontend/static".into())
                .into(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8081");
        assert_eq!(cfg.progress, ProgressBackend::File("./data/progress.json".into()));
        assert_eq!(cfg.certificate_service_url, None);
    }

    #[test]
    fn postgres_needs_database_url() {
        assert!(Config::from_lookup(lookup(&[("PROGRESS_BACKEND", "postgres")])).is_err());
        let cfg = Config::from_lookup(lookup(&[
            ("PROGRESS_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/edudb"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.progress,
            ProgressBackend::Postgres("postgres://localhost/edudb".into())
        );
    }

    #[test]
    fn bad_port_rejected() {
        assert!(Config::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
    }
}
