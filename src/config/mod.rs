use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

const ENV_PREFIX: &str = "STEWARD";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Backend {
    #[default]
    Google,
    Local,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Platform directories for config, data and the token cache.
#[derive(Debug, Clone)]
pub(crate) struct Paths {
    pub(crate) config_dir: PathBuf,
    pub(crate) data_dir: PathBuf,
    pub(crate) cache_dir: PathBuf,
}

impl Paths {
    pub(crate) fn discover() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("com", "stewardtui", "StewardTUI")
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
            cache_dir: dirs.cache_dir().to_path_buf(),
        })
    }

    #[cfg(test)]
    pub(crate) fn under(root: &std::path::Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            cache_dir: root.join("cache"),
        }
    }

    pub(crate) fn log_file(&self) -> PathBuf {
        self.data_dir.join("stewardtui.log")
    }
}

/// Command-line flags, which win over the file and the environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct Overrides {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) sheet_id: Option<String>,
    pub(crate) local: bool,
}

impl Overrides {
    /// Pull `--config <path>`, `--sheet <id>` and `--local` out of `args`,
    /// returning the remaining arguments in order.
    pub(crate) fn extract(args: &[String]) -> Result<(Self, Vec<String>)> {
        let mut overrides = Self::default();
        let mut rest = Vec::with_capacity(args.len());
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => {
                    let path = iter.next().context("--config needs a path")?;
                    overrides.config_path = Some(PathBuf::from(path));
                }
                "--sheet" => {
                    let id = iter.next().context("--sheet needs a spreadsheet id")?;
                    overrides.sheet_id = Some(id.clone());
                }
                "--local" => overrides.local = true,
                _ => rest.push(arg.clone()),
            }
        }
        Ok((overrides, rest))
    }
}

/// Keys as they appear in `config.toml` / `STEWARD_*`.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    sheet_id: Option<String>,
    #[serde(default)]
    backend: Backend,
    credentials_path: Option<PathBuf>,
    token_cache_path: Option<PathBuf>,
    local_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppConfig {
    pub(crate) sheet_id: Option<String>,
    pub(crate) backend: Backend,
    pub(crate) credentials_path: PathBuf,
    pub(crate) token_cache_path: PathBuf,
    pub(crate) local_path: PathBuf,
}

impl AppConfig {
    pub(crate) fn load(paths: &Paths, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(paths, overrides, None)
    }

    /// `env` replaces the process environment when given.
    fn load_with_env(
        paths: &Paths,
        overrides: &Overrides,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let file = overrides
            .config_path
            .clone()
            .unwrap_or_else(|| paths.config_dir.join(CONFIG_FILE));

        let raw: RawConfig = config::Config::builder()
            .add_source(
                config::File::from(file.as_path())
                    .format(config::FileFormat::Toml)
                    .required(overrides.config_path.is_some()),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX).source(env))
            .build()
            .with_context(|| format!("Failed to load configuration from {}", file.display()))?
            .try_deserialize()
            .context("Invalid configuration")?;

        let sheet_id = overrides
            .sheet_id
            .as_deref()
            .or(raw.sheet_id.as_deref())
            .map(normalize_sheet_id)
            .filter(|id| !id.is_empty());

        let config = Self {
            sheet_id,
            backend: if overrides.local {
                Backend::Local
            } else {
                raw.backend
            },
            credentials_path: raw
                .credentials_path
                .unwrap_or_else(|| paths.config_dir.join("service_account.json")),
            token_cache_path: raw
                .token_cache_path
                .unwrap_or_else(|| paths.cache_dir.join("token.json")),
            local_path: raw
                .local_path
                .unwrap_or_else(|| paths.data_dir.join("workbook.db")),
        };
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }
}

/// Accept either a bare spreadsheet id or a full spreadsheet URL.
pub(crate) fn normalize_sheet_id(raw: &str) -> String {
    let raw = raw.trim();
    match raw.split_once("/d/") {
        Some((_, rest)) => rest.split(['/', '?', '#']).next().unwrap_or("").to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests;
