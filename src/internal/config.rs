//! Startup configuration resolved from CLI flags, the environment and an optional tool manifest.
//!
//! Precedence is flag, then environment, then default. Resolution takes the environment as a
//! lookup function so it can be tested without touching the process environment.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    cli::Cli,
    internal::{
        ai::{providers::openrouter, tools::ToolSpec},
        tui::spinner::SpinnerStyle,
    },
};

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const BASE_URL_VAR: &str = "BASE_URL";
pub const MODEL_VAR: &str = "MODEL";
/// Manifest picked up from the working directory when `--tools` is absent.
pub const DEFAULT_MANIFEST: &str = "tools.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{API_KEY_VAR} is not set")]
    MissingApiKey,

    #[error("cannot read tool manifest {path}: {source}")]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tool manifest {path}: {source}")]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("working directory unavailable: {0}")]
    WorkingDir(#[source] std::io::Error),
}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub working_dir: PathBuf,
    /// Manifest the tool specs were loaded from, if any.
    pub manifest_path: Option<PathBuf>,
    /// `None` means the built-in specs.
    pub tool_specs: Option<Vec<ToolSpec>>,
    pub spinner: SpinnerStyle,
    pub sandbox: bool,
    pub max_steps: usize,
    /// Sampling temperature; `None` leaves it to the provider.
    pub temperature: Option<f64>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("working_dir", &self.working_dir)
            .field("manifest_path", &self.manifest_path)
            .field("spinner", &self.spinner)
            .field("sandbox", &self.sandbox)
            .field("max_steps", &self.max_steps)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Config {
    /// Resolves against the current working directory.
    pub fn resolve<F>(cli: &Cli, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let working_dir = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
        Self::resolve_in(cli, env, working_dir)
    }

    pub fn resolve_in<F>(cli: &Cli, env: F, working_dir: PathBuf) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // empty values count as unset
        let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let api_key = lookup(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)?;
        let base_url = cli
            .base_url
            .clone()
            .or_else(|| lookup(BASE_URL_VAR))
            .unwrap_or_else(|| openrouter::DEFAULT_BASE_URL.to_string());
        let model = cli
            .model
            .clone()
            .or_else(|| lookup(MODEL_VAR))
            .unwrap_or_else(|| openrouter::DEFAULT_MODEL.to_string());

        let manifest_path = match &cli.tools {
            Some(path) => Some(absolutize(&working_dir, path)),
            None => Some(working_dir.join(DEFAULT_MANIFEST)).filter(|path| path.is_file()),
        };
        let tool_specs = manifest_path.as_deref().map(load_manifest).transpose()?;

        let spinner = cli
            .spinner
            .as_deref()
            .map(SpinnerStyle::parse)
            .unwrap_or_default();

        Ok(Self {
            api_key,
            base_url,
            model,
            working_dir,
            manifest_path,
            tool_specs,
            spinner,
            sandbox: !cli.no_sandbox,
            max_steps: cli.max_steps,
            temperature: cli.temperature,
        })
    }
}

fn absolutize(working_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

/// Reads a JSON array of OpenAI function-tool definitions.
pub fn load_manifest(path: &Path) -> Result<Vec<ToolSpec>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ManifestUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    ToolSpec::parse_manifest(&raw).map_err(|source| ConfigError::ManifestInvalid {
        path: path.to_path_buf(),
        source,
    })
}
