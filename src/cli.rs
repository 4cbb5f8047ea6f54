//! CLI entry for Bono: parses flags, resolves configuration, sets up file logging and runs the
//! terminal UI until the user quits.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::{Arc, Mutex},
};

use clap::Parser;

use crate::internal::{
    ai::{
        AgentBuilder, AgentCore, NoSandbox, PolicySandbox, Sandbox, agent::DEFAULT_MAX_STEPS,
        client::CompletionClient, providers::openrouter,
    },
    config::Config,
    tui::{App, AppConfig, AppExitInfo, Tui, tui_init, tui_restore},
};

pub const LOG_FILE_VAR: &str = "BONO_LOG_FILE";
const DEFAULT_LOG_FILTER: &str = "bono=info";

#[derive(Parser, Debug)]
#[command(
    name = "bono",
    about = "Bono: an interactive coding agent for the terminal",
    version
)]
pub struct Cli {
    #[arg(long, help = "Model identifier, overrides $MODEL")]
    pub model: Option<String>,

    #[arg(long, help = "OpenAI-compatible API base URL, overrides $BASE_URL")]
    pub base_url: Option<String>,

    #[arg(
        long,
        value_name = "MANIFEST",
        help = "JSON tool manifest replacing the built-in tools"
    )]
    pub tools: Option<PathBuf>,

    #[arg(long, value_name = "TYPE", help = "Spinner style (line, dot, moon, ...)")]
    pub spinner: Option<String>,

    #[arg(long, help = "Disable the shell sandbox policy")]
    pub no_sandbox: bool,

    #[arg(long, default_value_t = DEFAULT_MAX_STEPS, help = "Maximum model steps per turn")]
    pub max_steps: usize,

    #[arg(long, help = "Sampling temperature sent with every completion request")]
    pub temperature: Option<f64>,

    #[arg(long, help = "Log file path, overrides $BONO_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Runs the application. Exit code 1 means startup failed before the UI took the terminal.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        eprintln!("warning: failed to load .env: {err}");
    }

    let config = match Config::resolve(&cli, |key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = log_file_path(cli.log_file.as_deref())
        && let Err(err) = init_file_logging(&path)
    {
        eprintln!("warning: logging disabled: {err}");
    }

    tracing::info!(
        model = %config.model,
        base_url = %config.base_url,
        manifest = ?config.manifest_path,
        sandbox = config.sandbox,
        "starting"
    );

    match run_ui(config).await {
        Ok(info) => {
            tracing::info!(reason = ?info.reason, "exited");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "ui failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn build_agent(config: &Config) -> Arc<dyn AgentCore> {
    let client = openrouter::Client::with_base_url(&config.base_url, config.api_key.clone());
    let model = client.completion_model(config.model.clone());

    let sandbox: Arc<dyn Sandbox> = if config.sandbox {
        Arc::new(PolicySandbox::default())
    } else {
        Arc::new(NoSandbox)
    };
    let mut builder = AgentBuilder::new(model, config.model.clone(), config.working_dir.clone())
        .sandbox(sandbox)
        .max_steps(config.max_steps);
    if let Some(specs) = &config.tool_specs {
        builder = builder.tool_specs(specs.clone());
    }
    if let Some(temperature) = config.temperature {
        builder = builder.temperature(temperature);
    }
    Arc::new(builder.build())
}

async fn run_ui(config: Config) -> anyhow::Result<AppExitInfo> {
    let agent = build_agent(&config);
    let app_config = AppConfig {
        spinner: config.spinner,
        idle_text: config.working_dir.display().to_string(),
    };

    let terminal = tui_init()?;
    let mut app = App::new(Tui::new(terminal), agent, app_config);
    let result = app.run().await;
    if let Err(err) = tui_restore() {
        tracing::warn!(error = %err, "failed to restore terminal");
    }
    result
}

/// `--log-file`, then `$BONO_LOG_FILE`, then the per-user data directory.
fn log_file_path(flag: Option<&Path>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| {
            std::env::var_os(LOG_FILE_VAR)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .or_else(|| dirs::data_dir().map(|dir| dir.join("bono").join("bono.log")))
}

fn init_file_logging(log_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
    Ok(())
}

/// this test is to verify that the CLI can be built without panicking
#[test]
fn verify_cli() {
    use clap::CommandFactory;

    Cli::command().debug_assert()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_flag_wins() {
        let path = log_file_path(Some(Path::new("/tmp/x.log")));
        assert_eq!(path, Some(PathBuf::from("/tmp/x.log")));
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "bono",
            "--model",
            "m",
            "--tools",
            "t.json",
            "--no-sandbox",
            "--max-steps",
            "5",
        ]);
        assert_eq!(cli.model.as_deref(), Some("m"));
        assert_eq!(cli.tools, Some(PathBuf::from("t.json")));
        assert!(cli.no_sandbox);
        assert_eq!(cli.max_steps, 5);
        assert!(cli.spinner.is_none());
    }
}
