pub mod catalog;
pub mod cli;
pub mod config;
pub mod context;
pub mod document;
pub mod errors;
pub mod images;
pub mod janitor;
pub mod models;
pub mod render;
pub mod uploads;

use crate::cli::{Cli, Commands};
use crate::config::{AppConfig, ROOT_ENV_VAR};
use crate::context::AppContext;
use crate::models::{AddActivityPayload, DeleteActivityPayload, GenerateDocumentPayload, ImageUpload};
use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let context = match start(&cli) {
        Ok(context) => context,
        Err(error) => {
            eprintln!("{:#}", error);
            return ExitCode::FAILURE;
        }
    };

    match dispatch(&context, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

fn start(cli: &Cli) -> anyhow::Result<AppContext> {
    let root = match cli.root.clone().or_else(|| std::env::var_os(ROOT_ENV_VAR).map(PathBuf::from)) {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let config = AppConfig::load(&root, cli.config.as_deref())
        .with_context(|| format!("loading configuration for {}", root.display()))?;

    if let Err(error) = init_tracing(&config.log_dir) {
        eprintln!("logging disabled: {}", error);
    }

    AppContext::new(config).context("preparing catalog storage")
}

fn dispatch(context: &AppContext, command: Commands) -> Result<(), String> {
    match command {
        Commands::Titles => print_json(&context.list_catalog_titles().map_err(to_client_error)?),
        Commands::List => print_json(&context.list_catalog().map_err(to_client_error)?),
        Commands::Add {
            category,
            title,
            bullets,
            image,
        } => {
            let image = image.as_deref().map(read_upload).transpose()?;
            let activity = context
                .add_activity(AddActivityPayload {
                    category,
                    title,
                    bullets,
                    image,
                })
                .map_err(to_client_error)?;
            print_json(&activity)
        }
        Commands::Delete { category, id } => {
            let response = context
                .delete_activity(DeleteActivityPayload {
                    category: Some(category),
                    activity_id: Some(id),
                })
                .map_err(to_client_error)?;
            print_json(&response)
        }
        Commands::Generate {
            warmup,
            main,
            cooldown,
            output,
            model_only,
        } => {
            let payload = GenerateDocumentPayload { warmup, main, cooldown };
            if model_only {
                return print_json(&context.assemble_document(&payload).map_err(to_client_error)?);
            }
            let rendered = context.generate_document(&payload).map_err(to_client_error)?;
            let target = output.unwrap_or_else(|| PathBuf::from(&rendered.filename));
            fs::write(&target, &rendered.bytes)
                .map_err(|error| format!("IO_FAILURE: cannot write {}: {}", target.display(), error))?;
            print_json(&json!({
                "path": target.to_string_lossy(),
                "mimeType": rendered.mime_type,
                "bytes": rendered.bytes.len(),
            }))
        }
    }
}

fn read_upload(path: &Path) -> Result<ImageUpload, String> {
    let bytes = fs::read(path).map_err(|error| format!("IO_FAILURE: cannot read {}: {}", path.display(), error))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(ImageUpload { filename, bytes })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value).map_err(to_client_error)?;
    println!("{}", rendered);
    Ok(())
}

fn init_tracing(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "lesson-planner.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}

fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}
