mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay_transform::{
    CredentialStore, PluginResponse, ProviderInfo, ResponseBody, Transformer, TransformerConfig,
    TransformerFactory,
};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "relay", version, about = "Run router transformer plugins by hand")]
struct Cli {
    /// Config file to use instead of config/default.toml + config/{ENV}.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run transform_request_in on a JSON request and print {body, config}
    Decorate {
        #[arg(long, value_enum, default_value_t = Plugin::QwenCli)]
        plugin: Plugin,

        /// Provider name passed to the plugin
        #[arg(long, default_value = "qwen")]
        provider: String,

        /// Request body (JSON file)
        input: PathBuf,
    },

    /// Pipe a response body from stdin through transform_response_out
    Rewrite {
        #[arg(long, value_enum, default_value_t = Plugin::ZThinking)]
        plugin: Plugin,

        #[arg(long, default_value = "text/event-stream")]
        content_type: String,
    },

    /// Force an OAuth refresh with the stored refresh token
    Refresh,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Plugin {
    QwenCli,
    ZThinking,
}

impl Plugin {
    fn config(self, config: &Config) -> TransformerConfig {
        match self {
            Self::QwenCli => TransformerConfig::QwenCli(config.qwen_cli.clone()),
            Self::ZThinking => TransformerConfig::ZThinking(config.z_thinking.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    match cli.command {
        Command::Decorate {
            plugin,
            provider,
            input,
        } => decorate(&config, plugin, &provider, &input).await,
        Command::Rewrite {
            plugin,
            content_type,
        } => rewrite(&config, plugin, &content_type).await,
        Command::Refresh => refresh(&config).await,
    }
}

async fn decorate(
    config: &Config,
    plugin: Plugin,
    provider: &str,
    input: &Path,
) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let request: Value = serde_json::from_str(&raw).context("Request is not valid JSON")?;

    let transformer = TransformerFactory::create(plugin.config(config))?;
    tracing::info!("Decorating request with {}", transformer.name());

    let out = transformer
        .transform_request_in(request, &ProviderInfo::new(provider, ""))
        .await
        .context("transform_request_in failed")?;

    let output = json!({
        "body": out.body,
        "config": { "headers": headers_to_json(&out.config.headers) },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn rewrite(config: &Config, plugin: Plugin, content_type: &str) -> anyhow::Result<()> {
    let transformer: Arc<dyn Transformer> = TransformerFactory::create(plugin.config(config))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(content_type).context("Invalid content type")?,
    );
    let response = PluginResponse::new(StatusCode::OK, headers, stdin_body());

    let out = transformer
        .transform_response_out(response)
        .await
        .context("transform_response_out failed")?;

    let mut body = out.body.into_stream();
    let mut stdout = tokio::io::stdout();
    while let Some(chunk) = body.next().await {
        stdout.write_all(&chunk?).await?;
        stdout.flush().await?;
    }

    Ok(())
}

async fn refresh(config: &Config) -> anyhow::Result<()> {
    let store = CredentialStore::from_config(&config.qwen_cli)?;
    store.load().await;

    let current = store
        .current()
        .await
        .with_context(|| format!("No OAuth credentials at {}", store.path().display()))?;

    let refreshed = store.refresh(&current.refresh_token).await?;
    match refreshed.expiry_instant() {
        Some(expiry) => println!("Refreshed; valid until {}", expiry.to_rfc3339()),
        None => println!("Refreshed; expiry {:?} is out of range", refreshed.expiry_date),
    }

    Ok(())
}

// stdin as a chunked body, fed to the plugin as it arrives
fn stdin_body() -> ResponseBody {
    ResponseBody::from_stream(async_stream::stream! {
        let mut stdin = tokio::io::stdin();
        let mut buf = vec![0u8; 8192];
        loop {
            match stdin.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => yield Ok(Bytes::copy_from_slice(&buf[..n])),
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    })
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        map.insert(
            name.to_string(),
            Value::String(value.to_str().unwrap_or_default().to_string()),
        );
    }
    Value::Object(map)
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output, so logs go to stderr
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
