use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use htsfetch::{
    Config, ResourceLoader,
    compression::raw_string_to_bytes,
    config::OutputMode,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing; stdout is reserved for data
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let loader = ResourceLoader::new(config.loader_config())?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut options = config.load_options()?;
    options.cancel = Some(cancel);

    let output = match config.mode {
        OutputMode::Text => {
            let text = if config.is_local() {
                loader.load_string_from_file(&config.source, &options).await?
            } else {
                loader.load_string(&config.source, &options).await?
            };
            raw_string_to_bytes(&text).unwrap_or_else(|| text.into_bytes())
        }
        OutputMode::Bytes => {
            let url = source_url(&config)?;
            loader.load_bytes(&url, &options).await?.to_vec()
        }
        OutputMode::Json => {
            let url = source_url(&config)?;
            match loader.load_json(&url, &options).await? {
                Some(value) => format!("{}\n", serde_json::to_string_pretty(&value)?).into_bytes(),
                None => Vec::new(),
            }
        }
    };

    tracing::info!(bytes = output.len(), source = %config.source, "loaded");

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&output).await?;
    stdout.flush().await?;

    Ok(())
}

/// Local paths are loaded through `file://` URLs.
fn source_url(config: &Config) -> anyhow::Result<String> {
    if !config.is_local() {
        return Ok(config.source.clone());
    }
    let path = std::path::absolute(&config.source)?;
    url::Url::from_file_path(&path)
        .map(String::from)
        .map_err(|_| anyhow::anyhow!("cannot turn {:?} into a file URL", path))
}
