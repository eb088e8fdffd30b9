use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use photo_cartoonizer::ai::GeminiCartoonClient;
use photo_cartoonizer::codec::{self, mime};
use photo_cartoonizer::controller::TransformationController;
use photo_cartoonizer::models::{parse_timeout_secs, Config, TransformationState};
use photo_cartoonizer::output;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "photo-cartoonizer")]
#[command(about = "Transform a photo into a cartoon-style portrait")]
struct CliArgs {
    /// Photo to transform.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to save the cartoon. Defaults to `cartoonified-image.<ext>`.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Media type of the input, e.g. `image/png`. Sniffed when omitted.
    #[arg(long, value_name = "TYPE")]
    media_type: Option<String>,

    /// Gemini model override.
    #[arg(long)]
    model: Option<String>,

    /// Request timeout override in seconds.
    #[arg(long, value_name = "SECS", value_parser = parse_timeout_arg)]
    timeout_secs: Option<u64>,
}

fn parse_timeout_arg(input: &str) -> std::result::Result<u64, String> {
    parse_timeout_secs(input).map_err(|e| e.to_string())
}

fn resolve_media_type(declared: Option<&str>, bytes: &[u8], path: &Path) -> Result<String> {
    declared
        .or_else(|| mime::detect_image_mime(bytes))
        .or_else(|| mime::media_type_for_path(path))
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow!(
                "Could not determine the image type of {}; pass --media-type",
                path.display()
            )
        })
}

fn describe_state(state: &TransformationState) -> String {
    match state {
        TransformationState::Idle => "Your cartoon will appear here.".to_string(),
        TransformationState::InFlight => {
            "Creating your masterpiece... This can take a few seconds.".to_string()
        }
        TransformationState::Succeeded(image) => {
            format!("Cartoon ready ({})", image.media_type())
        }
        TransformationState::Failed(reason) => {
            format!("Oh no! Something went wrong. {}", reason)
        }
    }
}

fn spawn_presenter(mut rx: watch::Receiver<TransformationState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let line = describe_state(&rx.borrow_and_update());
            info!("{}", line);
        }
    })
}

async fn run(args: CliArgs) -> Result<PathBuf> {
    let mut config = Config::from_env()?;
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    info!("Using model {}", config.model);

    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let media_type = resolve_media_type(args.media_type.as_deref(), &bytes, &args.input)?;

    let controller =
        TransformationController::new(Arc::new(GeminiCartoonClient::from_config(&config)));
    let presenter = spawn_presenter(controller.subscribe());

    let state = controller.transform(&bytes, &media_type).await;
    drop(controller);
    presenter.await?;

    match state {
        TransformationState::Succeeded(image) => {
            let path = args
                .output
                .unwrap_or_else(|| PathBuf::from(output::default_file_name(&image)));
            Ok(output::save_data_uri(&path, &codec::to_data_uri(&image)).await?)
        }
        TransformationState::Failed(reason) => bail!(reason),
        other => bail!("Transformation ended in unexpected state {:?}", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photo_cartoonizer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting photo-cartoonizer");

    let args = CliArgs::parse();

    match run(args).await {
        Ok(path) => {
            info!("Cartoon saved to {}", path.display());
            Ok(())
        }
        Err(e) => {
            error!("Cartoonization failed: {}", e);
            std::process::exit(1);
        }
    }
}
