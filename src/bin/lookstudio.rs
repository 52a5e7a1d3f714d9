//! CLI for LookStudio - studio renders and the relay server.

use clap::{Args, Parser, Subcommand, ValueEnum};
use lookstudio::render::{
    GeminiProvider, Mode, ReferenceImage, RelayProvider, RenderProvider, RenderRequest, Renderer,
};
use lookstudio::{clamp_selection, relay, StudioConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lookstudio")]
#[command(about = "Studio renders from reference images via the Gemini image API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay endpoint holding the server-side API key
    Serve,

    /// Render one image from reference files
    Render(RenderArgs),

    /// Probe whether a usable API key is connected
    Check(CheckArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Reference image files (first N are kept if over the mode's cap)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Generation mode
    #[arg(short, long, value_enum, default_value = "single")]
    mode: ModeArg,

    /// Go through a relay endpoint instead of calling Gemini directly
    #[arg(long)]
    relay_url: Option<String>,
}

#[derive(Args)]
struct CheckArgs {
    /// Probe a relay endpoint instead of the direct provider
    #[arg(long)]
    relay_url: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One reference image, square product render
    Single,
    /// Up to ten reference images, full-body composite render
    Mix,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Single => Mode::Single,
            ModeArg::Mix => Mode::Mix,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve().await?,
        Commands::Render(args) => render(args, cli.json).await?,
        Commands::Check(args) => check(args, cli.json).await?,
    }

    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let config = StudioConfig::load()?;
    let api_key = config.require_api_key()?;

    let state = relay::RelayState::new(config.upstream_url(), api_key);
    let app = relay::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "relay listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_provider(relay_url: Option<String>) -> anyhow::Result<Arc<dyn RenderProvider>> {
    if let Some(url) = relay_url {
        return Ok(Arc::new(RelayProvider::builder().relay_url(url).build()?));
    }
    let config = StudioConfig::load()?;
    let mut builder = GeminiProvider::builder();
    if let Some(key) = config.api_key() {
        builder = builder.api_key(key);
    }
    Ok(Arc::new(builder.build()?))
}

async fn render(args: RenderArgs, json_output: bool) -> anyhow::Result<()> {
    let mode: Mode = args.mode.into();

    let mut references = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        references.push(ReferenceImage::from_bytes(data)?.with_name(name));
    }

    let given = references.len();
    let references = clamp_selection(references, mode.max_references());
    if references.len() < given {
        tracing::warn!(
            kept = references.len(),
            given,
            "{mode} mode caps references, extra inputs dropped"
        );
    }

    let request = RenderRequest::new(mode).with_references(references);
    let renderer = Renderer::new(build_provider(args.relay_url)?);
    let image = renderer.render(&request).await?;
    image.save(&args.output)?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "output": args.output.display().to_string(),
            "size_bytes": image.size(),
            "format": image.format.extension(),
            "mode": mode.as_str(),
            "model": image.metadata.model,
            "duration_ms": image.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Rendered {} ({} bytes) in {} mode",
            args.output.display(),
            image.size(),
            mode
        );
        if let Some(duration) = image.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

async fn check(args: CheckArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(args.relay_url)?;
    let result = provider.health_check().await;
    let available = result.is_ok();

    if json_output {
        let body = serde_json::json!({
            "key_available": available,
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else if available {
        println!("API key connected");
    } else if let Err(e) = result {
        println!("No usable API key: {e}");
    }

    if !available {
        std::process::exit(1);
    }
    Ok(())
}
