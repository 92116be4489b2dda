//! CLI binary for docscan.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ExtractionConfig` / `ServerConfig`, then either serves HTTP
//! or runs a single extraction.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docscan::{
    extract_document, server, ExtractError, ExtractionConfig, InferenceAdapter, RuntimeMode,
    ServerConfig, UploadedImage,
};
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the HTTP service on port 5000
  docscan serve

  # Development mode: 500 responses carry a `details` field
  docscan serve --mode development --port 8080

  # One-shot extraction from a local image
  docscan extract passport.jpg

  # Use another edgequake-llm provider instead of Gemini
  docscan --provider openai --model gpt-4.1-mini extract licence.png

  # Call the service
  curl -F document=@passport.jpg http://localhost:5000/extract

ENVIRONMENT VARIABLES (also read from ./.env):
  API_KEY                   Gemini API key
  PORT                      Listen port (default 5000)
  DOCSCAN_HOST              Listen address (default 0.0.0.0)
  DOCSCAN_ENV               production | development
  DOCSCAN_MODEL             Model ID (default gemini-1.5-flash)
  DOCSCAN_PROVIDER          edgequake-llm provider name (openai, anthropic, ollama, …)
  DOCSCAN_MAX_UPLOAD_BYTES  Upload cap in bytes (default 5242880)
  DOCSCAN_PROMPT            Path to a custom extraction instruction
  RUST_LOG                  tracing filter, overrides -v / -q
"#;

/// Extract name, document number and expiry from ID document images.
#[derive(Parser, Debug)]
#[command(
    name = "docscan",
    version,
    about = "Extract name, document number and expiry from ID document images using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCSCAN_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Gemini API key.
    #[arg(long, env = "API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model ID.
    #[arg(long, env = "DOCSCAN_MODEL", default_value = docscan::config::DEFAULT_MODEL, global = true)]
    model: String,

    /// edgequake-llm provider (openai, anthropic, gemini, ollama, …). Overrides --api-key.
    #[arg(long, env = "DOCSCAN_PROVIDER", global = true)]
    provider: Option<String>,

    /// Path to a text file containing a custom extraction instruction.
    #[arg(long, env = "DOCSCAN_PROMPT", global = true)]
    prompt: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `POST /extract`.
    Serve {
        /// Listen address.
        #[arg(long, env = "DOCSCAN_HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Listen port.
        #[arg(short, long, env = "PORT", default_value_t = 5000)]
        port: u16,

        /// Runtime mode; development exposes error details.
        #[arg(long, env = "DOCSCAN_ENV", value_enum, default_value = "production")]
        mode: ModeArg,

        /// Largest accepted upload in bytes.
        #[arg(long, env = "DOCSCAN_MAX_UPLOAD_BYTES", default_value_t = docscan::config::DEFAULT_MAX_UPLOAD_BYTES)]
        max_upload_bytes: usize,
    },

    /// Run one extraction against a local image and print the record as JSON.
    Extract {
        /// Image file (PNG, JPEG, …).
        image: PathBuf,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Production,
    Development,
}

impl From<ModeArg> for RuntimeMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Production => RuntimeMode::Production,
            ModeArg::Development => RuntimeMode::Development,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal; real environment variables still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.model).await?;
    let adapter =
        InferenceAdapter::from_config(&config).context("Failed to set up the inference backend")?;

    match cli.command {
        Command::Serve {
            host,
            port,
            mode,
            max_upload_bytes,
        } => {
            let server_config = ServerConfig {
                host,
                port,
                mode: mode.into(),
                max_upload_bytes,
            };
            server::serve(server_config, adapter)
                .await
                .context("Server failed")?;
        }
        Command::Extract { image } => run_extract(&adapter, &image).await?,
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(args: &ModelArgs) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder().model(&args.model);

    if let Some(ref key) = args.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = args.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

async fn run_extract(adapter: &InferenceAdapter, path: &Path) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {:?}", path))?;
    let mut image = UploadedImage::new(bytes);
    if let Some(name) = path.file_name() {
        image = image.with_file_name(name.to_string_lossy());
    }

    match extract_document(adapter, &image).await {
        Ok(record) => {
            let json =
                serde_json::to_string_pretty(&record).context("Failed to serialise record")?;
            println!("{json}");
            Ok(())
        }
        Err(e @ ExtractError::Inference(_)) => {
            Err(anyhow::Error::new(e).context("Error processing document"))
        }
        Err(e) => Err(anyhow::anyhow!(e.user_message())),
    }
}
