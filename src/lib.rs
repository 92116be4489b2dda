//! # docscan
//!
//! Read the holder's name, document number and expiration date from a
//! passport or driver's-licence image using a Vision Language Model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (multipart "document")
//!  │
//!  ├─ 1. Input      buffer in memory, ≤ 5 MiB, never written to disk
//!  ├─ 2. Encode     bytes → base64 ImageData (image/png)
//!  ├─ 3. VLM        one call: instruction + image → reply text
//!  ├─ 4. Normalise  strict JSON object, else label matching
//!  └─ 5. Output     record, or 400 when every field is null
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docscan::{extract_document, ExtractionConfig, InferenceAdapter, UploadedImage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder().api_key("AIza…").build()?;
//!     let adapter = InferenceAdapter::from_config(&config)?;
//!     let image = UploadedImage::new(std::fs::read("passport.png")?);
//!     let record = extract_document(&adapter, &image).await?;
//!     println!("{}", serde_json::to_string_pretty(&record)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Serving HTTP
//!
//! ```rust,no_run
//! use docscan::{server, ExtractionConfig, InferenceAdapter, ServerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractionConfig::builder().api_key("AIza…").build()?;
//! server::serve(ServerConfig::default(), InferenceAdapter::from_config(&config)?).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docscan` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, RuntimeMode, ServerConfig};
pub use error::{BackendError, DocScanError, ExtractError, InferenceError};
pub use extract::extract_document;
pub use output::{ExtractedRecord, MatchedFields, RawModelResponse, RecordSource};
pub use pipeline::input::UploadedImage;
pub use pipeline::llm::{ExtractionPrompt, InferenceAdapter, VisionBackend};
pub use pipeline::normalize::normalize;
