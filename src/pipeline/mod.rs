//! Pipeline stages for document extraction.
//!
//! Each submodule implements exactly one step so each can be tested on its
//! own and the model backend can be swapped without touching parsing.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ normalize
//! (multipart) (base64)  (VLM)   (JSON | labels)
//! ```
//!
//! 1. [`input`]: buffer the `document` upload in memory, enforcing the size cap
//! 2. [`encode`]: base64-wrap the bytes as `image/png` `ImageData`
//! 3. [`llm`]: the Inference Adapter; the only stage with network I/O
//! 4. [`normalize`]: strict JSON decode, falling back to label matching

pub mod encode;
pub mod input;
pub mod llm;
pub mod normalize;
