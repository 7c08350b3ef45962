//! # shezhen-core — Data Model & Image Codec
//!
//! The leaf crate of the shezhen workspace. It owns everything that does not
//! talk to the network:
//!   - **types** — the decoded [`TcmAnalysis`] record and the [`EncodedImage`] payload
//!   - **codec** — turning a user-supplied file into base64 plus its declared media type
//!   - **config** — TOML configuration shared by the other crates
//!
//! # Pipeline
//!
//! ```text
//! ImageBlob / path ──► ImageCodec ──► EncodedImage ──► shezhen-llm ──► TcmAnalysis
//!                          │
//!                          └── InvalidInput (no network call)
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod types;

pub use codec::ImageCodec;
pub use config::ShezhenConfig;
pub use error::{InvalidInput, ShezhenError};
pub use types::{Diagnosis, EncodedImage, ImageBlob, Recommendations, TcmAnalysis, VisualFeatures};
