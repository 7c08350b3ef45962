//! # shezhen-llm — Schema-Constrained Tongue Analysis
//!
//! Owns the single inference call behind every analysis:
//!   - builds the instruction prompt and the output schema
//!   - sends the encoded image inline with one `generateContent` request
//!   - validates the returned JSON against the expected shape
//!   - classifies every failure into one of four [`AnalysisFailure`] kinds
//!
//! Exactly one request is issued per [`AnalysisClient::analyze`] call. There is
//! no retry, no cache and no fallback model; callers decide whether to let the
//! user try again.
//!
//! # Architecture
//!
//! ```text
//! EncodedImage ─► AnalysisClient ─► InferenceTransport ─► remote model
//!                      │                   (reqwest)
//!                      ├─ prompt   (instruction text)
//!                      ├─ schema   (responseSchema + shape check)
//!                      └─ credential (read fresh per call)
//! ```

pub mod client;
pub mod credential;
pub mod error;
pub mod prompt;
pub mod schema;
pub mod transport;
pub mod types;

pub use client::AnalysisClient;
pub use credential::{CredentialSource, EnvCredential, RotatingCredential, StaticCredential};
pub use error::{AnalysisFailure, FailureKind, ResponseProblem, TransportError};
pub use transport::{HttpTransport, InferenceTransport};
