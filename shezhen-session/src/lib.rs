//! # shezhen-session — Entry Points for the Presentation Layer
//!
//! The page code is not part of this workspace. It talks to the pipeline
//! only through this crate:
//!
//! - [`entry::select_image`] / [`entry::request_analysis`] — the two
//!   stateless entry points
//! - [`AnalysisSession`] — per-user status machine (idle → analyzing →
//!   success / error) that refuses re-submission while a call is running
//! - [`messages`] — the non-technical text shown for each failure kind
//! - [`telemetry`] — tracing subscriber setup for operators
//!
//! ```text
//! upload widget ─► select_image ─► EncodedImage
//! analyse button ─► request_analysis ─► TcmAnalysis | AnalysisFailure
//! ```

pub mod entry;
pub mod messages;
pub mod session;
pub mod telemetry;

pub use entry::{request_analysis, select_image};
pub use session::{AnalysisSession, AnalysisStatus, SessionError};
