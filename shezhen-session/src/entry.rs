//! Stateless entry points.

use std::time::Instant;

use shezhen_core::{EncodedImage, ImageBlob, ImageCodec, InvalidInput, TcmAnalysis};
use shezhen_llm::{AnalysisClient, AnalysisFailure};
use tracing::{error, info};

/// Encode a user-selected file. No network activity.
///
/// # Errors
/// Returns `InvalidInput` for non-image, untyped or empty files.
pub fn select_image(blob: &ImageBlob) -> Result<EncodedImage, InvalidInput> {
    ImageCodec::encode(blob)
}

/// Run one analysis and log the outcome for operators.
///
/// # Errors
/// Returns the classified [`AnalysisFailure`]; nothing is retried.
pub async fn request_analysis(
    client: &AnalysisClient,
    image: &EncodedImage,
) -> Result<TcmAnalysis, AnalysisFailure> {
    let start = Instant::now();
    let outcome = client.analyze(image).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match &outcome {
        Ok(analysis) => info!(
            elapsed_ms,
            syndrome = %analysis.diagnosis.main_syndrome,
            "tongue analysis succeeded"
        ),
        Err(e) => {
            let cause = std::error::Error::source(e).map(ToString::to_string);
            error!(elapsed_ms, kind = ?e.kind(), ?cause, "tongue analysis failed: {e}");
        }
    }
    outcome
}
