//! User-facing failure text. Never technical; the cause goes to the logs.

use shezhen_llm::FailureKind;

/// Shown for every failure that happened after an image was accepted.
pub const GENERIC_FAILURE: &str = "分析失败，请稍后重试。可能图片不够清晰，或者服务暂时不可用。";

/// Shown when the selected file is not a usable image.
pub const INVALID_IMAGE: &str = "请上传有效的图片文件";

/// Message for a failure kind.
#[must_use]
pub fn user_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::InvalidInput => INVALID_IMAGE,
        FailureKind::EmptyResponse | FailureKind::MalformedResponse | FailureKind::ServiceFailure => {
            GENERIC_FAILURE
        }
    }
}
