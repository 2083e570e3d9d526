use thiserror::Error;

/// Failures at the JSON edges of the compiler.
///
/// Markup and logic processing itself never fails; only decoding the
/// records handed to [`crate::compile_preview_json`] can.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("invalid page record: {0}")]
    InvalidPage(serde_json::Error),

    #[error("invalid component records: {0}")]
    InvalidComponents(serde_json::Error),
}

pub type PreviewResult<T> = Result<T, PreviewError>;
