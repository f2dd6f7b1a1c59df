use thiserror::Error;

/// Failures surfaced by the command layer and the codec boundary.
///
/// Pixel-level operations never produce these: out-of-range geometry clips
/// silently and degenerate inputs return empty damage. Every variant leaves
/// the document and its history untouched.
#[derive(Debug, Error)]
pub enum EditError {
    /// Image decode/encode failure from the codec service.
    #[error("codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// A command parameter was rejected before any mutation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A color string could not be parsed.
    #[error("cannot parse color {0:?} (expected #RRGGBB or #AARRGGBB)")]
    ColorParse(String),

    /// The requested operation needs state the document is not in
    /// (e.g. entering transform preview with an empty overlay).
    #[error("{0}")]
    BadState(&'static str),
}
