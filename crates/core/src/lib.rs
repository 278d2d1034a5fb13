#![doc = include_str!("../README.md")]

pub mod buffer;
pub mod format;

/// Errors raised while validating formats and frame parameters.
///
/// # Example
/// ```rust
/// use rawview_core::FormatError;
/// use rawview_core::prelude::PixelFormat;
///
/// let err = "Y410".parse::<PixelFormat>().unwrap_err();
/// assert!(matches!(err, FormatError::UnsupportedFormat(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Zero dimensions, a linesize narrower than the width, or an overflowing frame size.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Name or tag not present in the format catalog.
    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(String),
}

pub mod prelude {
    pub use crate::{
        FormatError,
        buffer::{DecodedFrame, FrameIndex, SourceBuffer},
        format::{
            FormatFamily, FormatInfo, FourCc, FrameGeometry, Layout, OutputFormat, PixelFormat,
            PlaneLayout, UvOrder,
        },
    };
}
