//! Decoder namespace with per-layout modules.

use std::sync::Arc;

#[cfg(feature = "image")]
use image::DynamicImage;
use rawview_core::prelude::*;

use crate::{Codec, CodecError, CodecRegistry};

pub mod raw;

use raw::{PackedRgbDecoder, YuvToRgbDecoder};

/// Trait to retrieve a `DynamicImage` from any decoder.
#[cfg(feature = "image")]
pub trait ImageDecode {
    fn decode_image(
        &self,
        src: &[u8],
        geometry: FrameGeometry,
    ) -> Result<DynamicImage, CodecError>;
}

#[cfg(feature = "image")]
impl<T: Codec + ?Sized> ImageDecode for T {
    fn decode_image(
        &self,
        src: &[u8],
        geometry: FrameGeometry,
    ) -> Result<DynamicImage, CodecError> {
        let frame = self.process(src, geometry)?;
        crate::image_utils::decoded_to_dynamic_image(frame)
    }
}

/// Built-in decoder for `format`, chosen by its memory layout.
pub fn decoder_for(format: PixelFormat) -> Result<Arc<dyn Codec>, CodecError> {
    let codec: Arc<dyn Codec> = match format.layout() {
        Layout::Packed { .. } => Arc::new(PackedRgbDecoder::new(format)?),
        Layout::Planar420 { .. } | Layout::Interleaved420 { .. } | Layout::Planar422 => {
            Arc::new(YuvToRgbDecoder::new(format)?)
        }
    };
    Ok(codec)
}

/// Bytes a frame slice must hold for the built-in decoder to accept it.
///
/// Equal to the frame size except for YUV geometries whose last chroma row reaches past it;
/// packed formats decode any length.
pub fn required_len(format: PixelFormat, geometry: FrameGeometry) -> Result<usize, CodecError> {
    match format.layout() {
        Layout::Packed { .. } => Ok(format.frame_byte_size(geometry)?),
        _ => YuvToRgbDecoder::new(format)?.required_len(geometry),
    }
}

/// Decode one frame with the built-in decoder for `format`.
///
/// `src` must start at the frame's first byte. YUV formats need every byte they read; packed
/// formats copy whatever is available and leave the rest of the output zeroed.
///
/// # Example
/// ```rust
/// use rawview_codec::prelude::*;
///
/// // 2x2 I420: four luma samples, one U, one V.
/// let src = [16, 16, 16, 16, 128, 128];
/// let geometry = FrameGeometry::new(2, 2, 2)?;
/// let frame = decode(&src, PixelFormat::I420, geometry)?;
/// assert_eq!(frame.data(), &[0u8; 12]);
/// # Ok::<(), CodecError>(())
/// ```
pub fn decode(
    src: &[u8],
    format: PixelFormat,
    geometry: FrameGeometry,
) -> Result<DecodedFrame, CodecError> {
    decoder_for(format)?.process(src, geometry)
}

/// Registry-backed frame decoder.
///
/// Cheap to clone; clones share the registry.
///
/// # Example
/// ```rust
/// use rawview_codec::prelude::*;
///
/// let decoder = FrameDecoder::new();
/// let geometry = FrameGeometry::tight(1, 1)?;
/// let frame = decoder.decode(&[1, 2, 3, 4], PixelFormat::Rgba8888, geometry)?;
/// assert_eq!(frame.pixel(0, 0), Some(&[1u8, 2, 3, 4][..]));
/// # Ok::<(), CodecError>(())
/// ```
#[derive(Clone)]
pub struct FrameDecoder {
    registry: CodecRegistry,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_registry(CodecRegistry::with_enabled_codecs())
    }
}

impl FrameDecoder {
    /// Decoder backed by every built-in codec.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: CodecRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Decode `src` as one frame of `format`.
    pub fn decode(
        &self,
        src: &[u8],
        format: PixelFormat,
        geometry: FrameGeometry,
    ) -> Result<DecodedFrame, CodecError> {
        let codec = self.registry.lookup(format)?;
        let consumed = codec.descriptor().input;
        if consumed != format {
            return Err(CodecError::FormatMismatch {
                expected: format,
                actual: consumed,
            });
        }
        codec.process(src, geometry)
    }

    /// Decode frame `n` of a multi-frame source.
    ///
    /// Only that frame's bytes are handed to the codec.
    pub fn decode_frame(
        &self,
        source: &SourceBuffer<'_>,
        format: PixelFormat,
        geometry: FrameGeometry,
        n: usize,
    ) -> Result<DecodedFrame, CodecError> {
        let index = source.index(format, geometry)?;
        let frame = source.frame(&index, n).ok_or_else(|| {
            CodecError::Codec(format!(
                "frame {n} out of range ({} frames)",
                index.frame_count()
            ))
        })?;
        self.decode(frame, format, geometry)
    }
}
