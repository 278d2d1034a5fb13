#![doc = include_str!("../README.md")]

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use rawview_core::prelude::*;

/// Descriptor for a decoder implementation.
///
/// # Example
/// ```rust
/// use rawview_codec::CodecDescriptor;
/// use rawview_core::prelude::{OutputFormat, PixelFormat};
///
/// let desc = CodecDescriptor {
///     input: PixelFormat::Nv12,
///     output: OutputFormat::Rgb24,
///     name: "yuv2rgb",
///     impl_name: "interleaved420",
/// };
/// assert_eq!(desc.output.bytes_per_pixel(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CodecDescriptor {
    /// Raw format consumed.
    pub input: PixelFormat,
    /// Layout of the produced buffer.
    pub output: OutputFormat,
    /// Algorithm family (e.g. "yuv2rgb", "copy").
    pub name: &'static str,
    /// Implementation identifier.
    pub impl_name: &'static str,
}

/// Unified decoder trait: one frame's bytes in, interleaved RGB(A) out.
///
/// # Example
/// ```rust
/// use rawview_codec::{Codec, CodecDescriptor, CodecError};
/// use rawview_core::prelude::{FrameGeometry, OutputFormat, PixelFormat};
///
/// struct Grey {
///     desc: CodecDescriptor,
/// }
///
/// impl Codec for Grey {
///     fn descriptor(&self) -> &CodecDescriptor { &self.desc }
///     fn decode_into(
///         &self,
///         _src: &[u8],
///         _geometry: FrameGeometry,
///         dst: &mut [u8],
///     ) -> Result<(), CodecError> {
///         dst.fill(0x80);
///         Ok(())
///     }
/// }
///
/// let grey = Grey {
///     desc: CodecDescriptor {
///         input: PixelFormat::Rgb888,
///         output: OutputFormat::Rgb24,
///         name: "grey",
///         impl_name: "fill",
///     },
/// };
/// let frame = grey.process(&[], FrameGeometry::tight(2, 1).unwrap()).unwrap();
/// assert_eq!(frame.data(), &[0x80; 6]);
/// ```
pub trait Codec: Send + Sync + 'static {
    /// Describes what this decoder expects and produces.
    fn descriptor(&self) -> &CodecDescriptor;

    /// Decode one frame into a caller-provided, tightly packed buffer.
    ///
    /// `dst` must hold at least `width * height * bytes_per_pixel` bytes. Bytes the source
    /// cannot cover are left untouched.
    fn decode_into(
        &self,
        src: &[u8],
        geometry: FrameGeometry,
        dst: &mut [u8],
    ) -> Result<(), CodecError>;

    /// Decode one frame into a freshly allocated, zero-initialised [`DecodedFrame`].
    fn process(&self, src: &[u8], geometry: FrameGeometry) -> Result<DecodedFrame, CodecError> {
        let desc = self.descriptor();
        let len = output_len(geometry, desc.output)?;
        let mut dst = vec![0u8; len];
        self.decode_into(src, geometry, &mut dst)?;
        DecodedFrame::new(
            desc.input,
            desc.output,
            geometry.width(),
            geometry.height(),
            dst,
        )
        .ok_or_else(|| CodecError::Codec("decoded buffer length mismatch".into()))
    }
}

/// Bytes needed for a tightly packed output frame.
pub fn output_len(geometry: FrameGeometry, output: OutputFormat) -> Result<usize, CodecError> {
    geometry
        .width()
        .checked_mul(geometry.height())
        .and_then(|px| px.checked_mul(output.bytes_per_pixel()))
        .ok_or_else(|| FormatError::InvalidGeometry("output size overflows".into()).into())
}

/// Errors emitted by decoders.
///
/// # Example
/// ```rust
/// use rawview_codec::CodecError;
///
/// let err = CodecError::BufferTooShort { required: 6, actual: 4 };
/// assert_eq!(err.to_string(), "buffer too short: need 6 bytes, got 4");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Invalid geometry or unknown format.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Source slice does not cover every byte the format reads.
    #[error("buffer too short: need {required} bytes, got {actual}")]
    BufferTooShort {
        /// Bytes the decoder would read.
        required: usize,
        /// Bytes provided.
        actual: usize,
    },
    /// Caller-provided output buffer is too small.
    #[error("output buffer too short: need {required} bytes, got {actual}")]
    DstTooShort {
        required: usize,
        actual: usize,
    },
    /// A registered decoder does not consume the requested format.
    #[error("format mismatch: expected {expected}, got {actual}")]
    FormatMismatch {
        /// Requested format.
        expected: PixelFormat,
        /// Format the decoder consumes.
        actual: PixelFormat,
    },
    /// Decoder-specific failure detail.
    #[error("codec error: {0}")]
    Codec(String),
}

/// Format-keyed decoder table.
///
/// Clones share the same table.
///
/// # Example
/// ```rust
/// use rawview_codec::CodecRegistry;
/// use rawview_core::prelude::PixelFormat;
///
/// let registry = CodecRegistry::with_enabled_codecs();
/// let codec = registry.lookup(PixelFormat::Yv12).unwrap();
/// assert_eq!(codec.descriptor().input, PixelFormat::Yv12);
/// assert!(CodecRegistry::new().lookup(PixelFormat::Yv12).is_err());
/// ```
#[derive(Clone, Default)]
pub struct CodecRegistry {
    inner: Arc<RwLock<HashMap<PixelFormat, Arc<dyn Codec>>>>,
}

impl CodecRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a decoder for every catalog format.
    pub fn with_enabled_codecs() -> Self {
        let registry = Self::new();
        for format in PixelFormat::ALL {
            if let Ok(codec) = decoder::decoder_for(format) {
                registry.register(format, codec);
            }
        }
        registry
    }

    /// Register (or replace) the decoder used for `format`.
    pub fn register(&self, format: PixelFormat, codec: Arc<dyn Codec>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(format, codec);
    }

    /// Decoder registered for `format`.
    pub fn lookup(&self, format: PixelFormat) -> Result<Arc<dyn Codec>, CodecError> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&format)
            .cloned()
            .ok_or_else(|| FormatError::UnsupportedFormat(format.to_string()).into())
    }

    /// Registered descriptors in catalog order.
    pub fn list_registered(&self) -> Vec<CodecDescriptor> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        PixelFormat::ALL
            .into_iter()
            .filter_map(|format| guard.get(&format).map(|c| c.descriptor().clone()))
            .collect()
    }
}

pub mod decoder;
#[cfg(feature = "image")]
pub mod image_utils;

pub mod prelude {
    pub use crate::decoder::raw::{PackedRgbDecoder, YuvToRgbDecoder, yuv_to_rgb};
    pub use crate::decoder::{FrameDecoder, decode, decoder_for, required_len};
    #[cfg(feature = "image")]
    pub use crate::decoder::ImageDecode;
    #[cfg(feature = "image")]
    pub use crate::image_utils::{decoded_ref_to_dynamic_image, decoded_to_dynamic_image};
    pub use crate::{Codec, CodecDescriptor, CodecError, CodecRegistry, output_len};
    #[allow(unused_imports)]
    pub use rawview_core::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WrongInput {
        descriptor: CodecDescriptor,
    }

    impl Codec for WrongInput {
        fn descriptor(&self) -> &CodecDescriptor {
            &self.descriptor
        }

        fn decode_into(
            &self,
            _src: &[u8],
            _geometry: FrameGeometry,
            dst: &mut [u8],
        ) -> Result<(), CodecError> {
            dst.fill(1);
            Ok(())
        }
    }

    #[test]
    fn enabled_registry_covers_catalog() {
        let registry = CodecRegistry::with_enabled_codecs();
        let listed = registry.list_registered();
        assert_eq!(listed.len(), PixelFormat::ALL.len());
        for (desc, format) in listed.iter().zip(PixelFormat::ALL) {
            assert_eq!(desc.input, format);
            assert_eq!(desc.output, format.output_format());
        }
    }

    #[test]
    fn lookup_of_missing_format_is_unsupported() {
        let registry = CodecRegistry::new();
        let err = registry.lookup(PixelFormat::Nv21).err().unwrap();
        assert!(matches!(
            err,
            CodecError::Format(FormatError::UnsupportedFormat(name)) if name == "NV21"
        ));
    }

    #[test]
    fn register_replaces_existing_entry() {
        let registry = CodecRegistry::with_enabled_codecs();
        registry.register(
            PixelFormat::Rgb888,
            Arc::new(WrongInput {
                descriptor: CodecDescriptor {
                    input: PixelFormat::Rgb888,
                    output: OutputFormat::Rgb24,
                    name: "fill",
                    impl_name: "test",
                },
            }),
        );
        let codec = registry.lookup(PixelFormat::Rgb888).unwrap();
        assert_eq!(codec.descriptor().impl_name, "test");
        let frame = codec
            .process(&[9; 3], FrameGeometry::tight(1, 1).unwrap())
            .unwrap();
        assert_eq!(frame.data(), &[1, 1, 1]);
    }

    #[test]
    fn clones_share_the_table() {
        let registry = CodecRegistry::new();
        let clone = registry.clone();
        if let Ok(codec) = decoder::decoder_for(PixelFormat::I420) {
            clone.register(PixelFormat::I420, codec);
        }
        assert!(registry.lookup(PixelFormat::I420).is_ok());
    }
}
