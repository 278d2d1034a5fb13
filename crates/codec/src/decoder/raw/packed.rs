use rawview_core::prelude::*;
use rayon::prelude::*;

use crate::{Codec, CodecDescriptor, CodecError, output_len};

/// RGB888 / RGBA8888 → RGB24 / RGBA32 copy decoder.
///
/// Rows are read at `linesize * bytes_per_pixel` spacing and only the visible `width` pixels
/// are copied. A short source is copied as far as it goes; the rest of the output keeps its
/// previous (zero, via [`Codec::process`]) contents.
///
/// # Example
/// ```rust
/// use rawview_codec::prelude::*;
///
/// let decoder = PackedRgbDecoder::new(PixelFormat::Rgb888).unwrap();
/// let geometry = FrameGeometry::tight(2, 1).unwrap();
/// let frame = decoder.process(&[1, 2, 3, 4], geometry).unwrap();
/// assert_eq!(frame.data(), &[1, 2, 3, 4, 0, 0]);
/// ```
pub struct PackedRgbDecoder {
    descriptor: CodecDescriptor,
    bytes_per_pixel: usize,
}

impl PackedRgbDecoder {
    pub fn new(input: PixelFormat) -> Result<Self, CodecError> {
        let Layout::Packed { bytes_per_pixel } = input.layout() else {
            return Err(
                FormatError::UnsupportedFormat(format!("{input} is not a packed format")).into(),
            );
        };
        let impl_name = match bytes_per_pixel {
            3 => "rgb-copy",
            _ => "rgba-copy",
        };
        Ok(Self {
            descriptor: CodecDescriptor {
                input,
                output: input.output_format(),
                name: "copy",
                impl_name,
            },
            bytes_per_pixel,
        })
    }
}

impl Codec for PackedRgbDecoder {
    fn descriptor(&self) -> &CodecDescriptor {
        &self.descriptor
    }

    fn decode_into(
        &self,
        src: &[u8],
        geometry: FrameGeometry,
        dst: &mut [u8],
    ) -> Result<(), CodecError> {
        let out_len = output_len(geometry, self.descriptor.output)?;
        if dst.len() < out_len {
            return Err(CodecError::DstTooShort {
                required: out_len,
                actual: dst.len(),
            });
        }
        let stride = geometry
            .linesize()
            .checked_mul(self.bytes_per_pixel)
            .ok_or_else(|| FormatError::InvalidGeometry("packed stride overflows".into()))?;
        let row_bytes = geometry.width() * self.bytes_per_pixel;

        dst[..out_len]
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, dst_line)| {
                let Some(src_line) = y.checked_mul(stride).and_then(|start| src.get(start..))
                else {
                    return;
                };
                let n = src_line.len().min(row_bytes);
                dst_line[..n].copy_from_slice(&src_line[..n]);
            });
        Ok(())
    }
}
