use rawview_core::prelude::*;
use rayon::prelude::*;

use crate::decoder::raw::yuv_to_rgb;
use crate::{Codec, CodecDescriptor, CodecError, output_len};

/// Where the chroma samples of a frame live, resolved against one geometry.
#[derive(Clone, Copy, Debug)]
enum ChromaPlanes {
    Planar {
        u_offset: usize,
        v_offset: usize,
        stride: usize,
        subsample_v: usize,
    },
    Interleaved {
        offset: usize,
        stride: usize,
        uv_order: UvOrder,
    },
}

impl ChromaPlanes {
    fn resolve(format: PixelFormat, geometry: FrameGeometry) -> Result<Self, CodecError> {
        let planes = format.plane_layouts(geometry)?;
        let chroma = match (format.layout(), planes.as_slice()) {
            (Layout::Planar420 { u_first }, [_, first, second]) => {
                let (u, v) = if u_first {
                    (first, second)
                } else {
                    (second, first)
                };
                ChromaPlanes::Planar {
                    u_offset: u.offset,
                    v_offset: v.offset,
                    stride: u.stride,
                    subsample_v: 2,
                }
            }
            (Layout::Planar422, [_, u, v]) => ChromaPlanes::Planar {
                u_offset: u.offset,
                v_offset: v.offset,
                stride: u.stride,
                subsample_v: 1,
            },
            (Layout::Interleaved420 { uv_order }, [_, uv]) => ChromaPlanes::Interleaved {
                offset: uv.offset,
                stride: uv.stride,
                uv_order,
            },
            _ => {
                return Err(CodecError::Codec(format!(
                    "{format} has no yuv chroma planes"
                )));
            }
        };
        Ok(chroma)
    }

    /// Bytes read from the start of a chroma row for `width` visible pixels.
    fn row_len(&self, width: usize) -> usize {
        let pairs = width.div_ceil(2);
        match self {
            ChromaPlanes::Planar { .. } => pairs,
            ChromaPlanes::Interleaved { .. } => pairs * 2,
        }
    }

    /// One past the last chroma byte read for the whole frame.
    fn extent(&self, geometry: FrameGeometry) -> Option<usize> {
        let last_luma_row = geometry.height() - 1;
        let (start, stride, last_row) = match *self {
            ChromaPlanes::Planar {
                u_offset,
                v_offset,
                stride,
                subsample_v,
            } => (u_offset.max(v_offset), stride, last_luma_row / subsample_v),
            ChromaPlanes::Interleaved { offset, stride, .. } => {
                (offset, stride, last_luma_row / 2)
            }
        };
        last_row
            .checked_mul(stride)?
            .checked_add(start)?
            .checked_add(self.row_len(geometry.width()))
    }

    fn row<'a>(&self, src: &'a [u8], luma_row: usize, width: usize) -> ChromaRow<'a> {
        let len = self.row_len(width);
        match *self {
            ChromaPlanes::Planar {
                u_offset,
                v_offset,
                stride,
                subsample_v,
            } => {
                let start = (luma_row / subsample_v) * stride;
                ChromaRow::Planar {
                    u: &src[u_offset + start..][..len],
                    v: &src[v_offset + start..][..len],
                }
            }
            ChromaPlanes::Interleaved {
                offset,
                stride,
                uv_order,
            } => ChromaRow::Interleaved {
                uv: &src[offset + (luma_row / 2) * stride..][..len],
                uv_order,
            },
        }
    }
}

enum ChromaRow<'a> {
    Planar { u: &'a [u8], v: &'a [u8] },
    Interleaved { uv: &'a [u8], uv_order: UvOrder },
}

impl ChromaRow<'_> {
    /// `(U, V)` for luma column `x`; chroma is shared by each horizontal pair.
    #[inline(always)]
    fn sample(&self, x: usize) -> (i32, i32) {
        let k = x / 2;
        match self {
            ChromaRow::Planar { u, v } => (u[k] as i32, v[k] as i32),
            ChromaRow::Interleaved {
                uv,
                uv_order: UvOrder::Uv,
            } => (uv[2 * k] as i32, uv[2 * k + 1] as i32),
            ChromaRow::Interleaved {
                uv,
                uv_order: UvOrder::Vu,
            } => (uv[2 * k + 1] as i32, uv[2 * k] as i32),
        }
    }
}

/// YUV (I420, YV12, NV12, NV21, I422) → RGB24 decoder.
///
/// One conversion routine serves every YUV layout; only chroma addressing differs.
///
/// # Example
/// ```rust
/// use rawview_codec::prelude::*;
///
/// let decoder = YuvToRgbDecoder::new(PixelFormat::I420).unwrap();
/// let geometry = FrameGeometry::new(2, 2, 2).unwrap();
/// let frame = decoder.process(&[16, 16, 16, 16, 128, 128], geometry).unwrap();
/// assert_eq!(frame.data(), &[0u8; 12]);
/// ```
pub struct YuvToRgbDecoder {
    descriptor: CodecDescriptor,
}

impl YuvToRgbDecoder {
    pub fn new(input: PixelFormat) -> Result<Self, CodecError> {
        let impl_name = match input.layout() {
            Layout::Planar420 { .. } => "planar420",
            Layout::Interleaved420 { .. } => "interleaved420",
            Layout::Planar422 => "planar422",
            Layout::Packed { .. } => {
                return Err(FormatError::UnsupportedFormat(format!(
                    "{input} is not a yuv format"
                ))
                .into());
            }
        };
        Ok(Self {
            descriptor: CodecDescriptor {
                input,
                output: OutputFormat::Rgb24,
                name: "yuv2rgb",
                impl_name,
            },
        })
    }

    /// Bytes of `src` this decoder reads for `geometry`.
    ///
    /// Never less than the frame size; larger when odd dimensions make the last chroma row
    /// reach past the nominal plane end.
    pub fn required_len(&self, geometry: FrameGeometry) -> Result<usize, CodecError> {
        let overflow = || CodecError::from(FormatError::InvalidGeometry("extent overflows".into()));
        let format = self.descriptor.input;
        let frame_size = format.frame_byte_size(geometry)?;
        let luma_extent = (geometry.height() - 1)
            .checked_mul(geometry.linesize())
            .and_then(|v| v.checked_add(geometry.width()))
            .ok_or_else(overflow)?;
        let chroma_extent = ChromaPlanes::resolve(format, geometry)?
            .extent(geometry)
            .ok_or_else(overflow)?;
        Ok(frame_size.max(luma_extent).max(chroma_extent))
    }
}

impl Codec for YuvToRgbDecoder {
    fn descriptor(&self) -> &CodecDescriptor {
        &self.descriptor
    }

    fn decode_into(
        &self,
        src: &[u8],
        geometry: FrameGeometry,
        dst: &mut [u8],
    ) -> Result<(), CodecError> {
        let required = self.required_len(geometry)?;
        if src.len() < required {
            return Err(CodecError::BufferTooShort {
                required,
                actual: src.len(),
            });
        }
        let out_len = output_len(geometry, OutputFormat::Rgb24)?;
        if dst.len() < out_len {
            return Err(CodecError::DstTooShort {
                required: out_len,
                actual: dst.len(),
            });
        }

        let chroma = ChromaPlanes::resolve(self.descriptor.input, geometry)?;
        let width = geometry.width();
        let y_stride = geometry.linesize();
        let row_bytes = width * 3;
        dst[..out_len]
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, dst_line)| {
                let y_line = &src[y * y_stride..][..width];
                let chroma_line = chroma.row(src, y, width);
                for (x, (px, &luma)) in dst_line.chunks_exact_mut(3).zip(y_line).enumerate() {
                    let (u, v) = chroma_line.sample(x);
                    let (r, g, b) = yuv_to_rgb(luma as i32, u, v);
                    px[0] = r;
                    px[1] = g;
                    px[2] = b;
                }
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::raw::rgb_to_yuv;

    fn decoder(format: PixelFormat) -> YuvToRgbDecoder {
        YuvToRgbDecoder::new(format).unwrap()
    }

    fn geometry(w: u32, h: u32, ls: u32) -> FrameGeometry {
        FrameGeometry::new(w, h, ls).unwrap()
    }

    /// Encode a frame whose 2x2 blocks share one colour, so chroma subsampling is lossless.
    fn encode_blocks(
        format: PixelFormat,
        geometry: FrameGeometry,
        color_at: impl Fn(usize, usize) -> (i32, i32, i32),
    ) -> Vec<u8> {
        let (w, h, ls) = (geometry.width(), geometry.height(), geometry.linesize());
        let mut out = vec![0u8; format.frame_byte_size(geometry).unwrap()];
        let planes = format.plane_layouts(geometry).unwrap();
        for row in 0..h {
            for col in 0..w {
                let (r, g, b) = color_at(row / 2, col / 2);
                let (y, u, v) = rgb_to_yuv(r, g, b);
                out[row * ls + col] = y;
                match format.layout() {
                    Layout::Planar420 { u_first } => {
                        let (u_plane, v_plane) = if u_first {
                            (planes[1], planes[2])
                        } else {
                            (planes[2], planes[1])
                        };
                        let idx = (row / 2) * u_plane.stride + col / 2;
                        out[u_plane.offset + idx] = u;
                        out[v_plane.offset + idx] = v;
                    }
                    Layout::Planar422 => {
                        let idx = row * planes[1].stride + col / 2;
                        out[planes[1].offset + idx] = u;
                        out[planes[2].offset + idx] = v;
                    }
                    Layout::Interleaved420 { uv_order } => {
                        let idx = planes[1].offset + (row / 2) * ls + (col / 2) * 2;
                        let (first, second) = match uv_order {
                            UvOrder::Uv => (u, v),
                            UvOrder::Vu => (v, u),
                        };
                        out[idx] = first;
                        out[idx + 1] = second;
                    }
                    Layout::Packed { .. } => unreachable!(),
                }
            }
        }
        out
    }

    #[test]
    fn i420_black_frame() {
        let src = [16, 16, 16, 16, 128, 128];
        let frame = decoder(PixelFormat::I420)
            .process(&src, geometry(2, 2, 2))
            .unwrap();
        assert_eq!(frame.data(), &[0u8; 12]);
        assert_eq!(frame.source_format(), PixelFormat::I420);
        assert_eq!(frame.output_format(), OutputFormat::Rgb24);
    }

    #[test]
    fn nv12_and_nv21_swap_chroma() {
        let g = geometry(2, 2, 2);
        let src = [128, 128, 128, 128, 200, 50];
        let nv12 = decoder(PixelFormat::Nv12).process(&src, g).unwrap();
        let nv21 = decoder(PixelFormat::Nv21).process(&src, g).unwrap();
        assert_ne!(nv12.data(), nv21.data());
        // U=200 pushes NV12 toward blue; read as V=200 it pushes NV21 toward red.
        assert_eq!(nv12.pixel(0, 0), Some(&[6u8, 166, 255][..]));
        assert_eq!(nv21.pixel(1, 1), Some(&[245u8, 102, 0][..]));
    }

    #[test]
    fn yv12_reads_v_plane_first() {
        let g = geometry(2, 2, 2);
        let i420 = decoder(PixelFormat::I420)
            .process(&[128, 128, 128, 128, 200, 50], g)
            .unwrap();
        let yv12 = decoder(PixelFormat::Yv12)
            .process(&[128, 128, 128, 128, 50, 200], g)
            .unwrap();
        assert_eq!(i420.data(), yv12.data());
    }

    #[test]
    fn round_trip_every_yuv_layout() {
        let palette = [
            (200, 100, 50),
            (16, 200, 120),
            (90, 40, 220),
            (240, 200, 30),
            (0, 0, 255),
            (255, 255, 255),
        ];
        let color_at = |by: usize, bx: usize| palette[(by * 3 + bx) % palette.len()];
        let g = geometry(6, 4, 8);
        for format in [
            PixelFormat::I420,
            PixelFormat::Yv12,
            PixelFormat::Nv12,
            PixelFormat::Nv21,
            PixelFormat::I422,
        ] {
            let src = encode_blocks(format, g, color_at);
            let frame = decoder(format).process(&src, g).unwrap();
            for y in 0..g.height() {
                for x in 0..g.width() {
                    let (r, gr, b) = color_at(y / 2, x / 2);
                    let px = frame.pixel(x, y).unwrap();
                    for (want, got) in [r, gr, b].into_iter().zip(px) {
                        assert!(
                            (want - *got as i32).abs() <= 2,
                            "{format} ({x},{y}): want {want} got {got}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn i422_keeps_per_row_chroma() {
        // 2x2 frame, U differs between the two rows.
        let g = geometry(2, 2, 2);
        let src = [128, 128, 128, 128, 200, 50, 128, 128];
        let frame = decoder(PixelFormat::I422).process(&src, g).unwrap();
        assert_eq!(frame.pixel(0, 0), Some(&[130u8, 102, 255][..]));
        assert_eq!(frame.pixel(1, 0), Some(&[130u8, 102, 255][..]));
        assert_eq!(frame.pixel(0, 1), Some(&[130u8, 161, 0][..]));
    }

    #[test]
    fn padded_linesize_skips_padding() {
        let g = geometry(2, 2, 4);
        // Y rows: [16, 16, pad, pad]; chroma stride 2.
        let src = [16, 16, 255, 255, 16, 16, 255, 255, 128, 0, 128, 0];
        let frame = decoder(PixelFormat::I420).process(&src, g).unwrap();
        assert_eq!(frame.data(), &[0u8; 12]);
        assert_eq!(frame.stride(), 6);
    }

    #[test]
    fn short_slice_is_rejected() {
        let err = decoder(PixelFormat::I420)
            .process(&[16; 5], geometry(2, 2, 2))
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::BufferTooShort {
                required: 6,
                actual: 5
            }
        ));
    }

    #[test]
    fn odd_dimensions_account_for_chroma_overreach() {
        // NV12 2x1: frame size is 3, but the chroma pair reads bytes 2 and 3.
        let d = decoder(PixelFormat::Nv12);
        let g = geometry(2, 1, 2);
        assert_eq!(PixelFormat::Nv12.frame_byte_size(g).unwrap(), 3);
        assert_eq!(d.required_len(g).unwrap(), 4);
        assert!(matches!(
            d.process(&[16, 16, 128], g),
            Err(CodecError::BufferTooShort {
                required: 4,
                actual: 3
            })
        ));
        assert!(d.process(&[16, 16, 128, 128], g).is_ok());

        // I420 with odd linesize truncates the chroma stride and overlaps rows.
        let d = decoder(PixelFormat::I420);
        let g = geometry(3, 1, 3);
        assert_eq!(PixelFormat::I420.frame_byte_size(g).unwrap(), 4);
        assert_eq!(d.required_len(g).unwrap(), 5);
    }

    /// Per-pixel `(Y, U, V)` read with plain index arithmetic, chroma stride `ls / 2`.
    fn addressed_sample(
        format: PixelFormat,
        src: &[u8],
        (h, ls): (usize, usize),
        i: usize,
        j: usize,
    ) -> (i32, i32, i32) {
        let y = src[i * ls + j];
        let chroma = &src[ls * h..];
        let uv_ls = ls / 2;
        let (u, v) = match format {
            PixelFormat::I420 => {
                let idx = (i / 2) * uv_ls + j / 2;
                (chroma[idx], chroma[uv_ls * (h / 2) + idx])
            }
            PixelFormat::Yv12 => {
                let idx = (i / 2) * uv_ls + j / 2;
                (chroma[uv_ls * (h / 2) + idx], chroma[idx])
            }
            PixelFormat::I422 => {
                let idx = i * uv_ls + j / 2;
                (chroma[idx], chroma[uv_ls * h + idx])
            }
            PixelFormat::Nv12 => {
                let idx = (i / 2) * ls + (j / 2) * 2;
                (chroma[idx], chroma[idx + 1])
            }
            PixelFormat::Nv21 => {
                let idx = (i / 2) * ls + (j / 2) * 2;
                (chroma[idx + 1], chroma[idx])
            }
            PixelFormat::Rgb888 | PixelFormat::Rgba8888 => unreachable!(),
        };
        (y as i32, u as i32, v as i32)
    }

    #[test]
    fn odd_linesize_keeps_truncated_chroma_stride() {
        let shapes = [(3, 2, 3), (5, 4, 5), (5, 3, 7), (4, 4, 5)];
        for format in [
            PixelFormat::I420,
            PixelFormat::Yv12,
            PixelFormat::I422,
            PixelFormat::Nv12,
            PixelFormat::Nv21,
        ] {
            for (w, h, ls) in shapes {
                let g = geometry(w, h, ls);
                let d = decoder(format);
                let len = d.required_len(g).unwrap();
                // Every byte distinct within a frame, so a wrong chroma cell changes the output.
                let src: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
                let frame = d.process(&src, g).unwrap();
                let dims = (h as usize, ls as usize);
                for i in 0..g.height() {
                    for j in 0..g.width() {
                        let (y, u, v) = addressed_sample(format, &src, dims, i, j);
                        let (r, gr, b) = yuv_to_rgb(y, u, v);
                        assert_eq!(
                            frame.pixel(j, i),
                            Some(&[r, gr, b][..]),
                            "{format} {w}x{h} ls {ls} at ({j},{i})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn destination_must_fit() {
        let mut dst = [0u8; 11];
        let err = decoder(PixelFormat::I420)
            .decode_into(&[16; 6], geometry(2, 2, 2), &mut dst)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::DstTooShort {
                required: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn packed_formats_are_not_yuv() {
        assert!(matches!(
            YuvToRgbDecoder::new(PixelFormat::Rgb888),
            Err(CodecError::Format(FormatError::UnsupportedFormat(_)))
        ));
    }
}
