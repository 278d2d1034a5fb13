use crate::{
    FormatError,
    format::{FrameGeometry, OutputFormat, PixelFormat},
};

/// Read-only view over a multi-frame dump.
///
/// The bytes are owned elsewhere (a mapped file, a loaded buffer); only one frame's slice is
/// ever handed to a decoder.
///
/// # Example
/// ```rust
/// use rawview_core::prelude::{FrameGeometry, PixelFormat, SourceBuffer};
///
/// let bytes = vec![0u8; 6 * 2 + 1];
/// let source = SourceBuffer::new(&bytes);
/// let geometry = FrameGeometry::new(2, 2, 2).unwrap();
/// let index = source.index(PixelFormat::I420, geometry).unwrap();
/// assert_eq!(index.frame_count(), 2);
/// assert_eq!(source.frame(&index, 1).unwrap().len(), 6);
/// assert!(source.frame(&index, 2).is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SourceBuffer<'a> {
    data: &'a [u8],
}

impl<'a> SourceBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Total length of the backing region.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Frame size and number of whole frames under the given parameters.
    pub fn index(
        &self,
        format: PixelFormat,
        geometry: FrameGeometry,
    ) -> Result<FrameIndex, FormatError> {
        let frame_size = format.frame_byte_size(geometry)?;
        Ok(FrameIndex {
            frame_size,
            frame_count: self.data.len() / frame_size,
        })
    }

    /// Exactly one frame's bytes, or `None` when `frame` is past the last whole frame.
    pub fn frame(&self, index: &FrameIndex, frame: usize) -> Option<&'a [u8]> {
        let offset = index.offset(frame)?;
        self.data.get(offset..offset + index.frame_size)
    }

    /// Bytes from the start of `frame` to the end of the region.
    ///
    /// Useful when a trailing partial frame should still be shown.
    pub fn tail(&self, index: &FrameIndex, frame: usize) -> Option<&'a [u8]> {
        let offset = frame.checked_mul(index.frame_size)?;
        self.data.get(offset..).filter(|rest| !rest.is_empty())
    }
}

/// Frame addressing for one set of decode parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndex {
    frame_size: usize,
    frame_count: usize,
}

impl FrameIndex {
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// No whole frame fits in the buffer.
    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Byte offset of `frame`, if it exists.
    pub fn offset(&self, frame: usize) -> Option<usize> {
        if frame >= self.frame_count {
            return None;
        }
        frame.checked_mul(self.frame_size)
    }

    /// Pull `frame` back to the last existing frame.
    pub fn clamp(&self, frame: usize) -> usize {
        frame.min(self.frame_count.saturating_sub(1))
    }
}

/// Interleaved RGB(A) output of a decode call.
///
/// Rows are tightly packed: the stride is `width * bytes_per_pixel`, regardless of the
/// source linesize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    source: PixelFormat,
    output: OutputFormat,
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl DecodedFrame {
    /// Wrap an already-filled buffer; `None` if its length does not match the dimensions.
    pub fn new(
        source: PixelFormat,
        output: OutputFormat,
        width: usize,
        height: usize,
        data: Vec<u8>,
    ) -> Option<Self> {
        let expected = width
            .checked_mul(height)?
            .checked_mul(output.bytes_per_pixel())?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            source,
            output,
            width,
            height,
            data,
        })
    }

    /// Format the frame was decoded from.
    pub fn source_format(&self) -> PixelFormat {
        self.source
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per output row.
    pub fn stride(&self) -> usize {
        self.width * self.output.bytes_per_pixel()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Samples of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.output.bytes_per_pixel();
        let start = y * self.stride() + x * bpp;
        self.data.get(start..start + bpp)
    }
}
