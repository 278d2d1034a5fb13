use std::{fmt, num::NonZeroU32, str::FromStr};

use smallvec::{SmallVec, smallvec};

use crate::FormatError;

/// Four-character code describing a pixel format.
///
/// # Example
/// ```rust
/// use rawview_core::prelude::FourCc;
///
/// let fcc = FourCc::new(*b"NV12");
/// assert_eq!(fcc.to_string(), "NV12");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// Construct from raw bytes.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Little-endian u32 encoding.
    pub fn to_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// Try to convert to a printable string.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl From<u32> for FourCc {
    fn from(value: u32) -> Self {
        Self(value.to_le_bytes())
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.as_str() {
            write!(f, "{s}")
        } else {
            write!(f, "0x{:08x}", self.to_u32())
        }
    }
}

/// Order of the two chroma bytes in an interleaved chroma plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvOrder {
    /// `U` at even bytes, `V` at odd bytes (NV12).
    Uv,
    /// `V` at even bytes, `U` at odd bytes (NV21).
    Vu,
}

/// Plane-layout strategy shared by the formats of one family.
///
/// Decoders only differ in how they address chroma; the colorspace math is common.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Y plane, then two quarter-size chroma planes at `linesize / 2` stride.
    Planar420 {
        /// `true` when the U plane precedes the V plane.
        u_first: bool,
    },
    /// Y plane, then one interleaved chroma plane at full `linesize` stride.
    Interleaved420 {
        /// Byte order of each chroma pair.
        uv_order: UvOrder,
    },
    /// Y plane, then U and V planes with one chroma row per luma row.
    Planar422,
    /// Interleaved samples, no conversion required.
    Packed {
        /// Bytes per pixel (3 or 4).
        bytes_per_pixel: usize,
    },
}

/// Broad grouping used by the frame size formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    /// 4:2:0 planar or semi-planar.
    Yuv420,
    /// 4:2:2 planar.
    Yuv422,
    /// Packed RGB or RGBA.
    Packed,
}

/// Layout of the decoded output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputFormat {
    /// Interleaved `[R, G, B]`.
    Rgb24,
    /// Interleaved `[R, G, B, A]`.
    Rgba32,
}

impl OutputFormat {
    /// Bytes per output pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            OutputFormat::Rgb24 => 3,
            OutputFormat::Rgba32 => 4,
        }
    }

    /// FourCC of the output layout.
    pub fn fourcc(self) -> FourCc {
        match self {
            OutputFormat::Rgb24 => FourCc::new(*b"RG24"),
            OutputFormat::Rgba32 => FourCc::new(*b"RGBA"),
        }
    }
}

/// Supported raw pixel formats.
///
/// # Example
/// ```rust
/// use rawview_core::prelude::PixelFormat;
///
/// let fmt: PixelFormat = "YUV420SP (NV21)".parse().unwrap();
/// assert_eq!(fmt, PixelFormat::Nv21);
/// assert_eq!(fmt.info().name, "NV21");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum PixelFormat {
    I420,
    Yv12,
    Nv12,
    Nv21,
    I422,
    Rgb888,
    Rgba8888,
}

/// Static description of a pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Canonical short name.
    pub name: &'static str,
    /// Label shown by the settings surface.
    pub label: &'static str,
    /// Accepted alternative spellings.
    pub aliases: &'static [&'static str],
    pub fourcc: FourCc,
    pub family: FormatFamily,
    pub layout: Layout,
    pub planes: usize,
    pub output: OutputFormat,
}

static CATALOG: [FormatInfo; 7] = [
    FormatInfo {
        name: "I420",
        label: "YUV420P (I420/YU12)",
        aliases: &["YU12", "YUV420P", "IYUV"],
        fourcc: FourCc::new(*b"I420"),
        family: FormatFamily::Yuv420,
        layout: Layout::Planar420 { u_first: true },
        planes: 3,
        output: OutputFormat::Rgb24,
    },
    FormatInfo {
        name: "YV12",
        label: "YUV420P (YV12)",
        aliases: &[],
        fourcc: FourCc::new(*b"YV12"),
        family: FormatFamily::Yuv420,
        layout: Layout::Planar420 { u_first: false },
        planes: 3,
        output: OutputFormat::Rgb24,
    },
    FormatInfo {
        name: "NV12",
        label: "YUV420SP (NV12)",
        aliases: &[],
        fourcc: FourCc::new(*b"NV12"),
        family: FormatFamily::Yuv420,
        layout: Layout::Interleaved420 {
            uv_order: UvOrder::Uv,
        },
        planes: 2,
        output: OutputFormat::Rgb24,
    },
    FormatInfo {
        name: "NV21",
        label: "YUV420SP (NV21)",
        aliases: &[],
        fourcc: FourCc::new(*b"NV21"),
        family: FormatFamily::Yuv420,
        layout: Layout::Interleaved420 {
            uv_order: UvOrder::Vu,
        },
        planes: 2,
        output: OutputFormat::Rgb24,
    },
    FormatInfo {
        name: "I422",
        label: "YUV422P (I422)",
        aliases: &["YUV422P"],
        fourcc: FourCc::new(*b"422P"),
        family: FormatFamily::Yuv422,
        layout: Layout::Planar422,
        planes: 3,
        output: OutputFormat::Rgb24,
    },
    FormatInfo {
        name: "RGB888",
        label: "RGB888",
        aliases: &["RGB24", "RGB"],
        fourcc: FourCc::new(*b"RG24"),
        family: FormatFamily::Packed,
        layout: Layout::Packed { bytes_per_pixel: 3 },
        planes: 1,
        output: OutputFormat::Rgb24,
    },
    FormatInfo {
        name: "RGBA8888",
        label: "RGBA8888",
        aliases: &["RGBA", "RGBA32"],
        fourcc: FourCc::new(*b"RGBA"),
        family: FormatFamily::Packed,
        layout: Layout::Packed { bytes_per_pixel: 4 },
        planes: 1,
        output: OutputFormat::Rgba32,
    },
];

impl PixelFormat {
    /// Every supported format, in catalog order.
    pub const ALL: [PixelFormat; 7] = [
        PixelFormat::I420,
        PixelFormat::Yv12,
        PixelFormat::Nv12,
        PixelFormat::Nv21,
        PixelFormat::I422,
        PixelFormat::Rgb888,
        PixelFormat::Rgba8888,
    ];

    /// Catalog entry for this format.
    pub fn info(self) -> &'static FormatInfo {
        let idx = match self {
            PixelFormat::I420 => 0,
            PixelFormat::Yv12 => 1,
            PixelFormat::Nv12 => 2,
            PixelFormat::Nv21 => 3,
            PixelFormat::I422 => 4,
            PixelFormat::Rgb888 => 5,
            PixelFormat::Rgba8888 => 6,
        };
        &CATALOG[idx]
    }

    pub fn family(self) -> FormatFamily {
        self.info().family
    }

    pub fn layout(self) -> Layout {
        self.info().layout
    }

    pub fn fourcc(self) -> FourCc {
        self.info().fourcc
    }

    pub fn output_format(self) -> OutputFormat {
        self.info().output
    }

    /// Whether decoding needs a YUV → RGB conversion.
    pub fn is_yuv(self) -> bool {
        self.family() != FormatFamily::Packed
    }

    /// Bytes occupied by one frame in the backing buffer.
    ///
    /// Computed from `linesize`, not `width`: row padding counts toward the frame extent.
    ///
    /// # Example
    /// ```rust
    /// use rawview_core::prelude::{FrameGeometry, PixelFormat};
    ///
    /// let geometry = FrameGeometry::new(100, 50, 100).unwrap();
    /// assert_eq!(PixelFormat::Rgba8888.frame_byte_size(geometry).unwrap(), 20_000);
    /// assert_eq!(PixelFormat::I422.frame_byte_size(geometry).unwrap(), 10_000);
    /// ```
    pub fn frame_byte_size(self, geometry: FrameGeometry) -> Result<usize, FormatError> {
        let overflow = || FormatError::InvalidGeometry("frame size overflows".into());
        let area = geometry
            .linesize()
            .checked_mul(geometry.height())
            .ok_or_else(overflow)?;
        let size = match self.layout() {
            Layout::Planar420 { .. } | Layout::Interleaved420 { .. } => {
                area.checked_mul(3).ok_or_else(overflow)? / 2
            }
            Layout::Planar422 => area.checked_mul(2).ok_or_else(overflow)?,
            Layout::Packed { bytes_per_pixel } => {
                area.checked_mul(bytes_per_pixel).ok_or_else(overflow)?
            }
        };
        if size == 0 {
            return Err(FormatError::InvalidGeometry("frame size is zero".into()));
        }
        Ok(size)
    }

    /// Offsets, strides and lengths of each plane inside one frame.
    ///
    /// Chroma strides use the truncating `linesize / 2`, so odd line sizes produce
    /// overlapping chroma rows exactly as existing dumps expect.
    pub fn plane_layouts(
        self,
        geometry: FrameGeometry,
    ) -> Result<SmallVec<[PlaneLayout; 3]>, FormatError> {
        let overflow = || FormatError::InvalidGeometry("plane layout overflows".into());
        let linesize = geometry.linesize();
        let height = geometry.height();
        let luma_len = linesize.checked_mul(height).ok_or_else(overflow)?;
        let luma = PlaneLayout {
            offset: 0,
            len: luma_len,
            stride: linesize,
        };
        let layouts = match self.layout() {
            Layout::Planar420 { .. } | Layout::Planar422 => {
                let chroma_stride = linesize / 2;
                let chroma_rows = if self.layout() == Layout::Planar422 {
                    height
                } else {
                    height / 2
                };
                let chroma_len = chroma_stride
                    .checked_mul(chroma_rows)
                    .ok_or_else(overflow)?;
                let second = luma_len.checked_add(chroma_len).ok_or_else(overflow)?;
                smallvec![
                    luma,
                    PlaneLayout {
                        offset: luma_len,
                        len: chroma_len,
                        stride: chroma_stride,
                    },
                    PlaneLayout {
                        offset: second,
                        len: chroma_len,
                        stride: chroma_stride,
                    },
                ]
            }
            Layout::Interleaved420 { .. } => {
                let chroma_len = linesize.checked_mul(height / 2).ok_or_else(overflow)?;
                smallvec![
                    luma,
                    PlaneLayout {
                        offset: luma_len,
                        len: chroma_len,
                        stride: linesize,
                    },
                ]
            }
            Layout::Packed { bytes_per_pixel } => {
                let stride = linesize.checked_mul(bytes_per_pixel).ok_or_else(overflow)?;
                smallvec![PlaneLayout {
                    offset: 0,
                    len: stride.checked_mul(height).ok_or_else(overflow)?,
                    stride,
                }]
            }
        };
        Ok(layouts)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

impl FromStr for PixelFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PixelFormat::ALL
            .into_iter()
            .find(|fmt| {
                let info = fmt.info();
                info.name.eq_ignore_ascii_case(wanted)
                    || info.label.eq_ignore_ascii_case(wanted)
                    || info
                        .fourcc
                        .as_str()
                        .is_some_and(|fcc| fcc.eq_ignore_ascii_case(wanted))
                    || info.aliases.iter().any(|a| a.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| FormatError::UnsupportedFormat(wanted.to_string()))
    }
}

impl TryFrom<String> for PixelFormat {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PixelFormat> for String {
    fn from(value: PixelFormat) -> Self {
        value.info().name.to_string()
    }
}

/// Byte placement of one plane inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Offset from the start of the frame.
    pub offset: usize,
    /// Nominal plane length.
    pub len: usize,
    /// Bytes between the starts of consecutive rows.
    pub stride: usize,
}

/// Declared frame dimensions.
///
/// `linesize` is the stride of a luma row in bytes for YUV formats and of a row in pixels for
/// packed formats; it must be at least `width`.
///
/// # Example
/// ```rust
/// use rawview_core::prelude::FrameGeometry;
///
/// let geometry = FrameGeometry::new(1920, 1080, 2048).unwrap();
/// assert_eq!(geometry.linesize(), 2048);
/// assert!(FrameGeometry::new(0, 1080, 1920).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    width: NonZeroU32,
    height: NonZeroU32,
    linesize: NonZeroU32,
}

impl FrameGeometry {
    /// Validate and build a geometry.
    pub fn new(width: u32, height: u32, linesize: u32) -> Result<Self, FormatError> {
        let nonzero = |value: u32, what: &str| {
            NonZeroU32::new(value)
                .ok_or_else(|| FormatError::InvalidGeometry(format!("{what} must be positive")))
        };
        let width = nonzero(width, "width")?;
        let height = nonzero(height, "height")?;
        let linesize = nonzero(linesize, "linesize")?;
        if linesize < width {
            return Err(FormatError::InvalidGeometry(format!(
                "linesize {linesize} is smaller than width {width}"
            )));
        }
        Ok(Self {
            width,
            height,
            linesize,
        })
    }

    /// Geometry with `linesize == width`.
    pub fn tight(width: u32, height: u32) -> Result<Self, FormatError> {
        Self::new(width, height, width)
    }

    pub fn width(&self) -> usize {
        self.width.get() as usize
    }

    pub fn height(&self) -> usize {
        self.height.get() as usize
    }

    pub fn linesize(&self) -> usize {
        self.linesize.get() as usize
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} (linesize {})", self.width, self.height, self.linesize)
    }
}
