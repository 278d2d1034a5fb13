use image::{DynamicImage, RgbImage, RgbaImage};
use rawview_core::prelude::*;

use crate::CodecError;

fn dimensions(frame: &DecodedFrame) -> Result<(u32, u32), CodecError> {
    let width = u32::try_from(frame.width())
        .map_err(|_| CodecError::Codec("frame width exceeds u32".into()))?;
    let height = u32::try_from(frame.height())
        .map_err(|_| CodecError::Codec("frame height exceeds u32".into()))?;
    Ok((width, height))
}

/// Convert an owned decoded frame into a `DynamicImage` without copying.
///
/// # Example
/// ```rust
/// use rawview_codec::prelude::*;
///
/// let frame = decode(&[9, 8, 7], PixelFormat::Rgb888, FrameGeometry::tight(1, 1)?)?;
/// let img = decoded_to_dynamic_image(frame)?;
/// assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [9, 8, 7]);
/// # Ok::<(), CodecError>(())
/// ```
pub fn decoded_to_dynamic_image(frame: DecodedFrame) -> Result<DynamicImage, CodecError> {
    let (width, height) = dimensions(&frame)?;
    let output = frame.output_format();
    let data = frame.into_data();
    let img = match output {
        OutputFormat::Rgb24 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        OutputFormat::Rgba32 => {
            RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
        }
    };
    img.ok_or_else(|| CodecError::Codec("unable to convert to DynamicImage".into()))
}

/// Copying variant of [`decoded_to_dynamic_image`] for frames the caller keeps.
pub fn decoded_ref_to_dynamic_image(frame: &DecodedFrame) -> Result<DynamicImage, CodecError> {
    decoded_to_dynamic_image(frame.clone())
}
