//! Raw format decoders (pixel format conversions).

mod packed;
mod yuv;

pub use packed::PackedRgbDecoder;
pub use yuv::YuvToRgbDecoder;

#[derive(Clone, Copy)]
struct YuvCoeffs {
    y: i32,
    r_v: i32,
    g_u: i32,
    g_v: i32,
    b_u: i32,
}

// Limited-range Rec.601 in 8.8 fixed point.
const BT601: YuvCoeffs = YuvCoeffs {
    y: 298,
    r_v: 409,
    g_u: 100,
    g_v: 208,
    b_u: 516,
};

#[inline(always)]
fn clamp8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Integer BT.601 conversion of one 8-bit Y/U/V triple.
///
/// `Y` is not clamped to the nominal 16..=235 range before scaling; the result is clamped
/// per channel.
///
/// # Example
/// ```rust
/// use rawview_codec::prelude::yuv_to_rgb;
///
/// assert_eq!(yuv_to_rgb(16, 128, 128), (0, 0, 0));
/// assert_eq!(yuv_to_rgb(235, 128, 128), (255, 255, 255));
/// ```
#[inline(always)]
pub fn yuv_to_rgb(y: i32, u: i32, v: i32) -> (u8, u8, u8) {
    let coeffs = BT601;
    let c = y - 16;
    let d = u - 128;
    let e = v - 128;
    let r = (coeffs.y * c + coeffs.r_v * e + 128) >> 8;
    let g = (coeffs.y * c - coeffs.g_u * d - coeffs.g_v * e + 128) >> 8;
    let b = (coeffs.y * c + coeffs.b_u * d + 128) >> 8;
    (clamp8(r), clamp8(g), clamp8(b))
}

/// Inverse of [`yuv_to_rgb`] used to synthesise test frames.
#[cfg(test)]
pub(crate) fn rgb_to_yuv(r: i32, g: i32, b: i32) -> (u8, u8, u8) {
    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    (y as u8, u as u8, v as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Straight transcription of the conversion, used as the reference for every input.
    fn reference(y: i32, u: i32, v: i32) -> (u8, u8, u8) {
        let clamp = |x: i32| if x < 0 { 0 } else if x > 255 { 255 } else { x as u8 };
        let c = y - 16;
        let d = u - 128;
        let e = v - 128;
        (
            clamp((298 * c + 409 * e + 128) >> 8),
            clamp((298 * c - 100 * d - 208 * e + 128) >> 8),
            clamp((298 * c + 516 * d + 128) >> 8),
        )
    }

    #[test]
    fn black_and_white_points() {
        assert_eq!(yuv_to_rgb(16, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(235, 128, 128), (255, 255, 255));
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(255, 128, 128), (255, 255, 255));
    }

    #[test]
    fn bit_exact_over_sampled_inputs() {
        for y in (0..=255).step_by(5) {
            for u in (0..=255).step_by(7) {
                for v in (0..=255).step_by(11) {
                    assert_eq!(yuv_to_rgb(y, u, v), reference(y, u, v), "{y} {u} {v}");
                }
            }
        }
    }

    #[test]
    fn negative_intermediates_shift_arithmetically() {
        // 298 * (20 - 16) + 516 * (0 - 128) + 128 = -64728; >> 8 floors to -253.
        assert_eq!(yuv_to_rgb(20, 0, 128).2, 0);
        assert_eq!(yuv_to_rgb(128, 50, 200), (245, 102, 0));
    }

    #[test]
    fn round_trip_within_quantisation() {
        let colors = [
            (0, 0, 0),
            (255, 255, 255),
            (128, 128, 128),
            (200, 100, 50),
            (16, 200, 120),
            (90, 40, 220),
            (255, 0, 0),
            (0, 255, 0),
            (0, 0, 255),
            (240, 200, 30),
        ];
        for (r, g, b) in colors {
            let (y, u, v) = rgb_to_yuv(r, g, b);
            let (r2, g2, b2) = yuv_to_rgb(y as i32, u as i32, v as i32);
            assert!((r - r2 as i32).abs() <= 2, "{r} {g} {b}");
            assert!((g - g2 as i32).abs() <= 2, "{r} {g} {b}");
            assert!((b - b2 as i32).abs() <= 2, "{r} {g} {b}");
        }
    }
}
