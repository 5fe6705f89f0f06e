//! Integer color arithmetic shared by every pass.

use crate::Color;

/// Source-over composite of `top` onto `bottom`, both straight alpha.
///
/// Integer math with truncating division, in this exact order:
///
/// ```text
/// outC = (Ct*At)/255 + (Cb*Ab*(255-At))/(255*255)
/// outA = At + (Ab*(255-At))/255
/// ```
///
/// A fully transparent `top` returns `bottom` unchanged.
#[inline]
pub fn blend(top: Color, bottom: Color) -> Color {
    let at = top[3] as u32;
    if at == 0 {
        return bottom;
    }
    let ab = bottom[3] as u32;
    let inv = 255 - at;

    let channel = |ct: u8, cb: u8| -> u8 {
        let c = (ct as u32 * at) / 255 + (cb as u32 * ab * inv) / (255 * 255);
        c.min(255) as u8
    };

    image::Rgba([
        channel(top[0], bottom[0]),
        channel(top[1], bottom[1]),
        channel(top[2], bottom[2]),
        (at + (ab * inv) / 255) as u8,
    ])
}

/// Copy of `color` with alpha attenuated by `factor` (255 = unchanged).
#[inline]
pub fn scale_alpha(color: Color, factor: u8) -> Color {
    let [r, g, b, a] = color.0;
    image::Rgba([r, g, b, (a as u32 * factor as u32 / 255) as u8])
}

/// Channel average `(R+G+B)/3`, ignoring alpha.
#[inline]
pub fn grayscale(color: Color) -> u8 {
    ((color[0] as u32 + color[1] as u32 + color[2] as u32) / 3) as u8
}

/// Mask pixel for blend strength `strength`: `(v, v, v, v)`.
///
/// Zero is transparent black (no influence), 255 is opaque white (full
/// influence). Grayscale and alpha always agree.
#[inline]
pub fn mask_value(strength: u8) -> Color {
    image::Rgba([strength; 4])
}
