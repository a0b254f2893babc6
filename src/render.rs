//! Rendering of QR Code symbols to raster images and SVG documents.

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::QrError;
use crate::qrcode::QrCode;

/// Returns an RGB image depicting the given QR Code, with black modules on
/// a white background.
///
/// See [`to_image_with_colors`] for the scale and border semantics.
pub fn to_image(qr: &QrCode, scale: u32, border: u32) -> Result<RgbImage, QrError> {
    to_image_with_colors(qr, scale, border, Rgb([255, 255, 255]), Rgb([0, 0, 0]))
}

/// Returns an RGB image depicting the given QR Code, with the given module
/// scale, border width, and colors.
///
/// For example, `scale = 10` and `border = 4` pads the QR Code with 4 light
/// border modules on all four sides and represents each module as 10×10
/// pixels. `scale` must be positive, and the resulting image dimension must
/// fit in `i32` range.
pub fn to_image_with_colors(
    qr: &QrCode,
    scale: u32,
    border: u32,
    light_color: Rgb<u8>,
    dark_color: Rgb<u8>,
) -> Result<RgbImage, QrError> {
    if scale == 0 {
        return Err(QrError::InvalidArgument("scale must be positive"));
    }
    let dimension = (qr.size() as u32)
        .checked_add(border.checked_mul(2).ok_or(QrError::InvalidArgument(
            "scale or border too large",
        ))?)
        .and_then(|modules| modules.checked_mul(scale))
        .filter(|&d| d <= i32::MAX as u32)
        .ok_or(QrError::InvalidArgument("scale or border too large"))?;

    let border = border as i32;
    let scale = scale as i32;
    let image = ImageBuffer::from_fn(dimension, dimension, |x, y| {
        let dark = qr.get_module(x as i32 / scale - border, y as i32 / scale - border);
        if dark {
            dark_color
        } else {
            light_color
        }
    });
    Ok(image)
}

/// Returns a string of SVG code for an image depicting the given QR Code,
/// with the given number of border modules and CSS color strings.
///
/// The string always uses Unix newlines (`\n`), regardless of the platform.
pub fn to_svg_string(
    qr: &QrCode,
    border: i32,
    light_color: &str,
    dark_color: &str,
) -> Result<String, QrError> {
    if border < 0 {
        return Err(QrError::InvalidArgument("border must be non-negative"));
    }
    let border = i64::from(border);
    let dimension = i64::from(qr.size()) + border * 2;
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        dimension
    );
    result += &format!("\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n", light_color);
    result += "\t<path d=\"";
    for y in 0..qr.size() {
        for x in 0..qr.size() {
            if qr.get_module(x, y) {
                if x != 0 || y != 0 {
                    result += " ";
                }
                result += &format!("M{},{}h1v1h-1z", i64::from(x) + border, i64::from(y) + border);
            }
        }
    }
    result += &format!("\" fill=\"{}\"/>\n", dark_color);
    result += "</svg>\n";
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::QrCodeEcc;

    fn sample() -> QrCode {
        QrCode::encode_text("HELLO WORLD", QrCodeEcc::Low).unwrap()
    }

    #[test]
    fn image_dimensions_include_border_and_scale() {
        let qr = sample();
        let img = to_image(&qr, 4, 4).unwrap();
        let expected = (qr.size() as u32 + 8) * 4;
        assert_eq!(img.dimensions(), (expected, expected));
    }

    #[test]
    fn image_pixels_follow_modules() {
        let qr = sample();
        let img = to_image(&qr, 2, 1).unwrap();
        // The border is light; the top-left finder corner is dark.
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(2, 2), &Rgb([0, 0, 0]));
    }

    #[test]
    fn image_rejects_zero_scale_and_overflow() {
        let qr = sample();
        assert!(to_image(&qr, 0, 4).is_err());
        assert!(to_image(&qr, u32::MAX, 0).is_err());
        assert!(to_image(&qr, 1, u32::MAX).is_err());
    }

    #[test]
    fn svg_contains_background_and_path() {
        let qr = sample();
        let svg = to_svg_string(&qr, 4, "#FFFFFF", "#000000").unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(svg.contains(&format!("viewBox=\"0 0 {0} {0}\"", qr.size() + 8)));
        assert!(svg.contains("<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>"));
        assert!(svg.contains("h1v1h-1z"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn svg_rejects_negative_border() {
        let qr = sample();
        assert!(to_svg_string(&qr, -1, "#FFFFFF", "#000000").is_err());
    }
}
