//! QR code rendering.
//!
//! Turns a scan URL into a PNG. Rendering is a pure function of the input
//! string and [`QrOptions`]: the same inputs always produce the same bytes.
//!
//! Sizing follows the usual QR tooling convention: `width` is the final image
//! size in pixels and `margin` the quiet zone in modules, so each module spans
//! `width / (modules + 2 * margin)` pixels. When `width` is too small to give
//! every module at least one pixel, a fixed scale of 4 pixels per module is
//! used instead.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use base64::Engine as _;
use image::{ImageFormat, Rgb, RgbImage};
use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

/// Pixels per module when `width` is below the module count.
const FALLBACK_SCALE: u32 = 4;

/// Errors produced while rendering a QR image.
#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR input cannot be empty")]
    EmptyInput,
    #[error("invalid color {0:?}: expected #RGB or #RRGGBB")]
    InvalidColor(String),
    #[error("data cannot be encoded as a QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("failed to encode PNG: {0}")]
    Png(#[from] image::ImageError),
}

/// An opaque RGB color parsed from `#RGB` or `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrColor(pub [u8; 3]);

impl QrColor {
    pub const BLACK: Self = Self([0x00, 0x00, 0x00]);
    pub const WHITE: Self = Self([0xFF, 0xFF, 0xFF]);

    /// Parse a CSS-style hex color.
    ///
    /// # Errors
    ///
    /// Returns `QrError::InvalidColor` for anything other than `#RGB` or
    /// `#RRGGBB` hex notation.
    pub fn parse(s: &str) -> Result<Self, QrError> {
        let invalid = || QrError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (slot, c) in rgb.iter_mut().zip(hex.chars()) {
                    *slot = channel(&format!("{c}{c}"))?;
                }
                Ok(Self(rgb))
            }
            6 => Ok(Self([
                channel(hex.get(0..2).ok_or_else(invalid)?)?,
                channel(hex.get(2..4).ok_or_else(invalid)?)?,
                channel(hex.get(4..6).ok_or_else(invalid)?)?,
            ])),
            _ => Err(invalid()),
        }
    }
}

impl FromStr for QrColor {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for QrColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

/// Rendering options for QR images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrOptions {
    /// Final image width (and height) in pixels.
    pub width: u32,
    /// Quiet zone around the symbol, in modules.
    pub margin: u32,
    /// Foreground (module) color.
    pub dark: QrColor,
    /// Background color.
    pub light: QrColor,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: 300,
            margin: 2,
            dark: QrColor::BLACK,
            light: QrColor::WHITE,
        }
    }
}

/// A rendered QR image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    /// PNG-encoded image bytes.
    pub png: Vec<u8>,
    /// Image width and height in pixels.
    pub size: u32,
    /// Symbol width in modules, excluding the quiet zone.
    pub modules: u32,
}

impl QrImage {
    /// The image as a `data:` URL suitable for an `<img src>` or download link.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Render `data` as a PNG QR code.
///
/// # Errors
///
/// Returns `QrError::EmptyInput` for an empty string, `QrError::Encode` if the
/// data exceeds QR capacity, and `QrError::Png` if PNG encoding fails.
pub fn encode(data: &str, options: &QrOptions) -> Result<QrImage, QrError> {
    let (image, modules) = rasterize(data, options)?;
    let size = image.width();

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;

    Ok(QrImage {
        png: png.into_inner(),
        size,
        modules,
    })
}

/// Render `data` into an RGB raster, returning it with the module count.
fn rasterize(data: &str, options: &QrOptions) -> Result<(RgbImage, u32), QrError> {
    if data.is_empty() {
        return Err(QrError::EmptyInput);
    }

    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)?;
    let colors = code.to_colors();
    let modules_usize = code.width();
    // Version 40 tops out at 177 modules
    #[allow(clippy::cast_possible_truncation)]
    let modules = modules_usize as u32;

    let total = modules + options.margin.saturating_mul(2);
    let (size, scale) = if options.width >= total {
        (options.width, f64::from(options.width) / f64::from(total))
    } else {
        (
            total.saturating_mul(FALLBACK_SCALE),
            f64::from(FALLBACK_SCALE),
        )
    };
    let scaled_margin = f64::from(options.margin) * scale;

    let module_index = |pixel: u32| -> Option<usize> {
        let offset = f64::from(pixel) - scaled_margin;
        if offset < 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (offset / scale).floor() as usize;
        (index < modules_usize).then_some(index)
    };

    let dark = Rgb(options.dark.0);
    let light = Rgb(options.light.0);
    let image = RgbImage::from_fn(size, size, |x, y| {
        let is_dark = match (module_index(x), module_index(y)) {
            (Some(mx), Some(my)) => colors.get(my * modules_usize + mx) == Some(&Color::Dark),
            _ => false,
        };
        if is_dark { dark } else { light }
    });

    Ok((image, modules))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const URL: &str = "https://tags.example.com/scan?code=1a2b3c4d";

    #[test]
    fn test_color_parse() {
        assert_eq!(QrColor::parse("#000000").unwrap(), QrColor::BLACK);
        assert_eq!(QrColor::parse("#fff").unwrap(), QrColor::WHITE);
        assert_eq!(QrColor::parse("#1A2b3C").unwrap(), QrColor([0x1A, 0x2B, 0x3C]));
        assert!(QrColor::parse("000000").is_err());
        assert!(QrColor::parse("#12345").is_err());
        assert!(QrColor::parse("#gggggg").is_err());
    }

    #[test]
    fn test_color_display_roundtrip() {
        let color = QrColor([0x0A, 0xBC, 0xDE]);
        assert_eq!(color.to_string(), "#0ABCDE");
        assert_eq!(color.to_string().parse::<QrColor>().unwrap(), color);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            encode("", &QrOptions::default()),
            Err(QrError::EmptyInput)
        ));
    }

    #[test]
    fn test_encode_is_png_of_requested_width() {
        let image = encode(URL, &QrOptions::default()).unwrap();
        assert_eq!(image.size, 300);
        assert!(image.png.starts_with(&[0x89, b'P', b'N', b'G']));
        assert!(image.data_url().starts_with("data:image/png;base64,iVBOR"));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let options = QrOptions::default();
        assert_eq!(encode(URL, &options).unwrap(), encode(URL, &options).unwrap());
    }

    #[test]
    fn test_small_width_falls_back_to_fixed_scale() {
        let options = QrOptions {
            width: 10,
            ..QrOptions::default()
        };
        let (image, modules) = rasterize(URL, &options).unwrap();
        assert_eq!(image.width(), (modules + 4) * FALLBACK_SCALE);
    }

    #[test]
    fn test_margin_is_light_and_finder_is_dark() {
        let options = QrOptions {
            width: 300,
            margin: 4,
            dark: QrColor([0x11, 0x22, 0x33]),
            light: QrColor([0xEE, 0xEE, 0xEE]),
        };
        let (image, modules) = rasterize(URL, &options).unwrap();
        let scale = 300.0 / f64::from(modules + 8);

        assert_eq!(image.get_pixel(0, 0), &Rgb([0xEE, 0xEE, 0xEE]));

        // Centre of the top-left finder pattern's corner module
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let inside = ((4.0 + 0.5) * scale) as u32;
        assert_eq!(image.get_pixel(inside, inside), &Rgb([0x11, 0x22, 0x33]));
    }

    #[test]
    fn test_zero_margin() {
        let options = QrOptions {
            margin: 0,
            ..QrOptions::default()
        };
        let (image, _) = rasterize(URL, &options).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }
}
