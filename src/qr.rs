//! QR code generation.
//!
//! Encodes a string (normally a download URL) as a black-on-white PNG,
//! optionally wrapped in a base64 `data:` URI for inline embedding.

use std::io::Cursor;

use base64::Engine as _;
use image::{imageops, DynamicImage, ImageBuffer, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::Result;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Encoding parameters for generated QR codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrOptions {
    /// Error correction level.
    pub ec_level: EcLevel,
    /// Width and height of one module in pixels.
    pub module_size: u32,
    /// Width of the white border, in modules.
    pub border: u32,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::M,
            module_size: 10,
            border: 5,
        }
    }
}

/// QR code image generator.
#[derive(Debug, Clone, Default)]
pub struct QrGenerator {
    options: QrOptions,
}

impl QrGenerator {
    /// Create a generator with the given options.
    pub fn new(options: QrOptions) -> Self {
        Self { options }
    }

    /// Get the encoding options.
    pub fn options(&self) -> &QrOptions {
        &self.options
    }

    /// Render `data` into a greyscale image.
    ///
    /// The smallest QR version that fits the data is used.
    pub fn render(&self, data: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), self.options.ec_level)?;

        let size = self.options.module_size.max(1);
        let modules = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(size, size)
            .dark_color(DARK)
            .light_color(LIGHT)
            .build();

        let margin = self.options.border * size;
        let mut canvas = ImageBuffer::from_pixel(
            modules.width() + 2 * margin,
            modules.height() + 2 * margin,
            LIGHT,
        );
        imageops::overlay(&mut canvas, &modules, i64::from(margin), i64::from(margin));

        Ok(canvas)
    }

    /// Encode `data` as PNG bytes.
    pub fn encode_png(&self, data: &str) -> Result<Vec<u8>> {
        let image = self.render(data)?;

        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Encode `data` as a `data:image/png;base64,...` URI.
    pub fn encode_data_uri(&self, data: &str) -> Result<String> {
        let png = self.encode_png(data)?;
        Ok(png_data_uri(&png))
    }
}

/// Wrap PNG bytes in a base64 data URI.
pub fn png_data_uri(png: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(png);
    format!("data:image/png;base64,{b64}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QrShareError;
    use base64::Engine as _;

    fn decode(png: &[u8]) -> String {
        let image = image::load_from_memory(png).unwrap().to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| image.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1);
        let (_meta, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn test_default_options() {
        let options = QrOptions::default();
        assert_eq!(options.ec_level, EcLevel::M);
        assert_eq!(options.module_size, 10);
        assert_eq!(options.border, 5);
    }

    #[test]
    fn test_encode_png_roundtrip() {
        let generator = QrGenerator::default();
        let url = "http://localhost:5000/download/3f2b8c1e-6d4a-4f0e-9a51-2c7d8e9f0a1b.pdf";

        let png = generator.encode_png(url).unwrap();

        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        assert_eq!(decode(&png), url);
    }

    #[test]
    fn test_render_dimensions() {
        let generator = QrGenerator::default();

        // "hello" fits in version 1 (21x21 modules)
        let image = generator.render("hello").unwrap();

        let expected = (21 + 2 * 5) * 10;
        assert_eq!(image.width(), expected);
        assert_eq!(image.height(), expected);
    }

    #[test]
    fn test_render_border_is_white() {
        let generator = QrGenerator::default();
        let image = generator.render("hello").unwrap();

        for i in 0..image.width() {
            assert_eq!(*image.get_pixel(i, 0), LIGHT);
            assert_eq!(*image.get_pixel(0, i), LIGHT);
            assert_eq!(*image.get_pixel(i, image.height() - 1), LIGHT);
        }
        // Top-left finder pattern starts right after the border
        assert_eq!(*image.get_pixel(50, 50), DARK);
        assert_eq!(*image.get_pixel(49, 49), LIGHT);
    }

    #[test]
    fn test_only_black_and_white() {
        let image = QrGenerator::default().render("monochrome").unwrap();
        assert!(image.pixels().all(|p| *p == DARK || *p == LIGHT));
    }

    #[test]
    fn test_deterministic() {
        let generator = QrGenerator::default();
        let a = generator.encode_png("https://example.com/download/a.txt").unwrap();
        let b = generator.encode_png("https://example.com/download/a.txt").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_options() {
        let generator = QrGenerator::new(QrOptions {
            ec_level: EcLevel::H,
            module_size: 4,
            border: 4,
        });

        let image = generator.render("hello").unwrap();
        assert_eq!(image.width(), (21 + 8) * 4);

        let png = generator.encode_png("hello").unwrap();
        assert_eq!(decode(&png), "hello");
    }

    #[test]
    fn test_data_too_long() {
        let data = "x".repeat(8000);
        let result = QrGenerator::default().encode_png(&data);
        assert!(matches!(result, Err(QrShareError::QrCode(_))));
    }

    #[test]
    fn test_encode_data_uri() {
        let uri = QrGenerator::default()
            .encode_data_uri("https://example.com")
            .unwrap();

        let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
        let png = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap();
        assert_eq!(decode(&png), "https://example.com");
    }
}
