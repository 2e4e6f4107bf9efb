//! QR code synthesis. The handler only sees the [`QrEncoder`] trait so the
//! encoding backend can be swapped out, e.g. for fault injection in tests.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{types::QrError, EcLevel, QrCode};
use std::io::Cursor;

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("QR encoding failed: {0}")]
    Qr(#[from] QrError),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),

    #[error("encoder task failed: {0}")]
    Task(String),
}

/// Turns an arbitrary string into a QR image serialized as a data URL.
pub trait QrEncoder: Send + Sync {
    fn encode_data_url(&self, data: &str) -> Result<String, EncodeError>;
}

/// Grayscale PNG renderer. Defaults are level M, 4px modules and a
/// 4-module quiet zone.
#[derive(Debug, Clone)]
pub struct PngDataUrlEncoder {
    ec_level: EcLevel,
    module_size: u32,
}

impl PngDataUrlEncoder {
    pub fn new(ec_level: EcLevel, module_size: u32) -> Self {
        Self {
            ec_level,
            module_size,
        }
    }

    pub fn encode_png(&self, data: &str) -> Result<Vec<u8>, EncodeError> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), self.ec_level)?;
        let bitmap = code
            .render::<Luma<u8>>()
            .module_dimensions(self.module_size, self.module_size)
            .quiet_zone(true)
            .build();

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(bitmap).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }
}

impl Default for PngDataUrlEncoder {
    fn default() -> Self {
        Self::new(EcLevel::M, 4)
    }
}

impl QrEncoder for PngDataUrlEncoder {
    fn encode_data_url(&self, data: &str) -> Result<String, EncodeError> {
        let png = self.encode_png(data)?;
        Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png)))
    }
}
