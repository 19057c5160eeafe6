//! Renders a ticket code as the QR image shown on the ticket view.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Luma};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

/// Rendered edge length. Large enough to survive download, re-share and a
/// phone screen at the gate.
pub const IMAGE_SIZE: u32 = 500;

#[derive(Debug, Error)]
pub enum QrRenderError {
    #[error("payload cannot be encoded as a QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("failed to write QR PNG: {0}")]
    Png(#[from] image::ImageError),
}

/// Payload string to PNG bytes, error-correction level H, with quiet zone.
pub fn render_png(code: &str) -> Result<Vec<u8>, QrRenderError> {
    let qr = QrCode::with_error_correction_level(code.as_bytes(), EcLevel::H)?;
    let rendered = qr
        .render::<Luma<u8>>()
        .min_dimensions(IMAGE_SIZE, IMAGE_SIZE)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(rendered).write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;

    Ok(png)
}
