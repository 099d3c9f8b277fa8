use base64::{engine::general_purpose, Engine as _};
use image::{imageops, ImageBuffer, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;
use thiserror::Error;

/// Errors that can occur while producing a verification image.
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Failed to encode QR code: {0}")]
    Encoding(String),
    #[error("Failed to write QR image: {0}")]
    Image(String),
}

/// Layout of the rendered QR image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QrOptions {
    /// Target edge length in pixels. The image is never smaller than one pixel per module.
    pub width: u32,
    /// Light border around the symbol, in modules.
    pub margin: u32,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: 200,
            margin: 2,
        }
    }
}

/// A scannable 2-D barcode rendered as a black-on-white PNG.
///
/// The image carries whatever text it was given and nothing more. Anyone can produce an
/// identical code from the same text, so it is a convenience for front-desk lookup, not
/// proof that a bill is genuine.
#[derive(Clone, Debug)]
pub struct VerificationCode {
    png: Vec<u8>,
    edge: u32,
}

impl VerificationCode {
    /// Encodes `payload` into a QR symbol and rasterises it to PNG.
    ///
    /// # Arguments
    ///
    /// * `payload` - Text to embed, typically a JSON document.
    /// * `options` - Target width and margin.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::Encoding` if the payload does not fit in a QR symbol and
    /// `VerificationError::Image` if PNG encoding fails.
    pub fn encode(payload: &str, options: &QrOptions) -> Result<Self, VerificationError> {
        let code = QrCode::new(payload.as_bytes())
            .map_err(|e| VerificationError::Encoding(e.to_string()))?;

        let modules = code.width() as u32;
        let span = modules + 2 * options.margin;
        let module_px = (options.width / span).max(1);

        let symbol: ImageBuffer<Luma<u8>, Vec<u8>> = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(module_px, module_px)
            .build();

        let edge = span * module_px;
        let mut canvas = ImageBuffer::from_pixel(edge, edge, Luma([255u8]));
        let offset = i64::from(options.margin * module_px);
        imageops::overlay(&mut canvas, &symbol, offset, offset);

        let mut png = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| VerificationError::Image(e.to_string()))?;

        Ok(Self { png, edge })
    }

    /// Raw PNG bytes.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Edge length of the square image in pixels.
    pub fn edge(&self) -> u32 {
        self.edge
    }

    /// The image as a `data:image/png;base64,...` URI for embedding in documents.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&self.png)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"billNumber":"BT123456","patientName":"Asha Rao","totalAmount":"70.20","generatedAt":"2026-10-16T09:30:00Z","tests":["Complete Blood Count (CBC)","HbA1C (Glycated Hemoglobin)"]}"#;

    #[test]
    fn test_encode_produces_png() {
        let code = VerificationCode::encode(PAYLOAD, &QrOptions::default()).unwrap();

        assert!(code.png_bytes().starts_with(&[0x89, b'P', b'N', b'G']));
        let decoded = image::load_from_memory(code.png_bytes()).unwrap();
        assert_eq!(decoded.width(), code.edge());
        assert_eq!(decoded.height(), code.edge());
    }

    #[test]
    fn test_margin_is_light() {
        let code = VerificationCode::encode(PAYLOAD, &QrOptions::default()).unwrap();
        let decoded = image::load_from_memory(code.png_bytes()).unwrap().to_luma8();

        assert_eq!(decoded.get_pixel(0, 0).0, [255]);
        let last = code.edge() - 1;
        assert_eq!(decoded.get_pixel(last, last).0, [255]);
    }

    #[test]
    fn test_edge_stays_close_to_requested_width() {
        let code = VerificationCode::encode(PAYLOAD, &QrOptions::default()).unwrap();

        assert!(code.edge() <= 200);
        assert!(code.edge() > 100);
    }

    #[test]
    fn test_data_uri_prefix() {
        let code = VerificationCode::encode("BT000001", &QrOptions::default()).unwrap();
        let uri = code.to_data_uri();

        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let payload = "x".repeat(8_000);
        let err = VerificationCode::encode(&payload, &QrOptions::default()).unwrap_err();

        assert!(matches!(err, VerificationError::Encoding(_)));
    }
}
