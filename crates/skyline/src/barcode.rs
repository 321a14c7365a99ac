//! Image to barcode decode pipeline.
//!
//! A base64 image is decoded into a [`RawImage`] (RGBA, 4 bytes per pixel,
//! row-major, alpha always present) and handed to a [`BarcodeEngine`]. The
//! production engine wraps rxing and is created once per process through
//! [`engine`].

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::OnceLock;

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use image::ImageReader;
use rxing::{BarcodeFormat, DecodeHintType, DecodeHintValue, DecodingHintDictionary, Exceptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Label used for symbols whose format has no name.
pub const UNKNOWN_FORMAT: &str = "UNKNOWN";

/// Bytes per pixel in a [`RawImage`].
pub const BYTES_PER_PIXEL: usize = 4;

/// Accepts padded and unpadded standard base64.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static ENGINE: OnceLock<RxingEngine> = OnceLock::new();

/// A single recognized symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeResult {
    /// Symbology label such as `QR_CODE` or `PDF_417`.
    #[serde(rename = "type")]
    pub format: String,
    /// Decoded text, empty when the symbol carried none.
    pub data: String,
}

impl BarcodeResult {
    /// Create a result from a format label and text.
    #[must_use]
    pub fn new(format: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            data: data.into(),
        }
    }
}

/// Uncompressed RGBA pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RawImage {
    /// Wrap an RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` if a dimension is zero or the buffer length does
    /// not match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::bad_request("invalid image"));
        }
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(Error::bad_request(format!(
                "pixel buffer has {} bytes, expected {expected}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode a base64 encoded image file (PNG, JPEG, ...).
    ///
    /// A leading `data:<mime>;base64,` prefix and embedded whitespace are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when the input is empty, is not base64, or the
    /// image dimensions cannot be read, and `Internal` when the pixel data
    /// fails to decode.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let payload = strip_data_url(encoded.trim());
        if payload.is_empty() {
            return Err(Error::bad_request("imageBase64 required"));
        }

        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = LENIENT_BASE64
            .decode(compact.as_bytes())
            .map_err(|e| Error::bad_request(format!("invalid image: {e}")))?;

        Self::from_bytes(&bytes)
    }

    /// Decode an encoded image file held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`RawImage::from_base64`], minus the base64 step.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| Error::bad_request(format!("invalid image: {e}")))?
            .into_dimensions()
            .map_err(|e| Error::bad_request(format!("invalid image: {e}")))?;
        if width == 0 || height == 0 {
            return Err(Error::bad_request("invalid image"));
        }

        let decoded = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| Error::internal(e.to_string()))?
            .decode()
            .map_err(|e| Error::internal(e.to_string()))?;

        let rgba = decoded.to_rgba8();
        debug!(width, height, "decoded image to RGBA");
        Self::from_rgba(rgba.width(), rgba.height(), rgba.into_raw())
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The RGBA bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Convert to 8-bit luminance using ZXing's `(r + 2g + b) / 4`.
    #[must_use]
    pub fn to_luma(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|px| {
                let sum = u16::from(px[0]) + 2 * u16::from(px[1]) + u16::from(px[2]);
                u8::try_from(sum / 4).unwrap_or(u8::MAX)
            })
            .collect()
    }
}

fn strip_data_url(input: &str) -> &str {
    if input.starts_with("data:") {
        if let Some(idx) = input.find(";base64,") {
            return &input[idx + ";base64,".len()..];
        }
    }
    input
}

/// Options for a recognition pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Spend more time looking for symbols.
    pub try_harder: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { try_harder: true }
    }
}

/// A barcode recognition backend.
pub trait BarcodeEngine: Send + Sync {
    /// Find every symbol in the image. An image without symbols yields an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if recognition fails for any other reason.
    fn scan(&self, image: &RawImage, options: ScanOptions) -> Result<Vec<BarcodeResult>>;
}

/// Recognition backed by rxing, a port of ZXing.
#[derive(Debug, Default)]
pub struct RxingEngine {
    _private: (),
}

impl BarcodeEngine for RxingEngine {
    fn scan(&self, image: &RawImage, options: ScanOptions) -> Result<Vec<BarcodeResult>> {
        let mut hints: DecodingHintDictionary = HashMap::new();
        hints.insert(
            DecodeHintType::TRY_HARDER,
            DecodeHintValue::TryHarder(options.try_harder),
        );

        let found = rxing::helpers::detect_multiple_in_luma_with_hints(
            image.to_luma(),
            image.width(),
            image.height(),
            &mut hints,
        );

        match found {
            Ok(results) => Ok(results
                .iter()
                .map(|r| BarcodeResult::new(format_label(r.getBarcodeFormat()), r.getText()))
                .collect()),
            Err(Exceptions::NotFoundException(_)) => Ok(Vec::new()),
            Err(e) => Err(Error::internal(e.to_string())),
        }
    }
}

/// The process-wide recognition engine, created on first use.
pub fn engine() -> &'static RxingEngine {
    ENGINE.get_or_init(|| {
        debug!("initializing barcode engine");
        RxingEngine::default()
    })
}

/// ZXing-style label for a barcode format.
#[must_use]
pub fn format_label(format: &BarcodeFormat) -> &'static str {
    match format {
        BarcodeFormat::AZTEC => "AZTEC",
        BarcodeFormat::CODABAR => "CODABAR",
        BarcodeFormat::CODE_39 => "CODE_39",
        BarcodeFormat::CODE_93 => "CODE_93",
        BarcodeFormat::CODE_128 => "CODE_128",
        BarcodeFormat::DATA_MATRIX => "DATA_MATRIX",
        BarcodeFormat::EAN_8 => "EAN_8",
        BarcodeFormat::EAN_13 => "EAN_13",
        BarcodeFormat::ITF => "ITF",
        BarcodeFormat::MAXICODE => "MAXICODE",
        BarcodeFormat::PDF_417 => "PDF_417",
        BarcodeFormat::QR_CODE => "QR_CODE",
        BarcodeFormat::MICRO_QR_CODE => "MICRO_QR_CODE",
        BarcodeFormat::RECTANGULAR_MICRO_QR_CODE => "RMQR_CODE",
        BarcodeFormat::RSS_14 => "RSS_14",
        BarcodeFormat::RSS_EXPANDED => "RSS_EXPANDED",
        BarcodeFormat::TELEPEN => "TELEPEN",
        BarcodeFormat::DXFilmEdge => "DX_FILM_EDGE",
        BarcodeFormat::UPC_A => "UPC_A",
        BarcodeFormat::UPC_E => "UPC_E",
        BarcodeFormat::UPC_EAN_EXTENSION => "UPC_EAN_EXTENSION",
        #[allow(unreachable_patterns)]
        _ => UNKNOWN_FORMAT,
    }
}

/// Decode a base64 image with the given engine.
///
/// # Errors
///
/// See [`RawImage::from_base64`] and [`BarcodeEngine::scan`].
pub fn decode_with(engine: &dyn BarcodeEngine, encoded: &str) -> Result<Vec<BarcodeResult>> {
    let image = RawImage::from_base64(encoded)?;
    let barcodes = engine.scan(&image, ScanOptions::default())?;
    debug!(count = barcodes.len(), "barcode scan finished");
    Ok(barcodes)
}

/// Decode a base64 image with the process-wide engine.
///
/// # Errors
///
/// See [`decode_with`].
pub fn decode_base64(encoded: &str) -> Result<Vec<BarcodeResult>> {
    decode_with(engine(), encoded)
}
