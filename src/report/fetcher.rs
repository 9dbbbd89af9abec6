use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};
use tracing::{debug, warn};

use crate::error::ImageUnavailable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// JPEG bytes embedded as-is with a DCT filter.
    Jpeg,
    /// Zlib-compressed 8-bit RGB samples.
    FlateRgb,
}

/// A bitmap ready to become a PDF image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageUnavailable> {
        let format = image::guess_format(bytes).map_err(|e| ImageUnavailable::Decode(e.to_string()))?;

        // Colour JPEGs go straight into the PDF; greyscale ones are re-encoded as RGB.
        if format == image::ImageFormat::Jpeg {
            let decoder = JpegDecoder::new(Cursor::new(bytes)).map_err(|e| ImageUnavailable::Decode(e.to_string()))?;
            if decoder.color_type() == ColorType::Rgb8 {
                let (width, height) = decoder.dimensions();
                return Ok(Self {
                    encoding: ImageEncoding::Jpeg,
                    width,
                    height,
                    data: bytes.to_vec(),
                });
            }
        }

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| ImageUnavailable::Decode(e.to_string()))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        let data = miniz_oxide::deflate::compress_to_vec_zlib(rgb.as_raw(), 6);
        Ok(Self {
            encoding: ImageEncoding::FlateRgb,
            width,
            height,
            data,
        })
    }
}

/// Turns an image URL into an embeddable bitmap.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<EmbeddedImage, ImageUnavailable>;
}

/// Fetches over HTTP(S) with a per-image deadline; `data:` URLs are decoded in place.
pub struct HttpImageFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpImageFetcher {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageUnavailable> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ImageUnavailable::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageUnavailable::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| ImageUnavailable::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ImageSource for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<EmbeddedImage, ImageUnavailable> {
        let bytes = if url.starts_with("data:") {
            decode_data_url(url)?
        } else {
            match tokio::time::timeout(self.timeout, self.download(url)).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(%url, timeout = ?self.timeout, "image fetch timed out");
                    return Err(ImageUnavailable::Timeout);
                }
            }
        };
        debug!(%url, bytes = bytes.len(), "image fetched");
        EmbeddedImage::from_bytes(&bytes)
    }
}

/// Payload of a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ImageUnavailable> {
    let (header, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| ImageUnavailable::Decode("malformed data URL".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(ImageUnavailable::Decode("data URL is not base64".to_string()));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageUnavailable::Decode(e.to_string()))
}
