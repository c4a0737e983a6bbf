use image::{ImageFormat, GenericImageView};
use std::fs;
use crate::error::{Error, Result};

/// A decoded image ready to be embedded as an XObject
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub color_space: String, // "DeviceRGB", "DeviceGray"
    pub bits_per_component: u8,
    pub data: Vec<u8>,
    pub filter: ImageFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// JPEG bytes embedded as-is
    Dct,
    /// Raw samples, deflated when written
    Flate,
}

impl ImageFilter {
    pub fn pdf_name(self) -> &'static str {
        match self {
            ImageFilter::Dct => "DCTDecode",
            ImageFilter::Flate => "FlateDecode",
        }
    }
}

impl Image {
    /// Load an image from a file path.
    /// JPEG is passed through, PNG is decoded to raw RGB.
    pub fn from_file(path: &str) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|e| Error::Image(format!("cannot read {}: {}", path, e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)
            .map_err(|e| Error::Image(format!("unknown image format: {}", e)))?;

        match format {
            ImageFormat::Jpeg => Self::load_jpeg(bytes),
            ImageFormat::Png => Self::load_png(bytes),
            other => Err(Error::Image(format!("unsupported image format {:?}, only JPEG and PNG", other))),
        }
    }

    fn load_jpeg(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .map_err(|e| Error::Image(format!("failed to parse JPEG: {}", e)))?;

        let (width, height) = img.dimensions();

        let color_space = match img.color() {
            image::ColorType::L8 => "DeviceGray",
            _ => "DeviceRGB",
        };

        Ok(Image {
            width,
            height,
            color_space: color_space.to_string(),
            bits_per_component: 8,
            data: data.to_vec(),
            filter: ImageFilter::Dct,
        })
    }

    fn load_png(data: &[u8]) -> Result<Self> {
        // PNG predictors don't map onto FlateDecode directly, so decode to RGB8
        // and let the writer deflate the samples
        let img = image::load_from_memory_with_format(data, ImageFormat::Png)
            .map_err(|e| Error::Image(format!("failed to parse PNG: {}", e)))?;

        let (width, height) = img.dimensions();

        Ok(Image {
            width,
            height,
            color_space: "DeviceRGB".to_string(),
            bits_per_component: 8,
            data: img.to_rgb8().into_raw(),
            filter: ImageFilter::Flate,
        })
    }
}
