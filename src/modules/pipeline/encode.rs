/// Mirror-and-reencode stage of the pipeline
use crate::shared::errors::AppResult;
use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat};
use std::io::Cursor;

const JPEG_QUALITY: u8 = 90;

/// Output encoding for a processed image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Pick the format from the extension of the original upload's URL.
    ///
    /// Keyed to the input URL even though the transform service always
    /// answers with PNG bytes; the re-encode converts to this format, and
    /// raw uploads without an extension come out as PNG.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let file_name = path.rsplit('/').next().unwrap_or(path);

        match file_name.rsplit_once('.') {
            Some((_, ext)) => match ext.to_ascii_lowercase().as_str() {
                "jpg" | "jpeg" => OutputFormat::Jpeg,
                "png" => OutputFormat::Png,
                "webp" => OutputFormat::WebP,
                _ => OutputFormat::Png,
            },
            None => OutputFormat::Png,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Jpeg => write!(f, "jpeg"),
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::WebP => write!(f, "webp"),
        }
    }
}

/// Flip the image horizontally and encode it as `format`.
///
/// JPEG carries no alpha channel, so the cut-out is flattened first. The
/// WebP encoder in use is lossless; the quality setting applies to JPEG.
pub fn mirror_and_encode(input: &[u8], format: OutputFormat) -> AppResult<Bytes> {
    let decoded = image::load_from_memory(input)?;
    encode(decoded.fliph(), format)
}

fn encode(image: DynamicImage, format: OutputFormat) -> AppResult<Bytes> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        OutputFormat::Jpeg => {
            let flattened = DynamicImage::ImageRgb8(image.to_rgb8());
            flattened.write_to(&mut buffer, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
        }
        OutputFormat::Png => image.write_to(&mut buffer, ImageOutputFormat::Png)?,
        OutputFormat::WebP => image.write_to(&mut buffer, ImageOutputFormat::WebP)?,
    }

    Ok(Bytes::from(buffer.into_inner()))
}
