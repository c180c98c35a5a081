use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb};

use crate::capture::buffer::Frame;
use crate::capture::error::{CaptureError, Result};

/// Prefix of every encoded frame.
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Compress raw RGB pixel data to JPEG at the given quality (1-100).
pub fn compress_jpeg(data: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    let img: ImageBuffer<Rgb<u8>, _> = ImageBuffer::from_raw(width, height, data)
        .ok_or_else(|| CaptureError::InvalidFrame(format!("{width}x{height} buffer too small")))?;

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    img.write_with_encoder(encoder)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Resize raw RGB data with `fast_image_resize`.
pub fn resize_rgb(
    data: &[u8],
    width: u32,
    height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Result<Vec<u8>> {
    use fast_image_resize as fr;
    use fr::images::Image;

    let src_image = Image::from_vec_u8(width, height, data.to_vec(), fr::PixelType::U8x3)
        .map_err(|e| CaptureError::InvalidFrame(e.to_string()))?;
    let mut dst_image = Image::new(dst_width, dst_height, fr::PixelType::U8x3);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, None)
        .map_err(|e| CaptureError::Resize(e.to_string()))?;

    Ok(dst_image.into_vec())
}

/// Encode a frame as a `data:image/jpeg;base64,...` URL at the canvas size.
///
/// Frames already at `width x height` skip the resize step.
pub fn encode_data_url(frame: &Frame, width: u32, height: u32, quality: u8) -> Result<String> {
    if frame.width == 0 || frame.height == 0 || width == 0 || height == 0 {
        return Err(CaptureError::InvalidFrame("empty frame".to_string()));
    }

    let jpeg = if frame.width == width && frame.height == height {
        compress_jpeg(&frame.data, width, height, quality)?
    } else {
        let resized = resize_rgb(&frame.data, frame.width, frame.height, width, height)?;
        compress_jpeg(&resized, width, height, quality)?
    };

    let mut url = String::with_capacity(JPEG_DATA_URL_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
    url.push_str(JPEG_DATA_URL_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(&jpeg, &mut url);
    Ok(url)
}
