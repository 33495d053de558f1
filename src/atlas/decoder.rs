use std::io::Cursor;

use image::ImageReader;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// Image decoding collaborator used while building an atlas
pub trait ImageDecoder {
    /// Pixel dimensions of the encoded image
    fn info(&self, data: &[u8]) -> Result<(u32, u32), DecodeError>;

    /// Decode as RGBA8 into `out`, whose rows are `stride` bytes apart
    fn decode_rgba_into(&self, data: &[u8], out: &mut [u8], stride: usize) -> Result<(), DecodeError>;
}

/// [`ImageDecoder`] backed by the `image` crate, for any format it can guess
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    fn reader(data: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| DecodeError(e.to_string()))
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn info(&self, data: &[u8]) -> Result<(u32, u32), DecodeError> {
        Self::reader(data)?
            .into_dimensions()
            .map_err(|e| DecodeError(e.to_string()))
    }

    fn decode_rgba_into(&self, data: &[u8], out: &mut [u8], stride: usize) -> Result<(), DecodeError> {
        let image = Self::reader(data)?
            .decode()
            .map_err(|e| DecodeError(e.to_string()))?
            .into_rgba8();

        let row_len = image.width() as usize * 4;
        let rows = image.height() as usize;
        if rows == 0 || row_len == 0 {
            return Ok(());
        }
        let needed = (rows - 1) * stride + row_len;
        if row_len > stride || needed > out.len() {
            return Err(DecodeError(format!(
                "{}x{} image does not fit a {}-byte buffer with stride {stride}",
                image.width(),
                image.height(),
                out.len()
            )));
        }

        for (row, src) in image.as_raw().chunks_exact(row_len).enumerate() {
            let start = row * stride;
            out[start..start + row_len].copy_from_slice(src);
        }
        Ok(())
    }
}
