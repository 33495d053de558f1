use image::RgbaImage;
use log::{debug, info};
use thiserror::Error;

use super::{DecodeError, ImageDecoder, TextureAtlas, UV_EXTENT};
use crate::packing::{self, MAX_PACK_EXTENT, PackError, PackPos, PackRect, PackSize};
use crate::resource::ResourceDataSet;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AtlasError {
    #[error("Grid {width}x{height} must be powers of two no larger than {MAX_PACK_EXTENT}")]
    InvalidGrid { width: u8, height: u8 },

    #[error("Unit length must be positive")]
    InvalidUnit,

    #[error("Resource {0} is missing from the data set")]
    MissingData(usize),

    #[error("Failed to decode image {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: DecodeError,
    },

    #[error("Image {index} ({width}x{height}) is not a multiple of the {unit}px unit")]
    NotAligned {
        index: usize,
        width: u32,
        height: u32,
        unit: u16,
    },

    #[error("Image {index} ({width}x{height} units) does not fit the {grid_width}x{grid_height} grid")]
    TooLarge {
        index: usize,
        width: u32,
        height: u32,
        grid_width: u8,
        grid_height: u8,
    },

    #[error("Packing failed: {0}")]
    Pack(#[from] PackError),
}

/// Configuration for atlas building.
///
/// Every image must be a whole number of `unit_length` cells wide and tall.
/// The cells are packed into a `grid_width` x `grid_height` grid and the
/// pixels copied into one RGBA image of `grid * unit_length` pixels.
#[derive(Debug, Clone, Copy)]
pub struct AtlasBuilder {
    pub unit_length: u16,
    pub grid_width: u8,
    pub grid_height: u8,
}

impl AtlasBuilder {
    pub fn new(unit_length: u16, grid_width: u8, grid_height: u8) -> Self {
        Self {
            unit_length,
            grid_width,
            grid_height,
        }
    }

    pub fn unit_length(mut self, unit_length: u16) -> Self {
        self.unit_length = unit_length;
        self
    }

    pub fn grid(mut self, width: u8, height: u8) -> Self {
        self.grid_width = width;
        self.grid_height = height;
        self
    }

    fn validate(&self) -> Result<(), AtlasError> {
        let valid = |n: u8| n.is_power_of_two() && n <= MAX_PACK_EXTENT;
        if !valid(self.grid_width) || !valid(self.grid_height) {
            return Err(AtlasError::InvalidGrid {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if self.unit_length == 0 {
            return Err(AtlasError::InvalidUnit);
        }
        Ok(())
    }

    /// Size of image `index` in grid cells
    fn cell_size(&self, index: usize, width: u32, height: u32) -> Result<PackSize, AtlasError> {
        let unit = u32::from(self.unit_length);
        if width % unit != 0 || height % unit != 0 {
            return Err(AtlasError::NotAligned {
                index,
                width,
                height,
                unit: self.unit_length,
            });
        }

        let too_large = || AtlasError::TooLarge {
            index,
            width: width / unit,
            height: height / unit,
            grid_width: self.grid_width,
            grid_height: self.grid_height,
        };
        let cells_w = u8::try_from(width / unit).map_err(|_| too_large())?;
        let cells_h = u8::try_from(height / unit).map_err(|_| too_large())?;
        if cells_w > self.grid_width || cells_h > self.grid_height {
            return Err(too_large());
        }
        Ok(PackSize::new(cells_w, cells_h))
    }

    /// Build an atlas from every entry of `data`, slot `i` holding entry `i`
    pub fn build(
        &self,
        data: &dyn ResourceDataSet,
        decoder: &dyn ImageDecoder,
    ) -> Result<TextureAtlas, AtlasError> {
        self.validate()?;

        let count = data.len();
        let mut sizes = Vec::with_capacity(count);
        for index in 0..count {
            let bytes = data.data(index).ok_or(AtlasError::MissingData(index))?;
            let (width, height) = decoder
                .info(bytes)
                .map_err(|source| AtlasError::Decode { index, source })?;
            sizes.push(self.cell_size(index, width, height)?);
        }

        let positions = packing::pack(self.grid_width, self.grid_height, &sizes)?;
        let occupancy = packing::occupancy(self.grid_width, self.grid_height, &sizes);

        let unit = u32::from(self.unit_length);
        let width = u32::from(self.grid_width) * unit;
        let height = u32::from(self.grid_height) * unit;
        let mut image = RgbaImage::new(width, height);
        let stride = width as usize * 4;

        let pixels: &mut [u8] = &mut image;
        for (index, (pos, size)) in positions.iter().zip(&sizes).enumerate() {
            let bytes = data.data(index).ok_or(AtlasError::MissingData(index))?;
            let offset = (u32::from(pos.y) * unit) as usize * stride + (u32::from(pos.x) * unit) as usize * 4;
            // The slot's own rows, ending at its right edge on the last one
            let rows = (u32::from(size.height) * unit) as usize;
            let row_len = (u32::from(size.width) * unit) as usize * 4;
            let end = offset + (rows - 1) * stride + row_len;
            decoder
                .decode_rgba_into(bytes, &mut pixels[offset..end], stride)
                .map_err(|source| AtlasError::Decode { index, source })?;
            debug!("Image {index} placed at cell ({}, {})", pos.x, pos.y);
        }

        let rects = positions
            .iter()
            .zip(&sizes)
            .map(|(pos, size)| self.uv_rect(*pos, *size))
            .collect();
        let cells = positions
            .iter()
            .zip(&sizes)
            .map(|(pos, size)| PackRect::placed(*pos, *size))
            .collect();

        info!(
            "Packed {count} images into a {width}x{height} atlas, occupancy {:.1}%",
            occupancy * 100.0
        );

        Ok(TextureAtlas {
            width,
            height,
            unit_length: self.unit_length,
            image,
            rects,
            cells,
            occupancy,
        })
    }

    /// UV rect of a placed slot in 1/128 units of the atlas
    fn uv_rect(&self, pos: PackPos, size: PackSize) -> [u8; 4] {
        // Grid sides divide 128, so every product stays within 0..=128
        let scale_w = UV_EXTENT / self.grid_width;
        let scale_h = UV_EXTENT / self.grid_height;
        [
            pos.x * scale_w,
            pos.y * scale_h,
            (pos.x + size.width) * scale_w,
            (pos.y + size.height) * scale_h,
        ]
    }
}
