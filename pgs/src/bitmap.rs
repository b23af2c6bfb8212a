/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Builds bitmaps from decoded objects.
//!
//! A [`Bitmap`] is the hand-off point to whatever writes image files or feeds a text
//! recognizer. Alongside the pixels it carries a [`BitmapLayout`] describing the bitmap as a
//! BMP file with a V4 info header, so that it can be serialized without working out strides or
//! color table sizes again.


use super::{
    displayset::DecodedObject,
    palette::{Palette, Rgba},
    rle::RleError,
};
use thiserror::Error as ThisError;

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 108;

/// A specialized [`Result`](std::result::Result) type for bitmap-building operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// The error type for [build].
#[derive(ThisError, Debug)]
pub enum BuildError {
    /// The object's RLE data does not decode to its declared dimensions.
    #[error("object {object_id} has corrupt RLE data")]
    CorruptObject {
        object_id: u16,
        #[source]
        source: RleError,
    },
}

/// Selects how pixels are stored in a [`Bitmap`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BitmapMode {
    /// Palette indices at 8 bits per pixel, with the palette attached as a color table.
    Indexed,
    /// Every pixel resolved to RGBA at 32 bits per pixel.
    Expanded,
}

impl Default for BitmapMode {
    fn default() -> Self { Self::Indexed }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum BitmapPixels {
    Indexed {
        indices: Vec<u8>,
        color_table: Vec<Rgba>,
    },
    Expanded(Vec<Rgba>),
}

/// Where everything goes when a [`Bitmap`] is written out as a BMP file.
///
/// All sizes and offsets are in bytes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct BitmapLayout {
    pub bits_per_pixel: u16,
    /// Bytes per row of pixel data, padded to a multiple of four.
    pub row_stride: usize,
    pub pixel_data_size: usize,
    pub color_table_entries: usize,
    pub color_table_size: usize,
    /// File header plus info header.
    pub header_size: usize,
    pub pixel_data_offset: usize,
    pub file_size: usize,
}

impl BitmapLayout {

    pub fn new(width: u16, height: u16, bits_per_pixel: u16, color_table_entries: usize) -> Self {

        let row_stride = (width as usize * bits_per_pixel as usize + 31) / 32 * 4;
        let pixel_data_size = row_stride * height as usize;
        let color_table_size = color_table_entries * 4;
        let header_size = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
        let pixel_data_offset = header_size + color_table_size;

        Self {
            bits_per_pixel,
            row_stride,
            pixel_data_size,
            color_table_entries,
            color_table_size,
            header_size,
            pixel_data_offset,
            file_size: pixel_data_offset + pixel_data_size,
        }
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Bitmap {
    pub width: u16,
    pub height: u16,
    pub pixels: BitmapPixels,
    pub layout: BitmapLayout,
}

impl Bitmap {

    pub fn mode(&self) -> BitmapMode {
        match self.pixels {
            BitmapPixels::Indexed { .. } => BitmapMode::Indexed,
            BitmapPixels::Expanded(_) => BitmapMode::Expanded,
        }
    }

    /// The color of the pixel at (`x`, `y`), whichever way the pixels are stored.
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgba> {

        if x >= self.width || y >= self.height {
            return None
        }

        let offset = y as usize * self.width as usize + x as usize;

        match &self.pixels {
            BitmapPixels::Indexed { indices, color_table } => {
                let index = indices[offset] as usize;
                Some(color_table.get(index).copied().unwrap_or(Rgba::TRANSPARENT))
            }
            BitmapPixels::Expanded(colors) => Some(colors[offset]),
        }
    }
}

/// Decodes `object` and renders it through `palette`.
pub fn build(object: &DecodedObject, palette: &Palette, mode: BitmapMode) -> BuildResult<Bitmap> {

    let buffer = object.pixels().map_err(|source|
        BuildError::CorruptObject { object_id: object.id, source }
    )?;
    let (width, height) = (buffer.width(), buffer.height());

    Ok(
        match mode {
            BitmapMode::Indexed => {

                let entries = match (palette.max_index(), buffer.max_index()) {
                    (Some(a), Some(b)) => a.max(b) as usize + 1,
                    (Some(a), None) | (None, Some(a)) => a as usize + 1,
                    (None, None) => 0,
                };
                let color_table = (0..entries)
                    .map(|index| palette.rgba(index as u8))
                    .collect::<Vec<Rgba>>();

                Bitmap {
                    width,
                    height,
                    pixels: BitmapPixels::Indexed {
                        indices: buffer.into_pixels(),
                        color_table,
                    },
                    layout: BitmapLayout::new(width, height, 8, entries),
                }
            }
            BitmapMode::Expanded => {

                // Resolve each index once rather than once per pixel.
                let lookup = (0..=255_u8).map(|index| palette.rgba(index)).collect::<Vec<Rgba>>();
                let colors = buffer.pixels().iter()
                    .map(|&index| lookup[index as usize])
                    .collect::<Vec<Rgba>>();

                Bitmap {
                    width,
                    height,
                    pixels: BitmapPixels::Expanded(colors),
                    layout: BitmapLayout::new(width, height, 32, 0),
                }
            }
        }
    )
}
