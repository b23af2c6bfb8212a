/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Decodes the run-length encoding used by object data.
//!
//! Object data is a sequence of codes, each either a run of pixels or an end-of-line marker:
//!
//! | Bytes                         | Meaning                          |
//! |-------------------------------|----------------------------------|
//! | `CCCCCCCC`                    | one pixel of index C (C > 0)     |
//! | `00000000 00000000`           | end of line                      |
//! | `00000000 00LLLLLL`           | L pixels of index 0              |
//! | `00000000 01LLLLLL LLLLLLLL`  | L pixels of index 0              |
//! | `00000000 10LLLLLL CCCCCCCC`  | L pixels of index C              |
//! | `00000000 11LLLLLL LLLLLLLL CCCCCCCC` | L pixels of index C      |
//!
//! Every line must be terminated by an end-of-line marker after exactly `width` pixels.

#[cfg(test)]
mod tests;

use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for RLE decoding.
pub type RleResult<T> = Result<T, RleError>;

/// The error type for [decode].
#[derive(ThisError, Clone, Debug, Eq, Hash, PartialEq)]
pub enum RleError {
    /// An end-of-line marker arrived before the line had `width` pixels.
    #[error("line {row} ends after {columns} of {width} pixels")]
    ShortRow {
        row: usize,
        columns: usize,
        width: usize,
    },
    /// A run would have pushed the line past `width` pixels.
    #[error("run of {run} pixels at column {column} overflows line {row} of width {width}")]
    RowOverflow {
        row: usize,
        column: usize,
        run: usize,
        width: usize,
    },
    /// The data ran out before `height` lines were completed.
    #[error("object data ends after {rows} of {height} lines")]
    UnexpectedEndOfObject {
        rows: usize,
        height: usize,
    },
}

/// The palette indices of a decoded object, row by row.
///
/// The buffer always holds exactly `width * height` indices.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct PixelBuffer {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl PixelBuffer {

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn get(&self, x: u16, y: u16) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let width = self.width as usize;
        (0..self.height as usize).map(move |row| &self.pixels[row * width..(row + 1) * width])
    }

    /// The highest index used by any pixel.
    pub fn max_index(&self) -> Option<u8> {
        self.pixels.iter().copied().max()
    }
}

/// The longest run, 16383 pixels, takes a four-byte code.
const MAX_PIXELS_PER_BYTE: usize = 4096;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Code {
    Run { index: u8, length: usize },
    EndOfLine,
}

struct Codes<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Codes<'a> {

    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn byte(&mut self) -> Option<u8> {
        let byte = self.data.get(self.position).copied()?;
        self.position += 1;
        Some(byte)
    }

    /// Returns `None` when the data ends, including in the middle of a code.
    fn next_code(&mut self) -> Option<Code> {

        let first = self.byte()?;

        if first != 0x00 {
            return Some(Code::Run { index: first, length: 1 })
        }

        let flags = self.byte()?;
        let short = (flags & 0x3F) as usize;

        Some(
            match flags >> 6 {
                0b00 if flags == 0x00 => Code::EndOfLine,
                0b00 => Code::Run { index: 0, length: short },
                0b01 => Code::Run { index: 0, length: short << 8 | self.byte()? as usize },
                0b10 => Code::Run { index: self.byte()?, length: short },
                _ => {
                    let length = short << 8 | self.byte()? as usize;
                    Code::Run { index: self.byte()?, length }
                }
            }
        )
    }
}

/// Decodes RLE object data into exactly `width * height` palette indices.
///
/// Bytes following the last line's end-of-line marker are ignored.
pub fn decode(data: &[u8], width: u16, height: u16) -> RleResult<PixelBuffer> {

    let line_width = width as usize;
    let line_count = height as usize;
    // Dimensions come from the stream; never reserve more than the data could ever produce.
    let mut pixels = Vec::with_capacity(
        (line_width * line_count).min(data.len().saturating_mul(MAX_PIXELS_PER_BYTE))
    );
    let mut codes = Codes::new(data);
    let mut row = 0;
    let mut column = 0;

    while row < line_count {

        let code = codes.next_code().ok_or(
            RleError::UnexpectedEndOfObject { rows: row, height: line_count }
        )?;

        match code {
            Code::EndOfLine => {
                if column < line_width {
                    return Err(RleError::ShortRow { row, columns: column, width: line_width })
                }
                row += 1;
                column = 0;
            }
            Code::Run { index, length } => {
                if column + length > line_width {
                    return Err(
                        RleError::RowOverflow { row, column, run: length, width: line_width }
                    )
                }
                pixels.resize(pixels.len() + length, index);
                column += length;
            }
        }
    }

    Ok(
        PixelBuffer {
            width,
            height,
            pixels,
        }
    )
}
