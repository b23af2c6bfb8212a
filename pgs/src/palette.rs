/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Palettes map the 8-bit indices of decoded objects to colors.

#[cfg(test)]
mod tests;

use super::segment::PaletteDefinitionSegment;
use std::collections::BTreeMap;

/// A palette entry as stored in the bitstream: BT.709 YCrCb with limited range, plus alpha.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Color {
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

/// A 4-channel color as handed to consumers of expanded bitmaps.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Rgba {

    pub const TRANSPARENT: Rgba = Rgba { red: 0, green: 0, blue: 0, alpha: 0 };

    pub fn to_bytes(self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

impl Color {

    /// Converts to RGBA. Fully transparent entries always come out as
    /// [`Rgba::TRANSPARENT`] so that their leftover chroma never leaks into consumers.
    pub fn to_rgba(self) -> Rgba {

        if self.alpha == 0 {
            return Rgba::TRANSPARENT
        }

        let y = (self.y as f64 - 16.0) * 1.164383562;
        let cb = self.cb as f64 - 128.0;
        let cr = self.cr as f64 - 128.0;

        Rgba {
            red: channel(y + 1.792741071 * cr),
            green: channel(y - 0.5329093286 * cr - 0.2132486143 * cb),
            blue: channel(y + 2.112401786 * cb),
            alpha: self.alpha,
        }
    }
}

fn channel(value: f64) -> u8 {
    value.round().max(0.0).min(255.0) as u8
}

/// A palette within an epoch. Indices without an entry are fully transparent.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Palette {
    pub id: u8,
    pub version: u8,
    pub entries: BTreeMap<u8, Color>,
}

impl Palette {

    /// Creates a palette with no entries, rendering everything transparent.
    pub fn empty(id: u8) -> Self {
        Self {
            id,
            version: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn from_segment(pds: &PaletteDefinitionSegment) -> Self {

        let mut palette = Self::empty(pds.id);

        palette.update(pds);

        palette
    }

    /// Applies a later definition of this palette. Entries it carries replace existing ones;
    /// entries it omits are kept.
    pub fn update(&mut self, pds: &PaletteDefinitionSegment) {

        self.version = pds.version;

        for entry in pds.entries.iter() {
            self.entries.insert(
                entry.id,
                Color {
                    y: entry.y,
                    cr: entry.cr,
                    cb: entry.cb,
                    alpha: entry.alpha,
                },
            );
        }
    }

    pub fn color(&self, index: u8) -> Option<Color> {
        self.entries.get(&index).copied()
    }

    /// Resolves an index to RGBA, falling back to transparent for absent entries.
    pub fn rgba(&self, index: u8) -> Rgba {
        self.color(index).map(Color::to_rgba).unwrap_or(Rgba::TRANSPARENT)
    }

    /// The highest index that has an entry.
    pub fn max_index(&self) -> Option<u8> {
        self.entries.keys().next_back().copied()
    }
}
