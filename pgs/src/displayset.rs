/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Groups segments into display sets.
//!
//! # Overview
//!
//! A display set (DS) is everything between a presentation composition segment (PCS) and the
//! following end segment (ES). It describes one state of the screen at a given timestamp.
//!
//! Display sets are grouped into epochs. An epoch begins with a DS whose composition state is
//! [`EpochStart`](super::segment::CompositionState::EpochStart); windows, palettes and objects
//! defined by one DS remain available to the later display sets of the same epoch. A DS that
//! only fades a subtitle in or out, for example, typically redefines the palette and refers
//! back to an object it does not carry.
//!
//! Besides the definitions it carries, every [`DisplaySet`] read through
//! [`DisplaySetReader`] is resolved against its epoch: [`DisplaySet::palette`] is the palette
//! the composition renders with and [`DisplaySet::composed`] pairs each composition object
//! with the object it shows. A resolved DS can be rendered without looking at any other DS.


mod displaysetread;

pub use displaysetread::*;

use super::{
    palette::Palette,
    rle::{decode, PixelBuffer, RleResult},
    segment::{CompositionObject, CompositionState},
};
use std::{
    collections::BTreeMap,
    sync::Arc,
};

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct DisplaySet {
    pub pts: u32,
    pub dts: u32,
    pub width: u16,
    pub height: u16,
    pub frame_rate: u8,
    pub composition: Composition,
    /// Windows defined by this DS.
    pub windows: BTreeMap<u8, Window>,
    /// Palettes defined by this DS.
    pub palettes: BTreeMap<u8, Palette>,
    /// Objects defined by this DS.
    pub objects: BTreeMap<u16, Arc<DecodedObject>>,
    /// The palette named by the composition, as it stands after this DS.
    pub palette: Arc<Palette>,
    /// The composition objects, in composition order, paired with what they show.
    pub composed: Vec<ComposedObject>,
}

impl DisplaySet {

    /// Whether this DS clears the screen rather than showing anything.
    pub fn is_clear(&self) -> bool {
        self.composition.objects.is_empty()
    }
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Composition {
    pub number: u16,
    pub state: CompositionState,
    pub palette_update: bool,
    pub palette_id: u8,
    pub objects: Vec<CompositionObject>,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Window {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// An object whose fragments have been reassembled, still in its compressed form.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct DecodedObject {
    pub id: u16,
    pub version: u8,
    pub width: u16,
    pub height: u16,
    /// The complete RLE data. Its length matches the length the object declared.
    pub data: Vec<u8>,
}

impl DecodedObject {

    /// Runs the RLE decoder over this object's data.
    pub fn pixels(&self) -> RleResult<PixelBuffer> {
        decode(&self.data, self.width, self.height)
    }
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct ComposedObject {
    pub placement: CompositionObject,
    pub object: Arc<DecodedObject>,
    /// The window the placement refers to, if the epoch defines it.
    pub window: Option<Window>,
}
