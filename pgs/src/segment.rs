/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Reads individual segments.
//!
//! # Overview
//!
//! A segment is the most fundamental data structure within a PGS bitstream. Multiple segments
//! come together in a well-defined manner to form a display set (DS).
//!
//! There are five types that typically appear in this order:
//!
//! 1. Presentation Composition Segment (PCS)
//! 2. Window Definition Segment (WDS)
//! 3. Palette Definition Segment (PDS)
//! 4. Object Definition Segment (ODS)
//! 5. End Segment (ES)
//!
//! Each segment starts with a fixed header: PTS (4 bytes), DTS (4 bytes), segment type
//! (1 byte) and payload size (2 bytes), all big-endian. In a SUP file, the header is itself
//! preceded by the `PG` magic number. See [`Framing`].
//!
//! ## Presentation Composition Segment (PCS)
//!
//! A PCS signals the start of a new display set (DS). It also defines properties such as the
//! role of the DS within the larger epoch, the screen resolution, the palette to render with,
//! and the mappings of objects to windows.
//!
//! ## Window Definition Segment (WDS)
//!
//! A WDS defines the areas of the screen that will be used to show objects during the larger
//! epoch.
//!
//! ## Palette Definition Segment (PDS)
//!
//! A PDS contains a list of YCrCbA values with each one having a unique ID. A single DS can
//! have multiple PDS segments.
//!
//! ## Object Definition Segment (ODS)
//!
//! An ODS carries run-length encoded pixel data. Large objects are split across several ODS
//! segments sharing the same object ID and version; only the first one declares the total
//! data length and the object's dimensions.
//!
//! ## End Segment (ES)
//!
//! An ES signals that the current DS has come to an end.


mod segmentread;

pub use segmentread::*;

pub(crate) const KIND_PDS: u8 = 0x14;
pub(crate) const KIND_ODS: u8 = 0x15;
pub(crate) const KIND_PCS: u8 = 0x16;
pub(crate) const KIND_WDS: u8 = 0x17;
pub(crate) const KIND_END: u8 = 0x80;

/// The `PG` magic number preceding each segment in a SUP file.
pub const MAGIC_NUMBER: u16 = 0x5047;

/// Represents a PGS segment.
#[derive(Clone, Debug, Hash, PartialEq)]
pub enum Segment {
    /// Represents a Presentation Composition Segment (PCS).
    PresentationComposition(PresentationCompositionSegment),
    /// Represents a Window Definition Segment (WDS).
    WindowDefinition(WindowDefinitionSegment),
    /// Represents a Palette Definition Segment (PDS).
    PaletteDefinition(PaletteDefinitionSegment),
    /// Represents an Object Definition Segment (ODS).
    ObjectDefinition(ObjectDefinitionSegment),
    /// Represents an End Segment (ES).
    End(EndSegment),
}

impl Segment {

    /// The presentation timestamp shared by every segment type.
    pub fn pts(&self) -> u32 {
        match self {
            Segment::PresentationComposition(pcs) => pcs.pts,
            Segment::WindowDefinition(wds) => wds.pts,
            Segment::PaletteDefinition(pds) => pds.pts,
            Segment::ObjectDefinition(ods) => ods.pts,
            Segment::End(es) => es.pts,
        }
    }

    /// The decoding timestamp shared by every segment type.
    pub fn dts(&self) -> u32 {
        match self {
            Segment::PresentationComposition(pcs) => pcs.dts,
            Segment::WindowDefinition(wds) => wds.dts,
            Segment::PaletteDefinition(pds) => pds.dts,
            Segment::ObjectDefinition(ods) => ods.dts,
            Segment::End(es) => es.dts,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::PresentationComposition(_) => SegmentKind::PresentationComposition,
            Segment::WindowDefinition(_) => SegmentKind::WindowDefinition,
            Segment::PaletteDefinition(_) => SegmentKind::PaletteDefinition,
            Segment::ObjectDefinition(_) => SegmentKind::ObjectDefinition,
            Segment::End(_) => SegmentKind::End,
        }
    }
}

/// The type tag of a segment, as found in its header.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SegmentKind {
    PresentationComposition,
    WindowDefinition,
    PaletteDefinition,
    ObjectDefinition,
    End,
}

impl SegmentKind {

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            KIND_PDS => Some(Self::PaletteDefinition),
            KIND_ODS => Some(Self::ObjectDefinition),
            KIND_PCS => Some(Self::PresentationComposition),
            KIND_WDS => Some(Self::WindowDefinition),
            KIND_END => Some(Self::End),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::PaletteDefinition => KIND_PDS,
            Self::ObjectDefinition => KIND_ODS,
            Self::PresentationComposition => KIND_PCS,
            Self::WindowDefinition => KIND_WDS,
            Self::End => KIND_END,
        }
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(
            match self {
                Self::PresentationComposition => "PCS",
                Self::WindowDefinition => "WDS",
                Self::PaletteDefinition => "PDS",
                Self::ObjectDefinition => "ODS",
                Self::End => "ES",
            }
        )
    }
}

/// Defines the role of a PCS (and thereby the associated DS) within an epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompositionState {
    /// Indicates that the associated PCS (and the DS it belongs to) defines the start of a new
    /// epoch. As such, the associated DS should contain all other segments necessary to render
    /// a composition onto the screen.
    EpochStart,
    /// Similar to `EpochStart`, except used to refresh the screen with the current composition.
    /// That is, the associated DS should redefine the same windows, objects, and palettes as
    /// the `EpochStart` DS. This allows, for example, a player to seek past an `EpochStart` and
    /// land in the middle of an epoch, while still being able to show the relevant composition
    /// once the `AcquisitionPoint` is encountered.
    AcquisitionPoint,
    /// This updates the composition that is on the screen. This is typically used to clear the
    /// current composition from the screen by defining a PCS with no composition objects,
    /// thereby effectively closing out the current epoch. But other things like palette updates
    /// and object substitution within a window can also be done.
    Normal,
}

impl Default for CompositionState {
    fn default() -> Self { Self::EpochStart }
}

/// Defines this object's role in a possible multi-part object.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Sequence {
    /// This object is discrete and stands alone.
    Single,
    /// This object is the first portion in a multi-part object.
    First,
    /// This object is neither the first nor the last portion in a multi-part object.
    Middle,
    /// This object is the last portion in a multi-part object.
    Last,
}

impl Sequence {

    /// Whether this fragment opens an object and therefore carries an [`ObjectHeader`].
    pub fn is_first(self) -> bool {
        matches!(self, Self::Single | Self::First)
    }

    /// Whether this fragment completes an object.
    pub fn is_last(self) -> bool {
        matches!(self, Self::Single | Self::Last)
    }
}

impl Default for Sequence {
    fn default() -> Self { Self::Single }
}

/// Defines a Presentation Composition Segment (PCS).
///
/// A PCS marks the beginning of a display set (DS).
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PresentationCompositionSegment {
    /// The timestamp indicating when composition decoding should start. In practice, this is
    /// the time at which the composition is displayed. All segments within a DS typically have
    /// identical values here.
    pub pts: u32,
    /// The timestamp indicating when the composition should be displayed. In practice, this
    /// value is always zero.
    pub dts: u32,
    /// The width of the display in pixels. This value should be consistent within a
    /// presentation.
    pub width: u16,
    /// The height of the display in pixels. This value should be consistent within a
    /// presentation.
    pub height: u16,
    /// This value should be set to `0x10` and can typically be ignored.
    pub frame_rate: u8,
    pub composition_number: u16,
    pub composition_state: CompositionState,
    /// Set when this DS only updates the palette of the composition already on screen.
    pub palette_update: bool,
    /// The palette the composition objects are rendered with.
    pub palette_id: u8,
    pub composition_objects: Vec<CompositionObject>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct CompositionObject {
    pub object_id: u16,
    pub window_id: u8,
    /// Set when the object must be shown even if the viewer has subtitles turned off.
    pub forced: bool,
    pub x: u16,
    pub y: u16,
    pub crop: Option<Crop>,
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Crop {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub windows: Vec<WindowDefinition>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinition {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PaletteDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u8,
    pub version: u8,
    pub entries: Vec<PaletteEntry>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PaletteEntry {
    pub id: u8,
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct ObjectDefinitionSegment {
    pub pts: u32,
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    pub sequence: Sequence,
    /// Only present when `sequence` is [`Sequence::Single`] or [`Sequence::First`].
    pub header: Option<ObjectHeader>,
    /// This fragment's portion of the RLE-compressed object data.
    pub data: Vec<u8>,
}

/// Describes a whole object. Carried by the first fragment of each object.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ObjectHeader {
    /// The total number of RLE bytes across all fragments. The wire value additionally counts
    /// the four bytes taken by `width` and `height`; that has already been subtracted here.
    pub length: usize,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct EndSegment {
    pub pts: u32,
    pub dts: u32,
}
