/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    CompositionObject,
    Crop,
    CompositionState,
    EndSegment,
    ObjectDefinitionSegment,
    ObjectHeader,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    Segment,
    SegmentKind,
    Sequence,
    WindowDefinition,
    WindowDefinitionSegment,
    MAGIC_NUMBER,
};
use std::io::{Cursor, Error as IoError, ErrorKind, Read};
use byteorder::{BigEndian, ReadBytesExt};
use thiserror::Error as ThisError;
use tracing::{trace, warn};

const HEADER_SIZE: usize = 11;
const MAGIC_SIZE: usize = 2;

/// A specialized [`Result`](std::result::Result) type for segment-reading operations.
pub type SegmentReadResult<T> = Result<T, ReadError>;

/// The error type for [ReadSegmentExt] and [SegmentReader].
///
/// Every variant is fatal for the stream being read: once the framing can no longer be trusted,
/// there is no way to find the next segment boundary.
#[derive(ThisError, Debug)]
pub enum ReadError {
    /// The underlying source failed.
    #[error("segment IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    /// The source ended inside a segment header or before the declared payload was complete.
    #[error("stream ends {available} bytes into a {expected}-byte segment field")]
    TruncatedStream {
        expected: usize,
        available: usize,
    },
    #[error("segment has unrecognized magic number")]
    UnrecognizedMagicNumber,
    #[error("segment has unknown type 0x{tag:02X}")]
    UnknownSegmentType {
        tag: u8,
    },
    /// The declared payload is too small for the fields its segment type requires.
    #[error("{kind} payload is shorter than its fields")]
    ShortPayload {
        kind: SegmentKind,
    },
    #[error("presentation composition segment has unrecognized composition state")]
    UnrecognizedCompositionState,
    #[error("presentation composition segment has unrecognized palette update flag")]
    UnrecognizedPaletteUpdateFlag,
    #[error("composition object has unrecognized cropped flag")]
    UnrecognizedCropFlag,
    #[error("unrecognized object definition sequence flag")]
    UnrecognizedObjectSequenceFlag,
    #[error("object data length {length} does not cover the object dimensions")]
    InvalidObjectDataLength {
        length: usize,
    },
}

/// Selects how segment headers are framed in the byte stream.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Framing {
    /// Every header is preceded by the `PG` magic number, as in a SUP file.
    Sup,
    /// Headers start directly with the PTS.
    Bare,
}

impl Default for Framing {
    fn default() -> Self { Self::Sup }
}

/// Allows reading segments from a source.
pub trait ReadSegmentExt {

    /// Reads the next segment, returning `None` if the source ends cleanly on a segment
    /// boundary.
    fn read_segment(&mut self, framing: Framing) -> SegmentReadResult<Option<Segment>>;

    /// Turns the source into a lazy sequence of SUP-framed segments.
    fn segments(self) -> SegmentReader<Self> where Self: Sized;
}

impl<T> ReadSegmentExt for T where
    T: Read,
{

    fn read_segment(&mut self, framing: Framing) -> SegmentReadResult<Option<Segment>> {

        let mut header = [0u8; MAGIC_SIZE + HEADER_SIZE];
        let header = match framing {
            Framing::Sup => &mut header[..],
            Framing::Bare => &mut header[..HEADER_SIZE],
        };
        let read = read_fully(self, header)?;

        if read == 0 {
            return Ok(None)
        }
        if read < header.len() {
            return Err(ReadError::TruncatedStream { expected: header.len(), available: read })
        }

        let mut input = Cursor::new(&header[..]);

        if framing == Framing::Sup && input.read_u16::<BigEndian>()? != MAGIC_NUMBER {
            return Err(ReadError::UnrecognizedMagicNumber)
        }

        let pts = input.read_u32::<BigEndian>()?;
        let dts = input.read_u32::<BigEndian>()?;
        let tag = input.read_u8()?;
        let size = input.read_u16::<BigEndian>()? as usize;

        let mut payload = vec![0u8; size];
        let read = read_fully(self, &mut payload)?;

        if read < size {
            return Err(ReadError::TruncatedStream { expected: size, available: read })
        }

        let kind = SegmentKind::from_tag(tag).ok_or(ReadError::UnknownSegmentType { tag })?;

        trace!(%kind, pts, dts, size, "read segment");

        let segment = match kind {
            SegmentKind::PaletteDefinition => {
                Segment::PaletteDefinition(parse_pds(pts, dts, &payload).map_err(short(kind))?)
            }
            SegmentKind::ObjectDefinition => {
                Segment::ObjectDefinition(parse_ods(pts, dts, &payload).map_err(short(kind))?)
            }
            SegmentKind::PresentationComposition => {
                Segment::PresentationComposition(
                    parse_pcs(pts, dts, &payload).map_err(short(kind))?
                )
            }
            SegmentKind::WindowDefinition => {
                Segment::WindowDefinition(parse_wds(pts, dts, &payload).map_err(short(kind))?)
            }
            SegmentKind::End => Segment::End(EndSegment { pts, dts }),
        };

        Ok(Some(segment))
    }

    fn segments(self) -> SegmentReader<Self> {
        SegmentReader::new(self)
    }
}

/// A lazy, finite sequence of segments read from a byte source.
///
/// The reader owns its source, which is released when the reader is dropped. After the first
/// error the sequence ends.
#[derive(Debug)]
pub struct SegmentReader<R> {
    input: R,
    framing: Framing,
    done: bool,
}

impl<R: Read> SegmentReader<R> {

    /// Creates a reader expecting SUP framing.
    pub fn new(input: R) -> Self {
        Self::with_framing(input, Framing::Sup)
    }

    pub fn with_framing(input: R, framing: Framing) -> Self {
        Self {
            input,
            framing,
            done: false,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Gives back the underlying source, positioned after the last segment read.
    pub fn into_inner(self) -> R {
        self.input
    }
}

impl<R: Read> Iterator for SegmentReader<R> {

    type Item = SegmentReadResult<Segment>;

    fn next(&mut self) -> Option<Self::Item> {

        if self.done {
            return None
        }

        match self.input.read_segment(self.framing) {
            Ok(Some(segment)) => Some(Ok(segment)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Reads until `buffer` is full or the source is exhausted, returning the number of bytes read.
fn read_fully<R: Read + ?Sized>(input: &mut R, buffer: &mut [u8]) -> SegmentReadResult<usize> {

    let mut filled = 0;

    while filled < buffer.len() {
        match input.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(count) => filled += count,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(filled)
}

/// Running off the end of a payload buffer means the payload is too short for its type.
fn short(kind: SegmentKind) -> impl Fn(ReadError) -> ReadError {
    move |err| match err {
        ReadError::IoError { source } if source.kind() == ErrorKind::UnexpectedEof => {
            ReadError::ShortPayload { kind }
        }
        err => err,
    }
}

fn remaining(input: &Cursor<&[u8]>) -> usize {
    input.get_ref().len().saturating_sub(input.position() as usize)
}

fn parse_pcs(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> SegmentReadResult<PresentationCompositionSegment> {

    let mut input = Cursor::new(payload);
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let frame_rate = input.read_u8()?;
    let composition_number = input.read_u16::<BigEndian>()?;
    let composition_state = match input.read_u8()? {
        0x00 => CompositionState::Normal,
        0x40 => CompositionState::AcquisitionPoint,
        0x80 => CompositionState::EpochStart,
        _ => return Err(ReadError::UnrecognizedCompositionState),
    };
    let palette_update = match input.read_u8()? {
        0x00 => false,
        0x80 => true,
        _ => return Err(ReadError::UnrecognizedPaletteUpdateFlag),
    };
    let palette_id = input.read_u8()?;
    let comp_obj_count = input.read_u8()? as usize;
    let mut composition_objects = Vec::with_capacity(comp_obj_count);

    for _ in 0..comp_obj_count {

        let object_id = input.read_u16::<BigEndian>()?;
        let window_id = input.read_u8()?;
        let flags = input.read_u8()?;

        if flags & !0xC0 != 0 {
            return Err(ReadError::UnrecognizedCropFlag)
        }

        let x = input.read_u16::<BigEndian>()?;
        let y = input.read_u16::<BigEndian>()?;

        // For some reason, the U.S. release of Final Fantasy VII: Advent Children Complete
        // declares that the object is cropped, but then the segment's payload ends.
        let crop = if flags & 0x40 != 0 {
            if remaining(&input) >= 8 {
                Some(
                    Crop {
                        x: input.read_u16::<BigEndian>()?,
                        y: input.read_u16::<BigEndian>()?,
                        width: input.read_u16::<BigEndian>()?,
                        height: input.read_u16::<BigEndian>()?,
                    }
                )
            } else {
                warn!(object_id, "composition object declares a crop but has no crop fields");
                None
            }
        } else {
            None
        };

        composition_objects.push(
            CompositionObject {
                object_id,
                window_id,
                forced: flags & 0x80 != 0,
                x,
                y,
                crop,
            }
        );
    }

    Ok(
        PresentationCompositionSegment {
            pts,
            dts,
            width,
            height,
            frame_rate,
            composition_number,
            composition_state,
            palette_update,
            palette_id,
            composition_objects,
        }
    )
}

fn parse_wds(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> SegmentReadResult<WindowDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let count = input.read_u8()?;
    let mut windows = Vec::with_capacity(count as usize);

    for _ in 0..count {
        windows.push(
            WindowDefinition {
                id: input.read_u8()?,
                x: input.read_u16::<BigEndian>()?,
                y: input.read_u16::<BigEndian>()?,
                width: input.read_u16::<BigEndian>()?,
                height: input.read_u16::<BigEndian>()?,
            }
        );
    }

    Ok(
        WindowDefinitionSegment {
            pts,
            dts,
            windows,
        }
    )
}

fn parse_pds(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> SegmentReadResult<PaletteDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let id = input.read_u8()?;
    let version = input.read_u8()?;
    let mut entries = Vec::with_capacity(remaining(&input) / 5);

    while remaining(&input) >= 5 {

        let id = input.read_u8()?;
        let y = input.read_u8()?;
        let cr = input.read_u8()?;
        let cb = input.read_u8()?;
        let alpha = input.read_u8()?;

        entries.push(PaletteEntry { id, y, cr, cb, alpha });
    }

    Ok(
        PaletteDefinitionSegment {
            pts,
            dts,
            id,
            version,
            entries,
        }
    )
}

fn parse_ods(
    pts: u32,
    dts: u32,
    payload: &[u8],
) -> SegmentReadResult<ObjectDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let id = input.read_u16::<BigEndian>()?;
    let version = input.read_u8()?;
    let sequence = match input.read_u8()? {
        0xC0 => Sequence::Single,
        0x80 => Sequence::First,
        0x00 => Sequence::Middle,
        0x40 => Sequence::Last,
        _ => return Err(ReadError::UnrecognizedObjectSequenceFlag),
    };
    let header = if sequence.is_first() {

        let length = input.read_u24::<BigEndian>()? as usize;
        let width = input.read_u16::<BigEndian>()?;
        let height = input.read_u16::<BigEndian>()?;

        if length < 4 {
            return Err(ReadError::InvalidObjectDataLength { length })
        }

        Some(ObjectHeader { length: length - 4, width, height })
    } else {
        None
    };
    let data = payload[input.position() as usize..].to_vec();

    Ok(
        ObjectDefinitionSegment {
            pts,
            dts,
            id,
            version,
            sequence,
            header,
            data,
        }
    )
}
