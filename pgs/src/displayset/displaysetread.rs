/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    ComposedObject,
    Composition,
    DecodedObject,
    DisplaySet,
    Window,
    super::{
        palette::Palette,
        segment::{
            CompositionState,
            EndSegment,
            Framing,
            ObjectDefinitionSegment,
            ObjectHeader,
            PaletteDefinitionSegment,
            PresentationCompositionSegment,
            ReadError as SegmentReadError,
            Segment,
            SegmentKind,
            SegmentReadResult,
            SegmentReader,
            WindowDefinitionSegment,
        },
    },
};
use std::{
    collections::BTreeMap,
    io::Read,
    mem,
    sync::Arc,
};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

/// A specialized [`Result`](std::result::Result) type for display set-reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [DisplaySetReader].
///
/// Errors concerning a single object leave the reader positioned at the start of the next DS,
/// so reading can carry on with it. Every other error ends the stream. See
/// [`ReadError::is_fatal`].
#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentReadError,
    },
    /// A segment arrived where the display set structure does not allow it.
    #[error("unexpected {kind} segment while {expected}")]
    ProtocolOrder {
        kind: SegmentKind,
        expected: &'static str,
    },
    /// The segments ran out before the current DS was closed by an end segment.
    #[error("stream ends inside a display set")]
    TruncatedStream,
    /// An object definition whose first fragment carries no object header.
    #[error("object {object_id} starts without an object header")]
    MissingObjectHeader {
        object_id: u16,
    },
    /// An object was still waiting for fragments when it had to be closed.
    #[error("object {object_id} is missing its final fragment")]
    TruncatedObject {
        object_id: u16,
    },
    /// The fragments of an object do not add up to its declared length.
    #[error("object {object_id} has {actual} bytes of data but declares {declared}")]
    CorruptObject {
        object_id: u16,
        declared: usize,
        actual: usize,
    },
    /// The composition shows an object neither this DS nor its epoch defines.
    #[error("composition references unknown object ID {object_id}")]
    UnknownObjectReference {
        object_id: u16,
    },
}

impl ReadError {

    /// Whether reading must stop. Non-fatal errors only cost the DS they were found in.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ReadError::TruncatedObject { .. }
                | ReadError::CorruptObject { .. }
                | ReadError::UnknownObjectReference { .. }
        )
    }
}

/// Allows reading display sets from a source.
pub trait ReadDisplaySetExt {

    /// Turns the source into a lazy sequence of display sets read from SUP-framed segments.
    fn display_sets(self) -> DisplaySetReader<SegmentReader<Self>> where Self: Sized;
}

impl<T> ReadDisplaySetExt for T where
    T: Read,
{

    fn display_sets(self) -> DisplaySetReader<SegmentReader<Self>> {
        DisplaySetReader::new(SegmentReader::new(self))
    }
}

enum State {
    AwaitingComposition,
    Accumulating(Box<PendingSet>),
}

struct PendingSet {
    pcs: PresentationCompositionSegment,
    windows: BTreeMap<u8, Window>,
    palettes: Vec<PaletteDefinitionSegment>,
    objects: BTreeMap<u16, DecodedObject>,
    open: Option<PendingObject>,
    failure: Option<ReadError>,
}

struct PendingObject {
    id: u16,
    version: u8,
    header: ObjectHeader,
    data: Vec<u8>,
}

/// What the display sets of the current epoch have defined so far.
#[derive(Clone, Default)]
struct Epoch {
    windows: BTreeMap<u8, Window>,
    palettes: BTreeMap<u8, Arc<Palette>>,
    objects: BTreeMap<u16, Arc<DecodedObject>>,
}

/// A lazy sequence of display sets built from a sequence of segments.
///
/// The reader is a state machine: it waits for a PCS, accumulates windows, palettes and object
/// fragments until the ES, then resolves the DS against its epoch and yields it.
pub struct DisplaySetReader<I> {
    segments: I,
    state: State,
    epoch: Epoch,
    done: bool,
}

impl<R: Read> DisplaySetReader<SegmentReader<R>> {

    pub fn from_reader(input: R, framing: Framing) -> Self {
        Self::new(SegmentReader::with_framing(input, framing))
    }
}

impl<I> DisplaySetReader<I> where
    I: Iterator<Item = SegmentReadResult<Segment>>,
{

    pub fn new(segments: I) -> Self {
        Self {
            segments,
            state: State::AwaitingComposition,
            epoch: Epoch::default(),
            done: false,
        }
    }

    /// Gives back the segment sequence. A DS in progress is discarded.
    pub fn into_inner(self) -> I {
        self.segments
    }

    fn accept(&mut self, segment: Segment) -> ReadResult<Option<DisplaySet>> {

        let state = mem::replace(&mut self.state, State::AwaitingComposition);

        match (state, segment) {
            (State::AwaitingComposition, Segment::PresentationComposition(pcs)) => {
                self.state = State::Accumulating(Box::new(PendingSet::new(pcs)));
            }
            (State::AwaitingComposition, segment) => {
                return Err(
                    ReadError::ProtocolOrder {
                        kind: segment.kind(),
                        expected: "awaiting a presentation composition segment",
                    }
                )
            }
            (State::Accumulating(_), Segment::PresentationComposition(_)) => {
                return Err(
                    ReadError::ProtocolOrder {
                        kind: SegmentKind::PresentationComposition,
                        expected: "accumulating a display set",
                    }
                )
            }
            (State::Accumulating(mut set), Segment::WindowDefinition(wds)) => {
                set.add_windows(wds);
                self.state = State::Accumulating(set);
            }
            (State::Accumulating(mut set), Segment::PaletteDefinition(pds)) => {
                set.palettes.push(pds);
                self.state = State::Accumulating(set);
            }
            (State::Accumulating(mut set), Segment::ObjectDefinition(ods)) => {
                set.add_object(ods)?;
                self.state = State::Accumulating(set);
            }
            (State::Accumulating(set), Segment::End(es)) => {
                return self.finish(*set, es).map(Some)
            }
        }

        Ok(None)
    }

    fn finish(&mut self, set: PendingSet, es: EndSegment) -> ReadResult<DisplaySet> {

        let pcs = set.pcs;

        // An epoch start discards the previous epoch even when this DS turns out to be broken.
        if pcs.composition_state == CompositionState::EpochStart {
            debug!(pts = pcs.pts, "epoch start");
            self.epoch = Epoch::default();
        }

        if let Some(failure) = set.failure {
            return Err(failure)
        }
        if let Some(open) = set.open {
            return Err(ReadError::TruncatedObject { object_id: open.id })
        }

        // Definitions only reach the epoch once the whole DS has resolved.
        let mut epoch = self.epoch.clone();

        epoch.windows.extend(set.windows.iter().map(|(&id, &window)| (id, window)));

        let mut palettes = BTreeMap::<u8, Palette>::new();

        for pds in set.palettes.iter() {
            palettes.entry(pds.id)
                .and_modify(|palette| palette.update(pds))
                .or_insert_with(|| Palette::from_segment(pds));
            match epoch.palettes.get_mut(&pds.id) {
                Some(palette) => Arc::make_mut(palette).update(pds),
                None => {
                    epoch.palettes.insert(pds.id, Arc::new(Palette::from_segment(pds)));
                }
            }
        }

        let objects = set.objects.into_iter()
            .map(|(id, object)| (id, Arc::new(object)))
            .collect::<BTreeMap<u16, Arc<DecodedObject>>>();

        epoch.objects.extend(objects.iter().map(|(&id, object)| (id, object.clone())));

        let mut composed = Vec::with_capacity(pcs.composition_objects.len());

        for placement in pcs.composition_objects.iter() {

            let object = epoch.objects.get(&placement.object_id).cloned().ok_or(
                ReadError::UnknownObjectReference { object_id: placement.object_id }
            )?;
            let window = epoch.windows.get(&placement.window_id).copied();

            if window.is_none() {
                warn!(
                    object_id = placement.object_id,
                    window_id = placement.window_id,
                    "composition object refers to an undefined window",
                );
            }

            composed.push(
                ComposedObject {
                    placement: placement.clone(),
                    object,
                    window,
                }
            );
        }

        let palette = match epoch.palettes.get(&pcs.palette_id) {
            Some(palette) => palette.clone(),
            None => {
                if !composed.is_empty() {
                    warn!(palette_id = pcs.palette_id, "composition uses an undefined palette");
                }
                Arc::new(Palette::empty(pcs.palette_id))
            }
        };

        self.epoch = epoch;

        debug!(
            pts = pcs.pts,
            end_pts = es.pts,
            composition_number = pcs.composition_number,
            objects = composed.len(),
            "display set complete",
        );

        Ok(
            DisplaySet {
                pts: pcs.pts,
                dts: pcs.dts,
                width: pcs.width,
                height: pcs.height,
                frame_rate: pcs.frame_rate,
                composition: Composition {
                    number: pcs.composition_number,
                    state: pcs.composition_state,
                    palette_update: pcs.palette_update,
                    palette_id: pcs.palette_id,
                    objects: pcs.composition_objects,
                },
                windows: set.windows,
                palettes,
                objects,
                palette,
                composed,
            }
        )
    }
}

impl<I> Iterator for DisplaySetReader<I> where
    I: Iterator<Item = SegmentReadResult<Segment>>,
{

    type Item = ReadResult<DisplaySet>;

    fn next(&mut self) -> Option<Self::Item> {

        if self.done {
            return None
        }

        loop {

            let segment = match self.segments.next() {
                Some(Ok(segment)) => segment,
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err.into()))
                }
                None => {
                    self.done = true;
                    return match self.state {
                        State::AwaitingComposition => None,
                        State::Accumulating(_) => Some(Err(ReadError::TruncatedStream)),
                    }
                }
            };

            match self.accept(segment) {
                Ok(Some(display_set)) => return Some(Ok(display_set)),
                Ok(None) => {}
                Err(err) => {
                    if err.is_fatal() {
                        self.done = true;
                    } else {
                        debug!(error = %err, "skipping display set");
                    }
                    return Some(Err(err))
                }
            }
        }
    }
}

impl PendingSet {

    fn new(pcs: PresentationCompositionSegment) -> Self {
        Self {
            pcs,
            windows: BTreeMap::new(),
            palettes: Vec::new(),
            objects: BTreeMap::new(),
            open: None,
            failure: None,
        }
    }

    fn add_windows(&mut self, wds: WindowDefinitionSegment) {
        for wd in wds.windows.iter() {
            self.windows.insert(
                wd.id,
                Window {
                    x: wd.x,
                    y: wd.y,
                    width: wd.width,
                    height: wd.height,
                },
            );
        }
    }

    /// Only the first object-level failure of a DS is kept.
    fn fail(&mut self, err: ReadError) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }

    fn add_object(&mut self, ods: ObjectDefinitionSegment) -> ReadResult<()> {

        let sequence = ods.sequence;

        if sequence.is_first() {

            let header = ods.header.ok_or(ReadError::MissingObjectHeader { object_id: ods.id })?;

            if let Some(open) = self.open.take() {
                self.fail(ReadError::TruncatedObject { object_id: open.id });
            }

            self.open = Some(
                PendingObject {
                    id: ods.id,
                    version: ods.version,
                    header,
                    data: ods.data,
                }
            );
        } else {
            match self.open.as_mut() {
                Some(open) if open.id == ods.id && open.version == ods.version => {
                    open.data.extend_from_slice(&ods.data);
                }
                _ => {
                    return Err(
                        ReadError::ProtocolOrder {
                            kind: SegmentKind::ObjectDefinition,
                            expected: "continuing an object that is not open",
                        }
                    )
                }
            }
        }

        if sequence.is_last() {
            if let Some(open) = self.open.take() {
                self.close(open);
            }
        }

        Ok(())
    }

    fn close(&mut self, object: PendingObject) {

        if object.data.len() != object.header.length {
            self.fail(
                ReadError::CorruptObject {
                    object_id: object.id,
                    declared: object.header.length,
                    actual: object.data.len(),
                }
            );
            return
        }

        self.objects.insert(
            object.id,
            DecodedObject {
                id: object.id,
                version: object.version,
                width: object.header.width,
                height: object.header.height,
                data: object.data,
            },
        );
    }
}
