/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

//! Encoders used by the tests to build bitstreams.

use super::segment::{
    CompositionState,
    EndSegment,
    Framing,
    ObjectDefinitionSegment,
    ObjectHeader,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    CompositionObject,
    Segment,
    Sequence,
    WindowDefinition,
    WindowDefinitionSegment,
    MAGIC_NUMBER,
};
use byteorder::{BigEndian, WriteBytesExt};

pub fn encode_segments(segments: &[Segment], framing: Framing) -> Vec<u8> {

    let mut output = vec![];

    for segment in segments {
        write_segment(&mut output, segment, framing);
    }

    output
}

pub fn write_segment(output: &mut Vec<u8>, segment: &Segment, framing: Framing) {

    let payload = match segment {
        Segment::PresentationComposition(pcs) => generate_pcs(pcs),
        Segment::WindowDefinition(wds) => generate_wds(wds),
        Segment::PaletteDefinition(pds) => generate_pds(pds),
        Segment::ObjectDefinition(ods) => generate_ods(ods),
        Segment::End(_) => vec![],
    };

    write_raw_segment(output, framing, segment.pts(), segment.dts(), segment.kind().tag(), &payload);
}

pub fn write_raw_segment(
    output: &mut Vec<u8>,
    framing: Framing,
    pts: u32,
    dts: u32,
    tag: u8,
    payload: &[u8],
) {

    if framing == Framing::Sup {
        output.write_u16::<BigEndian>(MAGIC_NUMBER).unwrap();
    }

    output.write_u32::<BigEndian>(pts).unwrap();
    output.write_u32::<BigEndian>(dts).unwrap();
    output.write_u8(tag).unwrap();
    output.write_u16::<BigEndian>(payload.len() as u16).unwrap();
    output.extend_from_slice(payload);
}

fn generate_pcs(pcs: &PresentationCompositionSegment) -> Vec<u8> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(pcs.width).unwrap();
    payload.write_u16::<BigEndian>(pcs.height).unwrap();
    payload.write_u8(pcs.frame_rate).unwrap();
    payload.write_u16::<BigEndian>(pcs.composition_number).unwrap();
    payload.write_u8(
        match pcs.composition_state {
            CompositionState::Normal => 0x00,
            CompositionState::AcquisitionPoint => 0x40,
            CompositionState::EpochStart => 0x80,
        }
    ).unwrap();
    payload.write_u8(if pcs.palette_update { 0x80 } else { 0x00 }).unwrap();
    payload.write_u8(pcs.palette_id).unwrap();
    payload.write_u8(pcs.composition_objects.len() as u8).unwrap();

    for comp_obj in &pcs.composition_objects {

        let forced = if comp_obj.forced { 0x80 } else { 0x00 };
        let cropped = if comp_obj.crop.is_some() { 0x40 } else { 0x00 };

        payload.write_u16::<BigEndian>(comp_obj.object_id).unwrap();
        payload.write_u8(comp_obj.window_id).unwrap();
        payload.write_u8(forced | cropped).unwrap();
        payload.write_u16::<BigEndian>(comp_obj.x).unwrap();
        payload.write_u16::<BigEndian>(comp_obj.y).unwrap();

        if let Some(crop) = &comp_obj.crop {
            payload.write_u16::<BigEndian>(crop.x).unwrap();
            payload.write_u16::<BigEndian>(crop.y).unwrap();
            payload.write_u16::<BigEndian>(crop.width).unwrap();
            payload.write_u16::<BigEndian>(crop.height).unwrap();
        }
    }

    payload
}

fn generate_wds(wds: &WindowDefinitionSegment) -> Vec<u8> {

    let mut payload = vec![];

    payload.write_u8(wds.windows.len() as u8).unwrap();

    for window in wds.windows.iter() {
        payload.write_u8(window.id).unwrap();
        payload.write_u16::<BigEndian>(window.x).unwrap();
        payload.write_u16::<BigEndian>(window.y).unwrap();
        payload.write_u16::<BigEndian>(window.width).unwrap();
        payload.write_u16::<BigEndian>(window.height).unwrap();
    }

    payload
}

fn generate_pds(pds: &PaletteDefinitionSegment) -> Vec<u8> {

    let mut payload = vec![];

    payload.write_u8(pds.id).unwrap();
    payload.write_u8(pds.version).unwrap();

    for entry in &pds.entries {
        payload.write_u8(entry.id).unwrap();
        payload.write_u8(entry.y).unwrap();
        payload.write_u8(entry.cr).unwrap();
        payload.write_u8(entry.cb).unwrap();
        payload.write_u8(entry.alpha).unwrap();
    }

    payload
}

fn generate_ods(ods: &ObjectDefinitionSegment) -> Vec<u8> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(ods.id).unwrap();
    payload.write_u8(ods.version).unwrap();
    payload.write_u8(
        match ods.sequence {
            Sequence::Single => 0xC0,
            Sequence::First => 0x80,
            Sequence::Middle => 0x00,
            Sequence::Last => 0x40,
        }
    ).unwrap();

    if let Some(header) = &ods.header {
        payload.write_u24::<BigEndian>(header.length as u32 + 4).unwrap();
        payload.write_u16::<BigEndian>(header.width).unwrap();
        payload.write_u16::<BigEndian>(header.height).unwrap();
    }

    payload.extend_from_slice(&ods.data);

    payload
}

pub fn pcs(
    pts: u32,
    state: CompositionState,
    palette_id: u8,
    objects: &[(u16, u8)],
) -> Segment {
    Segment::PresentationComposition(
        PresentationCompositionSegment {
            pts,
            dts: 0,
            width: 1920,
            height: 1080,
            frame_rate: 0x10,
            composition_number: 0,
            composition_state: state,
            palette_update: false,
            palette_id,
            composition_objects: objects.iter().map(|&(object_id, window_id)|
                CompositionObject {
                    object_id,
                    window_id,
                    forced: false,
                    x: 100,
                    y: 900,
                    crop: None,
                }
            ).collect(),
        }
    )
}

pub fn wds(pts: u32, window_id: u8) -> Segment {
    Segment::WindowDefinition(
        WindowDefinitionSegment {
            pts,
            dts: 0,
            windows: vec![
                WindowDefinition {
                    id: window_id,
                    x: 100,
                    y: 900,
                    width: 800,
                    height: 100,
                },
            ],
        }
    )
}

pub fn pds(pts: u32, id: u8, version: u8, entries: &[(u8, u8)]) -> Segment {
    Segment::PaletteDefinition(
        PaletteDefinitionSegment {
            pts,
            dts: 0,
            id,
            version,
            entries: entries.iter().map(|&(id, alpha)|
                PaletteEntry { id, y: 235, cr: 128, cb: 128, alpha }
            ).collect(),
        }
    )
}

pub fn ods(
    pts: u32,
    id: u16,
    version: u8,
    sequence: Sequence,
    header: Option<(usize, u16, u16)>,
    data: &[u8],
) -> Segment {
    Segment::ObjectDefinition(
        ObjectDefinitionSegment {
            pts,
            dts: 0,
            id,
            version,
            sequence,
            header: header.map(|(length, width, height)| ObjectHeader { length, width, height }),
            data: data.to_vec(),
        }
    )
}

/// A complete, unfragmented object.
pub fn single_ods(pts: u32, id: u16, version: u8, width: u16, height: u16, data: &[u8]) -> Segment {
    ods(pts, id, version, Sequence::Single, Some((data.len(), width, height)), data)
}

pub fn end(pts: u32) -> Segment {
    Segment::End(EndSegment { pts, dts: 0 })
}

/// Greedy maximal-run encoder producing the codes the decoder understands.
pub fn rle_compress(lines: &[Vec<u8>]) -> Vec<u8> {

    let mut output = Vec::<u8>::new();

    for line in lines {

        let mut index = 0;

        while index < line.len() {

            let byte = line[index];
            let mut count = 1;

            while index + count < line.len() && line[index + count] == byte && count < 16_383 {
                count += 1;
            }

            output_rle_sequence(&mut output, byte, count);
            index += count;
        }

        output.push(0x00);
        output.push(0x00);
    }

    output
}

fn output_rle_sequence(output: &mut Vec<u8>, byte: u8, count: usize) {
    if byte == 0x00 {
        match count {
            1 ..= 63 => {
                output.push(0x00);
                output.push(count as u8);
            }
            _ => {
                output.push(0x00);
                output.push(0x40 | (count >> 8) as u8);
                output.push((count & 0xFF) as u8);
            }
        }
    } else {
        match count {
            1 => {
                output.push(byte);
            }
            2 => {
                output.push(byte);
                output.push(byte);
            }
            3 ..= 63 => {
                output.push(0x00);
                output.push(0x80 | count as u8);
                output.push(byte);
            }
            _ => {
                output.push(0x00);
                output.push(0xC0 | (count >> 8) as u8);
                output.push((count & 0xFF) as u8);
                output.push(byte);
            }
        }
    }
}
