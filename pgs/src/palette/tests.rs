/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use super::super::segment::PaletteEntry;

fn pds(version: u8, entries: Vec<PaletteEntry>) -> PaletteDefinitionSegment {
    PaletteDefinitionSegment {
        pts: 0,
        dts: 0,
        id: 0,
        version,
        entries,
    }
}

#[test]
fn test_absent_index_is_transparent() {

    let palette = Palette::from_segment(&pds(0, vec![
        PaletteEntry { id: 1, y: 235, cr: 128, cb: 128, alpha: 255 },
    ]));

    assert_eq!(palette.rgba(2), Rgba::TRANSPARENT);
    assert_eq!(palette.color(2), None);
}

#[test]
fn test_white_and_black() {

    let white = Color { y: 235, cr: 128, cb: 128, alpha: 255 };
    let black = Color { y: 16, cr: 128, cb: 128, alpha: 200 };

    assert_eq!(white.to_rgba(), Rgba { red: 255, green: 255, blue: 255, alpha: 255 });
    assert_eq!(black.to_rgba(), Rgba { red: 0, green: 0, blue: 0, alpha: 200 });
}

#[test]
fn test_zero_alpha_drops_color() {

    let color = Color { y: 180, cr: 90, cb: 200, alpha: 0 };

    assert_eq!(color.to_rgba(), Rgba::TRANSPARENT);
}

#[test]
fn test_update_merges_entries() {

    let mut palette = Palette::from_segment(&pds(0, vec![
        PaletteEntry { id: 1, y: 235, cr: 128, cb: 128, alpha: 255 },
        PaletteEntry { id: 2, y: 16, cr: 128, cb: 128, alpha: 255 },
    ]));

    palette.update(&pds(1, vec![
        PaletteEntry { id: 1, y: 235, cr: 128, cb: 128, alpha: 64 },
    ]));

    assert_eq!(palette.version, 1);
    assert_eq!(palette.color(1).map(|color| color.alpha), Some(64));
    assert_eq!(palette.color(2).map(|color| color.alpha), Some(255));
    assert_eq!(palette.max_index(), Some(2));
}
