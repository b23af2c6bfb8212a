/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Decodes Presentation Graphics Stream (PGS) subtitles into bitmaps.
//!
//! The pieces fit together in a fixed order:
//!
//! 1. [`segment`] reads segments from a byte source.
//! 2. [`displayset`] groups segments into display sets and resolves them against their epoch.
//! 3. [`rle`] decodes the pixel data of objects.
//! 4. [`bitmap`] renders decoded objects through a [`palette`].
//! 5. [`frame`] turns whole display sets into frames, optionally in parallel.
//!
//! ```no_run
//! use pgs::{bitmap::BitmapMode, displayset::ReadDisplaySetExt, frame::build_frame};
//! use std::{fs::File, io::BufReader};
//!
//! let input = BufReader::new(File::open("subtitles.sup").unwrap());
//!
//! for display_set in input.display_sets() {
//!     let frame = build_frame(&display_set.unwrap(), BitmapMode::Indexed).unwrap();
//!     println!("{}", pgs::ts_to_timestamp(frame.pts()));
//! }
//! ```

pub mod bitmap;
pub mod displayset;
pub mod frame;
pub mod palette;
pub mod rle;
pub mod segment;

#[cfg(test)]
mod testutil;

/// Formats a 90 kHz PTS or DTS value as `HH:MM:SS.mmm`.
pub fn ts_to_timestamp(ts: u32) -> String {

    let mut ms = ts / 90;
    let h = ms / 3_600_000;
    ms -= h * 3_600_000;
    let m = ms / 60_000;
    ms -= m * 60_000;
    let s = ms / 1_000;
    ms -= s * 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}
