/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Turns display sets into frames: what the screen shows from a given timestamp onward.


use super::{
    bitmap::{build, Bitmap, BitmapMode, BuildResult},
    displayset::DisplaySet,
    segment::Crop,
};
use std::panic::resume_unwind;
use crossbeam::channel::{bounded, unbounded};
use tracing::debug;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Frame {
    /// Nothing is shown from `pts` onward.
    Clear {
        pts: u32,
    },
    /// The bitmaps, in composition order, shown from `pts` onward.
    Bitmaps {
        pts: u32,
        bitmaps: Vec<PlacedBitmap>,
    },
}

impl Frame {

    pub fn pts(&self) -> u32 {
        match self {
            Frame::Clear { pts } => *pts,
            Frame::Bitmaps { pts, .. } => *pts,
        }
    }
}

/// A bitmap and where the composition puts it on the screen.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PlacedBitmap {
    pub object_id: u16,
    pub window_id: u8,
    pub x: u16,
    pub y: u16,
    /// The part of the bitmap to show. The bitmap itself is never cropped.
    pub crop: Option<Crop>,
    pub forced: bool,
    pub bitmap: Bitmap,
}

/// Builds the frame for a single display set, rendering its objects with its active palette.
pub fn build_frame(display_set: &DisplaySet, mode: BitmapMode) -> BuildResult<Frame> {

    if display_set.is_clear() {
        return Ok(Frame::Clear { pts: display_set.pts })
    }

    let mut bitmaps = Vec::with_capacity(display_set.composed.len());

    for composed in display_set.composed.iter() {

        let placement = &composed.placement;

        bitmaps.push(
            PlacedBitmap {
                object_id: placement.object_id,
                window_id: placement.window_id,
                x: placement.x,
                y: placement.y,
                crop: placement.crop.clone(),
                forced: placement.forced,
                bitmap: build(&composed.object, &display_set.palette, mode)?,
            }
        );
    }

    Ok(Frame::Bitmaps { pts: display_set.pts, bitmaps })
}

/// Builds frames for `sets` on `workers` threads, returning them in the order of `sets`.
///
/// Each display set is moved to the worker that builds it. A panic on a worker thread is
/// resumed on the calling thread.
pub fn build_frames<I>(sets: I, mode: BitmapMode, workers: usize) -> Vec<BuildResult<Frame>> where
    I: IntoIterator<Item = DisplaySet>,
{

    let workers = workers.max(1);
    let (job_sender, job_receiver) = bounded::<(usize, DisplaySet)>(workers * 2);
    let (result_sender, result_receiver) = unbounded::<(usize, BuildResult<Frame>)>();

    let scope_result = crossbeam::scope(|scope| {

        for _ in 0..workers {

            let jobs = job_receiver.clone();
            let results = result_sender.clone();

            scope.spawn(move |_| {
                for (index, display_set) in jobs.iter() {
                    if results.send((index, build_frame(&display_set, mode))).is_err() {
                        break
                    }
                }
            });
        }

        // Only the workers may hold these, so that the channels disconnect once they exit.
        drop(job_receiver);
        drop(result_sender);

        let mut count = 0;

        for (index, display_set) in sets.into_iter().enumerate() {
            if job_sender.send((index, display_set)).is_err() {
                break
            }
            count += 1;
        }

        drop(job_sender);

        let mut frames = (0..count).map(|_| None).collect::<Vec<Option<BuildResult<Frame>>>>();

        for (index, frame) in result_receiver.iter() {
            frames[index] = Some(frame);
        }

        frames
    });

    let frames = match scope_result {
        Ok(frames) => frames,
        Err(panic) => resume_unwind(panic),
    };

    debug!(workers, frames = frames.len(), "built frames");

    frames.into_iter().flatten().collect()
}
