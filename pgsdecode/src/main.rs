/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use pgs::{
    ts_to_timestamp,
    bitmap::BitmapMode,
    displayset::{DisplaySet, DisplaySetReader},
    frame::{build_frames, Frame},
    segment::Framing,
};
use std::{
    fs::File,
    io::{stdin, BufReader, Read},
    process::exit,
};
use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Display sets handed to the workers at a time.
const SETS_PER_WORKER: usize = 16;

fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let default_workers = num_cpus::get().to_string();
    let matches = app_from_crate!()
        .arg(Arg::with_name("bare")
            .long("bare")
            .short("b")
            .help("Expect segment headers without the PG magic number")
        )
        .arg(Arg::with_name("mode")
            .long("mode")
            .short("m")
            .value_name("MODE")
            .help("How bitmap pixels are stored")
            .takes_value(true)
            .possible_values(&["indexed", "expanded"])
            .default_value("indexed")
        )
        .arg(Arg::with_name("workers")
            .long("workers")
            .short("w")
            .value_name("COUNT")
            .help("Number of threads building bitmaps")
            .takes_value(true)
            .default_value(default_workers.as_str())
            .validator(|value| {
                match value.parse::<usize>() {
                    Ok(count) if count > 0 => Ok(()),
                    _ => Err("must be a positive integer".to_string()),
                }
            })
        )
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input PGS file; use - for STDIN")
            .required(true)
        )
        .after_help(format!("This utility will decode PGS subtitles and describe the \
            bitmap shown by each display set.\n\n\
            Logging is controlled through the RUST_LOG environment variable.\n\n\
            Copyright © 2021 William Swartzendruber\n\
            Licensed under the Mozilla Public License 2.0\n\
            <{}>", env!("CARGO_PKG_REPOSITORY")).as_str())
        .get_matches();
    let framing = if matches.is_present("bare") { Framing::Bare } else { Framing::Sup };
    let mode = match matches.value_of("mode") {
        Some("expanded") => BitmapMode::Expanded,
        _ => BitmapMode::Indexed,
    };
    let workers = matches.value_of("workers")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(1);
    let input_value = matches.value_of("input").unwrap_or("-");
    let (mut stdin_read, mut file_read);
    let input = BufReader::<&mut dyn Read>::new(
        if input_value == "-" {
            stdin_read = stdin();
            &mut stdin_read
        } else {
            file_read = match File::open(input_value) {
                Ok(file) => file,
                Err(err) => {
                    error!(path = input_value, error = %err, "could not open input file");
                    exit(1)
                }
            };
            &mut file_read
        }
    );

    info!(?framing, ?mode, workers, "decoding display sets");

    let mut batch = Vec::<DisplaySet>::new();
    let mut failed = false;

    for result in DisplaySetReader::from_reader(input, framing) {
        match result {
            Ok(display_set) => {
                batch.push(display_set);
                if batch.len() >= workers * SETS_PER_WORKER {
                    print_frames(std::mem::take(&mut batch), mode, workers);
                }
            }
            Err(err) if !err.is_fatal() => {
                warn!(error = %err, "skipping display set");
            }
            Err(err) => {
                error!(error = %err, "could not read display set");
                failed = true;
            }
        }
    }

    print_frames(batch, mode, workers);

    if failed {
        exit(1)
    }
}

fn print_frames(batch: Vec<DisplaySet>, mode: BitmapMode, workers: usize) {

    let timestamps = batch.iter().map(|display_set| display_set.pts).collect::<Vec<u32>>();

    for (pts, result) in timestamps.into_iter().zip(build_frames(batch, mode, workers)) {
        match result {
            Ok(Frame::Clear { pts }) => {
                println!("frame({}) clear", ts_to_timestamp(pts));
            }
            Ok(Frame::Bitmaps { pts, bitmaps }) => {
                for placed in bitmaps.iter() {
                    println!(
                        "frame({}) object={} {}x{} at ({},{}) {} bytes",
                        ts_to_timestamp(pts),
                        placed.object_id,
                        placed.bitmap.width,
                        placed.bitmap.height,
                        placed.x,
                        placed.y,
                        placed.bitmap.layout.file_size,
                    );
                }
            }
            Err(err) => {
                warn!(pts = %ts_to_timestamp(pts), error = %err, "could not build frame");
            }
        }
    }
}
