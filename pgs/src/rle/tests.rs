/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use super::super::testutil::rle_compress;
use rand::{thread_rng, Rng};

#[test]
fn test_short_run_with_index() {

    let pixels = decode(&[0x00, 0x84, 0x07, 0x00, 0x00], 4, 1).unwrap();

    assert_eq!(pixels.pixels(), &[7, 7, 7, 7]);
    assert_eq!(pixels.width(), 4);
    assert_eq!(pixels.height(), 1);
}

#[test]
fn test_single_pixels_and_zero_runs() {

    let data = [0x05, 0x06, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x09, 0x00, 0x00];
    let pixels = decode(&data, 4, 2).unwrap();

    assert_eq!(pixels.pixels(), &[5, 6, 0, 0, 0, 0, 0, 9]);
    assert_eq!(pixels.get(3, 1), Some(9));
    assert_eq!(pixels.get(4, 1), None);
}

#[test]
fn test_long_zero_run() {

    let pixels = decode(&[0x00, 0x41, 0x2C, 0x00, 0x00], 300, 1).unwrap();

    assert_eq!(pixels.pixels().len(), 300);
    assert!(pixels.pixels().iter().all(|&index| index == 0));
}

#[test]
fn test_long_run_with_index() {

    let pixels = decode(&[0x00, 0xC1, 0x00, 0xFE, 0x00, 0x00], 256, 1).unwrap();

    assert_eq!(pixels.pixels().len(), 256);
    assert!(pixels.pixels().iter().all(|&index| index == 0xFE));
}

#[test]
fn test_trailing_bytes_ignored() {

    let pixels = decode(&[0x01, 0x00, 0x00, 0xFF, 0x00, 0x12], 1, 1).unwrap();

    assert_eq!(pixels.pixels(), &[1]);
}

#[test]
fn test_zero_height_is_empty() {

    let pixels = decode(&[], 10, 0).unwrap();

    assert!(pixels.pixels().is_empty());
    assert_eq!(pixels.rows().count(), 0);
}

#[test]
fn test_zero_width_lines() {

    let pixels = decode(&[0x00, 0x00, 0x00, 0x00], 0, 2).unwrap();

    assert!(pixels.pixels().is_empty());
    assert_eq!(pixels.rows().count(), 2);
}

#[test]
fn test_short_row() {

    assert_eq!(
        decode(&[0x00, 0x83, 0x07, 0x00, 0x00], 4, 1),
        Err(RleError::ShortRow { row: 0, columns: 3, width: 4 }),
    );
}

#[test]
fn test_row_overflow() {

    assert_eq!(
        decode(&[0x01, 0x00, 0x84, 0x07, 0x00, 0x00], 4, 1),
        Err(RleError::RowOverflow { row: 0, column: 1, run: 4, width: 4 }),
    );
}

#[test]
fn test_ends_mid_row() {

    assert_eq!(
        decode(&[0x01, 0x01, 0x00, 0x00, 0x02, 0x02], 2, 2),
        Err(RleError::UnexpectedEndOfObject { rows: 1, height: 2 }),
    );
}

#[test]
fn test_ends_inside_code() {

    assert_eq!(
        decode(&[0x00, 0xC0], 4, 1),
        Err(RleError::UnexpectedEndOfObject { rows: 0, height: 1 }),
    );
    assert_eq!(
        decode(&[0x00], 4, 1),
        Err(RleError::UnexpectedEndOfObject { rows: 0, height: 1 }),
    );
}

#[test]
fn test_oversized_dimensions_with_little_data() {

    assert_eq!(
        decode(&[0x01], u16::MAX, u16::MAX),
        Err(RleError::UnexpectedEndOfObject { rows: 0, height: u16::MAX as usize }),
    );
}

#[test]
fn test_missing_last_end_of_line() {

    assert_eq!(
        decode(&[0x01, 0x01], 2, 1),
        Err(RleError::UnexpectedEndOfObject { rows: 0, height: 1 }),
    );
}

#[test]
fn test_rows() {

    let pixels = decode(&[0x01, 0x02, 0x00, 0x00, 0x03, 0x04, 0x00, 0x00], 2, 2).unwrap();
    let rows = pixels.rows().collect::<Vec<&[u8]>>();

    assert_eq!(rows, vec![&[1, 2][..], &[3, 4][..]]);
    assert_eq!(pixels.max_index(), Some(4));
}

#[test]
fn test_reencode_cycle() {

    let mut rng = thread_rng();

    for _ in 0..50 {

        let width = rng.gen_range(1..400_u16);
        let height = rng.gen_range(1..20_u16);
        let lines = (0..height).map(|_| {
            let mut line = Vec::<u8>::with_capacity(width as usize);
            while line.len() < width as usize {
                let run = rng.gen_range(1..=(width as usize - line.len()).min(200));
                let index: u8 = if rng.gen_bool(0.4) { 0 } else { rng.gen() };
                line.extend(std::iter::repeat(index).take(run));
            }
            line
        }).collect::<Vec<Vec<u8>>>();

        let decoded = decode(&rle_compress(&lines), width, height).unwrap();
        let rows = decoded.rows().map(|row| row.to_vec()).collect::<Vec<Vec<u8>>>();
        let reencoded = decode(&rle_compress(&rows), width, height).unwrap();

        assert_eq!(decoded.pixels().len(), width as usize * height as usize);
        assert_eq!(decoded.pixels(), lines.concat().as_slice());
        assert_eq!(reencoded, decoded);
    }
}
