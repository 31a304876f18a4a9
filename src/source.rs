// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/source.rs - Input loading for s3g/x3g captures.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/*!
 * # `source` Module
 *
 * Reads a whole capture into memory. Captures that were gzipped or
 * zlib-compressed are inflated on the way in; neither header can start a
 * plain command stream, since `0x1f` and `0x78` aren't command opcodes.
 */

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::prelude::*;
use std::path::Path;

use flate2::read::{GzDecoder, ZlibDecoder};
use tracing::debug;

/// Compression detected from the first bytes of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zlib,
}

impl Compression {
    pub fn detect(data: &[u8]) -> Self {
        match data {
            [0x1f, 0x8b, ..] => Compression::Gzip,
            // Deflate with a 32K window, and a header check that holds
            [cmf @ 0x78, flg, ..] if (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0 => {
                Compression::Zlib
            }
            _ => Compression::None,
        }
    }
}

/// Largest stream a compressed capture may inflate to (256 MiB).
pub const MAX_INFLATED_LEN: u64 = 256 << 20;

/// Returns the stream held by `data`, inflating it if it's compressed.
///
/// Fails with [io::ErrorKind::InvalidData] if the inflated stream would be
/// longer than [MAX_INFLATED_LEN].
pub fn inflate(data: Vec<u8>) -> io::Result<Vec<u8>> {
    inflate_limited(data, MAX_INFLATED_LEN)
}

fn inflate_limited(data: Vec<u8>, limit: u64) -> io::Result<Vec<u8>> {
    let compression = Compression::detect(&data);
    let decoder: Box<dyn Read + '_> = match compression {
        Compression::None => return Ok(data),
        Compression::Gzip => Box::new(GzDecoder::new(data.as_slice())),
        Compression::Zlib => Box::new(ZlibDecoder::new(data.as_slice())),
    };

    // One byte past the limit tells a stream of exactly `limit` bytes apart
    // from a longer one
    let mut buffer = Vec::with_capacity(data.len() * 4);
    let inflated = decoder.take(limit + 1).read_to_end(&mut buffer)?;
    if inflated as u64 > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{:?} input inflates past {} bytes", compression, limit),
        ));
    }

    debug!(
        ?compression,
        compressed = data.len(),
        inflated,
        "inflated input"
    );
    Ok(buffer)
}

/// Reads all of `reader`, inflating the data if needed.
pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    inflate(buffer)
}

/// Reads the file at `path`, inflating the data if needed.
pub fn from_filename<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    from_reader(BufReader::new(file))
}
