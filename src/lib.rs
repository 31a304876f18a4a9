// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/lib.rs - Decoder library for MakerBot/Sailfish s3g and x3g files.
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
 * # `s3g_decompiler` Crate
 *
 * A library for decoding s3g and x3g files, the binary command streams
 * executed by MakerBot and Sailfish 3D printer firmware, into readable text.
 *
 * The decoding pipeline:
 *
 * 1. [source]: Loads the file, inflating it if it was compressed.
 * 2. [decoder]: Splits the stream into commands, checking framed packets
 *    against their [crc] and looking up opcodes in the [registry].
 * 3. [format]: Renders each command's values through its template.
 * 4. [listing]: Writes the numbered commands out as text or CSV.
 *
 * ## Usage Example
 *
 * ```no_run
 * use s3g_decompiler::decoder::CommandDecoder;
 * use s3g_decompiler::source;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     // Load the file
 *     let data = source::from_filename("example.x3g")?;
 *
 *     // Decode and print every command
 *     for (i, command) in CommandDecoder::new(&data).enumerate() {
 *         let command = command?;
 *         println!("{} [{}]: {}", i + 1, command.start, command.render());
 *         for warning in command.checksum_mismatches() {
 *             println!("WARNING: {}", warning);
 *         }
 *     }
 *
 *     Ok(())
 * }
 * ```
 */

pub mod crc;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod format;
pub mod listing;
pub mod registry;
pub mod source;
pub mod value;
