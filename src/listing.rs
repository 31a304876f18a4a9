// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/listing.rs - Text and CSV listings of decoded s3g/x3g commands.
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
 * # `listing` Module
 *
 * Writes decoded commands out one record at a time, numbered from 1.
 *
 * The text format prints `<index>: <text>`, or `<index> [<offset>]: <text>`
 * with offsets enabled, followed by a `WARNING: ...` line for every frame
 * whose checksum failed. The CSV format has the columns
 * `index,offset,opcode,description,warning`.
 *
 * ## Usage Example
 *
 * ```
 * use s3g_decompiler::decoder::CommandDecoder;
 * use s3g_decompiler::listing::{Listing, ListingFormat};
 *
 * let stream = [3, 133, 0xe8, 0x03, 0x00, 0x00];
 *
 * let mut listing = Listing::new(Vec::new(), ListingFormat::Text, true).unwrap();
 * for command in CommandDecoder::new(&stream) {
 *     listing.write_command(&command.unwrap()).unwrap();
 * }
 * let text = String::from_utf8(listing.finish().unwrap()).unwrap();
 *
 * assert_eq!(text, "1 [0]: (3) Clear buffer\n2 [1]: (133) Dwell for 1000 microseconds\n");
 * ```
 */

use std::io;
use std::io::Write;

use crate::decoder::DecodedCommand;

/// Output format of a [Listing].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingFormat {
    #[default]
    Text,
    Csv,
}

enum Sink<W: Write> {
    Text(W),
    Csv(csv::Writer<W>),
}

pub struct Listing<W: Write> {
    sink: Sink<W>,
    offsets: bool,
    count: u64,
}

impl<W: Write> Listing<W> {
    /// Creates a listing on `writer`. `offsets` adds the byte offset of each
    /// record to text lines; CSV rows always carry it.
    pub fn new(writer: W, format: ListingFormat, offsets: bool) -> io::Result<Self> {
        let sink = match format {
            ListingFormat::Text => Sink::Text(writer),
            ListingFormat::Csv => {
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(writer);
                writer.write_record(["index", "offset", "opcode", "description", "warning"])?;
                Sink::Csv(writer)
            }
        };
        Ok(Self {
            sink,
            offsets,
            count: 0,
        })
    }

    /// Number of records written so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn write_command(&mut self, command: &DecodedCommand) -> io::Result<()> {
        self.count += 1;
        let index = self.count;
        let text = command.render();
        let mismatches = command.checksum_mismatches();

        match &mut self.sink {
            Sink::Text(writer) => {
                if self.offsets {
                    writeln!(writer, "{} [{}]: {}", index, command.start, text)?;
                } else {
                    writeln!(writer, "{}: {}", index, text)?;
                }
                for mismatch in &mismatches {
                    writeln!(writer, "WARNING: {}", mismatch)?;
                }
            }
            Sink::Csv(writer) => {
                let warning = mismatches
                    .iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                writer.write_record([
                    index.to_string(),
                    command.start.to_string(),
                    command.opcode.to_string(),
                    text,
                    warning,
                ])?;
            }
        }
        Ok(())
    }

    /// Flushes the listing and hands back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        match self.sink {
            Sink::Text(mut writer) => {
                writer.flush()?;
                Ok(writer)
            }
            Sink::Csv(writer) => writer.into_inner().map_err(|e| e.into_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::CommandDecoder;

    fn list(data: &[u8], format: ListingFormat, offsets: bool) -> String {
        let mut listing = Listing::new(Vec::new(), format, offsets).unwrap();
        for command in CommandDecoder::new(data) {
            listing.write_command(&command.unwrap()).unwrap();
        }
        String::from_utf8(listing.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_text() {
        let data = [3, 137, 0x81];
        assert_eq!(
            list(&data, ListingFormat::Text, false),
            "1: (3) Clear buffer\n2: (137) Enable X stepper motors\n"
        );
        assert_eq!(
            list(&data, ListingFormat::Text, true),
            "1 [0]: (3) Clear buffer\n2 [1]: (137) Enable X stepper motors\n"
        );
    }

    #[test]
    fn test_text_checksum_warning() {
        let data = [213, 2, 137, 0x81, 0x4e, 3];
        assert_eq!(
            list(&data, ListingFormat::Text, true),
            "1 [0]: (137) Enable X stepper motors\n\
             WARNING: checksum mismatch in frame at byte 0 (CRC remainder 0x5E)\n\
             2 [5]: (3) Clear buffer\n"
        );
    }

    #[test]
    fn test_csv() {
        let mut data = vec![213, 2, 137, 0x81, 0x4e];
        data.push(14);
        data.extend(b"a,b\0");
        assert_eq!(
            list(&data, ListingFormat::Csv, false),
            "index,offset,opcode,description,warning\n\
             1,0,213,(137) Enable X stepper motors,checksum mismatch in frame at byte 0 (CRC remainder 0x5E)\n\
             2,5,14,\"(14) Capture to file \"\"a,b\"\"\",\n"
        );
    }

    #[test]
    fn test_empty_csv_has_header() {
        assert_eq!(
            list(&[], ListingFormat::Csv, true),
            "index,offset,opcode,description,warning\n"
        );
    }
}
