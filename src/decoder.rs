// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/decoder.rs - Command decoder for s3g/x3g streams.
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
 * # `decoder` Module
 *
 * This module turns a raw s3g/x3g byte stream into a sequence of
 * [DecodedCommand]s.
 *
 * ## Usage Example
 *
 * ```
 * use s3g_decompiler::decoder::CommandDecoder;
 *
 * // Clear buffer, then enable the X stepper
 * let stream = [3, 137, 0x81];
 *
 * let lines: Vec<String> = CommandDecoder::new(&stream)
 *     .map(|command| command.map(|c| c.render()))
 *     .collect::<Result<_, _>>()
 *     .unwrap();
 *
 * assert_eq!(lines, ["(3) Clear buffer", "(137) Enable X stepper motors"]);
 * ```
 */

use std::iter::FusedIterator;

use tracing::{debug, warn};

use crate::crc::crc8;
use crate::cursor::ByteCursor;
use crate::error::{ChecksumMismatch, DecodeError, TableKind};
use crate::format::expand;
use crate::registry::{CommandSpec, Layout, OpcodeRegistry, SubParser};
use crate::value::Field::{I32, U8, U16};
use crate::value::{Value, layout_width, unmarshal};

/// Default bound on NUL-terminated strings (display messages, build names and
/// file names).
pub const DEFAULT_MAX_STRING_LEN: usize = 256;

/// What to do when an opcode is missing from its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownOpcodePolicy {
    /// Stop decoding with [DecodeError::UnrecognizedOpcode].
    #[default]
    Abort,
    /// Emit an unrecognized record and carry on with the next byte.
    ///
    /// This is lossy: the length of an unknown top-level record can't be
    /// known, so everything after it may be decoded from the wrong offsets.
    /// Unknown tool sub-commands are skipped exactly, since their payload is
    /// length-prefixed.
    Skip,
}

/// Decoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Maximum number of bytes in a NUL-terminated string, not counting the
    /// terminator.
    pub max_string_len: usize,
    pub unknown_opcodes: UnknownOpcodePolicy,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_string_len: DEFAULT_MAX_STRING_LEN,
            unknown_opcodes: UnknownOpcodePolicy::default(),
        }
    }
}

/// A sub-command carried by a tool action (136) or tool query (10) command.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSubCommand {
    /// Which sub-command table the opcode was looked up in.
    pub table: TableKind,
    /// Index of the addressed tool.
    pub tool: u8,
    pub opcode: u8,
    /// The raw, length-prefixed payload.
    pub payload: Vec<u8>,
    pub values: Vec<Value>,
    /// `None` if the opcode was unknown and skipped.
    pub spec: Option<&'static CommandSpec>,
}

impl ToolSubCommand {
    pub fn render(&self) -> String {
        match self.spec {
            Some(spec) => expand(spec.render.template(), &self.values, spec.render.words()),
            None => format!(
                "({}) Unrecognized {}, {} byte payload skipped",
                self.opcode,
                self.table,
                self.payload.len()
            ),
        }
    }
}

/// A CRC8-checked envelope (opcode 213) around a single command.
#[derive(Debug, Clone, PartialEq)]
pub struct FramedPacket {
    /// Offset of the frame's opcode byte.
    pub offset: u64,
    /// Declared payload length.
    pub length: u8,
    /// CRC8 over the payload and the trailing CRC byte.
    pub remainder: u8,
    pub inner: DecodedCommand,
}

impl FramedPacket {
    pub fn is_intact(&self) -> bool {
        self.remainder == 0
    }

    pub fn checksum_mismatch(&self) -> Option<ChecksumMismatch> {
        if self.is_intact() {
            None
        } else {
            Some(ChecksumMismatch {
                offset: self.offset,
                remainder: self.remainder,
            })
        }
    }
}

/// The nested part of a decoded command, if it has one.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested {
    None,
    Tool(ToolSubCommand),
    Frame(Box<FramedPacket>),
}

/// One decoded record of the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCommand {
    pub opcode: u8,
    /// `None` if the opcode was unknown and skipped.
    pub spec: Option<&'static CommandSpec>,
    pub values: Vec<Value>,
    /// Offset of the opcode byte.
    pub start: u64,
    /// Offset just past the last byte of the record.
    pub end: u64,
    pub nested: Nested,
}

impl DecodedCommand {
    /// Renders the command as a line of text.
    pub fn render(&self) -> String {
        let Some(spec) = self.spec else {
            return format!("({}) Unrecognized command, skipped", self.opcode);
        };

        let text = expand(spec.render.template(), &self.values, spec.render.words());
        let nested = match &self.nested {
            Nested::None => return text,
            Nested::Tool(sub) => sub.render(),
            Nested::Frame(frame) => frame.inner.render(),
        };

        if text.is_empty() {
            nested
        } else {
            format!("{} {}", text, nested)
        }
    }

    /// Checksum failures of this command's frame and of any frames nested
    /// inside it, outermost first.
    pub fn checksum_mismatches(&self) -> Vec<ChecksumMismatch> {
        let mut mismatches = Vec::new();
        let mut command = self;
        while let Nested::Frame(frame) = &command.nested {
            mismatches.extend(frame.checksum_mismatch());
            command = &frame.inner;
        }
        mismatches
    }
}

struct Dispatch<'r> {
    registry: &'r OpcodeRegistry,
    options: DecoderOptions,
}

impl Dispatch<'_> {
    fn command(&self, cursor: &mut ByteCursor<'_>) -> Result<DecodedCommand, DecodeError> {
        let start = cursor.offset();
        let opcode = cursor.read_u8()?;

        let Some(spec) = self.registry.commands.get(opcode) else {
            self.unrecognized(TableKind::Command, opcode, start)?;
            return Ok(DecodedCommand {
                opcode,
                spec: None,
                values: Vec::new(),
                start,
                end: cursor.offset(),
                nested: Nested::None,
            });
        };

        let (values, nested) = match spec.layout {
            Layout::Fixed(fields) => {
                let bytes = cursor.read_fixed(layout_width(fields))?;
                (unmarshal(fields, bytes), Nested::None)
            }
            Layout::Custom(parser) => self.custom(parser, start, cursor)?,
        };

        Ok(DecodedCommand {
            opcode,
            spec: Some(spec),
            values,
            start,
            end: cursor.offset(),
            nested,
        })
    }

    fn unrecognized(&self, table: TableKind, opcode: u8, offset: u64) -> Result<(), DecodeError> {
        match self.options.unknown_opcodes {
            UnknownOpcodePolicy::Abort => Err(DecodeError::UnrecognizedOpcode {
                table,
                opcode,
                offset,
            }),
            UnknownOpcodePolicy::Skip => {
                warn!(offset, opcode, %table, "skipping unrecognized opcode");
                Ok(())
            }
        }
    }

    fn custom(
        &self,
        parser: SubParser,
        start: u64,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<(Vec<Value>, Nested), DecodeError> {
        let max_len = self.options.max_string_len;
        let values = match parser {
            SubParser::ToolAction => return self.tool(TableKind::ToolAction, cursor),
            SubParser::ToolQuery => return self.tool(TableKind::ToolQuery, cursor),
            SubParser::Framed => return self.frame(start, cursor),
            SubParser::DisplayMessage => {
                // options, x, y, timeout
                let mut values = unmarshal(&[U8, U8, U8, U8], cursor.read_fixed(4)?);
                values.push(Value::Str(cursor.read_until_zero(max_len)?));
                values
            }
            SubParser::BuildStart => {
                let mut values = unmarshal(&[I32], cursor.read_fixed(4)?);
                values.push(Value::Str(cursor.read_until_zero(max_len)?));
                values
            }
            SubParser::Filename => vec![Value::Str(cursor.read_until_zero(max_len)?)],
            SubParser::EepromWrite => {
                let header = cursor.read_fixed(3)?;
                let mut values = unmarshal(&[U16, U8], header);
                let data = cursor.read_fixed(usize::from(header[2]))?;
                values.push(Value::Bytes(data.to_vec()));
                values
            }
        };
        Ok((values, Nested::None))
    }

    fn tool(
        &self,
        kind: TableKind,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<(Vec<Value>, Nested), DecodeError> {
        let header_offset = cursor.offset();
        let header = cursor.read_fixed(3)?;
        let (tool, opcode, declared) = (header[0], header[1], usize::from(header[2]));
        let payload = cursor.read_fixed(declared)?;

        // A sub-command payload can only be checked against a fixed layout
        let spec = self
            .registry
            .table(kind)
            .get(opcode)
            .filter(|spec| matches!(spec.layout, Layout::Fixed(_)));
        let values = match spec.map(|spec| spec.layout) {
            Some(Layout::Fixed(fields)) => {
                let expected = layout_width(fields);
                if expected != declared {
                    return Err(DecodeError::MalformedSubPacket {
                        offset: header_offset,
                        opcode,
                        expected,
                        declared,
                    });
                }
                unmarshal(fields, payload)
            }
            _ => {
                self.unrecognized(kind, opcode, header_offset + 1)?;
                Vec::new()
            }
        };

        let sub = ToolSubCommand {
            table: kind,
            tool,
            opcode,
            payload: payload.to_vec(),
            values,
            spec,
        };
        let values = vec![
            Value::Int(tool.into()),
            Value::Int(opcode.into()),
            Value::Bytes(sub.payload.clone()),
        ];
        Ok((values, Nested::Tool(sub)))
    }

    fn frame(
        &self,
        start: u64,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<(Vec<Value>, Nested), DecodeError> {
        let length = cursor.read_u8()?;
        let payload_len = usize::from(length);

        // Checksum the payload and CRC byte, then go back and decode the
        // payload as an ordinary command.
        let remainder = crc8(cursor.read_fixed(payload_len + 1)?);
        cursor.rewind(payload_len + 1);

        let mut payload = cursor.split(payload_len)?;
        let inner = self.command(&mut payload)?;
        if !payload.is_empty() {
            warn!(
                offset = start,
                leftover = payload.remaining(),
                "frame payload continues past its command"
            );
        }
        cursor.read_u8()?;

        let frame = FramedPacket {
            offset: start,
            length,
            remainder,
            inner,
        };
        if let Some(mismatch) = frame.checksum_mismatch() {
            debug!("{}", mismatch);
        }

        Ok((vec![Value::Int(length.into())], Nested::Frame(Box::new(frame))))
    }
}

/// Decodes a stream one command at a time.
///
/// The decoder is also an [Iterator]; it stops after the last complete command
/// or after the first error.
pub struct CommandDecoder<'a> {
    cursor: ByteCursor<'a>,
    dispatch: Dispatch<'a>,
    count: u64,
    done: bool,
}

impl<'a> CommandDecoder<'a> {
    /// Creates a decoder using the standard opcode tables and default options.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, OpcodeRegistry::standard(), DecoderOptions::default())
    }

    pub fn with_options(
        data: &'a [u8],
        registry: &'a OpcodeRegistry,
        options: DecoderOptions,
    ) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            dispatch: Dispatch { registry, options },
            count: 0,
            done: false,
        }
    }

    /// Number of top-level commands decoded so far.
    pub fn command_count(&self) -> u64 {
        self.count
    }

    /// Offset of the next byte to be decoded.
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    /// Decodes the next command. Returns `Ok(None)` at the end of the stream.
    pub fn next_command(&mut self) -> Result<Option<DecodedCommand>, DecodeError> {
        if self.done || self.cursor.is_empty() {
            self.done = true;
            return Ok(None);
        }

        match self.dispatch.command(&mut self.cursor) {
            Ok(command) => {
                self.count += 1;
                debug!(
                    index = self.count,
                    offset = command.start,
                    opcode = command.opcode,
                    "decoded command"
                );
                Ok(Some(command))
            }
            Err(error) => {
                self.done = true;
                Err(error)
            }
        }
    }
}

impl Iterator for CommandDecoder<'_> {
    type Item = Result<DecodedCommand, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_command().transpose()
    }
}

impl FusedIterator for CommandDecoder<'_> {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::registry::Table;
    use crate::value::marshal;

    fn decode(data: &[u8]) -> Result<Vec<DecodedCommand>, DecodeError> {
        CommandDecoder::new(data).collect()
    }

    fn render(data: &[u8]) -> Vec<String> {
        decode(data).unwrap().iter().map(|c| c.render()).collect()
    }

    fn permissive(data: &[u8]) -> CommandDecoder<'_> {
        let options = DecoderOptions {
            unknown_opcodes: UnknownOpcodePolicy::Skip,
            ..DecoderOptions::default()
        };
        CommandDecoder::with_options(data, OpcodeRegistry::standard(), options)
    }

    #[test]
    fn test_zero_payload_records_are_contiguous() {
        let data = [3; 10];
        let commands = decode(&data).unwrap();
        assert_eq!(commands.len(), 10);
        for (i, command) in commands.iter().enumerate() {
            assert_eq!(command.start, i as u64);
            assert_eq!(command.end, i as u64 + 1);
            assert!(command.values.is_empty());
        }
    }

    #[test]
    fn test_fixed_layout() {
        let mut data = vec![129];
        for n in [100i32, -200, 300] {
            data.extend(n.to_le_bytes());
        }
        data.extend(1600u32.to_le_bytes());

        let commands = decode(&data).unwrap();
        assert_eq!(commands[0].end, 17);
        assert_eq!(
            commands[0].render(),
            "(129) Absolute move to (100,-200,300) at DDA 1600"
        );
    }

    #[test]
    fn test_truncated_last_record() {
        // Clear buffer, then a dwell missing its last byte
        let data = [3, 133, 0x10, 0x27, 0x00];
        let mut decoder = CommandDecoder::new(&data);

        assert_eq!(decoder.next().unwrap().unwrap().opcode, 3);
        assert_eq!(
            decoder.next().unwrap().unwrap_err(),
            DecodeError::TruncatedStream {
                offset: 2,
                needed: 4,
                available: 3
            }
        );
        assert!(decoder.next().is_none());
        assert_eq!(decoder.command_count(), 1);
    }

    #[test]
    fn test_stops_early() {
        let data = [3, 7, 8, 11];
        let mut decoder = CommandDecoder::new(&data);
        let first: Vec<_> = decoder.by_ref().take(2).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(decoder.offset(), 2);
        assert_eq!(decoder.command_count(), 2);
    }

    #[test]
    fn test_tool_action() {
        let data = [136, 0, 3, 2, 0xcd, 0x00];
        let commands = decode(&data).unwrap();
        assert_eq!(
            commands[0].render(),
            "(136) Tool 0: (3) Set target temperature to 205 C"
        );
        let Nested::Tool(sub) = &commands[0].nested else {
            panic!("expected a tool sub-command");
        };
        assert_eq!(sub.table, TableKind::ToolAction);
        assert_eq!(sub.payload, [0xcd, 0x00]);
        assert_eq!(sub.values, [Value::Int(205)]);

        assert_eq!(
            render(&[136, 1, 31, 2, 0x6e, 0x00, 136, 1, 12, 1, 1]),
            [
                "(136) Tool 1: (31) Set build platform temperature to 110 C",
                "(136) Tool 1: (12) Toggle cooling fan on",
            ]
        );
    }

    #[test]
    fn test_tool_action_width_mismatch() {
        assert_eq!(
            decode(&[3, 136, 0, 3, 1, 0xcd]).unwrap_err(),
            DecodeError::MalformedSubPacket {
                offset: 2,
                opcode: 3,
                expected: 2,
                declared: 1
            }
        );

        // Initialize takes no payload at all
        assert_eq!(
            render(&[136, 0, 1, 0]),
            ["(136) Tool 0: (1) Initialize firmware to boot state"]
        );
        assert!(matches!(
            decode(&[136, 0, 1, 1, 0]),
            Err(DecodeError::MalformedSubPacket { declared: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_tool_action() {
        let data = [136, 0, 99, 2, 0xaa, 0xbb, 3];
        assert_eq!(
            decode(&data).unwrap_err(),
            DecodeError::UnrecognizedOpcode {
                table: TableKind::ToolAction,
                opcode: 99,
                offset: 2
            }
        );

        let commands: Vec<_> = permissive(&data).collect::<Result<_, _>>().unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0].render(),
            "(136) Tool 0: (99) Unrecognized tool action, 2 byte payload skipped"
        );
        assert_eq!(commands[1].start, 6);
    }

    #[test]
    fn test_tool_query() {
        assert_eq!(
            render(&[10, 1, 2, 0, 10, 0, 25, 3, 0x10, 0x00, 0x04]),
            [
                "(10) Tool 1 query: (2) Get temperature",
                "(10) Tool 0 query: (25) Read from EEPROM, offset 16, length 4",
            ]
        );
        // Action opcodes aren't queries
        assert!(matches!(
            decode(&[10, 0, 3, 2, 0xcd, 0x00]),
            Err(DecodeError::UnrecognizedOpcode {
                table: TableKind::ToolQuery,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_command() {
        let data = [3, 200, 3];
        assert_eq!(
            decode(&data).unwrap_err(),
            DecodeError::UnrecognizedOpcode {
                table: TableKind::Command,
                opcode: 200,
                offset: 1
            }
        );

        let commands: Vec<_> = permissive(&data).collect::<Result<_, _>>().unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[1].spec, None);
        assert_eq!(commands[1].render(), "(200) Unrecognized command, skipped");
        assert_eq!((commands[1].start, commands[1].end), (1, 2));
    }

    #[test]
    fn test_display_message() {
        let mut data = vec![149, 0x01, 2, 3, 5];
        data.extend(b"Hello\0");
        data.push(3);
        let commands = decode(&data).unwrap();
        assert_eq!(
            commands[0].render(),
            "(149) Display message, options 0x1 at 2,3 timeout 5 s, message \"Hello\""
        );
        assert_eq!(commands[0].end, 11);
        assert_eq!(commands[1].start, 11);
    }

    #[test]
    fn test_build_start() {
        let mut data = vec![153];
        data.extend(123456i32.to_le_bytes());
        data.extend(b"cube\0");
        assert_eq!(
            render(&data),
            ["(153) Start build notification, steps 123456, name \"cube\""]
        );
    }

    fn decode_bounded(
        data: &[u8],
        max_string_len: usize,
    ) -> Result<Vec<DecodedCommand>, DecodeError> {
        let options = DecoderOptions {
            max_string_len,
            ..DecoderOptions::default()
        };
        CommandDecoder::with_options(data, OpcodeRegistry::standard(), options).collect()
    }

    #[test]
    fn test_string_bound() {
        let mut data = vec![153, 0, 0, 0, 0];
        data.extend(b"a very long build name\0");
        assert_eq!(
            decode_bounded(&data, 8).unwrap_err(),
            DecodeError::UnterminatedString {
                offset: 5,
                max_len: 8
            }
        );

        // A missing terminator at the end of the file is a truncation
        assert!(matches!(
            decode(&[14, b'a', b'b']),
            Err(DecodeError::TruncatedStream { offset: 1, .. })
        ));
    }

    #[test]
    fn test_display_message_bound() {
        let mut data = vec![3, 149, 0x00, 0, 1, 10];
        data.extend(b"Printing...\0");
        assert_eq!(
            decode_bounded(&data, 4).unwrap_err(),
            DecodeError::UnterminatedString {
                offset: 6,
                max_len: 4
            }
        );
        assert_eq!(decode_bounded(&data, 11).unwrap().len(), 2);

        // The default bound applies too
        let mut data = vec![149, 0x00, 0, 0, 0];
        data.extend([b'x'; DEFAULT_MAX_STRING_LEN + 1]);
        data.push(0);
        assert_eq!(
            decode(&data).unwrap_err(),
            DecodeError::UnterminatedString {
                offset: 5,
                max_len: DEFAULT_MAX_STRING_LEN
            }
        );
    }

    #[test]
    fn test_filename_bound() {
        for opcode in [14, 16] {
            let mut data = vec![opcode];
            data.extend(b"calibration.s3g\0");
            assert_eq!(
                decode_bounded(&data, 8).unwrap_err(),
                DecodeError::UnterminatedString {
                    offset: 1,
                    max_len: 8
                }
            );
            assert_eq!(decode_bounded(&data, 15).unwrap()[0].end, 17);
        }
    }

    #[test]
    fn test_filename_and_eeprom() {
        let mut data = vec![14];
        data.extend(b"part.s3g\0");
        data.extend([13, 0x00, 0x01, 2, 0xbe, 0xef]);
        assert_eq!(
            render(&data),
            [
                "(14) Capture to file \"part.s3g\"",
                "(13) Write to EEPROM, offset 256, length 2, data BE EF",
            ]
        );
    }

    #[test]
    fn test_framed_packet() {
        let data = [213, 2, 137, 0x81, 0x4f, 3];
        let commands = decode(&data).unwrap();
        assert_eq!(commands.len(), 2);

        let framed = &commands[0];
        assert_eq!((framed.start, framed.end), (0, 5));
        assert_eq!(framed.render(), "(137) Enable X stepper motors");
        assert!(framed.checksum_mismatches().is_empty());

        let Nested::Frame(frame) = &framed.nested else {
            panic!("expected a frame");
        };
        assert!(frame.is_intact());
        assert_eq!((frame.inner.start, frame.inner.end), (2, 4));

        assert_eq!(commands[1].start, 5);
    }

    #[test]
    fn test_framed_packet_bad_crc() {
        let data = [213, 2, 137, 0x81, 0x4e, 3];
        let commands = decode(&data).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].render(), "(137) Enable X stepper motors");
        assert_eq!(
            commands[0].checksum_mismatches(),
            [ChecksumMismatch {
                offset: 0,
                remainder: 0x5e
            }]
        );
        assert_eq!(commands[1].render(), "(3) Clear buffer");
    }

    #[test]
    fn test_framed_packet_with_leftover_payload() {
        let data = [213, 3, 3, 0, 0, 0xe4, 7];
        let commands = decode(&data).unwrap();
        assert_eq!(commands[0].render(), "(3) Clear buffer");
        assert_eq!(commands[0].end, 6);
        assert!(commands[0].checksum_mismatches().is_empty());
        assert_eq!(commands[1].render(), "(7) Abort immediately");
    }

    #[test]
    fn test_framed_packet_inner_overruns_frame() {
        // Dwell needs 4 bytes but the frame only holds 2
        let data = [213, 3, 133, 0x10, 0x27, 0x00, 0x00, 0x00];
        assert_eq!(
            decode(&data).unwrap_err(),
            DecodeError::TruncatedStream {
                offset: 3,
                needed: 4,
                available: 2
            }
        );
    }

    #[test]
    fn test_framed_tool_action() {
        let data = [213, 6, 136, 0, 3, 2, 0xcd, 0x00, 0xb1];
        assert_eq!(
            render(&data),
            ["(136) Tool 0: (3) Set target temperature to 205 C"]
        );
    }

    static TOOL_COMMANDS: [CommandSpec; 1] = [CommandSpec {
        opcode: 136,
        name: "tool action",
        layout: Layout::Custom(SubParser::ToolAction),
        render: crate::registry::Render::Nested("(136) Tool %i:"),
    }];
    static NAMED_TOOL_ACTIONS: [CommandSpec; 1] = [CommandSpec {
        opcode: 40,
        name: "set name",
        layout: Layout::Custom(SubParser::Filename),
        render: crate::registry::Render::Template("(40) Set name \"%s\""),
    }];

    #[test]
    fn test_tool_action_without_fixed_layout() {
        let registry = OpcodeRegistry {
            commands: Table::new(TableKind::Command, &TOOL_COMMANDS),
            tool_actions: Table::new(TableKind::ToolAction, &NAMED_TOOL_ACTIONS),
            tool_queries: Table::new(TableKind::ToolQuery, &[]),
        };
        let data = [136, 0, 40, 3, b'a', b'b', 0];

        let mut decoder =
            CommandDecoder::with_options(&data, &registry, DecoderOptions::default());
        assert_eq!(
            decoder.next().unwrap().unwrap_err(),
            DecodeError::UnrecognizedOpcode {
                table: TableKind::ToolAction,
                opcode: 40,
                offset: 2
            }
        );

        let options = DecoderOptions {
            unknown_opcodes: UnknownOpcodePolicy::Skip,
            ..DecoderOptions::default()
        };
        let commands: Vec<_> = CommandDecoder::with_options(&data, &registry, options)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(commands.len(), 1);
        let Nested::Tool(sub) = &commands[0].nested else {
            panic!("expected a tool sub-command");
        };
        assert_eq!(sub.spec, None);
        assert_eq!(sub.payload, b"ab\0");
    }

    proptest! {
        #[test]
        fn fixed_layouts_round_trip(bytes in proptest::collection::vec(any::<u8>(), 32)) {
            let registry = OpcodeRegistry::standard();
            for spec in registry.commands.specs() {
                let Layout::Fixed(fields) = spec.layout else {
                    continue;
                };
                let width = layout_width(fields);
                let mut data = vec![spec.opcode];
                data.extend(&bytes[..width]);

                let commands = decode(&data).unwrap();
                prop_assert_eq!(commands.len(), 1);
                prop_assert_eq!(commands[0].end, width as u64 + 1);
                prop_assert_eq!(marshal(fields, &commands[0].values), &bytes[..width]);
            }
        }

        #[test]
        fn tool_actions_round_trip(bytes in proptest::collection::vec(any::<u8>(), 4)) {
            let registry = OpcodeRegistry::standard();
            for spec in registry.tool_actions.specs() {
                let Layout::Fixed(fields) = spec.layout else {
                    continue;
                };
                let width = layout_width(fields);
                let mut data = vec![136, 2, spec.opcode, width as u8];
                data.extend(&bytes[..width]);

                let commands = decode(&data).unwrap();
                let Nested::Tool(sub) = &commands[0].nested else {
                    panic!("expected a tool sub-command");
                };
                prop_assert_eq!(sub.tool, 2);
                prop_assert_eq!(marshal(fields, &sub.values), &bytes[..width]);
            }
        }
    }
}
