// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/error.rs - Error types for the s3g/x3g decoder.
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

use std::fmt;

use thiserror::Error;

/// Identifies which opcode table a lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Top-level commands.
    Command,
    /// Sub-commands of the tool action command (136).
    ToolAction,
    /// Sub-commands of the tool query command (10).
    ToolQuery,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TableKind::Command => "command",
            TableKind::ToolAction => "tool action",
            TableKind::ToolQuery => "tool query",
        })
    }
}

/// A fatal decoding error. Every variant carries the absolute byte offset in
/// the input at which it occurred.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated stream at byte {offset}: needed {needed} bytes, {available} available")]
    TruncatedStream {
        offset: u64,
        needed: usize,
        available: usize,
    },
    #[error("unterminated string at byte {offset}: no NUL within {max_len} bytes")]
    UnterminatedString { offset: u64, max_len: usize },
    #[error("unrecognized {table} opcode {opcode} at byte {offset}")]
    UnrecognizedOpcode {
        table: TableKind,
        opcode: u8,
        offset: u64,
    },
    #[error(
        "malformed tool sub-packet at byte {offset}: opcode {opcode} expects {expected} payload bytes, header declares {declared}"
    )]
    MalformedSubPacket {
        offset: u64,
        opcode: u8,
        expected: usize,
        declared: usize,
    },
}

impl DecodeError {
    /// The byte offset at which the error occurred.
    pub fn offset(&self) -> u64 {
        match self {
            DecodeError::TruncatedStream { offset, .. }
            | DecodeError::UnterminatedString { offset, .. }
            | DecodeError::UnrecognizedOpcode { offset, .. }
            | DecodeError::MalformedSubPacket { offset, .. } => *offset,
        }
    }
}

/// A framed packet whose CRC did not check out.
///
/// This is advisory only: the inner command of the frame is still decoded and
/// returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("checksum mismatch in frame at byte {offset} (CRC remainder 0x{remainder:02X})")]
pub struct ChecksumMismatch {
    /// Offset of the frame's opcode byte.
    pub offset: u64,
    /// CRC8 over the frame payload and its trailing CRC byte. Zero when intact.
    pub remainder: u8,
}
