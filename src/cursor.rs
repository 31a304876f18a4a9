// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/cursor.rs - Forward-only byte reader for s3g/x3g streams.
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

use crate::error::DecodeError;

/// A forward-reading view over a byte slice.
///
/// Offsets reported by the cursor (and by the errors it returns) are absolute
/// positions in the full input, even for sub-views created with
/// [ByteCursor::split].
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// The absolute offset of the next byte to be read.
    pub fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Number of bytes left in this view.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads exactly `width` bytes.
    pub fn read_fixed(&mut self, width: usize) -> Result<&'a [u8], DecodeError> {
        if width > self.remaining() {
            return Err(DecodeError::TruncatedStream {
                offset: self.offset(),
                needed: width,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + width];
        self.pos += width;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_fixed(1)?[0])
    }

    /// Reads a NUL-terminated string of at most `max_len` bytes, consuming the
    /// terminator.
    ///
    /// Fails with [DecodeError::TruncatedStream] if the view ends first, or
    /// with [DecodeError::UnterminatedString] if `max_len` bytes go by without
    /// a terminator.
    pub fn read_until_zero(&mut self, max_len: usize) -> Result<String, DecodeError> {
        let rest = &self.data[self.pos..];
        let window = &rest[..rest.len().min(max_len.saturating_add(1))];

        match window.iter().position(|&b| b == 0) {
            Some(len) => {
                let text = String::from_utf8_lossy(&window[..len]).to_string();
                self.pos += len + 1;
                Ok(text)
            }
            None if rest.len() <= max_len => Err(DecodeError::TruncatedStream {
                offset: self.offset(),
                needed: rest.len() + 1,
                available: rest.len(),
            }),
            None => Err(DecodeError::UnterminatedString {
                offset: self.offset(),
                max_len,
            }),
        }
    }

    /// Steps back over the last `n` bytes read.
    ///
    /// Only the framed packet parser does this, to re-read the bytes it has
    /// just checksummed. Rewinding past the start of the view panics.
    pub fn rewind(&mut self, n: usize) {
        assert!(n <= self.pos, "rewind past start of view");
        self.pos -= n;
    }

    /// Splits off a view of the next `len` bytes and advances past them.
    pub fn split(&mut self, len: usize) -> Result<ByteCursor<'a>, DecodeError> {
        let base = self.offset();
        let data = self.read_fixed(len)?;
        Ok(ByteCursor { data, pos: 0, base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fixed_tracks_offset() {
        let data = [1, 2, 3, 4, 5];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 1);
        assert_eq!(cursor.read_fixed(3).unwrap(), &[2, 3, 4]);
        assert_eq!(cursor.offset(), 4);
        assert_eq!(cursor.remaining(), 1);

        let err = cursor.read_fixed(2).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedStream {
                offset: 4,
                needed: 2,
                available: 1
            }
        );
        // A failed read consumes nothing
        assert_eq!(cursor.offset(), 4);
    }

    #[test]
    fn test_read_until_zero() {
        let data = b"PLA\0rest";
        let mut cursor = ByteCursor::new(data);
        assert_eq!(cursor.read_until_zero(16).unwrap(), "PLA");
        assert_eq!(cursor.offset(), 4);

        // Exactly max_len bytes before the terminator is still fine
        let mut cursor = ByteCursor::new(b"abcd\0");
        assert_eq!(cursor.read_until_zero(4).unwrap(), "abcd");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_read_until_zero_failures() {
        let mut cursor = ByteCursor::new(b"abcdef\0");
        assert_eq!(
            cursor.read_until_zero(4).unwrap_err(),
            DecodeError::UnterminatedString {
                offset: 0,
                max_len: 4
            }
        );

        let mut cursor = ByteCursor::new(b"abc");
        assert_eq!(
            cursor.read_until_zero(16).unwrap_err(),
            DecodeError::TruncatedStream {
                offset: 0,
                needed: 4,
                available: 3
            }
        );
    }

    #[test]
    fn test_split_keeps_absolute_offsets() {
        let data = [0xd5, 2, 0x89, 0x01, 0xc3, 0x03];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_fixed(2).unwrap();

        let mut view = cursor.split(2).unwrap();
        assert_eq!(cursor.offset(), 4);
        assert_eq!(view.offset(), 2);
        assert_eq!(view.read_u8().unwrap(), 0x89);
        assert_eq!(
            view.read_fixed(2).unwrap_err(),
            DecodeError::TruncatedStream {
                offset: 3,
                needed: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_rewind() {
        let data = [7, 8, 9];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_fixed(3).unwrap();
        cursor.rewind(2);
        assert_eq!(cursor.offset(), 1);
        assert_eq!(cursor.read_u8().unwrap(), 8);
    }

    #[test]
    #[should_panic]
    fn test_rewind_past_start() {
        let data = [7, 8, 9];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u8().unwrap();
        cursor.rewind(2);
    }
}
