// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/format.rs - Render templates for decoded s3g/x3g commands.
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
 * # `format` Module
 *
 * Expands printf-style render templates against the values of a decoded
 * command.
 *
 * `%%` is a literal percent sign. Every other `%<letter>` consumes the next
 * value:
 *
 * | Directive | Output |
 * |-----------|--------|
 * | `%a` | Axis bitmask as a comma-separated list of axis letters |
 * | `%A` | Like `%a`, prefixed by one of two words selected by bit 7 |
 * | `%b` | Axis index (0-4) as a single axis letter |
 * | `%O` | `on` if the value is nonzero, otherwise `off` |
 * | `%i`, `%d`, `%u` | Decimal integer |
 * | `%x`, `%X` | Hexadecimal integer |
 * | `%f` | Float with six decimal places |
 * | `%s` and anything else | The value's plain text |
 */

use std::fmt::Write;

use crate::value::Value;

/// Axis letters, in bitmask order.
pub const AXES: [char; 5] = ['X', 'Y', 'Z', 'A', 'B'];

/// Renders `template` with `args`.
///
/// `words` supplies the two words used by `%A`: the first when bit 7 of the
/// mask is set, the second when it is clear.
pub fn expand(template: &str, args: &[Value], words: Option<[&str; 2]>) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut args = args.iter();
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None | Some('%') => out.push('%'),
            Some(directive) => match args.next() {
                Some(value) => render(&mut out, directive, value, words),
                None => out.push('?'),
            },
        }
    }

    out
}

fn render(out: &mut String, directive: char, value: &Value, words: Option<[&str; 2]>) {
    match directive {
        'a' => out.push_str(&axis_list(value.as_int())),
        'A' => {
            let mask = value.as_int();
            if let Some([set, clear]) = words {
                out.push_str(if mask & 0x80 != 0 { set } else { clear });
            }
            let axes = axis_list(mask);
            if !axes.is_empty() {
                if words.is_some() {
                    out.push(' ');
                }
                out.push_str(&axes);
            }
        }
        'b' => match usize::try_from(value.as_int()).ok().and_then(|i| AXES.get(i)) {
            Some(axis) => out.push(*axis),
            None => out.push('?'),
        },
        'O' => out.push_str(if value.is_nonzero() { "on" } else { "off" }),
        'i' | 'd' | 'u' => match value {
            Value::Str(_) | Value::Bytes(_) => {
                let _ = write!(out, "{}", value);
            }
            _ => {
                let _ = write!(out, "{}", value.as_int());
            }
        },
        'x' | 'X' => {
            let n = value.as_int();
            let sign = if n < 0 { "-" } else { "" };
            let _ = if directive == 'x' {
                write!(out, "{}{:x}", sign, n.unsigned_abs())
            } else {
                write!(out, "{}{:X}", sign, n.unsigned_abs())
            };
        }
        'f' | 'F' => {
            let _ = write!(out, "{:.6}", value.as_float());
        }
        _ => {
            let _ = write!(out, "{}", value);
        }
    }
}

fn axis_list(mask: i64) -> String {
    let mut axes = String::new();
    for (bit, axis) in AXES.iter().enumerate() {
        if mask & (1 << bit) != 0 {
            if !axes.is_empty() {
                axes.push(',');
            }
            axes.push(*axis);
        }
    }
    axes
}

/// Number of values a template consumes.
pub fn directive_count(template: &str) -> usize {
    let mut count = 0;
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.next() {
                None | Some('%') => (),
                Some(_) => count += 1,
            }
        }
    }
    count
}
