// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/registry.rs - Opcode tables for s3g/x3g commands.
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
 * # `registry` Module
 *
 * The opcode tables that drive decoding. There are three independent
 * namespaces:
 *
 * 1. Top-level commands, looked up for every record in the stream.
 * 2. Tool actions, nested inside command 136.
 * 3. Tool queries, nested inside command 10.
 *
 * Each table is indexed at compile time, so lookups are a single array access
 * and a duplicate opcode is a build error.
 */

use crate::error::TableKind;
use crate::value::Field::{self, F32, I16, I32, U8, U16, U32};

/// Parsers for commands whose payload is not a fixed sequence of fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubParser {
    /// Tool index, action opcode, length-prefixed payload.
    ToolAction,
    /// Tool index, query opcode, length-prefixed payload.
    ToolQuery,
    /// Options, position and timeout, then a NUL-terminated message.
    DisplayMessage,
    /// Step count, then a NUL-terminated build name.
    BuildStart,
    /// A NUL-terminated file name.
    Filename,
    /// EEPROM offset, length, then that many data bytes.
    EepromWrite,
    /// A CRC8-checked envelope around one inner command.
    Framed,
}

/// How a command's payload is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Fixed(&'static [Field]),
    Custom(SubParser),
}

/// How a decoded command is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    Template(&'static str),
    /// A template using `%A`, with the words for bit 7 set and clear.
    Switch(&'static str, [&'static str; 2]),
    /// A prefix template followed by the text of the nested command.
    Nested(&'static str),
}

impl Render {
    pub fn template(&self) -> &'static str {
        match self {
            Render::Template(t) | Render::Switch(t, _) | Render::Nested(t) => *t,
        }
    }

    pub fn words(&self) -> Option<[&'static str; 2]> {
        match self {
            Render::Switch(_, words) => Some(*words),
            _ => None,
        }
    }
}

/// Describes one opcode of a table.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub opcode: u8,
    pub name: &'static str,
    pub layout: Layout,
    pub render: Render,
}

const fn fixed(
    opcode: u8,
    name: &'static str,
    fields: &'static [Field],
    template: &'static str,
) -> CommandSpec {
    CommandSpec {
        opcode,
        name,
        layout: Layout::Fixed(fields),
        render: Render::Template(template),
    }
}

const fn custom(opcode: u8, name: &'static str, parser: SubParser, render: Render) -> CommandSpec {
    CommandSpec {
        opcode,
        name,
        layout: Layout::Custom(parser),
        render,
    }
}

/// An opcode table with constant-time lookup.
#[derive(Debug)]
pub struct Table {
    kind: TableKind,
    specs: &'static [CommandSpec],
    slots: [Option<&'static CommandSpec>; 256],
}

impl Table {
    /// Indexes `specs` by opcode. Panics (at compile time, when used in a
    /// constant) if an opcode appears twice.
    ///
    /// The decoder only understands fixed layouts in the tool action and tool
    /// query tables; other entries there are treated as unrecognized.
    pub const fn new(kind: TableKind, specs: &'static [CommandSpec]) -> Self {
        let mut slots: [Option<&'static CommandSpec>; 256] = [None; 256];
        let mut i = 0;
        while i < specs.len() {
            let opcode = specs[i].opcode as usize;
            if slots[opcode].is_some() {
                panic!("duplicate opcode in table");
            }
            slots[opcode] = Some(&specs[i]);
            i += 1;
        }
        Self { kind, specs, slots }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn get(&self, opcode: u8) -> Option<&'static CommandSpec> {
        self.slots[usize::from(opcode)]
    }

    /// All entries, in declaration order.
    pub fn specs(&self) -> &'static [CommandSpec] {
        self.specs
    }
}

/// The three opcode tables used by the decoder.
#[derive(Debug)]
pub struct OpcodeRegistry {
    pub commands: Table,
    pub tool_actions: Table,
    pub tool_queries: Table,
}

impl OpcodeRegistry {
    /// The registry for the s3g/x3g protocol as understood by MakerBot and
    /// Sailfish firmware.
    pub fn standard() -> &'static OpcodeRegistry {
        &STANDARD
    }

    pub fn table(&self, kind: TableKind) -> &Table {
        match kind {
            TableKind::Command => &self.commands,
            TableKind::ToolAction => &self.tool_actions,
            TableKind::ToolQuery => &self.tool_queries,
        }
    }
}

static STANDARD: OpcodeRegistry = OpcodeRegistry {
    commands: Table::new(TableKind::Command, COMMANDS),
    tool_actions: Table::new(TableKind::ToolAction, TOOL_ACTIONS),
    tool_queries: Table::new(TableKind::ToolQuery, TOOL_QUERIES),
};

/// Opcode of the tool action command.
pub const TOOL_ACTION: u8 = 136;
/// Opcode of the tool query command.
pub const TOOL_QUERY: u8 = 10;
/// Opcode of a CRC8-framed packet (the 0xD5 sync byte).
pub const FRAMED_PACKET: u8 = 213;

const COMMANDS: &[CommandSpec] = &[
    // Host queries and control
    fixed(0, "get version", &[U16], "(0) Get version, host version %i"),
    fixed(1, "initialize", &[], "(1) Initialize firmware to boot state"),
    fixed(2, "get buffer size", &[], "(2) Get available buffer size"),
    fixed(3, "clear buffer", &[], "(3) Clear buffer"),
    fixed(7, "abort", &[], "(7) Abort immediately"),
    fixed(8, "pause", &[], "(8) Pause/resume"),
    custom(
        TOOL_QUERY,
        "tool query",
        SubParser::ToolQuery,
        Render::Nested("(10) Tool %i query:"),
    ),
    fixed(11, "is ready", &[], "(11) Is ready"),
    fixed(
        12,
        "read eeprom",
        &[U16, U8],
        "(12) Read from EEPROM, offset %i, length %i",
    ),
    custom(
        13,
        "write eeprom",
        SubParser::EepromWrite,
        Render::Template("(13) Write to EEPROM, offset %i, length %i, data %s"),
    ),
    custom(
        14,
        "capture to file",
        SubParser::Filename,
        Render::Template("(14) Capture to file \"%s\""),
    ),
    fixed(15, "end capture", &[], "(15) End capture to file"),
    custom(
        16,
        "play back capture",
        SubParser::Filename,
        Render::Template("(16) Play back capture \"%s\""),
    ),
    fixed(17, "reset", &[], "(17) Reset"),
    fixed(18, "get next filename", &[U8], "(18) Get next filename, restart %O"),
    fixed(20, "get build name", &[], "(20) Get build name"),
    fixed(21, "get position", &[], "(21) Get extended position"),
    fixed(22, "extended stop", &[U8], "(22) Extended stop, flags 0x%X"),
    fixed(23, "get board status", &[], "(23) Get motherboard status"),
    fixed(24, "get build stats", &[], "(24) Get build statistics"),
    fixed(
        27,
        "get advanced version",
        &[U16],
        "(27) Get advanced version, host version %i",
    ),
    // Motion and machine state
    fixed(
        129,
        "absolute move",
        &[I32, I32, I32, U32],
        "(129) Absolute move to (%i,%i,%i) at DDA %i",
    ),
    fixed(
        130,
        "define position",
        &[I32, I32, I32],
        "(130) Define machine position as (%i,%i,%i)",
    ),
    fixed(
        131,
        "home minimum",
        &[U8, U32, U16],
        "(131) Home minimum on axes %a, feedrate %i, timeout %i s",
    ),
    fixed(
        132,
        "home maximum",
        &[U8, U32, U16],
        "(132) Home maximum on axes %a, feedrate %i, timeout %i s",
    ),
    fixed(133, "dwell", &[U32], "(133) Dwell for %i microseconds"),
    fixed(134, "change tool", &[U8], "(134) Change to tool %i"),
    fixed(
        135,
        "wait for tool",
        &[U8, U16, U16],
        "(135) Wait until tool %i is ready, %i ms between polls, %i s timeout",
    ),
    custom(
        TOOL_ACTION,
        "tool action",
        SubParser::ToolAction,
        Render::Nested("(136) Tool %i:"),
    ),
    CommandSpec {
        opcode: 137,
        name: "toggle steppers",
        layout: Layout::Fixed(&[U8]),
        render: Render::Switch("(137) %A stepper motors", ["Enable", "Disable"]),
    },
    fixed(138, "wait for user", &[U16], "(138) Wait on user response, option %i"),
    fixed(
        139,
        "absolute move (5 axis)",
        &[I32, I32, I32, I32, I32, U32],
        "(139) Absolute move to (%i,%i,%i,%i,%i) at DDA %i",
    ),
    fixed(
        140,
        "define position (5 axis)",
        &[I32, I32, I32, I32, I32],
        "(140) Define position as (%i,%i,%i,%i,%i)",
    ),
    fixed(
        141,
        "wait for platform",
        &[U8, U16, U16],
        "(141) Wait until platform %i is ready, %i ms between polls, %i s timeout",
    ),
    fixed(
        142,
        "timed move",
        &[I32, I32, I32, I32, I32, U32, U8],
        "(142) Move to (%i,%i,%i,%i,%i) in %i us, relative axes %a",
    ),
    fixed(
        143,
        "store home",
        &[U8],
        "(143) Store home position for axes %a",
    ),
    fixed(
        144,
        "recall home",
        &[U8],
        "(144) Recall home position for axes %a",
    ),
    fixed(
        145,
        "set digipot",
        &[U8, U8],
        "(145) Set digital potentiometer for axis %b to %i",
    ),
    // Peripherals
    fixed(
        146,
        "set rgb led",
        &[U8, U8, U8, U8, U8],
        "(146) Set RGB LED red %i, green %i, blue %i, blink rate %i, effect %i",
    ),
    fixed(
        147,
        "set buzzer",
        &[U16, U16, U8],
        "(147) Set buzzer, frequency %i, length %i, effect %i",
    ),
    fixed(
        148,
        "pause for button",
        &[U8, U16, U8],
        "(148) Pause for button 0x%X, timeout %i s, timeout behavior %i",
    ),
    custom(
        149,
        "display message",
        SubParser::DisplayMessage,
        Render::Template(
            "(149) Display message, options 0x%X at %i,%i timeout %i s, message \"%s\"",
        ),
    ),
    // Build lifecycle
    fixed(
        150,
        "set build percentage",
        &[U8, U8],
        "(150) Set build percentage %i%%, ignore %i",
    ),
    fixed(151, "queue song", &[U8], "(151) Queue song %i"),
    fixed(
        152,
        "factory reset",
        &[U8],
        "(152) Reset to factory defaults, options 0x%X",
    ),
    custom(
        153,
        "build start",
        SubParser::BuildStart,
        Render::Template("(153) Start build notification, steps %i, name \"%s\""),
    ),
    fixed(
        154,
        "build end",
        &[U8],
        "(154) End build notification, flags 0x%X",
    ),
    fixed(
        155,
        "x3g move",
        &[I32, I32, I32, I32, I32, U32, U8, F32, I16],
        "(155) Move to (%i,%i,%i,%i,%i), DDA rate %i, relative axes %a, distance %f, feedrate x64 %i",
    ),
    fixed(156, "set acceleration", &[U8], "(156) Set acceleration %O"),
    fixed(
        157,
        "stream version",
        &[U8, U8, U8, U32, U16, U16, U32, U32, U8],
        "(157) Stream version %i.%i, %i, %i, %i, %i, %i, %i, %i",
    ),
    fixed(158, "pause at z", &[F32], "(158) Pause at Z position %f"),
    custom(
        FRAMED_PACKET,
        "framed packet",
        SubParser::Framed,
        Render::Nested(""),
    ),
];

const TOOL_ACTIONS: &[CommandSpec] = &[
    fixed(1, "initialize", &[], "(1) Initialize firmware to boot state"),
    fixed(3, "set temperature", &[U16], "(3) Set target temperature to %i C"),
    fixed(4, "motor 1 pwm", &[U8], "(4) Motor 1: set speed (PWM) %i"),
    fixed(5, "motor 2 pwm", &[U8], "(5) Motor 2: set speed (PWM) %i"),
    fixed(6, "motor 1 rpm", &[U32], "(6) Motor 1: set speed (RPM) %i"),
    fixed(7, "motor 2 rpm", &[U32], "(7) Motor 2: set speed (RPM) %i"),
    fixed(8, "motor 1 direction", &[U32], "(8) Motor 1: set direction %i"),
    fixed(9, "motor 2 direction", &[U32], "(9) Motor 2: set direction %i"),
    fixed(10, "motor 1 toggle", &[U8], "(10) Motor 1: toggle %i"),
    fixed(11, "motor 2 toggle", &[U8], "(11) Motor 2: toggle %i"),
    fixed(12, "cooling fan", &[U8], "(12) Toggle cooling fan %O"),
    fixed(13, "blower fan", &[U8], "(13) Toggle blower fan %O"),
    fixed(14, "servo 1", &[U8], "(14) Servo 1: angle %i"),
    fixed(15, "servo 2", &[U8], "(15) Servo 2: angle %i"),
    fixed(27, "build platform", &[U8], "(27) Automated build platform %O"),
    fixed(
        31,
        "set platform temperature",
        &[U16],
        "(31) Set build platform temperature to %i C",
    ),
];

const TOOL_QUERIES: &[CommandSpec] = &[
    fixed(0, "get version", &[U16], "(0) Get version, host version %i"),
    fixed(2, "get temperature", &[], "(2) Get temperature"),
    fixed(22, "is ready", &[], "(22) Is tool ready"),
    fixed(
        25,
        "read eeprom",
        &[U16, U8],
        "(25) Read from EEPROM, offset %i, length %i",
    ),
    fixed(30, "get platform temperature", &[], "(30) Get build platform temperature"),
    fixed(32, "get target temperature", &[], "(32) Get target temperature"),
    fixed(
        33,
        "get platform target temperature",
        &[],
        "(33) Get build platform target temperature",
    ),
    fixed(35, "is platform ready", &[], "(35) Is build platform ready"),
    fixed(36, "get status", &[], "(36) Get tool status"),
    fixed(37, "get pid state", &[], "(37) Get PID state"),
];
