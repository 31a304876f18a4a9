// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/main.rs - Command-line disassembler for s3g and x3g files.
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

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use s3g_decompiler::decoder::*;
use s3g_decompiler::listing::{Listing, ListingFormat};
use s3g_decompiler::registry::OpcodeRegistry;
use s3g_decompiler::source;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The s3g or x3g file to read.
    file: String,

    /// Show the byte offset of each command.
    #[arg(short, long)]
    offsets: bool,

    /// Skip unrecognized opcodes instead of stopping. Commands after a
    /// skipped top-level opcode may be decoded from the wrong offsets.
    #[arg(short, long)]
    permissive: bool,

    /// Write the listing as CSV.
    #[arg(long)]
    csv: bool,

    /// Longest string (in bytes) to accept in a command.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_STRING_LEN)]
    max_string: usize,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let data = match source::from_filename(&args.file) {
        Ok(data) => data,
        Err(error) => {
            eprintln!("Error opening file {:?}: {}", &args.file, error);
            return ExitCode::FAILURE;
        }
    };

    let options = DecoderOptions {
        max_string_len: args.max_string,
        unknown_opcodes: if args.permissive {
            UnknownOpcodePolicy::Skip
        } else {
            UnknownOpcodePolicy::Abort
        },
    };
    let format = if args.csv {
        ListingFormat::Csv
    } else {
        ListingFormat::Text
    };

    let mut listing = match Listing::new(io::stdout().lock(), format, args.offsets) {
        Ok(listing) => listing,
        Err(error) => {
            eprintln!("Error writing listing: {}", error);
            return ExitCode::FAILURE;
        }
    };

    let decoder = CommandDecoder::with_options(&data, OpcodeRegistry::standard(), options);
    let mut failure = None;
    for command in decoder {
        let command = match command {
            Ok(command) => command,
            Err(error) => {
                failure = Some(error);
                break;
            }
        };
        if let Err(error) = listing.write_command(&command) {
            eprintln!("Error writing listing: {}", error);
            return ExitCode::FAILURE;
        }
    }

    // Everything decoded before a failure still gets printed
    if let Err(error) = listing.finish() {
        eprintln!("Error writing listing: {}", error);
        return ExitCode::FAILURE;
    }

    match failure {
        Some(error) => {
            eprintln!("Error decoding file {:?}: {}", &args.file, error);
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}
