// Dervish validator
//
//  Copyright (C) 2014-2022 Ryan Specialty Group, LLC.
//
//  This file is part of Dervish.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Validate XML documents against a RELAX NG schema.
//!
//! Each validity error is reported as it is encountered,
//!   and validation continues to the end of each document.
//! The exit status is `0` only if every document is valid.

extern crate dervish;

use dervish::{
    datatype::StdDatatypes,
    diagnose::{
        AnnotatedSpan, Diagnostic, FsSpanResolver, Reporter, VisualReporter,
    },
    grammar::Grammar,
    schema::{self, SchemaError},
    span::Context,
    sym::GlobalSymbolIntern,
    validate::{validate, Error as ValidateError},
    xir::XmlXirReader,
};
use getopts::{Fail, Options};
use std::{
    env,
    error::Error,
    fmt::{self, Display},
    fs::File,
    io::{self, BufReader},
};

/// Types of commands
enum Command {
    Validate {
        schema: String,
        docs: Vec<String>,
        quiet: bool,
    },
    Usage,
}

/// Open `path` for reading,
///   producing the [`Context`] of its spans.
fn open(path: &str) -> Result<(BufReader<File>, Context), DervishError> {
    let file = File::open(path)
        .map_err(|e| DervishError::Io(path.to_string(), e))?;

    Ok((BufReader::new(file), path.intern().into()))
}

fn load_schema(path: &str) -> Result<Grammar, DervishError> {
    let (reader, ctx) = open(path)?;
    Ok(schema::load(reader, ctx, &StdDatatypes)?)
}

/// Validate the document at `path`,
///   reporting each validity error unless `quiet`.
///
/// Produces the number of validity errors.
fn validate_doc<R: Reporter>(
    grammar: &Grammar,
    path: &str,
    reporter: &mut R,
    quiet: bool,
) -> Result<usize, DervishError> {
    let (reader, ctx) = open(path)?;
    let mut count = 0;

    validate(grammar, XmlXirReader::new(reader, ctx), |e| {
        count += 1;

        if !quiet {
            // Rendering to a string first keeps each report whole.
            let report = reporter.render(&e).to_string();
            println!("{report}");
        }
    })?;

    Ok(count)
}

/// Entrypoint for the validator
pub fn main() {
    let args: Vec<String> = env::args().collect();
    let program = &args[0];
    let opts = get_opts();
    let usage = opts.usage(&format!(
        "Usage: {program} [OPTIONS] SCHEMA DOCUMENT..."
    ));

    match parse_options(opts, args) {
        Ok(Command::Validate {
            schema,
            docs,
            quiet,
        }) => std::process::exit(run(&schema, &docs, quiet)),
        Ok(Command::Usage) => {
            println!("{usage}");
            std::process::exit(exitcode::OK);
        }
        Err(e) => {
            eprintln!("{e}");
            println!("{usage}");
            std::process::exit(exitcode::USAGE);
        }
    }
}

/// Validate each of `docs` against `schema_path`,
///   producing the exit status.
fn run(schema_path: &str, docs: &[String], quiet: bool) -> i32 {
    let mut reporter = VisualReporter::new(FsSpanResolver);

    let grammar = match load_schema(schema_path) {
        Ok(grammar) => grammar,
        Err(e) => {
            let report = reporter.render(&e).to_string();
            eprintln!("{report}\nfatal: failed to load schema `{schema_path}`");
            return 1;
        }
    };

    let mut failed = 0;

    for doc in docs {
        match validate_doc(&grammar, doc, &mut reporter, quiet) {
            Ok(0) => (),
            Ok(count) => {
                failed += 1;
                eprintln!(
                    "error: `{doc}` is invalid due to {count} error(s)"
                );
            }
            Err(e) => {
                failed += 1;
                let report = reporter.render(&e).to_string();
                eprintln!("{report}\nfatal: failed to validate `{doc}`");
            }
        }
    }

    if failed > 0 {
        1
    } else {
        exitcode::OK
    }
}

/// Get 'Options'
fn get_opts() -> Options {
    let mut opts = Options::new();
    opts.optflag("q", "quiet", "do not report individual errors");
    opts.optflag("h", "help", "print this help menu");

    opts
}

/// Option parser
fn parse_options(opts: Options, args: Vec<String>) -> Result<Command, Fail> {
    let matches = opts.parse(&args[1..])?;

    if matches.opt_present("h") {
        return Ok(Command::Usage);
    }

    let quiet = matches.opt_present("q");
    let mut free = matches.free.into_iter();

    let schema = free
        .next()
        .ok_or_else(|| Fail::OptionMissing(String::from("SCHEMA")))?;

    let docs = free.collect::<Vec<_>>();

    if docs.is_empty() {
        return Err(Fail::OptionMissing(String::from("DOCUMENT")));
    }

    Ok(Command::Validate {
        schema,
        docs,
        quiet,
    })
}

/// Validator (`dervish`) error.
///
/// This represents the aggregation of all errors that prevent a schema or
///   document from being read to completion.
/// Validity errors are not included;
///   they are reported as they are encountered.
#[derive(Debug)]
pub enum DervishError {
    /// A file could not be opened.
    Io(String, io::Error),
    Schema(SchemaError),
    Validate(ValidateError),
}

impl From<SchemaError> for DervishError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

impl From<ValidateError> for DervishError {
    fn from(e: ValidateError) -> Self {
        Self::Validate(e)
    }
}

impl Display for DervishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "{path}: {e}"),
            Self::Schema(e) => Display::fmt(e, f),
            Self::Validate(e) => Display::fmt(e, f),
        }
    }
}

impl Error for DervishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Schema(e) => Some(e),
            Self::Validate(e) => Some(e),
        }
    }
}

impl Diagnostic for DervishError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::Schema(e) => e.describe(),
            Self::Validate(e) => e.describe(),

            // Falls back to rendering just the error `Display`.
            Self::Io(..) => vec![],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(args: &[&str]) -> Vec<String> {
        std::iter::once("program")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parse_options_help() {
        match parse_options(get_opts(), args(&["-h"])) {
            Ok(Command::Usage) => {}
            _ => panic!("Help option did not parse"),
        }
    }

    #[test]
    fn parse_options_help_long() {
        match parse_options(get_opts(), args(&["--help"])) {
            Ok(Command::Usage) => {}
            _ => panic!("Long help option did not parse"),
        }
    }

    #[test]
    fn parse_options_invalid() {
        match parse_options(get_opts(), args(&["--foo"])) {
            Err(Fail::UnrecognizedOption(_)) => {}
            _ => panic!("Invalid option not caught"),
        }
    }

    #[test]
    fn parse_options_missing_schema() {
        match parse_options(get_opts(), args(&[])) {
            Err(Fail::OptionMissing(opt)) => assert_eq!("SCHEMA", opt),
            _ => panic!("Missing schema not caught"),
        }
    }

    #[test]
    fn parse_options_missing_document() {
        match parse_options(get_opts(), args(&["schema.rng"])) {
            Err(Fail::OptionMissing(opt)) => assert_eq!("DOCUMENT", opt),
            _ => panic!("Missing document not caught"),
        }
    }

    #[test]
    fn parse_options_multiple_documents() {
        match parse_options(get_opts(), args(&["-q", "s.rng", "a", "b"])) {
            Ok(Command::Validate {
                schema,
                docs,
                quiet,
            }) => {
                assert_eq!("s.rng", schema);
                assert_eq!(vec!["a", "b"], docs);
                assert!(quiet);
            }
            _ => panic!("Validate command did not parse"),
        }
    }

    #[test]
    fn parse_options_quiet_is_optional() {
        match parse_options(get_opts(), args(&["s.rng", "a"])) {
            Ok(Command::Validate { quiet, .. }) => assert!(!quiet),
            _ => panic!("Validate command did not parse"),
        }
    }
}
