//! A Parser for Proguard Mapping Files.
//!
//! The mapping file format is described
//! [here](https://www.guardsquare.com/en/products/proguard/manual/retrace).
//!
//! Parsing is lenient: every line is classified on its own as
//! either a class line (`original -> obfuscated:`) or a member line, and
//! anything that is neither is skipped. Only faults that indicate a broken
//! file, such as I/O errors or line numbers that do not fit into a `usize`,
//! are reported as errors.

use std::io::{self, BufRead};
use std::num::ParseIntError;

use log::trace;
use thiserror::Error;

/// An unexpected fault while parsing a single mapping line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid line number `{number}` in line range")]
pub struct ParseError {
    number: String,
    #[source]
    source: ParseIntError,
}

impl ParseError {
    /// The line number text that failed to parse.
    pub fn number(&self) -> &str {
        &self.number
    }
}

/// Errors that abort loading a mapping file.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The mapping source could not be opened or read.
    #[error("failed to read mapping")]
    Io(#[from] io::Error),
    /// A mapping line contained an unexpected fault.
    #[error("failed to parse mapping line {line}")]
    Parse {
        /// The 1-based line number of the offending line.
        line: usize,
        /// The underlying fault.
        #[source]
        source: ParseError,
    },
}

/// A proguard line range.
///
/// Covers the start/end lines of the obfuscated method body, 1-based and
/// inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineMapping {
    /// Start Line, 1-based.
    pub startline: usize,
    /// End Line, inclusive.
    pub endline: usize,
}

/// A Proguard Mapping Record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProguardRecord<'s> {
    /// A Class Mapping.
    Class {
        /// Original name of the class.
        original: &'s str,
        /// Obfuscated name of the class.
        obfuscated: &'s str,
    },
    /// A Field Mapping.
    Field {
        /// Type of the field
        ty: &'s str,
        /// Original name of the field.
        original: &'s str,
        /// Obfuscated name of the field.
        obfuscated: &'s str,
    },
    /// A Method Mapping.
    Method {
        /// Return Type of the method.
        ty: &'s str,
        /// Original name of the method.
        original: &'s str,
        /// Obfuscated name of the method.
        obfuscated: &'s str,
        /// Arguments of the method as raw string.
        arguments: &'s str,
        /// Optional line range of the method.
        line_mapping: Option<LineMapping>,
    },
}

impl<'s> ProguardRecord<'s> {
    /// Parses a line from a proguard mapping file.
    ///
    /// Returns `Ok(None)` for lines that are neither a class nor a member
    /// declaration, including blank lines and `#` comments.
    ///
    /// # Examples
    ///
    /// ```
    /// use proguard_retrace::{LineMapping, ProguardRecord};
    ///
    /// // Class Mappings
    /// let parsed =
    ///     ProguardRecord::try_parse("android.arch.core.executor.ArchTaskExecutor -> a.a.a.a.c:");
    /// assert_eq!(
    ///     parsed,
    ///     Ok(Some(ProguardRecord::Class {
    ///         original: "android.arch.core.executor.ArchTaskExecutor",
    ///         obfuscated: "a.a.a.a.c"
    ///     }))
    /// );
    ///
    /// // Field
    /// let parsed = ProguardRecord::try_parse(
    ///     "    android.arch.core.executor.ArchTaskExecutor sInstance -> a",
    /// );
    /// assert_eq!(
    ///     parsed,
    ///     Ok(Some(ProguardRecord::Field {
    ///         ty: "android.arch.core.executor.ArchTaskExecutor",
    ///         original: "sInstance",
    ///         obfuscated: "a",
    ///     }))
    /// );
    ///
    /// // Method with line range
    /// let parsed = ProguardRecord::try_parse(
    ///     "    13:13:java.util.Map$Entry eldest():168:168 -> a",
    /// );
    /// assert_eq!(
    ///     parsed,
    ///     Ok(Some(ProguardRecord::Method {
    ///         ty: "java.util.Map$Entry",
    ///         original: "eldest",
    ///         obfuscated: "a",
    ///         arguments: "",
    ///         line_mapping: Some(LineMapping {
    ///             startline: 13,
    ///             endline: 13,
    ///         }),
    ///     }))
    /// );
    ///
    /// // Garbage
    /// assert_eq!(ProguardRecord::try_parse("    void broken() a"), Ok(None));
    /// ```
    pub fn try_parse(line: &'s str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            Ok(None)
        } else if line.ends_with(':') {
            Ok(parse_proguard_class(line))
        } else {
            parse_proguard_field_or_method(line)
        }
    }
}

/// Parses a single Proguard Class line.
fn parse_proguard_class(line: &str) -> Option<ProguardRecord<'_>> {
    // class line:
    // `originalclassname -> obfuscatedclassname:`
    let (original, rest) = line.split_once("->")?;
    let (obfuscated, _) = rest.split_once(':')?;

    let original = original.trim();
    let obfuscated = obfuscated.trim();
    if original.is_empty() || obfuscated.is_empty() {
        return None;
    }

    Some(ProguardRecord::Class {
        original,
        obfuscated,
    })
}

/// Parses a single Proguard Field or Method line.
fn parse_proguard_field_or_method(line: &str) -> Result<Option<ProguardRecord<'_>>, ParseError> {
    // field line or method line:
    // `originalfieldtype originalfieldname -> obfuscatedfieldname`
    // `[startline:endline:]originalreturntype originalmethodname(originalargumenttype,...)[:originalstartline[:originalendline]] -> obfuscatedmethodname`
    let (line_mapping, rest) = parse_line_mapping(line)?;

    let Some((ty, rest)) = rest.trim_start().split_once(' ') else {
        return Ok(None);
    };
    let Some((declaration, obfuscated)) = rest.split_once("->") else {
        return Ok(None);
    };

    let ty = ty.trim();
    let obfuscated = obfuscated.trim();

    let (original, arguments) = match declaration.split_once('(') {
        Some((original, rest)) => match rest.split_once(')') {
            Some((arguments, _)) => (original.trim(), Some(arguments.trim())),
            None => return Ok(None),
        },
        None => (declaration.trim(), None),
    };

    if ty.is_empty() || original.is_empty() || obfuscated.is_empty() {
        return Ok(None);
    }

    let record = match arguments {
        Some(arguments) => ProguardRecord::Method {
            ty,
            original,
            obfuscated,
            arguments,
            line_mapping,
        },
        None => ProguardRecord::Field {
            ty,
            original,
            obfuscated,
        },
    };

    Ok(Some(record))
}

/// Splits off an optional `startline:endline:` prefix.
///
/// The prefix is only recognized when both parts are decimal numbers.
fn parse_line_mapping(line: &str) -> Result<(Option<LineMapping>, &str), ParseError> {
    let mut parts = line.splitn(3, ':');
    let (Some(start), Some(end), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        return Ok((None, line));
    };

    if !is_number(start) || !is_number(end) {
        return Ok((None, line));
    }

    let line_mapping = LineMapping {
        startline: parse_usize(start)?,
        endline: parse_usize(end)?,
    };

    Ok((Some(line_mapping), rest))
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit())
}

fn parse_usize(s: &str) -> Result<usize, ParseError> {
    s.parse().map_err(|source| ParseError {
        number: s.to_owned(),
        source,
    })
}

/// Receives the declarations of a mapping file, in file order.
///
/// Member declarations are always reported together with the *original* name
/// of the class line that precedes them.
pub trait MappingProcessor {
    /// Processes a class mapping.
    ///
    /// Returning `false` skips all member lines up to the next class line.
    fn process_class_mapping(&mut self, original: &str, obfuscated: &str) -> bool;

    /// Processes a field mapping of `class`.
    fn process_field_mapping(&mut self, class: &str, ty: &str, original: &str, obfuscated: &str);

    /// Processes a method mapping of `class`.
    fn process_method_mapping(
        &mut self,
        class: &str,
        ty: &str,
        original: &str,
        arguments: &str,
        obfuscated: &str,
        line_mapping: Option<LineMapping>,
    );
}

/// Reads a complete mapping file line by line, feeding every declaration to
/// `processor`.
///
/// Lines that do not parse are skipped. Member lines are only looked at while
/// a class line is active.
pub fn read_mapping<R, P>(reader: R, processor: &mut P) -> Result<(), MappingError>
where
    R: BufRead,
    P: MappingProcessor + ?Sized,
{
    let mut class: Option<String> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;

        let record = match ProguardRecord::try_parse(&line) {
            Ok(record) => record,
            Err(_) if class.is_none() => continue,
            Err(source) => {
                return Err(MappingError::Parse {
                    line: index + 1,
                    source,
                })
            }
        };

        let Some(record) = record else {
            trace!("skipping mapping line {}", index + 1);
            continue;
        };

        if let ProguardRecord::Class {
            original,
            obfuscated,
        } = record
        {
            class = processor
                .process_class_mapping(original, obfuscated)
                .then(|| original.to_owned());
            continue;
        }

        let Some(class) = class.as_deref() else {
            continue;
        };

        match record {
            ProguardRecord::Field {
                ty,
                original,
                obfuscated,
            } => processor.process_field_mapping(class, ty, original, obfuscated),
            ProguardRecord::Method {
                ty,
                original,
                obfuscated,
                arguments,
                line_mapping,
            } => processor.process_method_mapping(
                class,
                ty,
                original,
                arguments,
                obfuscated,
                line_mapping,
            ),
            ProguardRecord::Class { .. } => {}
        }
    }

    Ok(())
}
