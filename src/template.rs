//! Compiles retrace templates into line matchers.
//!
//! A template is a regular expression with embedded placeholders. Every
//! placeholder is a `%` followed by one of these characters:
//!
//! | Placeholder | Matches                                         |
//! |-------------|-------------------------------------------------|
//! | `%c`        | a dotted class name, `com.example.Foo`          |
//! | `%C`        | a slash separated class name, `com/example/Foo` |
//! | `%l`        | a line number                                   |
//! | `%t`        | a type, a class name with optional `[]` suffixes |
//! | `%f`        | a field name                                    |
//! | `%m`        | a method name, including `<init>` and friends   |
//! | `%a`        | a comma separated list of argument types        |

use std::fmt;

use log::warn;
use regex::{Captures, Regex};
use thiserror::Error;

/// The maximum number of placeholders a single template can hold.
///
/// Placeholders past this limit are not substituted; they and the rest of the
/// template are used as plain regex text.
pub const MAX_PLACEHOLDERS: usize = 32;

/// The default template, matching the frames and exception lines of Java
/// stack traces.
pub const STACK_TRACE_TEMPLATE: &str =
    r#"(?:.*?\bat\s+%c\.%m\s*\(.*?(?::%l)?\)\s*)|(?:(?:.*?[:"]\s+)?%c(?::.*)?)"#;

const REGEX_CLASS: &str = r"\b(?:[A-Za-z0-9_$]+\.)*[A-Za-z0-9_$]+\b";
const REGEX_CLASS_SLASH: &str = r"\b(?:[A-Za-z0-9_$]+/)*[A-Za-z0-9_$]+\b";
const REGEX_LINE_NUMBER: &str = r"\b[0-9]+\b";
const REGEX_TYPE: &str = r"\b(?:[A-Za-z0-9_$]+\.)*[A-Za-z0-9_$]+\b(?:\[\])*";
const REGEX_MEMBER: &str = r"<?\b[A-Za-z0-9_$]+\b>?";
const REGEX_ARGUMENTS: &str = r"(?:\b(?:[A-Za-z0-9_$]+\.)*[A-Za-z0-9_$]+\b(?:\[\])*(?:\s*,\s*\b(?:[A-Za-z0-9_$]+\.)*[A-Za-z0-9_$]+\b(?:\[\])*)*)?";

/// Errors when compiling a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A `%` was followed by a character that is not a placeholder.
    #[error("unknown placeholder `%{placeholder}` at offset {offset}")]
    UnknownPlaceholder {
        /// The character following the `%`.
        placeholder: char,
        /// Byte offset of the `%` in the template.
        offset: usize,
    },
    /// The template does not form a valid regular expression.
    #[error("template is not a valid regular expression")]
    Regex(#[from] regex::Error),
}

/// The kind of token a placeholder stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `%c`, a dotted class name.
    Class,
    /// `%C`, a slash separated class name.
    ClassSlash,
    /// `%l`, a line number.
    LineNumber,
    /// `%t`, a type.
    Type,
    /// `%f`, a field name.
    Field,
    /// `%m`, a method name.
    Method,
    /// `%a`, an argument list.
    Arguments,
}

impl Placeholder {
    /// Looks up the placeholder for the character following a `%`.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'c' => Self::Class,
            'C' => Self::ClassSlash,
            'l' => Self::LineNumber,
            't' => Self::Type,
            'f' => Self::Field,
            'm' => Self::Method,
            'a' => Self::Arguments,
            _ => return None,
        })
    }

    /// The character identifying this placeholder.
    pub fn as_char(self) -> char {
        match self {
            Self::Class => 'c',
            Self::ClassSlash => 'C',
            Self::LineNumber => 'l',
            Self::Type => 't',
            Self::Field => 'f',
            Self::Method => 'm',
            Self::Arguments => 'a',
        }
    }

    /// The regex fragment matching tokens of this kind.
    pub fn fragment(self) -> &'static str {
        match self {
            Self::Class => REGEX_CLASS,
            Self::ClassSlash => REGEX_CLASS_SLASH,
            Self::LineNumber => REGEX_LINE_NUMBER,
            Self::Type => REGEX_TYPE,
            Self::Field | Self::Method => REGEX_MEMBER,
            Self::Arguments => REGEX_ARGUMENTS,
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.as_char())
    }
}

/// A compiled template.
///
/// Matching is anchored at the start of a line but not at its end.
///
/// # Examples
///
/// ```
/// use proguard_retrace::{Placeholder, Template};
///
/// let template = Template::compile(r"\s*at %c\.%m\(.*:%l\)").unwrap();
/// assert_eq!(
///     template.placeholders().collect::<Vec<_>>(),
///     vec![Placeholder::Class, Placeholder::Method, Placeholder::LineNumber],
/// );
/// assert!(template.is_match("    at a.b.c(SourceFile:12)"));
/// assert!(!template.is_match("Caused by: a.b"));
/// ```
#[derive(Clone, Debug)]
pub struct Template {
    source: String,
    regex: Regex,
    /// Placeholder kinds with the index of their capture group.
    slots: Vec<(Placeholder, usize)>,
}

impl Template {
    /// Compiles a template.
    ///
    /// Substitution stops at a trailing `%` or after [`MAX_PLACEHOLDERS`]
    /// placeholders, the remaining text is used as is.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let mut expression = String::with_capacity(template.len() * 4);
        let mut placeholders = Vec::new();
        let mut rest = template;

        expression.push_str("^(?:");

        while let Some(index) = rest.find('%') {
            let Some(c) = rest[index + 1..].chars().next() else {
                break;
            };
            if placeholders.len() == MAX_PLACEHOLDERS {
                warn!(
                    "template has more than {} placeholders, ignoring the rest",
                    MAX_PLACEHOLDERS
                );
                break;
            }

            let placeholder =
                Placeholder::from_char(c).ok_or(TemplateError::UnknownPlaceholder {
                    placeholder: c,
                    offset: template.len() - rest.len() + index,
                })?;

            expression.push_str(&rest[..index]);
            expression.push_str(&format!(
                "(?P<{}>{})",
                group_name(placeholders.len()),
                placeholder.fragment()
            ));
            placeholders.push(placeholder);

            rest = &rest[index + 1 + c.len_utf8()..];
        }

        expression.push_str(rest);
        expression.push(')');

        let regex = Regex::new(&expression)?;

        let slots = placeholders
            .into_iter()
            .enumerate()
            .filter_map(|(index, placeholder)| {
                let name = group_name(index);
                let group = regex
                    .capture_names()
                    .position(|group| group == Some(name.as_str()))?;
                Some((placeholder, group))
            })
            .collect();

        Ok(Self {
            source: template.to_owned(),
            regex,
            slots,
        })
    }

    /// The template this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled regular expression.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The placeholders of the template, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.slots.iter().map(|(placeholder, _)| *placeholder)
    }

    /// Whether `line` starts with text matching the template.
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    pub(crate) fn captures<'t>(&self, line: &'t str) -> Option<Captures<'t>> {
        self.regex.captures(line)
    }

    pub(crate) fn slots(&self) -> &[(Placeholder, usize)] {
        &self.slots
    }
}

fn group_name(index: usize) -> String {
    format!("__p{index}")
}
