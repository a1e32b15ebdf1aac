use std::fmt::{self, Display, Formatter, Write as _};
use std::io::{self, BufRead, Write};

use log::trace;

use crate::model::{FieldRecord, MappingModel, MethodRecord};
use crate::template::{Placeholder, Template};
use crate::utils::{external_class_name, simple_class_name};

/// The outcome of resolving a single field or method token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Exactly one original name matches.
    Unique(String),
    /// Several original names match; the first one is the primary.
    Ambiguous(String, Vec<String>),
    /// Nothing matches, the obfuscated token stays as it is.
    Unresolved(&'a str),
}

impl<'a> Resolution<'a> {
    fn from_candidates(mut candidates: impl Iterator<Item = String>, token: &'a str) -> Self {
        let Some(primary) = candidates.next() else {
            return Resolution::Unresolved(token);
        };
        let alternates: Vec<_> = candidates.collect();
        if alternates.is_empty() {
            Resolution::Unique(primary)
        } else {
            Resolution::Ambiguous(primary, alternates)
        }
    }

    /// Appends the resolution to `out`.
    ///
    /// Alternates become extra lines that are indented to the column at which
    /// the primary name starts.
    fn emit(self, out: &mut String, extra: &mut Vec<String>) {
        match self {
            Resolution::Unique(name) => out.push_str(&name),
            Resolution::Ambiguous(primary, alternates) => {
                let indent = " ".repeat(out.chars().count());
                out.push_str(&primary);
                extra.extend(
                    alternates
                        .into_iter()
                        .map(|alternate| format!("{indent}{alternate}")),
                );
            }
            Resolution::Unresolved(token) => out.push_str(token),
        }
    }
}

/// A processed input line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetracedLine {
    /// The deobfuscated line.
    pub line: String,
    /// Alternative resolutions of ambiguous members, one per line.
    pub extra: Vec<String>,
}

impl RetracedLine {
    fn unchanged(line: &str) -> Self {
        Self {
            line: line.to_owned(),
            extra: Vec::new(),
        }
    }
}

impl Display for RetracedLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)?;
        for extra in &self.extra {
            write!(f, "\n{extra}")?;
        }
        Ok(())
    }
}

/// What earlier tokens of a line established about its members.
#[derive(Debug, Default)]
struct Context {
    class: Option<String>,
    ty: Option<String>,
    line: usize,
    arguments: Option<String>,
}

/// Deobfuscates lines of text with a template and a mapping.
///
/// # Examples
///
/// ```
/// use proguard_retrace::{MappingModel, Retrace, Template, STACK_TRACE_TEMPLATE};
///
/// let mapping: MappingModel = "\
/// com.example.Main -> a.a:
///     3:7:void run() -> a"
///     .parse()
///     .unwrap();
/// let template = Template::compile(STACK_TRACE_TEMPLATE).unwrap();
/// let retrace = Retrace::new(&mapping, &template);
///
/// assert_eq!(
///     retrace.process("    at a.a.a(SourceFile:5)").to_string(),
///     "at com.example.Main.run(SourceFile:5)",
/// );
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Retrace<'m> {
    mapping: &'m MappingModel,
    template: &'m Template,
    verbose: bool,
    simple_class_names: bool,
}

impl<'m> Retrace<'m> {
    /// Creates a new Retrace.
    pub fn new(mapping: &'m MappingModel, template: &'m Template) -> Self {
        Self {
            mapping,
            template,
            verbose: false,
            simple_class_names: false,
        }
    }

    /// Prefixes resolved fields and methods with their declared type, and
    /// appends the argument list to methods.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Prints class tokens without their package.
    pub fn simple_class_names(mut self, simple_class_names: bool) -> Self {
        self.simple_class_names = simple_class_names;
        self
    }

    /// Deobfuscates a single line.
    ///
    /// Lines that do not match the template are returned unchanged. Matched
    /// lines are rebuilt from their literal text and the resolved tokens, and
    /// trimmed. Alternates stay aligned under the name they replace.
    pub fn process(&self, line: &str) -> RetracedLine {
        let Some(captures) = self.template.captures(line) else {
            trace!("line does not match template: {line:?}");
            return RetracedLine::unchanged(line);
        };

        let tokens: Vec<_> = self
            .template
            .slots()
            .iter()
            .filter_map(|&(placeholder, group)| {
                captures.get(group).map(|token| (placeholder, token))
            })
            .collect();

        // Members may come before the class, line or type they belong to,
        // so the whole line is scanned for context first.
        let mut context = Context::default();
        for (placeholder, token) in &tokens {
            self.observe(&mut context, *placeholder, token.as_str());
        }

        let mut out = String::with_capacity(line.len());
        let mut extra = Vec::new();
        let mut position = 0;

        for (placeholder, token) in tokens {
            // repeated groups can report captures out of order
            if token.start() < position {
                continue;
            }
            out.push_str(&line[position..token.start()]);
            position = token.end();

            let token = token.as_str();
            self.observe(&mut context, placeholder, token);
            match placeholder {
                Placeholder::Class | Placeholder::ClassSlash => {
                    let class = context.class.as_deref().unwrap_or(token);
                    if self.simple_class_names {
                        out.push_str(simple_class_name(class));
                    } else {
                        out.push_str(class);
                    }
                }
                Placeholder::LineNumber => out.push_str(token),
                Placeholder::Type => out.push_str(context.ty.as_deref().unwrap_or(token)),
                Placeholder::Arguments => {
                    out.push_str(context.arguments.as_deref().unwrap_or(token))
                }
                Placeholder::Field => self
                    .resolve_field(context.class.as_deref(), token, context.ty.as_deref())
                    .emit(&mut out, &mut extra),
                Placeholder::Method => self
                    .resolve_method(
                        context.class.as_deref(),
                        token,
                        context.line,
                        context.ty.as_deref(),
                        context.arguments.as_deref(),
                    )
                    .emit(&mut out, &mut extra),
            }
        }

        out.push_str(&line[position..]);

        // alternates were indented against the untrimmed output
        let trimmed = out.trim_start();
        let shift = out[..out.len() - trimmed.len()].chars().count();
        let extra: Vec<String> = extra
            .into_iter()
            .map(|alternate| alternate.chars().skip(shift).collect::<String>())
            .collect();

        RetracedLine {
            line: trimmed.trim_end().to_owned(),
            extra,
        }
    }

    /// Records what a token tells about the members that follow it.
    fn observe(&self, context: &mut Context, placeholder: Placeholder, token: &str) {
        match placeholder {
            Placeholder::Class => {
                context.class = Some(self.mapping.original_class_name(token).to_owned());
            }
            Placeholder::ClassSlash => {
                let class = external_class_name(token);
                context.class = Some(self.mapping.original_class_name(&class).to_owned());
            }
            // numbers that overflow lie past every line range
            Placeholder::LineNumber => context.line = token.parse().unwrap_or(usize::MAX),
            Placeholder::Type => context.ty = Some(self.mapping.original_type(token)),
            Placeholder::Arguments => {
                context.arguments = Some(self.mapping.original_arguments(token));
            }
            Placeholder::Field | Placeholder::Method => {}
        }
    }

    /// Resolves an obfuscated field name of the original `class`.
    ///
    /// A known `ty` only admits fields of exactly that type.
    pub fn resolve_field<'a>(
        &self,
        class: Option<&str>,
        obfuscated: &'a str,
        ty: Option<&str>,
    ) -> Resolution<'a> {
        let Some(class) = class else {
            return Resolution::Unresolved(obfuscated);
        };

        let candidates = self
            .mapping
            .fields(class, obfuscated)
            .filter(|field| field.matches(ty))
            .map(|field| self.format_field(field));

        Resolution::from_candidates(candidates, obfuscated)
    }

    /// Resolves an obfuscated method name of the original `class`.
    ///
    /// A `line` of `0` means the line is unknown. A known return type or
    /// argument list only admits methods with exactly that signature part.
    pub fn resolve_method<'a>(
        &self,
        class: Option<&str>,
        obfuscated: &'a str,
        line: usize,
        ty: Option<&str>,
        arguments: Option<&str>,
    ) -> Resolution<'a> {
        let Some(class) = class else {
            return Resolution::Unresolved(obfuscated);
        };

        let candidates = self
            .mapping
            .methods(class, obfuscated)
            .filter(|method| method.matches(line, ty, arguments))
            .map(|method| self.format_method(method));

        Resolution::from_candidates(candidates, obfuscated)
    }

    fn format_field(&self, field: &FieldRecord) -> String {
        if self.verbose {
            format!("{} {}", field.ty, field.original)
        } else {
            field.original.clone()
        }
    }

    fn format_method(&self, method: &MethodRecord) -> String {
        if self.verbose {
            format!("{} {}({})", method.ty, method.original, method.arguments)
        } else {
            method.original.clone()
        }
    }

    /// Remaps a complete block of text, line by line.
    ///
    /// Every input line produces its deobfuscated line followed by any
    /// alternatives, each terminated by a newline.
    pub fn remap_stacktrace(&self, input: &str) -> Result<String, fmt::Error> {
        let mut stacktrace = String::with_capacity(input.len());
        for line in input.lines() {
            writeln!(&mut stacktrace, "{}", self.process(line))?;
        }
        Ok(stacktrace)
    }

    /// Remaps all lines of `input` into `output`, preserving their order.
    pub fn retrace_reader<R, W>(&self, input: R, mut output: W) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
    {
        for line in input.lines() {
            let line = line?;
            writeln!(output, "{}", self.process(&line))?;
        }
        output.flush()
    }
}
