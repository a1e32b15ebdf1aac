use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::Serialize;

use crate::builder::MappingBuilder;
use crate::mapping::{read_mapping, MappingError};

/// Original class name -> obfuscated member name -> member records.
///
/// Record sets keep their insertion order, which is the order in which the
/// declarations appear in the mapping file.
pub(crate) type MemberTable<T> = HashMap<String, HashMap<String, IndexSet<T>>>;

/// An original field declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldRecord {
    /// The declared type of the field.
    pub ty: String,
    /// The original name of the field.
    pub original: String,
}

impl FieldRecord {
    /// Whether this field can be the one referred to by a token of type `ty`.
    ///
    /// An unknown type matches every field.
    pub fn matches(&self, ty: Option<&str>) -> bool {
        ty.map_or(true, |ty| ty == self.ty)
    }
}

/// An original method declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodRecord {
    /// First obfuscated line of the method body, `0` if unknown.
    pub startline: usize,
    /// Last obfuscated line of the method body, `0` if unknown.
    pub endline: usize,
    /// The declared return type.
    pub ty: String,
    /// The declared argument types, comma separated.
    pub arguments: String,
    /// The original name of the method.
    pub original: String,
}

impl MethodRecord {
    /// Whether this method can be the one referred to by a token at `line`
    /// with the given return type and argument list.
    ///
    /// A `line` of `0` and `None` for the other parts mean "unknown" and
    /// match every method. Methods without line information match every line.
    pub fn matches(&self, line: usize, ty: Option<&str>, arguments: Option<&str>) -> bool {
        let line_matches =
            line == 0 || self.endline == 0 || (self.startline <= line && line <= self.endline);

        line_matches
            && ty.map_or(true, |ty| ty == self.ty)
            && arguments.map_or(true, |arguments| arguments == self.arguments)
    }
}

/// Summary of a loaded mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MappingSummary {
    /// Number of distinct obfuscated class names.
    pub class_count: usize,
    /// Number of distinct field records.
    pub field_count: usize,
    /// Number of distinct method records.
    pub method_count: usize,
}

/// The name tables of a proguard mapping file.
///
/// The model is built once and is read-only afterwards. Field and method
/// tables are keyed by the *original* class name, so obfuscated class names
/// have to go through [`MappingModel::remap_class`] first.
///
/// # Examples
///
/// ```
/// use proguard_retrace::MappingModel;
///
/// let mapping: MappingModel = "\
/// com.example.Foo -> a.a:
///     int count -> a
///     1:5:void run() -> b"
///     .parse()
///     .unwrap();
///
/// assert_eq!(mapping.remap_class("a.a"), Some("com.example.Foo"));
/// assert_eq!(mapping.methods("com.example.Foo", "b").next().unwrap().original, "run");
/// ```
#[derive(Clone, Debug, Default)]
pub struct MappingModel {
    pub(crate) classes: HashMap<String, String>,
    pub(crate) fields: MemberTable<FieldRecord>,
    pub(crate) methods: MemberTable<MethodRecord>,
}

impl MappingModel {
    /// Loads a mapping from a buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, MappingError> {
        let mut builder = MappingBuilder::new();
        read_mapping(reader, &mut builder)?;
        Ok(builder.build())
    }

    /// Loads a mapping file from the file system.
    ///
    /// The file is closed before this returns, on success and on error.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MappingError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Remaps an obfuscated Class.
    ///
    /// This works on the fully-qualified name of the class, with its complete
    /// module prefix.
    pub fn remap_class(&self, class: &str) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }

    /// Returns the original name of `class`, or `class` itself if it is not
    /// part of the mapping.
    pub fn original_class_name<'a>(&'a self, class: &'a str) -> &'a str {
        self.remap_class(class).unwrap_or(class)
    }

    /// Returns the original form of a type, keeping array suffixes intact.
    pub fn original_type(&self, ty: &str) -> String {
        match ty.find('[') {
            Some(index) => {
                let (class, dimensions) = ty.split_at(index);
                format!("{}{}", self.original_class_name(class), dimensions)
            }
            None => self.original_class_name(ty).to_owned(),
        }
    }

    /// Returns the original form of a comma separated argument list.
    ///
    /// Every element is trimmed and resolved on its own, the result is joined
    /// with `,` like the argument lists of the mapping file.
    pub fn original_arguments(&self, arguments: &str) -> String {
        arguments
            .split(',')
            .map(|argument| self.original_type(argument.trim()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// All field records of the original `class` sharing one obfuscated name.
    pub fn fields<'a>(
        &'a self,
        class: &str,
        obfuscated: &str,
    ) -> impl Iterator<Item = &'a FieldRecord> + 'a {
        members(&self.fields, class, obfuscated)
    }

    /// All method records of the original `class` sharing one obfuscated name.
    pub fn methods<'a>(
        &'a self,
        class: &str,
        obfuscated: &str,
    ) -> impl Iterator<Item = &'a MethodRecord> + 'a {
        members(&self.methods, class, obfuscated)
    }

    /// Returns a summary of the mapping.
    pub fn summary(&self) -> MappingSummary {
        MappingSummary {
            class_count: self.classes.len(),
            field_count: count_members(&self.fields),
            method_count: count_members(&self.methods),
        }
    }
}

fn members<'a, T>(
    table: &'a MemberTable<T>,
    class: &str,
    obfuscated: &str,
) -> impl Iterator<Item = &'a T> + 'a {
    table
        .get(class)
        .and_then(|members| members.get(obfuscated))
        .into_iter()
        .flatten()
}

fn count_members<T>(table: &MemberTable<T>) -> usize {
    table
        .values()
        .flat_map(HashMap::values)
        .map(IndexSet::len)
        .sum()
}

impl FromStr for MappingModel {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}
