//! Collects the declarations of a mapping file into a [`MappingModel`].

use std::collections::HashMap;

use indexmap::IndexSet;
use log::debug;

use crate::mapping::{LineMapping, MappingProcessor};
use crate::model::{FieldRecord, MappingModel, MemberTable, MethodRecord};

/// A [`MappingProcessor`] that accumulates class, field and method tables.
///
/// Once the whole mapping has been fed through
/// [`read_mapping`](crate::read_mapping), [`MappingBuilder::build`] freezes
/// the tables into an immutable [`MappingModel`].
#[derive(Clone, Debug, Default)]
pub struct MappingBuilder {
    /// Obfuscated class name -> original class name.
    classes: HashMap<String, String>,
    fields: MemberTable<FieldRecord>,
    methods: MemberTable<MethodRecord>,
}

impl MappingBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Freezes the collected tables.
    pub fn build(self) -> MappingModel {
        let model = MappingModel {
            classes: self.classes,
            fields: self.fields,
            methods: self.methods,
        };

        let summary = model.summary();
        debug!(
            "loaded mapping with {} classes, {} fields and {} methods",
            summary.class_count, summary.field_count, summary.method_count
        );

        model
    }
}

fn insert_member<T: std::hash::Hash + Eq>(
    table: &mut MemberTable<T>,
    class: &str,
    obfuscated: &str,
    record: T,
) {
    table
        .entry(class.to_owned())
        .or_default()
        .entry(obfuscated.to_owned())
        .or_insert_with(IndexSet::new)
        .insert(record);
}

impl MappingProcessor for MappingBuilder {
    fn process_class_mapping(&mut self, original: &str, obfuscated: &str) -> bool {
        self.classes
            .insert(obfuscated.to_owned(), original.to_owned());
        true
    }

    fn process_field_mapping(&mut self, class: &str, ty: &str, original: &str, obfuscated: &str) {
        let record = FieldRecord {
            ty: ty.to_owned(),
            original: original.to_owned(),
        };
        insert_member(&mut self.fields, class, obfuscated, record);
    }

    fn process_method_mapping(
        &mut self,
        class: &str,
        ty: &str,
        original: &str,
        arguments: &str,
        obfuscated: &str,
        line_mapping: Option<LineMapping>,
    ) {
        // in case the mapping has no line records, we use `0` here.
        let (startline, endline) = line_mapping.map_or((0, 0), |line_mapping| {
            (line_mapping.startline, line_mapping.endline)
        });
        let record = MethodRecord {
            startline,
            endline,
            ty: ty.to_owned(),
            arguments: arguments.to_owned(),
            original: original.to_owned(),
        };
        insert_member(&mut self.methods, class, obfuscated, record);
    }
}
