//! This crate implements template driven retracing with proguard mapping files.
//!
//! A mapping file is loaded into an immutable [`MappingModel`]. Lines of text,
//! usually stack traces, are matched against a [`Template`] and every class,
//! type, field and method token found in them is replaced by its original
//! name. Ambiguous members produce additional aligned lines.
//!
//! The mapping can also be consumed line-by-line through [`read_mapping`] and
//! a custom [`MappingProcessor`].
//!
//! # Examples
//!
//! ```
//! use proguard_retrace::{MappingModel, Retrace, Template, STACK_TRACE_TEMPLATE};
//!
//! let mapping: MappingModel = "\
//! android.arch.core.internal.SafeIterableMap -> a.a.a.b.c:
//!     13:13:java.util.Map$Entry eldest():168:168 -> a"
//!     .parse()
//!     .unwrap();
//!
//! // re-mapping a classname
//! assert_eq!(
//!     mapping.remap_class("a.a.a.b.c"),
//!     Some("android.arch.core.internal.SafeIterableMap"),
//! );
//!
//! // re-map a stack trace
//! let template = Template::compile(STACK_TRACE_TEMPLATE).unwrap();
//! let retrace = Retrace::new(&mapping, &template);
//! assert_eq!(
//!     retrace
//!         .remap_stacktrace("java.lang.RuntimeException\n    at a.a.a.b.c.a(SourceFile:13)")
//!         .unwrap(),
//!     "java.lang.RuntimeException\nat android.arch.core.internal.SafeIterableMap.eldest(SourceFile:13)\n",
//! );
//! ```

#![warn(missing_docs)]

mod builder;
mod mapping;
mod model;
mod retrace;
mod template;
mod utils;

pub use builder::MappingBuilder;
pub use mapping::{
    read_mapping, LineMapping, MappingError, MappingProcessor, ParseError, ProguardRecord,
};
pub use model::{FieldRecord, MappingModel, MappingSummary, MethodRecord};
pub use retrace::{Resolution, Retrace, RetracedLine};
pub use template::{Placeholder, Template, TemplateError, MAX_PLACEHOLDERS, STACK_TRACE_TEMPLATE};

#[cfg(feature = "uuid")]
use uuid::Uuid;

/// Calculates the UUID of the mapping file.
///
/// The UUID is generated from a file checksum.
#[cfg(feature = "uuid")]
pub fn mapping_uuid(mapping: &[u8]) -> Uuid {
    lazy_static::lazy_static! {
        static ref NAMESPACE: Uuid = Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"guardsquare.com");
    }
    // this internally only operates on bytes, so this is safe to do
    Uuid::new_v5(&NAMESPACE, mapping)
}
