//! Internal helpers shared across modules.

/// Converts a slash separated class name into its dotted form.
///
/// For example: `com/example/Main$Inner` -> `com.example.Main$Inner`
pub(crate) fn external_class_name(internal_class_name: &str) -> String {
    internal_class_name.replace('/', ".")
}

/// Strips the package from a dotted class name.
///
/// For example: `com.example.Main$Inner` -> `Main$Inner`
pub(crate) fn simple_class_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}
