use lazy_static::lazy_static;

use proguard_retrace::{
    MappingError, MappingModel, MappingSummary, Retrace, Template, STACK_TRACE_TEMPLATE,
};

static MAPPING: &[u8] = include_bytes!("res/mapping.txt");

lazy_static! {
    static ref MAPPING_WIN: Vec<u8> = MAPPING
        .iter()
        .flat_map(|&byte| if byte == b'\n' {
            vec![b'\r', b'\n']
        } else {
            vec![byte]
        })
        .collect();
}

#[test]
fn test_basic() {
    let mapping = MappingModel::from_reader(MAPPING).unwrap();

    assert_eq!(
        mapping.remap_class("a.a.a"),
        Some("com.example.app.model.Payload")
    );
    assert_eq!(
        mapping.remap_class("com.example.app.MainActivity"),
        Some("com.example.app.MainActivity")
    );
    assert_eq!(mapping.remap_class("a.a"), None);
    assert_eq!(
        mapping.summary(),
        MappingSummary {
            class_count: 4,
            field_count: 7,
            method_count: 10,
        }
    );
}

#[test]
fn test_from_path() {
    let mapping = MappingModel::from_path("tests/res/mapping.txt").unwrap();
    assert_eq!(
        mapping.remap_class("a.a.c"),
        Some("com.example.app.SubmitException")
    );

    let err = MappingModel::from_path("tests/res/does-not-exist.txt").unwrap_err();
    assert!(matches!(err, MappingError::Io(_)));
}

#[test]
fn test_basic_win() {
    let mapping = MappingModel::from_reader(&MAPPING_WIN[..]).unwrap();

    assert_eq!(
        mapping.remap_class("a.a.b"),
        Some("com.example.app.CrashReporter")
    );
    assert_eq!(
        mapping.summary(),
        MappingModel::from_reader(MAPPING).unwrap().summary()
    );

    let methods: Vec<_> = mapping
        .methods("com.example.app.CrashReporter", "a")
        .collect();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].arguments, "java.lang.Throwable");
}

#[test]
fn test_members() {
    let mapping = MappingModel::from_reader(MAPPING).unwrap();

    let fields: Vec<_> = mapping
        .fields("com.example.app.MainActivity", "b")
        .map(|field| (field.ty.as_str(), field.original.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![("int", "clickCount"), ("java.lang.String", "lastMessage")]
    );

    let methods: Vec<_> = mapping
        .methods("com.example.app.model.Payload", "a")
        .map(|method| (method.startline, method.endline, method.arguments.as_str()))
        .collect();
    assert_eq!(methods, vec![(1, 2, "int"), (3, 3, "int,boolean")]);

    // members are keyed by the original class name only
    assert_eq!(mapping.methods("a.a.a", "a").count(), 0);
}

#[test]
fn test_malformed_lines() {
    let mapping: MappingModel = "\
garbage line
    int orphan -> z
com.example.Foo -> a:
    this is not a member
    int count -> a
not a class ->:
    long total -> b
    void broken( -> c
com.example.Bar -> b:
"
    .parse()
    .unwrap();

    assert_eq!(
        mapping.summary(),
        MappingSummary {
            class_count: 2,
            field_count: 2,
            method_count: 0,
        }
    );
    assert_eq!(
        mapping.fields("com.example.Foo", "b").next().unwrap().original,
        "total"
    );
}

#[test]
fn test_method_survives_garbled_member() {
    let mapping: MappingModel = "\
com.example.Foo -> a.a:
    1:5:void run() -> a
    void broken() b
"
    .parse()
    .unwrap();
    assert_eq!(mapping.summary().method_count, 1);

    let template = Template::compile(STACK_TRACE_TEMPLATE).unwrap();
    let retrace = Retrace::new(&mapping, &template);
    assert_eq!(
        retrace.process("    at a.a.a(SourceFile:3)").line,
        "at com.example.Foo.run(SourceFile:3)"
    );
}

#[test]
fn test_line_number_overflow() {
    let source = "\
com.example.Foo -> a:
    99999999999999999999999:1:void run() -> a
";
    let err = source.parse::<MappingModel>().unwrap_err();
    match err {
        MappingError::Parse { line, source } => {
            assert_eq!(line, 2);
            assert_eq!(source.number(), "99999999999999999999999");
        }
        err => panic!("unexpected error: {err}"),
    }

    // faults outside of any class are not reported
    let mapping: MappingModel = "    99999999999999999999999:1:void run() -> a\n"
        .parse()
        .unwrap();
    assert_eq!(mapping.summary(), MappingSummary::default());
}

#[cfg(feature = "uuid")]
#[test]
fn test_uuid() {
    let uuid = proguard_retrace::mapping_uuid(MAPPING);
    assert_eq!(uuid, proguard_retrace::mapping_uuid(MAPPING));
    assert_eq!(uuid.get_version_num(), 5);
    assert_ne!(uuid, proguard_retrace::mapping_uuid(&MAPPING_WIN[..]));
}
