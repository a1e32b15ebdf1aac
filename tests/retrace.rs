use proguard_retrace::{MappingModel, Retrace, Template, STACK_TRACE_TEMPLATE};

static MAPPING: &[u8] = include_bytes!("res/mapping.txt");

fn mapping() -> MappingModel {
    MappingModel::from_reader(MAPPING).unwrap()
}

#[test]
fn test_remap_stacktrace() {
    let mapping = mapping();
    let template = Template::compile(STACK_TRACE_TEMPLATE).unwrap();
    let retrace = Retrace::new(&mapping, &template);

    let input = r#"java.lang.IllegalStateException: submit failed
    at a.a.a.a(SourceFile:2)
    at com.example.app.MainActivity.a(SourceFile:1)
    at com.example.app.MainActivity.<init>(SourceFile:1)
    at android.view.View.performClick(View.java:7393)
Caused by: a.a.c
    at a.a.b.a(SourceFile:7)
    ... 12 more"#;

    let expected = r#"java.lang.IllegalStateException: submit failed
at com.example.app.model.Payload.render(SourceFile:2)
at com.example.app.MainActivity.onButtonClicked(SourceFile:1)
at com.example.app.MainActivity.<init>(SourceFile:1)
at android.view.View.performClick(View.java:7393)
Caused by: com.example.app.SubmitException
at com.example.app.CrashReporter.report(SourceFile:7)
    ... 12 more
"#;

    assert_eq!(retrace.remap_stacktrace(input).unwrap(), expected);
}

#[test]
fn test_retrace_reader() {
    let mapping = mapping();
    let template = Template::compile(STACK_TRACE_TEMPLATE).unwrap();
    let retrace = Retrace::new(&mapping, &template);

    let input = "Caused by: a.a.c\n    at a.a.b.a(SourceFile:5)\r\n    at a.a.b.a(SourceFile:10)\n";
    let mut output = Vec::new();
    retrace.retrace_reader(input.as_bytes(), &mut output).unwrap();

    assert_eq!(
        String::from_utf8(output).unwrap(),
        "Caused by: com.example.app.SubmitException\n\
         at com.example.app.CrashReporter.report(SourceFile:5)\n\
         at com.example.app.CrashReporter.a(SourceFile:10)\n"
    );
}

#[test]
fn test_unobfuscated_passthrough() {
    let mapping = mapping();
    let template = Template::compile(STACK_TRACE_TEMPLATE).unwrap();
    let retrace = Retrace::new(&mapping, &template);

    for line in [
        "Exception in thread \"main\" java.lang.NullPointerException: boom",
        "at java.util.Objects.requireNonNull(Objects.java:208)",
        "\t... 3 more",
        "",
        "    ",
        "Nothing to see here",
    ] {
        let retraced = retrace.process(line);
        assert_eq!(retraced.line, line);
        assert!(retraced.extra.is_empty());
    }
}

#[test]
fn test_retrace_is_idempotent() {
    let mapping = mapping();
    let template = Template::compile(STACK_TRACE_TEMPLATE).unwrap();
    let retrace = Retrace::new(&mapping, &template);

    let input = "java.lang.RuntimeException: a.a.c\n    at a.a.a.a(SourceFile:3)\n    at a.a.b.a(SourceFile:6)\nCaused by: a.a.c: nope\n";
    let once = retrace.remap_stacktrace(input).unwrap();
    let twice = retrace.remap_stacktrace(&once).unwrap();

    assert_eq!(
        once,
        "java.lang.RuntimeException: com.example.app.SubmitException\n\
         at com.example.app.model.Payload.render(SourceFile:3)\n\
         at com.example.app.CrashReporter.report(SourceFile:6)\n\
         Caused by: com.example.app.SubmitException: nope\n"
    );
    assert_eq!(once, twice);
}

#[test]
fn test_simple_class_names() {
    let mapping = mapping();
    let template = Template::compile(STACK_TRACE_TEMPLATE).unwrap();
    let retrace = Retrace::new(&mapping, &template).simple_class_names(true);

    assert_eq!(
        retrace.process("Caused by: a.a.c").line,
        "Caused by: SubmitException"
    );
    assert_eq!(
        retrace.process("    at a.a.b.a(SourceFile:7)").line,
        "at CrashReporter.report(SourceFile:7)"
    );
}
