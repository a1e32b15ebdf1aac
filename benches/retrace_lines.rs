use criterion::{black_box, criterion_group, criterion_main, Criterion};
use proguard_retrace::{MappingModel, Retrace, Template, STACK_TRACE_TEMPLATE};

static MAPPING: &[u8] = include_bytes!("../tests/res/mapping.txt");

static RAW: &str = r#"java.lang.IllegalStateException: submit failed
    at a.a.a.a(SourceFile:2)
    at com.example.app.MainActivity.a(SourceFile:1)
    at com.example.app.MainActivity.c(Unknown Source)
    at android.view.View.performClick(View.java:7125)
    at android.view.View.performClickInternal(View.java:7102)
    at android.view.View.access$3500(View.java:801)
    at android.view.View$PerformClick.run(View.java:27336)
    at android.os.Handler.handleCallback(Handler.java:883)
    at android.os.Handler.dispatchMessage(Handler.java:100)
    at android.os.Looper.loop(Looper.java:214)
    at android.app.ActivityThread.main(ActivityThread.java:7356)
    at java.lang.reflect.Method.invoke(Method.java)
Caused by: a.a.c
    at a.a.b.a(SourceFile:7)
    ... 12 more"#;

fn benchmark_retracing(c: &mut Criterion) {
    let mapping = MappingModel::from_reader(MAPPING).unwrap();
    let template = Template::compile(STACK_TRACE_TEMPLATE).unwrap();

    let mut group = c.benchmark_group("Retrace");

    group.bench_function("Terse", |b| {
        let retrace = Retrace::new(&mapping, &template);
        b.iter(|| retrace.remap_stacktrace(black_box(RAW)))
    });
    group.bench_function("Verbose", |b| {
        let retrace = Retrace::new(&mapping, &template).verbose(true);
        b.iter(|| retrace.remap_stacktrace(black_box(RAW)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_retracing);
criterion_main!(benches);
