//! Parser benchmarks
//!
//! Run with: cargo bench --bench parser
//! Profile with: cargo flamegraph --bench parser -- --bench

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ecmaparse::{Options, Parser};

/// Simple expressions
const SIMPLE_EXPR: &str = "1 + 2 * 3 - 4 / 5";

/// Binary expression tree (deep nesting)
fn generate_binary_expr(depth: usize) -> String {
    if depth == 0 {
        "x".to_string()
    } else {
        format!(
            "({} + {})",
            generate_binary_expr(depth - 1),
            generate_binary_expr(depth - 1)
        )
    }
}

const VARIABLES: &str = r#"
let x = 1;
const y = 2;
var z = 3;
let a = x + y + z;
const b = a * 2;
let { foo, bar: baz } = obj;
const [first, second, ...rest] = arr;
"#;

const CLASS_DEF: &str = r#"
class Counter extends Base {
    #count = 0;
    static instances = 0;

    constructor(name, initialValue = 0) {
        super();
        this.name = name;
        this.#count = initialValue;
        Counter.instances++;
    }

    get value() {
        return this.#count;
    }

    set value(n) {
        if (n >= 0) {
            this.#count = n;
        }
    }

    increment() {
        this.#count++;
        return this;
    }

    static {
        Counter.registry = new Map();
    }

    static create(name) {
        return new Counter(name);
    }
}
"#;

const FUNCTIONS: &str = r#"
function simple(a, b) { return a + b; }
function defaultParams(x = 1, y = 2) { return x + y; }
function restParams(...args) { return args.reduce((a, b) => a + b, 0); }
function destructured({ x, y }, [a, b]) { return x + y + a + b; }
const arrow = (x) => x * 2;
const arrowBlock = (x) => { return x * 2; };
async function asyncFn() { return await Promise.resolve(42); }
function* generator() { yield 1; yield* other(); }
"#;

/// Every shape of `for` head
const LOOPS: &str = r#"
for (let i = 0; i < 10; i++) { total += i; }
for (const item of items) process(item);
for (const key in object) if (object.hasOwnProperty(key)) seen.push(key);
for ([a, b = c] of pairs);
for (x.y of list);
for (var i = 0, j = 10; i < j; i++, j--) swap(i, j);
for (let { a, b: [c] } of nested) use(a, c);
outer: for (;;) { inner: while (true) { if (done) break outer; continue inner; } }
"#;

const CONTROL_FLOW: &str = r#"
if (condition) {
    doSomething();
} else if (otherCondition) {
    doSomethingElse();
} else {
    doDefault();
}

do {
    attempt();
} while (shouldRetry)

switch (value) {
    case 1:
        handleOne();
        break;
    case 2:
    case 3:
        handleTwoOrThree();
        break;
    default:
        handleDefault();
}

try {
    riskyOperation();
} catch ({ message }) {
    handleError(message);
} finally {
    cleanup();
}
"#;

const OBJECTS: &str = r#"
const config = {
    name: "MyApp",
    version: "1.0.0",
    settings: {
        debug: true,
        logLevel: "info",
        features: ["auth", "api", "cache"],
    },
    get url() { return `${this.host}:${this.port}`; },
    async *pages() { yield* this.items; },
    [computed + key]: value ?? fallback,
    ...defaults,
};
"#;

const TEMPLATES: &str = r#"
const simple = `Hello, World!`;
const interpolated = `Hello, ${name}!`;
const nested = `outer ${`inner ${value}`} outer`;
const tagged = html`<div class="${className}">${content}</div>`;
const complex = `Result: ${items.map(i => `${i.name}: ${i.value}`).join(', ')}`;
"#;

const MODULES: &str = r#"
import { foo, bar } from './module';
import defaultExport from './default';
import * as namespace from './namespace';
import { original as renamed } from './renamed';

export const value = 42;
export function exportedFn() {}
export class ExportedClass {}
export { foo, bar };
export { renamed as alias };
export default class DefaultClass {}
export * from './reexport';
"#;

/// Large realistic script
fn generate_large_source(size: usize) -> String {
    let mut source = String::with_capacity(size);
    let patterns = [
        VARIABLES,
        CLASS_DEF,
        FUNCTIONS,
        LOOPS,
        CONTROL_FLOW,
        OBJECTS,
        TEMPLATES,
    ];

    let mut i = 0;
    while source.len() < size {
        if let Some(pattern) = patterns.get(i % patterns.len()) {
            // each chunk in its own block so the declarations never clash
            source.push_str("{\n");
            source.push_str(pattern);
            source.push_str("}\n");
        }
        i += 1;
    }
    source
}

fn parse(source: &str, options: Options) -> Result<ecmaparse::Program, ecmaparse::ParseError> {
    Parser::new(black_box(source), options).parse_program()
}

fn bench_parser_individual(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/individual");

    let cases = [
        ("simple_expr", SIMPLE_EXPR),
        ("variables", VARIABLES),
        ("class_def", CLASS_DEF),
        ("functions", FUNCTIONS),
        ("loops", LOOPS),
        ("control_flow", CONTROL_FLOW),
        ("objects", OBJECTS),
        ("templates", TEMPLATES),
    ];

    for (name, source) in cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("bytes", name), source, |b, s| {
            b.iter(|| black_box(parse(s, Options::default())));
        });
    }

    group.throughput(Throughput::Bytes(MODULES.len() as u64));
    group.bench_with_input(BenchmarkId::new("bytes", "modules"), MODULES, |b, s| {
        b.iter(|| black_box(parse(s, Options::module())));
    });

    group.finish();
}

fn bench_parser_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/throughput");

    for size in [1_000, 10_000, 100_000, 500_000] {
        let source = generate_large_source(size);
        let actual_size = source.len();

        group.throughput(Throughput::Bytes(actual_size as u64));
        group.bench_with_input(
            BenchmarkId::new("large_source", format!("{}KB", actual_size / 1024)),
            &source,
            |b, s| {
                b.iter(|| black_box(parse(s, Options::default())));
            },
        );
    }

    group.finish();
}

fn bench_parser_locations(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/locations");
    let source = generate_large_source(100_000);

    let with_loc = Options {
        loc: true,
        ranges: true,
        ..Options::default()
    };
    group.bench_function("offsets_only", |b| {
        b.iter(|| black_box(parse(&source, Options::default())));
    });
    group.bench_function("loc_and_ranges", |b| {
        b.iter(|| black_box(parse(&source, with_loc)));
    });
    group.bench_function("to_json", |b| {
        b.iter(|| black_box(parse(&source, with_loc).map(|program| program.to_json())));
    });

    group.finish();
}

fn bench_parser_expression_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/expression_depth");

    for depth in [5, 10, 15] {
        let source = generate_binary_expr(depth);

        group.bench_with_input(
            BenchmarkId::new("binary_tree", format!("depth_{}", depth)),
            &source,
            |b, s| {
                b.iter(|| black_box(parse(s, Options::default())));
            },
        );
    }

    group.finish();
}

fn bench_parser_statements(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/statements");

    let many_lets: String = (0..1000).map(|i| format!("let x{} = {};\n", i, i)).collect();
    let many_fns: String = (0..100)
        .map(|i| format!("function f{}(a, b) {{ return a + b; }}\n", i))
        .collect();
    let many_classes: String = (0..50)
        .map(|i| format!("class C{} {{ constructor() {{ this.x = {}; }} }}\n", i, i))
        .collect();

    group.bench_function("1000_let_statements", |b| {
        b.iter(|| black_box(parse(&many_lets, Options::default())));
    });
    group.bench_function("100_function_declarations", |b| {
        b.iter(|| black_box(parse(&many_fns, Options::default())));
    });
    group.bench_function("50_class_declarations", |b| {
        b.iter(|| black_box(parse(&many_classes, Options::default())));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parser_individual,
    bench_parser_throughput,
    bench_parser_locations,
    bench_parser_expression_depth,
    bench_parser_statements,
);
criterion_main!(benches);
