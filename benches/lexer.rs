//! Lexer benchmarks
//!
//! Run with: cargo bench --bench lexer
//! Profile with: cargo flamegraph --bench lexer -- --bench

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ecmaparse::lexer::{Lexer, TokenKind};

const SIMPLE_EXPR: &str = "1 + 2 * 3 - 4 / 5";

const VARIABLES: &str = r#"
let x = 1;
const y = 2;
var z = 3;
let a = x + y + z;
const b = a * 2;
"#;

/// String literals with escapes
const STRINGS: &str = r#"
const hello = "Hello, World!";
const escaped = "Line1\nLine2\tTabbed";
const unicode = "\u{1F600} emoji A";
const legacy = '\x41é';
const template = `Hello ${name}!`;
"#;

/// Operators stress test
const OPERATORS: &str = r#"
a + b - c * d / e % f ** g
x === y !== z == w != v
a && b || c ?? d
a & b | c ^ d ~ e
a << 2 >> 3 >>> 4
a += b -= c *= d /= e %= f **= g
a &&= b ||= c ??= d
a < b <= c > d >= e
++x --y x++ y--
a?.b a?.() a ?? b
...rest => #private
"#;

const IDENTIFIERS: &str = r#"
const café = naïve + ünïcödé;
const abc = \u{62}cd;
const $dollar = _under + ℮ + ゆ;
"#;

/// Numbers in various formats
const NUMBERS: &str = r#"
const decimal = 42;
const float = 3.14159;
const scientific = 6.022e23;
const hex = 0xFF;
const octal = 0o755;
const binary = 0b1010;
const bigint = 9007199254740991n;
const underscore = 1_000_000;
const legacyOctal = 0777;
"#;

const COMMENTS: &str = r#"
// Single line comment
const a = 1; // inline comment

/* Multi-line
   comment
   spanning
   multiple lines */
const b = 2;

/**
 * JSDoc style comment
 * @param x The first parameter
 */
function add(x, y) {
    return x + y;
}
"#;

fn generate_large_source(size: usize) -> String {
    let mut source = String::with_capacity(size);
    let patterns = [VARIABLES, STRINGS, OPERATORS, IDENTIFIERS, NUMBERS, COMMENTS];

    let mut i = 0;
    while source.len() < size {
        if let Some(pattern) = patterns.get(i % patterns.len()) {
            source.push_str(pattern);
            source.push_str("\n\n");
        }
        i += 1;
    }
    source
}

/// Tokenize all of `source`, stopping at the first lexical error
fn lex_all(source: &str) -> usize {
    let mut lexer = Lexer::new(source);
    let mut count = 0;
    while let Ok(token) = lexer.next_token() {
        if token.kind == TokenKind::Eof {
            break;
        }
        black_box(&token);
        count += 1;
    }
    count
}

fn bench_lexer_individual(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/individual");

    let cases = [
        ("simple_expr", SIMPLE_EXPR),
        ("variables", VARIABLES),
        ("strings", STRINGS),
        ("operators", OPERATORS),
        ("identifiers", IDENTIFIERS),
        ("numbers", NUMBERS),
        ("comments", COMMENTS),
    ];

    for (name, source) in cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("bytes", name), source, |b, s| {
            b.iter(|| lex_all(black_box(s)));
        });
    }

    group.finish();
}

fn bench_lexer_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/throughput");

    for size in [1_000, 10_000, 100_000, 500_000] {
        let source = generate_large_source(size);
        let actual_size = source.len();

        group.throughput(Throughput::Bytes(actual_size as u64));
        group.bench_with_input(
            BenchmarkId::new("large_source", format!("{}KB", actual_size / 1024)),
            &source,
            |b, s| {
                b.iter(|| lex_all(black_box(s)));
            },
        );
    }

    group.finish();
}

fn bench_lexer_token_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/token_types");

    let identifiers: String = (0..1000).map(|i| format!("identifier{} ", i)).collect();
    let numbers: String = (0..1000).map(|i| format!("{}.{}e{} ", i, i, i % 10)).collect();
    let strings: String = (0..1000).map(|i| format!("\"string value {}\\n\" ", i)).collect();

    group.bench_function("identifiers", |b| b.iter(|| lex_all(black_box(&identifiers))));
    group.bench_function("numbers", |b| b.iter(|| lex_all(black_box(&numbers))));
    group.bench_function("strings", |b| b.iter(|| lex_all(black_box(&strings))));

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer_individual,
    bench_lexer_throughput,
    bench_lexer_token_types,
);
criterion_main!(benches);
