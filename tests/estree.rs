//! Structural checks over whole ESTree outputs: every node's offsets,
//! `range` and `loc` agree with each other and with the source text.

use ecmaparse::{Options, parse_module, parse_script};
use serde_json::{Value, json};

const SCRIPTS: &[&str] = &[
    "let x = 1;\r\nconst { a, b: [c = 2] } = obj;\n",
    "function* gen(a, ...rest) { yield a; yield* rest; }",
    "class C extends D { #p = 1; static s; constructor() { super(); } get p() { return this.#p; } static { C.s = `t${1}😀${2}`; } }",
    "label: for (const [k, v] of map) { if (k) continue label; else break; }",
    "for (x in y) ; for (;;) {} for ([a, b = 1] of c) {} for (let i = 0, j; i < j; i++) ;",
    "const s = '😀'; /* 😀\r\n */ var r = /ab+c/gi, t = a?.b?.(c)[d];",
    "async function f() { for await (const x of y) { await x; } }",
    "(a, b) => a + b; async x => x; ({ a, b: 1, [c]: 2, get d() { return 1; }, ...e });",
    "switch (x) { case 1: break; default: y = z ?? 0; }",
    "try { throw new Error('x'); } catch ({ message }) { } finally { }",
    "x = a ? b : c, d; delete a.b; typeof void 0; ++i; j--;",
    "tag`a\\u{${b}`; `multi\nline ${x} end`",
    "'use strict';\nfunction g() { return function () { return new.target; }; }",
];

const MODULE: &str = "import a, { b as c } from 'm';\n\
import * as ns from 'n';\n\
export const d = 1;\n\
export { c as e };\n\
export default class {}\n\
export * from 'o';\n\
await import.meta.x;\n";

fn full_options() -> Options {
    Options {
        loc: true,
        ranges: true,
        ..Options::default()
    }
}

/// 1-based line and UTF-16 column of a byte offset
fn position_at(source: &str, offset: usize) -> Value {
    let mut line = 1;
    let mut column = 0;
    let mut chars = source.get(..offset).unwrap_or("").chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' | '\u{2028}' | '\u{2029}' => {
                line += 1;
                column = 0;
            }
            c => column += c.len_utf16(),
        }
    }
    json!({"line": line, "column": column})
}

/// Walk every node, checking it against the source and its parent's extent
fn check_node(source: &str, node: &Value, parent: (u64, u64)) {
    match node {
        Value::Array(items) => {
            for item in items {
                check_node(source, item, parent);
            }
        }
        Value::Object(map) => {
            let mut extent = parent;
            if map.contains_key("type") {
                let start = map.get("start").and_then(Value::as_u64);
                let end = map.get("end").and_then(Value::as_u64);
                let (Some(start), Some(end)) = (start, end) else {
                    panic!("node without offsets: {}", node);
                };
                assert!(start <= end, "inverted span: {}", node);
                assert!(end as usize <= source.len(), "span past end: {}", node);
                assert!(
                    parent.0 <= start && end <= parent.1,
                    "node {}..{} escapes parent {}..{}: {}",
                    start,
                    end,
                    parent.0,
                    parent.1,
                    node
                );
                assert_eq!(map.get("range"), Some(&json!([start, end])));

                let loc = map.get("loc").cloned().unwrap_or(Value::Null);
                assert_eq!(loc["start"], position_at(source, start as usize), "loc.start of {}", node);
                assert_eq!(loc["end"], position_at(source, end as usize), "loc.end of {}", node);

                if map.get("type") == Some(&json!("Identifier")) {
                    let text = source.get(start as usize..end as usize);
                    assert_eq!(text, map.get("name").and_then(Value::as_str), "identifier text");
                }
                extent = (start, end);
            }
            for (key, child) in map {
                if key != "loc" && key != "range" {
                    check_node(source, child, extent);
                }
            }
        }
        _ => {}
    }
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_script_spans_are_consistent() {
    for source in SCRIPTS {
        let json = parse_script(source, &full_options()).unwrap().to_json().unwrap();
        assert_eq!(json["start"], 0);
        assert_eq!(json["end"], source.len());
        check_node(source, &json, (0, source.len() as u64));
    }
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_module_spans_are_consistent() {
    let json = parse_module(MODULE, &full_options()).unwrap().to_json().unwrap();
    assert_eq!(json["body"].as_array().map(Vec::len), Some(7));
    check_node(MODULE, &json, (0, MODULE.len() as u64));
}

/// The tree with every position field removed
fn without_positions(node: &Value) -> Value {
    match node {
        Value::Array(items) => Value::Array(items.iter().map(without_positions).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !matches!(key.as_str(), "start" | "end" | "range" | "loc"))
                .map(|(key, child)| (key.clone(), without_positions(child)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Rebuild a source from the slices of its top-level statements
fn reconstruct(source: &str, program: &Value) -> String {
    let mut pieces = Vec::new();
    for statement in program["body"].as_array().into_iter().flatten() {
        let start = statement["start"].as_u64().unwrap_or(0) as usize;
        let end = statement["end"].as_u64().unwrap_or(0) as usize;
        pieces.push(source.get(start..end).unwrap_or(""));
    }
    pieces.join("\n")
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_reparsing_statement_slices_gives_the_same_tree() {
    for source in SCRIPTS {
        let json = parse_script(source, &Options::default()).unwrap().to_json().unwrap();
        let rebuilt = reconstruct(source, &json);
        let reparsed = parse_script(&rebuilt, &Options::default()).unwrap().to_json().unwrap();
        assert_eq!(without_positions(&json), without_positions(&reparsed), "{}", rebuilt);
    }

    let json = parse_module(MODULE, &Options::default()).unwrap().to_json().unwrap();
    let rebuilt = reconstruct(MODULE, &json);
    let reparsed = parse_module(&rebuilt, &Options::default()).unwrap().to_json().unwrap();
    assert_eq!(without_positions(&json), without_positions(&reparsed));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_location_of_a_simple_node() {
    let json = parse_script("a\n  bb", &full_options()).unwrap().to_json().unwrap();
    let id = &json["body"][1]["expression"];
    assert_eq!(
        id,
        &json!({
            "type": "Identifier",
            "name": "bb",
            "start": 4,
            "end": 6,
            "range": [4, 6],
            "loc": {
                "start": {"line": 2, "column": 2},
                "end": {"line": 2, "column": 4}
            }
        })
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_program_covers_leading_and_trailing_trivia() {
    let source = "// lead\n  x  /* trail */\n";
    let json = parse_script(source, &full_options()).unwrap().to_json().unwrap();
    assert_eq!(json["loc"]["start"], json!({"line": 1, "column": 0}));
    assert_eq!(json["loc"]["end"], json!({"line": 3, "column": 0}));
    assert_eq!(json["body"][0]["start"], 10);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_template_element_excludes_delimiters() {
    let json = parse_script("`ab${c}d`", &full_options()).unwrap().to_json().unwrap();
    let quasis = &json["body"][0]["expression"]["quasis"];
    assert_eq!((quasis[0]["start"].clone(), quasis[0]["end"].clone()), (json!(1), json!(3)));
    assert_eq!((quasis[1]["start"].clone(), quasis[1]["end"].clone()), (json!(7), json!(8)));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_locations_are_omitted_by_default() {
    let json = parse_script("x", &Options::default()).unwrap().to_json().unwrap();
    assert!(json.get("loc").is_none());
    assert!(json.get("range").is_none());
    assert!(json["body"][0].get("loc").is_none());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_options_from_json() {
    let options = Options::from_json(r#"{"module": true, "loc": true, "globalReturn": false}"#).unwrap();
    assert!(options.module);
    assert!(options.loc);
    assert!(!options.ranges);

    let json = ecmaparse::parse("export {}", &options).unwrap().to_json().unwrap();
    assert_eq!(json["sourceType"], "module");
    assert_eq!(json["body"][0]["loc"]["end"], json!({"line": 1, "column": 9}));
}
