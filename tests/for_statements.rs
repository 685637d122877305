//! Tests for `for`, `for-in`, `for-of` and `for await` heads

use ecmaparse::{ErrorKind, Options, ParseError, parse_module, parse_script};
use serde_json::{Value, json};

#[allow(clippy::unwrap_used)]
fn parse(source: &str) -> Value {
    parse_script(source, &Options::default()).unwrap().to_json().unwrap()
}

#[allow(clippy::unwrap_used)]
fn parse_err(source: &str) -> ParseError {
    parse_script(source, &Options::default()).unwrap_err()
}

fn first(program: &Value) -> &Value {
    &program["body"][0]
}

#[test]
fn test_for_of_with_identifier_target() {
    let prog = parse("for (a of b);");
    assert_eq!(
        first(&prog),
        &json!({
            "type": "ForOfStatement",
            "left": {"type": "Identifier", "name": "a", "start": 5, "end": 6},
            "right": {"type": "Identifier", "name": "b", "start": 10, "end": 11},
            "body": {"type": "EmptyStatement", "start": 12, "end": 13},
            "await": false,
            "start": 0,
            "end": 13
        })
    );
}

#[test]
fn test_for_in_with_let_array_pattern() {
    let prog = parse("for (let [x] in y);");
    let stmt = first(&prog);
    assert_eq!(stmt["type"], "ForInStatement");
    assert_eq!(stmt["left"]["type"], "VariableDeclaration");
    assert_eq!(stmt["left"]["kind"], "let");

    let declarator = &stmt["left"]["declarations"][0];
    assert_eq!(declarator["id"]["type"], "ArrayPattern");
    assert_eq!(declarator["id"]["elements"][0]["name"], "x");
    assert_eq!(declarator["init"], Value::Null);
}

#[test]
fn test_for_of_rejects_sequence_on_the_right() {
    let err = parse_err("for (let x of a,b) c");
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_for_of_array_target_with_nested_assignment_default() {
    let prog = parse("for ([ a = b = c ] of d) ;");
    let stmt = first(&prog);
    assert_eq!(stmt["type"], "ForOfStatement");

    let element = &stmt["left"]["elements"][0];
    assert_eq!(stmt["left"]["type"], "ArrayPattern");
    assert_eq!(element["type"], "AssignmentPattern");
    assert_eq!(element["left"]["name"], "a");
    assert_eq!(element["right"]["type"], "AssignmentExpression");
    assert_eq!(element["right"]["operator"], "=");
    assert_eq!(element["right"]["left"]["name"], "b");
    assert_eq!(element["right"]["right"]["name"], "c");
}

#[test]
fn test_for_of_rejects_multiple_bindings() {
    let err = parse_err("for (var i, j of {}) {}");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.message(), "Invalid left-hand side in for-of loop: Must have a single binding");
    assert_eq!(err.location().offset, 5);
}

#[test]
fn test_let_is_an_identifier_on_the_right_of_of() {
    let prog = parse("for (x of let) {}");
    let stmt = first(&prog);
    assert_eq!(stmt["type"], "ForOfStatement");
    assert_eq!(stmt["right"]["name"], "let");
}

#[test]
fn test_c_style_loops() {
    let prog = parse("for (var i = 0, j = 1; i < j; i++, j--) {}");
    let stmt = first(&prog);
    assert_eq!(stmt["type"], "ForStatement");
    assert_eq!(stmt["init"]["type"], "VariableDeclaration");
    assert_eq!(stmt["init"]["declarations"].as_array().map(Vec::len), Some(2));
    assert_eq!(stmt["test"]["operator"], "<");
    assert_eq!(stmt["update"]["type"], "SequenceExpression");

    let prog = parse("for (;;);");
    let stmt = first(&prog);
    assert_eq!((stmt["init"].clone(), stmt["test"].clone(), stmt["update"].clone()), (Value::Null, Value::Null, Value::Null));
}

#[test]
fn test_in_is_allowed_inside_parens_in_init() {
    let prog = parse("for (var x = (a in b); ;) break;");
    let init = &first(&prog)["init"]["declarations"][0]["init"];
    assert_eq!(init["operator"], "in");
}

#[test]
fn test_let_as_expression_head() {
    let prog = parse("for (let;;);");
    assert_eq!(first(&prog)["init"], json!({"type": "Identifier", "name": "let", "start": 5, "end": 8}));

    let prog = parse("for (let in o);");
    assert_eq!(first(&prog)["type"], "ForInStatement");
    assert_eq!(first(&prog)["left"]["name"], "let");
}

#[test]
fn test_member_and_parenthesized_targets() {
    let prog = parse("for (x.y of z);");
    assert_eq!(first(&prog)["left"]["type"], "MemberExpression");

    let prog = parse("for ((a) in b);");
    assert_eq!(first(&prog)["left"], json!({"type": "Identifier", "name": "a", "start": 6, "end": 7}));
}

#[test]
fn test_object_pattern_target() {
    let prog = parse("for ({ a, b: [c] } of d);");
    let left = &first(&prog)["left"];
    assert_eq!(left["type"], "ObjectPattern");
    assert_eq!(left["properties"][1]["value"]["type"], "ArrayPattern");
}

#[test]
fn test_legacy_var_initializer_in_for_in() {
    let prog = parse("for (var x = 0 in o);");
    assert_eq!(first(&prog)["left"]["declarations"][0]["init"]["value"], 0);

    let strict = parse_err("'use strict'; for (var x = 0 in o);");
    assert_eq!(strict.message(), "for-in loop variable declaration may not have an initializer");

    let options = Options {
        disable_web_compat: true,
        ..Options::default()
    };
    assert!(parse_script("for (var x = 0 in o);", &options).is_err());
}

#[test]
fn test_for_head_errors() {
    for (source, message) in [
        ("for (let x = 1 of y);", "for-of loop variable declaration may not have an initializer"),
        ("for (var x = 1 of y);", "for-of loop variable declaration may not have an initializer"),
        ("for (let [x] = [] in y);", "for-in loop variable declaration may not have an initializer"),
        ("for (let.x of y);", "The left-hand side of a for-of loop may not start with let"),
        ("for (let x, y in z);", "Invalid left-hand side in for-in loop: Must have a single binding"),
    ] {
        let err = parse_err(source);
        assert_eq!(err.kind(), ErrorKind::Syntax, "{}", source);
        assert_eq!(err.message(), message, "{}", source);
    }
}

#[test]
fn test_invalid_targets() {
    for source in [
        "for (a + b of c);",
        "for (f() in o);",
        "for ([a + b] of c);",
        "for (let of x);",
        "for (async of x);",
        "for (const x;;);",
        "for (x of y z);",
        "for (x in y of) ;",
        "function f(){ for (x of y;) {} }",
    ] {
        assert!(parse_script(source, &Options::default()).is_err(), "expected failure: {}", source);
    }
}

#[test]
fn test_pattern_heads_reject_initializers() {
    for (pattern, kind) in [("[a]", "ArrayPattern"), ("{a}", "ObjectPattern"), ("[a, ...b]", "ArrayPattern")] {
        let source = format!("for ({} of {{}}) ;", pattern);
        let prog = parse(&source);
        assert_eq!(first(&prog)["left"]["type"], kind, "{}", source);

        let with_init = format!("for ({} = 0 of {{}}) ;", pattern);
        assert!(parse_script(&with_init, &Options::default()).is_err(), "{}", with_init);
    }
}

#[test]
fn test_loop_scope_conflicts() {
    for source in ["for (let x;;) { var x; }", "for (let x of y) { var x; }", "for (const x in y) { var x; }"] {
        let err = parse_err(source);
        assert_eq!(err.kind(), ErrorKind::Early, "{}", source);
        assert_eq!(err.message(), "Identifier 'x' has already been declared", "{}", source);
    }

    // each loop has its own scope
    assert!(parse_script("for (let x;;); for (let x;;); let y; for (let y of z);", &Options::default()).is_ok());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_for_await() {
    let prog = parse_module("for await (x of y);", &Options::default())
        .unwrap()
        .to_json()
        .unwrap();
    assert_eq!(first(&prog)["type"], "ForOfStatement");
    assert_eq!(first(&prog)["await"], true);

    let prog = parse("async function f() { for await (const x of y) {} }");
    assert_eq!(first(&prog)["body"]["body"][0]["await"], true);

    assert!(parse_err("for await (x of y);").kind() == ErrorKind::Syntax);
    for source in ["for await (x in y);", "for await (;;);", "for await (x;;);"] {
        let err = parse_module(source, &Options::default()).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Syntax), "{}", source);
    }
}

#[test]
fn test_async_target_is_allowed_in_for_await() {
    let prog = parse("async function f() { for await (async of x); }");
    let left = &first(&prog)["body"]["body"][0]["left"];
    assert_eq!(left["name"], "async");

    // an async arrow with a parameter named `of` starts a C-style head
    let prog = parse("for (async of => {}; ;) break;");
    assert_eq!(first(&prog)["init"]["type"], "ArrowFunctionExpression");
    assert_eq!(first(&prog)["init"]["async"], true);
}

#[test]
fn test_loop_body_restrictions() {
    assert_eq!(parse_err("for (;;) let x = 1;").kind(), ErrorKind::Syntax);
    assert_eq!(parse_err("for (x of y) class C {}").kind(), ErrorKind::Syntax);
    assert!(parse_script("for (;;) continue;", &Options::default()).is_ok());
    assert_eq!(parse_err("continue;").kind(), ErrorKind::Syntax);
}
