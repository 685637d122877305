//! Tests for the parser
//!
//! These tests verify that the parser produces the expected ESTree shape
//! for scripts and modules.

use ecmaparse::{ErrorKind, Options, ParseError, parse_module, parse_script};
use serde_json::{Value, json};

#[allow(clippy::unwrap_used)]
fn parse(source: &str) -> Value {
    parse_script(source, &Options::default()).unwrap().to_json().unwrap()
}

#[allow(clippy::unwrap_used)]
fn parse_mod(source: &str) -> Value {
    parse_module(source, &Options::default()).unwrap().to_json().unwrap()
}

#[allow(clippy::unwrap_used)]
fn parse_err(source: &str) -> ParseError {
    parse_script(source, &Options::default()).unwrap_err()
}

/// Expression of the first statement
fn expr(program: &Value) -> &Value {
    &program["body"][0]["expression"]
}

#[test]
fn test_variable_declaration() {
    let prog = parse("let x = 1;");
    let decl = &prog["body"][0];
    assert_eq!(decl["type"], "VariableDeclaration");
    assert_eq!(decl["kind"], "let");
    assert_eq!((decl["start"].clone(), decl["end"].clone()), (json!(0), json!(10)));

    let declarator = &decl["declarations"][0];
    assert_eq!(declarator["id"], json!({"type": "Identifier", "name": "x", "start": 4, "end": 5}));
    assert_eq!(declarator["init"]["value"], 1);
    assert_eq!(declarator["end"], 9);
}

#[test]
fn test_variable_declaration_spans_include_semicolon() {
    for source in ["var a, b;", "const c = 2;", "let [d] = e;"] {
        let prog = parse(source);
        assert_eq!(prog["body"][0]["end"], source.len(), "{}", source);
    }

    // without a semicolon the declaration ends at its last token
    let prog = parse("var a = 1\nb");
    assert_eq!(prog["body"][0]["end"], 9);

    let prog = parse_mod("export var a = 1;");
    let declaration = &prog["body"][0]["declaration"];
    assert_eq!((declaration["start"].clone(), declaration["end"].clone()), (json!(7), json!(17)));
    assert_eq!(prog["body"][0]["end"], 17);
}

#[test]
fn test_program_shape() {
    let prog = parse("x");
    assert_eq!(prog["type"], "Program");
    assert_eq!(prog["sourceType"], "script");
    assert_eq!(parse_mod("x")["sourceType"], "module");
}

#[test]
fn test_binary_precedence() {
    let prog = parse("1 + 2 * 3");
    let e = expr(&prog);
    assert_eq!(e["type"], "BinaryExpression");
    assert_eq!(e["operator"], "+");
    assert_eq!(e["right"]["operator"], "*");
}

#[test]
fn test_exponent_is_right_associative() {
    let prog = parse("a ** b ** c");
    let e = expr(&prog);
    assert_eq!(e["operator"], "**");
    assert_eq!(e["left"]["name"], "a");
    assert_eq!(e["right"]["operator"], "**");
}

#[test]
fn test_logical_and_coalesce() {
    let prog = parse("a ?? (b || c)");
    let e = expr(&prog);
    assert_eq!(e["type"], "LogicalExpression");
    assert_eq!(e["operator"], "??");
    assert_eq!(e["right"]["operator"], "||");
}

#[test]
fn test_sequence_and_conditional() {
    let prog = parse("a, b ? c : d");
    let e = expr(&prog);
    assert_eq!(e["type"], "SequenceExpression");
    assert_eq!(e["expressions"][1]["type"], "ConditionalExpression");
    assert_eq!(e["expressions"][1]["alternate"]["name"], "d");
}

#[test]
fn test_arrow_functions() {
    let prog = parse("(a, b) => a + b");
    let e = expr(&prog);
    assert_eq!(e["type"], "ArrowFunctionExpression");
    assert_eq!(e["params"].as_array().map(Vec::len), Some(2));
    assert_eq!(e["expression"], true);
    assert_eq!(e["async"], false);

    let prog = parse("async x => { await x; }");
    let e = expr(&prog);
    assert_eq!(e["async"], true);
    assert_eq!(e["expression"], false);
    assert_eq!(e["params"][0]["name"], "x");
    assert_eq!(e["body"]["body"][0]["expression"]["type"], "AwaitExpression");
}

#[test]
fn test_async_call_is_not_arrow() {
    let prog = parse("async(a)");
    let e = expr(&prog);
    assert_eq!(e["type"], "CallExpression");
    assert_eq!(e["callee"]["name"], "async");
}

#[test]
fn test_object_literal_members() {
    let prog = parse("({a, b: 1, [c]: 2, d() {}, get e() { return 1; }, ...f})");
    let props = &expr(&prog)["properties"];
    assert_eq!(expr(&prog)["type"], "ObjectExpression");
    assert_eq!(props[0]["shorthand"], true);
    assert_eq!(props[1]["shorthand"], false);
    assert_eq!(props[2]["computed"], true);
    assert_eq!(props[3]["method"], true);
    assert_eq!(props[3]["value"]["type"], "FunctionExpression");
    assert_eq!(props[4]["kind"], "get");
    assert_eq!(props[5]["type"], "SpreadElement");
}

#[test]
fn test_parenthesized_expression_has_inner_span() {
    let prog = parse("(a)");
    assert_eq!(expr(&prog), &json!({"type": "Identifier", "name": "a", "start": 1, "end": 2}));
}

#[test]
fn test_class_members() {
    let prog = parse(
        "class A extends B { #x = 1; static y; constructor() { super(); } get #z() { return this.#x; } static { A.y = 2; } }",
    );
    let class = &prog["body"][0];
    assert_eq!(class["type"], "ClassDeclaration");
    assert_eq!(class["superClass"]["name"], "B");

    let members = &class["body"]["body"];
    assert_eq!(members[0]["type"], "PropertyDefinition");
    assert_eq!(members[0]["key"]["type"], "PrivateIdentifier");
    assert_eq!(members[0]["key"]["name"], "x");
    assert_eq!(members[1]["static"], true);
    assert_eq!(members[1]["value"], Value::Null);
    assert_eq!(members[2]["kind"], "constructor");
    assert_eq!(members[3]["kind"], "get");
    assert_eq!(members[4]["type"], "StaticBlock");
}

#[test]
fn test_class_expression() {
    let prog = parse("x = class {}");
    let class = &expr(&prog)["right"];
    assert_eq!(class["type"], "ClassExpression");
    assert_eq!(class["id"], Value::Null);
}

#[test]
fn test_template_literal() {
    let prog = parse("`a${b}c${d}e`");
    let e = expr(&prog);
    assert_eq!(e["type"], "TemplateLiteral");
    assert_eq!(e["quasis"].as_array().map(Vec::len), Some(3));
    assert_eq!(e["expressions"].as_array().map(Vec::len), Some(2));
    assert_eq!(e["quasis"][0]["value"], json!({"raw": "a", "cooked": "a"}));
    assert_eq!(e["quasis"][0]["tail"], false);
    assert_eq!(e["quasis"][2]["tail"], true);
}

#[test]
fn test_tagged_template_allows_invalid_escapes() {
    let prog = parse(r"tag`\unicode`");
    let e = expr(&prog);
    assert_eq!(e["type"], "TaggedTemplateExpression");
    assert_eq!(e["quasi"]["quasis"][0]["value"], json!({"raw": r"\unicode", "cooked": null}));

    let err = parse_err(r"`\unicode`");
    assert_eq!(err.kind(), ErrorKind::Lexical);
}

#[test]
fn test_optional_chain_is_wrapped() {
    let prog = parse("a?.b.c");
    let e = expr(&prog);
    assert_eq!(e["type"], "ChainExpression");
    assert_eq!(e["expression"]["type"], "MemberExpression");
    assert_eq!(e["expression"]["optional"], false);
    assert_eq!(e["expression"]["object"]["optional"], true);
}

#[test]
fn test_directives() {
    let prog = parse("\"use strict\"; x; 'not a directive'");
    assert_eq!(prog["body"][0]["directive"], "use strict");
    assert!(prog["body"][1].get("directive").is_none());
    assert!(prog["body"][2].get("directive").is_none());
}

#[test]
fn test_asi_before_prefix_update() {
    let prog = parse("a\n++b");
    assert_eq!(prog["body"].as_array().map(Vec::len), Some(2));
    assert_eq!(prog["body"][1]["expression"]["type"], "UpdateExpression");
    assert_eq!(prog["body"][1]["expression"]["prefix"], true);
}

#[test]
fn test_asi_after_return() {
    let prog = parse("function f() { return\nx }");
    let body = &prog["body"][0]["body"]["body"];
    assert_eq!(body[0]["type"], "ReturnStatement");
    assert_eq!(body[0]["argument"], Value::Null);
    assert_eq!(body[1]["type"], "ExpressionStatement");
}

#[test]
fn test_no_asi_before_parenthesis() {
    let prog = parse("a = b\n(c)");
    assert_eq!(prog["body"].as_array().map(Vec::len), Some(1));
    assert_eq!(expr(&prog)["right"]["type"], "CallExpression");
}

#[test]
fn test_regexp_literal() {
    let prog = parse("x = /ab+c/g");
    let regex = &expr(&prog)["right"];
    assert_eq!(regex["type"], "Literal");
    assert_eq!(regex["value"], Value::Null);
    assert_eq!(regex["regex"], json!({"pattern": "ab+c", "flags": "g"}));
}

#[test]
fn test_slash_after_expression_is_division() {
    let prog = parse("a\n/b/g");
    let e = expr(&prog);
    assert_eq!(e["operator"], "/");
    assert_eq!(e["left"]["operator"], "/");
    assert_eq!(e["right"]["name"], "g");
}

#[test]
fn test_literals() {
    let prog = parse("null; true; 10n; 'a'; 1.5");
    let values: Vec<Value> = (0..5).map(|i| prog["body"][i]["expression"]["value"].clone()).collect();
    assert_eq!(values, vec![Value::Null, json!(true), Value::Null, json!("a"), json!(1.5)]);
    assert_eq!(prog["body"][2]["expression"]["bigint"], "10");
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_raw_option() {
    let options = Options {
        raw: true,
        ..Options::default()
    };
    let prog = parse_script("0x10", &options).unwrap().to_json().unwrap();
    assert_eq!(expr(&prog)["raw"], "0x10");
    assert_eq!(expr(&prog)["value"], 16);
    assert!(expr(&parse("0x10")).get("raw").is_none());

    let prog = parse_script("x = /a+/u", &options).unwrap().to_json().unwrap();
    let regex = &expr(&prog)["right"];
    assert_eq!(regex["raw"], "/a+/u");
    assert_eq!((regex["start"].clone(), regex["end"].clone()), (json!(4), json!(9)));
}

#[test]
fn test_labels_and_break() {
    let prog = parse("outer: for (;;) { break outer; }");
    let labeled = &prog["body"][0];
    assert_eq!(labeled["type"], "LabeledStatement");
    assert_eq!(labeled["label"]["name"], "outer");
    assert_eq!(labeled["body"]["type"], "ForStatement");
    assert_eq!(labeled["body"]["body"]["body"][0]["label"]["name"], "outer");
}

#[test]
fn test_switch_statement() {
    let prog = parse("switch (x) { case 1: y; default: z }");
    let cases = &prog["body"][0]["cases"];
    assert_eq!(cases.as_array().map(Vec::len), Some(2));
    assert_eq!(cases[0]["test"]["value"], 1);
    assert_eq!(cases[1]["test"], Value::Null);
}

#[test]
fn test_try_with_optional_catch_binding() {
    let prog = parse("try {} catch {} finally {}");
    let stmt = &prog["body"][0];
    assert_eq!(stmt["handler"]["param"], Value::Null);
    assert_eq!(stmt["finalizer"]["type"], "BlockStatement");
}

#[test]
fn test_do_while_semicolon_is_optional() {
    let prog = parse("do x; while (y) z");
    assert_eq!(prog["body"].as_array().map(Vec::len), Some(2));
    assert_eq!(prog["body"][0]["type"], "DoWhileStatement");
}

#[test]
fn test_new_and_meta_property() {
    let prog = parse("function f() { return new.target; }");
    let meta = &prog["body"][0]["body"]["body"][0]["argument"];
    assert_eq!(meta["type"], "MetaProperty");
    assert_eq!(meta["meta"]["name"], "new");
    assert_eq!(meta["property"]["name"], "target");

    let prog = parse("new a.b(c)");
    let e = expr(&prog);
    assert_eq!(e["type"], "NewExpression");
    assert_eq!(e["callee"]["type"], "MemberExpression");
    assert_eq!(e["arguments"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_generators_and_async_functions() {
    let prog = parse("function* g() { yield* x; }");
    let func = &prog["body"][0];
    assert_eq!(func["generator"], true);
    assert_eq!(func["body"]["body"][0]["expression"]["delegate"], true);

    let prog = parse("async function f() { await x; }");
    assert_eq!(prog["body"][0]["async"], true);
    assert_eq!(prog["body"][0]["generator"], false);
}

#[test]
fn test_await_is_identifier_in_scripts() {
    let prog = parse("await(x)");
    assert_eq!(expr(&prog)["type"], "CallExpression");
    assert_eq!(expr(&prog)["callee"]["name"], "await");
}

#[test]
fn test_spread_arguments() {
    let prog = parse("f(...a, b)");
    let args = &expr(&prog)["arguments"];
    assert_eq!(args[0]["type"], "SpreadElement");
    assert_eq!(args[1]["type"], "Identifier");
}

#[test]
fn test_binding_patterns() {
    let prog = parse("const { a, b: [c = 1] } = o;");
    let id = &prog["body"][0]["declarations"][0]["id"];
    assert_eq!(id["type"], "ObjectPattern");
    assert_eq!(id["properties"][0]["shorthand"], true);
    assert_eq!(id["properties"][1]["value"]["type"], "ArrayPattern");
    assert_eq!(id["properties"][1]["value"]["elements"][0]["type"], "AssignmentPattern");
}

#[test]
fn test_assignment_patterns() {
    let prog = parse("[a, ...b] = c");
    let left = &expr(&prog)["left"];
    assert_eq!(left["type"], "ArrayPattern");
    assert_eq!(left["elements"][1]["type"], "RestElement");

    let prog = parse("({ a = 1 } = b)");
    let left = &expr(&prog)["left"];
    assert_eq!(left["type"], "ObjectPattern");
    assert_eq!(left["properties"][0]["value"]["type"], "AssignmentPattern");
}

#[test]
fn test_module_declarations() {
    let prog = parse_mod("import a, { b as c } from 'x'; export { c }; export default function () {}");
    let import = &prog["body"][0];
    assert_eq!(import["type"], "ImportDeclaration");
    assert_eq!(import["specifiers"][0]["type"], "ImportDefaultSpecifier");
    assert_eq!(import["specifiers"][1]["imported"]["name"], "b");
    assert_eq!(import["specifiers"][1]["local"]["name"], "c");
    assert_eq!(import["source"]["value"], "x");

    assert_eq!(prog["body"][1]["type"], "ExportNamedDeclaration");
    assert_eq!(prog["body"][1]["specifiers"][0]["exported"]["name"], "c");

    let default = &prog["body"][2];
    assert_eq!(default["type"], "ExportDefaultDeclaration");
    assert_eq!(default["declaration"]["type"], "FunctionDeclaration");
    assert_eq!(default["declaration"]["id"], Value::Null);
}

#[test]
fn test_export_star_as_name() {
    let prog = parse_mod("export * as ns from 'x';");
    let stmt = &prog["body"][0];
    assert_eq!(stmt["type"], "ExportAllDeclaration");
    assert_eq!(stmt["exported"]["name"], "ns");
}

#[test]
fn test_module_only_syntax() {
    let prog = parse_mod("await x; import.meta.url");
    assert_eq!(prog["body"][0]["expression"]["type"], "AwaitExpression");
    assert_eq!(prog["body"][1]["expression"]["object"]["type"], "MetaProperty");

    assert_eq!(parse_err("import x from 'y';").kind(), ErrorKind::Syntax);
    assert_eq!(parse_err("import.meta").kind(), ErrorKind::Syntax);
}

#[test]
fn test_html_comments_only_in_scripts() {
    let prog = parse("x = 1 <!-- y\n");
    assert_eq!(prog["body"].as_array().map(Vec::len), Some(1));
    assert_eq!(expr(&prog)["right"]["value"], 1);

    let prog = parse("x\n--> ignored");
    assert_eq!(prog["body"].as_array().map(Vec::len), Some(1));

    let err = parse_module("x\n--> y", &Options::default()).err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Syntax));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_global_return_option() {
    assert_eq!(parse_err("return 1").message(), "Illegal return statement");

    let options = Options {
        global_return: true,
        ..Options::default()
    };
    let prog = parse_script("return 1", &options).unwrap().to_json().unwrap();
    assert_eq!(prog["body"][0]["type"], "ReturnStatement");
}

#[test]
fn test_syntax_errors() {
    for source in [
        "a ?? b || c",
        "a || b ?? c",
        "-a ** b",
        "if (x) let y = 1;",
        "let x = ;",
        "throw\nx",
        "try {}",
        "switch (x) { default: default: }",
        "x = { a = 1 }",
        "a?.b = 1",
    ] {
        let err = parse_script(source, &Options::default()).err();
        assert!(err.is_some(), "expected failure: {}", source);
    }
}

#[test]
fn test_error_display() {
    let err = parse_err("var = 1;");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.to_string(), "SyntaxError: Unexpected token '=' (1:4)");
}
