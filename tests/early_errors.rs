//! Tests for error classification: static semantic (early) errors versus
//! grammar and token errors, and where each is reported.

use ecmaparse::{ErrorKind, Options, ParseError, parse_module, parse_script};

fn script_err(source: &str) -> Option<ParseError> {
    parse_script(source, &Options::default()).err()
}

fn module_err(source: &str) -> Option<ParseError> {
    parse_module(source, &Options::default()).err()
}

fn kind_and_message(err: Option<ParseError>) -> Option<(ErrorKind, String)> {
    err.map(|e| (e.kind(), e.message().to_string()))
}

fn early(message: &str) -> Option<(ErrorKind, String)> {
    Some((ErrorKind::Early, message.to_string()))
}

fn syntax(message: &str) -> Option<(ErrorKind, String)> {
    Some((ErrorKind::Syntax, message.to_string()))
}

#[test]
fn test_redeclarations() {
    for source in [
        "let a; let a;",
        "let a; var a;",
        "var a; let a;",
        "const a = 1; function a() {}",
        "{ function a() {} let a; }",
        "{ let a; { var a; } }",
        "class a {} var a;",
        "var a; const a = 1;",
        "{ var a; const a = 1; }",
    ] {
        assert_eq!(
            kind_and_message(script_err(source)),
            early("Identifier 'a' has already been declared"),
            "{}",
            source
        );
    }
}

#[test]
fn test_allowed_redeclarations() {
    for source in [
        "var a; var a;",
        "function a() {} var a;",
        "function a() {} function a() {}",
        "{ let a; } { let a; }",
        "let a; { let a; }",
        "try {} catch (e) { var e; }",
        "function f(a) { var a; }",
    ] {
        assert!(script_err(source).is_none(), "{}", source);
    }
}

#[test]
fn test_module_top_level_functions_are_lexical() {
    assert_eq!(
        kind_and_message(module_err("function a() {} function a() {}")),
        early("Identifier 'a' has already been declared")
    );
}

#[test]
fn test_redeclaration_location() {
    let err = script_err("let a;\nlet a;");
    let location = err.map(|e| e.location());
    assert_eq!(location.map(|l| (l.offset, l.line, l.column)), Some((11, 2, 4)));
}

#[test]
fn test_strict_mode_errors() {
    assert_eq!(
        kind_and_message(script_err("'use strict'; with (a) {}")),
        early("Strict mode code may not include a with statement")
    );
    assert_eq!(
        kind_and_message(script_err("'use strict'; 010")),
        early("Octal literals are not allowed in strict mode")
    );
    assert_eq!(
        kind_and_message(script_err(r"'use strict'; '\07'")),
        early("Octal escape sequences are not allowed in strict mode")
    );
    assert_eq!(
        kind_and_message(script_err("'use strict'; eval = 1")),
        early("Assigning to eval in strict mode")
    );
    assert_eq!(
        kind_and_message(script_err("'use strict'; delete x")),
        early("Deleting local variable in strict mode")
    );
    assert_eq!(
        kind_and_message(script_err("'use strict'; function f(a, a) {}")),
        early("Argument name clash")
    );

    // the same code is fine outside strict mode
    for source in ["with (a) {}", "010", r"'\07'", "eval = 1", "delete x", "function f(a, a) {}"] {
        assert!(script_err(source).is_none(), "{}", source);
    }
}

#[test]
fn test_implied_strict_option() {
    let options = Options {
        implied_strict: true,
        ..Options::default()
    };
    let err = parse_script("with (a) {}", &options).err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Early));
}

#[test]
fn test_parameter_errors() {
    assert_eq!(kind_and_message(script_err("(a, a) => 1")), early("Argument name clash"));
    assert_eq!(
        kind_and_message(script_err("function f(a = 1) { 'use strict'; }")),
        early("Illegal 'use strict' directive in function with non-simple parameter list")
    );
    assert_eq!(
        kind_and_message(script_err("({ get a(x) {} })")),
        early("Getter must not have any formal parameters")
    );
    assert_eq!(
        kind_and_message(script_err("({ set a(...x) {} })")),
        early("Setter cannot use rest params")
    );
}

#[test]
fn test_labels_and_jumps() {
    assert_eq!(kind_and_message(script_err("a: a: ;")), early("Label 'a' is already declared"));
    assert_eq!(kind_and_message(script_err("break;")), syntax("Illegal break statement"));
    assert_eq!(
        kind_and_message(script_err("x: while (1) continue y;")),
        syntax("Undefined label 'y'")
    );
    assert!(script_err("a: { break a; } a: ;").is_none());
}

#[test]
fn test_invalid_assignment_targets() {
    assert_eq!(kind_and_message(script_err("1 = 2")), early("Assigning to rvalue"));
    assert_eq!(
        kind_and_message(script_err("a() += 1")),
        early("Invalid left-hand side in assignment")
    );
    assert_eq!(
        kind_and_message(script_err("a?.b = 1")),
        early("Optional chaining cannot appear in left-hand side")
    );
    assert_eq!(kind_and_message(script_err("++f()")), early("Invalid left-hand side in assignment"));
}

#[test]
fn test_object_literal_errors() {
    assert_eq!(
        kind_and_message(script_err("({ __proto__: 1, __proto__: 2 })")),
        early("Redefinition of __proto__ property")
    );
    assert!(script_err("({ __proto__: a, __proto__: b } = c)").is_none());
    assert_eq!(
        kind_and_message(script_err("({ a = 1 })")),
        syntax("Shorthand property assignments are valid only in destructuring patterns")
    );
}

#[test]
fn test_class_errors() {
    assert_eq!(
        kind_and_message(script_err("class A { constructor() {} constructor() {} }")),
        early("Duplicate constructor in the same class")
    );
    assert_eq!(
        kind_and_message(script_err("class A { #a; #a; }")),
        early("Identifier '#a' has already been declared")
    );
    assert_eq!(
        kind_and_message(script_err("class A { m() { this.#b; } }")),
        early("Private field '#b' must be declared in an enclosing class")
    );
    assert_eq!(
        kind_and_message(script_err("class A { get constructor() {} }")),
        early("Constructor can't have get/set modifier")
    );
    assert_eq!(
        kind_and_message(script_err("class A { constructor = 1 }")),
        early("Classes can't have a field named 'constructor'")
    );
    assert_eq!(kind_and_message(script_err("function f() { super(); }")).map(|k| k.0), Some(ErrorKind::Early));

    // a private name may be used before its declaration in the class body
    assert!(script_err("class A { m() { return this.#b; } #b = 1; }").is_none());
}

#[test]
fn test_reserved_identifiers() {
    assert_eq!(
        kind_and_message(script_err("function* g() { var yield; }")),
        early("Cannot use 'yield' as identifier inside a generator")
    );
    assert_eq!(
        kind_and_message(module_err("var await;")),
        early("Cannot use 'await' as identifier in module code")
    );
    assert_eq!(
        kind_and_message(script_err("let let = 1")),
        early("let is disallowed as a lexically bound name")
    );
    assert_eq!(
        kind_and_message(script_err("async function f() { var await; }")),
        early("Cannot use 'await' as identifier inside an async function")
    );
    assert!(script_err("var yield, await;").is_none());
}

#[test]
fn test_module_exports() {
    assert_eq!(
        kind_and_message(module_err("let a; export { a }; export { a };")),
        early("Duplicate export 'a'")
    );
    assert_eq!(
        kind_and_message(module_err("export default 1; export default 2;")),
        early("Duplicate export 'default'")
    );
    assert_eq!(kind_and_message(module_err("export { x };")), early("Export 'x' is not defined"));

    // exports may precede the declaration they name
    assert!(module_err("export { x }; var x;").is_none());
    assert!(module_err("export { x } from 'y';").is_none());
}

#[test]
fn test_lexical_errors_come_from_the_lexer() {
    for source in ["'unterminated", "0b2", "`${a}\\u{`", "a = 1 @ 2"] {
        assert_eq!(script_err(source).map(|e| e.kind()), Some(ErrorKind::Lexical), "{}", source);
    }
}

#[test]
fn test_error_display_uses_kind_prefix() {
    let err = script_err("let a; let a;");
    assert_eq!(
        err.map(|e| e.to_string()),
        Some("EarlyError: Identifier 'a' has already been declared (1:11)".to_string())
    );
}
