//! ECMAScript parser producing ESTree syntax trees
//!
//! # Example
//!
//! ```
//! use ecmaparse::{parse_script, Options};
//!
//! let program = parse_script("for (a of b);", &Options::default()).unwrap();
//! let json = program.to_json().unwrap();
//! assert_eq!(json["body"][0]["type"], "ForOfStatement");
//! ```
//!
//! Parsing is all-or-nothing: every entry point returns either a complete
//! [`ast::Program`] or the first [`ParseError`] found.
//!
//! The parser is recursive descent. Nesting depth is limited only by the
//! stack of the calling thread, so deeply nested input (thousands of
//! levels) should be parsed on a thread with a large stack.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod options;
pub mod parser;

pub use ast::Program;
pub use error::{ErrorKind, ErrorLocation, ParseError};
pub use options::Options;
pub use parser::Parser;

/// Parse `source` as a script, ignoring `options.module`
pub fn parse_script(source: &str, options: &Options) -> Result<Program, ParseError> {
    let options = Options {
        module: false,
        ..*options
    };
    Parser::new(source, options).parse_program()
}

/// Parse `source` as a module: strict code with `import`/`export`
pub fn parse_module(source: &str, options: &Options) -> Result<Program, ParseError> {
    let options = Options {
        module: true,
        ..*options
    };
    Parser::new(source, options).parse_program()
}

/// Parse with the goal selected by `options.module`
pub fn parse(source: &str, options: &Options) -> Result<Program, ParseError> {
    Parser::new(source, *options).parse_program()
}
