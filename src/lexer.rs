//! Lexer for ECMAScript source code
//!
//! Converts source text into a stream of tokens. Tokenization is context
//! free with two exceptions driven by the parser: a `/` in expression-start
//! position is rescanned as a regular expression, and the `}` closing a
//! template substitution is rescanned as a template continuation.

use std::iter::Peekable;
use std::str::CharIndices;

use serde::Serialize;

use crate::error::{ErrorLocation, ParseError};

/// A line/column pair: 1-based line, 0-based column in UTF-16 code units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Start and end positions of a token or node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

/// Decoded and raw text of one template chunk.
///
/// `cooked` is `None` when the chunk contains an escape that is only legal
/// in tagged templates.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePart {
    pub cooked: Option<String>,
    pub raw: String,
}

/// Token types for ECMAScript
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(String),
    BigInt(String), // digits without the `n` suffix or separators, e.g. "0x1f"
    RegExp { pattern: String, flags: String },
    True,
    False,
    Null,

    // Identifiers. Contextual words (let, static, yield, await, async, of,
    // get, set, as, from, target, meta) are identifiers too.
    Identifier(String),
    PrivateName(String), // #name

    // Reserved words
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Return,
    Super,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,

    // Operators
    Plus,             // +
    Minus,            // -
    Star,             // *
    Slash,            // /
    Percent,          // %
    StarStar,         // **
    PlusPlus,         // ++
    MinusMinus,       // --
    Eq,               // =
    EqEq,             // ==
    EqEqEq,           // ===
    BangEq,           // !=
    BangEqEq,         // !==
    Lt,               // <
    LtEq,             // <=
    Gt,               // >
    GtEq,             // >=
    LtLt,             // <<
    GtGt,             // >>
    GtGtGt,           // >>>
    Amp,              // &
    AmpAmp,           // &&
    Pipe,             // |
    PipePipe,         // ||
    Caret,            // ^
    Tilde,            // ~
    Bang,             // !
    Question,         // ?
    QuestionQuestion, // ??
    QuestionDot,      // ?.

    // Assignment Operators
    PlusEq,             // +=
    MinusEq,            // -=
    StarEq,             // *=
    SlashEq,            // /=
    PercentEq,          // %=
    StarStarEq,         // **=
    AmpEq,              // &=
    PipeEq,             // |=
    CaretEq,            // ^=
    LtLtEq,             // <<=
    GtGtEq,             // >>=
    GtGtGtEq,           // >>>=
    AmpAmpEq,           // &&=
    PipePipeEq,         // ||=
    QuestionQuestionEq, // ??=

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Dot,       // .
    DotDotDot, // ...
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;
    Arrow,     // =>

    // Template literals
    TemplateHead(TemplatePart),   // `...${
    TemplateMiddle(TemplatePart), // }...${
    TemplateTail(TemplatePart),   // }...`
    TemplateNoSub(TemplatePart),  // `...` (no substitutions)

    Eof,
}

impl TokenKind {
    /// The source spelling of a reserved word token.
    pub fn keyword_str(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Catch => "catch",
            TokenKind::Class => "class",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Debugger => "debugger",
            TokenKind::Default => "default",
            TokenKind::Delete => "delete",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::Enum => "enum",
            TokenKind::Export => "export",
            TokenKind::Extends => "extends",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::In => "in",
            TokenKind::Instanceof => "instanceof",
            TokenKind::New => "new",
            TokenKind::Return => "return",
            TokenKind::Super => "super",
            TokenKind::Switch => "switch",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Typeof => "typeof",
            TokenKind::Var => "var",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::With => "with",
            _ => return None,
        };
        Some(text)
    }

    /// Whether a token of this kind can begin an expression
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::BigInt(_)
                | TokenKind::RegExp { .. }
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Identifier(_)
                | TokenKind::PrivateName(_)
                | TokenKind::Class
                | TokenKind::Delete
                | TokenKind::Function
                | TokenKind::Import
                | TokenKind::New
                | TokenKind::Super
                | TokenKind::This
                | TokenKind::Typeof
                | TokenKind::Void
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Slash
                | TokenKind::SlashEq
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::Tilde
                | TokenKind::Bang
                | TokenKind::LParen
                | TokenKind::LBrace
                | TokenKind::LBracket
                | TokenKind::TemplateHead(_)
                | TokenKind::TemplateNoSub(_)
        )
    }

    /// Short human readable form used in error messages
    pub fn describe(&self) -> String {
        if let Some(keyword) = self.keyword_str() {
            return keyword.to_string();
        }
        match self {
            TokenKind::Number(_) | TokenKind::BigInt(_) => "number".to_string(),
            TokenKind::String(_) => "string".to_string(),
            TokenKind::RegExp { .. } => "regular expression".to_string(),
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::PrivateName(name) => format!("#{}", name),
            TokenKind::TemplateHead(_)
            | TokenKind::TemplateMiddle(_)
            | TokenKind::TemplateTail(_)
            | TokenKind::TemplateNoSub(_) => "template".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => punctuator_str(other).to_string(),
        }
    }
}

fn punctuator_str(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Percent => "%",
        TokenKind::StarStar => "**",
        TokenKind::PlusPlus => "++",
        TokenKind::MinusMinus => "--",
        TokenKind::Eq => "=",
        TokenKind::EqEq => "==",
        TokenKind::EqEqEq => "===",
        TokenKind::BangEq => "!=",
        TokenKind::BangEqEq => "!==",
        TokenKind::Lt => "<",
        TokenKind::LtEq => "<=",
        TokenKind::Gt => ">",
        TokenKind::GtEq => ">=",
        TokenKind::LtLt => "<<",
        TokenKind::GtGt => ">>",
        TokenKind::GtGtGt => ">>>",
        TokenKind::Amp => "&",
        TokenKind::AmpAmp => "&&",
        TokenKind::Pipe => "|",
        TokenKind::PipePipe => "||",
        TokenKind::Caret => "^",
        TokenKind::Tilde => "~",
        TokenKind::Bang => "!",
        TokenKind::Question => "?",
        TokenKind::QuestionQuestion => "??",
        TokenKind::QuestionDot => "?.",
        TokenKind::PlusEq => "+=",
        TokenKind::MinusEq => "-=",
        TokenKind::StarEq => "*=",
        TokenKind::SlashEq => "/=",
        TokenKind::PercentEq => "%=",
        TokenKind::StarStarEq => "**=",
        TokenKind::AmpEq => "&=",
        TokenKind::PipeEq => "|=",
        TokenKind::CaretEq => "^=",
        TokenKind::LtLtEq => "<<=",
        TokenKind::GtGtEq => ">>=",
        TokenKind::GtGtGtEq => ">>>=",
        TokenKind::AmpAmpEq => "&&=",
        TokenKind::PipePipeEq => "||=",
        TokenKind::QuestionQuestionEq => "??=",
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::Dot => ".",
        TokenKind::DotDotDot => "...",
        TokenKind::Comma => ",",
        TokenKind::Colon => ":",
        TokenKind::Semicolon => ";",
        TokenKind::Arrow => "=>",
        _ => "token",
    }
}

fn keyword(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "class" => TokenKind::Class,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "debugger" => TokenKind::Debugger,
        "default" => TokenKind::Default,
        "delete" => TokenKind::Delete,
        "do" => TokenKind::Do,
        "else" => TokenKind::Else,
        "enum" => TokenKind::Enum,
        "export" => TokenKind::Export,
        "extends" => TokenKind::Extends,
        "finally" => TokenKind::Finally,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "import" => TokenKind::Import,
        "in" => TokenKind::In,
        "instanceof" => TokenKind::Instanceof,
        "new" => TokenKind::New,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "switch" => TokenKind::Switch,
        "this" => TokenKind::This,
        "throw" => TokenKind::Throw,
        "try" => TokenKind::Try,
        "typeof" => TokenKind::Typeof,
        "var" => TokenKind::Var,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        "with" => TokenKind::With,
        _ => return None,
    };
    Some(kind)
}

/// Whether `name` is spelled like a reserved word (never usable as an
/// identifier reference or binding)
pub fn is_reserved_word(name: &str) -> bool {
    keyword(name).is_some()
}

/// A token with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub loc: SourceLocation,
    /// A line terminator appeared between the previous token and this one
    pub newline_before: bool,
    /// The identifier was spelled with `\u` escapes
    pub escaped: bool,
    /// Legacy octal literal (`010`, `08`) or octal escape (`"\01"`, `"\8"`)
    pub legacy_octal: bool,
}

impl Token {
    /// Raw source text of this token
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// Lexer state checkpoint for backtracking
#[derive(Clone)]
pub struct LexerCheckpoint {
    current_pos: usize,
    line: u32,
    column: u32,
    saw_newline: bool,
}

/// Lexer for tokenizing ECMAScript source code
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// Base offset added to char_indices positions (needed when resetting chars from middle of source)
    chars_base_offset: usize,
    current_pos: usize,
    line: u32,
    column: u32,
    start_pos: usize,
    start_line: u32,
    start_column: u32,
    /// Tracks if we just saw a line terminator (for ASI)
    saw_newline: bool,
    escaped: bool,
    legacy_octal: bool,
    /// Recognize `<!--` and `-->` comments (web-compatible scripts)
    html_comments: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            chars_base_offset: 0,
            current_pos: 0,
            line: 1,
            column: 0,
            start_pos: 0,
            start_line: 1,
            start_column: 0,
            saw_newline: false,
            escaped: false,
            legacy_octal: false,
            html_comments: false,
        }
    }

    /// Enable Annex B HTML-like comments
    pub fn with_html_comments(mut self, enabled: bool) -> Self {
        self.html_comments = enabled;
        self
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Create a checkpoint of the current lexer state for backtracking
    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            current_pos: self.current_pos,
            line: self.line,
            column: self.column,
            saw_newline: self.saw_newline,
        }
    }

    /// Restore the lexer state from a checkpoint
    pub fn restore(&mut self, checkpoint: LexerCheckpoint) {
        self.reset_to(checkpoint.current_pos, checkpoint.line, checkpoint.column);
        self.saw_newline = checkpoint.saw_newline;
    }

    fn reset_to(&mut self, pos: usize, line: u32, column: u32) {
        self.current_pos = pos;
        self.line = line;
        self.column = column;
        self.chars_base_offset = pos;
        self.chars = self
            .source
            .get(pos..)
            .unwrap_or("")
            .char_indices()
            .peekable();
    }

    /// Rescan a `/` or `/=` token as the start of a regular expression
    /// literal. Used when the parser is at an expression-start position.
    pub fn rescan_as_regexp(&mut self, token: &Token) -> Result<Token, ParseError> {
        self.reset_to(token.start, token.loc.start.line, token.loc.start.column);
        self.begin_token();
        self.saw_newline = token.newline_before;
        self.advance(); // /
        let kind = self.scan_regexp()?;
        Ok(self.make_token(kind))
    }

    /// Rescan a `}` token as the continuation of a template literal
    pub fn rescan_template_continuation(&mut self, rbrace: &Token) -> Result<Token, ParseError> {
        self.reset_to(rbrace.start, rbrace.loc.start.line, rbrace.loc.start.column);
        self.begin_token();
        self.saw_newline = rbrace.newline_before;
        self.advance(); // }
        let kind = self.scan_template(false)?;
        Ok(self.make_token(kind))
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments()?;
        self.begin_token();

        let Some((_pos, ch)) = self.advance() else {
            return Ok(self.make_token(TokenKind::Eof));
        };

        let kind = match ch {
            // Single character tokens
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,

            // Potentially multi-character tokens
            '.' => self.scan_dot()?,
            '+' => self.scan_plus(),
            '-' => self.scan_minus(),
            '*' => self.scan_star(),
            '/' => self.scan_slash(),
            '%' => self.scan_percent(),
            '=' => self.scan_equals(),
            '!' => self.scan_bang(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '&' => self.scan_ampersand(),
            '|' => self.scan_pipe(),
            '^' => self.scan_caret(),
            '?' => self.scan_question(),

            '"' | '\'' => self.scan_string(ch)?,
            '`' => self.scan_template(true)?,
            '0'..='9' => self.scan_number(ch)?,
            '#' => self.scan_private_name()?,

            // Identifiers and keywords
            '\\' => self.scan_identifier(ch)?,
            c if is_id_start(c) => self.scan_identifier(c)?,

            c => {
                return Err(self.error_at_start(format!("Invalid or unexpected token '{}'", c)));
            }
        };

        Ok(self.make_token(kind))
    }

    /// Check if there was a line terminator before the last produced token
    pub fn had_newline_before(&self) -> bool {
        self.saw_newline
    }

    fn begin_token(&mut self) {
        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;
        self.escaped = false;
        self.legacy_octal = false;
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            start: self.start_pos,
            end: self.current_pos,
            loc: SourceLocation {
                start: Position {
                    line: self.start_line,
                    column: self.start_column,
                },
                end: Position {
                    line: self.line,
                    column: self.column,
                },
            },
            newline_before: self.saw_newline,
            escaped: self.escaped,
            legacy_octal: self.legacy_octal,
        }
    }

    fn error_at_start(&self, message: impl Into<String>) -> ParseError {
        ParseError::lexical(
            message,
            ErrorLocation {
                offset: self.start_pos,
                line: self.start_line,
                column: self.start_column,
            },
        )
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::lexical(
            message,
            ErrorLocation {
                offset: self.current_pos,
                line: self.line,
                column: self.column,
            },
        )
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            // Add base offset for absolute position (needed when chars is reset from middle of source)
            self.current_pos = self.chars_base_offset + pos + ch.len_utf8();
            match ch {
                '\n' | '\u{2028}' | '\u{2029}' => {
                    self.line += 1;
                    self.column = 0;
                }
                // \r\n counts once, on the \n
                '\r' if self.peek() != Some('\n') => {
                    self.line += 1;
                    self.column = 0;
                }
                _ => self.column += ch.len_utf16() as u32,
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let slice = self.source.get(self.current_pos..)?;
        let mut iter = slice.chars();
        iter.next();
        iter.next()
    }

    fn rest_starts_with(&self, prefix: &str) -> bool {
        self.source
            .get(self.current_pos..)
            .is_some_and(|rest| rest.starts_with(prefix))
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if is_line_terminator(ch) {
                break;
            }
            self.advance();
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        self.saw_newline = false;
        let at_input_start = self.current_pos == 0;

        // Hashbang comment, only at the very beginning of the input
        if at_input_start && self.rest_starts_with("#!") {
            self.skip_line_comment();
        }

        loop {
            match self.peek() {
                Some(c) if is_whitespace(c) => {
                    self.advance();
                }
                Some(c) if is_line_terminator(c) => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => self.skip_line_comment(),
                    Some('*') => self.skip_block_comment()?,
                    _ => break,
                },
                Some('<') if self.html_comments && self.rest_starts_with("<!--") => {
                    self.skip_line_comment();
                }
                Some('-')
                    if self.html_comments
                        && (self.saw_newline || at_input_start)
                        && self.rest_starts_with("-->") =>
                {
                    self.skip_line_comment();
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.checkpoint();
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.advance() {
                Some((_, '*')) if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(());
                }
                Some((_, c)) if is_line_terminator(c) => {
                    self.saw_newline = true;
                }
                Some(_) => {}
                None => {
                    self.restore(start);
                    return Err(self.error_here("Unterminated comment"));
                }
            }
        }
    }

    fn scan_dot(&mut self) -> Result<TokenKind, ParseError> {
        if self.peek() == Some('.') && self.peek_next() == Some('.') {
            self.advance();
            self.advance();
            Ok(TokenKind::DotDotDot)
        } else if matches!(self.peek(), Some('0'..='9')) {
            // .123 style number
            self.scan_number('.')
        } else {
            Ok(TokenKind::Dot)
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        if self.match_char('+') {
            TokenKind::PlusPlus
        } else if self.match_char('=') {
            TokenKind::PlusEq
        } else {
            TokenKind::Plus
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        if self.match_char('-') {
            TokenKind::MinusMinus
        } else if self.match_char('=') {
            TokenKind::MinusEq
        } else {
            TokenKind::Minus
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        if self.match_char('*') {
            if self.match_char('=') {
                TokenKind::StarStarEq
            } else {
                TokenKind::StarStar
            }
        } else if self.match_char('=') {
            TokenKind::StarEq
        } else {
            TokenKind::Star
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::SlashEq
        } else {
            TokenKind::Slash
        }
    }

    /// Scan the body and flags of a regular expression literal. The opening
    /// `/` has already been consumed.
    fn scan_regexp(&mut self) -> Result<TokenKind, ParseError> {
        let mut pattern = String::new();
        let mut in_class = false; // inside character class [...]

        loop {
            match self.advance() {
                Some((_, '/')) if !in_class => break,
                Some((_, '[')) => {
                    in_class = true;
                    pattern.push('[');
                }
                Some((_, ']')) => {
                    in_class = false;
                    pattern.push(']');
                }
                Some((_, '\\')) => {
                    // Escape sequence - include both backslash and next char
                    pattern.push('\\');
                    match self.advance() {
                        Some((_, c)) if !is_line_terminator(c) => pattern.push(c),
                        _ => return Err(self.error_at_start("Unterminated regular expression")),
                    }
                }
                Some((_, c)) if !is_line_terminator(c) => pattern.push(c),
                _ => return Err(self.error_at_start("Unterminated regular expression")),
            }
        }

        let mut flags = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    return Err(self.error_here("Invalid regular expression flags"));
                }
                Some(ch) if is_id_continue(ch) => {
                    if !"dgimsuyv".contains(ch) || flags.contains(ch) {
                        return Err(self.error_here(format!(
                            "Invalid regular expression flag '{}'",
                            ch
                        )));
                    }
                    flags.push(ch);
                    self.advance();
                }
                _ => break,
            }
        }
        if flags.contains('u') && flags.contains('v') {
            return Err(self.error_at_start("Regular expression flags 'u' and 'v' are exclusive"));
        }

        Ok(TokenKind::RegExp { pattern, flags })
    }

    fn scan_percent(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::PercentEq
        } else {
            TokenKind::Percent
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::EqEqEq
            } else {
                TokenKind::EqEq
            }
        } else if self.match_char('>') {
            TokenKind::Arrow
        } else {
            TokenKind::Eq
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::BangEqEq
            } else {
                TokenKind::BangEq
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.match_char('<') {
            if self.match_char('=') {
                TokenKind::LtLtEq
            } else {
                TokenKind::LtLt
            }
        } else if self.match_char('=') {
            TokenKind::LtEq
        } else {
            TokenKind::Lt
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.match_char('>') {
            if self.match_char('>') {
                if self.match_char('=') {
                    TokenKind::GtGtGtEq
                } else {
                    TokenKind::GtGtGt
                }
            } else if self.match_char('=') {
                TokenKind::GtGtEq
            } else {
                TokenKind::GtGt
            }
        } else if self.match_char('=') {
            TokenKind::GtEq
        } else {
            TokenKind::Gt
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        if self.match_char('&') {
            if self.match_char('=') {
                TokenKind::AmpAmpEq
            } else {
                TokenKind::AmpAmp
            }
        } else if self.match_char('=') {
            TokenKind::AmpEq
        } else {
            TokenKind::Amp
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        if self.match_char('|') {
            if self.match_char('=') {
                TokenKind::PipePipeEq
            } else {
                TokenKind::PipePipe
            }
        } else if self.match_char('=') {
            TokenKind::PipeEq
        } else {
            TokenKind::Pipe
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::CaretEq
        } else {
            TokenKind::Caret
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        if self.match_char('?') {
            if self.match_char('=') {
                TokenKind::QuestionQuestionEq
            } else {
                TokenKind::QuestionQuestion
            }
        } else if self.peek() == Some('.') && !matches!(self.peek_next(), Some('0'..='9')) {
            // `a?.5:0` is a conditional, not an optional chain
            self.advance();
            TokenKind::QuestionDot
        } else {
            TokenKind::Question
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        let mut value = CookedBuilder::default();

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => match self.scan_escape(false) {
                    Ok(Some(code)) => value.push_code_point(code),
                    Ok(None) => {}
                    Err(message) => return Err(self.error_here(message)),
                },
                Some((_, '\n' | '\r')) | None => {
                    return Err(self.error_at_start("Unterminated string literal"));
                }
                Some((_, c)) => value.push_char(c),
            }
        }

        Ok(TokenKind::String(value.finish()))
    }

    /// Decode one escape sequence; the backslash is already consumed.
    /// Returns `Ok(None)` for a line continuation.
    fn scan_escape(&mut self, template: bool) -> Result<Option<u32>, &'static str> {
        let Some((_, ch)) = self.advance() else {
            return Err("Unterminated string literal");
        };
        let code = match ch {
            'n' => 0x0A,
            'r' => 0x0D,
            't' => 0x09,
            'b' => 0x08,
            'f' => 0x0C,
            'v' => 0x0B,
            '\r' => {
                self.match_char('\n');
                return Ok(None);
            }
            '\n' | '\u{2028}' | '\u{2029}' => return Ok(None),
            '0' if !matches!(self.peek(), Some('0'..='9')) => 0,
            '0'..='7' => {
                if template {
                    return Err("Octal escape sequences are not allowed in template strings");
                }
                self.legacy_octal = true;
                let mut value = ch.to_digit(8).unwrap_or(0);
                // Up to three digits when the first is 0-3, two otherwise
                let max_len = if value <= 3 { 3 } else { 2 };
                let mut len = 1;
                while len < max_len {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            self.advance();
                            len += 1;
                        }
                        None => break,
                    }
                }
                value
            }
            '8' | '9' => {
                if template {
                    return Err("\\8 and \\9 are not allowed in template strings");
                }
                self.legacy_octal = true;
                ch as u32
            }
            'x' => self
                .scan_hex_digits(2)
                .ok_or("Invalid hexadecimal escape sequence")?,
            'u' => self
                .scan_unicode_escape_body()
                .ok_or("Invalid Unicode escape sequence")?,
            c => c as u32,
        };
        Ok(Some(code))
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self.peek()?.to_digit(16)?;
            self.advance();
            value = value * 16 + digit;
        }
        Some(value)
    }

    /// `XXXX` or `{X...}` after `\u`
    fn scan_unicode_escape_body(&mut self) -> Option<u32> {
        if !self.match_char('{') {
            return self.scan_hex_digits(4);
        }
        let mut value = 0u32;
        let mut digits = 0;
        loop {
            match self.peek() {
                Some('}') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    let digit = c.to_digit(16)?;
                    self.advance();
                    value = value.checked_mul(16)?.checked_add(digit)?;
                    if value > 0x10FFFF {
                        return None;
                    }
                    digits += 1;
                }
                None => return None,
            }
        }
        (digits > 0).then_some(value)
    }

    /// Scan a template chunk. `opening` is true right after a backtick,
    /// false right after the `}` ending a substitution.
    fn scan_template(&mut self, opening: bool) -> Result<TokenKind, ParseError> {
        let mut raw = String::new();
        let mut cooked = Some(CookedBuilder::default());

        loop {
            let before = self.current_pos;
            match self.advance() {
                Some((_, '`')) => {
                    let part = TemplatePart {
                        cooked: cooked.map(CookedBuilder::finish),
                        raw,
                    };
                    return Ok(if opening {
                        TokenKind::TemplateNoSub(part)
                    } else {
                        TokenKind::TemplateTail(part)
                    });
                }
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    let part = TemplatePart {
                        cooked: cooked.map(CookedBuilder::finish),
                        raw,
                    };
                    return Ok(if opening {
                        TokenKind::TemplateHead(part)
                    } else {
                        TokenKind::TemplateMiddle(part)
                    });
                }
                Some((_, '\\')) => {
                    match self.scan_escape(true) {
                        Ok(Some(code)) => {
                            if let Some(builder) = cooked.as_mut() {
                                builder.push_code_point(code);
                            }
                        }
                        Ok(None) => {}
                        Err(_) => cooked = None,
                    }
                    let escape = self.source.get(before..self.current_pos).unwrap_or("");
                    raw.push_str(&normalize_line_endings(escape));
                }
                Some((_, '\r')) => {
                    self.match_char('\n');
                    raw.push('\n');
                    if let Some(builder) = cooked.as_mut() {
                        builder.push_char('\n');
                    }
                }
                Some((_, c)) => {
                    raw.push(c);
                    if let Some(builder) = cooked.as_mut() {
                        builder.push_char(c);
                    }
                }
                None => return Err(self.error_at_start("Unterminated template literal")),
            }
        }
    }

    fn scan_number(&mut self, first: char) -> Result<TokenKind, ParseError> {
        if first == '0' {
            match self.peek() {
                Some('x' | 'X') => return self.scan_radix_number(16),
                Some('o' | 'O') => return self.scan_radix_number(8),
                Some('b' | 'B') => return self.scan_radix_number(2),
                Some('0'..='9') => return self.scan_legacy_octal(),
                Some('_') => {
                    return Err(
                        self.error_here("Numeric separator can not be used after leading 0")
                    );
                }
                _ => {}
            }
        }

        let mut text = String::new();
        if first == '.' {
            text.push_str("0.");
            self.scan_digits(&mut text, 10, false)?;
        } else {
            text.push(first);
            self.scan_digits(&mut text, 10, true)?;
            if self.peek() == Some('n') {
                self.advance();
                self.check_after_numeric()?;
                return Ok(TokenKind::BigInt(text));
            }
            if self.match_char('.') {
                text.push('.');
                self.scan_digits(&mut text, 10, false)?;
            }
        }
        self.scan_exponent(&mut text)?;
        self.check_after_numeric()?;
        Ok(TokenKind::Number(parse_decimal(&text)))
    }

    /// `0x`, `0o`, `0b` literals. The prefix letter is next.
    fn scan_radix_number(&mut self, radix: u32) -> Result<TokenKind, ParseError> {
        let mut text = String::from("0");
        if let Some((_, prefix)) = self.advance() {
            text.push(prefix);
        }
        let digits_start = text.len();
        if self.scan_digits(&mut text, radix, false)? == 0 {
            return Err(self.error_here("Missing digits in numeric literal"));
        }
        if self.peek() == Some('n') {
            self.advance();
            self.check_after_numeric()?;
            return Ok(TokenKind::BigInt(text));
        }
        self.check_after_numeric()?;
        let value = text
            .get(digits_start..)
            .unwrap_or("")
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0f64, |acc, digit| acc * radix as f64 + digit as f64);
        Ok(TokenKind::Number(value))
    }

    /// `0` followed by more digits: legacy octal (`017`) or a
    /// non-octal decimal (`089`, `08.5`).
    fn scan_legacy_octal(&mut self) -> Result<TokenKind, ParseError> {
        self.legacy_octal = true;
        let mut text = String::from("0");
        let mut octal = true;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {
                    if c >= '8' {
                        octal = false;
                    }
                    text.push(c);
                    self.advance();
                }
                '_' => {
                    return Err(
                        self.error_here("Numeric separators are not allowed in legacy octal literals")
                    );
                }
                _ => break,
            }
        }
        if self.peek() == Some('n') {
            return Err(self.error_here("Invalid BigInt literal"));
        }
        if octal {
            self.check_after_numeric()?;
            let value = text
                .chars()
                .filter_map(|c| c.to_digit(8))
                .fold(0f64, |acc, digit| acc * 8.0 + digit as f64);
            return Ok(TokenKind::Number(value));
        }
        if self.match_char('.') {
            text.push('.');
            self.scan_digits(&mut text, 10, false)?;
        }
        self.scan_exponent(&mut text)?;
        self.check_after_numeric()?;
        Ok(TokenKind::Number(parse_decimal(&text)))
    }

    fn scan_exponent(&mut self, text: &mut String) -> Result<(), ParseError> {
        if !matches!(self.peek(), Some('e' | 'E')) {
            return Ok(());
        }
        self.advance();
        text.push('e');
        if let Some(sign @ ('+' | '-')) = self.peek() {
            self.advance();
            text.push(sign);
        }
        if self.scan_digits(text, 10, false)? == 0 {
            return Err(self.error_here("Missing exponent in numeric literal"));
        }
        Ok(())
    }

    /// Consume digits of `radix` with numeric separators. `after_digit`
    /// says whether a digit immediately precedes the cursor. Returns the
    /// number of digits consumed; separators are dropped from `text`.
    fn scan_digits(
        &mut self,
        text: &mut String,
        radix: u32,
        mut after_digit: bool,
    ) -> Result<usize, ParseError> {
        let mut count = 0;
        loop {
            match self.peek() {
                Some(c) if c.is_digit(radix) => {
                    text.push(c);
                    self.advance();
                    after_digit = true;
                    count += 1;
                }
                Some('_') => {
                    if !after_digit {
                        return Err(self.error_here("Numeric separators are not allowed here"));
                    }
                    self.advance();
                    if !self.peek().is_some_and(|c| c.is_digit(radix)) {
                        return Err(self.error_here(
                            "Numeric separators are only allowed between two digits",
                        ));
                    }
                    after_digit = false;
                }
                _ => return Ok(count),
            }
        }
    }

    /// A numeric literal must not be immediately followed by an identifier
    /// start or a digit.
    fn check_after_numeric(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == '\\' || is_id_start(c) || c.is_ascii_digit() => Err(
                self.error_here("Identifier starts immediately after numeric literal"),
            ),
            _ => Ok(()),
        }
    }

    /// Decode `\uXXXX` inside an identifier; the backslash is consumed.
    fn scan_identifier_escape(&mut self) -> Result<char, ParseError> {
        if !self.match_char('u') {
            return Err(self.error_here("Invalid escape in identifier"));
        }
        self.scan_unicode_escape_body()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error_here("Invalid Unicode escape sequence"))
    }

    fn scan_identifier(&mut self, first: char) -> Result<TokenKind, ParseError> {
        let mut name = String::new();
        if first == '\\' {
            let ch = self.scan_identifier_escape()?;
            if !is_id_start(ch) {
                return Err(self.error_here("Invalid identifier start"));
            }
            self.escaped = true;
            name.push(ch);
        } else {
            name.push(first);
        }

        loop {
            match self.peek() {
                Some('\\') => {
                    self.advance();
                    let ch = self.scan_identifier_escape()?;
                    if !is_id_continue(ch) {
                        return Err(self.error_here("Invalid identifier part"));
                    }
                    self.escaped = true;
                    name.push(ch);
                }
                Some(ch) if is_id_continue(ch) => {
                    name.push(ch);
                    self.advance();
                }
                _ => break,
            }
        }

        // An escaped keyword stays an identifier; the parser rejects it
        // wherever a keyword or identifier reference is required.
        if !self.escaped {
            if let Some(kind) = keyword(&name) {
                return Ok(kind);
            }
        }
        Ok(TokenKind::Identifier(name))
    }

    fn scan_private_name(&mut self) -> Result<TokenKind, ParseError> {
        match self.advance() {
            Some((_, c)) if c == '\\' || is_id_start(c) => match self.scan_identifier(c)? {
                TokenKind::Identifier(name) => Ok(TokenKind::PrivateName(name)),
                other => Ok(TokenKind::PrivateName(other.describe())),
            },
            _ => Err(self.error_at_start("Invalid or unexpected token '#'")),
        }
    }
}

/// Accumulates cooked string content, pairing `\uD83D\uDE00` style
/// surrogate escapes. Unpaired surrogates decode to U+FFFD.
#[derive(Default)]
struct CookedBuilder {
    out: String,
    high_surrogate: Option<u32>,
}

impl CookedBuilder {
    fn push_code_point(&mut self, code: u32) {
        match code {
            0xD800..=0xDBFF => {
                self.flush();
                self.high_surrogate = Some(code);
            }
            0xDC00..=0xDFFF => match self.high_surrogate.take() {
                Some(high) => {
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00);
                    self.out
                        .push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                None => self.out.push(char::REPLACEMENT_CHARACTER),
            },
            _ => {
                self.flush();
                self.out
                    .push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
    }

    fn push_char(&mut self, ch: char) {
        self.flush();
        self.out.push(ch);
    }

    fn flush(&mut self) {
        if self.high_surrogate.take().is_some() {
            self.out.push(char::REPLACEMENT_CHARACTER);
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out
    }
}

fn parse_decimal(text: &str) -> f64 {
    text.parse().unwrap_or(f64::NAN)
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// ECMAScript line terminators: LF, CR, LS (U+2028), PS (U+2029)
pub fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_whitespace(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{00A0}'
            | '\u{FEFF}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// Check if a character can start an identifier
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Check if a character can continue an identifier
fn is_id_continue(ch: char) -> bool {
    ch == '_'
        || ch == '$'
        || ch == '\u{200C}'
        || ch == '\u{200D}'
        || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn single(source: &str) -> Token {
        Lexer::new(source).next_token().unwrap()
    }

    #[test]
    fn test_numeric_values() {
        assert_eq!(single("0x1F").kind, TokenKind::Number(31.0));
        assert_eq!(single("0o17").kind, TokenKind::Number(15.0));
        assert_eq!(single("0b101").kind, TokenKind::Number(5.0));
        assert_eq!(single("1_000_000").kind, TokenKind::Number(1_000_000.0));
        assert_eq!(single(".5e1").kind, TokenKind::Number(5.0));
        assert_eq!(single("1.").kind, TokenKind::Number(1.0));
    }

    #[test]
    fn test_legacy_octal_is_flagged() {
        let token = single("017");
        assert_eq!(token.kind, TokenKind::Number(15.0));
        assert!(token.legacy_octal);

        let token = single("089");
        assert_eq!(token.kind, TokenKind::Number(89.0));
        assert!(token.legacy_octal);

        assert!(!single("0").legacy_octal);
    }

    #[test]
    fn test_bigint_keeps_prefix() {
        assert_eq!(single("0x1_0n").kind, TokenKind::BigInt("0x10".into()));
        assert_eq!(single("12n").kind, TokenKind::BigInt("12".into()));
    }

    #[test]
    fn test_bad_separators() {
        for source in ["1__0", "1_", "0_1", "0x_1", "1e_1", "07_1"] {
            assert!(Lexer::new(source).next_token().is_err(), "{}", source);
        }
    }

    #[test]
    fn test_columns_count_utf16_units() {
        let mut lexer = Lexer::new("'😀' x");
        let _ = lexer.next_token();
        let x = lexer.next_token();
        assert!(matches!(
            x,
            Ok(Token { loc: SourceLocation { start: Position { line: 1, column: 5 }, .. }, .. })
        ));
    }

    #[test]
    fn test_surrogate_pair_escapes_combine() {
        assert_eq!(
            single(r#""\uD83D\uDE00""#).kind,
            TokenKind::String("😀".into())
        );
        assert_eq!(
            single(r#""\uD800""#).kind,
            TokenKind::String("\u{FFFD}".into())
        );
    }
}
