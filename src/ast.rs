//! Abstract Syntax Tree types in ESTree shape
//!
//! Every node struct serializes with its ESTree `type` tag followed by its
//! fields and its [`Span`]. The enums grouping node kinds are untagged, so
//! `serde_json::to_value(&program)` yields the ESTree JSON directly.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

pub use crate::lexer::{Position, SourceLocation};

/// Source extent of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[usize; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
}

/// A complete program (script or module)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Program")]
pub struct Program {
    pub body: Vec<Statement>,
    #[serde(rename = "sourceType")]
    pub source_type: SourceType,
    #[serde(flatten)]
    pub span: Span,
}

impl Program {
    /// Render the ESTree JSON form of this program
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Script,
    Module,
}

// ============ STATEMENTS ============

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Statement {
    // Declarations
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(FunctionDeclaration),
    ClassDeclaration(ClassDeclaration),

    // Control Flow
    Block(BlockStatement),
    If(IfStatement),
    Switch(SwitchStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    ForOf(ForOfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    Try(TryStatement),
    With(WithStatement),

    // Jump
    Return(ReturnStatement),
    Break(BreakStatement),
    Continue(ContinueStatement),
    Throw(ThrowStatement),

    // Module
    Import(ImportDeclaration),
    ExportNamed(ExportNamedDeclaration),
    ExportDefault(ExportDefaultDeclaration),
    ExportAll(ExportAllDeclaration),

    // Other
    Expression(ExpressionStatement),
    Empty(EmptyStatement),
    Debugger(DebuggerStatement),
    Labeled(LabeledStatement),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExpressionStatement")]
pub struct ExpressionStatement {
    pub expression: Expression,
    /// Raw text of a directive prologue entry, without quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<String>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "BlockStatement")]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "EmptyStatement")]
pub struct EmptyStatement {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "DebuggerStatement")]
pub struct DebuggerStatement {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "VariableDeclaration")]
pub struct VariableDeclaration {
    pub declarations: Vec<VariableDeclarator>,
    pub kind: VariableKind,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "VariableDeclarator")]
pub struct VariableDeclarator {
    pub id: Pattern,
    pub init: Option<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

/// Shared shape of function declarations, expressions and methods
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub id: Option<Identifier>,
    pub params: Vec<Pattern>,
    pub body: BlockStatement,
    pub generator: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "FunctionDeclaration")]
pub struct FunctionDeclaration {
    #[serde(flatten)]
    pub function: Function,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "FunctionExpression")]
pub struct FunctionExpression {
    #[serde(flatten)]
    pub function: Function,
}

/// Shared shape of class declarations and expressions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub id: Option<Identifier>,
    #[serde(rename = "superClass")]
    pub super_class: Option<Box<Expression>>,
    pub body: ClassBody,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ClassDeclaration")]
pub struct ClassDeclaration {
    #[serde(flatten)]
    pub class: Class,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ClassExpression")]
pub struct ClassExpression {
    #[serde(flatten)]
    pub class: Class,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ClassBody")]
pub struct ClassBody {
    pub body: Vec<ClassElement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassElement {
    Method(MethodDefinition),
    Property(PropertyDefinition),
    StaticBlock(StaticBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "MethodDefinition")]
pub struct MethodDefinition {
    pub key: Expression,
    pub value: FunctionExpression,
    pub kind: MethodKind,
    pub computed: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "PropertyDefinition")]
pub struct PropertyDefinition {
    pub key: Expression,
    pub value: Option<Expression>,
    pub computed: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "StaticBlock")]
pub struct StaticBlock {
    pub body: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "IfStatement")]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "SwitchStatement")]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "SwitchCase")]
pub struct SwitchCase {
    pub test: Option<Expression>, // None for default
    pub consequent: Vec<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ForStatement")]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ForInStatement")]
pub struct ForInStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ForOfStatement")]
pub struct ForOfStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
    #[serde(rename = "await")]
    pub is_await: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForInOfLeft {
    Variable(VariableDeclaration),
    Pattern(Pattern),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "WhileStatement")]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "DoWhileStatement")]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "TryStatement")]
pub struct TryStatement {
    pub block: BlockStatement,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStatement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "CatchClause")]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: BlockStatement,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "WithStatement")]
pub struct WithStatement {
    pub object: Expression,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ReturnStatement")]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "BreakStatement")]
pub struct BreakStatement {
    pub label: Option<Identifier>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ContinueStatement")]
pub struct ContinueStatement {
    pub label: Option<Identifier>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ThrowStatement")]
pub struct ThrowStatement {
    pub argument: Expression,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "LabeledStatement")]
pub struct LabeledStatement {
    pub label: Identifier,
    pub body: Box<Statement>,
    #[serde(flatten)]
    pub span: Span,
}

// ============ MODULES ============

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportDeclaration")]
pub struct ImportDeclaration {
    pub specifiers: Vec<ImportDeclarationSpecifier>,
    pub source: Literal,
    pub attributes: Vec<ImportAttribute>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImportDeclarationSpecifier {
    Named(ImportSpecifier),
    Default(ImportDefaultSpecifier),
    Namespace(ImportNamespaceSpecifier),
}

/// `import { imported as local }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportSpecifier")]
pub struct ImportSpecifier {
    pub imported: ModuleExportName,
    pub local: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportDefaultSpecifier")]
pub struct ImportDefaultSpecifier {
    pub local: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportNamespaceSpecifier")]
pub struct ImportNamespaceSpecifier {
    pub local: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

/// `with { type: "json" }` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportAttribute")]
pub struct ImportAttribute {
    pub key: ModuleExportName,
    pub value: Literal,
    #[serde(flatten)]
    pub span: Span,
}

/// Identifier or string literal naming an export
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModuleExportName {
    Identifier(Identifier),
    Literal(Literal),
}

impl ModuleExportName {
    /// The exported name as a string
    pub fn name(&self) -> &str {
        match self {
            ModuleExportName::Identifier(id) => &id.name,
            ModuleExportName::Literal(lit) => match &lit.value {
                LiteralValue::String(s) => s,
                _ => "",
            },
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ModuleExportName::Identifier(id) => &id.span,
            ModuleExportName::Literal(lit) => &lit.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExportNamedDeclaration")]
pub struct ExportNamedDeclaration {
    pub declaration: Option<Declaration>,
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<Literal>,
    pub attributes: Vec<ImportAttribute>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Declaration {
    Variable(VariableDeclaration),
    Function(FunctionDeclaration),
    Class(ClassDeclaration),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExportSpecifier")]
pub struct ExportSpecifier {
    pub local: ModuleExportName,
    pub exported: ModuleExportName,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExportDefaultDeclaration")]
pub struct ExportDefaultDeclaration {
    pub declaration: ExportDefaultKind,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportDefaultKind {
    Function(FunctionDeclaration),
    Class(ClassDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ExportAllDeclaration")]
pub struct ExportAllDeclaration {
    pub exported: Option<ModuleExportName>,
    pub source: Literal,
    pub attributes: Vec<ImportAttribute>,
    #[serde(flatten)]
    pub span: Span,
}

// ============ EXPRESSIONS ============

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Expression {
    // Literals
    Literal(Literal),
    Array(ArrayExpression),
    Object(ObjectExpression),
    Function(FunctionExpression),
    ArrowFunction(ArrowFunctionExpression),
    Class(ClassExpression),
    Template(TemplateLiteral),
    TaggedTemplate(TaggedTemplateExpression),

    // Identifiers
    Identifier(Identifier),
    PrivateIdentifier(PrivateIdentifier),
    This(ThisExpression),
    Super(Super),

    // Operations
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Assignment(AssignmentExpression),
    Update(UpdateExpression),
    Sequence(SequenceExpression),

    // Access
    Member(MemberExpression),
    Chain(ChainExpression),
    Call(CallExpression),
    New(NewExpression),
    MetaProperty(MetaProperty),
    Import(ImportExpression),

    // Special
    Yield(YieldExpression),
    Await(AwaitExpression),
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Literal(l) => &l.span,
            Expression::Array(a) => &a.span,
            Expression::Object(o) => &o.span,
            Expression::Function(f) => &f.function.span,
            Expression::ArrowFunction(a) => &a.span,
            Expression::Class(c) => &c.class.span,
            Expression::Template(t) => &t.span,
            Expression::TaggedTemplate(t) => &t.span,
            Expression::Identifier(i) => &i.span,
            Expression::PrivateIdentifier(p) => &p.span,
            Expression::This(t) => &t.span,
            Expression::Super(s) => &s.span,
            Expression::Unary(u) => &u.span,
            Expression::Binary(b) => &b.span,
            Expression::Logical(l) => &l.span,
            Expression::Conditional(c) => &c.span,
            Expression::Assignment(a) => &a.span,
            Expression::Update(u) => &u.span,
            Expression::Sequence(s) => &s.span,
            Expression::Member(m) => &m.span,
            Expression::Chain(c) => &c.span,
            Expression::Call(c) => &c.span,
            Expression::New(n) => &n.span,
            Expression::MetaProperty(m) => &m.span,
            Expression::Import(i) => &i.span,
            Expression::Yield(y) => &y.span,
            Expression::Await(a) => &a.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    /// Source text, kept when raw output is requested
    pub raw: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    BigInt(String),
    RegExp { pattern: String, flags: String },
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "Literal")?;
        match &self.value {
            LiteralValue::Null => map.serialize_entry("value", &())?,
            LiteralValue::Boolean(b) => map.serialize_entry("value", b)?,
            LiteralValue::Number(n) => {
                // Integral values print without a fractional part
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    map.serialize_entry("value", &(*n as i64))?
                } else {
                    map.serialize_entry("value", n)?
                }
            }
            LiteralValue::String(s) => map.serialize_entry("value", s)?,
            LiteralValue::BigInt(digits) => {
                map.serialize_entry("value", &())?;
                map.serialize_entry("bigint", digits)?;
            }
            LiteralValue::RegExp { pattern, flags } => {
                map.serialize_entry("value", &())?;
                map.serialize_entry(
                    "regex",
                    &RegexValue {
                        pattern,
                        flags,
                    },
                )?;
            }
        }
        if let Some(raw) = &self.raw {
            map.serialize_entry("raw", raw)?;
        }
        map.serialize_entry("start", &self.span.start)?;
        map.serialize_entry("end", &self.span.end)?;
        if let Some(range) = &self.span.range {
            map.serialize_entry("range", range)?;
        }
        if let Some(loc) = &self.span.loc {
            map.serialize_entry("loc", loc)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct RegexValue<'a> {
    pattern: &'a str,
    flags: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Identifier")]
pub struct Identifier {
    pub name: String,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "PrivateIdentifier")]
pub struct PrivateIdentifier {
    pub name: String,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ThisExpression")]
pub struct ThisExpression {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Super")]
pub struct Super {
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ArrayExpression")]
pub struct ArrayExpression {
    pub elements: Vec<Option<ExpressionOrSpread>>, // None for holes
    #[serde(flatten)]
    pub span: Span,
}

/// Array element or call argument
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExpressionOrSpread {
    Expression(Expression),
    Spread(SpreadElement),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "SpreadElement")]
pub struct SpreadElement {
    pub argument: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ObjectExpression")]
pub struct ObjectExpression {
    pub properties: Vec<ObjectMember>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObjectMember {
    Property(Property),
    Spread(SpreadElement),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Property")]
pub struct Property {
    pub key: Expression,
    pub value: Expression,
    pub kind: PropertyKind,
    pub method: bool,
    pub shorthand: bool,
    pub computed: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ArrowFunctionExpression")]
pub struct ArrowFunctionExpression {
    pub params: Vec<Pattern>,
    pub body: ArrowFunctionBody,
    /// Concise body (`x => x`) rather than a block
    pub expression: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub generator: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrowFunctionBody {
    Block(BlockStatement),
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "TemplateLiteral")]
pub struct TemplateLiteral {
    pub quasis: Vec<TemplateElement>,
    pub expressions: Vec<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "TemplateElement")]
pub struct TemplateElement {
    pub value: TemplateElementValue,
    pub tail: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateElementValue {
    pub raw: String,
    pub cooked: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "TaggedTemplateExpression")]
pub struct TaggedTemplateExpression {
    pub tag: Box<Expression>,
    pub quasi: TemplateLiteral,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "UnaryExpression")]
pub struct UnaryExpression {
    pub operator: UnaryOp,
    pub prefix: bool,
    pub argument: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "BinaryExpression")]
pub struct BinaryExpression {
    pub operator: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    // Arithmetic
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Exp,

    // Comparison
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,

    // Bitwise
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "<<")]
    LShift,
    #[serde(rename = ">>")]
    RShift,
    #[serde(rename = ">>>")]
    URShift,

    // Other
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    Instanceof,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "LogicalExpression")]
pub struct LogicalExpression {
    pub operator: LogicalOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "??")]
    NullishCoalescing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ConditionalExpression")]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "AssignmentExpression")]
pub struct AssignmentExpression {
    pub operator: AssignmentOp,
    pub left: Box<Pattern>,
    pub right: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
    #[serde(rename = "%=")]
    ModAssign,
    #[serde(rename = "**=")]
    ExpAssign,
    #[serde(rename = "&=")]
    BitAndAssign,
    #[serde(rename = "|=")]
    BitOrAssign,
    #[serde(rename = "^=")]
    BitXorAssign,
    #[serde(rename = "<<=")]
    LShiftAssign,
    #[serde(rename = ">>=")]
    RShiftAssign,
    #[serde(rename = ">>>=")]
    URShiftAssign,
    #[serde(rename = "&&=")]
    AndAssign,
    #[serde(rename = "||=")]
    OrAssign,
    #[serde(rename = "??=")]
    NullishAssign,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "UpdateExpression")]
pub struct UpdateExpression {
    pub operator: UpdateOp,
    pub prefix: bool,
    pub argument: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "SequenceExpression")]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

/// `object.property`, `object[property]` or `object.#private`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "MemberExpression")]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: Box<Expression>,
    pub computed: bool,
    pub optional: bool,
    #[serde(flatten)]
    pub span: Span,
}

/// Wraps the outermost member/call of an optional chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ChainExpression")]
pub struct ChainExpression {
    pub expression: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "CallExpression")]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<ExpressionOrSpread>,
    pub optional: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "NewExpression")]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<ExpressionOrSpread>,
    #[serde(flatten)]
    pub span: Span,
}

/// `new.target` or `import.meta`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "MetaProperty")]
pub struct MetaProperty {
    pub meta: Identifier,
    pub property: Identifier,
    #[serde(flatten)]
    pub span: Span,
}

/// Dynamic `import(source)`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ImportExpression")]
pub struct ImportExpression {
    pub source: Box<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Box<Expression>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "YieldExpression")]
pub struct YieldExpression {
    pub argument: Option<Box<Expression>>,
    pub delegate: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "AwaitExpression")]
pub struct AwaitExpression {
    pub argument: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}

// ============ PATTERNS ============

/// Binding or assignment target
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Pattern {
    Identifier(Identifier),
    Member(MemberExpression), // assignment targets only
    Object(ObjectPattern),
    Array(ArrayPattern),
    Rest(RestElement),
    Assignment(AssignmentPattern),
}

impl Pattern {
    pub fn span(&self) -> &Span {
        match self {
            Pattern::Identifier(i) => &i.span,
            Pattern::Member(m) => &m.span,
            Pattern::Object(o) => &o.span,
            Pattern::Array(a) => &a.span,
            Pattern::Rest(r) => &r.span,
            Pattern::Assignment(a) => &a.span,
        }
    }

    /// Identifiers bound by this pattern, in source order
    pub fn bound_names(&self) -> Vec<&Identifier> {
        let mut names = Vec::new();
        self.collect_bound_names(&mut names);
        names
    }

    fn collect_bound_names<'a>(&'a self, names: &mut Vec<&'a Identifier>) {
        match self {
            Pattern::Identifier(id) => names.push(id),
            Pattern::Member(_) => {}
            Pattern::Object(obj) => {
                for prop in &obj.properties {
                    match prop {
                        ObjectPatternProperty::Property(p) => p.value.collect_bound_names(names),
                        ObjectPatternProperty::Rest(r) => r.argument.collect_bound_names(names),
                    }
                }
            }
            Pattern::Array(arr) => {
                for element in arr.elements.iter().flatten() {
                    element.collect_bound_names(names);
                }
            }
            Pattern::Rest(rest) => rest.argument.collect_bound_names(names),
            Pattern::Assignment(assign) => assign.left.collect_bound_names(names),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ObjectPattern")]
pub struct ObjectPattern {
    pub properties: Vec<ObjectPatternProperty>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObjectPatternProperty {
    Property(AssignmentProperty),
    Rest(RestElement),
}

/// A `Property` node inside an object pattern; always `kind: "init"`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Property")]
pub struct AssignmentProperty {
    pub key: Expression,
    pub value: Pattern,
    pub kind: PropertyKind,
    pub method: bool,
    pub shorthand: bool,
    pub computed: bool,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "ArrayPattern")]
pub struct ArrayPattern {
    pub elements: Vec<Option<Pattern>>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "RestElement")]
pub struct RestElement {
    pub argument: Box<Pattern>,
    #[serde(flatten)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "AssignmentPattern")]
pub struct AssignmentPattern {
    pub left: Box<Pattern>,
    pub right: Box<Expression>,
    #[serde(flatten)]
    pub span: Span,
}
