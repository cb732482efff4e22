//! Abstract Syntax Tree types for ECMAScript 3 programs
//!
//! Every statement and expression carries its [`Span`]. Function bodies are
//! shared through `Rc` so function objects can outlive the parse that produced
//! them. Hoisted declarations are collected by the parser per function body.

use std::rc::Rc;

use crate::lexer::Span;
use crate::value::JsString;

/// Identifies one parsed unit of source (a script, an eval string or a
/// `Function` constructor body).
pub type SourceId = u32;

/// Names and function declarations hoisted to the top of a code body.
#[derive(Debug, Default, Clone)]
pub struct Declarations {
    /// `var` names in first-occurrence order
    pub vars: Vec<JsString>,
    /// Function declarations in source order
    pub functions: Vec<Rc<FunctionData>>,
}

impl Declarations {
    pub fn add_var(&mut self, name: &JsString) {
        if !self.vars.contains(name) {
            self.vars.push(name.clone());
        }
    }
}

/// A parsed program
#[derive(Debug)]
pub struct Program {
    pub body: Vec<Statement>,
    pub declarations: Declarations,
    pub source_id: SourceId,
}

/// A function declaration or expression
#[derive(Debug)]
pub struct FunctionData {
    pub name: Option<JsString>,
    pub params: Vec<JsString>,
    pub body: Vec<Statement>,
    pub declarations: Declarations,
    pub span: Span,
    pub source_id: SourceId,
    /// Source text of the whole function, for `Function.prototype.toString`
    pub source_text: JsString,
}

#[derive(Debug)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum StatementKind {
    Empty,
    Block(Vec<Statement>),
    Var(Vec<VariableDeclarator>),
    Expression(Expression),
    If {
        test: Expression,
        consequent: Box<Statement>,
        alternate: Option<Box<Statement>>,
    },
    DoWhile {
        body: Box<Statement>,
        test: Expression,
    },
    While {
        test: Expression,
        body: Box<Statement>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
    },
    ForIn {
        target: ForInTarget,
        object: Expression,
        body: Box<Statement>,
    },
    Continue(Option<JsString>),
    Break(Option<JsString>),
    Return(Option<Expression>),
    With {
        object: Expression,
        body: Box<Statement>,
    },
    Switch {
        discriminant: Expression,
        cases: Vec<SwitchCase>,
    },
    Labeled {
        label: JsString,
        body: Box<Statement>,
    },
    Throw(Expression),
    Try {
        block: Vec<Statement>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Statement>>,
    },
    /// Hoisted when the enclosing body is entered; a no-op when reached.
    FunctionDeclaration(Rc<FunctionData>),
}

impl StatementKind {
    /// Statements that `break`/`continue` without a label can target
    pub fn is_iteration(&self) -> bool {
        matches!(
            self,
            StatementKind::DoWhile { .. }
                | StatementKind::While { .. }
                | StatementKind::For { .. }
                | StatementKind::ForIn { .. }
        )
    }
}

#[derive(Debug)]
pub struct VariableDeclarator {
    pub name: JsString,
    pub init: Option<Expression>,
    pub span: Span,
}

#[derive(Debug)]
pub enum ForInit {
    Var(Vec<VariableDeclarator>),
    Expression(Expression),
}

#[derive(Debug)]
pub enum ForInTarget {
    Var(VariableDeclarator),
    Expression(Expression),
}

#[derive(Debug)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Expression>,
    pub body: Vec<Statement>,
}

#[derive(Debug)]
pub struct CatchClause {
    pub param: JsString,
    pub body: Vec<Statement>,
}

#[derive(Debug)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum ExpressionKind {
    This,
    Identifier(JsString),
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    /// `None` entries are elisions (`[1,,2]`)
    Array(Vec<Option<Expression>>),
    Object(Vec<(JsString, Expression)>),
    Function(Rc<FunctionData>),
    Member {
        object: Box<Expression>,
        property: MemberProperty,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    New {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        argument: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        argument: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Sequence(Vec<Expression>),
}

impl ExpressionKind {
    /// Whether this expression may appear on the left of an assignment
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            ExpressionKind::Identifier(_) | ExpressionKind::Member { .. }
        )
    }
}

#[derive(Debug)]
pub enum MemberProperty {
    Dot(JsString),
    Computed(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Delete,
    Void,
    Typeof,
    Plus,
    Minus,
    BitNot,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Instanceof,
    In,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    BitAnd,
    BitXor,
    BitOr,
}

impl BinaryOp {
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 6,
            BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq
            | BinaryOp::Instanceof
            | BinaryOp::In => 7,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn precedence(self) -> u8 {
        match self {
            LogicalOp::Or => 1,
            LogicalOp::And => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    /// Compound assignment `target op= value`
    Compound(BinaryOp),
}
