use crate::error::Span;
use serde::{Deserialize, Serialize};

/// The syntax tree doubles as the persisted IR: every node serializes with a
/// `"type"` tag and its source span, and a reloaded tree evaluates exactly
/// like a freshly parsed one.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElifBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Stmt {
    Expression {
        expr: Expr,
        span: Span,
    },
    VarDecl {
        name: String,
        is_const: bool,
        initializer: Option<Expr>,
        span: Span,
    },
    Print {
        args: Vec<Expr>,
        span: Span,
    },
    Input {
        name: String,
        span: Span,
    },
    Block {
        statements: Vec<Stmt>,
        span: Span,
    },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        elif_branches: Vec<ElifBranch>,
        else_branch: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    DoWhile {
        body: Vec<Stmt>,
        condition: Expr,
        span: Span,
    },
    For {
        initializer: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Function(FunctionDecl),
    Import {
        path: String,
        alias: String,
        span: Span,
    },
    Export {
        functions: Vec<FunctionDecl>,
        span: Span,
    },
    Comment {
        text: String,
        span: Span,
    },
    Exit {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expression { span, .. }
            | Stmt::VarDecl { span, .. }
            | Stmt::Print { span, .. }
            | Stmt::Input { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::DoWhile { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Return { span, .. }
            | Stmt::Import { span, .. }
            | Stmt::Export { span, .. }
            | Stmt::Comment { span, .. }
            | Stmt::Exit { span } => *span,
            Stmt::Function(decl) => decl.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    Literal {
        value: Literal,
        span: Span,
    },
    Array {
        elements: Vec<Expr>,
        span: Span,
    },
    Object {
        entries: Vec<ObjectEntry>,
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Ln {
        operand: Box<Expr>,
        span: Span,
    },
    Convert {
        expr: Box<Expr>,
        target: ConvertTarget,
        span: Span,
    },
    Length {
        target: Box<Expr>,
        span: Span,
    },
    Member {
        object: Box<Expr>,
        name: String,
        span: Span,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Call {
        namespace: Option<String>,
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    Push {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Pop {
        target: Box<Expr>,
        span: Span,
    },
    Insert {
        target: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Erase {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Array { span, .. }
            | Expr::Object { span, .. }
            | Expr::Variable { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Ln { span, .. }
            | Expr::Convert { span, .. }
            | Expr::Length { span, .. }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. }
            | Expr::Call { span, .. }
            | Expr::Push { span, .. }
            | Expr::Pop { span, .. }
            | Expr::Insert { span, .. }
            | Expr::Erase { span, .. } => *span,
        }
    }

    /// Whether the expression names a storage location that can be written.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Variable { .. } | Expr::Index { .. } | Expr::Member { .. })
    }

    /// Whether the expression has an effect worth running as a statement.
    pub fn is_statement_expression(&self) -> bool {
        match self {
            Expr::Call { .. }
            | Expr::Assign { .. }
            | Expr::Push { .. }
            | Expr::Pop { .. }
            | Expr::Insert { .. }
            | Expr::Erase { .. } => true,
            Expr::Unary { operator, .. } => operator.is_step(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
    Root,
    ShiftLeft,
    ShiftRight,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::FloorDivide => "//",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "**",
            BinaryOp::Root => "ราก",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "ซอร์",
            BinaryOp::And => "และ",
            BinaryOp::Or => "หรือ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    BitNot,
    Negate,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    /// `++` and `--` in either position.
    pub fn is_step(&self) -> bool {
        matches!(
            self,
            UnaryOp::PreIncrement | UnaryOp::PreDecrement | UnaryOp::PostIncrement | UnaryOp::PostDecrement
        )
    }

    pub fn as_symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "ไม่",
            UnaryOp::BitNot => "!",
            UnaryOp::Negate => "-",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvertTarget {
    Integer,
    Float,
    String,
    Boolean,
}

impl ConvertTarget {
    pub fn keyword(&self) -> &'static str {
        match self {
            ConvertTarget::Integer => "จำนวนเต็ม",
            ConvertTarget::Float => "ทศนิยม",
            ConvertTarget::String => "ข้อความ",
            ConvertTarget::Boolean => "ค่าความจริง",
        }
    }
}
