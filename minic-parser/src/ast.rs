use std::fmt;

use indexmap::IndexMap;
use minic_source::Position;

/// A declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Void,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Void => "void",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Returns `true` for `==`, `!=`, `<`, `<=`, `>` and `>=`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    /// Position of the first token of the expression.
    pub pos: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Position) -> Self {
        Self { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    /// An identifier (e.g. `foo`).
    Identifier(String),
    /// A binary expression (e.g. `1+1`).
    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },
    /// A unary expression (e.g. `-x` or `!done`).
    Unary { op: UnaryOp, arg: Box<Expr> },
    /// A function call expression (e.g. `foo(1, bar)`).
    FnCall { ident: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    /// Position of the first token of the statement.
    pub pos: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Position) -> Self {
        Self { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `int x;` or `float y = 1.5;`
    VarDeclaration {
        ident: String,
        ty: Type,
        initializer: Option<Expr>,
    },
    /// `x = expr;`
    Assign { ident: String, value: Expr },
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },
    While { condition: Expr, body: Vec<Stmt> },
    /// `return;` or `return expr;`
    Return(Option<Expr>),
    /// A bare call (e.g. `printInt(x);`).
    ExprStmt(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ident: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDeclaration {
    pub ident: String,
    pub params: Vec<Param>,
    pub return_ty: Type,
    pub body: Vec<Stmt>,
    pub pos: Position,
}

/// A parsed program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Top level variable declarations, in source order.
    /// Every element is a [`StmtKind::VarDeclaration`].
    pub globals: Vec<Stmt>,
    /// Functions by name, in source order.
    pub functions: IndexMap<String, FnDeclaration>,
}

impl Program {
    pub fn function(&self, ident: &str) -> Option<&FnDeclaration> {
        self.functions.get(ident)
    }
}

/// The functions implemented by the host. These can not be redefined by a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    PrintStr,
    PrintInt,
    PrintFloat,
    ScanInt,
}

impl Builtin {
    pub const ALL: [Builtin; 4] = [
        Builtin::PrintStr,
        Builtin::PrintInt,
        Builtin::PrintFloat,
        Builtin::ScanInt,
    ];

    pub fn from_ident(ident: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|builtin| builtin.ident() == ident)
    }

    pub fn ident(self) -> &'static str {
        match self {
            Builtin::PrintStr => "printStr",
            Builtin::PrintInt => "printInt",
            Builtin::PrintFloat => "printFloat",
            Builtin::ScanInt => "scanInt",
        }
    }

    /// Number of arguments that the built-in accepts.
    pub fn arity(self) -> usize {
        match self {
            Builtin::ScanInt => 0,
            _ => 1,
        }
    }

    pub fn return_ty(self) -> Type {
        match self {
            Builtin::ScanInt => Type::Int,
            _ => Type::Void,
        }
    }
}
