//! Pretty printing for AST nodes.
//!
//! The output is valid source code. Binary and unary expressions are fully parenthesized
//! and `if`/`while` bodies always get braces, so printing a re-parsed program gives back
//! the same text.

use crate::ast::{Expr, ExprKind, FnDeclaration, Program, Stmt, StmtKind};
use crate::lexer::float_text;
use std::fmt;

const INDENT: &str = "    ";

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::IntLit(val) => write!(f, "{}", val),
            ExprKind::FloatLit(val) => f.write_str(&float_text(*val)),
            ExprKind::StringLit(val) => write!(f, "\"{}\"", val),
            ExprKind::Identifier(ident) => f.write_str(ident),
            ExprKind::Binary { lhs, op, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            ExprKind::Unary { op, arg } => write!(f, "({}{})", op.symbol(), arg),
            ExprKind::FnCall { ident, args } => {
                write!(f, "{}(", ident)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Writes `body` as a braced block. The closing brace is indented by `indent` levels.
fn write_block(f: &mut fmt::Formatter<'_>, body: &[Stmt], indent: usize) -> fmt::Result {
    f.write_str("{\n")?;
    for stmt in body {
        write_stmt(f, stmt, indent + 1)?;
        f.write_str("\n")?;
    }
    write!(f, "{}}}", INDENT.repeat(indent))
}

/// Writes a single statement without a trailing newline.
fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, indent: usize) -> fmt::Result {
    f.write_str(&INDENT.repeat(indent))?;
    match &stmt.kind {
        StmtKind::VarDeclaration {
            ident,
            ty,
            initializer: Some(initializer),
        } => write!(f, "{} {} = {};", ty, ident, initializer),
        StmtKind::VarDeclaration {
            ident,
            ty,
            initializer: None,
        } => write!(f, "{} {};", ty, ident),
        StmtKind::Assign { ident, value } => write!(f, "{} = {};", ident, value),
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            write!(f, "if ({}) ", condition)?;
            write_block(f, then_body, indent)?;
            if let Some(else_body) = else_body {
                f.write_str(" else ")?;
                write_block(f, else_body, indent)?;
            }
            Ok(())
        }
        StmtKind::While { condition, body } => {
            write!(f, "while ({}) ", condition)?;
            write_block(f, body, indent)
        }
        StmtKind::Return(Some(expr)) => write!(f, "return {};", expr),
        StmtKind::Return(None) => f.write_str("return;"),
        StmtKind::ExprStmt(expr) => write!(f, "{};", expr),
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

impl fmt::Display for FnDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_ty, self.ident)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", param.ty, param.ident)?;
        }
        f.write_str(") ")?;
        write_block(f, &self.body, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in &self.globals {
            writeln!(f, "{}", global)?;
        }
        for (i, func) in self.functions.values().enumerate() {
            if i > 0 || !self.globals.is_empty() {
                writeln!(f)?;
            }
            writeln!(f, "{}", func)?;
        }
        Ok(())
    }
}
