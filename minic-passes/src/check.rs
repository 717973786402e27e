//! Static semantic checks.
//!
//! The checker walks the AST without executing it and reports every problem it finds to the
//! [`ErrorReporter`](minic_source::ErrorReporter) of the [`Source`]. It finds the same
//! name resolution, arity and type errors that evaluation would raise, on every path.

use minic_parser::ast::{
    BinaryOp, Builtin, Expr, ExprKind, FnDeclaration, Program, Stmt, StmtKind, Type, UnaryOp,
};
use minic_source::{ErrorKind, Position, Source, SyntaxError};
use rustc_hash::FxHashMap;
use std::fmt;

/// The static type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprTy {
    Int,
    Float,
    /// A string literal.
    Str,
    /// The result of a call to a `void` function.
    Void,
}

impl From<Type> for ExprTy {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Int => ExprTy::Int,
            Type::Float => ExprTy::Float,
            Type::Void => ExprTy::Void,
        }
    }
}

impl fmt::Display for ExprTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExprTy::Int => "int",
            ExprTy::Float => "float",
            ExprTy::Str => "string",
            ExprTy::Void => "void",
        })
    }
}

/// Returns `true` if a value of type `found` can be stored in a slot of type `ty`.
/// `int` is widened to `float`; nothing is narrowed.
fn is_assignable(ty: Type, found: ExprTy) -> bool {
    matches!(
        (ty, found),
        (Type::Int, ExprTy::Int) | (Type::Float, ExprTy::Int) | (Type::Float, ExprTy::Float)
    )
}

/// Returns `true` if every path through `body` ends in a `return`.
fn always_returns(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::If {
            then_body,
            else_body: Some(else_body),
            ..
        } => always_returns(then_body) && always_returns(else_body),
        _ => false,
    })
}

pub struct Checker<'a> {
    program: &'a Program,
    /// Variables currently in scope, innermost scope last. The first scope holds the globals.
    scopes: Vec<FxHashMap<&'a str, Type>>,
    current_fn: Option<&'a FnDeclaration>,
    source: &'a Source<'a>,
}

impl<'a> Checker<'a> {
    pub fn new(source: &'a Source<'a>, program: &'a Program) -> Self {
        Self {
            program,
            scopes: vec![FxHashMap::default()],
            current_fn: None,
            source,
        }
    }

    /// Checks the globals and then every function.
    /// Returns `true` if no error was reported.
    pub fn check_program(&mut self) -> bool {
        let errors_before = self.source.errors.len();
        let program = self.program;

        for global in &program.globals {
            self.check_stmt(global);
        }
        if program.function("main").is_none() {
            self.error(
                ErrorKind::NameResolution,
                "no `main` function defined",
                Position::default(),
            );
        }
        for func in program.functions.values() {
            self.check_fn(func);
        }

        self.source.errors.len() == errors_before
    }

    fn error(&self, kind: ErrorKind, message: impl ToString, pos: Position) {
        self.source
            .errors
            .add_error(SyntaxError::new(kind, message, pos));
    }

    /* Scopes */
    fn enter_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, ident: &'a str, ty: Type, pos: Position) {
        let duplicate = match self.scopes.last_mut() {
            Some(scope) => scope.insert(ident, ty).is_some(),
            None => false,
        };
        if duplicate {
            self.error(
                ErrorKind::NameResolution,
                format!("variable `{}` is already declared in this scope", ident),
                pos,
            );
        }
    }

    fn lookup(&self, ident: &str) -> Option<Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(ident).copied())
    }

    /// Reports an error if `found` cannot be stored in a slot of type `ty`.
    fn check_assignable(
        &self,
        ty: Type,
        found: ExprTy,
        what: impl FnOnce() -> String,
        pos: Position,
    ) {
        if !is_assignable(ty, found) {
            self.error(
                ErrorKind::Type,
                format!("{} has type `{}`, found `{}`", what(), ty, found),
                pos,
            );
        }
    }

    /* Functions */
    fn check_fn(&mut self, func: &'a FnDeclaration) {
        self.current_fn = Some(func);

        // parameters share the scope of the body
        self.enter_scope();
        for param in &func.params {
            self.declare(&param.ident, param.ty, func.pos);
        }
        self.check_stmts(&func.body);
        self.exit_scope();

        if func.return_ty != Type::Void && !always_returns(&func.body) {
            self.error(
                ErrorKind::Type,
                format!(
                    "function `{}` returning `{}` can reach the end without returning a value",
                    func.ident, func.return_ty
                ),
                func.pos,
            );
        }

        self.current_fn = None;
    }

    /* Statements */
    fn check_stmts(&mut self, body: &'a [Stmt]) {
        for stmt in body {
            self.check_stmt(stmt);
        }
    }

    fn check_block(&mut self, body: &'a [Stmt]) {
        self.enter_scope();
        self.check_stmts(body);
        self.exit_scope();
    }

    fn check_stmt(&mut self, stmt: &'a Stmt) {
        match &stmt.kind {
            StmtKind::VarDeclaration {
                ident,
                ty,
                initializer,
            } => {
                // the initializer cannot see the variable being declared
                if let Some(initializer) = initializer {
                    if let Some(found) = self.check_value(initializer) {
                        let what = || format!("variable `{}`", ident);
                        self.check_assignable(*ty, found, what, initializer.pos);
                    }
                }
                self.declare(ident, *ty, stmt.pos);
            }
            StmtKind::Assign { ident, value } => {
                let found = self.check_value(value);
                match (self.lookup(ident), found) {
                    (Some(ty), Some(found)) => {
                        let what = || format!("variable `{}`", ident);
                        self.check_assignable(ty, found, what, value.pos)
                    }
                    (Some(_), None) => {}
                    (None, _) => self.error(
                        ErrorKind::NameResolution,
                        format!("undeclared variable `{}`", ident),
                        stmt.pos,
                    ),
                }
            }
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                self.check_value(condition);
                self.check_block(then_body);
                if let Some(else_body) = else_body {
                    self.check_block(else_body);
                }
            }
            StmtKind::While { condition, body } => {
                self.check_value(condition);
                self.check_block(body);
            }
            StmtKind::Return(expr) => self.check_return(expr.as_ref(), stmt.pos),
            StmtKind::ExprStmt(expr) => {
                // the result of a call statement is discarded, so `void` is fine here
                self.check_expr(expr);
            }
        }
    }

    fn check_return(&mut self, expr: Option<&'a Expr>, pos: Position) {
        let func = match self.current_fn {
            Some(func) => func,
            None => return,
        };
        let expr = match expr {
            Some(expr) => expr,
            None => return, // a missing value is a parse error
        };

        let found = self.check_value(expr);
        if func.return_ty == Type::Void {
            self.error(
                ErrorKind::Type,
                format!("`void` function `{}` cannot return a value", func.ident),
                pos,
            );
        } else if let Some(found) = found {
            self.check_assignable(
                func.return_ty,
                found,
                || format!("the return value of `{}`", func.ident),
                expr.pos,
            );
        }
    }

    /* Expressions */
    /// Checks an expression used as a value: neither a string nor a `void` call.
    /// Returns `None` if an error was reported.
    fn check_value(&mut self, expr: &'a Expr) -> Option<ExprTy> {
        match self.check_expr(expr)? {
            ExprTy::Str => {
                self.error(
                    ErrorKind::Type,
                    "string literals can only be passed to `printStr`",
                    expr.pos,
                );
                None
            }
            ExprTy::Void => {
                let ident = match &expr.kind {
                    ExprKind::FnCall { ident, .. } => ident.as_str(),
                    _ => "expression",
                };
                self.error(
                    ErrorKind::Type,
                    format!("`{}` does not return a value", ident),
                    expr.pos,
                );
                None
            }
            ty => Some(ty),
        }
    }

    /// Returns the type of `expr` or `None` if an error was reported.
    fn check_expr(&mut self, expr: &'a Expr) -> Option<ExprTy> {
        match &expr.kind {
            ExprKind::IntLit(_) => Some(ExprTy::Int),
            ExprKind::FloatLit(_) => Some(ExprTy::Float),
            ExprKind::StringLit(_) => Some(ExprTy::Str),
            ExprKind::Identifier(ident) => match self.lookup(ident) {
                Some(ty) => Some(ty.into()),
                None => {
                    self.error(
                        ErrorKind::NameResolution,
                        format!("undeclared variable `{}`", ident),
                        expr.pos,
                    );
                    None
                }
            },
            ExprKind::Binary { lhs, op, rhs } => self.check_binary_expr(lhs, *op, rhs, expr.pos),
            ExprKind::Unary { op, arg } => {
                let ty = self.check_value(arg)?;
                match op {
                    UnaryOp::Not => Some(ExprTy::Int),
                    UnaryOp::Neg => Some(ty),
                }
            }
            ExprKind::FnCall { ident, args } => self.check_call(ident, args, expr.pos),
        }
    }

    fn check_binary_expr(
        &mut self,
        lhs: &'a Expr,
        op: BinaryOp,
        rhs: &'a Expr,
        pos: Position,
    ) -> Option<ExprTy> {
        let lhs = self.check_value(lhs);
        let rhs = self.check_value(rhs);
        let (lhs, rhs) = (lhs?, rhs?);

        match op {
            BinaryOp::Rem if lhs == ExprTy::Float || rhs == ExprTy::Float => {
                self.error(
                    ErrorKind::Type,
                    format!("operands of `%` must be `int`, found `{}` and `{}`", lhs, rhs),
                    pos,
                );
                None
            }
            BinaryOp::And | BinaryOp::Or => Some(ExprTy::Int),
            op if op.is_comparison() => Some(ExprTy::Int),
            _ if lhs == ExprTy::Float || rhs == ExprTy::Float => Some(ExprTy::Float),
            _ => Some(ExprTy::Int),
        }
    }

    fn check_call(&mut self, ident: &str, args: &'a [Expr], pos: Position) -> Option<ExprTy> {
        if let Some(builtin) = Builtin::from_ident(ident) {
            return self.check_builtin_call(builtin, args, pos);
        }

        let program = self.program;
        let func = match program.function(ident) {
            Some(func) => func,
            None => {
                self.error(
                    ErrorKind::NameResolution,
                    format!("undeclared function `{}`", ident),
                    pos,
                );
                for arg in args {
                    self.check_expr(arg);
                }
                return None;
            }
        };

        if args.len() != func.params.len() {
            self.error(
                ErrorKind::Arity,
                format!(
                    "`{}` expects {} argument(s), received {}",
                    ident,
                    func.params.len(),
                    args.len()
                ),
                pos,
            );
        }
        for (i, arg) in args.iter().enumerate() {
            let found = self.check_value(arg);
            if let (Some(param), Some(found)) = (func.params.get(i), found) {
                self.check_assignable(
                    param.ty,
                    found,
                    || format!("parameter `{}` of `{}`", param.ident, ident),
                    arg.pos,
                );
            }
        }

        Some(func.return_ty.into())
    }

    fn check_builtin_call(
        &mut self,
        builtin: Builtin,
        args: &'a [Expr],
        pos: Position,
    ) -> Option<ExprTy> {
        if args.len() != builtin.arity() {
            self.error(
                ErrorKind::Arity,
                format!(
                    "`{}` expects {} argument(s), received {}",
                    builtin.ident(),
                    builtin.arity(),
                    args.len()
                ),
                pos,
            );
        }

        match (builtin, args.first()) {
            (Builtin::PrintStr, Some(arg)) => {
                if let Some(found) = self.check_expr(arg) {
                    if found != ExprTy::Str {
                        self.error(
                            ErrorKind::Type,
                            format!("`printStr` expects a string, found `{}`", found),
                            arg.pos,
                        );
                    }
                }
            }
            (Builtin::PrintInt, Some(arg)) => {
                if let Some(found) = self.check_value(arg) {
                    let what = || "the argument of `printInt`".to_string();
                    self.check_assignable(Type::Int, found, what, arg.pos);
                }
            }
            (Builtin::PrintFloat, Some(arg)) => {
                self.check_value(arg);
            }
            _ => {}
        }
        for arg in args.iter().skip(1) {
            self.check_expr(arg);
        }

        Some(builtin.return_ty().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    /// Parses and checks `source`, returning the reported errors.
    fn check(source: &str) -> Vec<SyntaxError> {
        let source = Source::new(source);
        let program = minic_parser::parse(&source).unwrap();
        Checker::new(&source, &program).check_program();
        source.errors.to_vec()
    }

    fn messages(source: &str) -> Vec<String> {
        check(source).into_iter().map(|err| err.message).collect()
    }

    #[test]
    fn test_valid_programs() {
        let factorial = r#"
            int factorial(int n) {
                if (n <= 1) {
                    return 1;
                }
                return n * factorial(n - 1);
            }
            void main() {
                int num;
                float result;
                printStr("Ingrese un numero: ");
                num = scanInt();
                result = factorial(num);
                printFloat(result);
            }"#;
        assert!(check(factorial).is_empty());

        let globals = "int count = 0; float scale = count; void main() { count = count + 1; printInt(count); }";
        assert!(check(globals).is_empty());

        let sign = "int sign(float x) { if (x < 0) return -1; else if (x == 0) return 0; else return 1; } void main() { printInt(sign(2)); }";
        assert!(check(sign).is_empty());
    }

    #[test]
    fn test_undeclared_names() {
        assert_eq!(
            messages("void main() { x = 1; printInt(y); foo(z); }"),
            vec![
                "undeclared variable `x`",
                "undeclared variable `y`",
                "undeclared function `foo`",
                "undeclared variable `z`",
            ]
        );
    }

    #[test]
    fn test_scopes() {
        assert_eq!(
            messages("void main() { if (1) { int a = 1; } printInt(a); }"),
            vec!["undeclared variable `a`"]
        );
        // locals shadow globals
        assert!(check("int a; void main() { float a = 1.5; printFloat(a); }").is_empty());
    }

    #[test]
    fn test_duplicate_variables() {
        let errors = check("void main() {\n    int a;\n    float a;\n}");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::NameResolution);
        assert_eq!(errors[0].position, Position::new(3, 5));

        assert_eq!(
            messages("void f(int n) { int n = 1; } void main() { }"),
            vec!["variable `n` is already declared in this scope"]
        );
        assert!(check("void main() { int a; if (1) { int a; } }").is_empty());
    }

    #[test]
    fn test_narrowing() {
        assert_eq!(
            messages("int f(int n) { return 1.5; } void main() { int a = 2.0; a = 1.0 * 2; f(0.5); printInt(1.5); }"),
            vec![
                "the return value of `f` has type `int`, found `float`",
                "variable `a` has type `int`, found `float`",
                "variable `a` has type `int`, found `float`",
                "parameter `n` of `f` has type `int`, found `float`",
                "the argument of `printInt` has type `int`, found `float`",
            ]
        );
    }

    #[test]
    fn test_arity() {
        let errors = check(
            "int add(int a, int b) { return a + b; } void main() { printInt(add(1)); printInt(1, 2); }",
        );
        let kinds: Vec<_> = errors.iter().map(|err| err.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::Arity, ErrorKind::Arity]);
        assert_eq!(errors[0].message, "`add` expects 2 argument(s), received 1");
    }

    #[test]
    fn test_strings_and_void_values() {
        assert_eq!(
            messages(r#"void f() { } void main() { int a = f(); printInt("x"); printStr(1); }"#),
            vec![
                "`f` does not return a value",
                "string literals can only be passed to `printStr`",
                "`printStr` expects a string, found `int`",
            ]
        );
    }

    #[test]
    fn test_returns() {
        assert_eq!(
            messages("void f() { return 1; } int g(int n) { if (n) return 1; } int h(int n) { while (n) return 1; } void main() { }"),
            vec![
                "`void` function `f` cannot return a value",
                "function `g` returning `int` can reach the end without returning a value",
                "function `h` returning `int` can reach the end without returning a value",
            ]
        );
    }

    #[test]
    fn test_float_remainder() {
        let errors = check("void main() { printInt(5 % 2.0); }");
        assert_eq!(errors.len(), 1);
        assert_snapshot!(errors[0].to_string(), @"type error at 1:24: operands of `%` must be `int`, found `int` and `float`");
    }

    #[test]
    fn test_missing_main() {
        assert_eq!(messages("int f() { return 1; }"), vec!["no `main` function defined"]);
    }
}
