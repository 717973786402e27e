use super::*;
use crate::ast::{Builtin, FnDeclaration, Param};

impl<'a> Parser<'a> {
    /// Parses a function declaration or a global variable declaration and adds it to `program`.
    pub(super) fn parse_top_level_declaration(&mut self, program: &mut Program) -> ParseResult<()> {
        let pos = self.current.pos;
        let ty = self.parse_type()?;
        let ident = self.expect_ident("a declaration name")?;

        if self.current.token == Token::OpenParen {
            if Builtin::from_ident(&ident).is_some() {
                return Err(SyntaxError::new(
                    ErrorKind::NameResolution,
                    format!("`{}` is a built-in function and cannot be redefined", ident),
                    pos,
                ));
            }
            if program.functions.contains_key(&ident) {
                return Err(SyntaxError::new(
                    ErrorKind::NameResolution,
                    format!("function `{}` is already defined", ident),
                    pos,
                ));
            }
            let func = self.parse_fn_declaration(ty, ident, pos)?;
            program.functions.insert(func.ident.clone(), func);
        } else {
            let stmt = self.parse_var_declaration_tail(ty, ident, pos)?;
            program.globals.push(stmt);
        }
        Ok(())
    }

    /// Parses the parameter list and body of a function.
    /// The return type and name are already eaten.
    fn parse_fn_declaration(
        &mut self,
        return_ty: Type,
        ident: String,
        pos: Position,
    ) -> ParseResult<FnDeclaration> {
        self.expect(Token::OpenParen)?;
        let mut params = Vec::new();
        if !self.eat(Token::CloseParen) {
            loop {
                let param_pos = self.current.pos;
                let ty = self.parse_type()?;
                if ty == Type::Void {
                    return Err(SyntaxError::new(
                        ErrorKind::Parse,
                        "parameters cannot be declared `void`",
                        param_pos,
                    ));
                }
                let ident = self.expect_ident("a parameter name")?;
                params.push(Param { ident, ty });

                if self.eat(Token::CloseParen) {
                    break;
                } else if !self.eat(Token::Comma) {
                    return Err(self.unexpected("`,` or `)`"));
                }
            }
        }

        if ident == "main" && !params.is_empty() {
            return Err(SyntaxError::new(
                ErrorKind::Parse,
                "`main` must not take parameters",
                pos,
            ));
        }

        self.return_ty = Some(return_ty);
        let body = self.parse_block();
        self.return_ty = None;

        Ok(FnDeclaration {
            ident,
            params,
            return_ty,
            body: body?,
            pos,
        })
    }

    /// Parses a braced list of statements.
    pub fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(Token::OpenBrace)?;

        let mut body = Vec::new();
        while !self.eat(Token::CloseBrace) {
            if self.current.token == Token::Eof {
                return Err(self.unexpected("`}`"));
            }
            body.push(self.parse_stmt()?);
        }

        Ok(body)
    }

    /// Parses the body of an `if`, `else` or `while`: either a block or a single statement.
    fn parse_body(&mut self) -> ParseResult<Vec<Stmt>> {
        let depth = self.depth;
        self.nest("statement")?;
        let body = if self.current.token == Token::OpenBrace {
            self.parse_block()?
        } else {
            vec![self.parse_stmt()?]
        };
        self.depth = depth;
        Ok(body)
    }

    /// Parses a statement.
    pub fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let is_assign =
            matches!(self.current.token, Token::Identifier(_)) && *self.peek() == Token::Equals;

        match self.current.token {
            Token::Int | Token::Float | Token::Void => self.parse_var_declaration(),
            Token::If => self.parse_if_stmt(),
            Token::While => self.parse_while_stmt(),
            Token::Return => self.parse_return_stmt(),
            Token::Identifier(_) if is_assign => self.parse_assign_stmt(),
            _ => {
                // expression statement
                let expr = self.parse_expr()?;
                if !matches!(expr.kind, ExprKind::FnCall { .. }) {
                    return Err(SyntaxError::new(
                        ErrorKind::Parse,
                        "expected a function call, found an expression statement without effect",
                        expr.pos,
                    ));
                }
                let pos = expr.pos;
                self.expect(Token::Semi)?;
                Ok(Stmt::new(StmtKind::ExprStmt(expr), pos))
            }
        }
    }

    fn parse_var_declaration(&mut self) -> ParseResult<Stmt> {
        let pos = self.current.pos;
        let ty = self.parse_type()?;
        let ident = self.expect_ident("a variable name")?;
        self.parse_var_declaration_tail(ty, ident, pos)
    }

    /// Parses the optional initializer and the `;` of a variable declaration.
    fn parse_var_declaration_tail(
        &mut self,
        ty: Type,
        ident: String,
        pos: Position,
    ) -> ParseResult<Stmt> {
        if ty == Type::Void {
            return Err(SyntaxError::new(
                ErrorKind::Parse,
                format!("variable `{}` cannot be declared `void`", ident),
                pos,
            ));
        }
        let initializer = if self.eat(Token::Equals) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(Token::Semi)?;
        Ok(Stmt::new(
            StmtKind::VarDeclaration {
                ident,
                ty,
                initializer,
            },
            pos,
        ))
    }

    fn parse_assign_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.current.pos;
        let ident = self.expect_ident("a variable name")?;
        self.expect(Token::Equals)?;
        let value = self.parse_expr()?;
        self.expect(Token::Semi)?;
        Ok(Stmt::new(StmtKind::Assign { ident, value }, pos))
    }

    fn parse_if_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.current.pos;
        self.expect(Token::If)?;
        self.expect(Token::OpenParen)?;
        let condition = self.parse_expr()?;
        self.expect(Token::CloseParen)?;
        let then_body = self.parse_body()?;
        // `else` binds to the nearest `if`
        let else_body = if self.eat(Token::Else) {
            Some(self.parse_body()?)
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_body,
                else_body,
            },
            pos,
        ))
    }

    fn parse_while_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.current.pos;
        self.expect(Token::While)?;
        self.expect(Token::OpenParen)?;
        let condition = self.parse_expr()?;
        self.expect(Token::CloseParen)?;
        let body = self.parse_body()?;
        Ok(Stmt::new(StmtKind::While { condition, body }, pos))
    }

    fn parse_return_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.current.pos;
        self.expect(Token::Return)?;
        if self.current.token == Token::Semi {
            match self.return_ty {
                Some(ty) if ty != Type::Void => {
                    return Err(SyntaxError::new(
                        ErrorKind::Parse,
                        format!("expected a return value in a function returning `{}`", ty),
                        self.current.pos,
                    ));
                }
                _ => {
                    self.next();
                    return Ok(Stmt::new(StmtKind::Return(None), pos));
                }
            }
        }
        let expr = self.parse_expr()?;
        self.expect(Token::Semi)?;
        Ok(Stmt::new(StmtKind::Return(Some(expr)), pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn program(source: &str) -> Program {
        let source = source.into();
        let program = Parser::new(&source).parse_program().unwrap();
        assert!(source.has_no_errors());
        program
    }

    fn stmt(source: &str) -> String {
        let source = source.into();
        let mut parser = Parser::new(&source);
        parser.parse_stmt().unwrap().to_string()
    }

    fn program_error(source: &str) -> SyntaxError {
        let source = source.into();
        let err = Parser::new(&source).parse_program().unwrap_err();
        assert!(!source.has_no_errors());
        err
    }

    #[test]
    fn test_var_declaration() {
        assert_snapshot!(stmt("int x;"), @"int x;");
        assert_snapshot!(stmt("float y = 1 + 2.5;"), @"float y = (1 + 2.5);");
    }

    #[test]
    fn test_assign() {
        assert_snapshot!(stmt("i = i + 1;"), @"i = (i + 1);");
        assert_snapshot!(stmt("num = scanInt();"), @"num = scanInt();");
    }

    #[test]
    fn test_expr_stmt() {
        assert_snapshot!(stmt(r#"printStr(" ");"#), @r#"printStr(" ");"#);
    }

    #[test]
    fn test_if_else_binds_to_nearest_if() {
        let printed = stmt("if (a) if (b) printInt(1); else printInt(2);");
        assert_snapshot!(printed, @r###"
        if (a) {
            if (b) {
                printInt(1);
            } else {
                printInt(2);
            }
        }
        "###);
    }

    #[test]
    fn test_while() {
        assert_snapshot!(stmt("while (i < 10) { i = i + 1; }"), @r###"
        while ((i < 10)) {
            i = (i + 1);
        }
        "###);
    }

    #[test]
    fn test_functions() {
        let program = program(
            r#"
            int factorial(int n) {
                if (n <= 1) {
                    return 1;
                }
                return n * factorial(n - 1);
            }

            void main() {
                int num = 5;
                printStr("Factorial de 5 es: ");
                printInt(factorial(num));
            }"#,
        );
        assert_eq!(
            program.functions.keys().collect::<Vec<_>>(),
            vec!["factorial", "main"]
        );
        let factorial = program.function("factorial").unwrap();
        assert_eq!(factorial.return_ty, Type::Int);
        assert_eq!(
            factorial.params,
            vec![Param {
                ident: "n".to_string(),
                ty: Type::Int
            }]
        );
        assert_eq!(factorial.body.len(), 2);
        assert_eq!(factorial.pos, Position::new(2, 13));
        assert_eq!(program.function("main").unwrap().body.len(), 3);
    }

    #[test]
    fn test_globals() {
        let program = program("int counter; float pi = 3.14159; void main() { counter = 1; }");
        assert_eq!(program.globals.len(), 2);
        assert_eq!(program.functions.len(), 1);
    }

    #[test]
    fn test_parse_from_tokens() {
        let content = "void main() { printInt(1); }";
        let source = content.into();
        let tokens = crate::lexer::tokenize(content).unwrap();
        let program = Parser::with_tokens(&source, tokens).parse_program().unwrap();
        assert!(program.function("main").is_some());
    }

    #[test]
    fn test_missing_semicolon() {
        let err = program_error("void main() {\n    int x = 0\n    printInt(x);\n}");
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.message, "expected `;`, found identifier `printInt`");
        assert_eq!(err.position, Position::new(3, 5));
    }

    #[test]
    fn test_missing_expression() {
        let err = program_error("void main() {\n    int x = ;\n}");
        assert_eq!(err.message, "expected an expression, found `;`");
        assert_eq!(err.position, Position::new(2, 13));
    }

    #[test]
    fn test_invalid_parameter() {
        let err = program_error("int test(int x, ) { return x; }");
        assert_eq!(err.message, "expected a type, found `)`");
    }

    #[test]
    fn test_bare_expression_statement() {
        let err = program_error("void main() { 1 + 2; }");
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.position, Position::new(1, 15));
    }

    #[test]
    fn test_return_value_required() {
        let err = program_error("int f() { return; }");
        assert_eq!(
            err.message,
            "expected a return value in a function returning `int`"
        );
        assert!(program("void f() { return; } void main() { f(); }")
            .function("f")
            .is_some());
    }

    #[test]
    fn test_main_without_parameters() {
        let err = program_error("void main(int argc) { }");
        assert_eq!(err.message, "`main` must not take parameters");
    }

    #[test]
    fn test_duplicate_function() {
        let err = program_error("int f() { return 1; }\nint f() { return 2; }");
        assert_eq!(err.kind, ErrorKind::NameResolution);
        assert_eq!(err.position, Position::new(2, 1));
    }

    #[test]
    fn test_statement_nesting_limit() {
        let nested = |n| format!("void main() {{ {}printInt(1); }}", "while (1) ".repeat(n));
        program(&nested(100));

        let err = program_error(&nested(20_000));
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.message, "statement nested too deeply");
    }

    #[test]
    fn test_builtin_redefinition() {
        let err = program_error("void printInt(int x) { }");
        assert_eq!(err.kind, ErrorKind::NameResolution);
    }

    #[test]
    fn test_void_variable() {
        let err = program_error("void main() { void x; }");
        assert_eq!(err.message, "variable `x` cannot be declared `void`");
    }

    #[test]
    fn test_unclosed_block() {
        let err = program_error("void main() { printInt(1);");
        assert_eq!(err.message, "expected `}`, found end of input");
    }

    #[test]
    fn test_lex_error_is_reported() {
        let err = program_error("void main() {\n/* oops");
        assert_eq!(err.kind, ErrorKind::Lex);
        assert_eq!(err.message, "unterminated block comment");
    }
}
