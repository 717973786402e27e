use super::*;
use crate::ast::UnaryOp;

/// Binding power of the operand of a prefix operator. Binds tighter than any binary operator.
const PREFIX_BP: u8 = 14;

impl<'a> Parser<'a> {
    /* Expressions */
    /// Parses any expression.
    /// This is equivalent to calling [`Self::parse_expr_bp`] with `min_bp = 0`.
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_expr_bp(0) // 0 to accept any expression
    }

    /// Parses a primary (atom) expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expr> {
        let pos = self.current.pos;
        // NOTE: prefix operators are handled here
        match self.current.token {
            Token::IntLit(_) | Token::FloatLit(_) | Token::StringLit(_) => {
                self.parse_literal_expr()
            }
            Token::Identifier(_) => self.parse_identifier_or_call_expr(),
            Token::LogicalNot | Token::Minus => {
                let op = match self.next() {
                    Token::Minus => UnaryOp::Neg,
                    _ => UnaryOp::Not,
                };
                let arg = self.parse_expr_bp(PREFIX_BP)?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op,
                        arg: Box::new(arg),
                    },
                    pos,
                ))
            }
            Token::OpenParen => {
                self.next();
                let expr = self.parse_expr()?;
                self.expect(Token::CloseParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Parses an expression with the specified `min_bp`.
    /// To parse any expression use, [`Self::parse_expr`].
    fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let depth = self.depth;
        self.nest("expression")?;
        let mut lhs = self.parse_primary_expr()?;

        loop {
            let (op, (l_bp, r_bp)) = match (
                self.current.token.binary_op(),
                self.current.token.binop_bp(),
            ) {
                (Some(op), Some(bp)) => (op, bp),
                _ => break, // not a valid binop, stop parsing
            };
            if l_bp < min_bp {
                break; // less than the min_bp, stop parsing
            }

            // self.current is a valid binop
            self.next();
            // each operator wraps `lhs` one level deeper
            self.nest("expression")?;

            let rhs = self.parse_expr_bp(r_bp)?;

            let pos = lhs.pos;
            lhs = Expr::new(
                ExprKind::Binary {
                    lhs: Box::new(lhs),
                    op,
                    rhs: Box::new(rhs),
                },
                pos,
            );
        }

        self.depth = depth;
        Ok(lhs)
    }

    /* Expressions.Literals */
    /// Parses a literal expression.
    /// A literal can be an integer, a float or a string literal.
    fn parse_literal_expr(&mut self) -> ParseResult<Expr> {
        let kind = match self.current.token {
            Token::IntLit(val) => ExprKind::IntLit(val),
            Token::FloatLit(val) => ExprKind::FloatLit(val),
            Token::StringLit(ref val) => ExprKind::StringLit(val.clone()),
            _ => return Err(self.unexpected("a literal")),
        };
        let expr = Expr::new(kind, self.current.pos);
        self.next(); // eat parsed token
        Ok(expr)
    }

    /* Expressions.Identifier */
    /// Parses an identifier or a call expression.
    fn parse_identifier_or_call_expr(&mut self) -> ParseResult<Expr> {
        let pos = self.current.pos;
        let ident = self.expect_ident("an identifier")?;

        if self.eat(Token::OpenParen) {
            // parse call expression
            let mut args = Vec::new();

            if !self.eat(Token::CloseParen) {
                loop {
                    args.push(self.parse_expr()?);

                    if self.eat(Token::CloseParen) {
                        break;
                    } else if !self.eat(Token::Comma) {
                        return Err(self.unexpected("`,` or `)`"));
                    }
                }
            }

            Ok(Expr::new(ExprKind::FnCall { ident, args }, pos))
        } else {
            // parse identifier expression
            Ok(Expr::new(ExprKind::Identifier(ident), pos))
        }
    }
}
