use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, Type};
use crate::lexer::{Lexer, SpannedToken, Token};
use minic_source::{ErrorKind, Position, Source, SyntaxError};
use std::fmt;
use std::mem;

mod expr;
mod stmt;

pub type ParseResult<T> = Result<T, SyntaxError>;

/// Maximum nesting of expressions and statement bodies.
/// Every binary operator, prefix operator, parenthesis, call and `if`/`while` body adds a level.
pub const MAX_NESTING: usize = 512;

type TokenStream<'a> = Box<dyn Iterator<Item = Result<SpannedToken, SyntaxError>> + 'a>;

/// Recursive descent parser. Stops at the first error.
pub struct Parser<'a> {
    /// Cached token for peeking.
    current: SpannedToken,
    /// Second token of lookahead, only filled by [`Parser::peek`].
    peeked: Option<SpannedToken>,
    tokens: TokenStream<'a>,
    /// A lexical error is reported once the parser reaches the offending token.
    lex_error: Option<SyntaxError>,
    /// Return type of the function being parsed. `None` at the top level.
    return_ty: Option<Type>,
    /// Current nesting level, see [`MAX_NESTING`].
    depth: usize,
    /// Source code
    source: &'a Source<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a Source<'a>) -> Self {
        Self::with_stream(source, Box::new(Lexer::new(source.content)))
    }

    /// Creates a parser over an already tokenized program (see [`crate::lexer::tokenize`]).
    /// `source` is only used for error reporting.
    pub fn with_tokens(source: &'a Source<'a>, tokens: Vec<SpannedToken>) -> Self {
        Self::with_stream(source, Box::new(tokens.into_iter().map(Ok)))
    }

    fn with_stream(source: &'a Source<'a>, tokens: TokenStream<'a>) -> Self {
        let mut parser = Self {
            current: SpannedToken {
                token: Token::Eof,
                pos: Position::default(),
            },
            peeked: None,
            tokens,
            lex_error: None,
            return_ty: None,
            depth: 0,
            source,
        };
        parser.next();
        parser
    }
}

impl<'a> Parser<'a> {
    /// Parses a whole program.
    /// The error, if any, is also added to the [`Source`]'s error reporter.
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut program = Program::default();
        let mut result = Ok(());
        while self.current.token != Token::Eof {
            result = self.parse_top_level_declaration(&mut program);
            if result.is_err() {
                break;
            }
        }

        match result {
            Ok(()) => Ok(program),
            Err(err) => {
                self.source.errors.add_error(err.clone());
                Err(err)
            }
        }
    }
}

/// Parse utilities
impl<'a> Parser<'a> {
    fn lex(&mut self) -> SpannedToken {
        match self.tokens.next() {
            Some(Ok(token)) => token,
            Some(Err(err)) => {
                let token = SpannedToken {
                    token: Token::Error,
                    pos: err.position,
                };
                self.lex_error = Some(err);
                token
            }
            None => SpannedToken {
                token: Token::Eof,
                pos: self.current.pos,
            },
        }
    }

    fn next(&mut self) -> Token {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex(),
        };
        mem::replace(&mut self.current, token).token
    }

    /// Returns the token after `self.current` without consuming anything.
    fn peek(&mut self) -> &Token {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex(),
        };
        &self.peeked.insert(token).token
    }

    /// Predicate that tests whether the next token has the same discriminant
    /// and eats the next token if yes as a side effect.
    fn eat(&mut self, tok: Token) -> bool {
        if mem::discriminant(&self.current.token) == mem::discriminant(&tok) {
            self.next(); // eat token
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token) -> ParseResult<()> {
        if self.eat(tok.clone()) {
            Ok(())
        } else {
            Err(self.unexpected(format!("`{}`", tok)))
        }
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<String> {
        if let Token::Identifier(ref ident) = self.current.token {
            let ident = ident.clone();
            self.next();
            Ok(ident)
        } else {
            Err(self.unexpected(what))
        }
    }

    /// Enters one more level of nesting. `what` names the construct in the error message.
    /// The caller restores `self.depth` once the construct is parsed.
    fn nest(&mut self, what: &str) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(SyntaxError::new(
                ErrorKind::Parse,
                format!("{} nested too deeply", what),
                self.current.pos,
            ));
        }
        Ok(())
    }

    /// Parses `int`, `float` or `void`.
    fn parse_type(&mut self) -> ParseResult<Type> {
        let ty = match self.current.token {
            Token::Int => Type::Int,
            Token::Float => Type::Float,
            Token::Void => Type::Void,
            _ => return Err(self.unexpected("a type")),
        };
        self.next();
        Ok(ty)
    }

    /// Creates an unexpected token error.
    /// If the current token could not be lexed, the lexical error is returned instead.
    fn unexpected(&mut self, expected: impl fmt::Display) -> SyntaxError {
        if let Some(err) = self.lex_error.take() {
            return err;
        }
        SyntaxError::new(
            ErrorKind::Parse,
            format!(
                "expected {}, found {}",
                expected,
                self.current.token.describe()
            ),
            self.current.pos,
        )
    }
}

impl Token {
    /// Returns the [`BinaryOp`] for a binary operator token.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        let op = match self {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Asterisk => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Rem,
            Token::EqualsEquals => BinaryOp::Eq,
            Token::NotEquals => BinaryOp::Ne,
            Token::LessThan => BinaryOp::Lt,
            Token::LessThanEquals => BinaryOp::Le,
            Token::GreaterThan => BinaryOp::Gt,
            Token::GreaterThanEquals => BinaryOp::Ge,
            Token::AndAnd => BinaryOp::And,
            Token::OrOr => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }
}
