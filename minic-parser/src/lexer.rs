use std::fmt;
use std::ops::Range;

use logos::Logos;
use minic_source::{ErrorKind, Position, SyntaxError};

#[derive(Debug, Logos, Clone, PartialEq)]
pub enum Token {
    // literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse())]
    IntLit(i64),
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse())]
    FloatLit(f64),
    #[token("\"", string_lit)]
    StringLit(String),

    // identifiers
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // unary operators
    #[token("!")]
    LogicalNot,

    // binary operators
    // - arithmetics
    #[token("+")]
    Plus,
    #[token("-")]
    Minus, // NOTE: can also be unary
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    // - assignment
    #[token("=")]
    Equals,
    // - equality
    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    NotEquals,
    // - ordering
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEquals,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanEquals,
    // - logical
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,

    // punctuation
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,

    // keywords
    #[token("int")]
    Int,
    #[token("float")]
    Float,
    #[token("void")]
    Void,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("return")]
    Return,

    /// A complete `/* ... */` comment. Filtered out by [`Lexer`].
    /// An unterminated comment is lexed as [`Token::Error`].
    #[token("/*", block_comment)]
    BlockComment,

    // misc
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)] // single line comments
    #[error]
    Error,

    /// Only generated by [`Lexer`] once the underlying token stream is exhausted.
    Eof,
}

/// Eats everything up to and including the closing `"`.
/// Returns `None` (producing [`Token::Error`]) if the string is never closed.
fn string_lit(lex: &mut logos::Lexer<Token>) -> Option<String> {
    match lex.remainder().find('"') {
        Some(end) => {
            let content = lex.remainder()[..end].to_string();
            lex.bump(end + 1);
            Some(content)
        }
        None => {
            lex.bump(lex.remainder().len());
            None
        }
    }
}

/// Eats everything up to and including the closing `*/`.
/// Block comments do not nest.
fn block_comment(lex: &mut logos::Lexer<Token>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

impl Token {
    /// Returns the binary binding power or `None` if invalid binop token.
    /// Binding power `0` and `1` is reserved for accepting any expression.
    /// All binary operators are left associative (`l_bp < r_bp`).
    pub fn binop_bp(&self) -> Option<(u8, u8)> {
        match self {
            /* Logical */
            Token::OrOr => Some((2, 3)),
            Token::AndAnd => Some((4, 5)),
            /* Equality */
            Token::EqualsEquals | Token::NotEquals => Some((6, 7)),
            /* Ordering */
            Token::GreaterThan
            | Token::GreaterThanEquals
            | Token::LessThan
            | Token::LessThanEquals => Some((8, 9)),
            /* Additive */
            Token::Plus | Token::Minus => Some((10, 11)),
            /* Multiplicative */
            Token::Asterisk | Token::Slash | Token::Percent => Some((12, 13)),
            _ => None,
        }
    }

    /// Returns a short human readable description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::IntLit(val) => format!("integer literal `{}`", val),
            Token::FloatLit(_) => format!("float literal `{}`", self),
            Token::StringLit(_) => "string literal".to_string(),
            Token::Identifier(ident) => format!("identifier `{}`", ident),
            Token::Eof => "end of input".to_string(),
            _ => format!("`{}`", self),
        }
    }
}

/// Formats a float so that it always lexes back as a [`Token::FloatLit`].
pub fn float_text(val: f64) -> String {
    let text = val.to_string();
    if text.contains('.') || !val.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Writes the source text of the token.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::IntLit(val) => return write!(f, "{}", val),
            Token::FloatLit(val) => return f.write_str(&float_text(*val)),
            Token::StringLit(val) => return write!(f, "\"{}\"", val),
            Token::Identifier(ident) => return f.write_str(ident),
            Token::LogicalNot => "!",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Asterisk => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Equals => "=",
            Token::EqualsEquals => "==",
            Token::NotEquals => "!=",
            Token::GreaterThan => ">",
            Token::GreaterThanEquals => ">=",
            Token::LessThan => "<",
            Token::LessThanEquals => "<=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::OpenBrace => "{",
            Token::CloseBrace => "}",
            Token::Comma => ",",
            Token::Semi => ";",
            Token::Int => "int",
            Token::Float => "float",
            Token::Void => "void",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::Return => "return",
            Token::BlockComment => "/* */",
            Token::Error => "<error>",
            Token::Eof => "",
        };
        f.write_str(text)
    }
}

/// A [`Token`] together with its location in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub pos: Position,
}

/// Lazy token stream over source text.
///
/// Wraps the [`logos`] generated lexer, skipping comments, attaching line and column
/// information and turning [`Token::Error`] into a [`SyntaxError`]. Yields a single
/// [`Token::Eof`] at the end. Iteration stops after the first error.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Token>,
    content: &'a str,
    /// Line of the byte at `scanned`.
    line: usize,
    /// Byte offset of the first character of `line`.
    line_start: usize,
    /// Everything before this offset has been scanned for newlines.
    scanned: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            inner: Token::lexer(content),
            content,
            line: 1,
            line_start: 0,
            scanned: 0,
            done: false,
        }
    }

    /// Computes the position of `offset`. Offsets must be requested in increasing order.
    fn position(&mut self, offset: usize) -> Position {
        let content = self.content;
        for (i, c) in content[self.scanned..offset].char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = self.scanned + i + 1;
            }
        }
        self.scanned = offset;
        Position {
            line: self.line,
            column: content[self.line_start..offset].chars().count() + 1,
        }
    }

    fn lex_error(&self, span: &Range<usize>, pos: Position) -> SyntaxError {
        let slice = &self.content[span.clone()];
        let message = if slice.starts_with("/*") {
            "unterminated block comment".to_string()
        } else if slice.starts_with('"') {
            "unterminated string literal".to_string()
        } else if slice.starts_with(|c: char| c.is_ascii_digit()) {
            format!("invalid numeric literal `{}`", slice)
        } else {
            match slice.chars().next() {
                Some(c) => format!("unexpected character `{}`", c),
                None => "unexpected end of input".to_string(),
            }
        };
        SyntaxError::new(ErrorKind::Lex, message, pos)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<SpannedToken, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let token = match self.inner.next() {
                Some(Token::BlockComment) => continue,
                Some(token) => token,
                None => {
                    self.done = true;
                    let end = self.content.len();
                    let pos = self.position(end);
                    return Some(Ok(SpannedToken {
                        token: Token::Eof,
                        pos,
                    }));
                }
            };

            let span = self.inner.span();
            let pos = self.position(span.start);
            if token == Token::Error {
                self.done = true;
                return Some(Err(self.lex_error(&span, pos)));
            }
            return Some(Ok(SpannedToken { token, pos }));
        }
    }
}

/// Tokenizes the whole `content`, failing on the first lexical error.
/// The returned tokens always end with [`Token::Eof`].
pub fn tokenize(content: &str) -> Result<Vec<SpannedToken>, SyntaxError> {
    Lexer::new(content).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(content: &str) -> Vec<Token> {
        tokenize(content)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    fn error(content: &str) -> SyntaxError {
        tokenize(content).unwrap_err()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("int integer float _void void2 while"),
            vec![
                Token::Int,
                Token::Identifier("integer".to_string()),
                Token::Float,
                Token::Identifier("_void".to_string()),
                Token::Identifier("void2".to_string()),
                Token::While,
                Token::Eof,
            ]
        );
        assert_eq!(
            kinds("Int"),
            vec![Token::Identifier("Int".to_string()), Token::Eof]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("0 42 3.14 10.0"),
            vec![
                Token::IntLit(0),
                Token::IntLit(42),
                Token::FloatLit(3.14),
                Token::FloatLit(10.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("= == ! != < <= > >= && || % -"),
            vec![
                Token::Equals,
                Token::EqualsEquals,
                Token::LogicalNot,
                Token::NotEquals,
                Token::LessThan,
                Token::LessThanEquals,
                Token::GreaterThan,
                Token::GreaterThanEquals,
                Token::AndAnd,
                Token::OrOr,
                Token::Percent,
                Token::Minus,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(
            kinds(r#"printStr("Factorial de 5 es: ");"#),
            vec![
                Token::Identifier("printStr".to_string()),
                Token::OpenParen,
                Token::StringLit("Factorial de 5 es: ".to_string()),
                Token::CloseParen,
                Token::Semi,
                Token::Eof,
            ]
        );
        // no escape processing
        assert_eq!(
            kinds(r#""a\n""#),
            vec![Token::StringLit(r"a\n".to_string()), Token::Eof]
        );
    }

    #[test]
    fn test_comments() {
        let content = "/* header\n comment */ int x; // trailing\n/**/x";
        assert_eq!(
            kinds(content),
            vec![
                Token::Int,
                Token::Identifier("x".to_string()),
                Token::Semi,
                Token::Identifier("x".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("int x;\n  /* a\nb */ x = 1.5;").unwrap();
        let positions: Vec<_> = tokens.iter().map(|t| (t.pos.line, t.pos.column)).collect();
        assert_eq!(
            positions,
            vec![(1, 1), (1, 5), (1, 6), (3, 6), (3, 8), (3, 10), (3, 13), (3, 14)]
        );
    }

    #[test]
    fn test_lex_errors() {
        let err = error("int x;\n/* never closed");
        assert_eq!(err.kind, ErrorKind::Lex);
        assert_eq!(err.message, "unterminated block comment");
        assert_eq!(err.position, Position::new(2, 1));

        let err = error("printStr(\"oops);");
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.position, Position::new(1, 10));

        let err = error("int x = 5 @ 3;");
        assert_eq!(err.message, "unexpected character `@`");
        assert_eq!(err.position, Position::new(1, 11));

        let err = error("a & b");
        assert_eq!(err.message, "unexpected character `&`");

        assert_eq!(error("99999999999999999999").kind, ErrorKind::Lex);
    }

    #[test]
    fn test_lexer_is_lazy_and_stops_after_error() {
        let mut lexer = Lexer::new("x $ y");
        assert_eq!(
            lexer.next().unwrap().unwrap().token,
            Token::Identifier("x".to_string())
        );
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_round_trip() {
        let content = r#"
            /* Este es un programa de prueba */
            int factorial(int n) {
                // Calcula el factorial de n
                if (n <= 1 && !(n != 1) || n % 2 == 0) { return 1; }
                return n * factorial(n - 1);
            }
            void main() { float f = 2.0 / 4.25; printStr("res: "); printFloat(f); }
        "#;
        let tokens = kinds(content);
        let text = tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(kinds(&text), tokens);
    }
}
