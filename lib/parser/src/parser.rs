mod expr;

use errors::{Diagnostic, Diagnostics};
pub use expr::{Expr, LiteralValue};
use scanner::{Scanner, Token, TokenType};

use TokenType::*;

/// Nesting limit used by [`ParserOptions::default`] unless the `strict` feature is on.
///
/// Every nesting level recurses through the whole precedence chain (about eight
/// frames, several KiB in debug builds), so this keeps the deepest accepted
/// input well inside a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Receives every syntax error the parser runs into. The parser never prints
/// anything itself.
pub trait Reporter {
    fn report(&mut self, token: &Token<'_>, message: &str);
}

impl Reporter for Diagnostics {
    fn report(&mut self, token: &Token<'_>, message: &str) {
        self.push(Diagnostic::at(token, message));
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorType {
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Expect ')' after expression.")]
    ExpectedRightParen,
    #[error("Expect ';' after expression.")]
    ExpectedSemicolon,
    #[error("Expression nested too deeply.")]
    TooDeeplyNested,
}

/// A syntax error that has already been handed to the [`Reporter`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct SyntaxError<'a> {
    pub error: SyntaxErrorType,
    pub token: Token<'a>,
}

pub type Result<'a, T> = std::result::Result<T, SyntaxError<'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum combined depth of parentheses and prefix operators, `None` for no limit.
    pub max_depth: Option<usize>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { max_depth: if cfg!(feature = "strict") { None } else { Some(DEFAULT_MAX_DEPTH) } }
    }
}

/// Recursive descent parser for Lox expressions.
///
/// Each precedence level is a method that parses operands at the next
/// tighter level and folds its own operators to the left:
///
/// ```text
/// expression → equality
/// equality   → comparison ( ( "!=" | "==" ) comparison )*
/// comparison → term ( ( ">" | ">=" | "<" | "<=" ) term )*
/// term       → factor ( ( "-" | "+" ) factor )*
/// factor     → unary ( ( "/" | "*" ) unary )*
/// unary      → ( "!" | "-" ) unary | primary
/// primary    → NUMBER | STRING | "true" | "false" | "nil" | "(" expression ")"
/// ```
pub struct Parser<'p, 'a> {
    tokens: &'p [Token<'a>],
    current: usize,
    depth: usize,
    options: ParserOptions,
    reporter: &'p mut dyn Reporter,
}

impl<'p, 'a> Parser<'p, 'a> {
    pub fn new(tokens: &'p [Token<'a>], reporter: &'p mut dyn Reporter) -> Self {
        Self::with_options(tokens, reporter, ParserOptions::default())
    }

    /// Panics if `tokens` does not end with an Eof token.
    pub fn with_options(
        tokens: &'p [Token<'a>],
        reporter: &'p mut dyn Reporter,
        options: ParserOptions,
    ) -> Self {
        assert!(
            tokens.last().map(Token::ty) == Some(Eof),
            "token sequence must end with an Eof token"
        );
        Self { tokens, current: 0, depth: 0, options, reporter }
    }

    /// Parses a single expression starting at the current token.
    ///
    /// Tokens after a complete expression are left where they are. On error the
    /// diagnostic has already been reported and no tree is returned.
    pub fn parse(&mut self) -> Result<'a, Expr<'a>> {
        self.depth = 0;
        self.expression()
    }

    /// Parses `;` separated expressions until Eof. The last one may omit the
    /// `;`. After an error the parser resynchronizes and keeps going, so all
    /// malformed expressions get reported.
    pub fn parse_sequence(&mut self) -> std::result::Result<Vec<Expr<'a>>, Vec<SyntaxError<'a>>> {
        let mut exprs = Vec::new();
        let mut errors = Vec::new();

        while !self.is_at_end() {
            let result = self.parse().and_then(|expr| {
                self.end_of_expression()?;
                Ok(expr)
            });

            match result {
                Ok(expr) => exprs.push(expr),
                Err(e) => {
                    log::trace!("Hit error: {:?}, syncing...", e);
                    self.synchronize();
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(exprs)
        } else {
            Err(errors)
        }
    }

    /// Discards tokens until just after a `;` or right before a token that
    /// starts a statement. Always moves past the current token unless at Eof.
    pub fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().ty() == Semicolon {
                return;
            }

            match self.peek().ty() {
                Class | Fun | Var | For | If | While | Print | Return => return,
                _ => {}
            }

            log::trace!("Syncing... skipping {:?}", self.peek().lexeme());
            self.advance();
        }
    }

    fn end_of_expression(&mut self) -> Result<'a, ()> {
        if !self.is_at_end() {
            self.consume(Semicolon, SyntaxErrorType::ExpectedSemicolon)?;
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<'a, Expr<'a>> {
        self.nested(Self::equality)
    }

    fn equality(&mut self) -> Result<'a, Expr<'a>> {
        let mut expr = self.comparison()?;

        while self.match_any(&[BangEqual, EqualEqual]) {
            let operator = self.previous().clone();
            let right = Box::new(self.comparison()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<'a, Expr<'a>> {
        let mut expr = self.term()?;

        while self.match_any(&[Greater, GreaterEqual, Less, LessEqual]) {
            let operator = self.previous().clone();
            let right = Box::new(self.term()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<'a, Expr<'a>> {
        let mut expr = self.factor()?;

        while self.match_any(&[Minus, Plus]) {
            let operator = self.previous().clone();
            let right = Box::new(self.factor()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<'a, Expr<'a>> {
        let mut expr = self.unary()?;

        while self.match_any(&[Slash, Star]) {
            let operator = self.previous().clone();
            let right = Box::new(self.unary()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<'a, Expr<'a>> {
        if self.match_any(&[Bang, Minus]) {
            let operator = self.previous().clone();
            let right = Box::new(self.nested(Self::unary)?);
            return Ok(Expr::Unary { operator, right });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<'a, Expr<'a>> {
        let token = self.peek().clone();
        log::trace!("Parsing primary: {:?}", token.lexeme());

        let expr = match token.ty() {
            False => Expr::Literal(LiteralValue::Boolean(false)),
            True => Expr::Literal(LiteralValue::Boolean(true)),
            Nil => Expr::Literal(LiteralValue::Nil),
            Number | Str => Expr::Literal(token.literal().into()),
            LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(RightParen, SyntaxErrorType::ExpectedRightParen)?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => return Err(self.error(token, SyntaxErrorType::ExpectedExpression)),
        };

        self.advance();
        Ok(expr)
    }

    /// Runs `rule` one nesting level deeper, failing once `max_depth` is reached.
    fn nested(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<'a, Expr<'a>>,
    ) -> Result<'a, Expr<'a>> {
        if self.options.max_depth.map_or(false, |max| self.depth >= max) {
            let token = self.peek().clone();
            return Err(self.error(token, SyntaxErrorType::TooDeeplyNested));
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn error(&mut self, token: Token<'a>, error: SyntaxErrorType) -> SyntaxError<'a> {
        log::debug!(
            "Syntax error at {}:{} ({:?}): {}",
            token.line(),
            token.col(),
            token.lexeme(),
            error
        );
        self.reporter.report(&token, &error.to_string());
        SyntaxError { error, token }
    }
}

// Helpers
impl<'p, 'a> Parser<'p, 'a> {
    pub fn peek(&self) -> &Token<'a> {
        &self.tokens[self.current]
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().ty() == Eof
    }

    fn previous(&self) -> &Token<'a> {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn check(&self, ty: TokenType) -> bool {
        !self.is_at_end() && self.peek().ty() == ty
    }

    fn match_any(&mut self, types: &[TokenType]) -> bool {
        if types.iter().any(|&ty| self.check(ty)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, ty: TokenType, error: SyntaxErrorType) -> Result<'a, Token<'a>> {
        if self.check(ty) {
            self.advance();
            return Ok(self.previous().clone());
        }
        let token = self.peek().clone();
        Err(self.error(token, error))
    }
}

/// Parses one expression from `tokens` with a fresh parser.
pub fn parse<'a>(tokens: &[Token<'a>], reporter: &mut dyn Reporter) -> Result<'a, Expr<'a>> {
    Parser::new(tokens, reporter).parse()
}

/// Scans and parses `source` as a sequence of expressions, collecting every
/// scan or syntax error into [`Diagnostics`].
pub fn parse_source(
    source: &str,
    options: ParserOptions,
) -> std::result::Result<Vec<Expr<'_>>, Diagnostics> {
    let tokens = Scanner::new(source).scan_tokens()?;

    let mut diagnostics = Diagnostics::default();
    let result = Parser::with_options(&tokens, &mut diagnostics, options).parse_sequence();

    match result {
        Ok(exprs) => Ok(exprs),
        Err(errors) => {
            debug_assert_eq!(errors.len(), diagnostics.len());
            Err(diagnostics)
        }
    }
}
