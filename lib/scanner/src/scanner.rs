use std::fmt::Display;

use cursor::{Col, Cursor, Line};
use derive_more::{Deref, DerefMut};
use itertools::Itertools;

pub mod token;
pub use token::{Literal, Token, TokenType};
use TokenType::*;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ScanErrorType {
    #[error("Unexpected character.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {line}] Error: {error}")]
pub struct ScanError {
    pub error: ScanErrorType,
    pub line: Line,
    pub col: Col,
}

#[derive(thiserror::Error, Debug, Default, PartialEq, Deref, DerefMut)]
pub struct ScanErrors(pub Vec<ScanError>);

impl Display for ScanErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|e| e.to_string()).join("\n"))
    }
}

/// Turns source text into the token sequence consumed by the parser.
///
/// Scanning does not stop at the first bad character: every error is
/// collected and returned together. On success the last token is always
/// [`TokenType::Eof`].
pub struct Scanner<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<Token<'a>>,
    errors: ScanErrors,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { cursor: Cursor::new(source), tokens: Vec::new(), errors: ScanErrors::default() }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token<'a>>, ScanErrors> {
        loop {
            let start = self.cursor.clone();
            let Some(c) = self.cursor.next() else { break };
            match c {
                '(' => self.add_token(&start, LeftParen),
                ')' => self.add_token(&start, RightParen),
                '{' => self.add_token(&start, LeftBrace),
                '}' => self.add_token(&start, RightBrace),
                ',' => self.add_token(&start, Comma),
                '.' => self.add_token(&start, Dot),
                '-' => self.add_token(&start, Minus),
                '+' => self.add_token(&start, Plus),
                ';' => self.add_token(&start, Semicolon),
                '*' => self.add_token(&start, Star),

                '!' => {
                    let ty = if self.consume_if_matches('=') { BangEqual } else { Bang };
                    self.add_token(&start, ty)
                }
                '=' => {
                    let ty = if self.consume_if_matches('=') { EqualEqual } else { Equal };
                    self.add_token(&start, ty)
                }
                '<' => {
                    let ty = if self.consume_if_matches('=') { LessEqual } else { Less };
                    self.add_token(&start, ty)
                }
                '>' => {
                    let ty = if self.consume_if_matches('=') { GreaterEqual } else { Greater };
                    self.add_token(&start, ty)
                }

                '/' => {
                    if self.consume_if_matches('/') {
                        // Comment
                        while !matches!(self.cursor.peek(), Some('\n') | None) {
                            self.cursor.next();
                        }
                    } else {
                        self.add_token(&start, Slash)
                    }
                }

                '"' => self.string(&start),
                d if d.is_ascii_digit() => self.number(&start),
                c if is_identifier_start(c) => self.identifier(&start),

                ' ' | '\r' | '\t' | '\n' => (),

                c => self.error(&start, ScanErrorType::UnexpectedCharacter(c)),
            }
        }

        self.tokens.push(Token::eof(self.cursor.line(), self.cursor.col()));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    fn add_token(&mut self, start: &Cursor<'a>, ty: TokenType) {
        self.add_literal_token(start, ty, None)
    }

    fn add_literal_token(
        &mut self,
        start: &Cursor<'a>,
        ty: TokenType,
        literal: Option<Literal<'a>>,
    ) {
        let token = Token::new(ty, start.slice_until(&self.cursor), literal, start.line(), start.col());
        log::trace!("Scanned {} {:?} at {}:{}", token.ty(), token.lexeme(), token.line(), token.col());
        self.tokens.push(token);
    }

    fn error(&mut self, start: &Cursor<'a>, error: ScanErrorType) {
        log::debug!("Scan error at {}:{}: {:?}", start.line(), start.col(), error);
        self.errors.push(ScanError { error, line: start.line(), col: start.col() });
    }

    fn consume_if_matches(&mut self, expected: char) -> bool {
        match self.cursor.peek() {
            Some(c) if c == expected => {
                self.cursor.next();
                true
            }
            _ => false,
        }
    }

    fn consume_while(&mut self, f: impl Fn(char) -> bool) {
        while self.cursor.peek().map_or(false, &f) {
            self.cursor.next();
        }
    }

    fn string(&mut self, start: &Cursor<'a>) {
        loop {
            match self.cursor.next() {
                Some('"') => break,
                Some(_) => (),
                None => return self.error(start, ScanErrorType::UnterminatedString),
            }
        }

        let lexeme = start.slice_until(&self.cursor);
        let value = &lexeme[1..lexeme.len() - 1];
        self.add_literal_token(start, Str, Some(Literal::Str(value)));
    }

    fn number(&mut self, start: &Cursor<'a>) {
        self.consume_while(|c| c.is_ascii_digit());

        // Only treat the dot as a fraction separator if a digit follows it
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().map_or(false, |c| c.is_ascii_digit())
        {
            self.cursor.next();
            self.consume_while(|c| c.is_ascii_digit());
        }

        let n = start
            .slice_until(&self.cursor)
            .parse()
            .expect("digits with an optional fraction always parse as f64");
        self.add_literal_token(start, Number, Some(Literal::Number(n)));
    }

    fn identifier(&mut self, start: &Cursor<'a>) {
        self.consume_while(|c| is_identifier_start(c) || c.is_ascii_digit());

        let ty = TokenType::keyword(start.slice_until(&self.cursor)).unwrap_or(Identifier);
        self.add_token(start, ty)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scan(source: &str) -> Vec<Token> {
        Scanner::new(source).scan_tokens().unwrap()
    }

    fn types(source: &str) -> Vec<TokenType> {
        scan(source).iter().map(Token::ty).collect()
    }

    #[test]
    fn string_literals() {
        let tokens = scan("\"hello world\"");
        assert_eq!(
            tokens,
            vec![
                Token::new(
                    Str,
                    "\"hello world\"",
                    Some(Literal::Str("hello world")),
                    Line(1),
                    Col(1)
                ),
                Token::eof(Line(1), Col(14)),
            ]
        );

        let errors = Scanner::new("\"hello world").scan_tokens().unwrap_err();
        assert_eq!(
            errors,
            ScanErrors(vec![ScanError {
                error: ScanErrorType::UnterminatedString,
                line: Line(1),
                col: Col(1)
            }])
        );
    }

    #[test]
    fn multiline_string() {
        let tokens = scan("\"a\nb\" 1");
        assert_eq!(tokens[0].literal(), Some(&Literal::Str("a\nb")));
        assert_eq!((tokens[1].line(), tokens[1].col()), (Line(2), Col(4)));
    }

    #[test]
    fn two_char_tokens() {
        assert_eq!(
            types("! != = == < <= > >="),
            vec![Bang, BangEqual, Equal, EqualEqual, Less, LessEqual, Greater, GreaterEqual, Eof]
        );
    }

    #[test]
    fn single_char_tokens() {
        assert_eq!(
            types("=(){},.-+;*/!<>"),
            vec![
                Equal, LeftParen, RightParen, LeftBrace, RightBrace, Comma, Dot, Minus, Plus,
                Semicolon, Star, Slash, Bang, Less, Greater, Eof
            ]
        );
    }

    #[test]
    fn numbers() {
        let tokens = scan("123 4.5 6.");
        let literals = tokens.iter().filter_map(Token::literal).copied().collect::<Vec<_>>();
        assert_eq!(
            literals,
            vec![Literal::Number(123.0), Literal::Number(4.5), Literal::Number(6.0)]
        );
        assert_eq!(tokens.iter().map(Token::ty).collect::<Vec<_>>(), vec![
            Number, Number, Number, Dot, Eof
        ]);
    }

    #[test]
    fn number_lexemes_always_scan() {
        let tokens = scan("007 0.25 10.0.5");
        let literals = tokens.iter().filter_map(Token::literal).copied().collect::<Vec<_>>();
        assert_eq!(
            literals,
            vec![
                Literal::Number(7.0),
                Literal::Number(0.25),
                Literal::Number(10.0),
                Literal::Number(5.0)
            ]
        );
        assert_eq!(tokens[3].ty(), Dot);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            types("true false nil print var_1 classy"),
            vec![True, False, Nil, Print, Identifier, Identifier, Eof]
        );
    }

    #[test]
    fn comments() {
        let tokens = scan("1 // comment\n2");
        assert_eq!(tokens.len(), 3);
        assert_eq!((tokens[0].lexeme(), tokens[0].line()), ("1", Line(1)));
        assert_eq!((tokens[1].lexeme(), tokens[1].line()), ("2", Line(2)));
        assert_eq!((tokens[2].ty(), tokens[2].line(), tokens[2].col()), (Eof, Line(2), Col(2)));
    }

    #[test]
    fn collects_all_errors() {
        let errors = Scanner::new("1 @ 2\n# 3").scan_tokens().unwrap_err();
        assert_eq!(
            errors.to_string(),
            "[line 1] Error: Unexpected character.\n[line 2] Error: Unexpected character."
        );
        assert_eq!(errors[1].col, Col(1));
        assert_eq!(errors[0].error, ScanErrorType::UnexpectedCharacter('@'));
    }

    #[test]
    fn token_type_names() {
        assert_eq!(BangEqual.to_string(), "BANG_EQUAL");
        assert_eq!(Str.to_string(), "STRING");
        assert_eq!(Eof.to_string(), "EOF");
    }
}
