use std::fmt::Display;

use cursor::{Col, Line};
use derive_more::{Deref, DerefMut};
use itertools::Itertools;
use scanner::{ScanError, ScanErrors, Token, TokenType};

/// A user facing error, formatted the way Lox tooling prints them:
/// `[line 1] Error at '+': Expect expression.`
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("[line {line}] Error{}: {message}", if at.is_empty() { "".to_string() } else { format!(" at {at}") })]
pub struct Diagnostic {
    pub line: Line,
    pub col: Col,
    pub at: String,
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic pointing at `token`, or at "end" for the Eof token.
    pub fn at(token: &Token<'_>, message: impl ToString) -> Self {
        Self {
            line: token.line(),
            col: token.col(),
            at: match token.ty() {
                TokenType::Eof => "end".to_string(),
                _ => format!("'{}'", token.lexeme()),
            },
            message: message.to_string(),
        }
    }
}

impl From<ScanError> for Diagnostic {
    fn from(error: ScanError) -> Self {
        Self { line: error.line, col: error.col, at: "".to_string(), message: error.error.to_string() }
    }
}

#[derive(thiserror::Error, Debug, Default, PartialEq, Deref, DerefMut)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl From<ScanErrors> for Diagnostics {
    fn from(errors: ScanErrors) -> Self {
        Self(errors.0.into_iter().map(Diagnostic::from).collect())
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|d| d.to_string()).join("\n"))
    }
}
