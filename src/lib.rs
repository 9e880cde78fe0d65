use std::borrow::Cow;
use std::path::PathBuf;
use thiserror::Error;

pub mod codegen;
pub mod compiler;
pub mod lexer;
pub mod symbol_table;
pub mod units;

pub use compiler::{compile, compile_source, Compiler};

#[derive(Debug, Error)]
pub enum JackcError {
    #[error("line {line}: string literal is not terminated")]
    UnterminatedString { line: usize },
    #[error("line {line}: block comment is not terminated")]
    UnterminatedComment { line: usize },
    #[error("line {line}: unexpected character {found:?}")]
    UnexpectedChar { line: usize, found: char },
    #[error("line {line}: malformed token `{lexeme}`")]
    MalformedToken { line: usize, lexeme: String },
    #[error("line {line}: integer constant {lexeme} is out of range")]
    IntegerOutOfRange { line: usize, lexeme: String },
    #[error("line {line}: string literal {reason}")]
    InvalidString { line: usize, reason: &'static str },
    #[error("line {line}: expected {expected}, found `{found}`")]
    UnexpectedToken {
        line: usize,
        expected: Cow<'static, str>,
        found: String,
    },
    #[error("expected {expected}, but reached end of input")]
    UnexpectedEof { expected: Cow<'static, str> },
    #[error("line {line}: `{name}` is not a variable in scope")]
    UndefinedVariable { line: usize, name: String },
    #[error("`{name}` is already defined in this scope")]
    DuplicateSymbol { name: String },
    #[error("too many {what}")]
    TooMany { what: &'static str },
    #[error("no .jack source found at {}", .0.display())]
    NoSources(PathBuf),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    FromUtf8Error(#[from] std::string::FromUtf8Error),
}

impl JackcError {
    /// True for errors raised while splitting the source into tokens.
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            JackcError::UnterminatedString { .. }
                | JackcError::UnterminatedComment { .. }
                | JackcError::UnexpectedChar { .. }
                | JackcError::MalformedToken { .. }
                | JackcError::IntegerOutOfRange { .. }
                | JackcError::InvalidString { .. }
        )
    }
}

pub(crate) fn escape_xml<'a>(s: &'a str) -> Cow<'a, str> {
    if s.contains(|c| c == '<' || c == '>' || c == '&' || c == '"') {
        s.chars()
            .fold(String::new(), |mut acc, x| {
                match x {
                    '>' => acc.push_str("&gt;"),
                    '<' => acc.push_str("&lt;"),
                    '&' => acc.push_str("&amp;"),
                    '"' => acc.push_str("&quot;"),
                    c => acc.push(c),
                }
                acc
            })
            .into()
    } else {
        s.into()
    }
}

#[test]
fn test_escape_xml() {
    assert_eq!(escape_xml("a < b"), "a &lt; b");
    assert_eq!(escape_xml("\"&\""), "&quot;&amp;&quot;");
    assert!(matches!(escape_xml("plain"), Cow::Borrowed("plain")));
}
