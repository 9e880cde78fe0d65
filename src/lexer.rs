use crate::{escape_xml, JackcError};
use std::borrow::Cow;
use std::io::{Bytes, Read};

/// Largest value the `constant` segment can hold.
pub const MAX_INTEGER: u16 = 32767;

macro_rules! gen_keyword {
    ($($keyword: ident => $text: literal),*) => {
        #[derive(Eq, PartialEq, Debug, Clone, Copy)]
        pub enum KeywordKind {
            $($keyword),*
        }

        impl KeywordKind {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(KeywordKind::$keyword => $text),*
                }
            }
        }

        impl TryFrom<&str> for KeywordKind {
            type Error = ();

            fn try_from(keyword: &str) -> Result<KeywordKind, ()> {
                match keyword {
                    $($text => Ok(KeywordKind::$keyword),)*
                    _ => Err(()),
                }
            }
        }

        impl std::fmt::Display for KeywordKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

gen_keyword! {
    Class => "class", Constructor => "constructor", Function => "function",
    Method => "method", Field => "field", Static => "static", Var => "var",
    Int => "int", Char => "char", Boolean => "boolean", Void => "void",
    True => "true", False => "false", Null => "null", This => "this",
    Let => "let", Do => "do", If => "if", Else => "else", While => "while",
    Return => "return"
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct SymbolKind(pub(crate) u8);

impl SymbolKind {
    pub fn as_char(&self) -> char {
        self.0 as char
    }
}

impl TryFrom<u8> for SymbolKind {
    type Error = ();

    fn try_from(c: u8) -> Result<SymbolKind, ()> {
        match c {
            b'{' | b'}' | b'(' | b')' | b'[' | b']' | b'.' | b',' | b';' | b'+' | b'-' | b'*'
            | b'/' | b'&' | b'|' | b'<' | b'>' | b'=' | b'~' => Ok(SymbolKind(c)),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum TokenKind {
    Keyword,
    Symbol,
    Identifier,
    IntegerConstant,
    StringConstant,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Symbol => "symbol",
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerConstant => "integerConstant",
            TokenKind::StringConstant => "stringConstant",
        })
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Token {
    Keyword(KeywordKind),
    Symbol(SymbolKind),
    IntegerLiteral(u16),
    StringLiteral(String),
    Identifier(String),
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Keyword(_) => TokenKind::Keyword,
            Token::Symbol(_) => TokenKind::Symbol,
            Token::IntegerLiteral(_) => TokenKind::IntegerConstant,
            Token::StringLiteral(_) => TokenKind::StringConstant,
            Token::Identifier(_) => TokenKind::Identifier,
        }
    }

    /// Source text of the token. String literals come back without their quotes.
    pub fn lexeme(&self) -> Cow<'_, str> {
        match self {
            Token::Keyword(keyword) => keyword.as_str().into(),
            Token::Symbol(symbol) => symbol.as_char().to_string().into(),
            Token::IntegerLiteral(n) => n.to_string().into(),
            Token::StringLiteral(s) | Token::Identifier(s) => s.as_str().into(),
        }
    }

    pub fn to_xml_element(&self) -> String {
        let kind = self.kind();
        format!("<{0}> {1} </{0}>", kind, escape_xml(&self.lexeme()))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::StringLiteral(s) => write!(f, "\"{}\"", s),
            t => f.write_str(&t.lexeme()),
        }
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\x09'..=b'\x0d')
}

/// Splits Jack source into tokens, one at a time.
///
/// The scanner only ever moves forward. `advance` buffers exactly one token,
/// which stays readable through the accessors until the next `advance`.
pub struct Scanner<T: Read> {
    bytes: Bytes<T>,
    pending: Vec<u8>,
    line: usize,
    token: Option<Token>,
    token_line: usize,
}

impl<T: Read> Scanner<T> {
    pub fn new(reader: T) -> Self {
        Scanner {
            bytes: reader.bytes(),
            pending: vec![],
            line: 1,
            token: None,
            token_line: 1,
        }
    }

    /// Line of the current token, or of the read position before the first `advance`.
    pub fn line(&self) -> usize {
        self.token_line
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn token_kind(&self) -> Option<TokenKind> {
        self.token.as_ref().map(Token::kind)
    }

    pub fn lexeme(&self) -> Option<Cow<'_, str>> {
        self.token.as_ref().map(Token::lexeme)
    }

    pub fn keyword(&self) -> Option<KeywordKind> {
        match self.token {
            Some(Token::Keyword(k)) => Some(k),
            _ => None,
        }
    }

    pub fn symbol(&self) -> Option<u8> {
        match self.token {
            Some(Token::Symbol(SymbolKind(b))) => Some(b),
            _ => None,
        }
    }

    pub fn int_val(&self) -> Option<u16> {
        match self.token {
            Some(Token::IntegerLiteral(n)) => Some(n),
            _ => None,
        }
    }

    pub fn string_val(&self) -> Option<&str> {
        match self.token {
            Some(Token::StringLiteral(ref s)) => Some(s),
            _ => None,
        }
    }

    fn read(&mut self) -> Result<Option<u8>, JackcError> {
        let b = if let Some(b) = self.pending.pop() {
            b
        } else if let Some(r) = self.bytes.next() {
            r?
        } else {
            return Ok(None);
        };
        if b == b'\n' {
            self.line += 1;
        }
        Ok(Some(b))
    }

    fn unread(&mut self, b: u8) {
        if b == b'\n' {
            self.line -= 1;
        }
        self.pending.push(b);
    }

    fn skip_block_comment(&mut self) -> Result<(), JackcError> {
        let start = self.line;
        let mut prev = 0;
        while let Some(b) = self.read()? {
            if prev == b'*' && b == b'/' {
                return Ok(());
            }
            prev = b;
        }

        Err(JackcError::UnterminatedComment { line: start })
    }

    /// Skips whitespace and comments. Reports whether a token follows.
    pub fn has_more(&mut self) -> Result<bool, JackcError> {
        while let Some(b) = self.read()? {
            match b {
                b if is_space(b) => continue,
                b'/' => match self.read()? {
                    Some(b'/') => {
                        while let Some(b) = self.read()? {
                            if b == b'\n' {
                                break;
                            }
                        }
                    }
                    Some(b'*') => self.skip_block_comment()?,
                    next => {
                        if let Some(next) = next {
                            self.unread(next);
                        }
                        self.unread(b'/');
                        return Ok(true);
                    }
                },
                b => {
                    self.unread(b);
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Consumes the next token. Calling this with no input left is an error.
    pub fn advance(&mut self) -> Result<(), JackcError> {
        if !self.has_more()? {
            self.token = None;
            return Err(JackcError::UnexpectedEof {
                expected: "a token".into(),
            });
        }
        self.token_line = self.line;

        let token = match self.read()? {
            Some(b'"') => self.read_string()?,
            Some(b) => match SymbolKind::try_from(b) {
                Ok(s) => Token::Symbol(s),
                Err(()) => self.read_word(b)?,
            },
            None => {
                return Err(JackcError::UnexpectedEof {
                    expected: "a token".into(),
                })
            }
        };
        self.token = Some(token);
        Ok(())
    }

    fn read_string(&mut self) -> Result<Token, JackcError> {
        let mut result = vec![];
        while let Some(b) = self.read()? {
            match b {
                b'"' => return Ok(Token::StringLiteral(String::from_utf8(result)?)),
                b'\n' => break,
                b if !b.is_ascii() => {
                    return Err(JackcError::InvalidString {
                        line: self.token_line,
                        reason: "contains a non-ASCII character",
                    });
                }
                _ if result.len() == usize::from(MAX_INTEGER) => {
                    return Err(JackcError::InvalidString {
                        line: self.token_line,
                        reason: "is too long",
                    });
                }
                b => result.push(b),
            }
        }

        Err(JackcError::UnterminatedString {
            line: self.token_line,
        })
    }

    fn read_word(&mut self, first: u8) -> Result<Token, JackcError> {
        let mut result = vec![first];
        while let Some(b) = self.read()? {
            if is_space(b) || SymbolKind::try_from(b).is_ok() {
                self.unread(b);
                break;
            }
            result.push(b);
        }
        let word = String::from_utf8(result)?;
        let line = self.token_line;

        if let Ok(k) = KeywordKind::try_from(word.as_str()) {
            return Ok(Token::Keyword(k));
        }

        match first {
            b'0'..=b'9' if word.bytes().all(|b| b.is_ascii_digit()) => {
                match word.parse::<u16>() {
                    Ok(n) if n <= MAX_INTEGER => Ok(Token::IntegerLiteral(n)),
                    _ => Err(JackcError::IntegerOutOfRange { line, lexeme: word }),
                }
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_'
                if word.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') =>
            {
                Ok(Token::Identifier(word))
            }
            b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                Err(JackcError::MalformedToken { line, lexeme: word })
            }
            _ => Err(JackcError::UnexpectedChar {
                line,
                found: word.chars().next().unwrap_or(first as char),
            }),
        }
    }
}

/// Writes the token stream of `reader` as an XML listing.
pub fn dump_tokens(
    reader: impl Read,
    writer: &mut impl std::io::Write,
) -> Result<(), JackcError> {
    let mut scanner = Scanner::new(reader);
    writeln!(writer, "<tokens>")?;
    while scanner.has_more()? {
        scanner.advance()?;
        if let Some(token) = scanner.token() {
            writeln!(writer, "{}", token.to_xml_element())?;
        }
    }
    writeln!(writer, "</tokens>")?;
    Ok(())
}
