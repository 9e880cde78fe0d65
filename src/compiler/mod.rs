//! Single-pass Jack to VM compiler.
//!
//! Every `compile_*` method starts on the first token of its construct and
//! returns with the scanner on the first token past it. VM code is written
//! as soon as each construct is recognized.
use crate::codegen::{Segment, VmWriter};
use crate::lexer::{KeywordKind, Scanner, SymbolKind, Token};
use crate::symbol_table::{Symbol, SymbolTable, Type};
use crate::JackcError;
use std::borrow::Cow;
use std::io::{Read, Write};

mod class;
mod expression;
mod statement;

const ALLOC: &str = "Memory.alloc";
const MULTIPLY: &str = "Math.multiply";
const DIVIDE: &str = "Math.divide";
const STRING_NEW: &str = "String.new";
const STRING_APPEND: &str = "String.appendChar";

pub struct Compiler<R: Read, W: Write> {
    scanner: Scanner<R>,
    writer: VmWriter<W>,
    exhausted: bool,
    class_table: SymbolTable,
    subroutine_table: SymbolTable,
    class_name: String,
    label_index: usize,
}

impl<R: Read, W: Write> Compiler<R, W> {
    /// Creates a compiler for one unit and reads its first token.
    pub fn new(reader: R, writer: W) -> Result<Self, JackcError> {
        let mut compiler = Compiler {
            scanner: Scanner::new(reader),
            writer: VmWriter::new(writer),
            exhausted: false,
            class_table: SymbolTable::new(),
            subroutine_table: SymbolTable::new(),
            class_name: String::new(),
            label_index: 0,
        };
        compiler.advance()?;
        Ok(compiler)
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    /// Line of the token the compiler is looking at.
    pub fn line(&self) -> usize {
        self.scanner.line()
    }

    fn advance(&mut self) -> Result<(), JackcError> {
        if self.scanner.has_more()? {
            self.scanner.advance()?;
            self.exhausted = false;
        } else {
            self.exhausted = true;
        }
        Ok(())
    }

    fn token(&self) -> Option<&Token> {
        if self.exhausted {
            None
        } else {
            self.scanner.token()
        }
    }

    fn keyword(&self) -> Option<KeywordKind> {
        match self.token() {
            Some(Token::Keyword(k)) => Some(*k),
            _ => None,
        }
    }

    fn is_keyword(&self, keyword: KeywordKind) -> bool {
        self.keyword() == Some(keyword)
    }

    fn is_symbol(&self, c: u8) -> bool {
        matches!(self.token(), Some(Token::Symbol(SymbolKind(b))) if *b == c)
    }

    fn unexpected(&self, expected: impl Into<Cow<'static, str>>) -> JackcError {
        match self.token() {
            Some(token) => JackcError::UnexpectedToken {
                line: self.scanner.line(),
                expected: expected.into(),
                found: token.to_string(),
            },
            None => JackcError::UnexpectedEof {
                expected: expected.into(),
            },
        }
    }

    fn expect_keyword(&mut self, keyword: KeywordKind) -> Result<(), JackcError> {
        if !self.is_keyword(keyword) {
            return Err(self.unexpected(format!("`{}`", keyword)));
        }
        self.advance()
    }

    fn expect_symbol(&mut self, c: u8) -> Result<(), JackcError> {
        if !self.is_symbol(c) {
            return Err(self.unexpected(format!("`{}`", c as char)));
        }
        self.advance()
    }

    fn expect_identifier(&mut self, what: &'static str) -> Result<String, JackcError> {
        let name = match self.token() {
            Some(Token::Identifier(name)) => name.clone(),
            _ => return Err(self.unexpected(what)),
        };
        self.advance()?;
        Ok(name)
    }

    /// `void` is only accepted where a subroutine return type is expected.
    fn expect_type(&mut self, allow_void: bool) -> Result<Type, JackcError> {
        let v_type = match self.token() {
            Some(Token::Keyword(KeywordKind::Int)) => Type::Int,
            Some(Token::Keyword(KeywordKind::Char)) => Type::Char,
            Some(Token::Keyword(KeywordKind::Boolean)) => Type::Boolean,
            Some(Token::Keyword(KeywordKind::Void)) if allow_void => Type::Void,
            Some(Token::Identifier(name)) => Type::Class(name.clone()),
            _ => return Err(self.unexpected("a type")),
        };
        self.advance()?;
        Ok(v_type)
    }

    fn next_label_index(&mut self) -> usize {
        let i = self.label_index;
        self.label_index += 1;
        i
    }

    /// Subroutine scope first, then class scope.
    fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_table
            .get(name)
            .or_else(|| self.class_table.get(name))
    }

    fn resolve(&self, name: &str, line: usize) -> Result<(Segment, u16), JackcError> {
        self.lookup(name)
            .map(|symbol| (symbol.kind.segment(), symbol.index))
            .ok_or_else(|| JackcError::UndefinedVariable {
                line,
                name: name.to_owned(),
            })
    }
}

/// Compiles one class read from `reader` into `writer` with a fresh compiler.
pub fn compile<R: Read, W: Write>(reader: R, writer: W) -> Result<W, JackcError> {
    let mut compiler = Compiler::new(reader, writer)?;
    compiler.compile_class()?;
    Ok(compiler.into_writer())
}

pub fn compile_source(source: &str) -> Result<String, JackcError> {
    let out = compile(source.as_bytes(), vec![])?;
    Ok(String::from_utf8(out)?)
}
