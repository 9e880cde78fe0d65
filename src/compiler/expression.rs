//! Expressions, terms and subroutine calls.
//!
//! `true` is emitted as `push constant 1`, `not`, so it is 0xFFFE and not
//! all ones. Code relying on `~true` being false will misbehave; this
//! sequence is the documented output and must not be changed to `neg`.
use super::{Compiler, DIVIDE, MULTIPLY, STRING_APPEND, STRING_NEW};
use crate::codegen::{ArithmeticKind, Segment};
use crate::lexer::{KeywordKind, SymbolKind, Token};
use crate::JackcError;
use log::trace;
use std::io::{Read, Write};

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
enum BinaryOp {
    Native(ArithmeticKind),
    Multiply,
    Divide,
}

impl<R: Read, W: Write> Compiler<R, W> {
    /// term (op term)*, strictly left to right. All operators share one
    /// precedence level.
    pub(super) fn compile_expression(&mut self) -> Result<(), JackcError> {
        self.compile_term()?;

        while let Some(op) = self.binary_op() {
            self.advance()?;
            self.compile_term()?;
            match op {
                BinaryOp::Native(command) => self.writer.write_arithmetic(command)?,
                BinaryOp::Multiply => self.writer.write_call(MULTIPLY, 2)?,
                BinaryOp::Divide => self.writer.write_call(DIVIDE, 2)?,
            }
        }

        Ok(())
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        match self.token() {
            Some(Token::Symbol(SymbolKind(b'*'))) => Some(BinaryOp::Multiply),
            Some(Token::Symbol(SymbolKind(b'/'))) => Some(BinaryOp::Divide),
            Some(Token::Symbol(SymbolKind(b))) => {
                ArithmeticKind::from_binary_op(*b).map(BinaryOp::Native)
            }
            _ => None,
        }
    }

    fn compile_term(&mut self) -> Result<(), JackcError> {
        let line = self.line();
        match self.token() {
            Some(Token::IntegerLiteral(n)) => {
                let n = *n;
                self.advance()?;
                self.writer.write_push(Segment::Constant, n)?;
            }
            Some(Token::StringLiteral(s)) => {
                let s = s.clone();
                self.advance()?;
                self.compile_string(&s)?;
            }
            Some(Token::Keyword(k)) => {
                let k = *k;
                self.compile_keyword_constant(k)?;
            }
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance()?;
                self.compile_identifier_term(name, line)?;
            }
            Some(Token::Symbol(SymbolKind(b'('))) => {
                self.advance()?;
                self.compile_expression()?;
                self.expect_symbol(b')')?;
            }
            Some(Token::Symbol(SymbolKind(b'-'))) => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic(ArithmeticKind::Neg)?;
            }
            Some(Token::Symbol(SymbolKind(b'~'))) => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic(ArithmeticKind::Not)?;
            }
            _ => return Err(self.unexpected("a term")),
        }

        Ok(())
    }

    fn compile_string(&mut self, s: &str) -> Result<(), JackcError> {
        // The scanner only lets through ASCII literals of at most MAX_INTEGER bytes.
        let bytes = s.as_bytes();
        let len = u16::try_from(bytes.len()).map_err(|_| JackcError::TooMany {
            what: "characters in a string literal",
        })?;
        self.writer.write_push(Segment::Constant, len)?;
        self.writer.write_call(STRING_NEW, 1)?;

        for byte in bytes.iter() {
            self.writer.write_push(Segment::Constant, u16::from(*byte))?;
            self.writer.write_call(STRING_APPEND, 2)?;
        }

        Ok(())
    }

    fn compile_keyword_constant(&mut self, keyword: KeywordKind) -> Result<(), JackcError> {
        match keyword {
            KeywordKind::True => {
                self.writer.write_push(Segment::Constant, 1)?;
                self.writer.write_arithmetic(ArithmeticKind::Not)?;
            }
            KeywordKind::False | KeywordKind::Null => {
                self.writer.write_push(Segment::Constant, 0)?;
            }
            KeywordKind::This => {
                self.writer.write_push(Segment::Pointer, 0)?;
            }
            _ => return Err(self.unexpected("a term")),
        }
        self.advance()
    }

    /// The identifier has been consumed; the next token decides what it names.
    fn compile_identifier_term(&mut self, name: String, line: usize) -> Result<(), JackcError> {
        if self.is_symbol(b'.') || self.is_symbol(b'(') {
            return self.compile_subroutine_call(name, line);
        }

        let (segment, index) = self.resolve(&name, line)?;
        self.writer.write_push(segment, index)?;

        if self.is_symbol(b'[') {
            self.advance()?;
            self.compile_expression()?;
            self.expect_symbol(b']')?;
            self.writer.write_arithmetic(ArithmeticKind::Add)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::That, 0)?;
        }

        Ok(())
    }

    /// Compiles `name(args)` or `name.sub(args)` with `name` already consumed.
    ///
    /// A `name` bound to a variable is a method call on that object. Any other
    /// `name` is taken to be a class and is left for the VM loader to resolve.
    pub(super) fn compile_subroutine_call(
        &mut self,
        name: String,
        line: usize,
    ) -> Result<(), JackcError> {
        if self.is_symbol(b'(') {
            self.writer.write_push(Segment::Pointer, 0)?;
            let n_args = self.compile_expression_list()?;
            let target = format!("{}.{}", self.class_name, name);
            self.writer.write_call(&target, count_arguments(n_args, 1)?)?;
            return Ok(());
        }

        if !self.is_symbol(b'.') {
            return Err(self.unexpected("`(` or `.`"));
        }
        self.advance()?;
        let subroutine = self.expect_identifier("subroutine name")?;

        let receiver = self
            .lookup(&name)
            .map(|s| (s.kind.segment(), s.index, s.v_type.to_string()));
        let (class, implicit) = match receiver {
            Some((segment, index, class)) => {
                self.writer.write_push(segment, index)?;
                (class, 1)
            }
            None => {
                trace!("line {}: {} is not a variable, calling it as a class", line, name);
                (name, 0)
            }
        };

        let n_args = self.compile_expression_list()?;
        self.writer.write_call(
            &format!("{}.{}", class, subroutine),
            count_arguments(n_args, implicit)?,
        )?;
        Ok(())
    }

    // '(' (expression (',' expression)*)? ')'
    fn compile_expression_list(&mut self) -> Result<u16, JackcError> {
        self.expect_symbol(b'(')?;
        let mut count = 0;

        if !self.is_symbol(b')') {
            loop {
                self.compile_expression()?;
                count = count_arguments(count, 1)?;
                if !self.is_symbol(b',') {
                    break;
                }
                self.advance()?;
            }
        }

        self.expect_symbol(b')')?;
        Ok(count)
    }
}

fn count_arguments(n: u16, more: u16) -> Result<u16, JackcError> {
    n.checked_add(more)
        .ok_or(JackcError::TooMany { what: "arguments" })
}

#[cfg(test)]
mod tests {
    use crate::compiler::tests::body;
    use crate::{compile_source, JackcError};

    #[test]
    fn test_left_to_right() {
        assert_eq!(
            body("var int a, b, c;", "let a = a * b + c;"),
            "push local 0\n\
             push local 1\n\
             call Math.multiply 2\n\
             push local 2\n\
             add\n\
             pop local 0"
        );
        assert_eq!(
            body("var int a, b, c;", "let a = a + b * c;"),
            "push local 0\n\
             push local 1\n\
             add\n\
             push local 2\n\
             call Math.multiply 2\n\
             pop local 0"
        );
    }

    #[test]
    fn test_parentheses_and_division() {
        assert_eq!(
            body("var int a, b;", "let a = a / (b - 1);"),
            "push local 0\n\
             push local 1\n\
             push constant 1\n\
             sub\n\
             call Math.divide 2\n\
             pop local 0"
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            body("var int a; var boolean b;", "let a = -a - 1; let b = ~(a = 0);"),
            "push local 0\n\
             neg\n\
             push constant 1\n\
             sub\n\
             pop local 0\n\
             push local 0\n\
             push constant 0\n\
             eq\n\
             not\n\
             pop local 1"
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            body("var boolean r; var int x;", "let r = (x > 1) & (x < 9) | false;"),
            "push local 1\n\
             push constant 1\n\
             gt\n\
             push local 1\n\
             push constant 9\n\
             lt\n\
             and\n\
             push constant 0\n\
             or\n\
             pop local 0"
        );
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(
            body("var String s;", "let s = \"Hi\";"),
            "push constant 2\n\
             call String.new 1\n\
             push constant 72\n\
             call String.appendChar 2\n\
             push constant 105\n\
             call String.appendChar 2\n\
             pop local 0"
        );
    }

    #[test]
    fn test_string_taken_verbatim() {
        assert_eq!(
            body("var String s;", r#"let s = "a\nb";"#),
            "push constant 4\n\
             call String.new 1\n\
             push constant 97\n\
             call String.appendChar 2\n\
             push constant 92\n\
             call String.appendChar 2\n\
             push constant 110\n\
             call String.appendChar 2\n\
             push constant 98\n\
             call String.appendChar 2\n\
             pop local 0"
        );
    }

    #[test]
    fn test_invalid_string_literal() {
        let long = "x".repeat(40000);
        let src = format!("class M {{ function void f() {{ do M.g(\"{}\"); return; }} }}", long);
        assert!(matches!(
            compile_source(&src),
            Err(JackcError::InvalidString { line: 1, .. })
        ));
        assert!(matches!(
            compile_source("class M { function void f() { do M.g(\"\u{e9}\"); return; } }"),
            Err(JackcError::InvalidString { .. })
        ));
    }

    #[test]
    fn test_too_many_arguments() {
        let args = vec!["1"; 65536].join(",");
        let src = format!("class M {{ function void f() {{ do M.g({}); return; }} }}", args);
        assert!(matches!(
            compile_source(&src),
            Err(JackcError::TooMany { what: "arguments" })
        ));

        // the receiver pushes the count over the limit
        let args = vec!["1"; 65535].join(",");
        let src = format!("class M {{ method void f() {{ do g({}); return; }} }}", args);
        assert!(matches!(
            compile_source(&src),
            Err(JackcError::TooMany { what: "arguments" })
        ));
    }

    #[test]
    fn test_keyword_constants() {
        assert_eq!(
            body("var boolean b; var Array p;", "let b = true; let b = false; let p = null;"),
            "push constant 1\n\
             not\n\
             pop local 0\n\
             push constant 0\n\
             pop local 0\n\
             push constant 0\n\
             pop local 1"
        );
    }

    #[test]
    fn test_array_read() {
        assert_eq!(
            body("var Array a; var int x;", "let x = a[x + 1];"),
            "push local 0\n\
             push local 1\n\
             push constant 1\n\
             add\n\
             add\n\
             pop pointer 1\n\
             push that 0\n\
             pop local 1"
        );
    }

    #[test]
    fn test_calls() {
        let src = "class Game {
            field Ball ball;
            method void run(int n) {
                var Ball other;
                do ball.move(n, 2);
                do other.reset();
                do step(n);
                do Output.println();
                return;
            }
        }";
        assert_eq!(
            compile_source(src).unwrap(),
            "function Game.run 1\n\
             push argument 0\n\
             pop pointer 0\n\
             push this 0\n\
             push argument 1\n\
             push constant 2\n\
             call Ball.move 3\n\
             pop temp 0\n\
             push local 0\n\
             call Ball.reset 1\n\
             pop temp 0\n\
             push pointer 0\n\
             push argument 1\n\
             call Game.step 2\n\
             pop temp 0\n\
             call Output.println 0\n\
             pop temp 0\n\
             push constant 0\n\
             return\n"
        );
    }

    #[test]
    fn test_call_in_expression() {
        assert_eq!(
            body("var int x;", "let x = Math.max(x, 3) + 1;"),
            "push local 0\n\
             push constant 3\n\
             call Math.max 2\n\
             push constant 1\n\
             add\n\
             pop local 0"
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert!(matches!(
            compile_source("class M { function int f() { return nope; } }"),
            Err(JackcError::UndefinedVariable { line: 1, ref name }) if name == "nope"
        ));
    }

    #[test]
    fn test_bad_term() {
        assert!(compile_source("class M { function int f() { return ; ; } }").is_err());
        assert!(matches!(
            compile_source("class M { function int f() { return *2; } }"),
            Err(JackcError::UnexpectedToken { ref expected, .. }) if expected == "a term"
        ));
        assert!(matches!(
            compile_source("class M { function int f() { return let; } }"),
            Err(JackcError::UnexpectedToken { .. })
        ));
    }
}
