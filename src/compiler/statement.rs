use super::Compiler;
use crate::codegen::{ArithmeticKind, Segment};
use crate::lexer::KeywordKind;
use crate::JackcError;
use std::io::{Read, Write};

impl<R: Read, W: Write> Compiler<R, W> {
    /// Compiles statements up to, not including, the closing `}`.
    pub(super) fn compile_statements(&mut self) -> Result<(), JackcError> {
        loop {
            match self.keyword() {
                Some(KeywordKind::Let) => self.compile_let()?,
                Some(KeywordKind::Do) => self.compile_do()?,
                Some(KeywordKind::If) => self.compile_if()?,
                Some(KeywordKind::While) => self.compile_while()?,
                Some(KeywordKind::Return) => self.compile_return()?,
                _ if self.is_symbol(b'}') => return Ok(()),
                _ => return Err(self.unexpected("a statement or `}`")),
            }
        }
    }

    fn compile_let(&mut self) -> Result<(), JackcError> {
        self.advance()?;
        let line = self.line();
        let name = self.expect_identifier("variable name")?;
        let (segment, index) = self.resolve(&name, line)?;

        if self.is_symbol(b'[') {
            self.advance()?;
            self.writer.write_push(segment, index)?;
            self.compile_expression()?;
            self.expect_symbol(b']')?;
            self.writer.write_arithmetic(ArithmeticKind::Add)?;

            self.expect_symbol(b'=')?;
            self.compile_expression()?;
            self.expect_symbol(b';')?;

            // the right-hand side may itself have moved pointer 1
            self.writer.write_pop(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            self.expect_symbol(b'=')?;
            self.compile_expression()?;
            self.expect_symbol(b';')?;
            self.writer.write_pop(segment, index)?;
        }

        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), JackcError> {
        self.advance()?;
        let line = self.line();
        let name = self.expect_identifier("subroutine name")?;
        self.compile_subroutine_call(name, line)?;
        self.expect_symbol(b';')?;
        self.writer.write_pop(Segment::Temp, 0)?;
        Ok(())
    }

    fn compile_if(&mut self) -> Result<(), JackcError> {
        self.advance()?;
        let i = self.next_label_index();
        let else_label = format!("IF_ELSE{}", i);
        let end_label = format!("IF_END{}", i);

        self.expect_symbol(b'(')?;
        self.compile_expression()?;
        self.expect_symbol(b')')?;
        self.writer.write_arithmetic(ArithmeticKind::Not)?;
        self.writer.write_if(&else_label)?;

        self.compile_block()?;
        self.writer.write_goto(&end_label)?;
        self.writer.write_label(&else_label)?;

        if self.is_keyword(KeywordKind::Else) {
            self.advance()?;
            self.compile_block()?;
        }
        self.writer.write_label(&end_label)?;
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), JackcError> {
        self.advance()?;
        let i = self.next_label_index();
        let top_label = format!("WHILE_TOP{}", i);
        let exit_label = format!("WHILE_EXIT{}", i);

        self.writer.write_label(&top_label)?;
        self.expect_symbol(b'(')?;
        self.compile_expression()?;
        self.expect_symbol(b')')?;
        self.writer.write_arithmetic(ArithmeticKind::Not)?;
        self.writer.write_if(&exit_label)?;

        self.compile_block()?;
        self.writer.write_goto(&top_label)?;
        self.writer.write_label(&exit_label)?;
        Ok(())
    }

    fn compile_return(&mut self) -> Result<(), JackcError> {
        self.advance()?;
        if self.is_symbol(b';') {
            self.writer.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.expect_symbol(b';')?;
        self.writer.write_return()?;
        Ok(())
    }

    // '{' statements '}'
    fn compile_block(&mut self) -> Result<(), JackcError> {
        self.expect_symbol(b'{')?;
        self.compile_statements()?;
        self.expect_symbol(b'}')
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::tests::body;
    use crate::{compile_source, JackcError};
    use std::collections::HashSet;

    #[test]
    fn test_let_array_element() {
        assert_eq!(
            body("var Array a; var int i;", "let a[i] = 5;"),
            "push local 0\n\
             push local 1\n\
             add\n\
             push constant 5\n\
             pop temp 0\n\
             pop pointer 1\n\
             push temp 0\n\
             pop that 0"
        );
    }

    #[test]
    fn test_let_array_from_array() {
        assert_eq!(
            body("var Array a, b;", "let a[1] = b[2];"),
            "push local 0\n\
             push constant 1\n\
             add\n\
             push local 1\n\
             push constant 2\n\
             add\n\
             pop pointer 1\n\
             push that 0\n\
             pop temp 0\n\
             pop pointer 1\n\
             push temp 0\n\
             pop that 0"
        );
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            body(
                "var int x;",
                "if (x) { let x = 1; } else { let x = 2; }"
            ),
            "push local 0\n\
             not\n\
             if-goto IF_ELSE0\n\
             push constant 1\n\
             pop local 0\n\
             goto IF_END0\n\
             label IF_ELSE0\n\
             push constant 2\n\
             pop local 0\n\
             label IF_END0"
        );
    }

    #[test]
    fn test_if_without_else() {
        assert_eq!(
            body("var int x;", "if (x) { }"),
            "push local 0\n\
             not\n\
             if-goto IF_ELSE0\n\
             goto IF_END0\n\
             label IF_ELSE0\n\
             label IF_END0"
        );
    }

    #[test]
    fn test_while() {
        assert_eq!(
            body("var int i;", "while (i < 3) { let i = i + 1; }"),
            "label WHILE_TOP0\n\
             push local 0\n\
             push constant 3\n\
             lt\n\
             not\n\
             if-goto WHILE_EXIT0\n\
             push local 0\n\
             push constant 1\n\
             add\n\
             pop local 0\n\
             goto WHILE_TOP0\n\
             label WHILE_EXIT0"
        );
    }

    #[test]
    fn test_labels_unique() {
        let src = "class Main {
            function void f() {
                var int i;
                while (i) { if (i) { while (i) { } } else { if (i) { } } }
                return;
            }
            function void g() {
                if (1) { } while (0) { }
                return;
            }
        }";
        let out = compile_source(src).unwrap();
        let labels = out
            .lines()
            .filter(|l| l.starts_with("label "))
            .collect::<Vec<_>>();
        let unique = labels.iter().collect::<HashSet<_>>();
        assert_eq!(labels.len(), 12);
        assert_eq!(unique.len(), labels.len());
    }

    #[test]
    fn test_do_discards_result() {
        assert_eq!(
            body("", "do Output.printInt(7);"),
            "push constant 7\n\
             call Output.printInt 1\n\
             pop temp 0"
        );
    }

    #[test]
    fn test_return_value() {
        let out = compile_source("class M { function int f() { return 1 + 2; } }").unwrap();
        assert_eq!(
            out,
            "function M.f 0\npush constant 1\npush constant 2\nadd\nreturn\n"
        );
    }

    #[test]
    fn test_let_undefined() {
        assert!(matches!(
            compile_source("class M { function void f() { let y = 1; return; } }"),
            Err(JackcError::UndefinedVariable { ref name, .. }) if name == "y"
        ));
    }

    #[test]
    fn test_bad_statement() {
        assert!(matches!(
            compile_source("class M { function void f() { var int x; x = 1; } }"),
            Err(JackcError::UnexpectedToken { ref found, .. }) if found == "x"
        ));
    }
}
