use super::{Compiler, ALLOC};
use crate::codegen::Segment;
use crate::lexer::KeywordKind;
use crate::symbol_table::{Type, VarKind};
use crate::JackcError;
use log::debug;
use std::io::{Read, Write};

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl<R: Read, W: Write> Compiler<R, W> {
    /// Compiles the whole unit. The class's closing `}` must be its last token.
    pub fn compile_class(&mut self) -> Result<(), JackcError> {
        self.expect_keyword(KeywordKind::Class)?;
        self.class_name = self.expect_identifier("class name")?;
        self.class_table.reset();
        debug!("compiling class {}", self.class_name);
        self.expect_symbol(b'{')?;

        while let Some(kind) = self.class_var_kind() {
            self.compile_class_var_dec(kind)?;
        }

        while let Some(kind) = self.subroutine_kind() {
            self.compile_subroutine(kind)?;
        }

        if !self.is_symbol(b'}') {
            return Err(self.unexpected("a subroutine declaration or `}`"));
        }
        self.advance()?;
        if self.token().is_some() {
            return Err(self.unexpected("end of input"));
        }

        self.writer.flush()?;
        Ok(())
    }

    fn class_var_kind(&self) -> Option<VarKind> {
        match self.keyword() {
            Some(KeywordKind::Static) => Some(VarKind::Static),
            Some(KeywordKind::Field) => Some(VarKind::Field),
            _ => None,
        }
    }

    fn subroutine_kind(&self) -> Option<SubroutineKind> {
        match self.keyword() {
            Some(KeywordKind::Constructor) => Some(SubroutineKind::Constructor),
            Some(KeywordKind::Function) => Some(SubroutineKind::Function),
            Some(KeywordKind::Method) => Some(SubroutineKind::Method),
            _ => None,
        }
    }

    // ('static' | 'field') type name (',' name)* ';'
    fn compile_class_var_dec(&mut self, kind: VarKind) -> Result<(), JackcError> {
        self.advance()?;
        let v_type = self.expect_type(false)?;

        loop {
            let name = self.expect_identifier("variable name")?;
            self.class_table.define(&name, v_type.clone(), kind)?;
            if !self.is_symbol(b',') {
                break;
            }
            self.advance()?;
        }

        self.expect_symbol(b';')
    }

    fn compile_subroutine(&mut self, kind: SubroutineKind) -> Result<(), JackcError> {
        self.advance()?;
        self.expect_type(true)?;
        let name = self.expect_identifier("subroutine name")?;
        debug!("compiling {:?} {}.{}", kind, self.class_name, name);

        self.subroutine_table.reset();
        if kind == SubroutineKind::Method {
            let receiver = Type::Class(self.class_name.clone());
            self.subroutine_table
                .define("this", receiver, VarKind::Argument)?;
        }

        self.expect_symbol(b'(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(b')')?;
        self.compile_subroutine_body(kind, &name)?;
        self.subroutine_table.reset();
        Ok(())
    }

    fn compile_parameter_list(&mut self) -> Result<(), JackcError> {
        if self.is_symbol(b')') {
            return Ok(());
        }

        loop {
            let v_type = self.expect_type(false)?;
            let name = self.expect_identifier("parameter name")?;
            self.subroutine_table
                .define(&name, v_type, VarKind::Argument)?;
            if !self.is_symbol(b',') {
                return Ok(());
            }
            self.advance()?;
        }
    }

    fn compile_subroutine_body(&mut self, kind: SubroutineKind, name: &str) -> Result<(), JackcError> {
        self.expect_symbol(b'{')?;
        while self.is_keyword(KeywordKind::Var) {
            self.compile_var_dec()?;
        }

        let n_locals = self.subroutine_table.var_count(VarKind::Local);
        self.writer
            .write_function(&format!("{}.{}", self.class_name, name), n_locals)?;

        match kind {
            SubroutineKind::Constructor => {
                let size = self.class_table.var_count(VarKind::Field);
                self.writer.write_push(Segment::Constant, size)?;
                self.writer.write_call(ALLOC, 1)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => (),
        }

        self.compile_statements()?;
        self.expect_symbol(b'}')
    }

    // 'var' type name (',' name)* ';'
    fn compile_var_dec(&mut self) -> Result<(), JackcError> {
        self.advance()?;
        let v_type = self.expect_type(false)?;
        let mut name = self.expect_identifier("variable name")?;

        while self.is_symbol(b',') {
            self.subroutine_table
                .define(&name, v_type.clone(), VarKind::Local)?;
            self.advance()?;
            name = self.expect_identifier("variable name")?;
        }
        self.subroutine_table.define(&name, v_type, VarKind::Local)?;

        self.expect_symbol(b';')
    }
}
