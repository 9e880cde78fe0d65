use std::io::Write;

#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        })
    }
}

#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub enum ArithmeticKind {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticKind {
    /// Binary operators that have a native VM command. `*` and `/` do not.
    pub fn from_binary_op(op: u8) -> Option<ArithmeticKind> {
        Some(match op {
            b'+' => ArithmeticKind::Add,
            b'-' => ArithmeticKind::Sub,
            b'=' => ArithmeticKind::Eq,
            b'>' => ArithmeticKind::Gt,
            b'<' => ArithmeticKind::Lt,
            b'&' => ArithmeticKind::And,
            b'|' => ArithmeticKind::Or,
            _ => return None,
        })
    }
}

impl std::fmt::Display for ArithmeticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ArithmeticKind::Add => "add",
            ArithmeticKind::Sub => "sub",
            ArithmeticKind::Neg => "neg",
            ArithmeticKind::Eq => "eq",
            ArithmeticKind::Gt => "gt",
            ArithmeticKind::Lt => "lt",
            ArithmeticKind::And => "and",
            ArithmeticKind::Or => "or",
            ArithmeticKind::Not => "not",
        })
    }
}

/// Writes VM commands, one per line, straight to the underlying sink.
pub struct VmWriter<W: Write> {
    writer: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(writer: W) -> Self {
        VmWriter { writer }
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) -> std::io::Result<()> {
        writeln!(self.writer, "push {} {}", segment, index)
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) -> std::io::Result<()> {
        writeln!(self.writer, "pop {} {}", segment, index)
    }

    pub fn write_arithmetic(&mut self, command: ArithmeticKind) -> std::io::Result<()> {
        writeln!(self.writer, "{}", command)
    }

    pub fn write_label(&mut self, label: &str) -> std::io::Result<()> {
        writeln!(self.writer, "label {}", label)
    }

    pub fn write_goto(&mut self, label: &str) -> std::io::Result<()> {
        writeln!(self.writer, "goto {}", label)
    }

    pub fn write_if(&mut self, label: &str) -> std::io::Result<()> {
        writeln!(self.writer, "if-goto {}", label)
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> std::io::Result<()> {
        writeln!(self.writer, "call {} {}", name, n_args)
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> std::io::Result<()> {
        writeln!(self.writer, "function {} {}", name, n_locals)
    }

    pub fn write_return(&mut self) -> std::io::Result<()> {
        writeln!(self.writer, "return")
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_text() -> std::io::Result<()> {
        let mut w = VmWriter::new(vec![]);
        w.write_function("Main.main", 2)?;
        w.write_push(Segment::Constant, 7)?;
        w.write_pop(Segment::That, 0)?;
        w.write_arithmetic(ArithmeticKind::Neg)?;
        w.write_label("WHILE_TOP0")?;
        w.write_if("WHILE_EXIT0")?;
        w.write_goto("WHILE_TOP0")?;
        w.write_call("Math.multiply", 2)?;
        w.write_return()?;

        assert_eq!(
            String::from_utf8(w.into_inner()).unwrap(),
            "function Main.main 2\n\
             push constant 7\n\
             pop that 0\n\
             neg\n\
             label WHILE_TOP0\n\
             if-goto WHILE_EXIT0\n\
             goto WHILE_TOP0\n\
             call Math.multiply 2\n\
             return\n"
        );
        Ok(())
    }

    #[test]
    fn test_binary_ops() {
        assert_eq!(ArithmeticKind::from_binary_op(b'<'), Some(ArithmeticKind::Lt));
        assert_eq!(ArithmeticKind::from_binary_op(b'|'), Some(ArithmeticKind::Or));
        assert_eq!(ArithmeticKind::from_binary_op(b'*'), None);
        assert_eq!(ArithmeticKind::from_binary_op(b'/'), None);
    }
}
