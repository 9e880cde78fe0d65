use crate::codegen::Segment;
use crate::JackcError;
use log::trace;
use std::collections::HashMap;

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Type {
    Int,
    Char,
    Boolean,
    Void,
    Class(String),
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Char => write!(f, "char"),
            Type::Boolean => write!(f, "boolean"),
            Type::Void => write!(f, "void"),
            Type::Class(ref s) => write!(f, "{}", s),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub enum VarKind {
    Static,
    Field,
    Argument,
    Local,
}

impl VarKind {
    pub fn segment(&self) -> Segment {
        match self {
            VarKind::Static => Segment::Static,
            VarKind::Field => Segment::This,
            VarKind::Argument => Segment::Argument,
            VarKind::Local => Segment::Local,
        }
    }

    fn slot(&self) -> usize {
        match self {
            VarKind::Static => 0,
            VarKind::Field => 1,
            VarKind::Argument => 2,
            VarKind::Local => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub v_type: Type,
    pub kind: VarKind,
    pub index: u16,
}

/// One scope's worth of variables.
///
/// Indices are handed out per kind in definition order and never reused
/// until `reset`.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    counts: [u16; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn reset(&mut self) {
        self.symbols.clear();
        self.counts = [0; 4];
    }

    /// Adds `name` and returns the index it was given.
    pub fn define(&mut self, name: &str, v_type: Type, kind: VarKind) -> Result<u16, JackcError> {
        if self.symbols.contains_key(name) {
            return Err(JackcError::DuplicateSymbol {
                name: name.to_owned(),
            });
        }

        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] = index.checked_add(1).ok_or(JackcError::TooMany {
            what: "variables of one kind",
        })?;
        trace!("define {} {} {:?} {}", v_type, name, kind, index);
        self.symbols.insert(
            name.to_owned(),
            Symbol {
                v_type,
                kind,
                index,
            },
        );
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<VarKind> {
        self.get(name).map(|s| s.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.get(name).map(|s| &s.v_type)
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.get(name).map(|s| s.index)
    }

    pub fn var_count(&self, kind: VarKind) -> u16 {
        self.counts[kind.slot()]
    }
}
