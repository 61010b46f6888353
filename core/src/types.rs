//! Source value types, type spaces and IR representation types.
//!
//! A bytecode register is untyped: each instruction that touches it says
//! which [`ValueType`] it expects, and in which [`TypeSpace`] the value has
//! to live at that point of use. The pair decides the [`IrType`] handed to
//! or returned from the register layer.

use std::fmt;

use crate::category::RegCategory;
use crate::error::{RegError, Result};

/// Primitive and reference kinds of the source bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Object,
}

impl ValueType {
    /// Every type a register can legally hold.
    pub const NON_VOID: [ValueType; 9] = [
        ValueType::Boolean,
        ValueType::Byte,
        ValueType::Char,
        ValueType::Short,
        ValueType::Int,
        ValueType::Long,
        ValueType::Float,
        ValueType::Double,
        ValueType::Object,
    ];

    /// Decode a shorty descriptor character (`V Z B C S I J F D L`).
    pub fn from_shorty(shorty: char) -> Result<Self> {
        match shorty {
            'V' => Ok(ValueType::Void),
            'Z' => Ok(ValueType::Boolean),
            'B' => Ok(ValueType::Byte),
            'C' => Ok(ValueType::Char),
            'S' => Ok(ValueType::Short),
            'I' => Ok(ValueType::Int),
            'J' => Ok(ValueType::Long),
            'F' => Ok(ValueType::Float),
            'D' => Ok(ValueType::Double),
            'L' => Ok(ValueType::Object),
            other => Err(RegError::UnknownShorty(other)),
        }
    }

    pub fn shorty(self) -> char {
        match self {
            ValueType::Void => 'V',
            ValueType::Boolean => 'Z',
            ValueType::Byte => 'B',
            ValueType::Char => 'C',
            ValueType::Short => 'S',
            ValueType::Int => 'I',
            ValueType::Long => 'J',
            ValueType::Float => 'F',
            ValueType::Double => 'D',
            ValueType::Object => 'L',
        }
    }

    /// Long and double occupy a register pair in the bytecode model.
    pub fn is_wide(self) -> bool {
        matches!(self, ValueType::Long | ValueType::Double)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, ValueType::Float | ValueType::Double)
    }

    /// IR type a value of this type has in `space`.
    ///
    /// Storage and field space always use the category's canonical type, so
    /// a float in storage space is its raw `i32` bits.
    pub fn ir_type(self, space: TypeSpace) -> Result<IrType> {
        match space {
            TypeSpace::Storage | TypeSpace::Field => {
                Ok(RegCategory::of(self)?.equiv_size_type())
            }
            TypeSpace::Accurate | TypeSpace::Array => match self {
                ValueType::Void => Err(RegError::VoidType { op: "ir_type" }),
                ValueType::Boolean if space == TypeSpace::Array => Ok(IrType::I8),
                ValueType::Boolean => Ok(IrType::I1),
                ValueType::Byte => Ok(IrType::I8),
                ValueType::Char | ValueType::Short => Ok(IrType::I16),
                ValueType::Int => Ok(IrType::I32),
                ValueType::Long => Ok(IrType::I64),
                ValueType::Float => Ok(IrType::F32),
                ValueType::Double => Ok(IrType::F64),
                ValueType::Object => Ok(IrType::Ref),
            },
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Void => "void",
            ValueType::Boolean => "boolean",
            ValueType::Byte => "byte",
            ValueType::Char => "char",
            ValueType::Short => "short",
            ValueType::Int => "int",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::Object => "object",
        };
        f.write_str(name)
    }
}

/// Where a value is about to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSpace {
    /// The register's own physical representation.
    Storage,
    /// Instance or static field representation. Currently identical to
    /// `Storage`, kept separate so field rules can diverge later.
    Field,
    /// Exact width implied by the value type (boolean is one bit).
    Accurate,
    /// Width of an array element (boolean is one byte).
    Array,
}

impl TypeSpace {
    pub const ALL: [TypeSpace; 4] = [
        TypeSpace::Storage,
        TypeSpace::Field,
        TypeSpace::Accurate,
        TypeSpace::Array,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "storage" | "reg" => Some(TypeSpace::Storage),
            "field" => Some(TypeSpace::Field),
            "accurate" => Some(TypeSpace::Accurate),
            "array" => Some(TypeSpace::Array),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeSpace::Storage => "storage",
            TypeSpace::Field => "field",
            TypeSpace::Accurate => "accurate",
            TypeSpace::Array => "array",
        };
        f.write_str(name)
    }
}

/// Backend-neutral IR representation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    I1,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// Opaque object reference, pointer sized.
    Ref,
}

impl IrType {
    pub fn bits(self) -> u32 {
        match self {
            IrType::I1 => 1,
            IrType::I8 => 8,
            IrType::I16 => 16,
            IrType::I32 | IrType::F32 => 32,
            IrType::I64 | IrType::F64 | IrType::Ref => 64,
        }
    }

    /// Mask selecting the low `bits()` bits of a `u64`.
    pub fn mask(self) -> u64 {
        match self.bits() {
            64 => u64::MAX,
            n => (1u64 << n) - 1,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, IrType::F32 | IrType::F64)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IrType::I1 => "i1",
            IrType::I8 => "i8",
            IrType::I16 => "i16",
            IrType::I32 => "i32",
            IrType::I64 => "i64",
            IrType::F32 => "f32",
            IrType::F64 => "f64",
            IrType::Ref => "ref",
        };
        f.write_str(name)
    }
}
