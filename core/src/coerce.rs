//! Coercion tables between a register's storage and a type space.
//!
//! Reads load the canonical storage type and then optionally narrow and
//! reinterpret. Writes optionally reinterpret and widen, then store the
//! canonical type. Both directions are pure lookups over
//! (value type, type space).

use crate::category::RegCategory;
use crate::error::Result;
use crate::types::{IrType, TypeSpace, ValueType};

/// How a narrow value is brought back up to the 32-bit storage width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widening {
    None,
    Zero,
    Sign,
}

/// Instructions a read has to emit after the raw load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCoercion {
    /// Type of the raw load, always the category's canonical type.
    pub load: IrType,
    /// Truncate the loaded value to this width.
    pub narrow: Option<IrType>,
    /// Bit-cast the (possibly narrowed) value to this type.
    pub reinterpret: Option<IrType>,
}

/// Instructions a write has to emit before the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteCoercion {
    /// Bit-cast the incoming value to this type first.
    pub reinterpret: Option<IrType>,
    pub widen: Widening,
    /// Type of the stored value, always the category's canonical type.
    pub store: IrType,
}

pub fn read_coercion(ty: ValueType, space: TypeSpace) -> Result<ReadCoercion> {
    let load = RegCategory::of(ty)?.equiv_size_type();

    // Boolean is the only type whose width differs between accurate and
    // array space.
    let narrow = match (ty, space) {
        (_, TypeSpace::Storage | TypeSpace::Field) => None,
        (ValueType::Boolean, TypeSpace::Accurate) => Some(IrType::I1),
        (ValueType::Boolean, TypeSpace::Array) | (ValueType::Byte, _) => Some(IrType::I8),
        (ValueType::Char | ValueType::Short, _) => Some(IrType::I16),
        _ => None,
    };

    let reinterpret = match (ty, space) {
        (ValueType::Float, TypeSpace::Accurate | TypeSpace::Array) => Some(IrType::F32),
        (ValueType::Double, TypeSpace::Accurate | TypeSpace::Array) => Some(IrType::F64),
        _ => None,
    };

    Ok(ReadCoercion {
        load,
        narrow,
        reinterpret,
    })
}

pub fn write_coercion(ty: ValueType, space: TypeSpace) -> Result<WriteCoercion> {
    let store = RegCategory::of(ty)?.equiv_size_type();

    let reinterpret = match (ty, space) {
        (ValueType::Float | ValueType::Double, TypeSpace::Accurate | TypeSpace::Array) => {
            Some(store)
        }
        _ => None,
    };

    // Unsigned source types zero-extend, signed ones sign-extend.
    let widen = match (ty, space) {
        (_, TypeSpace::Storage | TypeSpace::Field) => Widening::None,
        (ValueType::Boolean | ValueType::Char, _) => Widening::Zero,
        (ValueType::Byte | ValueType::Short, _) => Widening::Sign,
        _ => Widening::None,
    };

    Ok(WriteCoercion {
        reinterpret,
        widen,
        store,
    })
}
