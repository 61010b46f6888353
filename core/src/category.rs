//! Register categories.
//!
//! Every non-void value type lives in one of three physical storage
//! classes. Types sharing a category share the register's storage, which is
//! what lets one bytecode register be reinterpreted instruction by
//! instruction.

use std::fmt;

use crate::error::{RegError, Result};
use crate::types::{IrType, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegCategory {
    /// 32-bit or narrower numerics (boolean, byte, char, short, int, float).
    Narrow,
    /// 64-bit numerics (long, double).
    Wide,
    /// Object references.
    Reference,
}

impl RegCategory {
    pub const ALL: [RegCategory; 3] = [RegCategory::Narrow, RegCategory::Wide, RegCategory::Reference];

    /// Classify a value type. Void has no category.
    #[inline]
    pub fn of(ty: ValueType) -> Result<Self> {
        match ty {
            ValueType::Boolean
            | ValueType::Byte
            | ValueType::Char
            | ValueType::Short
            | ValueType::Int
            | ValueType::Float => Ok(RegCategory::Narrow),
            ValueType::Long | ValueType::Double => Ok(RegCategory::Wide),
            ValueType::Object => Ok(RegCategory::Reference),
            ValueType::Void => Err(RegError::VoidType { op: "classify" }),
        }
    }

    /// The type every storage location of this category is declared with.
    pub fn equiv_size_type(self) -> IrType {
        match self {
            RegCategory::Narrow => IrType::I32,
            RegCategory::Wide => IrType::I64,
            RegCategory::Reference => IrType::Ref,
        }
    }

    /// Single character prepended to register names in diagnostics.
    pub fn name_prefix(self) -> char {
        match self {
            RegCategory::Narrow => 'r',
            RegCategory::Wide => 'w',
            RegCategory::Reference => 'p',
        }
    }

    /// Dense index for per-category tables.
    pub fn index(self) -> usize {
        match self {
            RegCategory::Narrow => 0,
            RegCategory::Wide => 1,
            RegCategory::Reference => 2,
        }
    }
}

impl fmt::Display for RegCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegCategory::Narrow => "narrow",
            RegCategory::Wide => "wide",
            RegCategory::Reference => "reference",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_classification() {
        assert_eq!(RegCategory::of(ValueType::Boolean), Ok(RegCategory::Narrow));
        assert_eq!(RegCategory::of(ValueType::Byte), Ok(RegCategory::Narrow));
        assert_eq!(RegCategory::of(ValueType::Char), Ok(RegCategory::Narrow));
        assert_eq!(RegCategory::of(ValueType::Short), Ok(RegCategory::Narrow));
        assert_eq!(RegCategory::of(ValueType::Int), Ok(RegCategory::Narrow));
        assert_eq!(RegCategory::of(ValueType::Float), Ok(RegCategory::Narrow));
        assert_eq!(RegCategory::of(ValueType::Long), Ok(RegCategory::Wide));
        assert_eq!(RegCategory::of(ValueType::Double), Ok(RegCategory::Wide));
        assert_eq!(RegCategory::of(ValueType::Object), Ok(RegCategory::Reference));
    }

    #[test]
    fn test_void_is_rejected() {
        assert_eq!(
            RegCategory::of(ValueType::Void),
            Err(RegError::VoidType { op: "classify" })
        );
    }

    #[test]
    fn test_wide_types_are_wide_category() {
        for ty in ValueType::NON_VOID {
            let category = RegCategory::of(ty).unwrap();
            assert_eq!(ty.is_wide(), category == RegCategory::Wide, "{ty}");
        }
    }

    #[test]
    fn test_equiv_size_types() {
        assert_eq!(RegCategory::Narrow.equiv_size_type(), IrType::I32);
        assert_eq!(RegCategory::Wide.equiv_size_type(), IrType::I64);
        assert_eq!(RegCategory::Reference.equiv_size_type(), IrType::Ref);
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes: HashSet<char> = RegCategory::ALL.iter().map(|c| c.name_prefix()).collect();
        assert_eq!(prefixes.len(), 3);
        assert_eq!(RegCategory::Narrow.name_prefix(), 'r');
        assert_eq!(RegCategory::Wide.name_prefix(), 'w');
        assert_eq!(RegCategory::Reference.name_prefix(), 'p');
    }

    #[test]
    fn test_indices_are_dense() {
        for (i, category) in RegCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }
}
