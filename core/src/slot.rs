//! Typed register slots.
//!
//! A [`RegisterSlot`] stands for one bytecode register during the
//! translation of one method. Instructions read and write it under
//! whatever value type they need; the slot keeps one storage location per
//! register category and emits the casts that move a value between that
//! storage and the requested type space.
//!
//! # Example
//!
//! ```text
//! const/4 v0, -1        set v0 B accurate   sext i8 -> i32, store r_v0
//! int-to-short v0, v0   get v0 S accurate   load r_v0, trunc i32 -> i16
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::builder::{AliasClass, StorageAllocator};
use crate::category::RegCategory;
use crate::coerce::{Widening, read_coercion, write_coercion};
use crate::error::{RegError, Result};
use crate::types::{TypeSpace, ValueType};

pub struct RegisterSlot<B: StorageAllocator> {
    /// Diagnostic name, without category prefix
    name: String,

    /// Storage per category, indexed by `RegCategory::index`
    storage: [Option<B::Storage>; 3],

    /// Externally visible copy kept in sync on every write
    mirror: Option<B::Address>,
}

impl<B: StorageAllocator> RegisterSlot<B> {
    pub fn new(name: impl Into<String>, mirror: Option<B::Address>) -> Self {
        let name = name.into();
        debug!("New register slot {} (mirror: {:?})", name, mirror);
        Self {
            name,
            storage: [None; 3],
            mirror,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mirror(&self) -> Option<B::Address> {
        self.mirror
    }

    /// Storage already created for `category`, if any. Never allocates.
    pub fn storage(&self, category: RegCategory) -> Option<B::Storage> {
        self.storage[category.index()]
    }

    /// Categories that have storage, with their handles.
    pub fn materialized(&self) -> impl Iterator<Item = (RegCategory, B::Storage)> + '_ {
        RegCategory::ALL
            .into_iter()
            .filter_map(|category| self.storage(category).map(|s| (category, s)))
    }

    /// Read the register as `ty`, represented for `space`.
    pub fn get_value(&mut self, cx: &mut B, ty: ValueType, space: TypeSpace) -> Result<B::Value> {
        if ty == ValueType::Void {
            return Err(RegError::VoidType { op: "get_value" });
        }
        let coercion = read_coercion(ty, space)?;
        let storage = self.storage_for(cx, RegCategory::of(ty)?);

        let mut value = cx.load(storage, coercion.load, AliasClass::Register);
        if let Some(narrow) = coercion.narrow {
            value = cx.truncate(value, narrow);
        }
        if let Some(target) = coercion.reinterpret {
            value = cx.bitcast(value, target);
        }
        Ok(value)
    }

    pub fn get_value_shorty(
        &mut self,
        cx: &mut B,
        shorty: char,
        space: TypeSpace,
    ) -> Result<B::Value> {
        self.get_value(cx, ValueType::from_shorty(shorty)?, space)
    }

    /// Write `value`, given as `ty` represented for `space`, to the register
    /// and to its mirror.
    pub fn set_value(
        &mut self,
        cx: &mut B,
        ty: ValueType,
        space: TypeSpace,
        value: B::Value,
    ) -> Result<()> {
        if ty == ValueType::Void {
            return Err(RegError::VoidType { op: "set_value" });
        }
        let coercion = write_coercion(ty, space)?;

        let mut value = value;
        if let Some(target) = coercion.reinterpret {
            value = cx.bitcast(value, target);
        }
        value = match coercion.widen {
            Widening::None => value,
            Widening::Zero => cx.zero_extend(value, coercion.store),
            Widening::Sign => cx.sign_extend(value, coercion.store),
        };

        let storage = self.storage_for(cx, RegCategory::of(ty)?);
        cx.store(storage, value, AliasClass::Register);

        if let Some(mirror) = self.mirror {
            cx.store_to_address(mirror, value, coercion.store, AliasClass::ShadowFrame);
        }
        Ok(())
    }

    pub fn set_value_shorty(
        &mut self,
        cx: &mut B,
        shorty: char,
        space: TypeSpace,
        value: B::Value,
    ) -> Result<()> {
        self.set_value(cx, ValueType::from_shorty(shorty)?, space, value)
    }

    fn storage_for(&mut self, cx: &mut B, category: RegCategory) -> B::Storage {
        let slot = &mut self.storage[category.index()];
        if let Some(storage) = *slot {
            return storage;
        }
        let name = format!("{}{}", category.name_prefix(), self.name);
        let storage = cx.allocate_register(category, &name);
        trace!("Materialized {} storage {} as {:?}", category, name, storage);
        *slot = Some(storage);
        storage
    }
}

impl<B: StorageAllocator> fmt::Debug for RegisterSlot<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterSlot")
            .field("name", &self.name)
            .field("storage", &self.storage)
            .field("mirror", &self.mirror)
            .finish()
    }
}
