//! The IR construction facility seen from the register layer.
//!
//! Register slots never build IR themselves. They call into an
//! [`IrBuilder`] for the handful of primitives they need and into a
//! [`StorageAllocator`] when a category's storage has to be created. The
//! method translation context implements both.

use std::fmt;

use crate::category::RegCategory;
use crate::types::IrType;

/// Alias-analysis class attached to register memory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasClass {
    /// The register's private storage.
    Register,
    /// The externally visible mirror (shadow frame) of a register.
    ShadowFrame,
}

impl fmt::Display for AliasClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasClass::Register => f.write_str("register"),
            AliasClass::ShadowFrame => f.write_str("shadow_frame"),
        }
    }
}

pub trait IrBuilder {
    /// An SSA value.
    type Value: Copy + fmt::Debug;
    /// A storage location created by [`StorageAllocator::allocate_register`].
    type Storage: Copy + fmt::Debug;
    /// An address a register can be mirrored to.
    type Address: Copy + fmt::Debug;

    /// Materialize a constant from raw bits (low `ty.bits()` bits are used).
    fn constant(&mut self, ty: IrType, bits: u64) -> Self::Value;

    fn load(&mut self, storage: Self::Storage, ty: IrType, alias: AliasClass) -> Self::Value;

    fn store(&mut self, storage: Self::Storage, value: Self::Value, alias: AliasClass);

    /// Store `value`, viewed as `ty`, at an arbitrary address.
    fn store_to_address(
        &mut self,
        address: Self::Address,
        value: Self::Value,
        ty: IrType,
        alias: AliasClass,
    );

    fn truncate(&mut self, value: Self::Value, ty: IrType) -> Self::Value;

    fn zero_extend(&mut self, value: Self::Value, ty: IrType) -> Self::Value;

    fn sign_extend(&mut self, value: Self::Value, ty: IrType) -> Self::Value;

    /// Reinterpret the bits of `value` as `ty`. Sizes must match.
    fn bitcast(&mut self, value: Self::Value, ty: IrType) -> Self::Value;
}

pub trait StorageAllocator: IrBuilder {
    /// Create the storage backing one category of one register.
    ///
    /// `name` already carries the category prefix. The returned handle must
    /// stay valid until the method translation ends.
    fn allocate_register(&mut self, category: RegCategory, name: &str) -> Self::Storage;
}

/// Options shared by the bundled backends.
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// Log every emitted instruction at `trace` level.
    pub trace_emission: bool,
    /// Run the IR verifier when a function is finished.
    pub verify: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            trace_emission: false,
            verify: true,
        }
    }
}

impl BackendOptions {
    pub fn with_trace_emission(mut self, enable: bool) -> Self {
        self.trace_emission = enable;
        self
    }

    pub fn with_verify(mut self, enable: bool) -> Self {
        self.verify = enable;
        self
    }
}
