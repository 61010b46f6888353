//! Typed virtual registers for a bytecode-to-IR compiler backend.
//!
//! Bytecode registers carry no type of their own. Every instruction reads
//! or writes one under some [`ValueType`], and needs the value in some
//! [`TypeSpace`]. A [`RegisterSlot`] maps that onto at most three physical
//! storage locations (one per [`RegCategory`]) and emits the truncations,
//! extensions and bit-casts in between through an [`IrBuilder`].
//!
//! Two builders ship with the crate: [`trace::TraceBuilder`], which records
//! and evaluates what it is asked to emit, and
//! [`cranelift::CraneliftBuilder`], which emits Cranelift IR.

pub mod builder;
pub mod category;
pub mod coerce;
pub mod cranelift;
pub mod error;
pub mod slot;
pub mod trace;
pub mod types;

pub use builder::{AliasClass, BackendOptions, IrBuilder, StorageAllocator};
pub use category::RegCategory;
pub use error::{RegError, Result};
pub use slot::RegisterSlot;
pub use types::{IrType, TypeSpace, ValueType};
