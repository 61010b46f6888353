//! Recording IR backend.
//!
//! [`TraceBuilder`] appends every primitive it is asked for to a linear
//! instruction list and evaluates it on the spot, so a caller can both read
//! the code a register access produced and check the bits it computes.
//! Storage locations and mirror cells are plain memory cells owned by the
//! builder.
//!
//! ```text
//! v0 = const.i8 0xfb
//! v1 = sext.i32 v0
//! store v1, s0 !register
//! v2 = load.i32 s0 !register
//! v3 = trunc.i8 v2
//! ```

use std::fmt;

use tracing::{trace, warn};

use crate::builder::{AliasClass, BackendOptions, IrBuilder, StorageAllocator};
use crate::category::RegCategory;
use crate::types::IrType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceValue(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MirrorId(u32);

impl fmt::Display for TraceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for MirrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// One emitted primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    Const {
        dst: TraceValue,
        ty: IrType,
        bits: u64,
    },
    Load {
        dst: TraceValue,
        storage: StorageId,
        ty: IrType,
        alias: AliasClass,
    },
    Store {
        storage: StorageId,
        value: TraceValue,
        alias: AliasClass,
    },
    StoreAddress {
        mirror: MirrorId,
        value: TraceValue,
        ty: IrType,
        alias: AliasClass,
    },
    Trunc {
        dst: TraceValue,
        src: TraceValue,
        ty: IrType,
    },
    ZExt {
        dst: TraceValue,
        src: TraceValue,
        ty: IrType,
    },
    SExt {
        dst: TraceValue,
        src: TraceValue,
        ty: IrType,
    },
    BitCast {
        dst: TraceValue,
        src: TraceValue,
        ty: IrType,
    },
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Const { dst, ty, bits } => write!(f, "{dst} = const.{ty} {bits:#x}"),
            Inst::Load {
                dst,
                storage,
                ty,
                alias,
            } => write!(f, "{dst} = load.{ty} {storage} !{alias}"),
            Inst::Store {
                storage,
                value,
                alias,
            } => write!(f, "store {value}, {storage} !{alias}"),
            Inst::StoreAddress {
                mirror,
                value,
                ty,
                alias,
            } => write!(f, "store.{ty} {value}, {mirror} !{alias}"),
            Inst::Trunc { dst, src, ty } => write!(f, "{dst} = trunc.{ty} {src}"),
            Inst::ZExt { dst, src, ty } => write!(f, "{dst} = zext.{ty} {src}"),
            Inst::SExt { dst, src, ty } => write!(f, "{dst} = sext.{ty} {src}"),
            Inst::BitCast { dst, src, ty } => write!(f, "{dst} = bitcast.{ty} {src}"),
        }
    }
}

/// A storage location handed out by [`StorageAllocator::allocate_register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub id: StorageId,
    pub category: RegCategory,
    pub name: String,
}

#[derive(Debug, Clone)]
struct StorageCell {
    allocation: Allocation,
    contents: Option<u64>,
}

#[derive(Debug, Default)]
pub struct TraceBuilder {
    options: BackendOptions,
    insts: Vec<Inst>,
    /// Type and bits of every value, indexed by `TraceValue`
    values: Vec<(IrType, u64)>,
    storage: Vec<StorageCell>,
    mirrors: Vec<Option<(IrType, u64)>>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BackendOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    pub fn allocations(&self) -> impl Iterator<Item = &Allocation> {
        self.storage.iter().map(|cell| &cell.allocation)
    }

    pub fn allocation_count(&self) -> usize {
        self.storage.len()
    }

    pub fn storage_contents(&self, storage: StorageId) -> Option<u64> {
        self.storage[storage.0 as usize].contents
    }

    /// Create a fresh mirror cell to hand to a register slot.
    pub fn new_mirror(&mut self) -> MirrorId {
        self.mirrors.push(None);
        MirrorId(self.mirrors.len() as u32 - 1)
    }

    /// Last value stored to a mirror, with the type it was stored as.
    pub fn mirror_contents(&self, mirror: MirrorId) -> Option<(IrType, u64)> {
        self.mirrors[mirror.0 as usize]
    }

    pub fn mirror_count(&self) -> usize {
        self.mirrors.len()
    }

    pub fn type_of(&self, value: TraceValue) -> IrType {
        self.values[value.0 as usize].0
    }

    /// Raw bits of a value, zero above its width.
    pub fn bits(&self, value: TraceValue) -> u64 {
        self.values[value.0 as usize].1
    }

    /// Value bits read as a signed integer of the value's width.
    pub fn as_i64(&self, value: TraceValue) -> i64 {
        let (ty, bits) = self.values[value.0 as usize];
        let shift = 64 - ty.bits();
        ((bits << shift) as i64) >> shift
    }

    pub fn as_f32(&self, value: TraceValue) -> f32 {
        f32::from_bits(self.bits(value) as u32)
    }

    pub fn as_f64(&self, value: TraceValue) -> f64 {
        f64::from_bits(self.bits(value))
    }

    fn new_value(&mut self, ty: IrType, bits: u64) -> TraceValue {
        self.values.push((ty, bits & ty.mask()));
        TraceValue(self.values.len() as u32 - 1)
    }

    fn emit(&mut self, inst: Inst) {
        if self.options.trace_emission {
            trace!("{}", inst);
        }
        self.insts.push(inst);
    }
}

impl IrBuilder for TraceBuilder {
    type Value = TraceValue;
    type Storage = StorageId;
    type Address = MirrorId;

    fn constant(&mut self, ty: IrType, bits: u64) -> TraceValue {
        let dst = self.new_value(ty, bits);
        let bits = self.bits(dst);
        self.emit(Inst::Const { dst, ty, bits });
        dst
    }

    fn load(&mut self, storage: StorageId, ty: IrType, alias: AliasClass) -> TraceValue {
        let cell = &self.storage[storage.0 as usize];
        let bits = match cell.contents {
            Some(bits) => bits,
            None => {
                warn!("Load from {} before any store", cell.allocation.name);
                0
            }
        };
        let dst = self.new_value(ty, bits);
        self.emit(Inst::Load {
            dst,
            storage,
            ty,
            alias,
        });
        dst
    }

    fn store(&mut self, storage: StorageId, value: TraceValue, alias: AliasClass) {
        let bits = self.bits(value);
        self.storage[storage.0 as usize].contents = Some(bits);
        self.emit(Inst::Store {
            storage,
            value,
            alias,
        });
    }

    fn store_to_address(
        &mut self,
        mirror: MirrorId,
        value: TraceValue,
        ty: IrType,
        alias: AliasClass,
    ) {
        let bits = self.bits(value) & ty.mask();
        self.mirrors[mirror.0 as usize] = Some((ty, bits));
        self.emit(Inst::StoreAddress {
            mirror,
            value,
            ty,
            alias,
        });
    }

    fn truncate(&mut self, src: TraceValue, ty: IrType) -> TraceValue {
        let dst = self.new_value(ty, self.bits(src));
        self.emit(Inst::Trunc { dst, src, ty });
        dst
    }

    fn zero_extend(&mut self, src: TraceValue, ty: IrType) -> TraceValue {
        let dst = self.new_value(ty, self.bits(src));
        self.emit(Inst::ZExt { dst, src, ty });
        dst
    }

    fn sign_extend(&mut self, src: TraceValue, ty: IrType) -> TraceValue {
        let dst = self.new_value(ty, self.as_i64(src) as u64);
        self.emit(Inst::SExt { dst, src, ty });
        dst
    }

    fn bitcast(&mut self, src: TraceValue, ty: IrType) -> TraceValue {
        debug_assert_eq!(self.type_of(src).bits(), ty.bits(), "bitcast between sizes");
        let dst = self.new_value(ty, self.bits(src));
        self.emit(Inst::BitCast { dst, src, ty });
        dst
    }
}

impl StorageAllocator for TraceBuilder {
    fn allocate_register(&mut self, category: RegCategory, name: &str) -> StorageId {
        let id = StorageId(self.storage.len() as u32);
        self.storage.push(StorageCell {
            allocation: Allocation {
                id,
                category,
                name: name.to_string(),
            },
            contents: None,
        });
        id
    }
}
