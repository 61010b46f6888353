//! Cranelift IR backend.
//!
//! Register storage becomes explicit stack slots and the mirror becomes a
//! shadow frame reached through the function's only parameter. Cranelift
//! has no `i1`, so one-bit values travel as `i8` holding 0 or 1.

use cranelift_codegen::ir::immediates::{Ieee32, Ieee64};
use cranelift_codegen::ir::{
    AbiParam, Function, InstBuilder, MemFlags, Signature, StackSlot, StackSlotData,
    StackSlotKind, Type, UserFuncName, Value, types,
};
use cranelift_codegen::isa::CallConv;
use cranelift_codegen::settings;
use cranelift_codegen::verify_function;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use tracing::{debug, trace};

use crate::builder::{AliasClass, BackendOptions, IrBuilder, StorageAllocator};
use crate::category::RegCategory;
use crate::error::{RegError, Result};
use crate::types::IrType;

/// Object references and shadow frame addresses.
pub const POINTER_TYPE: Type = types::I64;

/// Bytes between consecutive registers in the shadow frame.
pub const SHADOW_FRAME_STRIDE: i32 = 8;

/// A location in the shadow frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAddress {
    pub base: Value,
    pub offset: i32,
}

pub fn clif_type(ty: IrType) -> Type {
    match ty {
        IrType::I1 | IrType::I8 => types::I8,
        IrType::I16 => types::I16,
        IrType::I32 => types::I32,
        IrType::I64 => types::I64,
        IrType::F32 => types::F32,
        IrType::F64 => types::F64,
        IrType::Ref => POINTER_TYPE,
    }
}

/// An empty function taking the shadow frame pointer as its only argument.
pub fn register_function(index: u32) -> Function {
    let mut sig = Signature::new(CallConv::SystemV);
    sig.params.push(AbiParam::new(POINTER_TYPE));
    Function::with_name_signature(UserFuncName::user(0, index), sig)
}

pub fn verify(func: &Function) -> Result<()> {
    let flags = settings::Flags::new(settings::builder());
    verify_function(func, &flags).map_err(|errors| RegError::Verifier(errors.to_string()))
}

/// Build a register function: `body` emits into the entry block, the
/// function is terminated and, if enabled, verified.
pub fn build_function<F>(index: u32, options: BackendOptions, body: F) -> Result<Function>
where
    F: FnOnce(&mut CraneliftBuilder<'_>) -> Result<()>,
{
    let mut func = register_function(index);
    let mut fn_ctx = FunctionBuilderContext::new();
    let verify_after = options.verify;

    let mut cx = CraneliftBuilder::new(&mut func, &mut fn_ctx, options);
    body(&mut cx)?;
    let slots = cx.stack_slots.len();
    cx.finish();

    if verify_after {
        verify(&func)?;
    }
    debug!("Built register function {} with {} stack slots", index, slots);
    Ok(func)
}

pub struct CraneliftBuilder<'a> {
    builder: FunctionBuilder<'a>,
    options: BackendOptions,
    /// Shadow frame pointer, the first function parameter
    frame: Option<Value>,
    /// Names of allocated slots, for diagnostics
    stack_slots: Vec<(StackSlot, String)>,
}

impl<'a> CraneliftBuilder<'a> {
    pub fn new(
        func: &'a mut Function,
        fn_ctx: &'a mut FunctionBuilderContext,
        options: BackendOptions,
    ) -> Self {
        let mut builder = FunctionBuilder::new(func, fn_ctx);
        let entry = builder.create_block();
        builder.append_block_params_for_function_params(entry);
        builder.switch_to_block(entry);
        builder.seal_block(entry);
        let frame = builder.block_params(entry).first().copied();

        Self {
            builder,
            options,
            frame,
            stack_slots: Vec::new(),
        }
    }

    pub fn frame_pointer(&self) -> Option<Value> {
        self.frame
    }

    /// Shadow frame location of bytecode register `index`.
    pub fn frame_slot(&self, index: u32) -> Option<FrameAddress> {
        let offset = i32::try_from(index).ok()?.checked_mul(SHADOW_FRAME_STRIDE)?;
        self.frame.map(|base| FrameAddress { base, offset })
    }

    pub fn slot_name(&self, slot: StackSlot) -> Option<&str> {
        self.stack_slots
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, name)| name.as_str())
    }

    pub fn finish(mut self) {
        self.builder.ins().return_(&[]);
        self.builder.finalize();
    }

    fn note(&self, op: &str, ty: IrType, value: Value) {
        if self.options.trace_emission {
            trace!("{} = {}.{}", value, op, ty);
        }
    }
}

impl IrBuilder for CraneliftBuilder<'_> {
    type Value = Value;
    type Storage = StackSlot;
    type Address = FrameAddress;

    fn constant(&mut self, ty: IrType, bits: u64) -> Value {
        let value = match ty {
            IrType::F32 => self.builder.ins().f32const(Ieee32::with_bits(bits as u32)),
            IrType::F64 => self.builder.ins().f64const(Ieee64::with_bits(bits)),
            _ => self
                .builder
                .ins()
                .iconst(clif_type(ty), (bits & ty.mask()) as i64),
        };
        self.note("const", ty, value);
        value
    }

    fn load(&mut self, storage: StackSlot, ty: IrType, _alias: AliasClass) -> Value {
        let value = self.builder.ins().stack_load(clif_type(ty), storage, 0);
        self.note("stack_load", ty, value);
        value
    }

    fn store(&mut self, storage: StackSlot, value: Value, _alias: AliasClass) {
        self.builder.ins().stack_store(value, storage, 0);
        if self.options.trace_emission {
            trace!("stack_store {}, {}", value, storage);
        }
    }

    fn store_to_address(
        &mut self,
        address: FrameAddress,
        value: Value,
        ty: IrType,
        alias: AliasClass,
    ) {
        // The shadow frame is always mapped and aligned.
        let flags = MemFlags::trusted();
        self.builder
            .ins()
            .store(flags, value, address.base, address.offset);
        if self.options.trace_emission {
            trace!(
                "store.{} {}, {}+{} !{}",
                ty, value, address.base, address.offset, alias
            );
        }
    }

    fn truncate(&mut self, value: Value, ty: IrType) -> Value {
        let narrow = self.builder.ins().ireduce(clif_type(ty), value);
        let value = if ty == IrType::I1 {
            self.builder.ins().band_imm(narrow, 1)
        } else {
            narrow
        };
        self.note("ireduce", ty, value);
        value
    }

    fn zero_extend(&mut self, value: Value, ty: IrType) -> Value {
        let value = self.builder.ins().uextend(clif_type(ty), value);
        self.note("uextend", ty, value);
        value
    }

    fn sign_extend(&mut self, value: Value, ty: IrType) -> Value {
        let value = self.builder.ins().sextend(clif_type(ty), value);
        self.note("sextend", ty, value);
        value
    }

    fn bitcast(&mut self, value: Value, ty: IrType) -> Value {
        let value = self
            .builder
            .ins()
            .bitcast(clif_type(ty), MemFlags::new(), value);
        self.note("bitcast", ty, value);
        value
    }
}

impl StorageAllocator for CraneliftBuilder<'_> {
    fn allocate_register(&mut self, category: RegCategory, name: &str) -> StackSlot {
        let bytes = category.equiv_size_type().bits() / 8;
        let align_shift = bytes.trailing_zeros() as u8;
        let slot = self.builder.create_sized_stack_slot(StackSlotData::new(
            StackSlotKind::ExplicitSlot,
            bytes,
            align_shift,
        ));
        trace!("Allocated {} ({} bytes) for {}", slot, bytes, name);
        self.stack_slots.push((slot, name.to_string()));
        slot
    }
}
