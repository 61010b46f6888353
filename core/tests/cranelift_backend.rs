//! Register slots emitting real Cranelift IR.
//!
//! The functions are verified by the Cranelift verifier and then checked
//! textually for the instructions the coercion rules call for.

use vreg_core::cranelift::{
    CraneliftBuilder, POINTER_TYPE, SHADOW_FRAME_STRIDE, build_function, register_function, verify,
};
use vreg_core::{BackendOptions, IrBuilder, IrType, RegError, RegisterSlot, TypeSpace, ValueType};

fn emit<F>(body: F) -> String
where
    F: FnOnce(&mut CraneliftBuilder<'_>) -> vreg_core::Result<()>,
{
    let func = build_function(0, BackendOptions::default(), body).unwrap();
    func.display().to_string()
}

#[test]
fn test_empty_function_verifies() {
    let text = emit(|_| Ok(()));
    assert!(text.contains("return"), "{text}");
}

#[test]
fn test_narrow_write_then_read() {
    let text = emit(|cx| {
        let mut slot = RegisterSlot::new("v0", None);
        let byte = cx.constant(IrType::I8, 0xfb);
        slot.set_value(cx, ValueType::Byte, TypeSpace::Accurate, byte)?;
        let _ = slot.get_value(cx, ValueType::Short, TypeSpace::Accurate)?;
        Ok(())
    });
    assert!(text.contains("sextend.i32"), "{text}");
    assert!(text.contains("stack_store"), "{text}");
    assert!(text.contains("stack_load.i32"), "{text}");
    assert!(text.contains("ireduce.i16"), "{text}");
}

#[test]
fn test_unsigned_types_zero_extend() {
    let text = emit(|cx| {
        let mut slot = RegisterSlot::new("v0", None);
        let ch = cx.constant(IrType::I16, 0xffff);
        slot.set_value(cx, ValueType::Char, TypeSpace::Array, ch)?;
        Ok(())
    });
    assert!(text.contains("uextend.i32"), "{text}");
    assert!(!text.contains("sextend"), "{text}");
}

#[test]
fn test_boolean_accurate_read_is_masked() {
    let text = emit(|cx| {
        let mut slot = RegisterSlot::new("v0", None);
        let truth = cx.constant(IrType::I1, 1);
        slot.set_value(cx, ValueType::Boolean, TypeSpace::Accurate, truth)?;
        let _ = slot.get_value(cx, ValueType::Boolean, TypeSpace::Accurate)?;
        let _ = slot.get_value(cx, ValueType::Boolean, TypeSpace::Array)?;
        Ok(())
    });
    assert!(text.contains("ireduce.i8"), "{text}");
    assert!(text.contains("band_imm"), "{text}");
}

#[test]
fn test_floats_are_bitcast() {
    let text = emit(|cx| {
        let mut slot = RegisterSlot::new("v0", None);
        let value = cx.constant(IrType::F64, 0.5f64.to_bits());
        slot.set_value(cx, ValueType::Double, TypeSpace::Accurate, value)?;
        let _ = slot.get_value(cx, ValueType::Double, TypeSpace::Array)?;
        let raw = cx.constant(IrType::I32, 0x3f80_0000);
        slot.set_value(cx, ValueType::Float, TypeSpace::Storage, raw)?;
        let _ = slot.get_value(cx, ValueType::Float, TypeSpace::Accurate)?;
        Ok(())
    });
    assert!(text.contains("bitcast.i64"), "{text}");
    assert!(text.contains("bitcast.f64"), "{text}");
    assert!(text.contains("bitcast.f32"), "{text}");
    assert!(!text.contains("fcvt"), "{text}");
}

#[test]
fn test_one_stack_slot_per_category() {
    let func = build_function(1, BackendOptions::default(), |cx| {
        let mut slot = RegisterSlot::new("v0", None);
        for ty in [ValueType::Byte, ValueType::Short, ValueType::Int, ValueType::Float] {
            let _ = slot.get_value(cx, ty, TypeSpace::Storage)?;
        }
        let _ = slot.get_value(cx, ValueType::Long, TypeSpace::Storage)?;
        let _ = slot.get_value(cx, ValueType::Double, TypeSpace::Accurate)?;
        Ok(())
    })
    .unwrap();
    assert_eq!(func.sized_stack_slots.len(), 2);
}

#[test]
fn test_mirror_writes_go_to_shadow_frame() {
    let text = emit(|cx| {
        let mirror = cx.frame_slot(3);
        assert!(mirror.is_some());
        let mut slot = RegisterSlot::new("v3", mirror);
        let obj = cx.constant(IrType::Ref, 0);
        slot.set_value(cx, ValueType::Object, TypeSpace::Field, obj)?;
        let int = cx.constant(IrType::I32, 5);
        slot.set_value(cx, ValueType::Int, TypeSpace::Storage, int)?;
        Ok(())
    });
    // One stack_store and one shadow frame store per write
    assert_eq!(text.matches("stack_store").count(), 2, "{text}");
    assert_eq!(text.matches("+24").count(), 2, "{text}");
}

#[test]
fn test_void_aborts_the_function() {
    let result = build_function(2, BackendOptions::default(), |cx| {
        let mut slot = RegisterSlot::new("v0", None);
        let _ = slot.get_value(cx, ValueType::Void, TypeSpace::Storage)?;
        Ok(())
    });
    assert!(matches!(result, Err(RegError::VoidType { op: "get_value" })));
}

#[test]
fn test_frame_slots() {
    let func = build_function(3, BackendOptions::default().with_verify(false), |cx| {
        let base = cx.frame_pointer();
        assert!(base.is_some());
        let slot = cx.frame_slot(2).unwrap();
        assert_eq!(Some(slot.base), base);
        assert_eq!(slot.offset, 2 * SHADOW_FRAME_STRIDE);
        assert!(cx.frame_slot(u32::MAX).is_none());
        Ok(())
    })
    .unwrap();
    assert!(verify(&func).is_ok());
}

#[test]
fn test_register_function_signature() {
    let func = register_function(7);
    assert_eq!(func.signature.params.len(), 1);
    assert_eq!(func.signature.params[0].value_type, POINTER_TYPE);
    assert!(func.signature.returns.is_empty());
}
