//! A register translation session driven statement by statement.

use std::collections::HashMap;

use cranelift_codegen::ir::Function;
use tracing::debug;
use vreg_core::cranelift::{CraneliftBuilder, build_function};
use vreg_core::trace::{MirrorId, TraceBuilder, TraceValue};
use vreg_core::{BackendOptions, IrBuilder, IrType, RegisterSlot};

use crate::error::{CommandError, Result};
use crate::parser::Statement;

pub struct Session {
    builder: TraceBuilder,
    slots: HashMap<String, RegisterSlot<TraceBuilder>>,
    /// Statements that executed successfully, in order
    statements: Vec<Statement>,
}

impl Session {
    pub fn new(options: BackendOptions) -> Self {
        Self {
            builder: TraceBuilder::with_options(options),
            slots: HashMap::new(),
            statements: Vec::new(),
        }
    }

    pub fn builder(&self) -> &TraceBuilder {
        &self.builder
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Slots sorted by name.
    pub fn slots(&self) -> Vec<&RegisterSlot<TraceBuilder>> {
        let mut slots: Vec<_> = self.slots.values().collect();
        slots.sort_by(|a, b| a.name().cmp(b.name()));
        slots
    }

    /// Run one statement. Returns the text to show for it.
    pub fn execute(&mut self, statement: Statement) -> Result<String> {
        let output = match &statement {
            Statement::Slot { name, mirrored } => {
                if self.slots.contains_key(name) {
                    return Err(CommandError::DuplicateSlot(name.clone()));
                }
                let mirror = mirrored.then(|| self.builder.new_mirror());
                self.slots
                    .insert(name.clone(), RegisterSlot::new(name.clone(), mirror));
                match mirror {
                    Some(mirror) => format!("slot {name} mirrored to {mirror}"),
                    None => format!("slot {name}"),
                }
            }
            Statement::Set {
                name,
                ty,
                space,
                value,
            } => {
                let slot = self
                    .slots
                    .get_mut(name)
                    .ok_or_else(|| CommandError::UnknownSlot(name.clone()))?;
                let constant = self.builder.constant(value.ir, value.bits);
                slot.set_value(&mut self.builder, *ty, *space, constant)?;
                format!("{name} <- {}", self.render(constant))
            }
            Statement::Get { name, ty, space } => {
                let slot = self
                    .slots
                    .get_mut(name)
                    .ok_or_else(|| CommandError::UnknownSlot(name.clone()))?;
                let value = slot.get_value(&mut self.builder, *ty, *space)?;
                self.render(value)
            }
        };
        debug!("Executed {}", statement);
        self.statements.push(statement);
        Ok(output)
    }

    /// Display a value with its type, as a number where that reads better.
    pub fn render(&self, value: TraceValue) -> String {
        let ty = self.builder.type_of(value);
        let bits = self.builder.bits(value);
        match ty {
            IrType::F32 => format!("{} {:e} ({:#x})", ty, self.builder.as_f32(value), bits),
            IrType::F64 => format!("{} {:e} ({:#x})", ty, self.builder.as_f64(value), bits),
            IrType::I1 => format!("{ty} {}", bits != 0),
            IrType::Ref if bits == 0 => format!("{ty} null"),
            IrType::Ref => format!("{ty} {bits:#x}"),
            _ => format!("{} {} ({:#x})", ty, self.builder.as_i64(value), bits),
        }
    }

    /// Last value written to each mirror.
    pub fn mirrors(&self) -> Vec<(MirrorId, Option<(IrType, u64)>)> {
        self.slots()
            .into_iter()
            .filter_map(|slot| slot.mirror())
            .map(|mirror| (mirror, self.builder.mirror_contents(mirror)))
            .collect()
    }

    /// Replay the session's statements into a fresh Cranelift function.
    ///
    /// Mirrored slots get consecutive shadow frame slots in declaration
    /// order.
    pub fn compile(&self, options: BackendOptions) -> vreg_core::Result<Function> {
        build_function(0, options, |cx| {
            let mut slots: HashMap<&str, RegisterSlot<CraneliftBuilder<'_>>> = HashMap::new();
            let mut next_frame_slot = 0;

            for statement in &self.statements {
                match statement {
                    Statement::Slot { name, mirrored } => {
                        let mirror = if *mirrored {
                            next_frame_slot += 1;
                            cx.frame_slot(next_frame_slot - 1)
                        } else {
                            None
                        };
                        slots.insert(name.as_str(), RegisterSlot::new(name.clone(), mirror));
                    }
                    Statement::Set {
                        name,
                        ty,
                        space,
                        value,
                    } => {
                        let Some(slot) = slots.get_mut(name.as_str()) else {
                            continue;
                        };
                        let constant = cx.constant(value.ir, value.bits);
                        slot.set_value(cx, *ty, *space, constant)?;
                    }
                    Statement::Get { name, ty, space } => {
                        let Some(slot) = slots.get_mut(name.as_str()) else {
                            continue;
                        };
                        slot.get_value(cx, *ty, *space)?;
                    }
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use vreg_core::RegError;

    fn run(session: &mut Session, input: &str) -> Result<String> {
        session.execute(parse(input)?)
    }

    #[test]
    fn test_set_then_get() {
        let mut session = Session::new(BackendOptions::default());
        run(&mut session, "slot v0").unwrap();
        run(&mut session, "set v0 B accurate -5").unwrap();
        assert_eq!(
            run(&mut session, "get v0 I storage").unwrap(),
            "i32 -5 (0xfffffffb)"
        );
        assert_eq!(
            run(&mut session, "get v0 C accurate").unwrap(),
            "i16 -5 (0xfffb)"
        );
        assert_eq!(session.statements().len(), 4);
    }

    #[test]
    fn test_unknown_and_duplicate_slots() {
        let mut session = Session::new(BackendOptions::default());
        assert!(matches!(
            run(&mut session, "get v9 I storage"),
            Err(CommandError::UnknownSlot(_))
        ));
        run(&mut session, "slot v0").unwrap();
        assert!(matches!(
            run(&mut session, "slot v0 mirror"),
            Err(CommandError::DuplicateSlot(_))
        ));
        // Failed statements are not replayed
        assert_eq!(session.statements().len(), 1);
    }

    #[test]
    fn test_void_get_fails() {
        let mut session = Session::new(BackendOptions::default());
        run(&mut session, "slot v0").unwrap();
        assert!(matches!(
            run(&mut session, "get v0 V storage"),
            Err(CommandError::Register(RegError::VoidType { .. }))
        ));
        assert!(session.builder().insts().is_empty());
    }

    #[test]
    fn test_mirrors_follow_writes() {
        let mut session = Session::new(BackendOptions::default());
        run(&mut session, "slot v0 mirror").unwrap();
        run(&mut session, "slot v1").unwrap();
        assert_eq!(session.mirrors().len(), 1);
        assert_eq!(session.mirrors()[0].1, None);

        run(&mut session, "set v0 Z array 1").unwrap();
        assert_eq!(session.mirrors()[0].1, Some((IrType::I32, 1)));
    }

    #[test]
    fn test_float_rendering() {
        let mut session = Session::new(BackendOptions::default());
        run(&mut session, "slot f").unwrap();
        run(&mut session, "set f D accurate 1.5").unwrap();
        let text = run(&mut session, "get f D array").unwrap();
        assert!(text.starts_with("f64 1.5e0"), "{text}");
        assert_eq!(
            run(&mut session, "get f J storage").unwrap(),
            format!("i64 {} ({:#x})", 1.5f64.to_bits() as i64, 1.5f64.to_bits())
        );
    }

    #[test]
    fn test_compile_replays_session() {
        let mut session = Session::new(BackendOptions::default());
        run(&mut session, "slot v0 mirror").unwrap();
        run(&mut session, "set v0 S accurate -2").unwrap();
        run(&mut session, "get v0 B accurate").unwrap();
        run(&mut session, "set v0 D accurate 0.25").unwrap();

        let func = session.compile(BackendOptions::default()).unwrap();
        let text = func.display().to_string();
        assert!(text.contains("sextend.i32"), "{text}");
        assert!(text.contains("ireduce.i8"), "{text}");
        assert!(text.contains("bitcast.i64"), "{text}");
        assert_eq!(func.sized_stack_slots.len(), 2);
    }
}
