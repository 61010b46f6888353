use std::fmt;

use vreg_core::{IrType, TypeSpace, ValueType};

use crate::error::{CommandError, Result};
use crate::lexer::{Token, tokenize};

/// A constant already converted to the representation it is written in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    pub ir: IrType,
    pub bits: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Slot {
        name: String,
        mirrored: bool,
    },
    Set {
        name: String,
        ty: ValueType,
        space: TypeSpace,
        value: Constant,
    },
    Get {
        name: String,
        ty: ValueType,
        space: TypeSpace,
    },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Slot { name, mirrored } => {
                write!(f, "slot {name}")?;
                if *mirrored {
                    write!(f, " mirror")?;
                }
                Ok(())
            }
            Statement::Set {
                name,
                ty,
                space,
                value,
            } => write!(
                f,
                "set {name} {} {space} {:#x} # {}",
                ty.shorty(),
                value.bits,
                value.ir
            ),
            Statement::Get { name, ty, space } => {
                write!(f, "get {name} {} {space}", ty.shorty())
            }
        }
    }
}

pub fn parse(input: &str) -> Result<Statement> {
    let tokens = tokenize(input).map_err(CommandError::LexerError)?;
    Parser::new(tokens).statement()
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    fn statement(&mut self) -> Result<Statement> {
        let statement = match self.advance() {
            Some(Token::Slot) => {
                let name = self.ident("slot name")?;
                let mirrored = self.peek() == Some(&Token::Mirror);
                if mirrored {
                    self.current += 1;
                }
                Statement::Slot { name, mirrored }
            }
            Some(Token::Set) => {
                let name = self.ident("slot name")?;
                let ty = self.value_type()?;
                let space = self.space()?;
                let literal = self.advance().ok_or_else(|| {
                    CommandError::ParseError("expected a literal after the type space".into())
                })?;
                let value = constant(&literal, ty, space)?;
                Statement::Set {
                    name,
                    ty,
                    space,
                    value,
                }
            }
            Some(Token::Get) => {
                let name = self.ident("slot name")?;
                let ty = self.value_type()?;
                let space = self.space()?;
                Statement::Get { name, ty, space }
            }
            Some(other) => {
                return Err(CommandError::ParseError(format!(
                    "expected `slot`, `set` or `get`, found {other:?}"
                )));
            }
            None => return Err(CommandError::ParseError("empty statement".into())),
        };

        if let Some(extra) = self.peek() {
            return Err(CommandError::ParseError(format!(
                "unexpected {extra:?} after statement"
            )));
        }
        Ok(statement)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn ident(&mut self, what: &str) -> Result<String> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            other => Err(CommandError::ParseError(format!(
                "expected {what}, found {other:?}"
            ))),
        }
    }

    fn value_type(&mut self) -> Result<ValueType> {
        let word = self.ident("shorty type")?;
        let mut chars = word.chars();
        match (chars.next(), chars.next()) {
            (Some(shorty), None) => Ok(ValueType::from_shorty(shorty)?),
            _ => Err(CommandError::ParseError(format!(
                "expected a single shorty character, found {word:?}"
            ))),
        }
    }

    fn space(&mut self) -> Result<TypeSpace> {
        let word = self.ident("type space")?;
        TypeSpace::from_name(&word)
            .ok_or_else(|| CommandError::ParseError(format!("unknown type space {word:?}")))
    }
}

/// Convert a literal to the bits of `ty` represented for `space`.
///
/// Float literals written to an integer representation of a floating type
/// (storage or field space) become the raw IEEE bits of that type.
fn constant(literal: &Token, ty: ValueType, space: TypeSpace) -> Result<Constant> {
    let ir = ty.ir_type(space)?;
    let mismatch = || CommandError::LiteralMismatch {
        literal: format!("{literal:?}"),
        ty,
        ir,
    };

    let bits = match (literal, ir) {
        (Token::Bits(bits), _) => *bits,
        (Token::Null, IrType::Ref) => 0,
        (Token::True, IrType::I1 | IrType::I8 | IrType::I32) if ty == ValueType::Boolean => 1,
        (Token::False, IrType::I1 | IrType::I8 | IrType::I32) if ty == ValueType::Boolean => 0,
        (Token::Integer(n), IrType::F32) => (*n as f32).to_bits() as u64,
        (Token::Integer(n), IrType::F64) => (*n as f64).to_bits(),
        (Token::Integer(n), IrType::Ref) if ty == ValueType::Object => *n as u64,
        (Token::Integer(n), _) if !ty.is_floating() && ty != ValueType::Object => *n as u64,
        (Token::Float(x), IrType::F32) => (*x as f32).to_bits() as u64,
        (Token::Float(x), IrType::F64) => x.to_bits(),
        (Token::Float(x), IrType::I32) if ty == ValueType::Float => (*x as f32).to_bits() as u64,
        (Token::Float(x), IrType::I64) if ty == ValueType::Double => x.to_bits(),
        _ => return Err(mismatch()),
    };
    Ok(Constant {
        ir,
        bits: bits & ir.mask(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vreg_core::RegError;

    #[test]
    fn test_parse_slot() {
        assert_eq!(
            parse("slot v0").unwrap(),
            Statement::Slot {
                name: "v0".into(),
                mirrored: false
            }
        );
        assert_eq!(
            parse("slot v1 mirror").unwrap(),
            Statement::Slot {
                name: "v1".into(),
                mirrored: true
            }
        );
    }

    #[test]
    fn test_parse_set_masks_to_representation() {
        let statement = parse("set v0 B accurate -1").unwrap();
        assert_eq!(
            statement,
            Statement::Set {
                name: "v0".into(),
                ty: ValueType::Byte,
                space: TypeSpace::Accurate,
                value: Constant {
                    ir: IrType::I8,
                    bits: 0xff
                },
            }
        );
    }

    #[test]
    fn test_float_literals() {
        let Statement::Set { value, .. } = parse("set v0 F accurate 1.0").unwrap() else {
            panic!("expected set");
        };
        assert_eq!(value, Constant { ir: IrType::F32, bits: 0x3f80_0000 });

        // Storage space holds the raw bits
        let Statement::Set { value, .. } = parse("set v0 F storage 1.0").unwrap() else {
            panic!("expected set");
        };
        assert_eq!(value, Constant { ir: IrType::I32, bits: 0x3f80_0000 });

        let Statement::Set { value, .. } = parse("set v0 D array 2").unwrap() else {
            panic!("expected set");
        };
        assert_eq!(value.bits, 2.0f64.to_bits());
    }

    #[test]
    fn test_boolean_and_null() {
        let Statement::Set { value, .. } = parse("set v0 Z accurate true").unwrap() else {
            panic!("expected set");
        };
        assert_eq!(value, Constant { ir: IrType::I1, bits: 1 });

        let Statement::Set { value, .. } = parse("set v0 L field null").unwrap() else {
            panic!("expected set");
        };
        assert_eq!(value, Constant { ir: IrType::Ref, bits: 0 });
    }

    #[test]
    fn test_literal_mismatch() {
        assert!(matches!(
            parse("set v0 I accurate 1.5"),
            Err(CommandError::LiteralMismatch { .. })
        ));
        assert!(matches!(
            parse("set v0 I accurate null"),
            Err(CommandError::LiteralMismatch { .. })
        ));
        assert!(matches!(
            parse("set v0 J storage true"),
            Err(CommandError::LiteralMismatch { .. })
        ));
    }

    #[test]
    fn test_get_and_errors() {
        assert_eq!(
            parse("get v0 J reg").unwrap(),
            Statement::Get {
                name: "v0".into(),
                ty: ValueType::Long,
                space: TypeSpace::Storage
            }
        );
        assert!(matches!(
            parse("get v0 Q storage"),
            Err(CommandError::Register(RegError::UnknownShorty('Q')))
        ));
        assert!(matches!(
            parse("get v0 I nowhere"),
            Err(CommandError::ParseError(_))
        ));
        assert!(matches!(
            parse("get v0 I storage extra"),
            Err(CommandError::ParseError(_))
        ));
        assert!(matches!(parse(""), Err(CommandError::ParseError(_))));
    }

    #[test]
    fn test_void_set_is_rejected() {
        assert!(matches!(
            parse("set v0 V storage 0"),
            Err(CommandError::Register(RegError::VoidType { .. }))
        ));
    }

    #[test]
    fn test_display_replays() {
        let statement = parse("set v2 S array -2").unwrap();
        assert_eq!(statement.to_string(), "set v2 S array 0xfffe # i16");
        assert_eq!(parse(&statement.to_string()).unwrap(), statement);
    }
}
