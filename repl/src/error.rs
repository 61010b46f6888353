use thiserror::Error;
use vreg_core::{IrType, RegError, ValueType};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Lexer error: {0}")]
    LexerError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("no slot named {0:?}, declare it with `slot {0}`")]
    UnknownSlot(String),

    #[error("slot {0:?} already exists")]
    DuplicateSlot(String),

    #[error("literal {literal} cannot be a {ty} held as {ir}")]
    LiteralMismatch {
        literal: String,
        ty: ValueType,
        ir: IrType,
    },

    #[error(transparent)]
    Register(#[from] RegError),
}

pub type Result<T> = std::result::Result<T, CommandError>;
