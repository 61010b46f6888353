use thiserror::Error;

/// Internal invariant violations raised while emitting register code.
///
/// None of these are user-facing: they mean the bytecode translator handed
/// the register layer something it must never see. Callers propagate them
/// with `?` and abandon the method being translated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegError {
    #[error("virtual register with void type has no value (during {op})")]
    VoidType { op: &'static str },

    #[error("unknown shorty type character: {0:?}")]
    UnknownShorty(char),

    #[error("IR verification failed: {0}")]
    Verifier(String),
}

pub type Result<T> = std::result::Result<T, RegError>;
