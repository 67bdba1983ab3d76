use thiserror::Error;

/// A fatal condition raised while executing a machine.
///
/// Every variant carries the instruction pointer of the instruction that
/// was being executed when the failure occurred.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("malformed instruction word {word} at ip {ip}")]
    MalformedOpcode { word: i64, ip: i64 },

    #[error("input requested at ip {ip} but the input queue is empty")]
    InputStarvation { ip: i64 },

    #[error("resume called after the machine halted (ip {ip})")]
    ResumeAfterHalt { ip: i64 },

    #[error("undefined address {address} reached at ip {ip}")]
    UndefinedAddress { address: i64, ip: i64 },

    #[error("immediate mode used for a written parameter in word {word} at ip {ip}")]
    ImmediateWrite { word: i64, ip: i64 },

    #[error("step limit of {limit} exceeded at ip {ip}")]
    StepLimitExceeded { limit: u64, ip: i64 },
}

/// The kind of a [`VmError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedOpcode,
    InputStarvation,
    ResumeAfterHalt,
    UndefinedAddress,
    ImmediateWrite,
    StepLimitExceeded,
}

impl VmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VmError::MalformedOpcode { .. } => ErrorKind::MalformedOpcode,
            VmError::InputStarvation { .. } => ErrorKind::InputStarvation,
            VmError::ResumeAfterHalt { .. } => ErrorKind::ResumeAfterHalt,
            VmError::UndefinedAddress { .. } => ErrorKind::UndefinedAddress,
            VmError::ImmediateWrite { .. } => ErrorKind::ImmediateWrite,
            VmError::StepLimitExceeded { .. } => ErrorKind::StepLimitExceeded,
        }
    }

    /// Instruction pointer at the time of the failure.
    pub fn ip(&self) -> i64 {
        match *self {
            VmError::MalformedOpcode { ip, .. }
            | VmError::InputStarvation { ip }
            | VmError::ResumeAfterHalt { ip }
            | VmError::UndefinedAddress { ip, .. }
            | VmError::ImmediateWrite { ip, .. }
            | VmError::StepLimitExceeded { ip, .. } => ip,
        }
    }
}

/// Errors from reading the comma-separated program encoding.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("program text contains no integers")]
    Empty,

    #[error("element {index} ({token:?}) is not a base-10 integer")]
    InvalidInteger { index: usize, token: String },

    #[error("failed to read program file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = VmError> = std::result::Result<T, E>;
