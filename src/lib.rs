pub mod error;
pub mod memory;
pub mod decode;
pub mod machine;
pub mod drive;
pub mod ascii;
pub mod network;
pub mod program;

pub use error::{ErrorKind, ParseError, VmError};
pub use machine::{Machine, MachineConfig, Signal, State};
pub use memory::MemorySnapshot;
