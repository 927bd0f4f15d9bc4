// pzero - a register+stack virtual machine for the pzero toolchain

pub mod bytecode;
pub mod runtime;
pub mod vm;

pub use bytecode::{Instruction, OpCode, MAX_CODE_LENGTH};
pub use runtime::Runtime;
pub use vm::{run, ExecutionContext, VMError, VM};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
