mod error;
mod execution_context;
mod interpreter;

pub use error::{VMError, VMResult};
pub use execution_context::{ExecutionContext, MAX_STACK_HEIGHT, REGISTER_FILE_SIZE};
pub use interpreter::{run, VM};
