use thiserror::Error;

/// Error type for VM execution
#[derive(Debug, Error, PartialEq)]
pub enum VMError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Stack overflow: SP reached {0}")]
    StackOverflow(i32),

    #[error("Invalid stack address: {0}")]
    InvalidStackAddress(i32),

    #[error("Invalid register: {0}")]
    InvalidRegister(i32),

    #[error("Invalid program counter: {0}")]
    InvalidProgramCounter(i32),

    #[error("Program ran past the end of the image")]
    MissingHalt,

    #[error("Invalid input: '{0}' is not an integer")]
    InvalidInput(String),

    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for VMError {
    fn from(err: std::io::Error) -> Self {
        VMError::Io(err.to_string())
    }
}

/// Result type for VM execution
pub type VMResult<T> = Result<T, VMError>;
