use crate::bytecode::OpCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single VM instruction with its three operand fields
///
/// Which fields are meaningful depends on the opcode: `r` is a register
/// index, `l` is a lexical-level delta or a second register, `m` is a
/// constant, stack offset, code address or third register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: OpCode,
    pub r: i32,
    pub l: i32,
    pub m: i32,
}

impl Instruction {
    pub fn new(op: OpCode, r: i32, l: i32, m: i32) -> Self {
        Self { op, r, l, m }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.op.to_code(), self.r, self.l, self.m)
    }
}
