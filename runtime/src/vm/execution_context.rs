use crate::vm::{VMError, VMResult};
use std::fmt::Write as _;

/// Number of registers in the register file
pub const REGISTER_FILE_SIZE: usize = 16;

/// Maximum stack height in words
pub const MAX_STACK_HEIGHT: usize = 2000;

/// The machine state operated on by the interpreter
///
/// Stack addresses 1..=SP are live; slot 0 is unused. BP points at the
/// base of the current activation record: `BP+0` holds the (reserved)
/// return value, `BP+1` the static link, `BP+2` the dynamic link, `BP+3`
/// the return address, and locals start at `BP+4`.
pub struct ExecutionContext {
    registers: [i32; REGISTER_FILE_SIZE],
    stack: Vec<i32>,
    pc: usize,
    bp: i32,
    sp: i32,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_FILE_SIZE],
            stack: vec![0; MAX_STACK_HEIGHT],
            pc: 0,
            bp: 1,
            sp: 0,
        }
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn bp(&self) -> i32 {
        self.bp
    }

    pub fn sp(&self) -> i32 {
        self.sp
    }

    pub fn registers(&self) -> &[i32] {
        &self.registers
    }

    pub fn stack(&self) -> &[i32] {
        &self.stack
    }

    pub(crate) fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    pub(crate) fn set_bp(&mut self, bp: i32) {
        self.bp = bp;
    }

    /// Move SP, rejecting moves past the top of the stack
    pub(crate) fn set_sp(&mut self, sp: i32) -> VMResult<()> {
        if sp < 0 || sp as usize >= MAX_STACK_HEIGHT {
            return Err(VMError::StackOverflow(sp));
        }
        self.sp = sp;
        Ok(())
    }

    pub(crate) fn register(&self, index: i32) -> VMResult<i32> {
        if index < 0 || index as usize >= REGISTER_FILE_SIZE {
            return Err(VMError::InvalidRegister(index));
        }
        Ok(self.registers[index as usize])
    }

    pub(crate) fn set_register(&mut self, index: i32, value: i32) -> VMResult<()> {
        if index < 0 || index as usize >= REGISTER_FILE_SIZE {
            return Err(VMError::InvalidRegister(index));
        }
        self.registers[index as usize] = value;
        Ok(())
    }

    pub(crate) fn stack_read(&self, address: i32) -> VMResult<i32> {
        if address < 0 || address as usize >= MAX_STACK_HEIGHT {
            return Err(VMError::InvalidStackAddress(address));
        }
        Ok(self.stack[address as usize])
    }

    pub(crate) fn stack_write(&mut self, address: i32, value: i32) -> VMResult<()> {
        if address < 0 || address as usize >= MAX_STACK_HEIGHT {
            return Err(VMError::InvalidStackAddress(address));
        }
        self.stack[address as usize] = value;
        Ok(())
    }

    /// Follow the static-link chain `levels` hops up from the current BP
    ///
    /// The static link lives at offset +1 within each activation record.
    pub(crate) fn base(&self, levels: i32) -> VMResult<i32> {
        let mut b = self.bp;
        let mut l = levels;
        while l > 0 {
            b = self.stack_read(b + 1)?;
            l -= 1;
        }
        Ok(b)
    }

    /// Render the live stack with `|` between activation records
    pub fn format_stack(&self) -> String {
        let mut out = String::new();
        self.format_frames(&mut out, self.sp, self.bp);
        out
    }

    fn format_frames(&self, out: &mut String, sp: i32, bp: i32) {
        if bp <= 0 {
            return;
        }
        if bp == 1 {
            let _ = write!(out, "{:>3} ", 0);
        } else {
            // walk down the dynamic-link chain first so frames print
            // bottom to top
            let caller_bp = self.stack_read(bp + 2).unwrap_or(0);
            self.format_frames(out, bp - 1, caller_bp);
        }
        if bp <= sp {
            let _ = write!(out, "| ");
            for i in bp..=sp {
                let _ = write!(out, "{:>3} ", self.stack[i as usize]);
            }
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
