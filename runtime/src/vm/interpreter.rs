use crate::bytecode::{Instruction, OpCode};
use crate::vm::{ExecutionContext, VMError, VMResult, MAX_STACK_HEIGHT};
use std::io::{BufRead, Write};

/// The virtual machine: a fetch/execute loop over an instruction image
///
/// The machine state lives in an [`ExecutionContext`] so callers can
/// inspect registers and stack after a run.
pub struct VM {
    trace: bool,
}

impl VM {
    pub fn new() -> Self {
        Self { trace: false }
    }

    /// Enable or disable per-instruction execution tracing on stderr
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Run the image until SIO_HALT, mutating `ctx`
    pub fn execute<R: BufRead, W: Write>(
        &self,
        image: &[Instruction],
        ctx: &mut ExecutionContext,
        input: &mut R,
        output: &mut W,
    ) -> VMResult<()> {
        if self.trace {
            eprintln!(
                "{:>3} {:>3} {:>3} {:>3} {:>3} {:>4} {:>3} {:>3} {}",
                "#", "OP", "R", "L", "M", "PC", "BP", "SP", "STK"
            );
        }

        loop {
            let at = ctx.pc();
            if at >= image.len() {
                return Err(VMError::MissingHalt);
            }

            // fetch, then advance PC before executing
            let ins = image[at];
            ctx.set_pc(at + 1);

            let halted = self.step(image, ctx, ins, input, output)?;

            if self.trace {
                eprintln!(
                    "{:>3} {:>3} {:>3} {:>3} {:>3} {:>4} {:>3} {:>3} {}",
                    at,
                    ins.op.mnemonic(),
                    ins.r,
                    ins.l,
                    ins.m,
                    ctx.pc(),
                    ctx.bp(),
                    ctx.sp(),
                    ctx.format_stack()
                );
            }

            if halted {
                return Ok(());
            }
        }
    }

    /// Execute one instruction; returns true when the machine halts
    fn step<R: BufRead, W: Write>(
        &self,
        image: &[Instruction],
        ctx: &mut ExecutionContext,
        ins: Instruction,
        input: &mut R,
        output: &mut W,
    ) -> VMResult<bool> {
        match ins.op {
            OpCode::Lit => {
                ctx.set_register(ins.r, ins.m)?;
            }

            OpCode::Rtn => {
                let frame = ctx.bp() - 1;
                let caller_bp = ctx.stack_read(frame + 3)?;
                let return_address = ctx.stack_read(frame + 4)?;
                ctx.set_sp(frame)?;
                ctx.set_bp(caller_bp);
                ctx.set_pc(jump_target(image, return_address)?);
            }

            OpCode::Lod => {
                let address = ctx.base(ins.l)? + ins.m;
                let value = ctx.stack_read(address)?;
                ctx.set_register(ins.r, value)?;
            }

            OpCode::Sto => {
                let address = ctx.base(ins.l)? + ins.m;
                let value = ctx.register(ins.r)?;
                ctx.stack_write(address, value)?;
            }

            OpCode::Cal => {
                let sp = ctx.sp();
                if (sp + 4) as usize >= MAX_STACK_HEIGHT {
                    return Err(VMError::StackOverflow(sp + 4));
                }
                ctx.stack_write(sp + 1, 0)?; // reserved return value
                ctx.stack_write(sp + 2, ctx.base(ins.l)?)?; // static link
                ctx.stack_write(sp + 3, ctx.bp())?; // dynamic link
                ctx.stack_write(sp + 4, ctx.pc() as i32)?; // return address
                ctx.set_bp(sp + 1);
                ctx.set_pc(jump_target(image, ins.m)?);
            }

            OpCode::Inc => {
                ctx.set_sp(ctx.sp() + ins.m)?;
            }

            OpCode::Jmp => {
                ctx.set_pc(jump_target(image, ins.m)?);
            }

            OpCode::Jpc => {
                if ctx.register(ins.r)? == 0 {
                    ctx.set_pc(jump_target(image, ins.m)?);
                }
            }

            OpCode::SioWrite => {
                let value = ctx.register(ins.r)?;
                write!(output, "{}", value)?;
            }

            OpCode::SioRead => {
                let value = read_integer(input)?;
                ctx.set_register(ins.r, value)?;
            }

            OpCode::SioHalt => {
                return Ok(true);
            }

            OpCode::Neg => {
                let value = ctx.register(ins.l)?;
                ctx.set_register(ins.r, value.wrapping_neg())?;
            }

            OpCode::Add => self.binary(ctx, ins, i32::wrapping_add)?,
            OpCode::Sub => self.binary(ctx, ins, i32::wrapping_sub)?,
            OpCode::Mul => self.binary(ctx, ins, i32::wrapping_mul)?,

            OpCode::Div => {
                let lhs = ctx.register(ins.l)?;
                let rhs = ctx.register(ins.m)?;
                if rhs == 0 {
                    return Err(VMError::DivisionByZero);
                }
                ctx.set_register(ins.r, lhs.wrapping_div(rhs))?;
            }

            OpCode::Odd => {
                let value = ctx.register(ins.r)?;
                ctx.set_register(ins.r, value % 2)?;
            }

            OpCode::Mod => {
                let lhs = ctx.register(ins.l)?;
                let rhs = ctx.register(ins.m)?;
                if rhs == 0 {
                    return Err(VMError::DivisionByZero);
                }
                ctx.set_register(ins.r, lhs.wrapping_rem(rhs))?;
            }

            OpCode::Eql => self.compare(ctx, ins, |a, b| a == b)?,
            OpCode::Neq => self.compare(ctx, ins, |a, b| a != b)?,
            OpCode::Lss => self.compare(ctx, ins, |a, b| a < b)?,
            OpCode::Leq => self.compare(ctx, ins, |a, b| a <= b)?,
            OpCode::Gtr => self.compare(ctx, ins, |a, b| a > b)?,
            OpCode::Geq => self.compare(ctx, ins, |a, b| a >= b)?,
        }

        Ok(false)
    }

    fn binary(
        &self,
        ctx: &mut ExecutionContext,
        ins: Instruction,
        op: fn(i32, i32) -> i32,
    ) -> VMResult<()> {
        let lhs = ctx.register(ins.l)?;
        let rhs = ctx.register(ins.m)?;
        ctx.set_register(ins.r, op(lhs, rhs))
    }

    fn compare(
        &self,
        ctx: &mut ExecutionContext,
        ins: Instruction,
        op: fn(i32, i32) -> bool,
    ) -> VMResult<()> {
        let lhs = ctx.register(ins.l)?;
        let rhs = ctx.register(ins.m)?;
        ctx.set_register(ins.r, op(lhs, rhs) as i32)
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

/// Run an instruction image against the given streams
///
/// Convenience wrapper that owns the machine state for the duration of
/// the run.
pub fn run<R: BufRead, W: Write>(
    image: &[Instruction],
    input: &mut R,
    output: &mut W,
) -> VMResult<()> {
    let mut ctx = ExecutionContext::new();
    VM::new().execute(image, &mut ctx, input, output)
}

/// Validate a code address before loading it into PC
///
/// PC == image length is allowed transiently; the next fetch reports it.
fn jump_target(image: &[Instruction], m: i32) -> VMResult<usize> {
    if m < 0 || m as usize > image.len() {
        return Err(VMError::InvalidProgramCounter(m));
    }
    Ok(m as usize)
}

/// Parse a decimal integer from the input stream, skipping leading
/// whitespace
fn read_integer<R: BufRead>(input: &mut R) -> VMResult<i32> {
    // skip whitespace
    loop {
        let buf = input.fill_buf()?;
        if buf.is_empty() {
            return Err(VMError::UnexpectedEndOfInput);
        }
        let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        let more = skip == buf.len();
        input.consume(skip);
        if !more {
            break;
        }
    }

    let mut text = String::new();
    let buf = input.fill_buf()?;
    if buf.first() == Some(&b'-') {
        text.push('-');
        input.consume(1);
    }

    loop {
        let buf = input.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        let digits = buf.iter().take_while(|b| b.is_ascii_digit()).count();
        text.extend(buf[..digits].iter().map(|&b| b as char));
        let more = digits == buf.len();
        input.consume(digits);
        if !more {
            break;
        }
    }

    text.parse()
        .map_err(|_| VMError::InvalidInput(text.clone()))
}
