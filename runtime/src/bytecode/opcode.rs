use serde::{Deserialize, Serialize};

/// Opcodes for the VM
///
/// The numeric values are part of the instruction file format and must not
/// be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpCode {
    // Register / control transfer
    Lit = 1,  // RF[r] <- m
    Rtn = 2,  // pop the current activation record
    Lod = 3,  // RF[r] <- stack[base(l) + m]
    Sto = 4,  // stack[base(l) + m] <- RF[r]
    Cal = 5,  // push activation record, jump to m
    Inc = 6,  // SP <- SP + m
    Jmp = 7,  // PC <- m
    Jpc = 8,  // if RF[r] == 0 then PC <- m

    // IO operations
    SioWrite = 9,  // print RF[r] as decimal
    SioRead = 10,  // read decimal integer into RF[r]
    SioHalt = 11,  // stop execution

    // Arithmetic operations
    Neg = 12, // RF[r] <- -RF[l]
    Add = 13, // RF[r] <- RF[l] + RF[m]
    Sub = 14, // RF[r] <- RF[l] - RF[m]
    Mul = 15, // RF[r] <- RF[l] * RF[m]
    Div = 16, // RF[r] <- RF[l] / RF[m]
    Odd = 17, // RF[r] <- RF[r] mod 2
    Mod = 18, // RF[r] <- RF[l] mod RF[m]

    // Comparison operations
    Eql = 19, // RF[r] <- RF[l] == RF[m]
    Neq = 20, // RF[r] <- RF[l] != RF[m]
    Lss = 21, // RF[r] <- RF[l] < RF[m]
    Leq = 22, // RF[r] <- RF[l] <= RF[m]
    Gtr = 23, // RF[r] <- RF[l] > RF[m]
    Geq = 24, // RF[r] <- RF[l] >= RF[m]
}

const LIT: i32 = OpCode::Lit as i32;
const RTN: i32 = OpCode::Rtn as i32;
const LOD: i32 = OpCode::Lod as i32;
const STO: i32 = OpCode::Sto as i32;
const CAL: i32 = OpCode::Cal as i32;
const INC: i32 = OpCode::Inc as i32;
const JMP: i32 = OpCode::Jmp as i32;
const JPC: i32 = OpCode::Jpc as i32;

const SIO_WRITE: i32 = OpCode::SioWrite as i32;
const SIO_READ: i32 = OpCode::SioRead as i32;
const SIO_HALT: i32 = OpCode::SioHalt as i32;

const NEG: i32 = OpCode::Neg as i32;
const ADD: i32 = OpCode::Add as i32;
const SUB: i32 = OpCode::Sub as i32;
const MUL: i32 = OpCode::Mul as i32;
const DIV: i32 = OpCode::Div as i32;
const ODD: i32 = OpCode::Odd as i32;
const MOD: i32 = OpCode::Mod as i32;

const EQL: i32 = OpCode::Eql as i32;
const NEQ: i32 = OpCode::Neq as i32;
const LSS: i32 = OpCode::Lss as i32;
const LEQ: i32 = OpCode::Leq as i32;
const GTR: i32 = OpCode::Gtr as i32;
const GEQ: i32 = OpCode::Geq as i32;

impl OpCode {
    /// Convert a numeric opcode from the instruction file format
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            LIT => Some(OpCode::Lit),
            RTN => Some(OpCode::Rtn),
            LOD => Some(OpCode::Lod),
            STO => Some(OpCode::Sto),
            CAL => Some(OpCode::Cal),
            INC => Some(OpCode::Inc),
            JMP => Some(OpCode::Jmp),
            JPC => Some(OpCode::Jpc),

            SIO_WRITE => Some(OpCode::SioWrite),
            SIO_READ => Some(OpCode::SioRead),
            SIO_HALT => Some(OpCode::SioHalt),

            NEG => Some(OpCode::Neg),
            ADD => Some(OpCode::Add),
            SUB => Some(OpCode::Sub),
            MUL => Some(OpCode::Mul),
            DIV => Some(OpCode::Div),
            ODD => Some(OpCode::Odd),
            MOD => Some(OpCode::Mod),

            EQL => Some(OpCode::Eql),
            NEQ => Some(OpCode::Neq),
            LSS => Some(OpCode::Lss),
            LEQ => Some(OpCode::Leq),
            GTR => Some(OpCode::Gtr),
            GEQ => Some(OpCode::Geq),

            _ => None,
        }
    }

    /// Convert an opcode to its file-format value
    pub fn to_code(&self) -> i32 {
        *self as i32
    }

    /// Lower-case mnemonic used in code listings
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Lit => "lit",
            OpCode::Rtn => "rtn",
            OpCode::Lod => "lod",
            OpCode::Sto => "sto",
            OpCode::Cal => "cal",
            OpCode::Inc => "inc",
            OpCode::Jmp => "jmp",
            OpCode::Jpc => "jpc",
            OpCode::SioWrite | OpCode::SioRead | OpCode::SioHalt => "sio",
            OpCode::Neg => "neg",
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Odd => "odd",
            OpCode::Mod => "mod",
            OpCode::Eql => "eql",
            OpCode::Neq => "neq",
            OpCode::Lss => "lss",
            OpCode::Leq => "leq",
            OpCode::Gtr => "gtr",
            OpCode::Geq => "geq",
        }
    }
}

impl From<OpCode> for i32 {
    fn from(opcode: OpCode) -> Self {
        opcode.to_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_code_values() {
        assert_eq!(OpCode::Lit.to_code(), 1);
        assert_eq!(OpCode::Rtn.to_code(), 2);
        assert_eq!(OpCode::Cal.to_code(), 5);
        assert_eq!(OpCode::Jpc.to_code(), 8);
        assert_eq!(OpCode::SioWrite.to_code(), 9);
        assert_eq!(OpCode::SioRead.to_code(), 10);
        assert_eq!(OpCode::SioHalt.to_code(), 11);
        assert_eq!(OpCode::Neg.to_code(), 12);
        assert_eq!(OpCode::Mod.to_code(), 18);
        assert_eq!(OpCode::Geq.to_code(), 24);
    }

    #[test]
    fn test_code_to_opcode_conversion() {
        assert_eq!(OpCode::from_code(1), Some(OpCode::Lit));
        assert_eq!(OpCode::from_code(11), Some(OpCode::SioHalt));
        assert_eq!(OpCode::from_code(16), Some(OpCode::Div));
        assert_eq!(OpCode::from_code(24), Some(OpCode::Geq));

        // 0 is the illegal opcode, 25 and up do not exist
        assert_eq!(OpCode::from_code(0), None);
        assert_eq!(OpCode::from_code(25), None);
        assert_eq!(OpCode::from_code(-1), None);
    }

    #[test]
    fn test_round_trip_conversion() {
        for code in 1..=24 {
            let opcode = OpCode::from_code(code).unwrap();
            assert_eq!(opcode.to_code(), code);
        }
    }

    #[test]
    fn test_sio_variants_share_mnemonic() {
        assert_eq!(OpCode::SioWrite.mnemonic(), "sio");
        assert_eq!(OpCode::SioRead.mnemonic(), "sio");
        assert_eq!(OpCode::SioHalt.mnemonic(), "sio");
        assert_eq!(OpCode::Lit.mnemonic(), "lit");
        assert_eq!(OpCode::Geq.mnemonic(), "geq");
    }
}
