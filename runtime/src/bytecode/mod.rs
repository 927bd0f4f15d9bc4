mod instruction;
mod opcode;
mod parser;

pub use instruction::Instruction;
pub use opcode::OpCode;
pub use parser::{dump_image, parse_image, ImageError};

use std::fmt::Write as _;

/// Maximum number of instructions in an image
pub const MAX_CODE_LENGTH: usize = 500;

/// Render an instruction image as a human-readable listing
///
/// One line per instruction: index, mnemonic, then the three operand
/// fields. Used by the execution trace and by the `compile` front end for
/// diagnostics.
pub fn dump_listing(image: &[Instruction]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>3} {:>3} {:>3} {:>3} {:>3}", "#", "OP", "R", "L", "M");
    for (i, ins) in image.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3} {:>3} {:>3} {:>3} {:>3}",
            i,
            ins.op.mnemonic(),
            ins.r,
            ins.l,
            ins.m
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_shows_index_and_mnemonic() {
        let image = vec![
            Instruction::new(OpCode::Inc, 0, 0, 4),
            Instruction::new(OpCode::SioHalt, 0, 0, 3),
        ];
        let listing = dump_listing(&image);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("inc"));
        assert!(lines[2].contains("sio"));
        assert!(lines[1].trim_start().starts_with('0'));
    }
}
