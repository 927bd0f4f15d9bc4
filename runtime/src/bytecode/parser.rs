use crate::bytecode::{Instruction, OpCode, MAX_CODE_LENGTH};
use std::fmt::Write as _;
use thiserror::Error;

/// Errors produced while reading an instruction file
#[derive(Debug, Error, PartialEq)]
pub enum ImageError {
    #[error("Invalid opcode {0}")]
    InvalidOpcode(i32),

    #[error("Invalid operand '{0}'")]
    InvalidOperand(String),

    #[error("Truncated instruction: expected 4 fields, found {0}")]
    TruncatedInstruction(usize),

    #[error("Image exceeds {MAX_CODE_LENGTH} instructions")]
    TooManyInstructions,
}

/// Parse the plain-text instruction format: four whitespace-separated
/// decimal integers per instruction, read until end of input.
pub fn parse_image(source: &str) -> Result<Vec<Instruction>, ImageError> {
    let mut fields = source.split_whitespace().peekable();
    let mut image = Vec::new();

    while fields.peek().is_some() {
        let mut word = [0i32; 4];
        for (i, slot) in word.iter_mut().enumerate() {
            match fields.next() {
                Some(text) => {
                    *slot = text
                        .parse()
                        .map_err(|_| ImageError::InvalidOperand(text.to_string()))?;
                }
                None => return Err(ImageError::TruncatedInstruction(i)),
            }
        }

        let op = OpCode::from_code(word[0]).ok_or(ImageError::InvalidOpcode(word[0]))?;
        if image.len() == MAX_CODE_LENGTH {
            return Err(ImageError::TooManyInstructions);
        }
        image.push(Instruction::new(op, word[1], word[2], word[3]));
    }

    Ok(image)
}

/// Write an instruction image in the plain-text format, one instruction
/// per line.
pub fn dump_image(image: &[Instruction]) -> String {
    let mut out = String::new();
    for ins in image {
        let _ = writeln!(out, "{}", ins);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_image() {
        let image = parse_image("6 0 0 4\n11 0 0 3\n").unwrap();
        assert_eq!(image.len(), 2);
        assert_eq!(image[0], Instruction::new(OpCode::Inc, 0, 0, 4));
        assert_eq!(image[1], Instruction::new(OpCode::SioHalt, 0, 0, 3));
    }

    #[test]
    fn test_parse_tolerates_arbitrary_whitespace() {
        let image = parse_image("  1 0 0 5   11\t0 0 3").unwrap();
        assert_eq!(image.len(), 2);
        assert_eq!(image[0].op, OpCode::Lit);
        assert_eq!(image[0].m, 5);
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse_image("").unwrap(), Vec::new());
        assert_eq!(parse_image("  \n\t ").unwrap(), Vec::new());
    }

    #[test]
    fn test_parse_rejects_bad_opcode() {
        assert_eq!(parse_image("0 0 0 0"), Err(ImageError::InvalidOpcode(0)));
        assert_eq!(parse_image("25 0 0 0"), Err(ImageError::InvalidOpcode(25)));
    }

    #[test]
    fn test_parse_rejects_truncated_instruction() {
        assert_eq!(
            parse_image("11 0 0"),
            Err(ImageError::TruncatedInstruction(3))
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric_field() {
        assert_eq!(
            parse_image("11 0 0 x"),
            Err(ImageError::InvalidOperand("x".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_oversized_image() {
        let source = "7 0 0 0\n".repeat(MAX_CODE_LENGTH + 1);
        assert_eq!(parse_image(&source), Err(ImageError::TooManyInstructions));
    }

    #[test]
    fn test_dump_then_parse_round_trips() {
        let source = "1 0 0 3\n1 1 0 2\n13 0 0 1\n4 0 0 4\n11 0 0 3\n";
        let image = parse_image(source).unwrap();
        assert_eq!(dump_image(&image), source);
    }
}
