//! End-to-end runs of the full pipeline: source text through the lexer,
//! code generator and virtual machine.

use pzero::bytecode::{dump_image, parse_image, Instruction, OpCode};
use pzero::vm::{ExecutionContext, VM};
use pzero_lang::codegen::codegen;
use pzero_lang::lexer::{lex, LexerError, TokenType};
use pzero_lang::parser::parse;
use std::io::Cursor;

fn compile(source: &str) -> Vec<Instruction> {
    codegen(lex(source).unwrap()).unwrap()
}

fn run_source(source: &str, input: &str) -> (ExecutionContext, String) {
    let image = compile(source);
    let mut ctx = ExecutionContext::new();
    let mut input = Cursor::new(input.as_bytes().to_vec());
    let mut output = Vec::new();
    VM::new()
        .execute(&image, &mut ctx, &mut input, &mut output)
        .unwrap();
    (ctx, String::from_utf8(output).unwrap())
}

#[test]
fn empty_program_compiles_to_a_halt_and_stops() {
    let tokens = lex(".").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token_type, TokenType::Period);

    assert_eq!(parse(tokens.clone()), Ok(()));

    let image = codegen(tokens).unwrap();
    assert_eq!(image, vec![Instruction::new(OpCode::SioHalt, 0, 0, 3)]);

    let (ctx, output) = run_source(".", "");
    assert_eq!(output, "");
    assert_eq!(ctx.pc(), 1);
}

#[test]
fn const_arithmetic_lands_in_the_variable_slot() {
    let (ctx, output) = run_source("const a = 3; var b; begin b := a + 2 end.", "");
    assert_eq!(output, "");
    // b is the first local of the main frame: BP(1) + offset 4
    assert_eq!(ctx.stack()[5], 5);
}

#[test]
fn while_loop_runs_its_body_exactly_three_times() {
    let (ctx, _) = run_source("var i; begin i := 0; while i < 3 do i := i + 1 end.", "");
    assert_eq!(ctx.stack()[5], 3);

    // same loop with a write in the body: one digit per iteration
    let (_, output) = run_source(
        "var i; begin i := 0; while i < 3 do begin i := i + 1; write i end end.",
        "",
    );
    assert_eq!(output, "123");
}

#[test]
fn nested_procedure_updates_a_global_through_the_static_link() {
    let source = "\
var x;\n\
procedure p;\n\
begin x := x + 1 end;\n\
begin x := 10; call p; call p; write x end.";
    let (ctx, output) = run_source(source, "");
    assert_eq!(output, "12");
    assert_eq!(ctx.stack()[5], 12);
}

#[test]
fn twelve_letter_identifier_fails_at_line_zero() {
    assert_eq!(
        lex("abcdefghijkl"),
        Err(LexerError::NameTooLong { line: 0 })
    );
}

#[test]
fn missing_separator_between_variables_is_error_4() {
    let err = parse(lex("var x x;").unwrap()).unwrap_err();
    assert_eq!(err.code(), 4);
}

#[test]
fn read_feeds_write_through_the_register_file() {
    let (ctx, output) = run_source("var n; begin read n; write n end.", " 41 ");
    assert_eq!(output, "41");
    assert_eq!(ctx.stack()[5], 41);
}

#[test]
fn if_else_picks_the_right_arm() {
    let source = "\
var x, y;\n\
begin\n\
  read x;\n\
  if odd x then y := 1 else y := 2;\n\
  write y\n\
end.";
    let (_, odd_out) = run_source(source, "7");
    assert_eq!(odd_out, "1");
    let (_, even_out) = run_source(source, "8");
    assert_eq!(even_out, "2");
}

#[test]
fn compiled_image_survives_the_file_format_round_trip() {
    let source = "\
var x;\n\
procedure p;\n\
begin x := x + 1 end;\n\
begin x := 10; call p; write x end.";
    let image = compile(source);

    let text = dump_image(&image);
    let reread = parse_image(&text).unwrap();
    assert_eq!(reread, image);
    // and the text itself is stable
    assert_eq!(dump_image(&reread), text);
}

#[test]
fn division_by_zero_halts_the_machine_with_an_error() {
    let image = compile("var x; begin x := 1 / 0 end.");
    let mut ctx = ExecutionContext::new();
    let mut input = Cursor::new(Vec::new());
    let mut output = Vec::new();
    let result = VM::new().execute(&image, &mut ctx, &mut input, &mut output);
    assert_eq!(result, Err(pzero::VMError::DivisionByZero));
}

#[test]
fn deep_recursion_overflows_the_stack() {
    // p calls itself unconditionally; the VM must refuse to grow past
    // the stack limit rather than corrupt memory
    let source = "\
procedure p;\n\
begin call p end;\n\
call p.";
    let image = compile(source);
    let mut ctx = ExecutionContext::new();
    let mut input = Cursor::new(Vec::new());
    let mut output = Vec::new();
    let result = VM::new().execute(&image, &mut ctx, &mut input, &mut output);
    assert!(matches!(result, Err(pzero::VMError::StackOverflow(_))));
}

#[test]
fn every_jump_in_a_compiled_image_stays_inside_it() {
    let source = "\
var a, b;\n\
procedure q;\n\
begin\n\
  if a < b then a := a + 1 else b := b - 1;\n\
  while odd a do a := a - 1\n\
end;\n\
begin a := 9; b := 3; call q; write a; write b end.";
    let image = compile(source);
    for ins in &image {
        match ins.op {
            OpCode::Jmp | OpCode::Jpc | OpCode::Cal => {
                assert!(ins.m >= 0 && (ins.m as usize) < image.len());
            }
            _ => {}
        }
    }
}
