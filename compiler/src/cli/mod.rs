use crate::codegen::codegen;
use crate::lexer::lex;
use crate::parser::parse;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use pzero::bytecode::{dump_image, dump_listing};
use pzero::vm;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pzero-lang", version, about = "Compiler for the pzero language")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tokenize a source file and print the token stream
    Lex { input: PathBuf },

    /// Check a source file against the grammar
    Parse { input: PathBuf },

    /// Compile a source file to an instruction file
    Compile {
        input: PathBuf,
        /// Where to write the instruction image (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print a mnemonic listing instead of the numeric image
        #[arg(long)]
        list: bool,
    },

    /// Compile a source file and execute it immediately
    Run {
        input: PathBuf,
        /// Trace every executed instruction on stderr
        #[arg(long)]
        trace: bool,
    },
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, cli: Cli) -> Result<()> {
        match cli.command {
            Commands::Lex { input } => {
                let tokens = lex(&read_source(&input)?)?;
                for token in tokens {
                    println!("{:>2}  {}", token.token_type.id(), token.token_type);
                }
                Ok(())
            }

            Commands::Parse { input } => {
                parse(lex(&read_source(&input)?)?)
                    .map_err(|e| anyhow!("parse error [{}]: {}", e.code(), e))?;
                println!("parsing was successful");
                Ok(())
            }

            Commands::Compile {
                input,
                output,
                list,
            } => {
                let image = codegen(lex(&read_source(&input)?)?).map_err(|e| match e.code() {
                    Some(code) => anyhow!("codegen error [{}]: {}", code, e),
                    None => anyhow!("codegen error: {}", e),
                })?;

                let text = if list {
                    dump_listing(&image)
                } else {
                    dump_image(&image)
                };
                match output {
                    Some(path) => fs::write(&path, text)
                        .with_context(|| format!("failed to write {}", path.display()))?,
                    None => print!("{}", text),
                }
                Ok(())
            }

            Commands::Run { input, trace } => {
                let image = codegen(lex(&read_source(&input)?)?).map_err(|e| match e.code() {
                    Some(code) => anyhow!("codegen error [{}]: {}", code, e),
                    None => anyhow!("codegen error: {}", e),
                })?;

                let mut ctx = vm::ExecutionContext::new();
                let stdin = io::stdin();
                let mut input = BufReader::new(stdin.lock());
                let mut output = io::stdout();
                vm::VM::new()
                    .with_trace(trace)
                    .execute(&image, &mut ctx, &mut input, &mut output)
                    .context("execution failed")?;
                Ok(())
            }
        }
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
