mod config;

pub use config::RuntimeConfig;

use crate::bytecode::{dump_listing, parse_image};
use crate::vm::{ExecutionContext, VM};
use anyhow::{Context, Result};
use std::io::{self, BufReader};
use std::path::Path;

/// File-level driver: load an instruction file and execute it against
/// the process's stdin/stdout
pub struct Runtime {
    config: RuntimeConfig,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self { config }
    }

    /// Read the instruction file at `path` and run it to completion
    pub fn execute_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let image = parse_image(&source)
            .with_context(|| format!("invalid instruction file {}", path.display()))?;

        if self.config.list_code {
            eprintln!("{}", dump_listing(&image));
        }

        let mut ctx = ExecutionContext::new();
        let stdin = io::stdin();
        let mut input = BufReader::new(stdin.lock());
        let mut output = io::stdout();
        VM::new()
            .with_trace(self.config.trace)
            .execute(&image, &mut ctx, &mut input, &mut output)
            .context("execution failed")?;
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
