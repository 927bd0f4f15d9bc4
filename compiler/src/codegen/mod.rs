use crate::lexer::{Token, TokenType};
use crate::parser::ParseError;
use crate::symbols::{Symbol, SymbolId, SymbolKind, SymbolTable};
use pzero::bytecode::{Instruction, OpCode, MAX_CODE_LENGTH};
use pzero::vm::REGISTER_FILE_SIZE;
use thiserror::Error;

/// Errors surfaced by the code generator
///
/// Syntax errors reuse the parser's numbered codes; the semantic variants
/// 16 and 17 extend that table. The remaining variants have no historical
/// number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("assignment to constant or procedure not allowed")]
    AssignmentToNonVariable, // 16

    #[error("call of a constant or variable not allowed")]
    CallOfNonProcedure, // 17

    #[error("undeclared identifier '{0}'")]
    Undeclared(String),

    #[error("procedure '{0}' used as a value")]
    ProcedureAsValue(String),

    #[error("expression exceeds the {REGISTER_FILE_SIZE}-register file")]
    RegisterOverflow,

    #[error("program exceeds {MAX_CODE_LENGTH} instructions")]
    CodeTooLong,
}

impl CodegenError {
    /// Stable numeric error code, where one exists
    pub fn code(&self) -> Option<u8> {
        match self {
            CodegenError::Syntax(err) => Some(err.code()),
            CodegenError::AssignmentToNonVariable => Some(16),
            CodegenError::CallOfNonProcedure => Some(17),
            _ => None,
        }
    }
}

/// The parser skeleton re-walked with side effects: declarations feed the
/// symbol table, statements and expressions emit instructions, forward
/// jumps are backpatched once their targets are known.
///
/// Expressions evaluate on a register stack: the cursor counts live
/// registers, a factor loads into the next free register, and a binary
/// operator combines the top two into the lower one.
pub struct CodeGenerator {
    tokens: Vec<Token>,
    current: usize,
    level: u32,
    scope: Option<SymbolId>,
    symbols: SymbolTable,
    code: Vec<Instruction>,
    reg: i32,
}

const NULL_TOKEN: TokenType = TokenType::Null;

impl CodeGenerator {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            level: 0,
            scope: None,
            symbols: SymbolTable::new(),
            code: Vec::new(),
            reg: 0,
        }
    }

    /// Parse the token stream and produce the instruction image
    pub fn generate(mut self) -> Result<Vec<Instruction>, CodegenError> {
        self.program()?;
        Ok(self.code)
    }

    // program = block "."
    fn program(&mut self) -> Result<(), CodegenError> {
        self.block()?;
        if !self.check(&TokenType::Period) {
            return Err(ParseError::PeriodExpected.into());
        }
        self.advance();
        self.emit(OpCode::SioHalt, 0, 0, 3)?;
        Ok(())
    }

    fn block(&mut self) -> Result<(), CodegenError> {
        self.const_declaration()?;
        self.var_declaration()?;
        self.proc_declaration()?;
        self.statement()
    }

    fn const_declaration(&mut self) -> Result<(), CodegenError> {
        if !self.check(&TokenType::Const) {
            return Ok(());
        }
        self.advance();

        loop {
            let name = match self.peek() {
                TokenType::Ident(name) => name.clone(),
                _ => return Err(ParseError::IdentExpected.into()),
            };
            self.advance();

            if !self.check(&TokenType::Eq) {
                return Err(ParseError::EqExpected.into());
            }
            self.advance();

            let value = match self.peek() {
                TokenType::Number(value) => *value,
                _ => return Err(ParseError::NumberExpected.into()),
            };
            self.advance();

            self.symbols.add(Symbol {
                name,
                kind: SymbolKind::Const,
                level: self.level,
                value,
                address: 0,
                scope: self.scope,
            });

            if self.check(&TokenType::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        if !self.check(&TokenType::Semicolon) {
            return Err(ParseError::SemicolonOrCommaMissing.into());
        }
        self.advance();
        Ok(())
    }

    fn var_declaration(&mut self) -> Result<(), CodegenError> {
        if !self.check(&TokenType::Var) {
            return Ok(());
        }
        self.advance();

        // A procedure's prologue has already reserved the four control
        // words of its activation record; the outermost block has no
        // prologue, so reserve them here before the first local.
        if self.level == 0 {
            self.emit(OpCode::Inc, 0, 0, 4)?;
        }

        // locals sit above ret/SL/DL/RA, starting at offset 4
        let mut address = 4;
        loop {
            let name = match self.peek() {
                TokenType::Ident(name) => name.clone(),
                _ => return Err(ParseError::IdentExpected.into()),
            };
            self.advance();

            self.symbols.add(Symbol {
                name,
                kind: SymbolKind::Var,
                level: self.level,
                value: 0,
                address,
                scope: self.scope,
            });
            address += 1;
            self.emit(OpCode::Inc, 0, 0, 1)?;

            if self.check(&TokenType::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        if !self.check(&TokenType::Semicolon) {
            return Err(ParseError::SemicolonOrCommaMissing.into());
        }
        self.advance();
        Ok(())
    }

    fn proc_declaration(&mut self) -> Result<(), CodegenError> {
        while self.check(&TokenType::Procedure) {
            self.advance();

            let name = match self.peek() {
                TokenType::Ident(name) => name.clone(),
                _ => return Err(ParseError::IdentExpected.into()),
            };
            self.advance();

            let id = self.symbols.add(Symbol {
                name,
                kind: SymbolKind::Proc,
                level: self.level,
                value: 0,
                address: 0,
                scope: self.scope,
            });

            if !self.check(&TokenType::Semicolon) {
                return Err(ParseError::SemicolonMissing.into());
            }
            self.advance();

            // jump over the body; the target is patched after it ends
            let jump_ref = self.emit(OpCode::Jmp, 0, 0, 0)?;
            let entry = self.emit(OpCode::Inc, 0, 0, 4)?;
            self.symbols.get_mut(id).address = entry as i32;

            let enclosing = self.scope;
            self.scope = Some(id);
            self.level += 1;
            self.block()?;
            self.level -= 1;
            self.scope = enclosing;

            self.emit(OpCode::Rtn, 0, 0, 0)?;
            self.code[jump_ref].m = self.code.len() as i32;

            if !self.check(&TokenType::Semicolon) {
                return Err(ParseError::SemicolonMissing.into());
            }
            self.advance();
        }
        Ok(())
    }

    fn statement(&mut self) -> Result<(), CodegenError> {
        match self.peek() {
            TokenType::Ident(name) => {
                // resolve the target before consuming it; the RHS moves
                // the cursor well past this token
                let name = name.clone();
                let id = self.resolve(&name)?;
                let target = self.symbols.get(id).clone();
                if target.kind != SymbolKind::Var {
                    return Err(CodegenError::AssignmentToNonVariable);
                }
                self.advance();

                if !self.check(&TokenType::Becomes) {
                    return Err(ParseError::BecomesExpected.into());
                }
                self.advance();

                self.expression()?;
                let delta = self.level_delta(target.level);
                self.emit(OpCode::Sto, self.reg - 1, delta, target.address)?;
                self.reg -= 1;
                Ok(())
            }

            TokenType::Call => {
                self.advance();
                let name = match self.peek() {
                    TokenType::Ident(name) => name.clone(),
                    _ => return Err(ParseError::CallIdentExpected.into()),
                };
                let id = self.resolve(&name)?;
                let target = self.symbols.get(id).clone();
                if target.kind != SymbolKind::Proc {
                    return Err(CodegenError::CallOfNonProcedure);
                }
                let delta = self.level_delta(target.level);
                self.emit(OpCode::Cal, 0, delta, target.address)?;
                self.advance();
                Ok(())
            }

            TokenType::Begin => {
                self.advance();
                self.statement()?;
                while self.check(&TokenType::Semicolon) {
                    self.advance();
                    self.statement()?;
                }
                if !self.check(&TokenType::End) {
                    return Err(ParseError::SemicolonOrEndExpected.into());
                }
                self.advance();
                Ok(())
            }

            TokenType::If => {
                self.advance();
                self.condition()?;
                if !self.check(&TokenType::Then) {
                    return Err(ParseError::ThenExpected.into());
                }
                self.advance();

                let jpc_ref = self.emit(OpCode::Jpc, self.reg - 1, 0, 0)?;
                self.reg -= 1;

                self.statement()?;

                if self.check(&TokenType::Else) {
                    self.advance();
                    let jmp_ref = self.emit(OpCode::Jmp, 0, 0, 0)?;
                    self.code[jpc_ref].m = self.code.len() as i32;
                    self.statement()?;
                    self.code[jmp_ref].m = self.code.len() as i32;
                } else {
                    self.code[jpc_ref].m = self.code.len() as i32;
                }
                Ok(())
            }

            TokenType::While => {
                self.advance();
                let top = self.code.len() as i32;
                self.condition()?;

                let jpc_ref = self.emit(OpCode::Jpc, self.reg - 1, 0, 0)?;
                self.reg -= 1;

                if !self.check(&TokenType::Do) {
                    return Err(ParseError::DoExpected.into());
                }
                self.advance();

                self.statement()?;
                self.emit(OpCode::Jmp, 0, 0, top)?;
                self.code[jpc_ref].m = self.code.len() as i32;
                Ok(())
            }

            TokenType::Read => {
                self.advance();
                let name = match self.peek() {
                    TokenType::Ident(name) => name.clone(),
                    _ => return Err(ParseError::IdentExpected.into()),
                };
                let id = self.resolve(&name)?;
                let target = self.symbols.get(id).clone();
                if target.kind != SymbolKind::Var {
                    return Err(CodegenError::AssignmentToNonVariable);
                }
                let r = self.alloc_reg()?;
                self.emit(OpCode::SioRead, r, 0, 2)?;
                let delta = self.level_delta(target.level);
                self.emit(OpCode::Sto, r, delta, target.address)?;
                self.reg -= 1;
                self.advance();
                Ok(())
            }

            TokenType::Write => {
                self.advance();
                let name = match self.peek() {
                    TokenType::Ident(name) => name.clone(),
                    _ => return Err(ParseError::IdentExpected.into()),
                };
                self.load_ident(&name)?;
                self.emit(OpCode::SioWrite, self.reg - 1, 0, 1)?;
                self.reg -= 1;
                self.advance();
                Ok(())
            }

            _ => Ok(()),
        }
    }

    fn condition(&mut self) -> Result<(), CodegenError> {
        if self.check(&TokenType::Odd) {
            self.advance();
            self.expression()?;
            self.emit(OpCode::Odd, self.reg - 1, 0, 0)?;
            return Ok(());
        }

        self.expression()?;

        let op = match self.peek() {
            TokenType::Eq => OpCode::Eql,
            TokenType::Neq => OpCode::Neq,
            TokenType::Less => OpCode::Lss,
            TokenType::Leq => OpCode::Leq,
            TokenType::Gtr => OpCode::Gtr,
            TokenType::Geq => OpCode::Geq,
            _ => return Err(ParseError::RelopExpected.into()),
        };
        self.advance();

        self.expression()?;
        self.emit(op, self.reg - 2, self.reg - 2, self.reg - 1)?;
        self.reg -= 1;
        Ok(())
    }

    fn expression(&mut self) -> Result<(), CodegenError> {
        let mut negate = false;
        if self.check(&TokenType::Plus) || self.check(&TokenType::Minus) {
            negate = self.check(&TokenType::Minus);
            self.advance();
        }

        self.term()?;
        if negate {
            self.emit(OpCode::Neg, self.reg - 1, self.reg - 1, 0)?;
        }

        loop {
            let op = match self.peek() {
                TokenType::Plus => OpCode::Add,
                TokenType::Minus => OpCode::Sub,
                _ => break,
            };
            self.advance();
            self.term()?;
            self.emit(op, self.reg - 2, self.reg - 2, self.reg - 1)?;
            self.reg -= 1;
        }
        Ok(())
    }

    fn term(&mut self) -> Result<(), CodegenError> {
        self.factor()?;
        loop {
            let op = match self.peek() {
                TokenType::Mult => OpCode::Mul,
                TokenType::Slash => OpCode::Div,
                _ => break,
            };
            self.advance();
            self.factor()?;
            self.emit(op, self.reg - 2, self.reg - 2, self.reg - 1)?;
            self.reg -= 1;
        }
        Ok(())
    }

    fn factor(&mut self) -> Result<(), CodegenError> {
        match self.peek() {
            TokenType::Ident(name) => {
                let name = name.clone();
                self.load_ident(&name)?;
                self.advance();
                Ok(())
            }
            TokenType::Number(value) => {
                let value = *value;
                let r = self.alloc_reg()?;
                self.emit(OpCode::Lit, r, 0, value)?;
                self.advance();
                Ok(())
            }
            TokenType::LParen => {
                self.advance();
                self.expression()?;
                if !self.check(&TokenType::RParen) {
                    return Err(ParseError::RParenMissing.into());
                }
                self.advance();
                Ok(())
            }
            _ => Err(ParseError::BadFactor.into()),
        }
    }

    /// Load a VAR or CONST identifier into the next free register
    fn load_ident(&mut self, name: &str) -> Result<(), CodegenError> {
        let id = self.resolve(name)?;
        let symbol = self.symbols.get(id).clone();
        match symbol.kind {
            SymbolKind::Var => {
                let r = self.alloc_reg()?;
                let delta = self.level_delta(symbol.level);
                self.emit(OpCode::Lod, r, delta, symbol.address)?;
            }
            SymbolKind::Const => {
                let r = self.alloc_reg()?;
                self.emit(OpCode::Lit, r, 0, symbol.value)?;
            }
            SymbolKind::Proc => {
                return Err(CodegenError::ProcedureAsValue(name.to_string()));
            }
        }
        Ok(())
    }

    // Helper methods

    fn resolve(&self, name: &str) -> Result<SymbolId, CodegenError> {
        self.symbols
            .find(self.scope, name)
            .ok_or_else(|| CodegenError::Undeclared(name.to_string()))
    }

    /// Static-link distance from the current level to a declaration
    fn level_delta(&self, declared: u32) -> i32 {
        self.level.saturating_sub(declared) as i32
    }

    fn emit(&mut self, op: OpCode, r: i32, l: i32, m: i32) -> Result<usize, CodegenError> {
        if self.code.len() == MAX_CODE_LENGTH {
            return Err(CodegenError::CodeTooLong);
        }
        self.code.push(Instruction::new(op, r, l, m));
        Ok(self.code.len() - 1)
    }

    fn alloc_reg(&mut self) -> Result<i32, CodegenError> {
        if self.reg as usize == REGISTER_FILE_SIZE {
            return Err(CodegenError::RegisterOverflow);
        }
        let r = self.reg;
        self.reg += 1;
        Ok(r)
    }

    fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token_type)
    }

    fn peek(&self) -> &TokenType {
        match self.tokens.get(self.current) {
            Some(token) => &token.token_type,
            None => &NULL_TOKEN,
        }
    }

    fn advance(&mut self) {
        if self.current < self.tokens.len() {
            self.current += 1;
        }
    }
}

/// Parse a token stream and emit its instruction image
pub fn codegen(tokens: Vec<Token>) -> Result<Vec<Instruction>, CodegenError> {
    CodeGenerator::new(tokens).generate()
}
