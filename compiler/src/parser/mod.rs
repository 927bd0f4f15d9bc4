use crate::lexer::{Token, TokenType};
use thiserror::Error;

/// Numbered syntax errors shared by the parser and the code generator
///
/// The numeric codes are part of the external contract; `code()` returns
/// them for diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("'=' must be followed by a number")]
    NumberExpected, // 1

    #[error("identifier must be followed by '='")]
    EqExpected, // 2

    #[error("const/var/procedure/read/write must be followed by identifier")]
    IdentExpected, // 3

    #[error("semicolon or comma missing")]
    SemicolonOrCommaMissing, // 4

    #[error("semicolon missing")]
    SemicolonMissing, // 5

    #[error("period expected")]
    PeriodExpected, // 6

    #[error("assignment operator expected")]
    BecomesExpected, // 7

    #[error("'call' must be followed by identifier")]
    CallIdentExpected, // 8

    #[error("'then' expected")]
    ThenExpected, // 9

    #[error("semicolon or 'end' expected")]
    SemicolonOrEndExpected, // 10

    #[error("'do' expected")]
    DoExpected, // 11

    #[error("relational operator expected")]
    RelopExpected, // 12

    #[error("right parenthesis missing")]
    RParenMissing, // 13

    #[error("factor cannot begin with this symbol")]
    BadFactor, // 14
}

impl ParseError {
    /// Stable numeric error code
    pub fn code(&self) -> u8 {
        match self {
            ParseError::NumberExpected => 1,
            ParseError::EqExpected => 2,
            ParseError::IdentExpected => 3,
            ParseError::SemicolonOrCommaMissing => 4,
            ParseError::SemicolonMissing => 5,
            ParseError::PeriodExpected => 6,
            ParseError::BecomesExpected => 7,
            ParseError::CallIdentExpected => 8,
            ParseError::ThenExpected => 9,
            ParseError::SemicolonOrEndExpected => 10,
            ParseError::DoExpected => 11,
            ParseError::RelopExpected => 12,
            ParseError::RParenMissing => 13,
            ParseError::BadFactor => 14,
        }
    }
}

/// Recursive-descent validation of the grammar, one routine per
/// non-terminal. No symbols are collected and no code is produced; the
/// code generator re-walks the same skeleton with those side effects.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

const NULL_TOKEN: TokenType = TokenType::Null;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<(), ParseError> {
        self.program()
    }

    // program = block "."
    fn program(&mut self) -> Result<(), ParseError> {
        self.block()?;
        if !self.check(&TokenType::Period) {
            return Err(ParseError::PeriodExpected);
        }
        self.advance();
        Ok(())
    }

    // block = [const-decl] [var-decl] {proc-decl} statement
    fn block(&mut self) -> Result<(), ParseError> {
        self.const_declaration()?;
        self.var_declaration()?;
        self.proc_declaration()?;
        self.statement()
    }

    // const-decl = "const" ident "=" number {"," ident "=" number} ";"
    fn const_declaration(&mut self) -> Result<(), ParseError> {
        if !self.check(&TokenType::Const) {
            return Ok(());
        }
        self.advance();

        loop {
            if !matches!(self.peek(), TokenType::Ident(_)) {
                return Err(ParseError::IdentExpected);
            }
            self.advance();

            if !self.check(&TokenType::Eq) {
                return Err(ParseError::EqExpected);
            }
            self.advance();

            if !matches!(self.peek(), TokenType::Number(_)) {
                return Err(ParseError::NumberExpected);
            }
            self.advance();

            if self.check(&TokenType::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        if !self.check(&TokenType::Semicolon) {
            return Err(ParseError::SemicolonOrCommaMissing);
        }
        self.advance();
        Ok(())
    }

    // var-decl = "var" ident {"," ident} ";"
    fn var_declaration(&mut self) -> Result<(), ParseError> {
        if !self.check(&TokenType::Var) {
            return Ok(());
        }
        self.advance();

        loop {
            if !matches!(self.peek(), TokenType::Ident(_)) {
                return Err(ParseError::IdentExpected);
            }
            self.advance();

            if self.check(&TokenType::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        if !self.check(&TokenType::Semicolon) {
            return Err(ParseError::SemicolonOrCommaMissing);
        }
        self.advance();
        Ok(())
    }

    // proc-decl = {"procedure" ident ";" block ";"}
    fn proc_declaration(&mut self) -> Result<(), ParseError> {
        while self.check(&TokenType::Procedure) {
            self.advance();

            if !matches!(self.peek(), TokenType::Ident(_)) {
                return Err(ParseError::IdentExpected);
            }
            self.advance();

            if !self.check(&TokenType::Semicolon) {
                return Err(ParseError::SemicolonMissing);
            }
            self.advance();

            self.block()?;

            if !self.check(&TokenType::Semicolon) {
                return Err(ParseError::SemicolonMissing);
            }
            self.advance();
        }
        Ok(())
    }

    // statement is optional; an empty statement parses successfully
    fn statement(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            TokenType::Ident(_) => {
                self.advance();
                if !self.check(&TokenType::Becomes) {
                    return Err(ParseError::BecomesExpected);
                }
                self.advance();
                self.expression()
            }

            TokenType::Call => {
                self.advance();
                if !matches!(self.peek(), TokenType::Ident(_)) {
                    return Err(ParseError::CallIdentExpected);
                }
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
                    return Err(ParseError::SemicolonOrEndExpected);
                }
                self.advance();
                Ok(())
            }

            TokenType::If => {
                self.advance();
                self.condition()?;
                if !self.check(&TokenType::Then) {
                    return Err(ParseError::ThenExpected);
                }
                self.advance();
                self.statement()?;
                if self.check(&TokenType::Else) {
                    self.advance();
                    self.statement()?;
                }
                Ok(())
            }

            TokenType::While => {
                self.advance();
                self.condition()?;
                if !self.check(&TokenType::Do) {
                    return Err(ParseError::DoExpected);
                }
                self.advance();
                self.statement()
            }

            TokenType::Read | TokenType::Write => {
                self.advance();
                if !matches!(self.peek(), TokenType::Ident(_)) {
                    return Err(ParseError::IdentExpected);
                }
                self.advance();
                Ok(())
            }

            _ => Ok(()),
        }
    }

    // condition = "odd" expression | expression relop expression
    fn condition(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenType::Odd) {
            self.advance();
            return self.expression();
        }

        self.expression()?;

        match self.peek() {
            TokenType::Eq
            | TokenType::Neq
            | TokenType::Less
            | TokenType::Leq
            | TokenType::Gtr
            | TokenType::Geq => {
                self.advance();
            }
            _ => return Err(ParseError::RelopExpected),
        }

        self.expression()
    }

    // expression = ["+"|"-"] term {("+"|"-") term}
    fn expression(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenType::Plus) || self.check(&TokenType::Minus) {
            self.advance();
        }
        self.term()?;

        while self.check(&TokenType::Plus) || self.check(&TokenType::Minus) {
            self.advance();
            self.term()?;
        }
        Ok(())
    }

    // term = factor {("*"|"/") factor}
    fn term(&mut self) -> Result<(), ParseError> {
        self.factor()?;
        while self.check(&TokenType::Mult) || self.check(&TokenType::Slash) {
            self.advance();
            self.factor()?;
        }
        Ok(())
    }

    // factor = ident | number | "(" expression ")"
    fn factor(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            TokenType::Ident(_) | TokenType::Number(_) => {
                self.advance();
                Ok(())
            }
            TokenType::LParen => {
                self.advance();
                self.expression()?;
                if !self.check(&TokenType::RParen) {
                    return Err(ParseError::RParenMissing);
                }
                self.advance();
                Ok(())
            }
            _ => Err(ParseError::BadFactor),
        }
    }

    // Helper methods

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

/// Validate a token stream against the grammar
pub fn parse(tokens: Vec<Token>) -> Result<(), ParseError> {
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_source(source: &str) -> Result<(), ParseError> {
        parse(lex(source).unwrap())
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(parse_source("."), Ok(()));
    }

    #[test]
    fn test_declarations_and_assignment() {
        assert_eq!(
            parse_source("const a = 3, b = 4; var x, y; begin x := a + b end."),
            Ok(())
        );
    }

    #[test]
    fn test_nested_procedures() {
        let source = "\
var x;\n\
procedure outer;\n\
  var y;\n\
  procedure inner;\n\
  begin y := 1 end;\n\
begin call inner end;\n\
begin call outer end.";
        assert_eq!(parse_source(source), Ok(()));
    }

    #[test]
    fn test_if_then_else_and_while() {
        let source = "\
var x;\n\
begin\n\
  x := 0;\n\
  while x < 10 do\n\
    if odd x then x := x + 1 else x := x + 2;\n\
  read x;\n\
  write x\n\
end.";
        assert_eq!(parse_source(source), Ok(()));
    }

    #[test]
    fn test_parenthesized_expressions() {
        assert_eq!(parse_source("var x; begin x := (1 + 2) * -3 end."), Ok(()));
    }

    #[test]
    fn test_missing_number_after_eq() {
        assert_eq!(
            parse_source("const a = ;."),
            Err(ParseError::NumberExpected)
        );
    }

    #[test]
    fn test_missing_eq_after_ident() {
        assert_eq!(parse_source("const a 3;."), Err(ParseError::EqExpected));
    }

    #[test]
    fn test_missing_ident_after_var() {
        assert_eq!(parse_source("var ;."), Err(ParseError::IdentExpected));
    }

    #[test]
    fn test_missing_comma_between_vars() {
        // two identifiers with no separator between them
        let err = parse_source("var x x;").unwrap_err();
        assert_eq!(err, ParseError::SemicolonOrCommaMissing);
        assert_eq!(err.code(), 4);
    }

    #[test]
    fn test_missing_semicolon_after_procedure_name() {
        assert_eq!(
            parse_source("procedure p begin end;."),
            Err(ParseError::SemicolonMissing)
        );
    }

    #[test]
    fn test_missing_period() {
        assert_eq!(
            parse_source("var x; begin x := 1 end"),
            Err(ParseError::PeriodExpected)
        );
    }

    #[test]
    fn test_missing_assignment_operator() {
        assert_eq!(
            parse_source("var x; begin x 1 end."),
            Err(ParseError::BecomesExpected)
        );
    }

    #[test]
    fn test_call_without_identifier() {
        assert_eq!(
            parse_source("begin call 3 end."),
            Err(ParseError::CallIdentExpected)
        );
    }

    #[test]
    fn test_missing_then() {
        assert_eq!(
            parse_source("var x; begin if x = 1 x := 2 end."),
            Err(ParseError::ThenExpected)
        );
    }

    #[test]
    fn test_missing_end() {
        assert_eq!(
            parse_source("var x; begin x := 1."),
            Err(ParseError::SemicolonOrEndExpected)
        );
    }

    #[test]
    fn test_missing_do() {
        assert_eq!(
            parse_source("var x; begin while x < 3 x := 1 end."),
            Err(ParseError::DoExpected)
        );
    }

    #[test]
    fn test_missing_relational_operator() {
        assert_eq!(
            parse_source("var x; begin if x 1 then x := 2 end."),
            Err(ParseError::RelopExpected)
        );
    }

    #[test]
    fn test_missing_right_parenthesis() {
        assert_eq!(
            parse_source("var x; begin x := (1 + 2 end."),
            Err(ParseError::RParenMissing)
        );
    }

    #[test]
    fn test_bad_factor() {
        assert_eq!(
            parse_source("var x; begin x := * 2 end."),
            Err(ParseError::BadFactor)
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ParseError::NumberExpected.code(), 1);
        assert_eq!(ParseError::PeriodExpected.code(), 6);
        assert_eq!(ParseError::RelopExpected.code(), 12);
        assert_eq!(ParseError::BadFactor.code(), 14);
    }
}
