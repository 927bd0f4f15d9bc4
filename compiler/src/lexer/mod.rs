use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest permitted identifier, in characters
pub const MAX_IDENT_LENGTH: usize = 11;

/// Longest permitted number literal, in digits
pub const MAX_NUMBER_LENGTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenType {
    // Literals and identifiers
    Ident(String),
    Number(i32),

    // Operators and punctuation
    Plus,      // +
    Minus,     // -
    Mult,      // *
    Slash,     // /
    Eq,        // =
    Neq,       // <>
    Less,      // <
    Leq,       // <=
    Gtr,       // >
    Geq,       // >=
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Semicolon, // ;
    Period,    // .
    Becomes,   // :=

    // Reserved words
    Odd,
    Begin,
    End,
    If,
    Then,
    Else,
    While,
    Do,
    Call,
    Const,
    Var,
    Procedure,
    Write,
    Read,

    // Sentinel returned when reading past the end of the stream
    Null,
}

/// Reserved words in table order; lookup is by linear scan
const RESERVED_WORDS: [(&str, TokenType); 14] = [
    ("begin", TokenType::Begin),
    ("end", TokenType::End),
    ("if", TokenType::If),
    ("then", TokenType::Then),
    ("while", TokenType::While),
    ("do", TokenType::Do),
    ("call", TokenType::Call),
    ("const", TokenType::Const),
    ("var", TokenType::Var),
    ("procedure", TokenType::Procedure),
    ("write", TokenType::Write),
    ("read", TokenType::Read),
    ("else", TokenType::Else),
    ("odd", TokenType::Odd),
];

impl TokenType {
    /// Stable numeric token id shared with the historical tool chain
    pub fn id(&self) -> u8 {
        match self {
            TokenType::Null => 1,
            TokenType::Ident(_) => 2,
            TokenType::Number(_) => 3,
            TokenType::Plus => 4,
            TokenType::Minus => 5,
            TokenType::Mult => 6,
            TokenType::Slash => 7,
            TokenType::Odd => 8,
            TokenType::Eq => 9,
            TokenType::Neq => 10,
            TokenType::Less => 11,
            TokenType::Leq => 12,
            TokenType::Gtr => 13,
            TokenType::Geq => 14,
            TokenType::LParen => 15,
            TokenType::RParen => 16,
            TokenType::Comma => 17,
            TokenType::Semicolon => 18,
            TokenType::Period => 19,
            TokenType::Becomes => 20,
            TokenType::Begin => 21,
            TokenType::End => 22,
            TokenType::If => 23,
            TokenType::Then => 24,
            TokenType::While => 25,
            TokenType::Do => 26,
            TokenType::Call => 27,
            TokenType::Const => 28,
            TokenType::Var => 29,
            TokenType::Procedure => 30,
            TokenType::Write => 31,
            TokenType::Read => 32,
            TokenType::Else => 33,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Ident(name) => write!(f, "{}", name),
            TokenType::Number(value) => write!(f, "{}", value),
            TokenType::Plus => write!(f, "+"),
            TokenType::Minus => write!(f, "-"),
            TokenType::Mult => write!(f, "*"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Eq => write!(f, "="),
            TokenType::Neq => write!(f, "<>"),
            TokenType::Less => write!(f, "<"),
            TokenType::Leq => write!(f, "<="),
            TokenType::Gtr => write!(f, ">"),
            TokenType::Geq => write!(f, ">="),
            TokenType::LParen => write!(f, "("),
            TokenType::RParen => write!(f, ")"),
            TokenType::Comma => write!(f, ","),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Period => write!(f, "."),
            TokenType::Becomes => write!(f, ":="),
            TokenType::Odd => write!(f, "odd"),
            TokenType::Begin => write!(f, "begin"),
            TokenType::End => write!(f, "end"),
            TokenType::If => write!(f, "if"),
            TokenType::Then => write!(f, "then"),
            TokenType::Else => write!(f, "else"),
            TokenType::While => write!(f, "while"),
            TokenType::Do => write!(f, "do"),
            TokenType::Call => write!(f, "call"),
            TokenType::Const => write!(f, "const"),
            TokenType::Var => write!(f, "var"),
            TokenType::Procedure => write!(f, "procedure"),
            TokenType::Write => write!(f, "write"),
            TokenType::Read => write!(f, "read"),
            TokenType::Null => write!(f, "<null>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, line: usize) -> Self {
        Self { token_type, line }
    }
}

/// DFA over character classes: letters start identifiers or reserved
/// words, digits start numbers, the special characters munch maximally
/// with one character of lookahead, everything outside the alphabet is an
/// error. Lines are counted from 0.
///
/// A token always ends at the first non-alphanumeric character; an
/// overlong identifier or number is reported without consuming the
/// offending character.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        if self.input.is_empty() {
            return Err(LexerError::NoSourceCode);
        }

        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }

            let ch = self.peek();
            let token_type = if ch.is_ascii_alphabetic() {
                self.ident_or_reserved()?
            } else if ch.is_ascii_digit() {
                self.number()?
            } else if is_special(ch) {
                match self.special()? {
                    Some(token_type) => token_type,
                    // a comment was skipped; resume the outer loop
                    None => continue,
                }
            } else {
                return Err(LexerError::InvalidSymbol { line: self.line });
            };

            tokens.push(Token::new(token_type, self.line));
        }

        Ok(tokens)
    }

    fn ident_or_reserved(&mut self) -> Result<TokenType, LexerError> {
        let mut lexeme = String::new();

        while !self.is_at_end() && self.peek().is_ascii_alphanumeric() {
            if lexeme.len() == MAX_IDENT_LENGTH {
                return Err(LexerError::NameTooLong { line: self.line });
            }
            lexeme.push(self.advance());
        }

        for (word, token_type) in &RESERVED_WORDS {
            if lexeme == *word {
                return Ok(token_type.clone());
            }
        }
        Ok(TokenType::Ident(lexeme))
    }

    fn number(&mut self) -> Result<TokenType, LexerError> {
        let mut lexeme = String::new();

        while !self.is_at_end() && self.peek().is_ascii_alphanumeric() {
            if self.peek().is_ascii_alphabetic() {
                return Err(LexerError::NonletterVarInitial { line: self.line });
            }
            if lexeme.len() == MAX_NUMBER_LENGTH {
                return Err(LexerError::NumTooLong { line: self.line });
            }
            lexeme.push(self.advance());
        }

        // at most 5 digits, so this cannot exceed i32
        let value = lexeme.parse().unwrap_or(0);
        Ok(TokenType::Number(value))
    }

    /// Returns None when a comment was consumed instead of a token
    fn special(&mut self) -> Result<Option<TokenType>, LexerError> {
        let ch = self.advance();
        let token_type = match ch {
            '/' => {
                if self.peek() == '*' {
                    self.advance();
                    self.skip_comment();
                    return Ok(None);
                }
                TokenType::Slash
            }
            '<' => match self.peek() {
                '=' => {
                    self.advance();
                    TokenType::Leq
                }
                '>' => {
                    self.advance();
                    TokenType::Neq
                }
                _ => TokenType::Less,
            },
            '>' => {
                if self.peek() == '=' {
                    self.advance();
                    TokenType::Geq
                } else {
                    TokenType::Gtr
                }
            }
            ':' => {
                if self.peek() == '=' {
                    self.advance();
                    TokenType::Becomes
                } else {
                    return Err(LexerError::InvalidSymbol { line: self.line });
                }
            }
            '+' => TokenType::Plus,
            '-' => TokenType::Minus,
            '*' => TokenType::Mult,
            '(' => TokenType::LParen,
            ')' => TokenType::RParen,
            '=' => TokenType::Eq,
            ',' => TokenType::Comma,
            ';' => TokenType::Semicolon,
            '.' => TokenType::Period,
            _ => return Err(LexerError::InvalidSymbol { line: self.line }),
        };
        Ok(Some(token_type))
    }

    /// Consume up to the terminating `*/`; an unterminated comment runs
    /// to end of input
    fn skip_comment(&mut self) {
        while !self.is_at_end() {
            let ch = self.advance();
            if ch == '\n' {
                self.line += 1;
            } else if ch == '*' && self.peek() == '/' {
                self.advance();
                return;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.input[self.position];
        self.position += 1;
        ch
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}

fn is_special(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '(' | ')' | '=' | ',' | '.' | '<' | '>' | ';' | ':'
    )
}

/// Tokenize a complete source text
pub fn lex(source: &str) -> Result<Vec<Token>, LexerError> {
    Lexer::new(source).tokenize()
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexerError {
    #[error("Identifier exceeds {MAX_IDENT_LENGTH} characters at line {line}")]
    NameTooLong { line: usize },

    #[error("Number exceeds {MAX_NUMBER_LENGTH} digits at line {line}")]
    NumTooLong { line: usize },

    #[error("Identifier does not start with a letter at line {line}")]
    NonletterVarInitial { line: usize },

    #[error("Invalid symbol at line {line}")]
    InvalidSymbol { line: usize },

    #[error("No source code")]
    NoSourceCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenType> {
        lex(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_single_period() {
        assert_eq!(kinds("."), vec![TokenType::Period]);
    }

    #[test]
    fn test_declaration_tokens() {
        assert_eq!(
            kinds("const a = 3;"),
            vec![
                TokenType::Const,
                TokenType::Ident("a".to_string()),
                TokenType::Eq,
                TokenType::Number(3),
                TokenType::Semicolon,
            ]
        );
    }

    #[test]
    fn test_reserved_words_and_identifiers() {
        assert_eq!(
            kinds("while whilst do doit"),
            vec![
                TokenType::While,
                TokenType::Ident("whilst".to_string()),
                TokenType::Do,
                TokenType::Ident("doit".to_string()),
            ]
        );
    }

    #[test]
    fn test_maximal_munch_on_specials() {
        assert_eq!(
            kinds("< <= <> > >= := ="),
            vec![
                TokenType::Less,
                TokenType::Leq,
                TokenType::Neq,
                TokenType::Gtr,
                TokenType::Geq,
                TokenType::Becomes,
                TokenType::Eq,
            ]
        );
    }

    #[test]
    fn test_slash_and_comment() {
        assert_eq!(
            kinds("a / b /* ignored / * text */ c"),
            vec![
                TokenType::Ident("a".to_string()),
                TokenType::Slash,
                TokenType::Ident("b".to_string()),
                TokenType::Ident("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        assert_eq!(
            kinds("a /* never closed"),
            vec![TokenType::Ident("a".to_string())]
        );
    }

    #[test]
    fn test_line_numbers_start_at_zero() {
        let tokens = lex("var x;\nx := 1.").unwrap();
        assert_eq!(tokens[0].line, 0);
        assert_eq!(tokens[3].line, 1);
    }

    #[test]
    fn test_comment_newlines_advance_line_counter() {
        let tokens = lex("/* one\ntwo\n*/ x").unwrap();
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_identifier_at_limit() {
        assert_eq!(
            kinds("abcdefghijk"),
            vec![TokenType::Ident("abcdefghijk".to_string())]
        );
    }

    #[test]
    fn test_identifier_too_long() {
        // 12 letters on the first line
        assert_eq!(
            lex("abcdefghijkl"),
            Err(LexerError::NameTooLong { line: 0 })
        );
    }

    #[test]
    fn test_number_at_limit() {
        assert_eq!(kinds("99999"), vec![TokenType::Number(99999)]);
    }

    #[test]
    fn test_number_too_long() {
        assert_eq!(
            lex("var x;\n123456"),
            Err(LexerError::NumTooLong { line: 1 })
        );
    }

    #[test]
    fn test_identifier_starting_with_digit() {
        assert_eq!(
            lex("12abc"),
            Err(LexerError::NonletterVarInitial { line: 0 })
        );
    }

    #[test]
    fn test_lone_colon_is_invalid() {
        assert_eq!(lex("x : y"), Err(LexerError::InvalidSymbol { line: 0 }));
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(lex("x # y"), Err(LexerError::InvalidSymbol { line: 0 }));
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(lex(""), Err(LexerError::NoSourceCode));
    }

    #[test]
    fn test_lexemes_relex_to_same_kind() {
        let source = "const m = 7; var x, y; begin x := m + 2 end.";
        for token in lex(source).unwrap() {
            let again = lex(&token.token_type.to_string()).unwrap();
            assert_eq!(again.len(), 1);
            assert_eq!(again[0].token_type.id(), token.token_type.id());
        }
    }

    #[test]
    fn test_stable_token_ids() {
        assert_eq!(TokenType::Null.id(), 1);
        assert_eq!(TokenType::Ident("x".to_string()).id(), 2);
        assert_eq!(TokenType::Number(0).id(), 3);
        assert_eq!(TokenType::Odd.id(), 8);
        assert_eq!(TokenType::Becomes.id(), 20);
        assert_eq!(TokenType::Const.id(), 28);
        assert_eq!(TokenType::Else.id(), 33);
    }
}
