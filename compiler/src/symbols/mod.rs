use serde::{Deserialize, Serialize};

/// What an identifier was declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Const,
    Var,
    Proc,
}

/// Index of a symbol within its table; used as the scope handle
pub type SymbolId = usize;

/// A declaration recorded by the code generator
///
/// `value` is meaningful only for CONST; `address` holds the stack slot
/// for VAR (locals start at offset 4) and the code address for PROC.
/// `scope` is the enclosing PROC symbol, or None at the global level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub level: u32,
    pub value: i32,
    pub address: i32,
    pub scope: Option<SymbolId>,
}

/// Declarations live here for the duration of one code-generation run
///
/// Entries are appended in declaration order and never deduplicated; the
/// language forbids redeclaration within a scope.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a symbol and return its id
    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        self.symbols.push(symbol);
        self.symbols.len() - 1
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id]
    }

    /// Resolve `name` from the given scope outward
    ///
    /// A symbol is visible if it was declared in the current procedure or
    /// in any lexical ancestor; declarations in sibling procedures are
    /// not. The most recent declaration in a scope wins.
    pub fn find(&self, scope: Option<SymbolId>, name: &str) -> Option<SymbolId> {
        let mut current = scope;
        loop {
            let found = self
                .symbols
                .iter()
                .enumerate()
                .rev()
                .find(|(_, sym)| sym.scope == current && sym.name == name);
            if let Some((id, _)) = found {
                return Some(id);
            }
            match current {
                Some(id) => current = self.symbols[id].scope,
                None => return None,
            }
        }
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.symbols.clear();
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
