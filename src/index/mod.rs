// Index data model and storage

pub mod fingerprint;
pub mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// A declared code symbol (function, class, variable, import, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    /// 1-based line of the declaration
    pub line: usize,
    /// 0-based column of the declaration
    #[serde(default)]
    pub column: usize,
    #[serde(default)]
    pub end_line: Option<usize>,
    /// Enclosing class or function; `None` at module scope
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub docstring: Option<String>,
}

fn default_language() -> String {
    "python".to_string()
}

impl Symbol {
    /// Identity tuple: two symbols with equal keys are the same declaration.
    pub fn key(&self) -> (&str, SymbolKind, &str, usize) {
        (self.name.as_str(), self.kind, self.file.as_str(), self.line)
    }
}

/// Symbol kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Variable,
    Import,
    Method,
    Struct,
    Enum,
    Trait,
    Module,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 9] = [
        SymbolKind::Function,
        SymbolKind::Class,
        SymbolKind::Variable,
        SymbolKind::Import,
        SymbolKind::Method,
        SymbolKind::Struct,
        SymbolKind::Enum,
        SymbolKind::Trait,
        SymbolKind::Module,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Variable => "variable",
            SymbolKind::Import => "import",
            SymbolKind::Method => "method",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Trait => "trait",
            SymbolKind::Module => "module",
        }
    }
}

impl FromStr for SymbolKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymbolKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| IndexError::QueryInput(format!("unknown symbol kind: {}", s)))
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A usage site of a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub symbol: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub ref_type: RefType,
    #[serde(default)]
    pub context: Option<String>,
}

/// How a reference uses its symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    Read,
    Write,
    Call,
}

impl RefType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefType::Read => "read",
            RefType::Write => "write",
            RefType::Call => "call",
        }
    }
}
