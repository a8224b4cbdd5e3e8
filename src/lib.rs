// mmt Language Interpreter Library
//
// Core library for mmt, a small imperative scripting language with Thai
// keywords: lexer, parser, serializable syntax tree, tree-walking evaluator
// and a file-based module system.

// Public modules
pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod ir;
pub mod lexer;
pub mod module;
pub mod operators;
pub mod parser;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use error::{MmtError, Span};
pub use evaluator::Evaluator;
pub use lexer::{Lexer, Token, TokenType};
pub use module::{FileLoader, MemoryLoader, ModuleLoader};
pub use parser::{parse_source, Parser};
pub use value::Value;

// Re-export main functions
pub use runner::run;
