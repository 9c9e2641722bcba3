// steplang interpreter library
//
// Lexer, Pratt parser and async tree-walking evaluator for a small typed
// scripting language, with a statement-by-statement debug mode.

// Public modules
pub mod ast;
pub mod builtins;
pub mod debugger;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Block, Expr, Program, Stmt, TypeAnnotation};
pub use builtins::{BuiltinRegistry, BuiltinResolver, FunctionTable, HostValue, InputFuture};
pub use debugger::{CancelHandle, Checkpoint, DebugSession, SessionState};
pub use environment::{AssignError, Environment};
pub use error::ParseError;
pub use evaluator::Evaluator;
pub use lexer::{Lexer, Position, Token, TokenType};
pub use parser::{parse, Parser};
pub use value::{Builtin, NativeFunction, Value};

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{evaluate, run};
