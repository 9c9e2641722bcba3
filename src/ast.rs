use crate::lexer::Position;
use std::fmt;
use std::rc::Rc;

/// Statements are reference counted so that debug checkpoints and function
/// records can hold on to them without borrowing the program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Rc<Stmt>>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// A braced statement list: bodies of `if`, `while` and `func`.
#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Rc<Stmt>>,
    pub position: Position,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for stmt in &self.statements {
            write!(f, " {}", stmt)?;
        }
        write!(f, " }}")
    }
}

/// The three declarable primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeAnnotation {
    Number,
    String,
    Bool,
}

impl TypeAnnotation {
    /// Runtime tag name the annotation must match.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeAnnotation::Number => "NUMBER",
            TypeAnnotation::String => "STRING",
            TypeAnnotation::Bool => "BOOL",
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            TypeAnnotation::Number => "number",
            TypeAnnotation::String => "string",
            TypeAnnotation::Bool => "bool",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let {
        name: String,
        annotation: TypeAnnotation,
        value: Option<Expr>,
        position: Position,
    },
    Assign {
        name: String,
        value: Expr,
        position: Position,
    },
    Return {
        value: Expr,
        position: Position,
    },
    Expression {
        expr: Expr,
        position: Position,
    },
    Block(Block),
    If {
        condition: Expr,
        consequence: Rc<Block>,
        alternative: Option<Rc<Block>>,
        position: Position,
    },
    While {
        condition: Expr,
        body: Rc<Block>,
        position: Position,
    },
    Function {
        name: String,
        parameters: Rc<[String]>,
        body: Rc<Block>,
        position: Position,
    },
}

impl Stmt {
    /// Position of the token that introduced the statement.
    pub fn position(&self) -> Position {
        match self {
            Stmt::Let { position, .. }
            | Stmt::Assign { position, .. }
            | Stmt::Return { position, .. }
            | Stmt::Expression { position, .. }
            | Stmt::If { position, .. }
            | Stmt::While { position, .. }
            | Stmt::Function { position, .. } => *position,
            Stmt::Block(block) => block.position,
        }
    }

    pub fn line(&self) -> usize {
        self.position().line
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Let {
                name,
                annotation,
                value: Some(value),
                ..
            } => write!(f, "let {}: {} = {};", name, annotation.keyword(), value),
            Stmt::Let {
                name,
                annotation,
                value: None,
                ..
            } => write!(f, "let {}: {};", name, annotation.keyword()),
            Stmt::Assign { name, value, .. } => write!(f, "{} = {};", name, value),
            Stmt::Return { value, .. } => write!(f, "return {};", value),
            Stmt::Expression { expr, .. } => write!(f, "{}", expr),
            Stmt::Block(block) => write!(f, "{}", block),
            Stmt::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Stmt::While {
                condition, body, ..
            } => write!(f, "while ({}) {}", condition, body),
            Stmt::Function {
                name,
                parameters,
                body,
                ..
            } => write!(f, "func {}({}) {}", name, parameters.join(", "), body),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Plain or dotted name (`x`, `Obniz.LED.ON`).
    Identifier(String),
    Number(f64),
    String(String),
    Boolean(bool),
    Prefix {
        operator: PrefixOp,
        right: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        operator: InfixOp,
        right: Box<Expr>,
    },
    Call {
        function: Box<Expr>,
        arguments: Vec<Expr>,
    },
}

/// Fully parenthesized rendering, used for diagnostics and tests.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::String(s) => write!(f, "\"{}\"", s),
            Expr::Boolean(b) => write!(f, "{}", b),
            Expr::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Expr::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expr::Call {
                function,
                arguments,
            } => {
                write!(f, "{}(", function)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Not,
    Negate,
}

impl PrefixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::Not => "!",
            PrefixOp::Negate => "-",
        }
    }
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl InfixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Subtract => "-",
            InfixOp::Multiply => "*",
            InfixOp::Divide => "/",
            InfixOp::Equal => "==",
            InfixOp::NotEqual => "!=",
            InfixOp::Less => "<",
            InfixOp::LessEqual => "<=",
            InfixOp::Greater => ">",
            InfixOp::GreaterEqual => ">=",
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
