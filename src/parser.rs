use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt, TypeAnnotation};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenType};
use std::rc::Rc;

/// Binding strength of operators, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

impl Precedence {
    pub fn of(token_type: TokenType) -> Self {
        match token_type {
            TokenType::EqualEqual | TokenType::BangEqual => Precedence::Equals,
            TokenType::Less
            | TokenType::LessEqual
            | TokenType::Greater
            | TokenType::GreaterEqual => Precedence::LessGreater,
            TokenType::Plus | TokenType::Minus => Precedence::Sum,
            TokenType::Star | TokenType::Slash => Precedence::Product,
            TokenType::LeftParen => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

type PrefixParseFn = fn(&mut Parser) -> Option<Expr>;
type InfixParseFn = fn(&mut Parser, Expr) -> Option<Expr>;

fn prefix_parse_fn(token_type: TokenType) -> Option<PrefixParseFn> {
    match token_type {
        TokenType::Identifier => Some(Parser::parse_identifier),
        TokenType::Number => Some(Parser::parse_number),
        TokenType::String => Some(Parser::parse_string),
        TokenType::True | TokenType::False => Some(Parser::parse_boolean),
        TokenType::Bang | TokenType::Minus => Some(Parser::parse_prefix_expression),
        TokenType::LeftParen => Some(Parser::parse_grouped_expression),
        _ => None,
    }
}

fn infix_parse_fn(token_type: TokenType) -> Option<InfixParseFn> {
    match token_type {
        TokenType::Plus
        | TokenType::Minus
        | TokenType::Star
        | TokenType::Slash
        | TokenType::EqualEqual
        | TokenType::BangEqual
        | TokenType::Less
        | TokenType::LessEqual
        | TokenType::Greater
        | TokenType::GreaterEqual => Some(Parser::parse_infix_expression),
        TokenType::LeftParen => Some(Parser::parse_call_expression),
        _ => None,
    }
}

/// Parse a whole source text, returning the program and every parse error.
pub fn parse(source: &str) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    (program, parser.into_errors())
}

pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    /// Always yields a program. Malformed statements are dropped and recorded
    /// in [`Parser::errors`]; callers must check that list before evaluating.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::new();

        while !self.current_is(TokenType::Eof) {
            match self.parse_statement() {
                Some(stmt) => program.statements.push(Rc::new(stmt)),
                None => self.synchronize(),
            }
            self.next_token();
        }

        program
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn current_is(&self, token_type: TokenType) -> bool {
        self.current.token_type == token_type
    }

    fn peek_is(&self, token_type: TokenType) -> bool {
        self.peek.token_type == token_type
    }

    /// Advance only when the next token has the expected type.
    fn expect_peek(&mut self, token_type: TokenType) -> Option<()> {
        if self.peek_is(token_type) {
            self.next_token();
            Some(())
        } else {
            self.peek_error(token_type.describe());
            None
        }
    }

    fn peek_error(&mut self, expected: &str) {
        let message = format!(
            "expected {}, got {}",
            expected,
            self.peek.token_type.describe()
        );
        let error = ParseError::at_token(message, &self.peek);
        self.record(error);
    }

    fn record(&mut self, error: ParseError) {
        tracing::debug!(position = %error.position, message = %error.message, "parse error");
        self.errors.push(error);
    }

    /// Skip the rest of a malformed statement. A `{ ... }` body the statement
    /// opened is skipped as a whole so its inner `;` and closing `}` are not
    /// mistaken for statement boundaries.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current.token_type {
                TokenType::Eof => return,
                TokenType::LeftBrace => depth += 1,
                TokenType::RightBrace if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                TokenType::Semicolon if depth == 0 => return,
                _ => {}
            }
            if self.peek_is(TokenType::Eof) {
                return;
            }
            if depth == 0
                && matches!(
                    self.peek.token_type,
                    TokenType::Let
                        | TokenType::Return
                        | TokenType::If
                        | TokenType::While
                        | TokenType::Func
                        | TokenType::RightBrace
                )
            {
                return;
            }
            self.next_token();
        }
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(TokenType::Semicolon) {
            self.next_token();
        }
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.current.token_type {
            TokenType::Let => self.parse_let_statement(),
            TokenType::Return => self.parse_return_statement(),
            TokenType::If => self.parse_if_statement(),
            TokenType::While => self.parse_while_statement(),
            TokenType::Func => self.parse_function_statement(),
            TokenType::LeftBrace => self.parse_block().map(Stmt::Block),
            TokenType::Identifier if self.peek_is(TokenType::Equal) => {
                self.parse_assign_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// `let IDENT : TYPE = EXPR ;` or `let IDENT : TYPE ;`
    fn parse_let_statement(&mut self) -> Option<Stmt> {
        let position = self.current.position;

        self.expect_peek(TokenType::Identifier)?;
        let name = self.current.literal.clone();

        self.expect_peek(TokenType::Colon)?;

        let annotation = match self.peek.token_type {
            TokenType::NumberType => TypeAnnotation::Number,
            TokenType::StringType => TypeAnnotation::String,
            TokenType::BoolType => TypeAnnotation::Bool,
            _ => {
                self.peek_error("TYPE");
                return None;
            }
        };
        self.next_token();

        if self.peek_is(TokenType::Semicolon) {
            self.next_token();
            return Some(Stmt::Let {
                name,
                annotation,
                value: None,
                position,
            });
        }

        self.expect_peek(TokenType::Equal)?;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Stmt::Let {
            name,
            annotation,
            value: Some(value),
            position,
        })
    }

    fn parse_assign_statement(&mut self) -> Option<Stmt> {
        let position = self.current.position;
        let name = self.current.literal.clone();

        // Skip the name and the '='
        self.next_token();
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Stmt::Assign {
            name,
            value,
            position,
        })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        let position = self.current.position;
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Stmt::Return { value, position })
    }

    fn parse_if_statement(&mut self) -> Option<Stmt> {
        let position = self.current.position;

        self.expect_peek(TokenType::LeftParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RightParen)?;

        self.expect_peek(TokenType::LeftBrace)?;
        let consequence = Rc::new(self.parse_block()?);

        let alternative = if self.peek_is(TokenType::Else) {
            self.next_token();
            self.expect_peek(TokenType::LeftBrace)?;
            Some(Rc::new(self.parse_block()?))
        } else {
            None
        };

        Some(Stmt::If {
            condition,
            consequence,
            alternative,
            position,
        })
    }

    fn parse_while_statement(&mut self) -> Option<Stmt> {
        let position = self.current.position;

        self.expect_peek(TokenType::LeftParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RightParen)?;

        self.expect_peek(TokenType::LeftBrace)?;
        let body = Rc::new(self.parse_block()?);

        Some(Stmt::While {
            condition,
            body,
            position,
        })
    }

    /// `func IDENT ( IDENT,* ) { STMT* }`
    fn parse_function_statement(&mut self) -> Option<Stmt> {
        let position = self.current.position;

        self.expect_peek(TokenType::Identifier)?;
        let name = self.current.literal.clone();

        self.expect_peek(TokenType::LeftParen)?;
        let parameters = self.parse_parameters()?;

        self.expect_peek(TokenType::LeftBrace)?;
        let body = Rc::new(self.parse_block()?);

        Some(Stmt::Function {
            name,
            parameters: parameters.into(),
            body,
            position,
        })
    }

    fn parse_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();

        if self.peek_is(TokenType::RightParen) {
            self.next_token();
            return Some(parameters);
        }

        self.expect_peek(TokenType::Identifier)?;
        parameters.push(self.current.literal.clone());

        while self.peek_is(TokenType::Comma) {
            self.next_token();
            self.expect_peek(TokenType::Identifier)?;
            parameters.push(self.current.literal.clone());
        }

        self.expect_peek(TokenType::RightParen)?;
        Some(parameters)
    }

    /// Expects the current token to be `{`; leaves the parser on the closing `}`.
    fn parse_block(&mut self) -> Option<Block> {
        let position = self.current.position;
        let mut statements = Vec::new();

        self.next_token();
        while !self.current_is(TokenType::RightBrace) && !self.current_is(TokenType::Eof) {
            match self.parse_statement() {
                Some(stmt) => statements.push(Rc::new(stmt)),
                None => self.synchronize(),
            }
            self.next_token();
        }

        if self.current_is(TokenType::Eof) {
            let error = ParseError::at_token(
                format!("expected }}, got {}", TokenType::Eof.describe()),
                &self.current,
            );
            self.record(error);
            return None;
        }

        Some(Block {
            statements,
            position,
        })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let position = self.current.position;
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Stmt::Expression { expr, position })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let prefix = match prefix_parse_fn(self.current.token_type) {
            Some(prefix) => prefix,
            None => {
                self.no_prefix_parse_fn_error();
                return None;
            }
        };
        let mut left = prefix(self)?;

        while !self.peek_is(TokenType::Semicolon) && precedence < Precedence::of(self.peek.token_type) {
            let infix = match infix_parse_fn(self.peek.token_type) {
                Some(infix) => infix,
                None => return Some(left),
            };
            self.next_token();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn no_prefix_parse_fn_error(&mut self) {
        let message = match self.current.token_type {
            TokenType::Illegal => format!("illegal token {}", self.current.literal),
            other => format!("no prefix parse function for {} found", other.describe()),
        };
        let error = ParseError::at_token(message, &self.current);
        self.record(error);
    }

    /// Plain names and dotted paths such as `Obniz.LED.ON`.
    fn parse_identifier(&mut self) -> Option<Expr> {
        let mut name = self.current.literal.clone();
        while self.peek_is(TokenType::Dot) {
            self.next_token();
            self.expect_peek(TokenType::Identifier)?;
            name.push('.');
            name.push_str(&self.current.literal);
        }
        Some(Expr::Identifier(name))
    }

    fn parse_number(&mut self) -> Option<Expr> {
        match self.current.literal.parse::<f64>() {
            Ok(value) => Some(Expr::Number(value)),
            Err(_) => {
                let error = ParseError::at_token(
                    format!("could not parse {} as number", self.current.literal),
                    &self.current,
                );
                self.record(error);
                None
            }
        }
    }

    fn parse_string(&mut self) -> Option<Expr> {
        Some(Expr::String(self.current.literal.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expr> {
        Some(Expr::Boolean(self.current_is(TokenType::True)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let operator = match self.current.token_type {
            TokenType::Bang => PrefixOp::Not,
            _ => PrefixOp::Negate,
        };

        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expr::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RightParen)?;
        Some(expr)
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let operator = match self.current.token_type {
            TokenType::Plus => InfixOp::Add,
            TokenType::Minus => InfixOp::Subtract,
            TokenType::Star => InfixOp::Multiply,
            TokenType::Slash => InfixOp::Divide,
            TokenType::EqualEqual => InfixOp::Equal,
            TokenType::BangEqual => InfixOp::NotEqual,
            TokenType::Less => InfixOp::Less,
            TokenType::LessEqual => InfixOp::LessEqual,
            TokenType::Greater => InfixOp::Greater,
            _ => InfixOp::GreaterEqual,
        };

        // Recursing at the operator's own precedence keeps equal levels left-associative
        let precedence = Precedence::of(self.current.token_type);
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expr::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_call_expression(&mut self, function: Expr) -> Option<Expr> {
        let arguments = self.parse_call_arguments()?;
        Some(Expr::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_call_arguments(&mut self) -> Option<Vec<Expr>> {
        let mut arguments = Vec::new();

        if self.peek_is(TokenType::RightParen) {
            self.next_token();
            return Some(arguments);
        }

        self.next_token();
        arguments.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            arguments.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(TokenType::RightParen)?;
        Some(arguments)
    }
}
