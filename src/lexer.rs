use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier,
    String,
    Number,

    // Keywords
    Else,
    False,
    Func,
    If,
    Let,
    Return,
    True,
    While,

    // Type annotations
    NumberType,
    StringType,
    BoolType,

    // Special
    Illegal,
    Eof,
}

impl TokenType {
    /// Name used in parser diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenType::LeftParen => "(",
            TokenType::RightParen => ")",
            TokenType::LeftBrace => "{",
            TokenType::RightBrace => "}",
            TokenType::LeftBracket => "[",
            TokenType::RightBracket => "]",
            TokenType::Comma => ",",
            TokenType::Colon => ":",
            TokenType::Dot => ".",
            TokenType::Minus => "-",
            TokenType::Plus => "+",
            TokenType::Semicolon => ";",
            TokenType::Slash => "/",
            TokenType::Star => "*",
            TokenType::Bang => "!",
            TokenType::BangEqual => "!=",
            TokenType::Equal => "=",
            TokenType::EqualEqual => "==",
            TokenType::Greater => ">",
            TokenType::GreaterEqual => ">=",
            TokenType::Less => "<",
            TokenType::LessEqual => "<=",
            TokenType::Identifier => "IDENT",
            TokenType::String => "STRING",
            TokenType::Number => "NUMBER",
            TokenType::Else => "else",
            TokenType::False => "false",
            TokenType::Func => "func",
            TokenType::If => "if",
            TokenType::Let => "let",
            TokenType::Return => "return",
            TokenType::True => "true",
            TokenType::While => "while",
            TokenType::NumberType => "number",
            TokenType::StringType => "string",
            TokenType::BoolType => "bool",
            TokenType::Illegal => "ILLEGAL",
            TokenType::Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Location of a token in the source. `line` and `column` are 1-based,
/// `offset` is the 0-based character index used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub position: Position,
}

impl Token {
    pub fn new(token_type: TokenType, literal: impl Into<String>, position: Position) -> Self {
        Self {
            token_type,
            literal: literal.into(),
            position,
        }
    }

    /// Width of the token in characters, never zero.
    pub fn width(&self) -> usize {
        self.literal.chars().count().max(1)
    }
}

/// On-demand tokenizer. Each call to [`Lexer::next_token`] produces one token;
/// once the input is exhausted it keeps producing `Eof`.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    read_position: usize,
    ch: Option<char>,
    line: usize,
    column: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("else", TokenType::Else);
        keywords.insert("false", TokenType::False);
        keywords.insert("func", TokenType::Func);
        keywords.insert("if", TokenType::If);
        keywords.insert("let", TokenType::Let);
        keywords.insert("return", TokenType::Return);
        keywords.insert("true", TokenType::True);
        keywords.insert("while", TokenType::While);
        keywords.insert("number", TokenType::NumberType);
        keywords.insert("string", TokenType::StringType);
        keywords.insert("bool", TokenType::BoolType);

        let mut lexer = Self {
            input: source.chars().collect(),
            position: 0,
            read_position: 0,
            ch: None,
            line: 1,
            column: 1,
            keywords,
        };
        lexer.read_char();
        lexer
    }

    /// Collect every token up to and including the first `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.token_type == TokenType::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let position = self.current_position();
        let c = match self.ch {
            Some(c) => c,
            None => return Token::new(TokenType::Eof, "", position),
        };

        let token = match c {
            '(' => Token::new(TokenType::LeftParen, "(", position),
            ')' => Token::new(TokenType::RightParen, ")", position),
            '{' => Token::new(TokenType::LeftBrace, "{", position),
            '}' => Token::new(TokenType::RightBrace, "}", position),
            '[' => Token::new(TokenType::LeftBracket, "[", position),
            ']' => Token::new(TokenType::RightBracket, "]", position),
            ',' => Token::new(TokenType::Comma, ",", position),
            ':' => Token::new(TokenType::Colon, ":", position),
            '.' => Token::new(TokenType::Dot, ".", position),
            '-' => Token::new(TokenType::Minus, "-", position),
            '+' => Token::new(TokenType::Plus, "+", position),
            ';' => Token::new(TokenType::Semicolon, ";", position),
            '*' => Token::new(TokenType::Star, "*", position),
            '/' => Token::new(TokenType::Slash, "/", position),
            '!' => self.one_or_two(TokenType::Bang, TokenType::BangEqual, position),
            '=' => self.one_or_two(TokenType::Equal, TokenType::EqualEqual, position),
            '<' => self.one_or_two(TokenType::Less, TokenType::LessEqual, position),
            '>' => self.one_or_two(TokenType::Greater, TokenType::GreaterEqual, position),
            '"' => return self.string(position),
            c if c.is_ascii_digit() => return self.number(position),
            c if c.is_ascii_alphabetic() => return self.identifier(position),
            c => Token::new(TokenType::Illegal, c.to_string(), position),
        };

        self.read_char();
        token
    }

    fn read_char(&mut self) {
        match self.ch {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }

        self.ch = self.input.get(self.read_position).copied();
        self.position = self.read_position;
        if self.read_position < self.input.len() {
            self.read_position += 1;
        }
    }

    fn peek_char(&self) -> Option<char> {
        if self.ch.is_none() {
            return None;
        }
        self.input.get(self.read_position).copied()
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.position)
    }

    /// Resolve `x` vs `x=` without consuming the second character unless it matches.
    fn one_or_two(&mut self, single: TokenType, double: TokenType, position: Position) -> Token {
        if self.peek_char() == Some('=') {
            self.read_char();
            Token::new(double, double.describe(), position)
        } else {
            Token::new(single, single.describe(), position)
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.ch, Some(' ' | '\t' | '\n' | '\r')) {
                self.read_char();
            }

            if self.ch == Some('/') && self.peek_char() == Some('/') {
                // Comment goes until end of line
                while !matches!(self.ch, None | Some('\n')) {
                    self.read_char();
                }
            } else {
                return;
            }
        }
    }

    fn string(&mut self, position: Position) -> Token {
        // Skip the opening quote
        self.read_char();

        let mut content = String::new();
        while let Some(c) = self.ch {
            if c == '"' {
                self.read_char();
                return Token::new(TokenType::String, content, position);
            }
            content.push(c);
            self.read_char();
        }

        // Unterminated string
        Token::new(TokenType::Illegal, format!("\"{}", content), position)
    }

    fn number(&mut self, position: Position) -> Token {
        let start = self.position;
        while matches!(self.ch, Some(c) if c.is_ascii_digit()) {
            self.read_char();
        }
        let literal: String = self.input[start..self.position].iter().collect();
        Token::new(TokenType::Number, literal, position)
    }

    fn identifier(&mut self, position: Position) -> Token {
        let start = self.position;
        while matches!(self.ch, Some(c) if c.is_ascii_alphabetic()) {
            self.read_char();
        }
        let literal: String = self.input[start..self.position].iter().collect();
        let token_type = self
            .keywords
            .get(literal.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);

        Token::new(token_type, literal, position)
    }
}
