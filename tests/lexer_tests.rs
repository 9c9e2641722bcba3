use pretty_assertions::assert_eq;
use steplang::lexer::{Lexer, TokenType};

fn token_types(source: &str) -> Vec<TokenType> {
    Lexer::new(source)
        .tokenize()
        .into_iter()
        .map(|token| token.token_type)
        .collect()
}

fn literals(source: &str) -> Vec<String> {
    Lexer::new(source)
        .tokenize()
        .into_iter()
        .map(|token| token.literal)
        .collect()
}

#[test]
fn test_statement_tokens() {
    use TokenType::*;

    let source = r#"let five: number = 5;
func add(x, y) { return x + y; }
if (five <= 10) { Println("ok"); } else { x = !true; }
while (a != b) { a == b; }
"#;

    assert_eq!(
        token_types(source),
        vec![
            Let, Identifier, Colon, NumberType, Equal, Number, Semicolon,
            Func, Identifier, LeftParen, Identifier, Comma, Identifier, RightParen,
            LeftBrace, Return, Identifier, Plus, Identifier, Semicolon, RightBrace,
            If, LeftParen, Identifier, LessEqual, Number, RightParen,
            LeftBrace, Identifier, LeftParen, String, RightParen, Semicolon, RightBrace,
            Else, LeftBrace, Identifier, Equal, Bang, True, Semicolon, RightBrace,
            While, LeftParen, Identifier, BangEqual, Identifier, RightParen,
            LeftBrace, Identifier, EqualEqual, Identifier, Semicolon, RightBrace,
            Eof,
        ]
    );
}

#[test]
fn test_operators_and_type_keywords() {
    use TokenType::*;

    assert_eq!(
        token_types("+ - * / < > <= >= = == ! != . [ ] string bool number"),
        vec![
            Plus, Minus, Star, Slash, Less, Greater, LessEqual, GreaterEqual, Equal,
            EqualEqual, Bang, BangEqual, Dot, LeftBracket, RightBracket, StringType,
            BoolType, NumberType, Eof,
        ]
    );
}

#[test]
fn test_positions() {
    let tokens = Lexer::new("let x\n  y").tokenize();
    let positions: Vec<(usize, usize)> = tokens
        .iter()
        .map(|token| (token.position.line, token.position.column))
        .collect();

    assert_eq!(positions, vec![(1, 1), (1, 5), (2, 3), (2, 4)]);
    assert_eq!(tokens[2].position.offset, 8);
    assert_eq!(tokens[2].position.to_string(), "2:3");
}

#[test]
fn test_eof_is_repeated() {
    let mut lexer = Lexer::new("x");
    assert_eq!(lexer.next_token().token_type, TokenType::Identifier);
    for _ in 0..3 {
        let token = lexer.next_token();
        assert_eq!(token.token_type, TokenType::Eof);
        assert_eq!(token.literal, "");
    }
}

#[test]
fn test_identifiers_are_letters_only() {
    use TokenType::*;

    assert_eq!(token_types("abc123def"), vec![Identifier, Number, Identifier, Eof]);
    assert_eq!(literals("abc123def"), vec!["abc", "123", "def", ""]);

    assert_eq!(token_types("a_b"), vec![Identifier, Illegal, Identifier, Eof]);
    assert_eq!(literals("a_b"), vec!["a", "_", "b", ""]);
}

#[test]
fn test_numbers_are_digit_runs() {
    assert_eq!(literals("12.5"), vec!["12", ".", "5", ""]);
}

#[test]
fn test_strings() {
    use TokenType::*;

    assert_eq!(token_types(r#""a""""b""#), vec![String, String, String, Eof]);
    assert_eq!(literals(r#""a""""b""#), vec!["a", "", "b", ""]);

    // Everything between the quotes is kept verbatim
    assert_eq!(literals(r#""x // y""#), vec!["x // y", ""]);
}

#[test]
fn test_unterminated_string() {
    let tokens = Lexer::new("x = \"abc").tokenize();
    let last = &tokens[tokens.len() - 2];

    assert_eq!(last.token_type, TokenType::Illegal);
    assert_eq!(last.literal, "\"abc");
    assert_eq!(tokens[tokens.len() - 1].token_type, TokenType::Eof);
}

#[test]
fn test_comments_are_skipped() {
    use TokenType::*;

    let source = "// leading\nx = 1; // trailing\n// last";
    assert_eq!(token_types(source), vec![Identifier, Equal, Number, Semicolon, Eof]);
    assert_eq!(token_types("a / b"), vec![Identifier, Slash, Identifier, Eof]);
}

#[test]
fn test_illegal_characters() {
    let tokens = Lexer::new("@ #").tokenize();
    assert_eq!(tokens[0].token_type, TokenType::Illegal);
    assert_eq!(tokens[0].literal, "@");
    assert_eq!(tokens[1].token_type, TokenType::Illegal);
    assert_eq!(tokens[1].literal, "#");
}
