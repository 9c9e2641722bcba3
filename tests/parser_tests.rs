use pretty_assertions::assert_eq;
use steplang::ast::{Expr, Stmt, TypeAnnotation};
use steplang::lexer::Lexer;
use steplang::parser::{parse, Parser};

fn render(source: &str) -> String {
    let (program, errors) = parse(source);
    assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
    program.to_string()
}

#[test]
fn test_operator_precedence() {
    let cases = [
        ("1 + 1 * 2", "(1 + (1 * 2))"),
        ("1 * 1 + 2 * 2 / 2", "((1 * 1) + ((2 * 2) / 2))"),
        ("a + b - c", "((a + b) - c)"),
        ("a * b / c", "((a * b) / c)"),
        ("-a * b", "((-a) * b)"),
        ("!-a", "(!(-a))"),
        ("a < b == c > d", "((a < b) == (c > d))"),
        ("a <= b != c >= d", "((a <= b) != (c >= d))"),
        ("(1 + 2) * 3", "((1 + 2) * 3)"),
        ("a + add(b) * c", "(a + (add(b) * c))"),
        ("add(a + b, c * d)", "add((a + b), (c * d))"),
        ("\"a\" + \"b\"", "(\"a\" + \"b\")"),
    ];

    for (source, expected) in cases {
        assert_eq!(render(source), expected, "source: {}", source);
    }
}

#[test]
fn test_statement_rendering() {
    assert_eq!(render("let x: number = 1 + 2;"), "let x: number = (1 + 2);");
    assert_eq!(render("let s: string;"), "let s: string;");
    assert_eq!(render("x = x + 1"), "x = (x + 1);");
    assert_eq!(
        render("while (x < 3) { x = x + 1; }"),
        "while ((x < 3)) { x = (x + 1); }"
    );
    assert_eq!(
        render("func add(a, b) { return a + b; }"),
        "func add(a, b) { return (a + b); }"
    );
}

#[test]
fn test_semicolons_are_optional() {
    let (program, errors) = parse("let x: number = 1\nx = 2\nx");
    assert!(errors.is_empty());
    assert_eq!(program.statements.len(), 3);
}

#[test]
fn test_let_statement_fields() {
    let (program, errors) = parse("let flag: bool = true;");
    assert!(errors.is_empty());

    match program.statements[0].as_ref() {
        Stmt::Let {
            name,
            annotation,
            value,
            ..
        } => {
            assert_eq!(name, "flag");
            assert_eq!(*annotation, TypeAnnotation::Bool);
            assert_eq!(value.as_ref(), Some(&Expr::Boolean(true)));
        }
        other => panic!("expected let statement, got {:?}", other),
    }
}

#[test]
fn test_dotted_call() {
    let (program, errors) = parse("Obniz.LED.ON(1);");
    assert!(errors.is_empty());

    match program.statements[0].as_ref() {
        Stmt::Expression {
            expr: Expr::Call {
                function,
                arguments,
            },
            ..
        } => {
            assert_eq!(**function, Expr::Identifier("Obniz.LED.ON".to_string()));
            assert_eq!(arguments, &vec![Expr::Number(1.0)]);
        }
        other => panic!("expected call statement, got {:?}", other),
    }
}

#[test]
fn test_statement_positions() {
    let (program, errors) = parse("x = 1;\n  if (x) {\n    y = 2;\n  }");
    assert!(errors.is_empty());

    let first = program.statements[0].position();
    let second = program.statements[1].position();
    assert_eq!((first.line, first.column), (1, 1));
    assert_eq!((second.line, second.column), (2, 3));

    match program.statements[1].as_ref() {
        Stmt::If { consequence, .. } => assert_eq!(consequence.statements[0].line(), 3),
        other => panic!("expected if statement, got {:?}", other),
    }
}

#[test]
fn test_recovers_after_malformed_statement() {
    let (program, errors) = parse("let x 5; let y: number = 10; y;");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "expected :, got NUMBER");
    assert_eq!(program.statements.len(), 2);
    assert_eq!(program.to_string(), "let y: number = 10;\ny");
}

#[test]
fn test_error_position_points_at_offending_token() {
    let (_, errors) = parse("let x: number = 1;\nlet y = 2;");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].position.line, 2);
    assert_eq!(errors[0].position.column, 7);
    assert_eq!(errors[0].to_string(), "expected :, got =");
}

#[test]
fn test_reports_several_errors() {
    let (_, errors) = parse("let a = 1;\nlet b: int = 2;\n1 +");
    let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();

    assert_eq!(
        messages,
        vec![
            "expected :, got =",
            "expected TYPE, got IDENT",
            "no prefix parse function for EOF found",
        ]
    );
}

#[test]
fn test_parser_keeps_errors_for_inspection() {
    let mut parser = Parser::new(Lexer::new("// only a comment"));
    let program = parser.parse_program();
    assert!(program.is_empty());
    assert!(parser.errors().is_empty());

    let mut parser = Parser::new(Lexer::new("let x: number = ;"));
    let program = parser.parse_program();
    assert!(program.is_empty());
    assert_eq!(parser.errors().len(), 1);
    assert_eq!(parser.errors()[0].message, "no prefix parse function for ; found");
}

#[test]
fn test_recovery_skips_body_of_malformed_statement() {
    let (program, errors) = parse("if (x <) { y = 1; }\nlet z: number = 2;");
    let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();

    assert_eq!(messages, vec!["no prefix parse function for ) found"]);
    assert_eq!(program.to_string(), "let z: number = 2;");

    let (program, errors) = parse("while (x <) { if (y) { y = 1; } }\nz;");
    assert_eq!(errors.len(), 1);
    assert_eq!(program.to_string(), "z");
}
