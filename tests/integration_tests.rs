// Parser robustness suites
//
// Each case states whether the source must parse cleanly or be rejected,
// optionally with a message that one of the recorded errors must contain.
// A panic anywhere in the lexer or parser is reported as a crash.

use std::panic::{self, AssertUnwindSafe};
use steplang::parser::parse;

#[derive(Debug)]
enum Outcome {
    Pass,
    Fail(String),
    Crash(String),
}

#[derive(Debug, Clone, Copy)]
enum Expect {
    Parses,
    Rejects,
    RejectsWith(&'static str),
}

struct Case {
    name: &'static str,
    input: String,
    expect: Expect,
}

struct Suite {
    name: &'static str,
    cases: Vec<Case>,
}

impl Suite {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            cases: Vec::new(),
        }
    }

    fn case(mut self, name: &'static str, input: impl Into<String>, expect: Expect) -> Self {
        self.cases.push(Case {
            name,
            input: input.into(),
            expect,
        });
        self
    }

    fn parses(self, name: &'static str, input: impl Into<String>) -> Self {
        self.case(name, input, Expect::Parses)
    }

    fn rejects(self, name: &'static str, input: impl Into<String>) -> Self {
        self.case(name, input, Expect::Rejects)
    }

    fn rejects_with(self, name: &'static str, input: impl Into<String>, message: &'static str) -> Self {
        self.case(name, input, Expect::RejectsWith(message))
    }

    fn run(&self) -> Report {
        let mut report = Report {
            suite: self.name,
            total: self.cases.len(),
            problems: Vec::new(),
        };

        for case in &self.cases {
            match check(case) {
                Outcome::Pass => {}
                problem => report.problems.push((case.name, problem)),
            }
        }

        report.print();
        report
    }
}

struct Report {
    suite: &'static str,
    total: usize,
    problems: Vec<(&'static str, Outcome)>,
}

impl Report {
    fn print(&self) {
        println!(
            "{}: {}/{} passed",
            self.suite,
            self.total - self.problems.len(),
            self.total
        );
        for (name, problem) in &self.problems {
            match problem {
                Outcome::Fail(reason) => println!("  FAIL  {}: {}", name, reason),
                Outcome::Crash(reason) => println!("  CRASH {}: {}", name, reason),
                Outcome::Pass => {}
            }
        }
    }

    fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

fn check(case: &Case) -> Outcome {
    let errors = match panic::catch_unwind(AssertUnwindSafe(|| parse(&case.input).1)) {
        Ok(errors) => errors,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "unknown panic".to_string());
            return Outcome::Crash(reason);
        }
    };

    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    match case.expect {
        Expect::Parses if messages.is_empty() => Outcome::Pass,
        Expect::Parses => Outcome::Fail(format!("unexpected errors {:?}", messages)),
        Expect::Rejects | Expect::RejectsWith(_) if messages.is_empty() => {
            Outcome::Fail("parsed without errors".to_string())
        }
        Expect::RejectsWith(expected) if !messages.iter().any(|m| m.contains(expected)) => {
            Outcome::Fail(format!("no error mentions '{}': {:?}", expected, messages))
        }
        Expect::Rejects | Expect::RejectsWith(_) => Outcome::Pass,
    }
}

fn unbalanced_delimiters() -> Suite {
    Suite::new("unbalanced delimiters")
        .rejects_with("open_paren", "(1 + 2", "expected ), got EOF")
        .rejects_with("nested_open_paren", "((1 + 2)", "expected ), got EOF")
        .rejects_with("stray_close_paren", "1 + 2)", "no prefix parse function for ) found")
        .rejects_with("empty_group", "1 + ()", "no prefix parse function for ) found")
        .rejects_with("open_brace", "{ x = 1;", "expected }, got EOF")
        .rejects_with("stray_close_brace", "x = 1; }", "no prefix parse function for } found")
}

fn edge_cases() -> Suite {
    Suite::new("edge cases")
        .parses("empty_input", "")
        .parses("only_whitespace", "   \n\t  ")
        .parses("only_comment", "// nothing to see")
        .rejects("dangling_operator", "1 +")
        .rejects("dangling_group", "1 + (")
        .parses("deep_nesting", "(".repeat(100) + "1" + &")".repeat(100))
}

fn let_statements() -> Suite {
    Suite::new("let statements")
        .parses("number", "let x: number = 5;")
        .parses("string", "let s: string = \"hi\";")
        .parses("bool_from_comparison", "let b: bool = 1 < 2;")
        .parses("no_initializer", "let x: string;")
        .rejects_with("missing_annotation", "let x = 5;", "expected :, got =")
        .rejects_with("unknown_type", "let x: int = 5;", "expected TYPE, got IDENT")
        .rejects_with("missing_name", "let : number = 5;", "expected IDENT, got :")
        .rejects_with("missing_equals", "let x: number 5;", "expected =, got NUMBER")
        .rejects_with("digit_in_name", "let abc1: number = 1;", "expected :, got NUMBER")
}

fn operators() -> Suite {
    Suite::new("operators")
        .rejects("missing_left_operand", "+ 1")
        .rejects("lone_operator", "+")
        .rejects("double_plus", "1 ++ 2")
        .parses("minus_negate", "1 -- 2")
        .parses("equal", "1 == 2")
        .parses("not_equal", "1 != 2")
        .parses("less", "1 < 2")
        .parses("less_equal", "1 <= 2")
        .parses("greater_equal", "1 >= 2")
        .parses("bang", "!true")
        .rejects_with("illegal_character", "x = 1 @ 2;", "illegal token @")
}

fn control_flow() -> Suite {
    Suite::new("control flow")
        .parses("if", "if (true) { x = 1; }")
        .parses("if_else", "if (x > 1) { x = 1; } else { x = 2; }")
        .rejects_with("if_without_condition", "if { x = 1; }", "expected (, got {")
        .rejects_with("if_without_body", "if (true)", "expected {, got EOF")
        .parses("while", "while (x < 3) { x = x + 1; }")
        .rejects("while_without_condition", "while { x = 1; }")
        .rejects("while_without_body", "while (true)")
        .parses("return", "return 1 + 2;")
        .parses("bare_block", "{ let y: number = 1; }")
}

fn literals() -> Suite {
    Suite::new("literals")
        .parses("number", "42")
        .parses("string", "\"hello\"")
        .parses("empty_string", "\"\"")
        .parses("true", "true")
        .parses("false", "false")
        .rejects_with("unterminated_string", "\"hello", "illegal token \"hello")
}

fn functions() -> Suite {
    Suite::new("functions")
        .parses("declaration", "func add(a, b) { return a + b; }")
        .parses("no_parameters", "func f() { }")
        .rejects_with("missing_name", "func () { }", "expected IDENT, got (")
        .rejects_with("missing_comma", "func f(a b) { }", "expected ), got IDENT")
        .parses("call", "foo()")
        .parses("call_with_arguments", "foo(1, 2, 3)")
        .parses("dotted_call", "Obniz.LED.ON(1);")
        .rejects_with("dotted_missing_segment", "Obniz.();", "expected IDENT, got (")
        .rejects("unclosed_call", "foo(1, 2")
        .rejects("trailing_comma", "foo(1, 2,)")
        .parses(
            "recursive_fib",
            "func fib(a) { if (a < 3) { return 1; } return fib(a-2) + fib(a-1); } fib(5);",
        )
}

#[test]
fn parser_robustness_suites() {
    let suites = [
        unbalanced_delimiters(),
        edge_cases(),
        let_statements(),
        operators(),
        control_flow(),
        literals(),
        functions(),
    ];

    let failing: Vec<&str> = suites
        .iter()
        .map(Suite::run)
        .filter(|report| !report.is_clean())
        .map(|report| report.suite)
        .collect();

    assert!(failing.is_empty(), "failing suites: {:?}", failing);
}
