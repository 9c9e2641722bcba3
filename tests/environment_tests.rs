use pretty_assertions::assert_eq;
use std::rc::Rc;
use steplang::ast::Block;
use steplang::environment::{AssignError, Environment, Function};
use steplang::lexer::Position;
use steplang::Value;

#[test]
fn test_set_and_get() {
    let env = Environment::new();
    env.set("x", Value::Number(1.0));

    assert_eq!(env.get("x"), Some(Value::Number(1.0)));
    assert_eq!(env.get("y"), None);
}

#[test]
fn test_inner_set_shadows_outer() {
    let outer = Environment::new();
    outer.set("x", Value::Number(1.0));

    let inner = outer.enclosed();
    assert_eq!(inner.get("x"), Some(Value::Number(1.0)));

    inner.set("x", Value::string("shadow"));
    assert_eq!(inner.get("x"), Some(Value::string("shadow")));
    assert_eq!(outer.get("x"), Some(Value::Number(1.0)));
}

#[test]
fn test_update_walks_outward() {
    let outer = Environment::new();
    outer.set("x", Value::Number(1.0));
    let inner = outer.enclosed().enclosed();

    inner.update("x", Value::Number(2.0)).unwrap();

    assert_eq!(outer.get("x"), Some(Value::Number(2.0)));
    assert!(inner.bindings().is_empty());
}

#[test]
fn test_update_checks_type() {
    let env = Environment::new();
    env.set("x", Value::Number(1.0));

    let error = env.update("x", Value::string("a")).unwrap_err();
    assert_eq!(
        error,
        AssignError::TypeMismatch {
            got: "STRING",
            expected: "NUMBER"
        }
    );
    assert_eq!(error.to_string(), "type mismatch: got=STRING, expected=NUMBER");
    assert_eq!(env.get("x"), Some(Value::Number(1.0)));
}

#[test]
fn test_null_slot_accepts_anything_once() {
    let env = Environment::new();
    env.set("x", Value::Null);

    env.update("x", Value::string("first")).unwrap();
    assert_eq!(env.get("x"), Some(Value::string("first")));

    // The slot now carries STRING
    assert!(env.update("x", Value::Boolean(true)).is_err());
}

#[test]
fn test_update_unknown_name() {
    let env = Environment::new().enclosed();

    let error = env.update("missing", Value::Number(1.0)).unwrap_err();
    assert_eq!(error.to_string(), "missing is not found");
}

#[test]
fn test_bindings_and_visible_bindings() {
    let root = Environment::new();
    root.set("b", Value::Number(1.0));
    root.set("a", Value::Number(2.0));

    let child = root.enclosed();
    child.set("b", Value::Boolean(true));
    child.set("c", Value::Null);

    assert_eq!(
        child.bindings(),
        vec![
            ("b".to_string(), Value::Boolean(true)),
            ("c".to_string(), Value::Null),
        ]
    );
    assert_eq!(
        child.visible_bindings(),
        vec![
            ("a".to_string(), Value::Number(2.0)),
            ("b".to_string(), Value::Boolean(true)),
            ("c".to_string(), Value::Null),
        ]
    );
}

#[test]
fn test_depth_and_outer() {
    let root = Environment::new();
    let child = root.enclosed();
    let grandchild = child.enclosed();

    assert_eq!(root.depth(), 0);
    assert_eq!(grandchild.depth(), 2);
    assert!(grandchild.outer().is_some_and(|env| env.ptr_eq(&child)));
    assert!(root.outer().is_none());
}

#[test]
fn test_handles_share_a_frame() {
    let env = Environment::new();
    let handle = env.clone();

    env.set("x", Value::Number(3.0));
    assert_eq!(handle.get("x"), Some(Value::Number(3.0)));
    assert!(handle.ptr_eq(&env));
    assert!(!env.enclosed().ptr_eq(&env));
}

#[test]
fn test_function_lookup() {
    let root = Environment::new();
    root.define_function(Function {
        name: "f".to_string(),
        parameters: Rc::from(vec!["a".to_string()]),
        body: Rc::new(Block {
            statements: Vec::new(),
            position: Position::default(),
        }),
    });

    let inner = root.enclosed();
    let function = inner.function("f").unwrap();
    assert_eq!(function.name, "f");
    assert_eq!(function.parameters.len(), 1);
    assert!(inner.function("g").is_none());

    // Functions and variables live in separate tables
    assert_eq!(inner.get("f"), None);
}
