use crate::ast::Block;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// A user function as declared by `func`.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub parameters: Rc<[String]>,
    pub body: Rc<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    #[error("{name} is not found")]
    NotFound { name: String },
    #[error("type mismatch: got={got}, expected={expected}")]
    TypeMismatch {
        got: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Default)]
struct Frame {
    bindings: HashMap<String, Value>,
    functions: HashMap<String, Rc<Function>>,
    outer: Option<Environment>,
}

/// Handle to one scope frame. Cloning the handle shares the frame, so a
/// debugger holding one observes later mutations.
///
/// Frames only point outward, so the chain is a tree and never forms a cycle;
/// a child frame is released as soon as the construct that created it is done.
#[derive(Debug, Clone, Default)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh child scope whose lookups fall through to `self`.
    pub fn enclosed(&self) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            outer: Some(self.clone()),
            ..Frame::default()
        })))
    }

    pub fn outer(&self) -> Option<Environment> {
        self.0.borrow().outer.clone()
    }

    /// Number of frames between this one and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.outer();
        while let Some(env) = current {
            depth += 1;
            current = env.outer();
        }
        depth
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            let frame = env.0.borrow();
            if let Some(value) = frame.bindings.get(name) {
                return Some(value.clone());
            }
            current = frame.outer.clone();
        }
        None
    }

    /// Declare in this frame, shadowing any outer binding of the same name.
    pub fn set(&self, name: &str, value: Value) {
        self.0.borrow_mut().bindings.insert(name.to_string(), value);
    }

    /// Mutate the nearest existing binding. A slot holding `Null` accepts any
    /// value; otherwise the new value must carry the same tag.
    pub fn update(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            let mut frame = env.0.borrow_mut();
            if let Some(slot) = frame.bindings.get_mut(name) {
                if !matches!(slot, Value::Null) && slot.type_name() != value.type_name() {
                    return Err(AssignError::TypeMismatch {
                        got: value.type_name(),
                        expected: slot.type_name(),
                    });
                }
                *slot = value;
                return Ok(());
            }
            current = frame.outer.clone();
        }

        Err(AssignError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn define_function(&self, function: Function) {
        self.0
            .borrow_mut()
            .functions
            .insert(function.name.clone(), Rc::new(function));
    }

    pub fn function(&self, name: &str) -> Option<Rc<Function>> {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            let frame = env.0.borrow();
            if let Some(function) = frame.functions.get(name) {
                return Some(function.clone());
            }
            current = frame.outer.clone();
        }
        None
    }

    /// Bindings of this frame only, sorted by name.
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<_> = self
            .0
            .borrow()
            .bindings
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    /// Every binding reachable from this frame, inner frames shadowing outer
    /// ones, sorted by name.
    pub fn visible_bindings(&self) -> Vec<(String, Value)> {
        let mut seen: HashMap<String, Value> = HashMap::new();
        let mut current = Some(self.clone());
        while let Some(env) = current {
            for (name, value) in env.bindings() {
                seen.entry(name).or_insert(value);
            }
            current = env.outer();
        }

        let mut bindings: Vec<_> = seen.into_iter().collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}
