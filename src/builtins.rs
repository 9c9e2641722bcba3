use crate::value::{NativeFunction, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// Primitive exchanged with the host through the input and output callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl HostValue {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => HostValue::Number(*n),
            Value::String(s) => HostValue::String(s.to_string()),
            Value::Boolean(b) => HostValue::Boolean(*b),
            Value::Null => HostValue::Null,
            Value::Return(inner) => HostValue::from_value(inner),
            Value::Error(_) | Value::Builtin(_) => HostValue::String(value.to_string()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            HostValue::String(s) => Value::string(&s),
            HostValue::Number(n) => Value::Number(n),
            HostValue::Boolean(b) => Value::from_bool(b),
            HostValue::Null => Value::Null,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HostValue::String(s) => write!(f, "{}", s),
            HostValue::Number(n) => write!(f, "{}", n),
            HostValue::Boolean(b) => write!(f, "{}", b),
            HostValue::Null => write!(f, "null"),
        }
    }
}

/// Pending answer from the host. `None` means no input was available.
pub type InputFuture = Pin<Box<dyn Future<Output = Option<HostValue>>>>;
pub type InputFn = Box<dyn FnMut() -> InputFuture>;
pub type OutputFn = Box<dyn FnMut(HostValue)>;

/// Maps a dotted call path such as `["Obniz", "LED", "ON"]` to a callable.
pub trait BuiltinResolver {
    fn resolve(&self, path: &[&str]) -> Option<NativeFunction>;
}

impl<F> BuiltinResolver for F
where
    F: Fn(&[&str]) -> Option<NativeFunction>,
{
    fn resolve(&self, path: &[&str]) -> Option<NativeFunction> {
        self(path)
    }
}

/// Resolvers keyed by the first segment of the dotted name.
#[derive(Default, Clone)]
pub struct BuiltinRegistry {
    resolvers: HashMap<String, Rc<dyn BuiltinResolver>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R>(&mut self, prefix: &str, resolver: R)
    where
        R: BuiltinResolver + 'static,
    {
        self.resolvers.insert(prefix.to_string(), Rc::new(resolver));
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Option<NativeFunction> {
        let path: Vec<&str> = name.split('.').collect();
        let resolver = self.resolvers.get(*path.first()?)?;
        resolver.resolve(&path)
    }
}

impl fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut prefixes: Vec<_> = self.resolvers.keys().collect();
        prefixes.sort();
        f.debug_struct("BuiltinRegistry")
            .field("prefixes", &prefixes)
            .finish()
    }
}

/// Resolver backed by a fixed table of full dotted paths.
#[derive(Debug, Default, Clone)]
pub struct FunctionTable {
    functions: HashMap<String, NativeFunction>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, function: NativeFunction) {
        self.functions.insert(function.name().to_string(), function);
    }

    pub fn with(mut self, function: NativeFunction) -> Self {
        self.insert(function);
        self
    }
}

impl BuiltinResolver for FunctionTable {
    fn resolve(&self, path: &[&str]) -> Option<NativeFunction> {
        self.functions.get(&path.join(".")).cloned()
    }
}
