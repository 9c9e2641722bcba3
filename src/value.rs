use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// Result of a native call. `None` means the callable produced nothing.
pub type NativeFuture = Pin<Box<dyn Future<Output = Option<Value>>>>;

/// Runtime values. `Return` and `Error` are control values: they are never
/// bound in an environment and short-circuit the construct that sees them.
///
/// `PartialEq` is structural and meant for hosts and tests; the language's
/// own `==` goes through [`Value::identical`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(Rc<str>),
    Boolean(bool),
    Null,
    Return(Box<Value>),
    Error(String),
    Builtin(Builtin),
}

impl Value {
    pub const TRUE: Value = Value::Boolean(true);
    pub const FALSE: Value = Value::Boolean(false);

    pub fn from_bool(b: bool) -> Self {
        if b {
            Value::TRUE
        } else {
            Value::FALSE
        }
    }

    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "NUMBER",
            Value::String(_) => "STRING",
            Value::Boolean(_) => "BOOL",
            Value::Null => "NULL",
            Value::Return(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// `Return` or `Error`: stop the enclosing block and hand it upward.
    pub fn is_control(&self) -> bool {
        matches!(self, Value::Return(_) | Value::Error(_))
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }

    /// Language-level identity. Numbers compare by value, booleans and null are
    /// singletons, and every other value is equal only to the same instance.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Null, Value::Null) => true,
            (Value::String(l), Value::String(r)) => Rc::ptr_eq(l, r),
            (Value::Builtin(l), Value::Builtin(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Return(value) => write!(f, "{}", value),
            Value::Error(message) => write!(f, "ERROR: {}", message),
            Value::Builtin(builtin) => write!(f, "builtin function {}", builtin.name()),
        }
    }
}

/// Callable values that are not written in the language itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Builtin {
    /// Forwards its argument to the host output callback.
    Println,
    /// Awaits the host input callback.
    Input,
    /// Anything handed out by a registered resolver.
    Native(NativeFunction),
}

impl Builtin {
    pub fn name(&self) -> &str {
        match self {
            Builtin::Println => "Println",
            Builtin::Input => "Input",
            Builtin::Native(native) => native.name(),
        }
    }

    pub fn intrinsic(name: &str) -> Option<Builtin> {
        match name {
            "Println" => Some(Builtin::Println),
            "Input" => Some(Builtin::Input),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    func: Rc<dyn Fn(Vec<Value>) -> NativeFuture>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(Vec<Value>) -> NativeFuture + 'static,
    {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    /// Wrap a callable that finishes immediately.
    pub fn sync<F>(name: &str, func: F) -> Self
    where
        F: Fn(Vec<Value>) -> Option<Value> + 'static,
    {
        Self::new(name, move |args| {
            let result = func(args);
            Box::pin(std::future::ready(result))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: Vec<Value>) -> NativeFuture {
        (self.func)(args)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.func), Rc::as_ptr(&other.func))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
