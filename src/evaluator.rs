use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::builtins::{BuiltinRegistry, BuiltinResolver, HostValue, InputFn, InputFuture, OutputFn};
use crate::debugger::{Checkpoint, DebugSession, Stepper};
use crate::environment::{Environment, Function};
use crate::value::{Builtin, Value};
use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Boxed so the statement/expression/call recursion has a finite future type.
pub type EvalFuture<'a> = Pin<Box<dyn Future<Output = Value> + 'a>>;

/// Nested user function calls allowed before a call fails with
/// `maximum call depth exceeded`.
pub const MAX_CALL_DEPTH: usize = 1000;

/// Grow the stack when less than this remains before polling a statement.
const RED_ZONE: usize = 100 * 1024;

/// Size of each stack segment `stacker` allocates.
const STACK_PER_SEGMENT: usize = 1024 * 1024;

/// Polls a statement on a fresh stack segment when the current one runs low.
/// Every language-level call passes through a statement, so nested calls
/// never exhaust the native stack before the depth limit is reached.
struct StackSafe<'a>(EvalFuture<'a>);

impl Future for StackSafe<'_> {
    type Output = Value;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Value> {
        let inner = &mut self.0;
        stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, || inner.as_mut().poll(cx))
    }
}

/// One active user function call; leaving it, by return or by the future
/// being dropped, pops the depth again.
struct CallFrame(Rc<Cell<usize>>);

impl CallFrame {
    fn enter(depth: &Rc<Cell<usize>>) -> Self {
        depth.set(depth.get() + 1);
        CallFrame(depth.clone())
    }
}

impl Drop for CallFrame {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

enum Callee {
    User(Rc<Function>),
    Builtin(Builtin),
}

/// Tree-walking interpreter. The same code path serves run-to-completion
/// ([`Evaluator::eval_program`]) and stepping ([`Evaluator::debug`]); the
/// only difference is whether a stepper is installed to receive checkpoints.
pub struct Evaluator {
    output: OutputFn,
    input: InputFn,
    builtins: BuiltinRegistry,
    call_depth: Rc<Cell<usize>>,
    max_call_depth: usize,
    pub(crate) stepper: Option<Stepper>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Output goes to stdout and `Input()` always yields `null` until the
    /// host installs its own callbacks.
    pub fn new() -> Self {
        Self {
            output: Box::new(|value| println!("{}", value)),
            input: Box::new(|| Box::pin(std::future::ready(None))),
            builtins: BuiltinRegistry::new(),
            call_depth: Rc::new(Cell::new(0)),
            max_call_depth: MAX_CALL_DEPTH,
            stepper: None,
        }
    }

    pub fn with_output<F>(mut self, output: F) -> Self
    where
        F: FnMut(HostValue) + 'static,
    {
        self.output = Box::new(output);
        self
    }

    pub fn with_input<F>(mut self, input: F) -> Self
    where
        F: FnMut() -> InputFuture + 'static,
    {
        self.input = Box::new(input);
        self
    }

    pub fn with_resolver<R>(mut self, prefix: &str, resolver: R) -> Self
    where
        R: BuiltinResolver + 'static,
    {
        self.builtins.register(prefix, resolver);
        self
    }

    pub fn with_max_call_depth(mut self, limit: usize) -> Self {
        self.max_call_depth = limit;
        self
    }

    /// User function calls currently on the stack.
    pub fn call_depth(&self) -> usize {
        self.call_depth.get()
    }

    pub fn builtins_mut(&mut self) -> &mut BuiltinRegistry {
        &mut self.builtins
    }

    /// Run every statement to completion. A top-level `return` ends the
    /// program with its payload; an `Error` is handed back unchanged.
    pub async fn eval_program(&mut self, program: &Program, env: &Environment) -> Value {
        self.eval_statements(&program.statements, env).await
    }

    /// Step through the program one statement at a time.
    pub fn debug(self, program: &Program, env: Environment) -> DebugSession {
        DebugSession::new(self, program, env)
    }

    pub(crate) fn eval_statements<'a>(
        &'a mut self,
        statements: &'a [Rc<Stmt>],
        env: &'a Environment,
    ) -> EvalFuture<'a> {
        Box::pin(async move {
            let mut result = Value::Null;
            for stmt in statements {
                result = self.eval_statement(stmt, env).await;
                if let Value::Return(value) = result {
                    return *value;
                }
                if result.is_error() {
                    return result;
                }
            }
            result
        })
    }

    fn eval_block<'a>(&'a mut self, block: &'a Block, env: &'a Environment) -> EvalFuture<'a> {
        Box::pin(async move {
            let mut result = Value::Null;
            for stmt in &block.statements {
                result = self.eval_statement(stmt, env).await;
                if result.is_control() {
                    return result;
                }
            }
            result
        })
    }

    fn eval_statement<'a>(&'a mut self, stmt: &'a Rc<Stmt>, env: &'a Environment) -> EvalFuture<'a> {
        Box::pin(StackSafe(Box::pin(async move {
            let value = match stmt.as_ref() {
                Stmt::If {
                    condition,
                    consequence,
                    alternative,
                    ..
                } => {
                    return self
                        .eval_if(stmt, condition, consequence, alternative.as_deref(), env)
                        .await
                }
                Stmt::While {
                    condition, body, ..
                } => return self.eval_while(stmt, condition, body, env).await,
                Stmt::Block(block) => return self.eval_block(block, &env.enclosed()).await,
                Stmt::Let {
                    name,
                    annotation,
                    value,
                    ..
                } => match value {
                    Some(expr) => {
                        let value = self.eval_expression(expr, env).await;
                        if value.is_error() {
                            value
                        } else if value.type_name() != annotation.type_name() {
                            Value::error(format!(
                                "type mismatch: got={}, expected={}",
                                value.type_name(),
                                annotation.type_name()
                            ))
                        } else {
                            env.set(name, value);
                            Value::Null
                        }
                    }
                    None => {
                        env.set(name, Value::Null);
                        Value::Null
                    }
                },
                Stmt::Assign { name, value, .. } => {
                    let value = self.eval_expression(value, env).await;
                    if value.is_error() {
                        value
                    } else {
                        match env.update(name, value) {
                            Ok(()) => Value::Null,
                            Err(error) => Value::error(error.to_string()),
                        }
                    }
                }
                Stmt::Return { value, .. } => {
                    let value = self.eval_expression(value, env).await;
                    if value.is_error() {
                        value
                    } else {
                        Value::Return(Box::new(value))
                    }
                }
                Stmt::Expression { expr, .. } => self.eval_expression(expr, env).await,
                Stmt::Function {
                    name,
                    parameters,
                    body,
                    ..
                } => {
                    env.define_function(Function {
                        name: name.clone(),
                        parameters: parameters.clone(),
                        body: body.clone(),
                    });
                    Value::Null
                }
            };

            self.checkpoint(stmt, env).await;
            value
        })))
    }

    /// Condition and chosen branch share one child scope. The statement's
    /// checkpoint follows the condition, before the branch runs.
    async fn eval_if(
        &mut self,
        stmt: &Rc<Stmt>,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Block>,
        env: &Environment,
    ) -> Value {
        let scope = env.enclosed();
        let condition = self.eval_expression(condition, &scope).await;
        self.checkpoint(stmt, &scope).await;
        if condition.is_error() {
            return condition;
        }

        let result = if condition.is_true() {
            self.eval_block(consequence, &scope).await
        } else if let Some(alternative) = alternative {
            self.eval_block(alternative, &scope).await
        } else {
            Value::Null
        };

        if result.is_control() {
            result
        } else {
            Value::Null
        }
    }

    /// The condition runs in the enclosing scope and is checkpointed on every
    /// check, including the final failing one. Each iteration's body gets a
    /// fresh child scope.
    async fn eval_while(
        &mut self,
        stmt: &Rc<Stmt>,
        condition: &Expr,
        body: &Block,
        env: &Environment,
    ) -> Value {
        loop {
            let test = self.eval_expression(condition, env).await;
            self.checkpoint(stmt, env).await;
            if test.is_error() {
                return test;
            }
            if !test.is_true() {
                return Value::Null;
            }

            let result = self.eval_block(body, &env.enclosed()).await;
            if result.is_control() {
                return result;
            }
        }
    }

    async fn checkpoint(&self, stmt: &Rc<Stmt>, env: &Environment) {
        if let Some(stepper) = &self.stepper {
            tracing::trace!(line = stmt.line(), "checkpoint");
            stepper
                .pause(Checkpoint {
                    node: stmt.clone(),
                    env: env.clone(),
                })
                .await;
        }
    }

    pub fn eval_expression<'a>(&'a mut self, expr: &'a Expr, env: &'a Environment) -> EvalFuture<'a> {
        Box::pin(async move {
            match expr {
                Expr::Number(n) => Value::Number(*n),
                Expr::String(s) => Value::string(s),
                Expr::Boolean(b) => Value::from_bool(*b),
                Expr::Identifier(name) => self.eval_identifier(name, env),
                Expr::Prefix { operator, right } => {
                    let right = self.eval_expression(right, env).await;
                    if right.is_error() {
                        return right;
                    }
                    eval_prefix(*operator, right)
                }
                Expr::Infix {
                    left,
                    operator,
                    right,
                } => {
                    let left = self.eval_expression(left, env).await;
                    if left.is_error() {
                        return left;
                    }
                    let right = self.eval_expression(right, env).await;
                    if right.is_error() {
                        return right;
                    }
                    eval_infix(*operator, left, right)
                }
                Expr::Call {
                    function,
                    arguments,
                } => self.eval_call(function, arguments, env).await,
            }
        })
    }

    /// Bindings first, then the intrinsics, then dotted names via the registry.
    fn eval_identifier(&self, name: &str, env: &Environment) -> Value {
        if let Some(value) = env.get(name) {
            return value;
        }
        if let Some(builtin) = Builtin::intrinsic(name) {
            return Value::Builtin(builtin);
        }
        if name.contains('.') {
            if let Some(native) = self.builtins.resolve(name) {
                return Value::Builtin(Builtin::Native(native));
            }
        }
        Value::error(format!("{} is not found", name))
    }

    fn resolve_callee(&self, function: &Expr, env: &Environment) -> Result<Callee, Value> {
        let name = match function {
            Expr::Identifier(name) => name,
            _ => return Err(Value::error("cannot match node")),
        };

        if !name.contains('.') {
            if let Some(function) = env.function(name) {
                return Ok(Callee::User(function));
            }
        }

        match self.eval_identifier(name, env) {
            Value::Builtin(builtin) => Ok(Callee::Builtin(builtin)),
            Value::Error(message) => Err(Value::Error(message)),
            other => Err(Value::error(format!("not a function: {}", other.type_name()))),
        }
    }

    async fn eval_call(&mut self, function: &Expr, arguments: &[Expr], env: &Environment) -> Value {
        let callee = match self.resolve_callee(function, env) {
            Ok(callee) => callee,
            Err(error) => return error,
        };

        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let value = self.eval_expression(argument, env).await;
            if value.is_error() {
                return value;
            }
            args.push(value);
        }

        match callee {
            Callee::User(function) => self.apply_function(&function, args, env).await,
            Callee::Builtin(builtin) => self.apply_builtin(&builtin, args).await,
        }
    }

    /// Parameters are bound in a child of the caller's scope, not the scope
    /// the function was declared in.
    async fn apply_function(&mut self, function: &Function, args: Vec<Value>, env: &Environment) -> Value {
        if args.len() != function.parameters.len() {
            return wrong_arguments(function.parameters.len(), args.len());
        }

        let depth = self.call_depth.get();
        if depth >= self.max_call_depth {
            tracing::debug!(function = %function.name, depth, "call depth limit reached");
            return Value::error("maximum call depth exceeded");
        }
        let _call = CallFrame::enter(&self.call_depth);

        tracing::trace!(function = %function.name, depth, scope = env.depth(), "call");

        let frame = env.enclosed();
        for (parameter, arg) in function.parameters.iter().zip(args) {
            frame.set(parameter, arg);
        }

        match self.eval_block(&function.body, &frame).await {
            Value::Return(value) => *value,
            error @ Value::Error(_) => error,
            _ => Value::Null,
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(builtin = builtin.name()))]
    async fn apply_builtin(&mut self, builtin: &Builtin, args: Vec<Value>) -> Value {
        match builtin {
            Builtin::Println => {
                if args.len() != 1 {
                    return wrong_arguments(1, args.len());
                }
                (self.output)(HostValue::from_value(&args[0]));
                Value::Null
            }
            Builtin::Input => {
                if !args.is_empty() {
                    return wrong_arguments(0, args.len());
                }
                let answer = (self.input)().await;
                answer.map_or(Value::Null, HostValue::into_value)
            }
            Builtin::Native(native) => match native.call(args).await {
                Some(Value::Return(value)) => *value,
                Some(value) => value,
                None => Value::Null,
            },
        }
    }
}

fn wrong_arguments(want: usize, got: usize) -> Value {
    Value::error(format!("wrong number of arguments: want={}, got={}", want, got))
}

fn eval_prefix(operator: PrefixOp, right: Value) -> Value {
    match operator {
        PrefixOp::Not => match right {
            Value::Boolean(b) => Value::from_bool(!b),
            Value::Null => Value::TRUE,
            _ => Value::FALSE,
        },
        PrefixOp::Negate => match right {
            Value::Number(n) => Value::Number(-n),
            other => Value::error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_infix(operator: InfixOp, left: Value, right: Value) -> Value {
    match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => eval_number_infix(operator, *l, *r),
        (Value::String(l), Value::String(r))
            if matches!(operator, InfixOp::Add | InfixOp::Less | InfixOp::Greater) =>
        {
            eval_string_infix(operator, l, r)
        }
        _ => match operator {
            InfixOp::Equal => Value::from_bool(left.identical(&right)),
            InfixOp::NotEqual => Value::from_bool(!left.identical(&right)),
            _ if left.type_name() != right.type_name() => Value::error(format!(
                "type mismatch: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
            _ => Value::error(format!(
                "unknown operator: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
        },
    }
}

fn eval_number_infix(operator: InfixOp, l: f64, r: f64) -> Value {
    match operator {
        InfixOp::Add => Value::Number(l + r),
        InfixOp::Subtract => Value::Number(l - r),
        InfixOp::Multiply => Value::Number(l * r),
        InfixOp::Divide => Value::Number(l / r),
        InfixOp::Equal => Value::from_bool(l == r),
        InfixOp::NotEqual => Value::from_bool(l != r),
        InfixOp::Less => Value::from_bool(l < r),
        InfixOp::LessEqual => Value::from_bool(l <= r),
        InfixOp::Greater => Value::from_bool(l > r),
        InfixOp::GreaterEqual => Value::from_bool(l >= r),
    }
}

fn eval_string_infix(operator: InfixOp, l: &str, r: &str) -> Value {
    match operator {
        InfixOp::Add => Value::string(&format!("{}{}", l, r)),
        InfixOp::Less => Value::from_bool(l < r),
        InfixOp::Greater => Value::from_bool(l > r),
        _ => Value::error(format!("unknown operator: STRING {} STRING", operator)),
    }
}
