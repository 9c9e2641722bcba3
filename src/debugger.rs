use crate::ast::{Program, Stmt};
use crate::environment::Environment;
use crate::evaluator::Evaluator;
use crate::lexer::Position;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Snapshot handed to the consumer after a statement has fully executed.
///
/// `env` is a live handle, not a copy: reading it later shows any mutations
/// made by statements that ran since. Consumers must not mutate it.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub node: Rc<Stmt>,
    pub env: Environment,
}

impl Checkpoint {
    pub fn position(&self) -> Position {
        self.node.position()
    }

    pub fn line(&self) -> usize {
        self.node.line()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, nothing executed yet.
    Ready,
    /// A checkpoint was produced and the program is parked behind it.
    Suspended,
    /// The program ran to its end; see [`DebugSession::result`].
    Completed,
    /// Stopped by [`DebugSession::cancel`] or a [`CancelHandle`].
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// Channel between the evaluator and its session: the evaluator parks a
/// checkpoint here and then yields once.
#[derive(Clone, Default)]
pub(crate) struct Stepper {
    slot: Rc<RefCell<Option<Checkpoint>>>,
}

impl Stepper {
    pub(crate) async fn pause(&self, checkpoint: Checkpoint) {
        *self.slot.borrow_mut() = Some(checkpoint);

        let mut yielded = false;
        std::future::poll_fn(move |_| {
            if yielded {
                Poll::Ready(())
            } else {
                yielded = true;
                Poll::Pending
            }
        })
        .await;
    }

    fn take(&self) -> Option<Checkpoint> {
        self.slot.borrow_mut().take()
    }
}

#[derive(Default)]
struct CancelState {
    cancelled: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

/// Cooperative stop signal for a [`DebugSession`]. Cloneable so a host
/// callback (for example the input provider) can cancel the session it
/// is serving.
#[derive(Clone, Default)]
pub struct CancelHandle(Rc<CancelState>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.cancelled.set(true);
        if let Some(waker) = self.0.waker.borrow_mut().take() {
            waker.wake();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.get()
    }

    fn register(&self, waker: &Waker) {
        *self.0.waker.borrow_mut() = Some(waker.clone());
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Step-wise execution of a program: one [`Checkpoint`] per executed
/// statement, in execution order. A session runs once; build a new one to
/// run again.
pub struct DebugSession {
    future: Option<Pin<Box<dyn Future<Output = Value>>>>,
    stepper: Stepper,
    cancel: CancelHandle,
    state: SessionState,
    result: Option<Value>,
    env: Environment,
}

impl DebugSession {
    pub fn new(mut evaluator: Evaluator, program: &Program, env: Environment) -> Self {
        let stepper = Stepper::default();
        evaluator.stepper = Some(stepper.clone());

        let statements = program.statements.clone();
        let root = env.clone();
        let future: Pin<Box<dyn Future<Output = Value>>> =
            Box::pin(async move { evaluator.eval_statements(&statements, &root).await });

        Self {
            future: Some(future),
            stepper,
            cancel: CancelHandle::default(),
            state: SessionState::Ready,
            result: None,
            env,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Program value once `Completed`; identical to what
    /// [`Evaluator::eval_program`] returns for the same program.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Root environment the program runs against.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.stop();
    }

    /// Run until the next statement finishes. Returns `None` once the session
    /// is completed or cancelled, and keeps returning `None` afterwards.
    pub async fn next(&mut self) -> Option<Checkpoint> {
        std::future::poll_fn(|cx| self.poll_next(cx)).await
    }

    /// Drain the remaining checkpoints and return the program value, or
    /// `None` if the session was cancelled.
    pub async fn run_to_end(&mut self) -> Option<Value> {
        while self.next().await.is_some() {}
        self.result.clone()
    }

    fn poll_next(&mut self, cx: &mut Context<'_>) -> Poll<Option<Checkpoint>> {
        if self.cancel.is_cancelled() {
            self.stop();
            return Poll::Ready(None);
        }

        let future = match self.future.as_mut() {
            Some(future) => future,
            None => return Poll::Ready(None),
        };

        match future.as_mut().poll(cx) {
            Poll::Ready(value) => {
                self.future = None;
                self.result = Some(value);
                self.transition(SessionState::Completed);
                Poll::Ready(None)
            }
            Poll::Pending => match self.stepper.take() {
                Some(checkpoint) => {
                    self.transition(SessionState::Suspended);
                    Poll::Ready(Some(checkpoint))
                }
                None => {
                    // Waiting on the host; let a cancel wake us up
                    self.cancel.register(cx.waker());
                    if self.cancel.is_cancelled() {
                        self.stop();
                        return Poll::Ready(None);
                    }
                    Poll::Pending
                }
            },
        }
    }

    fn stop(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.future = None;
        self.stepper.take();
        self.transition(SessionState::Cancelled);
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "debug session");
            self.state = next;
        }
    }
}

impl fmt::Debug for DebugSession {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DebugSession")
            .field("state", &self.state)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}
