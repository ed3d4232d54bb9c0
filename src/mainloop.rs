//! The single-threaded event loop driving state-change dispatch.
//!
//! A [`Mainloop`] owns a FIFO queue of pending state transitions and a
//! routing table from [`ContextToken`] to the context that registered it.
//! Client code polls the loop synchronously, one [`iterate`](Mainloop::iterate)
//! per tick; each tick dispatches every transition that is ready, routing it
//! to the owning context and invoking that context's observer.
//!
//! Two handle types hang off a loop:
//!
//! - [`MainloopApi`]: the dispatch interface contexts are created against
//!   (see [`Context::new`](crate::Context::new)). Holds the loop alive.
//! - [`TransitionFeed`]: the injection point the server side of the
//!   connection pushes transitions through. Holds only a weak reference, so
//!   a feed can outlive its loop; using it afterwards reports
//!   [`MainloopGone`](crate::PulseWatchError::MainloopGone).

use crate::context::{self, ContextInner};
use crate::state::ContextState;
use crate::{PulseWatchError, Result};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Stable identifier the loop uses to route state changes back to the
/// owning context.
///
/// Tokens are allocated when a context is created and never reused within a
/// loop. A transition carrying a token whose context has since been dropped
/// is discarded silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextToken(u64);

/// The result of a single loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterateOutcome {
    /// This many state changes were dispatched to their observers.
    Dispatched(usize),

    /// No callback ran this tick.
    Idle,

    /// The loop has been quit; no further dispatch will happen.
    Quit,
}

/// A state transition waiting for its delay to elapse.
struct Scheduled {
    delay: Duration,
    token: ContextToken,
    state: ContextState,
}

struct LoopInner {
    /// Transitions dispatchable right now, in arrival order.
    ready: VecDeque<(ContextToken, ContextState)>,
    /// Delayed transitions, consumed strictly in push order.
    scheduled: VecDeque<Scheduled>,
    contexts: HashMap<ContextToken, Weak<RefCell<ContextInner>>>,
    next_token: u64,
    idle_wait: Duration,
    quit: bool,
}

/// A single-threaded event loop dispatching context state changes.
///
/// The loop does nothing on its own; it must be polled via
/// [`iterate`](Mainloop::iterate). Cloning a `Mainloop` clones the handle,
/// not the loop: all clones share the same queues and routing table, and
/// [`ptr_eq`](Mainloop::ptr_eq) tells two handles to the same loop apart
/// from handles to different loops.
#[derive(Clone)]
pub struct Mainloop {
    inner: Rc<RefCell<LoopInner>>,
}

/// How long an idle blocking iteration waits before returning, unless
/// overridden via [`Mainloop::with_idle_wait`].
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(25);

impl Mainloop {
    /// Creates a new, empty loop with the default idle wait.
    #[must_use]
    pub fn new() -> Self {
        Self::with_idle_wait(DEFAULT_IDLE_WAIT)
    }

    /// Creates a new, empty loop that waits `idle_wait` per idle blocking
    /// iteration.
    #[must_use]
    pub fn with_idle_wait(idle_wait: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LoopInner {
                ready: VecDeque::new(),
                scheduled: VecDeque::new(),
                contexts: HashMap::new(),
                next_token: 0,
                idle_wait,
                quit: false,
            })),
        }
    }

    /// Returns the dispatch API handle for this loop.
    ///
    /// Contexts are created against this handle; it keeps the loop alive for
    /// as long as it (or any context created from it) exists.
    #[must_use]
    pub fn api(&self) -> MainloopApi {
        MainloopApi {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Returns a transition injection handle for this loop.
    ///
    /// The feed holds only a weak reference; it does not keep the loop
    /// alive.
    #[must_use]
    pub fn feed(&self) -> TransitionFeed {
        TransitionFeed {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Marks the loop as quit. Every later [`iterate`](Self::iterate)
    /// returns [`IterateOutcome::Quit`] without dispatching anything.
    pub fn quit(&self) {
        tracing::trace!("mainloop quit requested");
        self.inner.borrow_mut().quit = true;
    }

    /// Whether two handles refer to the same loop.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Runs one loop iteration.
    ///
    /// Dispatches every transition that is ready, in FIFO order, invoking
    /// the owning context's observer for each. With `block` set and nothing
    /// ready, the call waits (for the next scheduled transition's delay if
    /// one is pending, or for the configured idle wait otherwise), standing
    /// in for "block until at least one event is ready". A non-blocking
    /// iteration never sleeps and only dispatches transitions already due.
    pub fn iterate(&self, block: bool) -> IterateOutcome {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.quit {
                return IterateOutcome::Quit;
            }

            promote_due(&mut inner);
            if inner.ready.is_empty() {
                if let Some(next) = inner.scheduled.pop_front() {
                    if !block {
                        inner.scheduled.push_front(next);
                        return IterateOutcome::Idle;
                    }
                    let wait = next.delay;
                    inner.ready.push_back((next.token, next.state));
                    promote_due(&mut inner);
                    // The loop borrow must not be held across the sleep.
                    drop(inner);
                    std::thread::sleep(wait);
                } else if block {
                    let wait = inner.idle_wait;
                    drop(inner);
                    std::thread::sleep(wait);
                    return IterateOutcome::Idle;
                } else {
                    return IterateOutcome::Idle;
                }
            }
        }

        let mut dispatched = 0usize;
        loop {
            let next = self.inner.borrow_mut().ready.pop_front();
            let Some((token, state)) = next else {
                break;
            };

            let target = self
                .inner
                .borrow()
                .contexts
                .get(&token)
                .and_then(Weak::upgrade);
            match target {
                Some(ctx) => {
                    context::deliver(&ctx, state);
                    dispatched += 1;
                }
                None => {
                    tracing::trace!(?token, ?state, "discarding state change for gone context");
                }
            }
        }

        if dispatched == 0 {
            IterateOutcome::Idle
        } else {
            IterateOutcome::Dispatched(dispatched)
        }
    }
}

/// Moves every leading zero-delay scheduled transition into the ready queue.
fn promote_due(inner: &mut LoopInner) {
    while let Some(front) = inner.scheduled.front() {
        if !front.delay.is_zero() {
            break;
        }
        if let Some(next) = inner.scheduled.pop_front() {
            inner.ready.push_back((next.token, next.state));
        }
    }
}

impl Default for Mainloop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mainloop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Mainloop")
            .field("ready", &inner.ready.len())
            .field("scheduled", &inner.scheduled.len())
            .field("contexts", &inner.contexts.len())
            .field("quit", &inner.quit)
            .finish()
    }
}

/// The dispatch interface a loop exposes to client code.
///
/// Obtained via [`Mainloop::api`]. Contexts are created against it and
/// registered in the loop's routing table through it.
#[derive(Clone)]
pub struct MainloopApi {
    inner: Rc<RefCell<LoopInner>>,
}

impl MainloopApi {
    /// Whether two handles refer to the same loop.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn allocate_token(&self) -> ContextToken {
        let mut inner = self.inner.borrow_mut();
        let token = ContextToken(inner.next_token);
        inner.next_token += 1;
        token
    }

    pub(crate) fn route_to(&self, token: ContextToken, ctx: Weak<RefCell<ContextInner>>) {
        self.inner.borrow_mut().contexts.insert(token, ctx);
    }
}

impl fmt::Debug for MainloopApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainloopApi").finish_non_exhaustive()
    }
}

/// Injection handle the server side of a connection pushes state
/// transitions through.
///
/// Obtained via [`Mainloop::feed`]. The demos and tests use it to stand in
/// for the audio daemon; see [`crate::loopback`] for canned handshakes.
#[derive(Clone)]
pub struct TransitionFeed {
    inner: Weak<RefCell<LoopInner>>,
}

impl TransitionFeed {
    /// Queues a transition for dispatch on the next iteration.
    ///
    /// # Errors
    /// - [`PulseWatchError::MainloopGone`]: If the loop has been dropped.
    pub fn push(&self, token: ContextToken, state: ContextState) -> Result<()> {
        self.push_after(Duration::ZERO, token, state)
    }

    /// Queues a transition for dispatch once `delay` has elapsed, counted
    /// from the moment a blocking iteration reaches it.
    ///
    /// Transitions are dispatched strictly in push order, so an immediate
    /// push behind a delayed one still waits its turn.
    ///
    /// # Errors
    /// - [`PulseWatchError::MainloopGone`]: If the loop has been dropped.
    pub fn push_after(
        &self,
        delay: Duration,
        token: ContextToken,
        state: ContextState,
    ) -> Result<()> {
        let inner = self.inner.upgrade().ok_or(PulseWatchError::MainloopGone)?;
        let mut inner = inner.borrow_mut();
        if delay.is_zero() && inner.scheduled.is_empty() {
            inner.ready.push_back((token, state));
        } else {
            inner.scheduled.push_back(Scheduled {
                delay,
                token,
                state,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for TransitionFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionFeed").finish_non_exhaustive()
    }
}
