//! # Request Context Propagation
//!
//! A [`RequestContext`] is the caching and propagation boundary for one
//! logical request. The engine partitions its result cache per context id,
//! so concurrent calls only share cached results when they share a context.
//!
//! Attachment is explicit, never automatic: a context becomes visible to a
//! thread only through [`RequestContext::attach_to_current_thread`] or a
//! scoped [`ContextScope`]. Worker tasks use the scope guard so pool threads
//! are left clean on exit (acquire on entry, release on exit).
//!
//! [`ensure_context_present`] is the submission-time step: it guarantees the
//! submitting thread has a context, creating or propagating one through the
//! state's reserved metadata slot according to the configuration.

use std::cell::RefCell;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::config::CommandConfig;
use crate::state::RequestState;

thread_local! {
    static CURRENT_CONTEXT: RefCell<Option<RequestContext>> = const { RefCell::new(None) };
}

#[derive(Debug)]
struct ContextInner {
    id: Uuid,
}

/// Opaque, cheaply clonable propagation handle for one logical request scope.
///
/// The handle is shared across threads by design; equality is by id.
#[derive(Debug, Clone)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

impl RequestContext {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let ctx = Self {
            inner: Arc::new(ContextInner { id: Uuid::new_v4() }),
        };
        debug!(context_id = %ctx.id(), "Request context created");
        ctx
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// The context attached to the current thread, if any.
    pub fn current() -> Option<RequestContext> {
        CURRENT_CONTEXT.with(|slot| slot.borrow().clone())
    }

    /// Attaches this context to the current thread, replacing any previous
    /// attachment.
    pub fn attach_to_current_thread(&self) {
        CURRENT_CONTEXT.with(|slot| {
            *slot.borrow_mut() = Some(self.clone());
        });
    }

    /// Detaches whatever context the current thread holds.
    pub fn detach_from_current_thread() {
        CURRENT_CONTEXT.with(|slot| {
            *slot.borrow_mut() = None;
        });
    }
}

impl PartialEq for RequestContext {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for RequestContext {}

/// Scoped attachment for worker tasks: attaches on construction, restores
/// the previous attachment on drop.
pub struct ContextScope {
    previous: Option<RequestContext>,
}

impl ContextScope {
    pub fn attach(ctx: RequestContext) -> Self {
        let previous = RequestContext::current();
        ctx.attach_to_current_thread();
        Self { previous }
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|slot| {
            *slot.borrow_mut() = self.previous.take();
        });
    }
}

/// Guarantees the current thread has an active [`RequestContext`] before a
/// command is scheduled.
///
/// - If the current thread already has one, it is reused as-is.
/// - Otherwise, with propagation enabled, the handle is read from the
///   state's reserved metadata slot and attached; if the slot is empty a new
///   context is created, attached, and written back so downstream work on
///   other threads can find it.
/// - With propagation disabled, a fresh context is always created and any
///   handle in the metadata slot is ignored.
///
/// Returns the effective context. May mutate the state's metadata slot.
pub fn ensure_context_present(state: &mut RequestState, config: &CommandConfig) -> RequestContext {
    if let Some(current) = RequestContext::current() {
        return current;
    }

    if config.propagate_request_context() {
        if let Some(ctx) = state.context_handle() {
            ctx.attach_to_current_thread();
            debug!(context_id = %ctx.id(), "Propagated request context attached from metadata slot");
            ctx
        } else {
            let ctx = RequestContext::new();
            ctx.attach_to_current_thread();
            state.set_context_handle(ctx.clone());
            ctx
        }
    } else {
        let ctx = RequestContext::new();
        ctx.attach_to_current_thread();
        ctx
    }
}
