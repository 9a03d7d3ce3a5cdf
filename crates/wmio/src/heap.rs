//! Heap scopes
//!
//! Every class, instance body and method list owns a heap: a byte arena
//! holding the out-of-line data its references point at. Scopes nest the
//! same way the structures do, so they are kept on a stack.
//!
//! On decode a reference is read before the heap it points into, so each
//! scope also queues the references waiting for its heap.

use std::collections::VecDeque;

/// One heap scope
#[derive(Debug, Default)]
pub(crate) struct Heap<A, P> {
    /// Heap bytes
    pub(crate) arena: A,
    /// Offset of the first arena byte within the scope's heap
    ///
    /// Non-zero only for the virtual frames that reserve room ahead of
    /// their own data.
    pub(crate) base: u32,
    pending: VecDeque<P>,
}

impl<A, P> Heap<A, P> {
    /// Number of queued references
    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Stack of heap scopes
///
/// The root scope is created with the stack and is never popped.
#[derive(Debug)]
pub(crate) struct Heaps<A, P> {
    scopes: Vec<Heap<A, P>>,
}

impl<A: Default, P> Heaps<A, P> {
    pub(crate) fn new() -> Self {
        Self {
            scopes: vec![Heap {
                arena: A::default(),
                base: 0,
                pending: VecDeque::new(),
            }],
        }
    }

    /// Enter a new scope whose heap starts at `base`
    pub(crate) fn push(&mut self, base: u32) {
        self.scopes.push(Heap {
            arena: A::default(),
            base,
            pending: VecDeque::new(),
        });
    }
}

impl<A, P> Heaps<A, P> {
    /// Leave the current scope
    ///
    /// Returns `None` (and keeps the root) when only the root is left.
    pub(crate) fn pop(&mut self) -> Option<Heap<A, P>> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    pub(crate) fn top(&self) -> &Heap<A, P> {
        &self.scopes[self.scopes.len() - 1]
    }

    pub(crate) fn top_mut(&mut self) -> &mut Heap<A, P> {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Queue a reference on the current scope
    pub(crate) fn append(&mut self, pending: P) {
        self.top_mut().pending.push_back(pending);
    }

    /// Drain the current scope's queue
    pub(crate) fn truncate(&mut self) -> Vec<P> {
        self.top_mut().pending.drain(..).collect()
    }

    /// Number of scopes, root included
    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Queued references across all scopes
    pub(crate) fn pending(&self) -> usize {
        self.scopes.iter().map(Heap::pending).sum()
    }
}
