//! Lexical environments.
//!
//! A `Frame` is a shared handle to one scope plus its lexical parent. A call
//! creates a frame whose parent is the callee closure's defining frame, not
//! the caller's; the caller's frame is only used to evaluate arguments.
//!
//! Frames are reference counted and internally locked so that one compiled
//! expression tree (and the closures it creates) can be evaluated from
//! several threads.
//!
//! A closure holds its defining frame strongly, so a closure stored in the
//! frame it captures (any recursive function) forms a reference cycle and
//! that frame is never freed. Parents must stay strong: a returned closure
//! keeps every enclosing scope it can still read from alive.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use rill_ir::Name;

use crate::Value;

/// A variable slot in a frame.
#[derive(Clone, Debug)]
enum Slot {
    Value(Value),
    /// A parameter that received no argument and has no default.
    Missing,
}

/// Result of looking a name up through the frame chain.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup {
    Value(Value),
    /// Bound as a parameter, but no argument was supplied.
    Missing,
    Undefined,
}

struct FrameData {
    vars: RwLock<FxHashMap<Name, Slot>>,
    parent: Option<Frame>,
    /// Number of active calls below this frame (0 for the global frame).
    call_depth: usize,
}

/// Shared handle to a scope.
#[derive(Clone)]
pub struct Frame(Arc<FrameData>);

impl Frame {
    /// Create a root frame with no parent.
    pub fn global() -> Self {
        Frame(Arc::new(FrameData {
            vars: RwLock::new(FxHashMap::default()),
            parent: None,
            call_depth: 0,
        }))
    }

    /// Create the frame for a call, chained to the callee's defining frame.
    pub fn for_call(env: &Frame, call_depth: usize) -> Self {
        Frame(Arc::new(FrameData {
            vars: RwLock::new(FxHashMap::default()),
            parent: Some(env.clone()),
            call_depth,
        }))
    }

    /// Bind `name` to `value` in this frame, replacing any previous binding.
    pub fn define(&self, name: Name, value: Value) {
        self.0.vars.write().insert(name, Slot::Value(value));
    }

    /// Bind `name` as a missing argument in this frame.
    pub fn define_missing(&self, name: Name) {
        self.0.vars.write().insert(name, Slot::Missing);
    }

    /// Look `name` up in this frame and then in its lexical parents.
    pub fn lookup(&self, name: Name) -> Lookup {
        let mut frame = self;
        loop {
            if let Some(slot) = frame.0.vars.read().get(&name) {
                return match slot {
                    Slot::Value(value) => Lookup::Value(value.clone()),
                    Slot::Missing => Lookup::Missing,
                };
            }
            match &frame.0.parent {
                Some(parent) => frame = parent,
                None => return Lookup::Undefined,
            }
        }
    }

    /// Whether `name` is bound directly in this frame.
    pub fn is_bound_locally(&self, name: Name) -> bool {
        self.0.vars.read().contains_key(&name)
    }

    /// Call depth this frame was created at.
    #[inline]
    pub fn call_depth(&self) -> usize {
        self.0.call_depth
    }

    /// Whether both handles refer to the same frame.
    #[inline]
    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// Frames can reach themselves through closures stored in them; print a
// summary rather than the contents.
impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("vars", &self.0.vars.read().len())
            .field("call_depth", &self.0.call_depth)
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}
