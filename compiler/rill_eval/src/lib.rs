//! Rill Eval - call-site dispatch for the Rill tree-walking interpreter.
//!
//! A call expression is compiled into a [`CallSite`] node. Executing it
//! resolves the callee to a [`Closure`], binds the call's arguments to the
//! callee's formal parameters, and invokes the closure in a fresh frame.
//!
//! # Architecture
//!
//! - `call::binder`: name-then-position matching of argument slots to
//!   parameter slots, producing an immutable [`Binding`]
//! - `call::strategy`: the closed set of dispatch tiers ([`CallStrategy`]),
//!   from the always-correct Generic tier to the identity-guarded CachedSimple
//!   tier, with one exhaustive `bind_and_fill` dispatch
//! - `call::rewrite`: the slot through which a call site swaps its installed
//!   strategy while it executes
//! - [`EvalContext`]: interner, configuration and diagnostics sink
//! - [`Frame`]: lexical environments, chained to a closure's defining frame
//!
//! # Debugging
//!
//! Strategy rewrites are logged at `debug`, call-site execution at `trace`:
//! `RUST_LOG=rill_eval=debug` after calling [`init_tracing`].

mod call;
mod context;
mod environment;
pub mod errors;
mod function;
mod node;
mod value;

#[cfg(test)]
mod test_helpers;

pub use call::{
    bind, ArgSlot, ArgValues, BindError, Binding, CallArgs, CallConfig, CallFactory, CallSite,
    CallStrategy, MissReason, Tier, MAX_SPECIALIZED_ARITY,
};
pub use context::{EvalConfig, EvalContext, EvalContextBuilder};
pub use environment::{Frame, Lookup};
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use function::{Closure, Function, Param};
pub use node::{Constant, FunctionLiteral, Node, NodeRef, ReadVariable};
pub use value::Value;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Only installs a subscriber when `RUST_LOG`
/// is set, e.g. `RUST_LOG=rill_eval=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
