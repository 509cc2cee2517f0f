//! Evaluation context: interner, configuration, and the diagnostics sink.

use parking_lot::Mutex;

use rill_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue, ErrorCode};
use rill_ir::{SharedInterner, Span, StringInterner};

use crate::call::{BindError, CallConfig, CallFactory};
use crate::errors::{self, EvalError};

/// Interpreter configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum nesting of interpreted calls (`None` = unlimited).
    pub max_call_depth: Option<usize>,
    /// How the call factory selects and bounds strategy tiers.
    pub call: CallConfig,
    /// Diagnostics queue limits.
    pub diagnostics: DiagnosticConfig,
}

/// Context threaded through every node execution.
///
/// Shared by reference between call stacks; the diagnostics queue is the
/// only mutable part and is locked per report.
#[derive(Debug)]
pub struct EvalContext {
    interner: SharedInterner,
    config: EvalConfig,
    diagnostics: Mutex<DiagnosticQueue>,
}

impl EvalContext {
    /// Context with default configuration.
    pub fn new(interner: SharedInterner) -> Self {
        EvalContextBuilder::new().interner(interner).build()
    }

    pub fn builder() -> EvalContextBuilder {
        EvalContextBuilder::new()
    }

    #[inline]
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// A cloneable handle to the interner.
    pub fn shared_interner(&self) -> SharedInterner {
        self.interner.clone()
    }

    #[inline]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Factory for call-site nodes, configured from this context.
    pub fn call_factory(&self) -> CallFactory {
        CallFactory::new(self.config.call)
    }

    /// Check the call depth limit for a call made from `caller_depth`.
    ///
    /// Returns the callee frame's depth.
    pub fn enter_call(&self, caller_depth: usize) -> Result<usize, EvalError> {
        let depth = caller_depth + 1;
        match self.config.max_call_depth {
            Some(max) if depth > max => Err(errors::recursion_limit_exceeded(max)),
            _ => Ok(depth),
        }
    }

    /// Queue a diagnostic. Returns `false` if the queue filtered it.
    pub fn report(&self, diag: Diagnostic) -> bool {
        self.diagnostics.lock().emit(diag)
    }

    /// Report a binding failure and build the error to propagate.
    ///
    /// Variadic collection additionally queues a warning, since the call is
    /// well-formed and only the interpreter lacks support for it.
    pub fn report_bind_error(&self, err: &BindError, call_span: Span) -> EvalError {
        let error = errors::from_bind_error(err, &self.interner);
        let mut queue = self.diagnostics.lock();
        if let BindError::UnsupportedVariadicCollection { span, .. } = err {
            let _ = queue.emit(
                Diagnostic::warning(ErrorCode::W6001)
                    .with_message("argument needs to be collected into `...`")
                    .with_label(*span, "this argument")
                    .with_note("collecting arguments into `...` is not yet supported"),
            );
        }
        let _ = queue.emit(
            error
                .to_diagnostic()
                .with_secondary_label(call_span, "in this call"),
        );
        error
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.lock().error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.lock().warning_count()
    }

    /// Drain the queued diagnostics, sorted by location.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().flush()
    }
}

/// Builder for [`EvalContext`].
#[derive(Debug, Default)]
pub struct EvalContextBuilder {
    interner: Option<SharedInterner>,
    config: EvalConfig,
}

impl EvalContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing interner; names built against it resolve in errors.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.config.max_call_depth = depth;
        self
    }

    /// Highest arity the Trivial tier specializes.
    ///
    /// Clamped to [`MAX_SPECIALIZED_ARITY`](crate::MAX_SPECIALIZED_ARITY).
    #[must_use]
    pub fn specialize_up_to(mut self, arity: usize) -> Self {
        self.config.call = self.config.call.with_specialize_up_to(arity);
        self
    }

    /// Start named/defaulted call sites at CachedGeneric (`true`) or Generic.
    #[must_use]
    pub fn cache_generic_bindings(mut self, enabled: bool) -> Self {
        self.config.call.cache_generic_bindings = enabled;
        self
    }

    #[must_use]
    pub fn diagnostic_config(mut self, config: DiagnosticConfig) -> Self {
        self.config.diagnostics = config;
        self
    }

    pub fn build(self) -> EvalContext {
        EvalContext {
            interner: self.interner.unwrap_or_default(),
            diagnostics: Mutex::new(DiagnosticQueue::with_config(
                self.config.diagnostics.clone(),
            )),
            config: self.config,
        }
    }
}
