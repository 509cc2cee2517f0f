#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use rill_diagnostic::{ErrorCode, Severity};
use rill_ir::Span;

use super::*;
use crate::test_helpers::{int, int_at, probe_function, EvalLog, Fixture, Record};
use crate::{EvalErrorKind, Value};

fn call(fx: &Fixture, site: &CallSite) -> EvalResult {
    site.execute(&fx.ctx, &fx.global)
}

fn text(s: &str) -> Value {
    Value::string(s)
}

/// A callee node whose target can be swapped between calls.
#[derive(Debug)]
struct Switch {
    current: Mutex<Value>,
}

impl Switch {
    fn new(fx: &Fixture, function: &Function) -> Arc<Self> {
        let switch = Arc::new(Switch {
            current: Mutex::new(Value::Null),
        });
        switch.set(fx, function);
        switch
    }

    fn set(&self, fx: &Fixture, function: &Function) {
        *self.current.lock() = Value::Closure(crate::Closure::new(
            function.clone(),
            fx.global.clone(),
        ));
    }
}

impl Node for Switch {
    fn execute(&self, _ctx: &EvalContext, _frame: &Frame) -> EvalResult {
        Ok(self.current.lock().clone())
    }

    fn span(&self) -> Span {
        Span::new(0, 1)
    }
}

#[test]
fn test_initial_tiers() {
    let fx = Fixture::new();
    let factory = fx.ctx.call_factory();
    let f = probe_function(&fx, &["a"]);

    let positional = factory.create(Span::DUMMY, fx.callee(&f), vec![ArgSlot::positional(int(1))]);
    assert_eq!(positional.tier(), Tier::Trivial);

    let named = factory.create(
        Span::DUMMY,
        fx.callee(&f),
        vec![ArgSlot::named(fx.name("a"), int(1), Span::DUMMY)],
    );
    assert_eq!(named.tier(), Tier::CachedGeneric);

    let omitted = factory.create(Span::DUMMY, fx.callee(&f), vec![ArgSlot::omitted(Span::DUMMY)]);
    assert_eq!(omitted.tier(), Tier::CachedGeneric);

    let uncached = CallFactory::new(CallConfig {
        cache_generic_bindings: false,
        ..CallConfig::default()
    })
    .create(Span::DUMMY, fx.callee(&f), vec![ArgSlot::omitted(Span::DUMMY)]);
    assert_eq!(uncached.tier(), Tier::Generic);
}

#[test]
fn test_trivial_specializes_on_first_call() {
    let fx = Fixture::new();
    let f = probe_function(&fx, &["a", "b"]);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        fx.callee(&f),
        vec![ArgSlot::positional(int(1)), ArgSlot::positional(int(2))],
    );

    assert_eq!(call(&fx, &site), Ok(text("a=1,b=2")));
    assert_eq!(site.tier(), Tier::CachedSimple);
    assert_eq!(site.rewrite_count(), 1);
}

#[test]
fn test_monomorphic_site_stays_put() {
    let fx = Fixture::new();
    let f = probe_function(&fx, &["a"]);
    let site =
        fx.ctx
            .call_factory()
            .create(Span::DUMMY, fx.callee(&f), vec![ArgSlot::positional(int(4))]);

    for _ in 0..10 {
        assert_eq!(call(&fx, &site), Ok(text("a=4")));
    }
    assert_eq!(site.tier(), Tier::CachedSimple);
    assert_eq!(site.rewrite_count(), 1);
}

#[test]
fn test_target_change_deoptimizes_for_good() {
    let fx = Fixture::new();
    let f1 = probe_function(&fx, &["a"]);
    let f2 = probe_function(&fx, &["x"]);
    let switch = Switch::new(&fx, &f1);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        switch.clone(),
        vec![ArgSlot::positional(int(1))],
    );

    assert_eq!(call(&fx, &site), Ok(text("a=1")));
    assert_eq!(site.tier(), Tier::CachedSimple);

    switch.set(&fx, &f2);
    assert_eq!(call(&fx, &site), Ok(text("x=1")));
    assert_eq!(site.tier(), Tier::Simple);

    switch.set(&fx, &f1);
    assert_eq!(call(&fx, &site), Ok(text("a=1")));
    assert_eq!(site.tier(), Tier::Simple);
    assert_eq!(site.rewrite_count(), 2);
}

#[test]
fn test_same_parameters_different_function_is_new_target() {
    let fx = Fixture::new();
    let f1 = probe_function(&fx, &["a"]);
    let f2 = probe_function(&fx, &["a"]);
    let switch = Switch::new(&fx, &f1);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        switch.clone(),
        vec![ArgSlot::positional(int(1))],
    );

    call(&fx, &site).unwrap();
    switch.set(&fx, &f2);
    call(&fx, &site).unwrap();
    assert_eq!(site.tier(), Tier::Simple);
}

#[test]
fn test_arity_mismatch_goes_simple() {
    let fx = Fixture::new();
    let f = probe_function(&fx, &["a", "b"]);
    let site =
        fx.ctx
            .call_factory()
            .create(Span::DUMMY, fx.callee(&f), vec![ArgSlot::positional(int(1))]);

    assert_eq!(call(&fx, &site), Ok(text("a=1,b=?")));
    assert_eq!(site.tier(), Tier::Simple);
}

#[test]
fn test_arity_above_bound_goes_simple() {
    let fx = Fixture::new();
    let f = probe_function(&fx, &["a", "b", "c", "d"]);
    let args = (1..=4).map(|v| ArgSlot::positional(int(v))).collect();
    let site = fx.ctx.call_factory().create(Span::DUMMY, fx.callee(&f), args);

    assert_eq!(call(&fx, &site), Ok(text("a=1,b=2,c=3,d=4")));
    assert_eq!(site.tier(), Tier::Simple);
}

#[test]
fn test_specialization_disabled() {
    let fx = Fixture::with(|b| b.specialize_up_to(0));
    let f = probe_function(&fx, &["a"]);
    let site =
        fx.ctx
            .call_factory()
            .create(Span::DUMMY, fx.callee(&f), vec![ArgSlot::positional(int(1))]);
    call(&fx, &site).unwrap();
    assert_eq!(site.tier(), Tier::Simple);

    let g = probe_function(&fx, &[]);
    let nullary = fx.ctx.call_factory().create(Span::DUMMY, fx.callee(&g), vec![]);
    assert_eq!(call(&fx, &nullary), Ok(text("")));
    assert_eq!(nullary.tier(), Tier::CachedSimple);
}

#[test]
fn test_cached_generic_reuses_and_recaches() {
    let fx = Fixture::new();
    let f1 = probe_function(&fx, &["a", "b"]);
    let f2 = probe_function(&fx, &["b", "a"]);
    let switch = Switch::new(&fx, &f1);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        switch.clone(),
        vec![
            ArgSlot::named(fx.name("b"), int(2), Span::DUMMY),
            ArgSlot::positional(int(1)),
        ],
    );

    assert_eq!(call(&fx, &site), Ok(text("a=1,b=2")));
    assert_eq!(call(&fx, &site), Ok(text("a=1,b=2")));
    assert_eq!(site.rewrite_count(), 1);

    switch.set(&fx, &f2);
    assert_eq!(call(&fx, &site), Ok(text("b=2,a=1")));
    assert_eq!(site.tier(), Tier::CachedGeneric);
    assert_eq!(site.rewrite_count(), 2);
}

#[test]
fn test_generic_never_rewrites() {
    let fx = Fixture::with(|b| b.cache_generic_bindings(false));
    let f = probe_function(&fx, &["a", "b"]);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        fx.callee(&f),
        vec![
            ArgSlot::positional(int(1)),
            ArgSlot::named(fx.name("a"), int(2), Span::DUMMY),
        ],
    );

    for _ in 0..3 {
        assert_eq!(call(&fx, &site), Ok(text("a=2,b=1")));
    }
    assert_eq!(site.tier(), Tier::Generic);
    assert_eq!(site.rewrite_count(), 0);
}

#[test]
fn test_named_arguments_evaluate_in_source_order() {
    let fx = Fixture::new();
    let log: EvalLog = Arc::default();
    let f = probe_function(&fx, &["a", "b", "c"]);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        fx.callee(&f),
        vec![
            ArgSlot::named(fx.name("c"), Record::node(3, &log), Span::DUMMY),
            ArgSlot::positional(Record::node(1, &log)),
            ArgSlot::named(fx.name("b"), Record::node(2, &log), Span::DUMMY),
        ],
    );

    assert_eq!(call(&fx, &site), Ok(text("a=1,b=2,c=3")));
    assert_eq!(*log.lock(), vec![3, 1, 2]);
}

#[test]
fn test_rewrite_evaluates_each_argument_once() {
    let fx = Fixture::new();
    let log: EvalLog = Arc::default();
    let f = probe_function(&fx, &["a", "b"]);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        fx.callee(&f),
        vec![
            ArgSlot::positional(Record::node(1, &log)),
            ArgSlot::positional(Record::node(2, &log)),
        ],
    );

    call(&fx, &site).unwrap();
    assert_eq!(*log.lock(), vec![1, 2]);
}

#[test]
fn test_overflow_is_reported_before_evaluation() {
    let fx = Fixture::new();
    let log: EvalLog = Arc::default();
    let f = probe_function(&fx, &["a", "b"]);
    let site = fx.ctx.call_factory().create(
        Span::new(0, 12),
        fx.callee(&f),
        vec![
            ArgSlot::positional(Record::node(1, &log)),
            ArgSlot::positional(Record::node(2, &log)),
            ArgSlot::positional(int_at(3, 9)),
        ],
    );

    let err = call(&fx, &site).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::UnusedArgument { position: 3 });
    assert_eq!(err.span, Some(Span::new(9, 10)));
    assert!(log.lock().is_empty());
    assert_eq!(site.tier(), Tier::Simple);

    let diags = fx.ctx.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::E6002);
    assert_eq!(diags[0].primary_span(), Some(Span::new(9, 10)));
}

#[test]
fn test_binding_error_is_not_retried() {
    let fx = Fixture::new();
    let f = probe_function(&fx, &["a"]);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        fx.callee(&f),
        vec![ArgSlot::named(fx.name("zz"), int(1), Span::new(3, 5))],
    );

    let err = call(&fx, &site).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UnknownArgumentName {
            name: "zz".to_string()
        }
    );
    assert_eq!(site.rewrite_count(), 0);
    assert_eq!(fx.ctx.error_count(), 1);
}

#[test]
fn test_variadic_target_warns_and_fails() {
    let fx = Fixture::new();
    let f = probe_function(&fx, &["..."]);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        fx.callee(&f),
        vec![ArgSlot::positional(int_at(1, 2))],
    );

    let err = call(&fx, &site).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UnsupportedVariadicCollection { position: 1 }
    );
    assert_eq!(site.tier(), Tier::Simple);

    let diags = fx.ctx.take_diagnostics();
    let severities: Vec<_> = diags.iter().map(|d| d.severity).collect();
    assert_eq!(severities, vec![Severity::Warning, Severity::Error]);
    assert_eq!(diags[0].code, ErrorCode::W6001);
}

#[test]
fn test_not_callable() {
    let fx = Fixture::new();
    let site = fx.ctx.call_factory().create(
        Span::new(0, 4),
        int_at(5, 0),
        vec![ArgSlot::positional(int(1))],
    );

    let err = call(&fx, &site).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::NotCallable {
            type_name: "integer".to_string()
        }
    );
    assert_eq!(err.span, Some(Span::new(0, 1)));
    assert_eq!(site.tier(), Tier::Trivial);
}

#[test]
fn test_fresh_copy_shares_expression_and_restarts() {
    let fx = Fixture::new();
    let f = probe_function(&fx, &["a"]);
    let site =
        fx.ctx
            .call_factory()
            .create(Span::DUMMY, fx.callee(&f), vec![ArgSlot::positional(int(1))]);
    call(&fx, &site).unwrap();

    let copy = site.fresh_copy();
    assert!(copy.args().ptr_eq(site.args()));
    assert!(Arc::ptr_eq(copy.callee(), site.callee()));
    assert_eq!(copy.tier(), Tier::Trivial);
    assert_eq!(copy.rewrite_count(), 0);
    assert_eq!(call(&fx, &copy), Ok(text("a=1")));
}

#[test]
fn test_concurrent_calls_agree() {
    let fx = Fixture::new();
    let f = probe_function(&fx, &["a", "b"]);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        fx.callee(&f),
        vec![ArgSlot::positional(int(1)), ArgSlot::positional(int(2))],
    );

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..50 {
                    assert_eq!(call(&fx, &site), Ok(text("a=1,b=2")));
                }
            });
        }
    });
    assert_eq!(site.tier(), Tier::CachedSimple);
    assert_eq!(site.rewrite_count(), 1);
}

#[test]
fn test_concurrent_polymorphic_calls_end_simple() {
    let fx = Fixture::new();
    let f1 = probe_function(&fx, &["a"]);
    let f2 = probe_function(&fx, &["a"]);
    let site = fx.ctx.call_factory().create(
        Span::DUMMY,
        fx.callee(&f1),
        vec![ArgSlot::positional(int(1))],
    );

    thread::scope(|s| {
        for i in 0..8 {
            let f = if i % 2 == 0 { f1.clone() } else { f2.clone() };
            let site = &site;
            let fx = &fx;
            s.spawn(move || {
                for _ in 0..50 {
                    let values = site.bind_and_fill(&fx.ctx, &f, &fx.global).unwrap();
                    assert_eq!(values.as_slice(), [Some(Value::Int(1))]);
                }
            });
        }
    });
    assert_eq!(site.tier(), Tier::Simple);
    assert_eq!(site.rewrite_count(), 2);
}
