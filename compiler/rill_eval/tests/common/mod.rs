//! Shared builders for the integration tests.

#![allow(dead_code, reason = "Not every test binary uses every builder")]
#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use std::fmt::Write as _;
use std::sync::Arc;

use rill_eval::{
    ArgSlot, CallSite, Constant, EvalContext, EvalContextBuilder, EvalResult, Frame, Function,
    FunctionLiteral, Lookup, Node, NodeRef, Param, ReadVariable, Value,
};
use rill_ir::{Name, SharedInterner, Span};

/// An interpreter session: one interner, one context, one global frame.
pub struct Session {
    pub interner: SharedInterner,
    pub ctx: EvalContext,
    pub global: Frame,
}

impl Session {
    pub fn new() -> Self {
        Self::configured(|b| b)
    }

    pub fn configured(configure: impl FnOnce(EvalContextBuilder) -> EvalContextBuilder) -> Self {
        let interner = SharedInterner::new();
        let ctx = configure(EvalContext::builder().interner(interner.clone())).build();
        Session {
            interner,
            ctx,
            global: Frame::global(),
        }
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    pub fn var(&self, s: &str) -> NodeRef {
        ReadVariable::node(self.name(s), Span::DUMMY)
    }

    pub fn pos(&self, v: i64) -> ArgSlot {
        ArgSlot::positional(int(v))
    }

    pub fn named(&self, name: &str, v: i64) -> ArgSlot {
        ArgSlot::named(self.name(name), int(v), Span::DUMMY)
    }

    /// `function(params) probe(params)`; `"..."` declares the variadic
    /// parameter.
    pub fn probe_function(&self, params: &[&str]) -> Function {
        let params: Vec<Param> = params.iter().map(|p| Param::new(self.name(p))).collect();
        let body = Probe::node(self, &params);
        Function::new(None, params, body, Span::DUMMY)
    }

    /// Bind `function` as a closure over the global frame under `name`.
    pub fn define(&self, name: &str, function: &Function) {
        let value = FunctionLiteral::node(function.clone())
            .execute(&self.ctx, &self.global)
            .unwrap();
        self.global.define(self.name(name), value);
    }

    pub fn call(&self, site: &CallSite) -> EvalResult {
        site.execute(&self.ctx, &self.global)
    }

    /// Call site `callee(args)`.
    pub fn site(&self, callee: &str, args: Vec<ArgSlot>) -> CallSite {
        self.ctx
            .call_factory()
            .create(Span::DUMMY, self.var(callee), args)
    }
}

pub fn int(v: i64) -> NodeRef {
    Constant::node(Value::Int(v), Span::DUMMY)
}

/// Function body rendering the named variables as `a=1,b=?`, where `?`
/// marks a missing argument.
#[derive(Debug)]
pub struct Probe {
    vars: Vec<(Name, &'static str)>,
}

impl Probe {
    pub fn node(session: &Session, params: &[Param]) -> NodeRef {
        Arc::new(Probe {
            vars: params
                .iter()
                .filter(|p| !p.is_variadic())
                .map(|p| (p.name, session.interner.lookup(p.name)))
                .collect(),
        })
    }

    pub fn over(session: &Session, names: &[&str]) -> NodeRef {
        Arc::new(Probe {
            vars: names
                .iter()
                .map(|n| {
                    let name = session.name(n);
                    (name, session.interner.lookup(name))
                })
                .collect(),
        })
    }
}

impl Node for Probe {
    fn execute(&self, _ctx: &EvalContext, frame: &Frame) -> EvalResult {
        let mut out = String::new();
        for (i, (name, text)) in self.vars.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match frame.lookup(*name) {
                Lookup::Value(v) => write!(out, "{text}={v}").unwrap(),
                Lookup::Missing | Lookup::Undefined => write!(out, "{text}=?").unwrap(),
            }
        }
        Ok(Value::string(out))
    }

    fn span(&self) -> Span {
        Span::DUMMY
    }
}
