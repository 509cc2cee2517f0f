//! Argument-to-parameter binding.
//!
//! Matching runs in two passes over the argument slots:
//!
//! 1. **Names**: every named argument takes the parameter with exactly that
//!    name. Unknown and repeated names are errors.
//! 2. **Positions**: every unnamed argument takes the next parameter not
//!    already taken by name. An omitted argument (`f(1, , 3)`) advances the
//!    cursor without binding, leaving the parameter to its default.
//!
//! Parameters left over are not an error here; the invocation falls back to
//! defaults or binds them as missing. Arguments left over are.
//!
//! The variadic parameter `...` is never bound: any argument that would land
//! in it fails with `UnsupportedVariadicCollection`.

use smallvec::{smallvec, SmallVec};

use rill_ir::{Name, Span};

use super::ArgSlot;
use crate::Param;

/// Why a call's arguments could not be bound to a callee's parameters.
///
/// `index` is the 0-based argument slot at fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("unused argument {}", .index + 1)]
    UnusedArgument { index: usize, span: Span },

    #[error("argument {} names no parameter", .index + 1)]
    UnknownArgumentName { index: usize, name: Name, span: Span },

    #[error("argument {} names an already bound parameter", .index + 1)]
    DuplicateArgumentBinding { index: usize, name: Name, span: Span },

    #[error("argument {} needs collecting into `...`, which is not yet supported", .index + 1)]
    UnsupportedVariadicCollection { index: usize, span: Span },
}

impl BindError {
    /// Source location of the offending argument.
    pub fn span(&self) -> Span {
        match *self {
            BindError::UnusedArgument { span, .. }
            | BindError::UnknownArgumentName { span, .. }
            | BindError::DuplicateArgumentBinding { span, .. }
            | BindError::UnsupportedVariadicCollection { span, .. } => span,
        }
    }

    /// Index of the offending argument slot.
    pub fn index(&self) -> usize {
        match *self {
            BindError::UnusedArgument { index, .. }
            | BindError::UnknownArgumentName { index, .. }
            | BindError::DuplicateArgumentBinding { index, .. }
            | BindError::UnsupportedVariadicCollection { index, .. } => index,
        }
    }
}

/// Mapping from argument slots to parameter slots for one
/// (call expression, function) pair.
///
/// Only valid against the function it was computed for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Parameter slot per argument slot; `None` for omitted positional slots.
    positions: SmallVec<[Option<usize>; 4]>,
    /// Parameter name each argument slot resolved to.
    names: SmallVec<[Option<Name>; 4]>,
    /// Whether each parameter slot received an argument.
    provided: SmallVec<[bool; 4]>,
}

impl Binding {
    /// Parameter slot per argument slot.
    #[inline]
    pub fn positions(&self) -> &[Option<usize>] {
        &self.positions
    }

    /// Parameter slot bound by argument `slot`, if any.
    pub fn param_for(&self, slot: usize) -> Option<usize> {
        self.positions.get(slot).copied().flatten()
    }

    /// Parameter name argument `slot` resolved to, if any.
    pub fn resolved_name(&self, slot: usize) -> Option<Name> {
        self.names.get(slot).copied().flatten()
    }

    /// Number of parameters of the function this binding targets.
    #[inline]
    pub fn param_count(&self) -> usize {
        self.provided.len()
    }

    /// Parameter slots that received no argument, in declaration order.
    pub fn missing_params(&self) -> impl Iterator<Item = usize> + '_ {
        self.provided
            .iter()
            .enumerate()
            .filter_map(|(i, provided)| (!provided).then_some(i))
    }
}

/// Bind argument slots to parameters by name, then by position.
pub fn bind(args: &[ArgSlot], params: &[Param]) -> Result<Binding, BindError> {
    let variadic = params.iter().any(Param::is_variadic);
    let mut positions: SmallVec<[Option<usize>; 4]> = smallvec![None; args.len()];
    let mut names: SmallVec<[Option<Name>; 4]> = smallvec![None; args.len()];
    let mut provided: SmallVec<[bool; 4]> = smallvec![false; params.len()];

    // Matching by name
    for (i, arg) in args.iter().enumerate() {
        let Some(name) = arg.name else {
            continue;
        };
        let Some(j) = params
            .iter()
            .position(|p| p.name == name && !p.is_variadic())
        else {
            return Err(if variadic {
                BindError::UnsupportedVariadicCollection {
                    index: i,
                    span: arg.span,
                }
            } else {
                BindError::UnknownArgumentName {
                    index: i,
                    name,
                    span: arg.span,
                }
            });
        };
        if provided[j] {
            return Err(BindError::DuplicateArgumentBinding {
                index: i,
                name,
                span: arg.span,
            });
        }
        provided[j] = true;
        positions[i] = Some(j);
        names[i] = Some(name);
    }

    // Matching by position
    let mut next = 0;
    for (i, arg) in args.iter().enumerate() {
        if arg.name.is_some() {
            continue;
        }
        while next < params.len() && provided[next] {
            next += 1;
        }
        if next == params.len() {
            return Err(BindError::UnusedArgument {
                index: i,
                span: arg.span,
            });
        }
        if params[next].is_variadic() {
            return Err(BindError::UnsupportedVariadicCollection {
                index: i,
                span: arg.span,
            });
        }
        if arg.value.is_some() {
            provided[next] = true;
            positions[i] = Some(next);
            names[i] = Some(params[next].name);
        }
        next += 1;
    }

    Ok(Binding {
        positions,
        names,
        provided,
    })
}
