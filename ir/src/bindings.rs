//! Scoped name bindings for package assembly.
//!
//! A front end building packages resolves names through a chain of scope
//! frames: look in the innermost frame, else recurse into the parent. Each
//! frame owns its own bindings and holds only a read reference to its
//! parent, so resolution never mutates ancestor frames. Binding kinds form a
//! closed set, and kind mismatches report the kind actually found against
//! the kind expected.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use crate::channel::ChannelId;
use crate::proc::ProcId;
use crate::value::Value;

/// What a name is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A constant value.
    Value(Value),
    /// A declared channel.
    Channel(ChannelId),
    /// A declared proc.
    Proc(ProcId),
}

impl Binding {
    /// The kind tag of this binding.
    #[must_use]
    pub fn kind(&self) -> BindingKind {
        match self {
            Self::Value(_) => BindingKind::Value,
            Self::Channel(_) => BindingKind::Channel,
            Self::Proc(_) => BindingKind::Proc,
        }
    }
}

/// Kind tag for [`Binding`], used in mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Bound to a value.
    Value,
    /// Bound to a channel.
    Channel,
    /// Bound to a proc.
    Proc,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "value"),
            Self::Channel => write!(f, "channel"),
            Self::Proc => write!(f, "proc"),
        }
    }
}

/// Resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// No frame in the chain binds the name.
    #[error("no binding for identifier `{name}`")]
    NotFound {
        /// The unresolved identifier.
        name: String,
    },
    /// The name resolved, but to a different kind than requested.
    #[error("identifier `{name}` is bound to a {found}, expected a {expected}")]
    WrongKind {
        /// The identifier.
        name: String,
        /// The kind the caller asked for.
        expected: BindingKind,
        /// The kind actually bound.
        found: BindingKind,
    },
}

/// One frame in a scope chain.
///
/// The lifetime ties a child frame to its parent; dropping the parent first
/// is rejected at compile time.
#[derive(Debug, Default)]
pub struct Bindings<'p> {
    map: BTreeMap<String, Binding>,
    parent: Option<&'p Bindings<'p>>,
}

impl<'p> Bindings<'p> {
    /// Create a root frame with no parent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child frame whose lookups fall back to `self`.
    #[must_use]
    pub fn child(&'p self) -> Bindings<'p> {
        Bindings {
            map: BTreeMap::new(),
            parent: Some(self),
        }
    }

    /// Bind `name` in this frame, shadowing any parent binding.
    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) {
        self.map.insert(name.into(), binding);
    }

    /// Resolve a name through the frame chain, innermost first.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Binding> {
        let mut frame = Some(self);
        while let Some(f) = frame {
            if let Some(entry) = f.map.get(name) {
                return Some(entry);
            }
            frame = f.parent;
        }
        None
    }

    /// Resolve a name that must be bound to a value.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::NotFound`] or [`BindingError::WrongKind`].
    pub fn resolve_value(&self, name: &str) -> Result<&Value, BindingError> {
        match self.resolve(name) {
            None => Err(BindingError::NotFound {
                name: name.to_string(),
            }),
            Some(Binding::Value(v)) => Ok(v),
            Some(other) => Err(BindingError::WrongKind {
                name: name.to_string(),
                expected: BindingKind::Value,
                found: other.kind(),
            }),
        }
    }

    /// Resolve a name that must be bound to a channel.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::NotFound`] or [`BindingError::WrongKind`].
    pub fn resolve_channel(&self, name: &str) -> Result<ChannelId, BindingError> {
        match self.resolve(name) {
            None => Err(BindingError::NotFound {
                name: name.to_string(),
            }),
            Some(Binding::Channel(id)) => Ok(*id),
            Some(other) => Err(BindingError::WrongKind {
                name: name.to_string(),
                expected: BindingKind::Channel,
                found: other.kind(),
            }),
        }
    }

    /// Resolve a name that must be bound to a proc.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::NotFound`] or [`BindingError::WrongKind`].
    pub fn resolve_proc(&self, name: &str) -> Result<ProcId, BindingError> {
        match self.resolve(name) {
            None => Err(BindingError::NotFound {
                name: name.to_string(),
            }),
            Some(Binding::Proc(id)) => Ok(*id),
            Some(other) => Err(BindingError::WrongKind {
                name: name.to_string(),
                expected: BindingKind::Proc,
                found: other.kind(),
            }),
        }
    }

    /// All visible names, including those inherited from parents.
    #[must_use]
    pub fn keys(&self) -> BTreeSet<String> {
        let mut result = match self.parent {
            Some(parent) => parent.keys(),
            None => BTreeSet::new(),
        };
        result.extend(self.map.keys().cloned());
        result
    }
}
