//! Scheduling primitives: type keys, tasks and their bookkeeping state

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::value::{classify, Kind, Value, ValueStore};
use crate::ProvideError;

/// Builds the tasks of a type that has no explicit rule
pub(crate) type Fallback = fn() -> Result<Initializer, ProvideError>;

/// Deferred work attached to a task, run against the shared value store
pub(crate) type Action = Arc<dyn Fn(&mut ValueStore) -> Result<(), ProvideError> + Send + Sync>;

/// Opaque identity of a provided type.
///
/// Keys compare and hash by [TypeId] only. They also remember the type name
/// for error reports and how to derive the type when no rule produces it.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    kind: Kind,
    fallback: Fallback,
}

impl TypeKey {
    pub fn of<T: Value>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: classify::<T>(),
            fallback: T::initializer,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub(crate) fn derive(&self) -> Result<Initializer, ProvideError> {
        (self.fallback)()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How far a value has been constructed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    /// Allocated and safe to reference, maybe not fully initialized yet
    Partial,
    /// Fully initialized according to all its dependencies
    Complete,
}

/// Unit of scheduling: a type at a given completion level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Task {
    pub(crate) key: TypeKey,
    pub(crate) level: Level,
}

impl Task {
    pub(crate) fn partial(key: TypeKey) -> Self {
        Self {
            key,
            level: Level::Partial,
        }
    }

    pub(crate) fn complete(key: TypeKey) -> Self {
        Self {
            key,
            level: Level::Complete,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

#[derive(Clone, Default)]
pub(crate) struct State {
    pub done: bool,
    pub in_progress: bool,
    pub depends_on: Vec<Task>,
    pub action: Option<Action>,
}

impl State {
    pub(crate) fn new(depends_on: Vec<Task>, action: Option<Action>) -> Self {
        Self {
            depends_on,
            action,
            ..Self::default()
        }
    }
}

/// Construction plan for one type: the states of its partial and complete tasks.
///
/// Initializers are produced by rules and by auto-derivation, the scheduler
/// does not distinguish between them.
pub struct Initializer {
    pub(crate) key: TypeKey,
    pub(crate) partial: State,
    pub(crate) complete: State,
}

impl Initializer {
    pub fn key(&self) -> TypeKey {
        self.key
    }
}
