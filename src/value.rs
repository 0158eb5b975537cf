//! Provided values, their kinds, and the store holding one value per type

use std::any::{Any, TypeId};
use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::sync::{mpsc, Arc};

use once_cell::sync::OnceCell;

use crate::auto::{self, AutoProvide};
use crate::task::{Initializer, TypeKey};
use crate::ProvideError;

/// Classification of a provided type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Owned data, copied out of the store
    Plain,
    /// Shared handle: every copy observes later initialization of its referent
    Reference,
    /// Failure signal, never provided as a value
    Error,
}

/// A type that can be stored in a [crate::Provider] and handed out to consumers.
///
/// The provider keeps a single value of each type and gives out clones,
/// shared state should thus use a reference type such as [Arc] or [Ref].
/// Use the [crate::impl_value] macro to declare local types.
pub trait Value: Clone + Send + Sync + 'static {
    const KIND: Kind = Kind::Plain;

    /// Construction plan used when no rule produces this type.
    ///
    /// Types are not automatically constructible unless they say otherwise.
    fn initializer() -> Result<Initializer, ProvideError> {
        Err(ProvideError::NotAutoProvidable(std::any::type_name::<Self>()))
    }
}

pub(crate) fn classify<T: Value>() -> Kind {
    if TypeId::of::<T>() == TypeId::of::<Arc<dyn std::error::Error + Send + Sync>>() {
        Kind::Error
    } else {
        T::KIND
    }
}

macro_rules! plain_values ({ $($ty:ty),* } => {
    $( impl Value for $ty {} )*
});

plain_values! {
    bool, char, String, &'static str,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64
}

impl<T: Value> Value for Vec<T> {}

impl<T: Value> Value for Option<T> {}

impl<T: ?Sized + Send + Sync + 'static> Value for Arc<T> {
    const KIND: Kind = Kind::Reference;
}

impl<T: Send + 'static> Value for mpsc::Sender<T> {
    const KIND: Kind = Kind::Reference;
}

/// Shared handle on an automatically constructed value.
///
/// An empty handle is allocated first, so that it can be injected into
/// circular fields, and the value is published once all its dependencies
/// are ready. All clones share the same slot.
pub struct Ref<T>(Arc<OnceCell<T>>);

impl<T> Ref<T> {
    /// Wrap an already constructed value
    pub fn new(value: T) -> Self {
        Self(Arc::new(OnceCell::with_value(value)))
    }

    pub(crate) fn empty() -> Self {
        Self(Arc::new(OnceCell::new()))
    }

    /// The referenced value, if it has been initialized yet
    pub fn get(&self) -> Option<&T> {
        self.0.get()
    }

    pub fn is_ready(&self) -> bool {
        self.0.get().is_some()
    }

    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    pub(crate) fn fill(&self, value: T) -> Result<(), T> {
        self.0.set(value)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Ref").field(value).finish(),
            None => f.write_str("Ref(<empty>)"),
        }
    }
}

impl<T: AutoProvide> Value for Ref<T> {
    const KIND: Kind = Kind::Reference;

    fn initializer() -> Result<Initializer, ProvideError> {
        auto::reference::<T>()
    }
}

/// Store singletons of [Value] types, at most one per type.
///
/// Entries are never replaced once set.
#[derive(Default)]
pub struct ValueStore(HashMap<TypeKey, Box<dyn Any + Send + Sync>>);

impl ValueStore {
    pub fn get<T: Value>(&self) -> Result<&T, ProvideError> {
        self.0
            .get(&TypeKey::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
            .ok_or(ProvideError::MissingValue(std::any::type_name::<T>()))
    }

    pub fn insert<T: Value>(&mut self, value: T) -> Result<(), ProvideError> {
        let key = TypeKey::of::<T>();
        let Entry::Vacant(v) = self.0.entry(key) else {
            return Err(ProvideError::AlreadyStored(key.name()));
        };
        v.insert(Box::new(value));
        Ok(())
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
