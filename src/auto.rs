//! Automatic construction of types that have no explicit rule.
//!
//! A structured type opts in by implementing [AutoProvide]: it starts from its
//! [Default] value and describes a [Plan] listing the fields to inject and,
//! optionally, a post-construction [Initialize] step.
//!
//! * [Ref<T>] is built in two steps: an empty handle is allocated first
//!   (partial level), the value is published into it once fields and initializer
//!   dependencies are complete.
//! * A plain `T` declared with `impl_value!(auto T)` is obtained by completing
//!   [Ref<T>] and cloning the value out of it.

use std::any::type_name;
use std::str::FromStr;
use std::sync::Arc;

use tracing::trace;

use crate::rule::Inputs;
use crate::task::{Action, Initializer, Level, State, Task, TypeKey};
use crate::value::{Kind, Ref, Value, ValueStore};
use crate::{BoxError, ProvideError};

/// Mark a structured type as automatically constructible
pub trait AutoProvide: Default + Send + Sync + 'static {
    /// Declare the injected fields and the optional initializer
    fn plan(plan: &mut Plan<Self>) -> Result<(), ProvideError>;
}

/// Post-construction initialization capability.
///
/// Called after all injected fields have been set, with its own dependencies.
/// A type enables it with [Plan::initialize].
pub trait Initialize: AutoProvide {
    type Deps: Inputs;

    fn initialize(&mut self, deps: Self::Deps) -> Result<(), BoxError>;
}

/// Completion required from an injected field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Injection {
    /// The field value must be fully initialized
    #[default]
    Eager,
    /// The field only needs to be allocated, allowed for reference types only
    Circular,
}

impl Injection {
    fn level(self) -> Level {
        match self {
            Injection::Eager => Level::Complete,
            Injection::Circular => Level::Partial,
        }
    }
}

/// Parse textual field annotations (`""`, `"eager"` or `"circular"`), for
/// code generating plans from attributes such as a derive macro.
impl FromStr for Injection {
    type Err = ProvideError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "" | "eager" => Ok(Injection::Eager),
            "circular" => Ok(Injection::Circular),
            _ => Err(ProvideError::UnknownTag(tag.to_string())),
        }
    }
}

type Hook<T> = Arc<dyn Fn(&mut T, &ValueStore) -> Result<(), ProvideError> + Send + Sync>;

struct FieldBinding<T> {
    dep: Task,
    set: Hook<T>,
}

struct InitBinding<T> {
    deps: Vec<Task>,
    run: Hook<T>,
}

/// Declarative construction plan of an [AutoProvide] type
pub struct Plan<T> {
    fields: Vec<FieldBinding<T>>,
    init: Option<InitBinding<T>>,
}

impl<T: AutoProvide> Plan<T> {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            init: None,
        }
    }

    /// Inject a field of type `F` using the provided setter.
    ///
    /// Fields are set in declaration order.
    pub fn field<F: Value>(
        &mut self,
        name: &'static str,
        injection: Injection,
        assign: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Result<&mut Self, ProvideError> {
        let key = TypeKey::of::<F>();
        if injection == Injection::Circular && key.kind() != Kind::Reference {
            return Err(ProvideError::CircularNonReference {
                owner: type_name::<T>(),
                field: name,
                field_type: key.name(),
            });
        }

        let set: Hook<T> = Arc::new(
            move |instance: &mut T, values: &ValueStore| -> Result<(), ProvideError> {
                assign(instance, values.get::<F>()?.clone());
                Ok(())
            },
        );
        self.fields.push(FieldBinding {
            dep: Task {
                key,
                level: injection.level(),
            },
            set,
        });
        Ok(self)
    }

    /// Call [Initialize::initialize] once all fields are set
    pub fn initialize(&mut self) -> &mut Self
    where
        T: Initialize,
    {
        let run: Hook<T> = Arc::new(run_initializer::<T>);
        self.init = Some(InitBinding {
            deps: T::Deps::tasks(),
            run,
        });
        self
    }

    fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.init.is_none()
    }
}

fn run_initializer<T: Initialize>(
    instance: &mut T,
    values: &ValueStore,
) -> Result<(), ProvideError> {
    let deps = T::Deps::fetch(values)?;
    instance.initialize(deps).map_err(ProvideError::Construction)
}

/// Derive the tasks of [Ref<T>] from the plan of `T`
pub fn reference<T: AutoProvide>() -> Result<Initializer, ProvideError> {
    let mut plan = Plan::new();
    T::plan(&mut plan)?;
    if plan.is_empty() {
        return Err(ProvideError::NotAutoProvidable(type_name::<T>()));
    }

    let key = TypeKey::of::<Ref<T>>();
    let mut deps = Vec::with_capacity(1 + plan.fields.len());
    deps.push(Task::partial(key));
    deps.extend(plan.fields.iter().map(|field| field.dep));
    if let Some(init) = &plan.init {
        deps.extend(init.deps.iter().copied());
    }

    let Plan { fields, init } = plan;
    let build: Action = Arc::new(move |values: &mut ValueStore| -> Result<(), ProvideError> {
        let mut instance = T::default();
        for field in &fields {
            (field.set)(&mut instance, values)?;
        }
        if let Some(init) = &init {
            trace!(ty = type_name::<T>(), "running initializer");
            (init.run)(&mut instance, values)?;
        }
        values
            .get::<Ref<T>>()?
            .fill(instance)
            .map_err(|_| ProvideError::AlreadyStored(type_name::<T>()))
    });
    let allocate: Action = Arc::new(|values: &mut ValueStore| values.insert(Ref::<T>::empty()));

    Ok(Initializer {
        key,
        partial: State::new(Vec::new(), Some(allocate)),
        complete: State::new(deps, Some(build)),
    })
}

/// Derive the tasks of a plain `T` by dereferencing a complete [Ref<T>]
pub fn dereference<T: AutoProvide + Value>() -> Result<Initializer, ProvideError> {
    let key = TypeKey::of::<T>();
    let pointer = TypeKey::of::<Ref<T>>();

    let copy: Action = Arc::new(move |values: &mut ValueStore| -> Result<(), ProvideError> {
        let value = values
            .get::<Ref<T>>()?
            .get()
            .cloned()
            .ok_or(ProvideError::NilReference(key.name()))?;
        values.insert(value)
    });

    Ok(Initializer {
        key,
        partial: State::new(vec![Task::complete(pointer)], Some(copy)),
        complete: State::new(vec![Task::partial(key)], None),
    })
}
