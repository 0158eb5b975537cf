//! Compile constructor functions into deferred tasks.
//!
//! A rule is any function from dependencies to new values:
//!
//! * each argument is a dependency, required fully initialized;
//! * the return value is a single value, a tuple of values, or a [Result] of those.
//!   An `Err` aborts the resolution and nothing gets stored.
//!
//! All outputs of a rule share a single action, latched so that the function
//! runs at most once even though each output has its own tasks.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::task::{Action, Initializer, State, Task, TypeKey};
use crate::value::{Kind, Value, ValueStore};
use crate::{BoxError, ProvideError};

/// A Rule has a ```call``` function with a single argument and a single return type.
///
/// This trait is implemented for all functions with up to 10 arguments, using a tuple to
/// wrap them all in a single type.
pub trait Rule<Args, Out>: Send + Sync + 'static {
    fn call(&self, args: Args) -> Out;
}

/// Tuple of dependencies, fetched from the store once they are complete
pub trait Inputs: Sized + 'static {
    #[doc(hidden)]
    fn tasks() -> Vec<Task>;

    #[doc(hidden)]
    fn fetch(values: &ValueStore) -> Result<Self, ProvideError>;
}

/// Values produced by a rule
pub trait Outputs: Sized + 'static {
    #[doc(hidden)]
    fn keys() -> Result<Vec<TypeKey>, ProvideError>;

    #[doc(hidden)]
    fn store(self, values: &mut ValueStore) -> Result<(), ProvideError>;
}

fn output_key<T: Value>() -> Result<TypeKey, ProvideError> {
    let key = TypeKey::of::<T>();
    if key.kind() == Kind::Error {
        return Err(ProvideError::MalformedRule(format!(
            "{} is an error type, return it as the Err variant of a Result",
            key.name()
        )));
    }
    Ok(key)
}

impl<T: Value> Outputs for T {
    fn keys() -> Result<Vec<TypeKey>, ProvideError> {
        Ok(vec![output_key::<T>()?])
    }

    fn store(self, values: &mut ValueStore) -> Result<(), ProvideError> {
        values.insert(self)
    }
}

impl<O: Outputs, E: Into<BoxError> + 'static> Outputs for Result<O, E> {
    fn keys() -> Result<Vec<TypeKey>, ProvideError> {
        O::keys()
    }

    fn store(self, values: &mut ValueStore) -> Result<(), ProvideError> {
        match self {
            Ok(outputs) => outputs.store(values),
            Err(err) => Err(ProvideError::Construction(err.into())),
        }
    }
}

macro_rules! rule_tuple ({ $($param:ident)* } => {
    impl<Func, Out, $($param,)*> Rule<($($param,)*), Out> for Func
    where
        Func: Fn($($param),*) -> Out + Send + Sync + 'static,
    {
        #[inline]
        #[allow(non_snake_case)]
        fn call(&self, ($($param,)*): ($($param,)*)) -> Out {
            (self)($($param,)*)
        }
    }

    // Extract such tuples for a list of parameter types
    #[allow(clippy::unused_unit)]
    impl<$($param: Value,)*> Inputs for ($($param,)*) {
        #[inline]
        fn tasks() -> Vec<Task> {
            vec![$(Task::complete(TypeKey::of::<$param>()),)*]
        }

        #[inline]
        fn fetch(_values: &ValueStore) -> Result<Self, ProvideError> {
            Ok(($(_values.get::<$param>()?.clone(),)*))
        }
    }
});

rule_tuple! {}
rule_tuple! { A }
rule_tuple! { A B }
rule_tuple! { A B C }
rule_tuple! { A B C D }
rule_tuple! { A B C D E }
rule_tuple! { A B C D E F }
rule_tuple! { A B C D E F G }
rule_tuple! { A B C D E F G H }
rule_tuple! { A B C D E F G H I }
rule_tuple! { A B C D E F G H I J }

macro_rules! output_tuple ({ $($param:ident)+ } => {
    impl<$($param: Value,)+> Outputs for ($($param,)+) {
        fn keys() -> Result<Vec<TypeKey>, ProvideError> {
            Ok(vec![$(output_key::<$param>()?,)+])
        }

        #[allow(non_snake_case)]
        fn store(self, values: &mut ValueStore) -> Result<(), ProvideError> {
            let ($($param,)+) = self;
            $( values.insert($param)?; )+
            Ok(())
        }
    }
});

output_tuple! { A }
output_tuple! { A B }
output_tuple! { A B C }
output_tuple! { A B C D }
output_tuple! { A B C D E }
output_tuple! { A B C D E F }

/// Action shared by all outputs of a rule
struct RuleAction<R, Args, Out> {
    rule: R,
    executed: AtomicBool,
    signature: PhantomData<fn(Args) -> Out>,
}

impl<R, Args, Out> RuleAction<R, Args, Out>
where
    R: Rule<Args, Out>,
    Args: Inputs,
    Out: Outputs,
{
    fn run(&self, values: &mut ValueStore) -> Result<(), ProvideError> {
        if self.executed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let args = Args::fetch(values)?;
        self.rule.call(args).store(values)
    }
}

/// Build one initializer per value produced by the rule
pub(crate) fn compile<Args, Out, R>(rule: R) -> Result<Vec<Initializer>, ProvideError>
where
    R: Rule<Args, Out>,
    Args: Inputs,
    Out: Outputs,
{
    let keys = Out::keys()?;
    let deps = Args::tasks();

    let shared = Arc::new(RuleAction {
        rule,
        executed: AtomicBool::new(false),
        signature: PhantomData,
    });
    let action: Action = Arc::new(move |values: &mut ValueStore| shared.run(values));

    Ok(keys
        .into_iter()
        .map(|key| Initializer {
            key,
            partial: State::new(deps.clone(), Some(action.clone())),
            complete: State::new(vec![Task::partial(key)], None),
        })
        .collect())
}
