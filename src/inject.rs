use std::sync::Mutex;

use tracing::{debug, warn};

use crate::resolve::{Options, Scheduler};
use crate::rule::{compile, Inputs, Outputs, Rule};
use crate::value::{Kind, Value};
use crate::ProvideError;

/// A dependency injector.
///
/// It contains a pool of values as well as rules used to construct new ones.
/// A Provider only ever contains at most a single value for any given type,
/// and a single rule to construct it. Use wrapper types to inject several
/// values of the same type.
///
/// A Provider is no longer usable after it returns an error, such as when
/// conflicting rules are added or when a rule fails: all later calls return
/// [ProvideError::Poisoned].
#[derive(Default)]
pub struct Provider {
    scheduler: Scheduler,
    poisoned: bool,
}

impl Provider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            scheduler: Scheduler::new(options),
            poisoned: false,
        }
    }

    /// Give the provider a way to construct more types.
    ///
    /// A rule is any function from dependencies to new values or an error:
    ///
    /// ```
    /// # use provide::*;
    /// # #[derive(Clone)] struct X(u32);
    /// # #[derive(Clone)] struct Y(u32);
    /// # impl_value!(X, Y);
    /// # fn main() -> Result<(), ProvideError> {
    /// let mut provider = Provider::new();
    /// provider
    ///     .add_rule(|| 3u32)?
    ///     .add_rule(|n: u32| -> Result<(X, Y), std::fmt::Error> { Ok((X(n), Y(n * 2))) })?;
    /// let y: Y = provider.provide()?;
    /// assert_eq!(y.0, 6);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// The rule is called at most once, when any of its outputs is first needed.
    /// All rules should be added before the provider is used to provide values:
    /// a type that was already constructed automatically can't get a rule anymore.
    pub fn add_rule<Args, Out, R>(&mut self, rule: R) -> Result<&mut Self, ProvideError>
    where
        R: Rule<Args, Out>,
        Args: Inputs,
        Out: Outputs,
    {
        self.guard(|scheduler| {
            for init in compile(rule)? {
                debug!(ty = init.key().name(), "adding rule");
                scheduler.install(init)?;
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// Construct (if needed) and return the value of the requested type
    pub fn provide<T: Value>(&mut self) -> Result<T, ProvideError> {
        let (value,) = self.provide_all::<(T,)>()?;
        Ok(value)
    }

    /// Construct (if needed) and return a tuple of values.
    ///
    /// Requested types are validated before any construction starts.
    pub fn provide_all<R: Inputs>(&mut self) -> Result<R, ProvideError> {
        self.guard(|scheduler| {
            let tasks = R::tasks();
            if let Some(task) = tasks.iter().find(|task| task.key().kind() == Kind::Error) {
                return Err(ProvideError::ErrorKind(task.key().name()));
            }
            for task in &tasks {
                debug!(ty = task.key().name(), "providing");
                scheduler.complete(task.key())?;
            }
            R::fetch(scheduler.values())
        })
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn guard<T>(
        &mut self,
        op: impl FnOnce(&mut Scheduler) -> Result<T, ProvideError>,
    ) -> Result<T, ProvideError> {
        if self.poisoned {
            return Err(ProvideError::Poisoned);
        }
        let result = op(&mut self.scheduler);
        if let Err(err) = &result {
            warn!(%err, "provider poisoned");
            self.poisoned = true;
        }
        result
    }
}

/// Application-level dependency injection
pub trait Inject<T> {
    /// Obtain an instance of the target type.
    ///
    /// Return an error if the type could not be provided
    fn inject(&self) -> Result<T, ProvideError>;
}

/// Shared access to a [Provider].
///
/// Requests are serialized through a mutex, so the injector can be shared
/// between threads once all rules have been added.
pub struct Injector {
    provider: Mutex<Provider>,
}

impl Injector {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider: Mutex::new(provider),
        }
    }
}

impl From<Provider> for Injector {
    fn from(provider: Provider) -> Self {
        Self::new(provider)
    }
}

/// Provide an Inject impl for all provided types
impl<T: Value> Inject<T> for Injector {
    fn inject(&self) -> Result<T, ProvideError> {
        self.provider
            .lock()
            .map_err(|_| ProvideError::Poisoned)?
            .provide()
    }
}
