//! Dependency injection based on construction rules and automatic wiring.
//!
//! A [Provider] automatically constructs and initializes values, holding at most
//! one value of each type. It relies on two sources of construction plans:
//!
//! * **Rules** are functions from dependencies to new values (and optionally an
//!   error), registered with [Provider::add_rule].
//! * **Automatic construction** is described by the types themselves, through
//!   [AutoProvide] field bindings and the optional [Initialize] capability.
//!
//! # Simple use case
//!
//! ```
//! # use std::sync::Arc;
//! # use provide::*;
//! // Define traits and implementors
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Clone)]
//! struct Name(String);
//!
//! #[derive(Clone, Default)]
//! struct Polite {
//!     name: Option<Name>,
//! }
//!
//! impl Greeter for Polite {
//!     fn greet(&self) -> String {
//!         match &self.name {
//!             Some(name) => format!("Good morning, {}", name.0),
//!             None => "Good morning".to_string(),
//!         }
//!     }
//! }
//!
//! // Polite is built automatically by injecting its name field
//! impl AutoProvide for Polite {
//!     fn plan(plan: &mut Plan<Self>) -> Result<(), ProvideError> {
//!         plan.field("name", Injection::Eager, |p: &mut Self, name: Name| p.name = Some(name))?;
//!         Ok(())
//!     }
//! }
//!
//! impl_value!(Name);
//! impl_value!(auto Polite);
//!
//! # fn main() -> Result<(), ProvideError> {
//! let mut provider = Provider::new();
//! provider
//!     .add_rule(|| Name("world".to_string()))?
//!     // Select the implementation used for the trait
//!     .add_rule(|polite: Polite| -> Arc<dyn Greeter> { Arc::new(polite) })?;
//!
//! let greeter: Arc<dyn Greeter> = provider.provide()?;
//! assert_eq!(greeter.greet(), "Good morning, world");
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! Every type is constructed in two steps, each step being a task of the
//! resolution graph: a *partial* value is allocated and can be referenced, a
//! *complete* value is fully initialized. Rules produce their outputs at the
//! partial step. Automatic construction first allocates an empty [Ref] handle,
//! then fills it once the injected fields and initializer dependencies are
//! complete.
//!
//! Tasks are resolved in dependency order, each action running at most once.
//! Dependency cycles are an error, unless a reference-typed field is marked as
//! [Injection::Circular]: it then only requires the partial value, which will
//! be completed before the request returns.
//!
//! Only one value per type is kept. To inject several values of the same type,
//! wrap them in distinct types.

pub mod auto;
mod error;
mod helpers;
mod inject;
mod resolve;
mod rule;
mod task;
mod value;

pub use auto::{AutoProvide, Initialize, Injection, Plan};
pub use error::{BoxError, ProvideError};
pub use inject::{Inject, Injector, Provider};
pub use resolve::{CycleReport, Options};
pub use rule::{Inputs, Outputs, Rule};
pub use task::{Initializer, Level, Task, TypeKey};
pub use value::{Kind, Ref, Value, ValueStore};
