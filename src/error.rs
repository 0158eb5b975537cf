//! Errors reported while registering rules or providing values

use thiserror::Error;

/// Failure returned by a rule or an initializer
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors triggered while wiring or constructing values.
///
/// Every error is terminal: the [crate::Provider] that returned it is poisoned
/// and refuses any further call.
#[derive(Error, Debug)]
pub enum ProvideError {
    #[error("trying to provide the same type {0} in multiple ways")]
    Conflict(&'static str),

    #[error("malformed rule: {0}")]
    MalformedRule(String),

    #[error("{0} can't be automatically provided")]
    NotAutoProvidable(&'static str),

    #[error("unrecognized provide tag {0:?}")]
    UnknownTag(String),

    #[error("{owner}.{field} is circular, but {field_type} is not a reference type")]
    CircularNonReference {
        owner: &'static str,
        field: &'static str,
        field_type: &'static str,
    },

    #[error("cycle: {}", .path.join(" --> "))]
    Cycle { path: Vec<&'static str> },

    #[error("can't use an empty auto-provided reference to provide a value for {0}")]
    NilReference(&'static str),

    /// Error returned by a rule or an initializer, kept as is
    #[error("{0}")]
    Construction(BoxError),

    #[error("since {0} is an error type, it cannot be provided")]
    ErrorKind(&'static str),

    #[error("no value stored for {0}")]
    MissingValue(&'static str),

    #[error("a value for {0} has already been stored")]
    AlreadyStored(&'static str),

    #[error("provider can't be used after a previous error")]
    Poisoned,
}
