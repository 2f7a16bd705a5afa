//! # Collapsing per-service results into one outcome.
//!
//! [`Multi`](crate::Multi) records one result per registered service (same
//! position as the service) and hands the whole list to [`collapse`]:
//!
//! ```text
//! []                        → Ok(())
//! [Ok, Ok, Ok]              → Ok(())
//! [Ok, Err(a), Ok]          → Err(a)                       (unwrapped)
//! [Err(a), Ok, Err(b)]      → Err(Multiple([a, b]))        "a,b"
//! ```
//!
//! The same function is used for run results and for shutdown results.

use std::fmt;

use crate::error::ServiceError;

/// Two or more per-service failures, in registration order.
///
/// Renders as the individual messages joined with `,`. Inspect [`errors`](MultiError::errors)
/// instead of parsing the message when per-service detail matters.
#[derive(Debug)]
pub struct MultiError {
    errors: Vec<ServiceError>,
}

impl MultiError {
    /// The collected failures, in registration order.
    pub fn errors(&self) -> &[ServiceError] {
        &self.errors
    }

    /// Consumes the composite and returns its failures.
    pub fn into_errors(self) -> Vec<ServiceError> {
        self.errors
    }

    /// Iterates over the failures in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ServiceError> {
        self.errors.iter()
    }

    /// Number of failures (always at least two).
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Never true for a composite built by [`collapse`].
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a ServiceError;
    type IntoIter = std::slice::Iter<'a, ServiceError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Collapses an ordered list of per-service results.
///
/// - no failures → `Ok(())`
/// - exactly one failure → that failure, unwrapped
/// - two or more → [`ServiceError::Multiple`], order preserved
///
/// # Example
/// ```
/// use servexec::{ServiceError, aggregate::collapse};
///
/// let out = collapse(vec![
///     Ok(()),
///     Err(ServiceError::fail("err1")),
///     Err(ServiceError::fail("err2")),
/// ]);
/// assert_eq!(out.unwrap_err().to_string(), "err1,err2");
/// ```
pub fn collapse<I>(results: I) -> Result<(), ServiceError>
where
    I: IntoIterator<Item = Result<(), ServiceError>>,
{
    let mut errors: Vec<ServiceError> = results.into_iter().filter_map(Result::err).collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ServiceError::Multiple(MultiError { errors })),
    }
}
