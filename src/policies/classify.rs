//! # Error classification.
//!
//! [`classify`] maps a [`ReconcileError`] to its [`ErrorClass`] from the
//! variant alone: message text and retry count never matter.
//!
//! | Variant                                  | Class        |
//! |------------------------------------------|--------------|
//! | `Fatal`, `InvalidStrategy`               | `Fatal`      |
//! | `Actionable`                             | `Actionable` |
//! | `Transient`, `Store`                     | `Transient`  |

use crate::error::{ErrorClass, ReconcileError};

/// Returns the class of `err`.
///
/// # Example
/// ```
/// use deployvisor::{ErrorClass, ReconcileError, classify};
///
/// assert_eq!(classify(&ReconcileError::fatal("bad record")), ErrorClass::Fatal);
/// assert_eq!(classify(&ReconcileError::transient("busy")), ErrorClass::Transient);
/// ```
pub fn classify(err: &ReconcileError) -> ErrorClass {
    match err {
        ReconcileError::Fatal { .. } | ReconcileError::InvalidStrategy(_) => ErrorClass::Fatal,
        ReconcileError::Actionable { .. } => ErrorClass::Actionable,
        ReconcileError::Transient { .. } | ReconcileError::Store(_) => ErrorClass::Transient,
    }
}

impl ReconcileError {
    /// Shorthand for [`classify`].
    #[inline]
    pub fn class(&self) -> ErrorClass {
        classify(self)
    }
}
