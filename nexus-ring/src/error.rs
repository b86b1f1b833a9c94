//! Errors returned by enqueue and dequeue operations.

use std::fmt;

use thiserror::Error;

/// Error returned when a value could not be enqueued.
///
/// `Full` and `NotReady` hand the value back. `Raced` is only reported after
/// the value was already moved into a slot.
#[derive(Error, Clone, Copy, PartialEq, Eq)]
pub enum PushError<T> {
    /// The buffer holds its usable capacity. Contains the rejected value.
    #[error("queue full")]
    Full(T),
    /// The buffer is being reset. Contains the rejected value.
    #[error("queue not ready")]
    NotReady(T),
    /// A slot's handshake tag changed under its claim holder.
    ///
    /// Only a reset running concurrently with the operation causes this.
    #[error("queue race")]
    Raced,
}

impl<T> PushError<T> {
    /// Returns the rejected value, if the error carries one.
    pub fn into_inner(self) -> Option<T> {
        match self {
            Self::Full(value) | Self::NotReady(value) => Some(value),
            Self::Raced => None,
        }
    }

    /// Returns `true` if this error is the `Full` variant.
    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    /// Returns `true` if this error is the `NotReady` variant.
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }

    /// Returns `true` if this error is the `Raced` variant.
    pub const fn is_raced(&self) -> bool {
        matches!(self, Self::Raced)
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
            Self::NotReady(_) => f.write_str("NotReady(..)"),
            Self::Raced => f.write_str("Raced"),
        }
    }
}

/// Error returned when no value could be dequeued.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// The buffer holds no values.
    #[error("queue empty")]
    Empty,
    /// The buffer is being reset.
    #[error("queue not ready")]
    NotReady,
    /// A slot's handshake tag changed under its claim holder.
    #[error("queue race")]
    Raced,
}

impl PopError {
    /// Returns `true` if this error is the `Empty` variant.
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if this error is the `NotReady` variant.
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    /// Returns `true` if this error is the `Raced` variant.
    pub const fn is_raced(&self) -> bool {
        matches!(self, Self::Raced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_error_returns_value() {
        assert_eq!(PushError::Full(3).into_inner(), Some(3));
        assert_eq!(PushError::NotReady(4).into_inner(), Some(4));
        assert_eq!(PushError::<u8>::Raced.into_inner(), None);
    }

    #[test]
    fn messages() {
        assert_eq!(PushError::Full(()).to_string(), "queue full");
        assert_eq!(PushError::NotReady(()).to_string(), "queue not ready");
        assert_eq!(PushError::<()>::Raced.to_string(), "queue race");
        assert_eq!(PopError::Empty.to_string(), "queue empty");
        assert_eq!(PopError::NotReady.to_string(), "queue not ready");
    }

    #[test]
    fn debug_does_not_need_debug_values() {
        struct Opaque;
        let err = PushError::Full(Opaque);
        assert_eq!(format!("{err:?}"), "Full(..)");
        assert!(err.is_full());
    }

    #[test]
    fn usable_as_boxed_error() {
        let err: Box<dyn std::error::Error> = Box::new(PopError::Empty);
        assert_eq!(err.to_string(), "queue empty");

        let err: Box<dyn std::error::Error> = Box::new(PushError::Full(1u32));
        assert_eq!(err.to_string(), "queue full");
    }
}
