//! Cursor state shared by writers and readers.
//!
//! While a child scope handle is alive it mutably borrows its parent, so the
//! parent cannot be touched. The only misuse the borrow checker cannot see
//! is a child handle being dropped before it is closed; that leaves the
//! parent's cursor inside the child container, so the parent is marked
//! abandoned and refuses all further work.

use crate::error::UsageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ScopeState {
    #[default]
    Ready,
    Abandoned,
}

impl ScopeState {
    #[inline]
    pub(crate) fn check(self) -> Result<(), UsageError> {
        match self {
            ScopeState::Ready => Ok(()),
            ScopeState::Abandoned => Err(UsageError::ScopeAbandoned),
        }
    }
}
