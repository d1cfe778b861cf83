//! Shared locking helper for the `app` modules.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::state::AppState;

/// Locks the `AppState`.
///
/// A poisoned lock is recovered: the state only holds plain data and handles,
/// none of which is left half-updated by a panicking holder.
pub fn lock_state(state: &Arc<Mutex<AppState>>) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
