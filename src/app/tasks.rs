//! Long-running work spawned on the Tokio runtime: scan batches and the shutdown flush.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::{JoinHandle, JoinSet};

use super::events::UserEvent;
use super::helpers::lock_state;
use super::proxy::EventProxy;
use super::state::AppState;
use crate::core::{CoreError, FlushOutcome, ScanEvent, ScanRequest, ScanStream};

/// Scans every root of `roots` concurrently and streams the results to the UI.
///
/// The caller has already sent `FlagAddAnimeFolderStart`. `FlagAddAnimeFolderEnd`
/// is sent exactly once, after every root has settled, whether it succeeded,
/// failed or was cancelled. A failing root shows an error dialog and does not
/// affect its siblings.
pub fn start_folder_scan<P: EventProxy>(
    roots: Vec<PathBuf>,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) -> Option<JoinHandle<()>> {
    let (request, reader, batch_id, token) = {
        let mut state_guard = lock_state(&state);

        let reader = state_guard.folder_reader();
        let reader = match reader {
            Ok(reader) => reader,
            Err(e) => {
                drop(state_guard);
                tracing::error!("Cannot start scan: {}", e);
                proxy.send_event(UserEvent::ShowError {
                    title: "Invalid settings".to_string(),
                    message: e.to_string(),
                });
                proxy.send_event(UserEvent::FlagAddAnimeFolderEnd);
                return None;
            }
        };

        let normalized: Vec<PathBuf> = roots
            .iter()
            .map(|root| state_guard.paths.normalize(root))
            .collect();
        state_guard.remember_directories(&normalized);

        let (batch_id, token) = state_guard.begin_batch();
        (ScanRequest::new(normalized), reader, batch_id, token)
    };

    tracing::info!(
        "Starting scan batch {} over {} roots",
        batch_id,
        request.root_paths.len()
    );

    let handle = tokio::spawn(async move {
        let mut scans = JoinSet::new();
        for root in request.root_paths {
            let stream = reader.scan_with_cancel(root, token.child_token());
            scans.spawn(forward_scan(stream, proxy.clone()));
        }

        while let Some(result) = scans.join_next().await {
            if let Err(e) = result {
                tracing::error!("Scan forwarder for batch {} did not finish: {}", batch_id, e);
            }
        }

        lock_state(&state).end_batch(batch_id);
        tracing::info!(
            "Scan batch {} settled in {}ms",
            batch_id,
            (chrono::Utc::now() - request.issued_at).num_milliseconds()
        );
        proxy.send_event(UserEvent::FlagAddAnimeFolderEnd);
    });

    Some(handle)
}

/// Forwards one root's events to the UI until its terminal event.
async fn forward_scan<P: EventProxy>(mut stream: ScanStream, proxy: P) {
    while let Some(event) = stream.next().await {
        match event {
            ScanEvent::FolderFound(folder) => {
                tracing::debug!("Found {:?}", folder.path);
                proxy.send_event(UserEvent::AddAnimeFolder(folder));
            }
            ScanEvent::FolderUpdated(folder) => {
                tracing::debug!("Updated {:?}", folder.path);
                proxy.send_event(UserEvent::UpdateAnimeFolder(folder));
            }
            ScanEvent::Complete { .. } => {}
            ScanEvent::Failed {
                root,
                error: CoreError::Cancelled,
            } => {
                tracing::info!("Scan of {:?} was cancelled", root);
            }
            ScanEvent::Failed { root, error } => {
                proxy.send_event(UserEvent::ShowError {
                    title: error.title().to_string(),
                    message: format!("{}\n\n{}", root.display(), error),
                });
            }
        }
    }
}

/// Starts the shutdown sequence: cancel scans, flush the cache within the
/// configured timeout, then send `FlushFinished` so the event loop can exit.
///
/// Returns `None` if shutdown is already in progress.
pub fn flush_cache_then_quit<P: EventProxy>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
) -> Option<JoinHandle<FlushOutcome>> {
    let (cache, timeout) = {
        let mut state_guard = lock_state(&state);
        if state_guard.is_shutting_down {
            return None;
        }
        state_guard.is_shutting_down = true;
        state_guard.cancel_all_scans();
        (state_guard.cache.clone(), state_guard.config.flush_timeout())
    };

    tracing::info!("Flushing cache before exit (timeout {:?})", timeout);
    Some(tokio::spawn(async move {
        let outcome = cache.flush_with_timeout(timeout).await;
        if let FlushOutcome::Flushed = outcome {
            tracing::info!("Cache flushed, exiting.");
        } else {
            tracing::warn!("Exiting without a complete cache flush: {:?}", outcome);
        }
        proxy.send_event(UserEvent::FlushFinished);
        outcome
    }))
}
