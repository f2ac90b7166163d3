//! Poll loops for `wait_for` and `wait_for_delete`

use crdprov_core::{CrdKind, ObjectRef, WaitFor, WaitForDelete, WaitMatcher};
use humantime_serde::re::humantime::format_duration;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::backend::ClusterBackend;
use crate::error::{KubeError, Result};

/// Shortest pause between two polls
///
/// State files are not schema-validated, so a zero interval can still arrive here.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sleep for `interval`, but never past `deadline`
async fn sleep_until_next(interval: Duration, deadline: Instant) {
    let now = Instant::now();
    let remaining = deadline.saturating_duration_since(now);
    tokio::time::sleep(interval.max(MIN_POLL_INTERVAL).min(remaining)).await;
}

fn timeout_error(
    kind: &CrdKind,
    target: &ObjectRef,
    waiting_for: String,
    timeout: Duration,
) -> KubeError {
    KubeError::Timeout {
        kind: kind.kind.to_string(),
        id: target.id(),
        waiting_for,
        timeout: format_duration(timeout).to_string(),
    }
}

/// Poll until the object satisfies `wait`, returning the last object seen
pub async fn wait_for_ready<B>(
    backend: &B,
    kind: &CrdKind,
    target: &ObjectRef,
    wait: &WaitFor,
) -> Result<JsonValue>
where
    B: ClusterBackend + ?Sized,
{
    let matcher = WaitMatcher::new(wait)?;
    let deadline = Instant::now() + wait.timeout;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let object = backend
            .get(kind, target)
            .await?
            .ok_or_else(|| KubeError::NotFound {
                kind: kind.kind.to_string(),
                id: target.id(),
            })?;

        let unmet = matcher.unmet(&object);
        if unmet.is_empty() {
            debug!(kind = kind.kind, id = %target, attempt, "wait_for satisfied");
            return Ok(object);
        }

        debug!(kind = kind.kind, id = %target, attempt, unmet = ?unmet, "waiting");

        if Instant::now() >= deadline {
            return Err(timeout_error(
                kind,
                target,
                format!("to be ready ({})", unmet.join(", ")),
                wait.timeout,
            ));
        }
        sleep_until_next(wait.poll_interval, deadline).await;
    }
}

/// Poll until the object no longer exists
pub async fn wait_for_deletion<B>(
    backend: &B,
    kind: &CrdKind,
    target: &ObjectRef,
    wait: &WaitForDelete,
) -> Result<()>
where
    B: ClusterBackend + ?Sized,
{
    let deadline = Instant::now() + wait.timeout;

    loop {
        if backend.get(kind, target).await?.is_none() {
            debug!(kind = kind.kind, id = %target, "deleted");
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(timeout_error(
                kind,
                target,
                "to be deleted".to_string(),
                wait.timeout,
            ));
        }

        debug!(kind = kind.kind, id = %target, "still terminating");
        sleep_until_next(wait.poll_interval, deadline).await;
    }
}
