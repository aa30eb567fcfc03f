//! Deferred task management.
//!
//! Owns the auto-defer race and the background tasks that turn deferred
//! work into follow-ups. Background tasks run on a `TaskTracker` so shutdown
//! can wait (bounded) for in-flight follow-ups. Failures in background work
//! are logged and never reach the inbound request, which has already been
//! answered.
//!
//! A follow-up is held back until its `FollowupRelease` is released, so the
//! edit of `@original` cannot be attempted before the primary defer has been
//! handed to the HTTP layer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, warn};

use sleet_types::config::AutoDeferConfig;
use sleet_types::interaction::Interaction;
use sleet_types::response::Response;

use crate::classify::RouteKind;
use crate::dispatch::{DispatchError, DispatchState};
use crate::handler::{ClientContext, DeferredResponse, DeferredWork, Reply};

/// Gate on a pending follow-up, released once the primary response is out.
///
/// Dropping it without releasing cancels delivery; the background work still
/// runs to completion.
#[derive(Debug)]
#[must_use = "the follow-up is only delivered once released"]
pub struct FollowupRelease(oneshot::Sender<()>);

impl FollowupRelease {
    pub fn release(self) {
        // The task only goes away after shutdown gave up on it.
        let _ = self.0.send(());
    }
}

#[derive(Clone)]
pub struct DeferredTaskManager {
    policy: AutoDeferConfig,
    tracker: TaskTracker,
}

impl DeferredTaskManager {
    pub fn new(policy: AutoDeferConfig) -> Self {
        Self {
            policy,
            tracker: TaskTracker::new(),
        }
    }

    pub fn policy(&self) -> AutoDeferConfig {
        self.policy
    }

    /// Whether a handler for this route kind races the defer timeout.
    pub fn applies_to(&self, kind: RouteKind) -> bool {
        self.policy.enabled && kind.is_deferrable()
    }

    /// Race a running handler against the auto-defer timeout.
    ///
    /// If the handler wins, its reply is returned as-is. Otherwise the
    /// still-running handler becomes the work of a synthesized
    /// `DeferredResponse` and keeps running.
    pub async fn race(
        &self,
        mut handle: JoinHandle<anyhow::Result<Reply>>,
    ) -> Result<Reply, DispatchError> {
        match tokio::time::timeout(self.policy.timeout(), &mut handle).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                debug!(
                    timeout_ms = self.policy.timeout_ms,
                    "handler exceeded auto-defer timeout, deferring"
                );
                Ok(Reply::Deferred(DeferredResponse::from_handler(
                    handle,
                    self.policy.ephemeral,
                )))
            }
        }
    }

    /// Wait for a handler with no deadline.
    pub async fn await_handler(
        &self,
        handle: JoinHandle<anyhow::Result<Reply>>,
    ) -> Result<Reply, DispatchError> {
        flatten(handle.await)
    }

    /// Drive deferred work to completion in the background and deliver its
    /// result as a follow-up once the returned gate is released.
    pub fn spawn_followup(
        &self,
        work: DeferredWork,
        interaction: Arc<Interaction>,
        context: ClientContext,
    ) -> FollowupRelease {
        let (release, released) = oneshot::channel();
        self.tracker.spawn(
            async move {
                let result = match settle(work, &context, &interaction).await {
                    Ok(result) => result,
                    Err(e) => {
                        error!(error = %e, "deferred work failed");
                        return;
                    }
                };

                if released.await.is_err() {
                    warn!("primary response was never sent, dropping follow-up");
                    return;
                }

                if let Err(e) = context.notifier().notify(&interaction, result).await {
                    error!(error = %e, "follow-up delivery failed");
                    return;
                }

                info!(state = DispatchState::FollowedUp.as_str(), "follow-up complete");
            }
            .in_current_span(),
        );
        FollowupRelease(release)
    }

    /// Number of follow-up tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting follow-ups and wait up to `grace` for in-flight ones.
    ///
    /// Returns `true` if every task finished within the grace period.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, grace_secs = grace.as_secs(), "waiting for in-flight follow-ups");
        }
        tokio::time::timeout(grace, self.tracker.wait()).await.is_ok()
    }
}

/// Run deferred work until it yields a final result.
///
/// A raced handler may itself return a `DeferredResponse`; its work is then
/// followed in turn.
async fn settle(
    mut work: DeferredWork,
    context: &ClientContext,
    interaction: &Arc<Interaction>,
) -> Result<Option<Response>, DispatchError> {
    loop {
        work = match work {
            DeferredWork::Handler(handle) => match flatten(handle.await)? {
                Reply::Response(response) => return Ok(Some(response)),
                Reply::Deferred(deferred) => deferred.into_parts().0,
            },
            DeferredWork::Task(handle) => return flatten(handle.await),
            pending @ DeferredWork::Pending(_) => pending.start(context, interaction),
        };
    }
}

fn flatten<T>(
    joined: Result<anyhow::Result<T>, tokio::task::JoinError>,
) -> Result<T, DispatchError> {
    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(DispatchError::Handler(e)),
        Err(e) => Err(DispatchError::HandlerAborted(e.to_string())),
    }
}
