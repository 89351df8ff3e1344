//! Stale-While-Revalidate Coordination
//!
//! Races a delayed stale-response notification against the refresh request.
//! A resolve-once gate arbitrates: whichever of the timer and the refresh
//! arrival resolves it first decides whether the callback runs.

use std::future::{poll_fn, Future};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{HttpResponse, StaleCallback};

/// Delays shorter than this notify immediately instead of arming a timer
pub const NEGLIGIBLE_DELAY: Duration = Duration::from_millis(1);

// == Stale Gate ==
/// A once-resolvable gate guarding the stale notification.
///
/// Resolving with a response runs the callback; resolving with `None`
/// suppresses it. Only the first resolution has any effect.
pub struct StaleGate {
    callback: Mutex<Option<StaleCallback>>,
}

impl StaleGate {
    pub fn new(callback: StaleCallback) -> Self {
        Self {
            callback: Mutex::new(Some(callback)),
        }
    }

    /// Resolves the gate. Returns true if this call was the first resolution.
    pub fn resolve(&self, stale: Option<Arc<HttpResponse>>) -> bool {
        // Take under the lock, call outside it
        let Some(callback) = self.callback.lock().take() else {
            return false;
        };
        if let Some(response) = stale {
            notify_stale(&callback, response);
        }
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.callback.lock().is_none()
    }
}

/// Runs the stale callback, containing a panic so it never reaches the request.
fn notify_stale(callback: &StaleCallback, stale: Arc<HttpResponse>) {
    if panic::catch_unwind(AssertUnwindSafe(|| callback(stale))).is_err() {
        warn!("Stale response callback panicked, continuing with the refresh");
    }
}

// == Race ==
/// Awaits `refresh`, announcing `stale` through `callback` if the refresh is
/// still outstanding once `delay` has elapsed.
///
/// Without a stale response or a callback this is just `refresh.await`. A
/// missing or negligible delay runs the callback right after the refresh has
/// been polled once, so the request is already under way. The refresh settling,
/// successfully or not, cancels a pending notification; when the refresh and
/// the timer are ready together the refresh wins. A panicking callback is
/// logged and the refresh carries on.
pub async fn race_stale_notification<F>(
    refresh: F,
    stale: Option<Arc<HttpResponse>>,
    callback: Option<StaleCallback>,
    delay: Option<Duration>,
) -> Result<HttpResponse>
where
    F: Future<Output = Result<HttpResponse>>,
{
    let (Some(stale), Some(callback)) = (stale, callback) else {
        return refresh.await;
    };

    tokio::pin!(refresh);

    let delay = delay.unwrap_or(Duration::ZERO);
    if delay < NEGLIGIBLE_DELAY {
        let started = poll_fn(|cx| Poll::Ready(refresh.as_mut().poll(cx))).await;
        notify_stale(&callback, stale);
        return match started {
            Poll::Ready(outcome) => outcome,
            Poll::Pending => refresh.await,
        };
    }

    let gate = StaleGate::new(callback);

    let outcome = tokio::select! {
        biased;
        outcome = &mut refresh => outcome,
        () = tokio::time::sleep(delay) => {
            if gate.resolve(Some(stale)) {
                debug!("Refresh outlasted {:?}, announced stale response", delay);
            }
            refresh.await
        }
    };

    // No-op if the timer already fired
    gate.resolve(None);
    outcome
}
