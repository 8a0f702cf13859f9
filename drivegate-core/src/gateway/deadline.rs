//! Per-request deadline and the once-only response slot
//!
//! Every request owns one [`ResponseSlot`]. The pipeline and the deadline
//! timer both try to fill it; whichever gets there first decides the
//! response and the other attempt is dropped.

use super::compose::RespBody;
use crate::error::TimeoutResource;
use hyper::Response;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinHandle};

/// Response channel that can be completed at most once
pub struct ResponseSlot {
    sender: Mutex<Option<oneshot::Sender<Response<RespBody>>>>,
}

impl ResponseSlot {
    pub fn new() -> (Arc<Self>, oneshot::Receiver<Response<RespBody>>) {
        let (tx, rx) = oneshot::channel();
        (Arc::new(Self { sender: Mutex::new(Some(tx)) }), rx)
    }

    /// Emit `response` unless something already was. Returns whether this
    /// call won.
    pub fn emit(&self, response: Response<RespBody>) -> bool {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();
        match sender {
            // A dropped receiver still counts as emitted
            Some(tx) => {
                let _ = tx.send(response);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn is_emitted(&self) -> bool {
        self.sender.lock().unwrap_or_else(|e| e.into_inner()).is_none()
    }
}

/// Single countdown for a whole request
pub struct DeadlineGuard {
    timer: Mutex<Option<JoinHandle<()>>>,
    target: Arc<Mutex<Option<AbortHandle>>>,
    archive_found: Arc<AtomicBool>,
}

impl DeadlineGuard {
    /// Arm the timer. On expiry the watched task is aborted and `on_expire`
    /// runs with what was being searched for.
    pub fn start<F>(budget: Duration, on_expire: F) -> Self
    where
        F: FnOnce(TimeoutResource) + Send + 'static,
    {
        let target: Arc<Mutex<Option<AbortHandle>>> = Arc::new(Mutex::new(None));
        let archive_found = Arc::new(AtomicBool::new(false));

        let timer = {
            let target = target.clone();
            let archive_found = archive_found.clone();
            tokio::spawn(async move {
                tokio::time::sleep(budget).await;
                if let Some(handle) = target.lock().unwrap_or_else(|e| e.into_inner()).take() {
                    handle.abort();
                }
                let resource = if archive_found.load(Ordering::Acquire) {
                    TimeoutResource::Page
                } else {
                    TimeoutResource::Site
                };
                on_expire(resource);
            })
        };

        Self { timer: Mutex::new(Some(timer)), target, archive_found }
    }

    /// Task to abort when the deadline passes
    pub fn watch(&self, handle: AbortHandle) {
        *self.target.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Record that the drive was found; a later timeout reports the page
    /// rather than the site
    pub fn mark_archive_found(&self) {
        self.archive_found.store(true, Ordering::Release);
    }

    /// Disarm the timer. Safe to call any number of times.
    pub fn cancel(&self) {
        if let Some(timer) = self.timer.lock().unwrap_or_else(|e| e.into_inner()).take() {
            timer.abort();
        }
        self.target.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}
