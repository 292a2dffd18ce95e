//! In-memory [`Socket`] for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{BoxError, ReadyState, Socket};

/// Records writes and lets tests drive the ready state.
pub(crate) struct MockSocket {
    peer: String,
    state: Mutex<ReadyState>,
    sent: Mutex<Vec<String>>,
    close_calls: AtomicUsize,
    fail_send: AtomicBool,
    fail_close: AtomicBool,
}

impl MockSocket {
    pub(crate) fn new(peer: &str) -> Arc<Self> {
        Arc::new(Self {
            peer: peer.to_owned(),
            state: Mutex::new(ReadyState::Open),
            sent: Mutex::new(Vec::new()),
            close_calls: AtomicUsize::new(0),
            fail_send: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
        })
    }

    /// Same socket, typed for `mount`.
    pub(crate) fn handle(self: &Arc<Self>) -> Arc<dyn Socket> {
        Arc::clone(self) as Arc<dyn Socket>
    }

    pub(crate) fn set_state(&self, state: ReadyState) {
        *self.state.lock() = state;
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub(crate) fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_send(&self) {
        self.fail_send.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }
}

impl Socket for MockSocket {
    fn peer(&self) -> String {
        self.peer.clone()
    }

    fn ready_state(&self) -> ReadyState {
        *self.state.lock()
    }

    fn send(&self, payload: &str) -> Result<(), BoxError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err("send refused".into());
        }
        self.sent.lock().push(payload.to_owned());
        Ok(())
    }

    fn close(&self) -> Result<(), BoxError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err("close refused".into());
        }
        self.set_state(ReadyState::Closed);
        Ok(())
    }
}
