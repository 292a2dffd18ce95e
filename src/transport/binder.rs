//! Connection binder.
//!
//! Holds at most one non-owning socket reference per transport and hands
//! it out only while the socket is open.

// ============================================================================
// Imports
// ============================================================================

use std::ptr;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};

use super::{ReadyState, Socket};

// ============================================================================
// Bound
// ============================================================================

/// A mounted socket and the peer it was mounted with.
struct Bound {
    socket: Weak<dyn Socket>,
    /// Captured at mount so diagnostics survive the socket being dropped.
    peer: String,
}

impl Bound {
    fn is(&self, socket: &Arc<dyn Socket>) -> bool {
        ptr::addr_eq(self.socket.as_ptr(), Arc::as_ptr(socket))
    }
}

// ============================================================================
// Binder
// ============================================================================

/// Enforces one connection per transport.
#[derive(Default)]
pub struct Binder {
    bound: Option<Bound>,
}

impl Binder {
    /// Creates an empty binder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `socket`.
    ///
    /// Mounting the socket that is already bound is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalRebind`] if a different socket is bound;
    /// the binding is left unchanged.
    pub fn mount(&mut self, socket: &Arc<dyn Socket>) -> Result<()> {
        match &self.bound {
            Some(bound) if bound.is(socket) => Ok(()),
            Some(bound) => Err(Error::illegal_rebind(&bound.peer, socket.peer())),
            None => {
                self.bound = Some(Bound {
                    socket: Arc::downgrade(socket),
                    peer: socket.peer(),
                });
                Ok(())
            }
        }
    }

    /// Returns the bound socket if it is open.
    ///
    /// A socket dropped by its owner counts as closed.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectMissing`] if nothing is bound
    /// - [`Error::SocketDead`] if the bound socket is not open
    pub fn ensure(&self) -> Result<Arc<dyn Socket>> {
        let bound = self.bound.as_ref().ok_or(Error::ConnectMissing)?;

        match bound.socket.upgrade() {
            Some(socket) => match socket.ready_state() {
                ReadyState::Open => Ok(socket),
                state => Err(Error::socket_dead(&bound.peer, state)),
            },
            None => Err(Error::socket_dead(&bound.peer, ReadyState::Closed)),
        }
    }

    /// Clears the binding.
    #[inline]
    pub fn unbind(&mut self) {
        self.bound = None;
    }

    /// Returns `true` if a socket is bound.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Returns the peer of the bound socket.
    #[inline]
    #[must_use]
    pub fn peer(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.peer.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
