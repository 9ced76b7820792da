// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport boundary.
//!
//! [`Transport`] is what the rest of an application sees of a bus
//! connection. This crate performs no I/O; [`LoopbackBus`] is an in-memory
//! implementation that hands method calls to a registered handler and
//! queues everything else for [`Transport::pop_message`]. Every message it
//! carries goes through the full marshal and demarshal round trip.

mod loopback;

pub use loopback::{Handler, LoopbackBus};

use crate::message::{Message, MessageKind};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

pub const ERROR_FAILED: &str = "org.freedesktop.DBus.Error.Failed";
pub const ERROR_NO_REPLY: &str = "org.freedesktop.DBus.Error.NoReply";
pub const ERROR_UNKNOWN_METHOD: &str = "org.freedesktop.DBus.Error.UnknownMethod";
pub const ERROR_TIMEOUT: &str = "org.freedesktop.DBus.Error.Timeout";
pub const ERROR_INVALID_ARGS: &str = "org.freedesktop.DBus.Error.InvalidArgs";

/// A named bus error.
///
/// The default value is unset; [`clear`](Self::clear) returns an error to
/// that state so one value can be reused across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct BusError {
    name: String,
    message: String,
}

impl BusError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Error carried by an error reply; `None` for any other message.
    pub fn from_reply(reply: &Message) -> Option<Self> {
        if reply.kind() != MessageKind::Error {
            return None;
        }
        let name = reply.error_name().unwrap_or(ERROR_FAILED);
        let text = reply
            .values()
            .ok()
            .and_then(|values| values.first().and_then(|v| v.as_str().map(str::to_string)))
            .unwrap_or_default();
        Some(Self::new(name, text))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_set(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.message.clear();
    }
}

impl From<crate::wire::WireError> for BusError {
    fn from(e: crate::wire::WireError) -> Self {
        Self::new(ERROR_INVALID_ARGS, e.to_string())
    }
}

/// A bus connection as seen by callers.
pub trait Transport {
    /// Queue `message` without expecting a reply; returns its serial.
    fn send(&mut self, message: Message) -> Result<u32, BusError>;

    /// Send a call and wait up to `timeout` for its reply. Error replies
    /// come back as `Err`.
    fn send_with_reply_and_block(&mut self, message: Message, timeout: Duration) -> Result<Message, BusError>;

    /// Send a call and return a handle to its future reply.
    fn send_with_reply(&mut self, message: Message) -> Result<PendingCall, BusError>;

    /// Next incoming message, if any.
    fn pop_message(&mut self) -> Option<Message>;

    /// Deliver everything queued for sending.
    fn flush(&mut self) -> Result<(), BusError>;
}

#[derive(Debug, Default)]
pub(crate) struct PendingState {
    pub(crate) reply: Option<Message>,
    pub(crate) cancelled: bool,
}

/// Handle to the reply of an asynchronous call.
#[derive(Debug, Clone)]
pub struct PendingCall {
    serial: u32,
    state: Rc<RefCell<PendingState>>,
}

impl PendingCall {
    pub(crate) fn new(serial: u32) -> (Self, Rc<RefCell<PendingState>>) {
        let state = Rc::new(RefCell::new(PendingState::default()));
        (
            Self {
                serial,
                state: Rc::clone(&state),
            },
            state,
        )
    }

    /// Serial of the call this handle waits on.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn is_completed(&self) -> bool {
        self.state.borrow().reply.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().cancelled
    }

    /// Take the reply, leaving the handle empty.
    pub fn steal_reply(&self) -> Option<Message> {
        self.state.borrow_mut().reply.take()
    }

    /// Drop interest in the reply; a later reply is discarded.
    pub fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        state.cancelled = true;
        state.reply = None;
    }

    /// Drive `transport` until the reply arrives and return it.
    pub fn block<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Message, BusError> {
        if self.is_cancelled() {
            return Err(BusError::new(ERROR_NO_REPLY, "pending call was cancelled"));
        }
        if !self.is_completed() {
            transport.flush()?;
        }
        let reply = self
            .steal_reply()
            .ok_or_else(|| BusError::new(ERROR_NO_REPLY, format!("no reply to serial {}", self.serial)))?;
        match BusError::from_reply(&reply) {
            Some(error) => Err(error),
            None => Ok(reply),
        }
    }
}

#[cfg(test)]
mod tests;
