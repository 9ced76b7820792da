// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory transport.

use super::{BusError, PendingCall, PendingState, Transport, ERROR_FAILED, ERROR_TIMEOUT, ERROR_UNKNOWN_METHOD};
use crate::config::Limits;
use crate::message::{Message, MessageKind};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Peer logic for method calls: returns the reply (a method return or an
/// error), or `None` to leave the call unanswered.
pub type Handler = Box<dyn FnMut(&Message) -> Option<Message>>;

type Outgoing = (Message, Option<Rc<RefCell<PendingState>>>);

/// A transport whose peer is a local handler.
///
/// Sent messages are queued until [`flush`](Transport::flush). Method calls
/// then go to the handler; signals, and replies nobody waits on, land in
/// the inbox read by [`pop_message`](Transport::pop_message).
pub struct LoopbackBus {
    unique_name: String,
    next_serial: u32,
    limits: Limits,
    handler: Option<Handler>,
    outgoing: VecDeque<Outgoing>,
    inbox: VecDeque<Message>,
}

impl fmt::Debug for LoopbackBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackBus")
            .field("unique_name", &self.unique_name)
            .field("next_serial", &self.next_serial)
            .field("handler", &self.handler.is_some())
            .field("outgoing", &self.outgoing.len())
            .field("inbox", &self.inbox.len())
            .finish()
    }
}

impl Default for LoopbackBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self {
            unique_name: ":1.0".to_string(),
            next_serial: 1,
            limits: Limits::default(),
            handler: None,
            outgoing: VecDeque::new(),
            inbox: VecDeque::new(),
        }
    }

    pub fn with_handler(mut self, handler: impl FnMut(&Message) -> Option<Message> + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn set_handler(&mut self, handler: impl FnMut(&Message) -> Option<Message> + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Unique name stamped as the sender of every message.
    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// Messages sent but not yet flushed.
    pub fn queued(&self) -> usize {
        self.outgoing.len()
    }

    /// Deliver `message` to the inbox as if it arrived from a peer.
    pub fn inject(&mut self, message: Message) -> Result<(), BusError> {
        let message = self.stamp(message)?;
        self.inbox.push_back(message);
        Ok(())
    }

    /// Assign a serial and sender, then round-trip through the frame format.
    fn stamp(&mut self, mut message: Message) -> Result<Message, BusError> {
        message.set_serial(self.next_serial);
        self.next_serial = self.next_serial.wrapping_add(1).max(1);
        if message.sender().is_none() {
            message.set_sender(&self.unique_name)?;
        }
        let frame = message.marshal()?;
        let message = Message::demarshal(&frame, &self.limits)?;
        log::trace!(
            "[hdbus::loopback] {} serial {} ({} bytes)",
            message.kind(),
            message.serial(),
            frame.len()
        );
        Ok(message)
    }

    fn answer(&mut self, call: &Message) -> Result<Option<Message>, BusError> {
        match self.handler.as_mut() {
            Some(handler) => Ok(handler(call)),
            None => {
                let text = format!(
                    "no handler for {}.{}",
                    call.interface().unwrap_or_default(),
                    call.member().unwrap_or_default()
                );
                Ok(Some(Message::error(call, ERROR_UNKNOWN_METHOD, &text)?))
            }
        }
    }
}

impl Transport for LoopbackBus {
    fn send(&mut self, message: Message) -> Result<u32, BusError> {
        let message = self.stamp(message)?;
        let serial = message.serial();
        self.outgoing.push_back((message, None));
        Ok(serial)
    }

    fn send_with_reply_and_block(&mut self, message: Message, timeout: Duration) -> Result<Message, BusError> {
        let pending = self.send_with_reply(message)?;
        self.flush()?;
        if !pending.is_completed() {
            pending.cancel();
            return Err(BusError::new(
                ERROR_TIMEOUT,
                format!("no reply to serial {} within {:?}", pending.serial(), timeout),
            ));
        }
        pending.block(self)
    }

    fn send_with_reply(&mut self, message: Message) -> Result<PendingCall, BusError> {
        if message.kind() != MessageKind::MethodCall {
            return Err(BusError::new(ERROR_FAILED, "only method calls expect a reply"));
        }
        let message = self.stamp(message)?;
        let (pending, state) = PendingCall::new(message.serial());
        self.outgoing.push_back((message, Some(state)));
        Ok(pending)
    }

    fn pop_message(&mut self) -> Option<Message> {
        self.inbox.pop_front()
    }

    fn flush(&mut self) -> Result<(), BusError> {
        while let Some((message, pending)) = self.outgoing.pop_front() {
            if message.kind() != MessageKind::MethodCall {
                self.inbox.push_back(message);
                continue;
            }
            let Some(reply) = self.answer(&message)? else {
                continue;
            };
            let reply = self.stamp(reply)?;
            match pending {
                Some(state) => {
                    let mut state = state.borrow_mut();
                    if !state.cancelled {
                        state.reply = Some(reply);
                    }
                }
                None if message.no_reply_expected() => {}
                None => self.inbox.push_back(reply),
            }
        }
        Ok(())
    }
}
