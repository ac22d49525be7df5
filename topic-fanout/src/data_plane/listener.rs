/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Listener handles handed out by the multiplexer.

use crate::data_plane::fanout::Fanout;
use crate::feed::Topic;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;

/// Identity of one registered listener within its topic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl Display for ListenerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Cancels exactly one listener registration.
///
/// Cloning yields another handle to the same registration. `cancel` is
/// idempotent and never affects the topic's receive loop or other listeners.
#[derive(Clone)]
pub struct ListenerHandle {
    id: ListenerId,
    fanout: Arc<Fanout>,
}

impl ListenerHandle {
    pub(crate) fn new(id: ListenerId, fanout: Arc<Fanout>) -> Self {
        Self { id, fanout }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn topic(&self) -> &Topic {
        self.fanout.topic()
    }

    /// Unregisters the listener and closes its queue. Payloads already queued
    /// can still be drained by the receiver.
    pub fn cancel(&self) {
        self.fanout.deregister(self.id);
    }
}

impl Debug for ListenerHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("topic", self.fanout.topic())
            .finish()
    }
}

/// A bounded queue of raw payloads for one topic plus its cancel handle.
///
/// Dropping a `Subscription` without calling [`Subscription::cancel`] leaves the
/// registration in place until the next broadcast notices the closed queue.
pub struct Subscription {
    topic: Topic,
    receiver: Receiver<String>,
    handle: ListenerHandle,
}

impl Subscription {
    pub(crate) fn new(topic: Topic, receiver: Receiver<String>, handle: ListenerHandle) -> Self {
        Self {
            topic,
            receiver,
            handle,
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn id(&self) -> ListenerId {
        self.handle.id()
    }

    /// Waits for the next payload. Returns `None` once the listener was
    /// cancelled and its queue drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }

    pub fn handle(&self) -> ListenerHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Splits into the raw receive side and the cancel handle.
    pub fn into_parts(self) -> (Receiver<String>, ListenerHandle) {
        (self.receiver, self.handle)
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.handle.id)
            .finish_non_exhaustive()
    }
}
