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

//! Upstream feed adapter contract.
//!
//! The multiplexer depends only on these traits. A concrete pub/sub client
//! (a managed cloud subscription, a broker consumer, or the in-process
//! [`memory::MemoryFeed`]) implements them and is handed to
//! [`crate::Multiplexer::new`] through a [`FeedConnector`].
//!
//! Delivery from the upstream is at-least-once: every [`FeedMessage`] must be
//! settled with exactly one of [`FeedMessage::ack`] or [`FeedMessage::nack`].

pub mod memory;

use crate::error::FeedError;
use async_trait::async_trait;
use std::borrow::Borrow;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Opaque identifier naming one upstream feed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(String);

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&Topic> for Topic {
    fn from(topic: &Topic) -> Self {
        topic.clone()
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Settlement channel back to the upstream for one delivered message.
pub trait AckReply: Send + Sync {
    fn ack(&self);
    fn nack(&self);
}

/// One message delivered by the upstream feed.
pub struct FeedMessage {
    id: String,
    data: Vec<u8>,
    reply: Box<dyn AckReply>,
}

impl FeedMessage {
    pub fn new(id: impl Into<String>, data: Vec<u8>, reply: Box<dyn AckReply>) -> Self {
        Self {
            id: id.into(),
            data,
            reply,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload as text; invalid UTF-8 sequences are replaced.
    pub fn payload(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Acknowledges the message so the upstream will not redeliver it.
    pub fn ack(self) {
        self.reply.ack();
    }

    /// Negatively acknowledges the message so the upstream may redeliver it.
    pub fn nack(self) {
        self.reply.nack();
    }
}

impl fmt::Debug for FeedMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedMessage")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}

/// Callback invoked once per delivered message by [`FeedSubscription::receive`].
#[async_trait]
pub trait FeedHandler: Send + Sync {
    async fn on_message(&self, message: FeedMessage);
}

/// A managed subscription to one topic.
#[async_trait]
pub trait FeedSubscription: Send + Sync {
    fn topic(&self) -> &Topic;

    /// Invokes `handler` for every delivered message until `cancel` fires or an
    /// unrecoverable error occurs. Returns `Ok(())` after cancellation.
    async fn receive(
        &self,
        cancel: CancellationToken,
        handler: Arc<dyn FeedHandler>,
    ) -> Result<(), FeedError>;
}

/// A connected upstream client able to hand out topic subscriptions.
pub trait FeedClient: Send + Sync {
    fn subscription(&self, topic: &Topic) -> Result<Arc<dyn FeedSubscription>, FeedError>;
}

/// Builds the single shared [`FeedClient`] on first use.
#[async_trait]
pub trait FeedConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn FeedClient>, FeedError>;
}

/// Publishing side of the upstream, used to send trigger messages.
#[async_trait]
pub trait FeedPublisher: Send + Sync {
    /// Returns the message id assigned by the upstream.
    async fn publish(&self, topic: &Topic, data: Vec<u8>) -> Result<String, FeedError>;
}
