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

use crate::control_plane::client_slot::ClientSlot;
use crate::control_plane::topic_registry::TopicRegistry;
use crate::data_plane::listener::Subscription;
use crate::error::SubscribeError;
use crate::feed::{FeedConnector, Topic};
use crate::observability::events;
use crate::topic_health::TopicHealth;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "multiplexer";

/// Default bound of every listener queue.
pub const DEFAULT_LISTENER_CAPACITY: usize = 32;

/// Construction-time settings of a [`Multiplexer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiplexerOptions {
    /// Bound of each listener queue. Values below one are raised to one.
    pub listener_capacity: usize,
    /// Relaunch a topic's receive loop on the next `subscribe` after it died.
    pub relaunch_dormant_loops: bool,
}

impl Default for MultiplexerOptions {
    fn default() -> Self {
        Self {
            listener_capacity: DEFAULT_LISTENER_CAPACITY,
            relaunch_dormant_loops: false,
        }
    }
}

/// Process-wide fan-out router.
///
/// Construct one at startup and share it by `Arc`. Each topic gets exactly one
/// upstream receive loop, started by the first [`Multiplexer::subscribe`] call
/// for that topic; every message is acknowledged upstream immediately and then
/// offered to all listeners registered at that moment. A listener whose queue is
/// full misses that message; no listener can stall the loop or its peers.
///
/// Receive loops live until [`Multiplexer::shutdown`], even when every listener
/// of the topic has been cancelled.
pub struct Multiplexer {
    name: String,
    client: ClientSlot,
    registry: TopicRegistry,
    shutdown: CancellationToken,
}

impl Multiplexer {
    pub fn new(name: &str, connector: Arc<dyn FeedConnector>, options: MultiplexerOptions) -> Self {
        debug!(
            component = COMPONENT,
            multiplexer = name,
            listener_capacity = options.listener_capacity,
            relaunch_dormant_loops = options.relaunch_dormant_loops,
            "multiplexer created"
        );
        Self {
            name: name.to_string(),
            client: ClientSlot::new(connector),
            registry: TopicRegistry::new(options.listener_capacity, options.relaunch_dormant_loops),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connects the shared upstream client now instead of on first subscribe.
    pub async fn initialize(&self) -> Result<(), SubscribeError> {
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(SubscribeError::ShutDown),
            client = self.client.get_or_connect() => client
                .map(|_| ())
                .map_err(SubscribeError::ClientUnavailable),
        }
    }

    /// Registers a new listener queue on `topic`.
    ///
    /// The first call for a topic opens its upstream subscription and starts its
    /// receive loop. Errors are returned before any queue is created. Call
    /// [`Subscription::cancel`] to release the queue. Surrounding whitespace in
    /// `topic` is ignored.
    pub async fn subscribe(&self, topic: impl Into<Topic>) -> Result<Subscription, SubscribeError> {
        let topic = normalize(topic);
        if topic.is_empty() {
            return Err(SubscribeError::EmptyTopic);
        }
        if self.shutdown.is_cancelled() {
            return Err(SubscribeError::ShutDown);
        }

        let client = tokio::select! {
            _ = self.shutdown.cancelled() => return Err(SubscribeError::ShutDown),
            client = self.client.get_or_connect() => {
                client.map_err(SubscribeError::ClientUnavailable)?
            }
        };

        let fanout = tokio::select! {
            _ = self.shutdown.cancelled() => return Err(SubscribeError::ShutDown),
            fanout = self.registry.fanout_for(&topic, client.as_ref(), &self.shutdown) => fanout?,
        };

        Ok(fanout.register())
    }

    pub async fn topic_health(&self, topic: impl Into<Topic>) -> Option<TopicHealth> {
        let topic = normalize(topic);
        self.registry.get(&topic).await.map(|fanout| fanout.health())
    }

    /// Topics that have a fan-out, in sorted order.
    pub async fn topics(&self) -> Vec<Topic> {
        self.registry.topics().await
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stops every receive loop and waits for them to finish. Later `subscribe`
    /// calls fail with [`SubscribeError::ShutDown`]. Existing listener queues stay
    /// open until cancelled.
    pub async fn shutdown(&self) {
        info!(
            event = events::MULTIPLEXER_SHUTDOWN,
            component = COMPONENT,
            multiplexer = %self.name,
            "shutting down multiplexer"
        );
        self.shutdown.cancel();

        for receive_loop in self.registry.take_receive_loops().await {
            if let Err(err) = receive_loop.await {
                warn!(
                    event = events::MULTIPLEXER_SHUTDOWN,
                    component = COMPONENT,
                    multiplexer = %self.name,
                    err = %err,
                    "receive loop task failed"
                );
            }
        }
    }
}

fn normalize(topic: impl Into<Topic>) -> Topic {
    let topic = topic.into();
    let trimmed = topic.as_str().trim();
    if trimmed.len() == topic.as_str().len() {
        topic
    } else {
        Topic::new(trimmed)
    }
}
