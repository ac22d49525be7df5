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

//! Live-feed relay: forwards one subscription's payloads to a client stream.

use crate::data_plane::listener::Subscription;
use crate::delivery::ChannelSink;
use crate::error::{DeliveryError, PipelineError};
use crate::observability::events;
use crate::observability::fields::format_payload_preview;
use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};
use uuid::Uuid;

const COMPONENT: &str = "feed_relay";

/// One forwarded payload, stamped for the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeedEvent {
    pub id: String,
    /// Unix seconds, UTC.
    pub timestamp: i64,
    pub payload: String,
}

impl FeedEvent {
    pub fn stamp(payload: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            payload,
        }
    }
}

/// Client-side stream of [`FeedEvent`]s.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send_event(&self, event: FeedEvent) -> Result<(), DeliveryError>;
}

#[async_trait]
impl EventSink for ChannelSink<FeedEvent> {
    async fn send_event(&self, event: FeedEvent) -> Result<(), DeliveryError> {
        self.send(event).await
    }
}

pub struct FeedRelay {
    name: String,
    filter: Option<String>,
}

impl FeedRelay {
    /// A blank `filter` forwards every payload.
    pub fn new(name: &str, filter: &str) -> Self {
        let filter = filter.trim();
        Self {
            name: name.to_string(),
            filter: (!filter.is_empty()).then(|| filter.to_lowercase()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive substring match against the trimmed filter.
    pub fn matches(&self, payload: &str) -> bool {
        match &self.filter {
            None => true,
            Some(filter) => payload.to_lowercase().contains(filter.as_str()),
        }
    }

    /// Forwards matching payloads from `subscription` until cancelled, the
    /// queue closes, or `sink` fails. The subscription is released on return.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        subscription: Subscription,
        sink: &dyn EventSink,
    ) -> Result<(), PipelineError> {
        let topic = subscription.topic().clone();
        let (mut receiver, listener) = subscription.into_parts();

        let result = loop {
            let payload = tokio::select! {
                _ = cancel.cancelled() => break Err(PipelineError::Cancelled),
                payload = receiver.recv() => match payload {
                    Some(payload) => payload,
                    None => break Ok(()),
                },
            };

            if !self.matches(&payload) {
                trace!(
                    event = events::RELAY_FILTERED,
                    component = COMPONENT,
                    relay = %self.name,
                    topic = %topic,
                    payload = %format_payload_preview(&payload),
                    "payload filtered out"
                );
                continue;
            }

            let event = FeedEvent::stamp(payload);
            let event_id = event.id.clone();
            if let Err(err) = sink.send_event(event).await {
                error!(
                    event = events::RELAY_STOPPED,
                    component = COMPONENT,
                    relay = %self.name,
                    topic = %topic,
                    err = %err,
                    "client stream failed"
                );
                break Err(PipelineError::Deliver(err));
            }
            trace!(
                event = events::RELAY_FORWARD,
                component = COMPONENT,
                relay = %self.name,
                topic = %topic,
                event_id = %event_id,
                "payload forwarded"
            );
        };

        listener.cancel();
        debug!(
            event = events::RELAY_STOPPED,
            component = COMPONENT,
            relay = %self.name,
            topic = %topic,
            listener_id = %listener.id(),
            "relay stopped"
        );
        result
    }
}
