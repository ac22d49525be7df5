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

//! The single upstream receive loop of a topic.

use crate::data_plane::fanout::Fanout;
use crate::feed::{FeedHandler, FeedMessage, FeedSubscription};
use crate::observability::{events, fields};
use crate::topic_health::ReceiveLoopState;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

const COMPONENT: &str = "receive_loop";

/// Feed handler that settles each message and hands its payload to the fan-out.
struct TopicBroadcaster {
    fanout: Arc<Fanout>,
}

#[async_trait]
impl FeedHandler for TopicBroadcaster {
    async fn on_message(&self, message: FeedMessage) {
        let payload = message.payload();
        let msg_id = message.id().to_string();

        // Local delivery is best-effort, so the upstream is settled first.
        message.ack();

        let outcome = self.fanout.broadcast(&payload);
        trace!(
            event = events::BROADCAST_DELIVERED,
            component = COMPONENT,
            topic = %self.fanout.topic(),
            msg_id = %msg_id,
            delivered = outcome.delivered,
            dropped = outcome.dropped,
            payload = %fields::format_payload_preview(&payload),
            "broadcast upstream message"
        );
    }
}

/// Marks the fan-out running and spawns its receive loop.
///
/// The loop ends when `cancel` fires or when the upstream reports an error. An
/// end not caused by cancellation leaves the topic dormant.
pub(crate) fn spawn_receive_loop(
    subscription: Arc<dyn FeedSubscription>,
    fanout: Arc<Fanout>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    fanout.set_loop_state(ReceiveLoopState::Running);

    tokio::spawn(async move {
        let topic = fanout.topic().clone();
        info!(
            event = events::RECEIVE_LOOP_START,
            component = COMPONENT,
            topic = %topic,
            "starting upstream receive loop"
        );

        let handler: Arc<dyn FeedHandler> = Arc::new(TopicBroadcaster {
            fanout: fanout.clone(),
        });
        let result = subscription.receive(cancel.clone(), handler).await;

        if cancel.is_cancelled() {
            fanout.set_loop_state(ReceiveLoopState::Stopped);
            debug!(
                event = events::RECEIVE_LOOP_STOPPED,
                component = COMPONENT,
                topic = %topic,
                "receive loop stopped by cancellation"
            );
            return;
        }

        fanout.set_loop_state(ReceiveLoopState::Dormant);
        match result {
            Err(err) => warn!(
                event = events::RECEIVE_LOOP_TERMINATED,
                component = COMPONENT,
                topic = %topic,
                err = %err,
                "upstream receive loop terminated"
            ),
            Ok(()) => warn!(
                event = events::RECEIVE_LOOP_TERMINATED,
                component = COMPONENT,
                topic = %topic,
                "upstream receive loop returned without cancellation"
            ),
        }
    })
}
