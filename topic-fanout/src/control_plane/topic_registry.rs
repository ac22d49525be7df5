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

//! Topic to fan-out registry.

use crate::data_plane::fanout::Fanout;
use crate::data_plane::receive_loop::spawn_receive_loop;
use crate::error::SubscribeError;
use crate::feed::{FeedClient, FeedSubscription, Topic};
use crate::observability::events;
use crate::topic_health::ReceiveLoopState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "topic_registry";

struct TopicEntry {
    fanout: Arc<Fanout>,
    receive_loop: Option<JoinHandle<()>>,
}

/// Owns every topic's fan-out. Entries are created lazily and never removed.
pub(crate) struct TopicRegistry {
    listener_capacity: usize,
    relaunch_dormant: bool,
    topics: Mutex<HashMap<Topic, TopicEntry>>,
}

impl TopicRegistry {
    pub(crate) fn new(listener_capacity: usize, relaunch_dormant: bool) -> Self {
        Self {
            listener_capacity,
            relaunch_dormant,
            topics: Mutex::new(HashMap::new()),
        }
    }

    fn open_subscription(
        client: &dyn FeedClient,
        topic: &Topic,
    ) -> Result<Arc<dyn FeedSubscription>, SubscribeError> {
        client.subscription(topic).map_err(|source| {
            warn!(
                event = events::TOPIC_SUBSCRIPTION_FAILED,
                component = COMPONENT,
                topic = %topic,
                err = %source,
                "unable to open upstream subscription"
            );
            SubscribeError::SubscriptionUnavailable {
                topic: topic.to_string(),
                source,
            }
        })
    }

    /// Returns the fan-out for `topic`, creating it and launching its receive
    /// loop when absent.
    ///
    /// The existence check, the creation, and the launch happen under one lock
    /// acquisition with no await in between, so concurrent callers for the same
    /// topic start exactly one loop.
    pub(crate) async fn fanout_for(
        &self,
        topic: &Topic,
        client: &dyn FeedClient,
        cancel: &CancellationToken,
    ) -> Result<Arc<Fanout>, SubscribeError> {
        let mut topics = self.topics.lock().await;

        if let Some(entry) = topics.get_mut(topic) {
            if self.relaunch_dormant && entry.fanout.loop_state() == ReceiveLoopState::Dormant {
                let subscription = Self::open_subscription(client, topic)?;
                info!(
                    event = events::RECEIVE_LOOP_RELAUNCH,
                    component = COMPONENT,
                    topic = %topic,
                    "relaunching dormant receive loop"
                );
                entry.receive_loop = Some(spawn_receive_loop(
                    subscription,
                    entry.fanout.clone(),
                    cancel.clone(),
                ));
            }
            return Ok(entry.fanout.clone());
        }

        let subscription = Self::open_subscription(client, topic)?;
        let fanout = Fanout::new(topic.clone(), self.listener_capacity);
        let receive_loop = spawn_receive_loop(subscription, fanout.clone(), cancel.clone());
        debug!(
            event = events::TOPIC_FANOUT_CREATED,
            component = COMPONENT,
            topic = %topic,
            listener_capacity = self.listener_capacity,
            "created topic fan-out"
        );

        topics.insert(
            topic.clone(),
            TopicEntry {
                fanout: fanout.clone(),
                receive_loop: Some(receive_loop),
            },
        );
        Ok(fanout)
    }

    pub(crate) async fn get(&self, topic: &Topic) -> Option<Arc<Fanout>> {
        self.topics
            .lock()
            .await
            .get(topic)
            .map(|entry| entry.fanout.clone())
    }

    pub(crate) async fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.topics.lock().await.keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Takes every receive-loop handle still owned by the registry.
    pub(crate) async fn take_receive_loops(&self) -> Vec<JoinHandle<()>> {
        self.topics
            .lock()
            .await
            .values_mut()
            .filter_map(|entry| entry.receive_loop.take())
            .collect()
    }
}
