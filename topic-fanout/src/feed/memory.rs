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

//! In-process feed backend.
//!
//! `MemoryFeed` keeps one unbounded queue per topic, retains messages published
//! before anyone receives, and redelivers negatively acknowledged messages. It
//! backs the relay binary and the test suites.

use crate::error::FeedError;
use crate::feed::{
    AckReply, FeedClient, FeedConnector, FeedHandler, FeedMessage, FeedPublisher,
    FeedSubscription, Topic,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

const COMPONENT: &str = "memory_feed";

enum Delivery {
    Message { id: String, data: Vec<u8> },
    Terminate(String),
}

struct TopicQueue {
    sender: UnboundedSender<Delivery>,
    receiver: tokio::sync::Mutex<UnboundedReceiver<Delivery>>,
    receive_calls: AtomicUsize,
}

impl TopicQueue {
    fn new() -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            receive_calls: AtomicUsize::new(0),
        }
    }
}

#[derive(Default)]
struct MemoryFeedInner {
    topics: Mutex<HashMap<Topic, Arc<TopicQueue>>>,
    next_message_id: AtomicU64,
    acked: AtomicU64,
    nacked: AtomicU64,
    connect_failure: Mutex<Option<String>>,
    publish_failures: Mutex<HashMap<Topic, String>>,
}

impl MemoryFeedInner {
    fn topic_queue(&self, topic: &Topic) -> Arc<TopicQueue> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        topics
            .entry(topic.clone())
            .or_insert_with(|| Arc::new(TopicQueue::new()))
            .clone()
    }
}

/// In-process pub/sub implementing the upstream feed contract.
#[derive(Clone, Default)]
pub struct MemoryFeed {
    inner: Arc<MemoryFeedInner>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `data` on `topic` and returns the assigned message id.
    pub fn publish(&self, topic: impl Into<Topic>, data: impl Into<Vec<u8>>) -> String {
        let topic = topic.into();
        let id = format!(
            "{}-{}",
            topic,
            self.inner.next_message_id.fetch_add(1, Ordering::SeqCst)
        );
        let queue = self.inner.topic_queue(&topic);
        // The queue owns its receiver, so the send side cannot observe a closed channel.
        let _ = queue.sender.send(Delivery::Message {
            id: id.clone(),
            data: data.into(),
        });
        trace!(component = COMPONENT, topic = %topic, msg_id = %id, "published");
        id
    }

    /// Makes the active receive call for `topic` fail with `reason` once it reaches
    /// this point in the queue.
    pub fn terminate(&self, topic: impl Into<Topic>, reason: &str) {
        let topic = topic.into();
        let queue = self.inner.topic_queue(&topic);
        let _ = queue.sender.send(Delivery::Terminate(reason.to_string()));
    }

    /// Makes subsequent `connect` calls fail, or succeed again with `None`.
    pub fn set_connect_failure(&self, reason: Option<&str>) {
        *self
            .inner
            .connect_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = reason.map(str::to_string);
    }

    /// Makes [`FeedPublisher::publish`] on `topic` fail with `reason`, or succeed
    /// again with `None`.
    pub fn set_publish_failure(&self, topic: impl Into<Topic>, reason: Option<&str>) {
        let topic = topic.into();
        let mut failures = self
            .inner
            .publish_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match reason {
            Some(reason) => failures.insert(topic, reason.to_string()),
            None => failures.remove(&topic),
        };
    }

    pub fn acked(&self) -> u64 {
        self.inner.acked.load(Ordering::SeqCst)
    }

    pub fn nacked(&self) -> u64 {
        self.inner.nacked.load(Ordering::SeqCst)
    }

    /// Number of `receive` invocations observed for `topic`.
    pub fn receive_calls(&self, topic: impl Into<Topic>) -> usize {
        let topic = topic.into();
        let topics = self
            .inner
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        topics
            .get(&topic)
            .map(|queue| queue.receive_calls.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

#[async_trait]
impl FeedConnector for MemoryFeed {
    async fn connect(&self) -> Result<Arc<dyn FeedClient>, FeedError> {
        let failure = self
            .inner
            .connect_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match failure {
            Some(reason) => Err(FeedError::Connect(reason)),
            None => Ok(Arc::new(self.clone())),
        }
    }
}

#[async_trait]
impl FeedPublisher for MemoryFeed {
    async fn publish(&self, topic: &Topic, data: Vec<u8>) -> Result<String, FeedError> {
        let failure = self
            .inner
            .publish_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .cloned();
        match failure {
            Some(reason) => Err(FeedError::Publish(reason)),
            None => Ok(MemoryFeed::publish(self, topic, data)),
        }
    }
}

impl FeedClient for MemoryFeed {
    fn subscription(&self, topic: &Topic) -> Result<Arc<dyn FeedSubscription>, FeedError> {
        if topic.is_empty() {
            return Err(FeedError::Subscription(
                "subscription id must not be empty".to_string(),
            ));
        }
        Ok(Arc::new(MemorySubscription {
            topic: topic.clone(),
            queue: self.inner.topic_queue(topic),
            inner: self.inner.clone(),
        }))
    }
}

struct MemorySubscription {
    topic: Topic,
    queue: Arc<TopicQueue>,
    inner: Arc<MemoryFeedInner>,
}

#[async_trait]
impl FeedSubscription for MemorySubscription {
    fn topic(&self) -> &Topic {
        &self.topic
    }

    async fn receive(
        &self,
        cancel: CancellationToken,
        handler: Arc<dyn FeedHandler>,
    ) -> Result<(), FeedError> {
        self.queue.receive_calls.fetch_add(1, Ordering::SeqCst);

        let mut receiver = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            receiver = self.queue.receiver.lock() => receiver,
        };

        loop {
            let delivery = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                delivery = receiver.recv() => delivery,
            };

            match delivery {
                Some(Delivery::Message { id, data }) => {
                    let reply = MemoryAckReply {
                        inner: self.inner.clone(),
                        sender: self.queue.sender.clone(),
                        id: id.clone(),
                        data: data.clone(),
                        settled: AtomicBool::new(false),
                    };
                    handler
                        .on_message(FeedMessage::new(id, data, Box::new(reply)))
                        .await;
                }
                Some(Delivery::Terminate(reason)) => {
                    debug!(
                        component = COMPONENT,
                        topic = %self.topic,
                        reason = %reason,
                        "terminating receive"
                    );
                    return Err(FeedError::Receive(reason));
                }
                None => {
                    return Err(FeedError::Receive(format!(
                        "queue for {} closed",
                        self.topic
                    )))
                }
            }
        }
    }
}

struct MemoryAckReply {
    inner: Arc<MemoryFeedInner>,
    sender: UnboundedSender<Delivery>,
    id: String,
    data: Vec<u8>,
    settled: AtomicBool,
}

impl AckReply for MemoryAckReply {
    fn ack(&self) {
        if !self.settled.swap(true, Ordering::SeqCst) {
            self.inner.acked.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn nack(&self) {
        if !self.settled.swap(true, Ordering::SeqCst) {
            self.inner.nacked.fetch_add(1, Ordering::SeqCst);
            let _ = self.sender.send(Delivery::Message {
                id: self.id.clone(),
                data: self.data.clone(),
            });
        }
    }
}
