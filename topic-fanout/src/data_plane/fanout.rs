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

//! Per-topic listener set and the non-blocking broadcast step.

use crate::data_plane::listener::{ListenerHandle, ListenerId, Subscription};
use crate::feed::Topic;
use crate::observability::events;
use crate::topic_health::{ReceiveLoopState, TopicHealth};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Sender};
use tracing::debug;

const COMPONENT: &str = "fanout";

/// Result of one broadcast pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BroadcastOutcome {
    pub(crate) delivered: usize,
    pub(crate) dropped: usize,
    pub(crate) pruned: usize,
}

/// Broadcast state for one topic.
///
/// Listener senders live behind a read/write lock: a broadcast pass holds the
/// read side for the whole pass, registration and cancellation take the write
/// side. No lock is held across an await point.
pub(crate) struct Fanout {
    topic: Topic,
    capacity: usize,
    next_listener_id: AtomicU64,
    listeners: RwLock<HashMap<ListenerId, Sender<String>>>,
    loop_state: Mutex<ReceiveLoopState>,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl Fanout {
    pub(crate) fn new(topic: Topic, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            topic,
            capacity: capacity.max(1),
            next_listener_id: AtomicU64::new(1),
            listeners: RwLock::new(HashMap::new()),
            loop_state: Mutex::new(ReceiveLoopState::Running),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    pub(crate) fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Registers a fresh bounded queue and returns its receiving side.
    pub(crate) fn register(self: &Arc<Self>) -> Subscription {
        let id = ListenerId::new(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.capacity);

        let listener_count = {
            let mut listeners = self
                .listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            listeners.insert(id, sender);
            listeners.len()
        };

        debug!(
            event = events::LISTENER_REGISTERED,
            component = COMPONENT,
            topic = %self.topic,
            listener_id = %id,
            listener_count,
            "registered listener"
        );

        Subscription::new(
            self.topic.clone(),
            receiver,
            ListenerHandle::new(id, self.clone()),
        )
    }

    /// Removes a listener and drops its sender, which closes the queue once the
    /// receiver drains it. Returns `false` when the listener was already gone.
    pub(crate) fn deregister(&self, id: ListenerId) -> bool {
        let removed = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        if removed.is_some() {
            debug!(
                event = events::LISTENER_CANCELLED,
                component = COMPONENT,
                topic = %self.topic,
                listener_id = %id,
                "cancelled listener"
            );
        }
        removed.is_some()
    }

    /// Offers `payload` to every registered listener without waiting.
    ///
    /// A full queue drops the payload for that listener only. Listeners whose
    /// receiver was dropped are pruned after the pass.
    pub(crate) fn broadcast(&self, payload: &str) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        let mut closed = Vec::new();

        {
            let listeners = self
                .listeners
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for (id, sender) in listeners.iter() {
                match sender.try_send(payload.to_string()) {
                    Ok(()) => outcome.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        outcome.dropped += 1;
                        debug!(
                            event = events::BROADCAST_DROP_QUEUE_FULL,
                            component = COMPONENT,
                            topic = %self.topic,
                            listener_id = %id,
                            "listener queue full, dropping payload"
                        );
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut listeners = self
                .listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for id in closed {
                if listeners.remove(&id).is_some() {
                    outcome.pruned += 1;
                    debug!(
                        event = events::LISTENER_PRUNED,
                        component = COMPONENT,
                        topic = %self.topic,
                        listener_id = %id,
                        "pruned listener with dropped receiver"
                    );
                }
            }
        }

        self.delivered
            .fetch_add(outcome.delivered as u64, Ordering::Relaxed);
        self.dropped
            .fetch_add(outcome.dropped as u64, Ordering::Relaxed);
        outcome
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn loop_state(&self) -> ReceiveLoopState {
        *self.loop_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_loop_state(&self, state: ReceiveLoopState) {
        *self.loop_state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub(crate) fn health(&self) -> TopicHealth {
        TopicHealth {
            state: self.loop_state(),
            listeners: self.listener_count(),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}
