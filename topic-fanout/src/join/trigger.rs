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

//! Trigger messages published before a join session subscribes.
//!
//! The producers behind the joined topics start work when they receive a
//! trigger describing the requested area.

use crate::error::{ConfigError, PipelineError};
use crate::feed::{FeedPublisher, Topic};
use crate::observability::events;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const COMPONENT: &str = "join_trigger";

/// What a summary session was asked about; serialized as the trigger payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SummaryRequest {
    pub areas: Vec<String>,
    pub lat: f64,
    pub long: f64,
}

/// One payload sent to every trigger topic.
pub struct SessionTrigger {
    publisher: Arc<dyn FeedPublisher>,
    topics: Vec<Topic>,
    payload: Vec<u8>,
}

impl SessionTrigger {
    pub fn new(
        publisher: Arc<dyn FeedPublisher>,
        topics: Vec<Topic>,
        request: &SummaryRequest,
    ) -> Result<Self, PipelineError> {
        let payload = serde_json::to_vec(request).map_err(|err| {
            PipelineError::Config(ConfigError::Invalid(format!(
                "unable to encode trigger payload: {err}"
            )))
        })?;
        Ok(Self {
            publisher,
            topics,
            payload,
        })
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Publishes to each topic in order. A failed publish is logged and the
    /// remaining topics are still tried. Returns how many succeeded.
    pub async fn publish_all(&self, session: &str) -> usize {
        let mut published = 0;
        for topic in &self.topics {
            match self.publisher.publish(topic, self.payload.clone()).await {
                Ok(msg_id) => {
                    published += 1;
                    info!(
                        event = events::JOIN_TRIGGER_PUBLISHED,
                        component = COMPONENT,
                        session,
                        topic = %topic,
                        msg_id = %msg_id,
                        "published trigger"
                    );
                }
                Err(err) => warn!(
                    event = events::JOIN_TRIGGER_FAILED,
                    component = COMPONENT,
                    session,
                    topic = %topic,
                    err = %err,
                    "unable to publish trigger, continuing"
                ),
            }
        }
        published
    }
}
