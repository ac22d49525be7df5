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

//! Delivery sink contract and a channel-backed implementation.

use crate::error::DeliveryError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Ordered, single-writer consumer of pipeline artifacts.
///
/// A pipeline calls `deliver` strictly in sequence and never concurrently.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, text: String) -> Result<(), DeliveryError>;
}

/// Sink forwarding into a bounded channel drained by one writer task.
///
/// `deliver` waits while the channel is full and fails with
/// [`DeliveryError::Closed`] once the writer has gone away.
#[derive(Clone, Debug)]
pub struct ChannelSink<T> {
    sender: mpsc::Sender<T>,
}

impl<T: Send + 'static> ChannelSink<T> {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<T>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub(crate) async fn send(&self, item: T) -> Result<(), DeliveryError> {
        self.sender
            .send(item)
            .await
            .map_err(|_| DeliveryError::Closed)
    }
}

#[async_trait]
impl DeliverySink for ChannelSink<String> {
    async fn deliver(&self, text: String) -> Result<(), DeliveryError> {
        self.send(text).await
    }
}
