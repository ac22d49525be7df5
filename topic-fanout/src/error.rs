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

//! Error types surfaced by the multiplexer, the join pipeline, and their collaborators.

use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

/// Failure reported by an upstream feed adapter.
#[derive(Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The shared upstream client could not be constructed.
    Connect(String),
    /// A subscription handle for a topic could not be obtained.
    Subscription(String),
    /// The receive primitive terminated with an unrecoverable error.
    Receive(String),
    /// A message could not be published.
    Publish(String),
}

impl Debug for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Connect(reason) => write!(f, "Connect({reason:?})"),
            FeedError::Subscription(reason) => write!(f, "Subscription({reason:?})"),
            FeedError::Receive(reason) => write!(f, "Receive({reason:?})"),
            FeedError::Publish(reason) => write!(f, "Publish({reason:?})"),
        }
    }
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Connect(reason) => write!(f, "unable to connect upstream client: {reason}"),
            FeedError::Subscription(reason) => {
                write!(f, "unable to open upstream subscription: {reason}")
            }
            FeedError::Receive(reason) => write!(f, "upstream receive failed: {reason}"),
            FeedError::Publish(reason) => write!(f, "upstream publish failed: {reason}"),
        }
    }
}

impl Error for FeedError {}

/// Failure returned synchronously from [`crate::Multiplexer::subscribe`].
///
/// No listener queue exists when one of these is returned.
pub enum SubscribeError {
    EmptyTopic,
    ClientUnavailable(FeedError),
    SubscriptionUnavailable { topic: String, source: FeedError },
    ShutDown,
}

impl Debug for SubscribeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SubscribeError::EmptyTopic => write!(f, "EmptyTopic"),
            SubscribeError::ClientUnavailable(err) => write!(f, "ClientUnavailable({err:?})"),
            SubscribeError::SubscriptionUnavailable { topic, source } => {
                write!(f, "SubscriptionUnavailable({topic:?}, {source:?})")
            }
            SubscribeError::ShutDown => write!(f, "ShutDown"),
        }
    }
}

impl Display for SubscribeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SubscribeError::EmptyTopic => write!(f, "topic identifier must not be empty"),
            SubscribeError::ClientUnavailable(err) => {
                write!(f, "shared upstream client unavailable: {err}")
            }
            SubscribeError::SubscriptionUnavailable { topic, source } => {
                write!(f, "unable to subscribe to topic {topic}: {source}")
            }
            SubscribeError::ShutDown => write!(f, "multiplexer has been shut down"),
        }
    }
}

impl Error for SubscribeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SubscribeError::ClientUnavailable(err) => Some(err),
            SubscribeError::SubscriptionUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure returned by a [`crate::Generator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateError {
    reason: String,
}

impl GenerateError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Display for GenerateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "generation failed: {}", self.reason)
    }
}

impl Error for GenerateError {}

/// Failure returned by a delivery sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The receiving side of the sink has gone away.
    Closed,
    Rejected(String),
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Closed => write!(f, "delivery sink closed"),
            DeliveryError::Rejected(reason) => write!(f, "delivery rejected: {reason}"),
        }
    }
}

impl Error for DeliveryError {}

/// Terminal outcome of a join pipeline or feed relay run.
#[derive(Debug)]
pub enum PipelineError {
    Generate(GenerateError),
    Deliver(DeliveryError),
    Subscribe(SubscribeError),
    Config(ConfigError),
    Cancelled,
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Generate(err) => write!(f, "{err}"),
            PipelineError::Deliver(err) => write!(f, "{err}"),
            PipelineError::Subscribe(err) => write!(f, "{err}"),
            PipelineError::Config(err) => write!(f, "{err}"),
            PipelineError::Cancelled => write!(f, "pipeline cancelled"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Generate(err) => Some(err),
            PipelineError::Deliver(err) => Some(err),
            PipelineError::Subscribe(err) => Some(err),
            PipelineError::Config(err) => Some(err),
            PipelineError::Cancelled => None,
        }
    }
}

/// Invalid or unreadable configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Read(String),
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(reason) => write!(f, "unable to read configuration: {reason}"),
            ConfigError::Parse(reason) => write!(f, "unable to parse configuration: {reason}"),
            ConfigError::Invalid(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl Error for ConfigError {}
