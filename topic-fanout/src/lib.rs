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

//! # topic-fanout
//!
//! `topic-fanout` multiplexes upstream pub/sub subscriptions onto many in-process
//! listeners and joins two topics into a stream of generated artifacts.
//!
//! Typical usage is centered on [`Multiplexer`] for fan-out and [`JoinPipeline`]
//! for the dual-source join. Upstream feeds plug in through the [`feed`] traits;
//! [`feed::memory::MemoryFeed`] is an in-process feed for tests and local runs.
//!
//! ## Fan-out
//!
//! ```
//! use std::sync::Arc;
//! use topic_fanout::feed::memory::MemoryFeed;
//! use topic_fanout::{Multiplexer, MultiplexerOptions};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let feed = MemoryFeed::new();
//! let multiplexer = Multiplexer::new("quick-start", Arc::new(feed.clone()), MultiplexerOptions::default());
//!
//! let mut dashboard = multiplexer.subscribe("traffic-update-data-sub").await.unwrap();
//! let mut summariser = multiplexer.subscribe("traffic-update-data-sub").await.unwrap();
//!
//! feed.publish("traffic-update-data-sub", r#"{"road":"ORR","status":"jam"}"#);
//! assert_eq!(dashboard.recv().await.as_deref(), Some(r#"{"road":"ORR","status":"jam"}"#));
//! assert_eq!(summariser.recv().await.as_deref(), Some(r#"{"road":"ORR","status":"jam"}"#));
//!
//! dashboard.cancel();
//! dashboard.cancel();
//! assert_eq!(feed.receive_calls("traffic-update-data-sub"), 1);
//! multiplexer.shutdown().await;
//! # });
//! ```
//!
//! ## Subscribe contract
//!
//! Empty topics are rejected before anything is created, and a shut-down
//! multiplexer accepts no new listeners.
//!
//! ```
//! use std::sync::Arc;
//! use topic_fanout::feed::memory::MemoryFeed;
//! use topic_fanout::{Multiplexer, MultiplexerOptions, SubscribeError};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let multiplexer = Multiplexer::new("contract", Arc::new(MemoryFeed::new()), MultiplexerOptions::default());
//!
//! assert!(matches!(multiplexer.subscribe("  ").await, Err(SubscribeError::EmptyTopic)));
//! multiplexer.shutdown().await;
//! assert!(matches!(multiplexer.subscribe("energy").await, Err(SubscribeError::ShutDown)));
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Feed: upstream client, subscription, and acknowledgement traits
//! - Control plane: shared client slot and per-topic registry
//! - Data plane: per-topic fan-out, listener queues, and receive loops
//! - Join: latest-value state, pipeline loop, and session wiring
//! - Relay: filtered single-topic forwarding with stamped events
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not unconditionally initialize a global
//! subscriber. Binaries and tests are responsible for one-time
//! `tracing_subscriber` initialization at process boundaries.

pub mod config;
pub use config::SummaryConfig;

mod control_plane;
mod data_plane;
pub use data_plane::listener::{ListenerHandle, ListenerId, Subscription};

pub mod delivery;
pub use delivery::{ChannelSink, DeliverySink};

mod error;
pub use error::{
    ConfigError, DeliveryError, FeedError, GenerateError, PipelineError, SubscribeError,
};

pub mod feed;
pub use feed::{FeedPublisher, Topic};

pub mod generation;
pub use generation::{compose_prompt, Generator, PromptContext, PromptEchoGenerator};

pub mod join;
pub use join::pipeline::JoinPipeline;
pub use join::session::JoinSession;
pub use join::state::{JoinPhase, JoinSide, JoinState, JoinedPair};
pub use join::trigger::{SessionTrigger, SummaryRequest};

mod multiplexer;
pub use multiplexer::{Multiplexer, MultiplexerOptions, DEFAULT_LISTENER_CAPACITY};

#[doc(hidden)]
pub mod observability;

pub mod relay;
pub use relay::{EventSink, FeedEvent, FeedRelay};

mod topic_health;
pub use topic_health::{ReceiveLoopState, TopicHealth};

pub mod validation;
pub use validation::{JsonPayloadValidator, NonEmptyPayloadValidator, PayloadValidator};
