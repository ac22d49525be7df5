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

//! Control-plane layer.
//!
//! Owns the lazily-connected shared upstream client and the topic registry.
//! This layer guarantees one receive loop per topic: the check for an
//! existing fan-out and the launch of a new receive loop are one atomic step.
//!
//! ```
//! use std::sync::Arc;
//! use topic_fanout::feed::memory::MemoryFeed;
//! use topic_fanout::{Multiplexer, MultiplexerOptions};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let feed = MemoryFeed::new();
//! let multiplexer = Multiplexer::new(
//!     "control-plane-doc",
//!     Arc::new(feed.clone()),
//!     MultiplexerOptions::default(),
//! );
//!
//! let first = multiplexer.subscribe("energy-management-data-sub").await.unwrap();
//! let second = multiplexer.subscribe("energy-management-data-sub").await.unwrap();
//! tokio::task::yield_now().await;
//!
//! // Two listeners, one upstream receive loop.
//! let health = multiplexer
//!     .topic_health("energy-management-data-sub")
//!     .await
//!     .unwrap();
//! assert_eq!(health.listeners, 2);
//! first.cancel();
//! second.cancel();
//! # });
//! ```

pub(crate) mod client_slot;
pub(crate) mod topic_registry;
