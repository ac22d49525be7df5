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

//! Data-plane layer.
//!
//! Owns the per-topic listener sets, the non-blocking broadcast step, and the
//! upstream receive loop that feeds it. Nothing in this layer waits on a
//! listener: a full queue loses the payload for that listener only.
//!
//! ```
//! use std::sync::Arc;
//! use topic_fanout::feed::memory::MemoryFeed;
//! use topic_fanout::{Multiplexer, MultiplexerOptions};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let feed = MemoryFeed::new();
//! let multiplexer = Multiplexer::new(
//!     "data-plane-doc",
//!     Arc::new(feed.clone()),
//!     MultiplexerOptions::default(),
//! );
//!
//! let mut first = multiplexer.subscribe("traffic-update-data-sub").await.unwrap();
//! let mut second = multiplexer.subscribe("traffic-update-data-sub").await.unwrap();
//! feed.publish("traffic-update-data-sub", "congestion on Hosur Road");
//!
//! assert_eq!(first.recv().await.as_deref(), Some("congestion on Hosur Road"));
//! assert_eq!(second.recv().await.as_deref(), Some("congestion on Hosur Road"));
//! first.cancel();
//! second.cancel();
//! # });
//! ```

pub(crate) mod fanout;
pub(crate) mod listener;
pub(crate) mod receive_loop;
