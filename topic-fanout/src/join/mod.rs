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

//! Dual-source join layer.
//!
//! Turns two listener queues into a stream of generated artifacts. Each side
//! keeps its latest payload; once both sides have produced at least one value,
//! every further update triggers one generation call pairing it with the other
//! side's latest value.
//!
//! ```
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//! use topic_fanout::{ChannelSink, JoinPipeline, PromptContext, PromptEchoGenerator};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let (sink, mut artifacts) = ChannelSink::<String>::new(8);
//! let pipeline = JoinPipeline::new(
//!     "join-doc",
//!     PromptContext::new("Summarise:", "local"),
//!     Arc::new(PromptEchoGenerator),
//!     Arc::new(sink),
//! );
//!
//! let (energy_tx, energy_rx) = mpsc::channel(8);
//! let (traffic_tx, traffic_rx) = mpsc::channel(8);
//! energy_tx.send("grid load 80%".to_string()).await.unwrap();
//! traffic_tx.send("ORR congested".to_string()).await.unwrap();
//!
//! let cancel = CancellationToken::new();
//! let consumer = async {
//!     let first = artifacts.recv().await;
//!     cancel.cancel();
//!     first
//! };
//! let (_, first) = tokio::join!(pipeline.run(cancel.clone(), energy_rx, traffic_rx), consumer);
//! assert_eq!(
//!     first.as_deref(),
//!     Some("Summarise:\n\ngrid load 80%\nORR congested")
//! );
//! # drop((energy_tx, traffic_tx));
//! # });
//! ```

pub mod pipeline;
pub mod session;
pub mod state;
pub mod trigger;
