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

//! Per-topic health report.

/// Lifecycle of a topic's single upstream receive loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveLoopState {
    /// The loop is receiving from the upstream feed.
    Running,
    /// The loop ended with an error unrelated to cancellation. The topic stays
    /// registered but receives nothing further unless relaunched.
    Dormant,
    /// The loop ended because the multiplexer was shut down.
    Stopped,
}

/// Snapshot of one topic's fan-out state.
///
/// `delivered` and `dropped` count per-listener enqueue outcomes, so a single
/// upstream message broadcast to three listeners contributes three.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicHealth {
    pub state: ReceiveLoopState,
    pub listeners: usize,
    pub delivered: u64,
    pub dropped: u64,
}

impl TopicHealth {
    pub fn is_receiving(&self) -> bool {
        self.state == ReceiveLoopState::Running
    }
}
