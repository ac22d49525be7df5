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

//! Latest-value state shared by the two sides of a join.

use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

/// Which input of the join an update came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinSide {
    A,
    B,
}

impl Display for JoinSide {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JoinSide::A => f.write_str("a"),
            JoinSide::B => f.write_str("b"),
        }
    }
}

/// How far a join has progressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinPhase {
    /// Neither side has produced a value.
    Idle,
    /// Only side A has produced a value.
    PartialA,
    /// Only side B has produced a value.
    PartialB,
    /// Both sides have produced a value; every further update emits.
    Ready,
}

/// Copies of both latest values taken at the moment an update made the join ready.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedPair {
    pub a: String,
    pub b: String,
}

#[derive(Default)]
struct Latest {
    a: Option<String>,
    b: Option<String>,
}

impl Latest {
    fn phase(&self) -> JoinPhase {
        match (&self.a, &self.b) {
            (None, None) => JoinPhase::Idle,
            (Some(_), None) => JoinPhase::PartialA,
            (None, Some(_)) => JoinPhase::PartialB,
            (Some(_), Some(_)) => JoinPhase::Ready,
        }
    }
}

/// `latest_a` / `latest_b` behind a single lock.
///
/// Values are never cleared after an emission: once both sides are populated,
/// each update pairs with the other side's most recent value, even if that value
/// was already used.
#[derive(Default)]
pub struct JoinState {
    latest: Mutex<Latest>,
}

impl JoinState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `payload` as the latest value of `side` and, when both sides are
    /// populated, returns copies of both values.
    ///
    /// Store, check, and copy happen in one critical section; the caller runs
    /// the generation step after the lock is released.
    pub fn record(&self, side: JoinSide, payload: String) -> Option<JoinedPair> {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        match side {
            JoinSide::A => latest.a = Some(payload),
            JoinSide::B => latest.b = Some(payload),
        }

        match (&latest.a, &latest.b) {
            (Some(a), Some(b)) => Some(JoinedPair {
                a: a.clone(),
                b: b.clone(),
            }),
            _ => None,
        }
    }

    /// Forgets both values. Used when a pipeline starts a new run.
    pub fn reset(&self) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Latest::default();
    }

    pub fn phase(&self) -> JoinPhase {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .phase()
    }
}
