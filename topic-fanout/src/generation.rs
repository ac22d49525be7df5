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

//! Generation step contract.
//!
//! The join pipeline treats generation as an opaque, possibly slow, possibly
//! failing call: two payloads in, one text artifact out.

use crate::error::GenerateError;
use async_trait::async_trait;

pub const DEFAULT_PROMPT: &str = "Summarise the following data in one sentence:";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Fixed context passed with every generation request of a pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptContext {
    pub prefix: String,
    pub model: String,
}

impl PromptContext {
    pub fn new(prefix: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            model: model.into(),
        }
    }

    /// Builds the full request text for one joined pair.
    pub fn compose(&self, payload_a: &str, payload_b: &str) -> String {
        compose_prompt(&self.prefix, payload_a, payload_b)
    }
}

impl Default for PromptContext {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT, DEFAULT_MODEL)
    }
}

/// Prompt layout: the prefix, a blank line, then one payload per line.
pub fn compose_prompt(prefix: &str, payload_a: &str, payload_b: &str) -> String {
    format!("{prefix}\n\n{payload_a}\n{payload_b}")
}

/// Transformation invoked once per joined pair.
///
/// Implementations should honor future cancellation: the pipeline drops the
/// returned future when its run is cancelled.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        context: &PromptContext,
        payload_a: &str,
        payload_b: &str,
    ) -> Result<String, GenerateError>;
}

/// Local generator returning the composed prompt unchanged.
///
/// Useful for dry runs where no transformation service is reachable.
#[derive(Clone, Copy, Debug, Default)]
pub struct PromptEchoGenerator;

#[async_trait]
impl Generator for PromptEchoGenerator {
    async fn generate(
        &self,
        context: &PromptContext,
        payload_a: &str,
        payload_b: &str,
    ) -> Result<String, GenerateError> {
        Ok(context.compose(payload_a, payload_b))
    }
}
