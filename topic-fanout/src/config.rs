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

//! Summary-service configuration.
//!
//! Values come from an optional JSON5 file and an optional prompt file; the
//! binary layers command-line and environment overrides on top.

use crate::error::ConfigError;
use crate::feed::Topic;
use crate::generation::{PromptContext, DEFAULT_MODEL, DEFAULT_PROMPT};
use crate::multiplexer::{MultiplexerOptions, DEFAULT_LISTENER_CAPACITY};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

const COMPONENT: &str = "config";

pub const DEFAULT_SUBSCRIPTION_IDS: [&str; 2] =
    ["energy-management-data-sub", "traffic-update-data-sub"];

pub const DEFAULT_TRIGGER_TOPICS: [&str; 2] =
    ["trigger-traffic-update-agent", "trigger-energy-management-agent"];

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SummaryConfig {
    pub prompt: String,
    pub model: String,
    /// The first two ids are joined as sources A and B.
    pub subscription_ids: Vec<String>,
    /// Topics that receive the session trigger before subscribing.
    pub trigger_topics: Vec<String>,
    pub listener_capacity: usize,
    pub relaunch_dormant_loops: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            subscription_ids: DEFAULT_SUBSCRIPTION_IDS
                .iter()
                .map(|id| id.to_string())
                .collect(),
            trigger_topics: DEFAULT_TRIGGER_TOPICS
                .iter()
                .map(|topic| topic.to_string())
                .collect(),
            listener_capacity: DEFAULT_LISTENER_CAPACITY,
            relaunch_dormant_loops: false,
        }
    }
}

#[derive(Deserialize)]
struct PromptFile {
    prompt: Option<String>,
}

impl SummaryConfig {
    /// Reads a JSON5 configuration file. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    component = COMPONENT,
                    path = %path.display(),
                    "configuration file not found, using defaults"
                );
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::Read(format!("{}: {err}", path.display()))),
        };

        Self::from_json5(&data)
    }

    pub fn from_json5(data: &str) -> Result<Self, ConfigError> {
        let config: Self =
            json5::from_str(data).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides `prompt` from a `{"prompt": "..."}` file.
    ///
    /// Unreadable or malformed files and empty prompts leave the current prompt
    /// in place.
    pub fn apply_prompt_file(&mut self, path: &Path) {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => {
                warn!(
                    component = COMPONENT,
                    path = %path.display(),
                    err = %err,
                    "unable to read prompt file, keeping configured prompt"
                );
                return;
            }
        };

        match serde_json::from_str::<PromptFile>(&data) {
            Ok(PromptFile {
                prompt: Some(prompt),
            }) if !prompt.trim().is_empty() => {
                debug!(
                    component = COMPONENT,
                    path = %path.display(),
                    "prompt loaded from file"
                );
                self.prompt = prompt;
            }
            Ok(_) => {
                warn!(
                    component = COMPONENT,
                    path = %path.display(),
                    "prompt file has no prompt, keeping configured prompt"
                );
            }
            Err(err) => {
                warn!(
                    component = COMPONENT,
                    path = %path.display(),
                    err = %err,
                    "unable to parse prompt file, keeping configured prompt"
                );
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listener_capacity == 0 {
            return Err(ConfigError::Invalid(
                "listener_capacity must be at least 1".to_string(),
            ));
        }
        if let Some(position) = self.subscription_ids.iter().position(|id| id.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "subscription_ids[{position}] is empty"
            )));
        }
        if let Some(position) = self.trigger_topics.iter().position(|topic| topic.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "trigger_topics[{position}] is empty"
            )));
        }
        Ok(())
    }

    /// The first two subscription ids as `(topic_a, topic_b)`.
    pub fn join_topics(&self) -> Result<(Topic, Topic), ConfigError> {
        self.validate()?;
        match self.subscription_ids.as_slice() {
            [a, b, ..] => Ok((Topic::new(a.trim()), Topic::new(b.trim()))),
            ids => Err(ConfigError::Invalid(format!(
                "two subscription ids are required, {} configured",
                ids.len()
            ))),
        }
    }

    pub fn trigger_topics(&self) -> Vec<Topic> {
        self.trigger_topics
            .iter()
            .map(|topic| Topic::new(topic.trim()))
            .collect()
    }

    pub fn multiplexer_options(&self) -> MultiplexerOptions {
        MultiplexerOptions {
            listener_capacity: self.listener_capacity,
            relaunch_dormant_loops: self.relaunch_dormant_loops,
        }
    }

    pub fn prompt_context(&self) -> PromptContext {
        PromptContext::new(self.prompt.clone(), self.model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::SummaryConfig;
    use crate::error::ConfigError;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "topic-fanout-{}-{name}",
            uuid::Uuid::new_v4()
        ));
        fs::write(&path, contents).expect("write scratch file");
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("topic-fanout-does-not-exist.json5");
        let config = SummaryConfig::load(Some(&path)).expect("defaults");

        assert_eq!(config, SummaryConfig::default());
        assert_eq!(config.listener_capacity, 32);
        assert_eq!(config.model, "gemini-2.5-flash");
    }

    #[test]
    fn json5_file_overrides_selected_keys() {
        let path = scratch_file(
            "config.json5",
            r#"{
                // only the model and topics change
                model: "local-echo",
                subscription_ids: ["grid", "roads"],
            }"#,
        );

        let config = SummaryConfig::load(Some(&path)).expect("config");
        let (a, b) = config.join_topics().expect("two topics");

        assert_eq!(config.model, "local-echo");
        assert_eq!(config.prompt, SummaryConfig::default().prompt);
        assert_eq!((a.as_str(), b.as_str()), ("grid", "roads"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = SummaryConfig::from_json5("{ listener_capacity: 0 }").err();

        assert!(matches!(err, Some(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = SummaryConfig::from_json5("{ model: ").err();

        assert!(matches!(err, Some(ConfigError::Parse(_))));
    }

    #[test]
    fn prompt_file_overrides_only_when_valid() {
        let mut config = SummaryConfig::default();

        let good = scratch_file("prompt.json", r#"{"prompt": "Describe the city:"}"#);
        config.apply_prompt_file(&good);
        assert_eq!(config.prompt, "Describe the city:");

        let broken = scratch_file("broken.json", "{\"prompt\":");
        config.apply_prompt_file(&broken);
        let empty = scratch_file("empty.json", r#"{"prompt": "  "}"#);
        config.apply_prompt_file(&empty);
        assert_eq!(config.prompt, "Describe the city:");

        for path in [good, broken, empty] {
            let _ = fs::remove_file(path);
        }
    }

    #[test]
    fn trigger_topics_default_and_override() {
        let defaults = SummaryConfig::default().trigger_topics();
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults[0].as_str(), "trigger-traffic-update-agent");

        let config = SummaryConfig::from_json5("{ trigger_topics: [] }").expect("config");
        assert!(config.trigger_topics().is_empty());

        let err = SummaryConfig::from_json5(r#"{ trigger_topics: ["ok", " "] }"#).err();
        assert!(matches!(err, Some(ConfigError::Invalid(_))));
    }

    #[test]
    fn single_topic_cannot_be_joined() {
        let config = SummaryConfig {
            subscription_ids: vec!["grid".to_string()],
            ..Default::default()
        };

        assert!(matches!(
            config.join_topics(),
            Err(ConfigError::Invalid(_))
        ));
    }
}
