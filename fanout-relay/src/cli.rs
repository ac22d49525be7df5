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

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use topic_fanout::{ConfigError, SummaryConfig};

/// Multiplexes feed topics read from stdin and relays or summarises them.
///
/// Input lines have the form `<topic>\t<payload>`.
#[derive(Debug, Parser)]
#[command(name = "fanout-relay", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON5 configuration file. A missing file means defaults.
    #[arg(long, global = true, env = "SUMMARY_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON file of the form {"prompt": "..."} overriding the prompt prefix.
    #[arg(long, global = true, env = "SUMMARY_PROMPT_FILE")]
    pub prompt_file: Option<PathBuf>,

    #[arg(long, global = true, env = "SUMMARY_PROMPT")]
    pub prompt: Option<String>,

    #[arg(long, global = true, env = "SUMMARY_MODEL")]
    pub model: Option<String>,

    /// Comma-separated subscription ids; the first two are joined.
    #[arg(long, global = true, env = "SUMMARY_SUBSCRIPTION_IDS", value_delimiter = ',')]
    pub subscription_ids: Option<Vec<String>>,

    /// Used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Join the two configured topics and print one artifact per joined pair.
    ///
    /// The request is first published to every configured trigger topic.
    Summary {
        /// Comma-separated areas named in the trigger request.
        #[arg(long, value_delimiter = ',')]
        areas: Vec<String>,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        long: f64,
    },
    /// Print every payload of one topic as a JSON event.
    Watch {
        #[arg(long)]
        topic: String,
        /// Case-insensitive substring a payload must contain.
        #[arg(long, default_value = "")]
        filter: String,
    },
}

impl Cli {
    /// Configuration file, then prompt file, then command-line and environment.
    pub fn summary_config(&self) -> Result<SummaryConfig, ConfigError> {
        let mut config = SummaryConfig::load(self.config.as_deref())?;
        if let Some(prompt_file) = &self.prompt_file {
            config.apply_prompt_file(prompt_file);
        }
        if let Some(prompt) = &self.prompt {
            config.prompt = prompt.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(ids) = &self.subscription_ids {
            config.subscription_ids = ids.iter().map(|id| id.trim().to_string()).collect();
        }
        config.validate()?;
        Ok(config)
    }
}
