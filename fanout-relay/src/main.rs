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

//! fanout-relay: runs the topic multiplexer over an in-process feed fed from stdin.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use topic_fanout::feed::memory::MemoryFeed;
use topic_fanout::{
    ChannelSink, FeedEvent, FeedRelay, JoinPipeline, JoinSession, Multiplexer, PipelineError,
    PromptEchoGenerator, SessionTrigger, SummaryConfig, SummaryRequest,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const COMPONENT: &str = "fanout_relay";

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.summary_config().context("loading configuration")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building runtime")?;
    let result = runtime.block_on(run(cli.command, config));
    // A pending stdin read cannot be cancelled; do not wait for it.
    runtime.shutdown_background();
    result
}

async fn run(command: Command, config: SummaryConfig) -> Result<()> {
    let feed = MemoryFeed::new();
    let multiplexer = Arc::new(Multiplexer::new(
        "fanout-relay",
        Arc::new(feed.clone()),
        config.multiplexer_options(),
    ));
    multiplexer.initialize().await?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    let publisher = tokio::spawn(publish_stdin(feed.clone(), cancel.clone()));

    let outcome = match command {
        Command::Summary { areas, lat, long } => {
            let request = SummaryRequest { areas, lat, long };
            match SessionTrigger::new(Arc::new(feed), config.trigger_topics(), &request) {
                Ok(trigger) => summarise(&multiplexer, &config, trigger, cancel.clone()).await,
                Err(err) => Err(err),
            }
        }
        Command::Watch { topic, filter } => {
            watch(&multiplexer, &topic, &filter, config.listener_capacity, cancel.clone()).await
        }
    };

    cancel.cancel();
    publisher.abort();
    multiplexer.shutdown().await;

    match outcome {
        Ok(()) | Err(PipelineError::Cancelled) => Ok(()),
        Err(err) => {
            error!(component = COMPONENT, err = %err, "relay stopped with error");
            Err(err.into())
        }
    }
}

async fn summarise(
    multiplexer: &Arc<Multiplexer>,
    config: &SummaryConfig,
    trigger: SessionTrigger,
    cancel: CancellationToken,
) -> Result<(), PipelineError> {
    let session = JoinSession::from_config(multiplexer.clone(), config)?.with_trigger(trigger);
    let (topic_a, topic_b) = session.topics();
    info!(
        component = COMPONENT,
        topic_a = %topic_a,
        topic_b = %topic_b,
        model = %config.model,
        "joining topics"
    );

    let (sink, mut artifacts) = ChannelSink::<String>::new(config.listener_capacity);
    let writer: JoinHandle<()> = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(artifact) = artifacts.recv().await {
            if let Err(err) = write_line(&mut stdout, &artifact).await {
                warn!(component = COMPONENT, err = %err, "stdout closed");
                break;
            }
        }
    });

    let pipeline = JoinPipeline::new(
        "summary",
        config.prompt_context(),
        Arc::new(PromptEchoGenerator),
        Arc::new(sink),
    );
    let result = session.run(&pipeline, cancel).await;
    drop(pipeline);
    let _ = writer.await;
    result
}

async fn watch(
    multiplexer: &Multiplexer,
    topic: &str,
    filter: &str,
    capacity: usize,
    cancel: CancellationToken,
) -> Result<(), PipelineError> {
    let subscription = multiplexer
        .subscribe(topic)
        .await
        .map_err(PipelineError::Subscribe)?;
    info!(component = COMPONENT, topic, filter, "watching topic");

    let (sink, mut events) = ChannelSink::<FeedEvent>::new(capacity);
    let writer: JoinHandle<()> = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(event) = events.recv().await {
            let line = match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(err) => {
                    warn!(component = COMPONENT, err = %err, "unable to encode event");
                    continue;
                }
            };
            if let Err(err) = write_line(&mut stdout, &line).await {
                warn!(component = COMPONENT, err = %err, "stdout closed");
                break;
            }
        }
    });

    let relay = FeedRelay::new(topic, filter);
    let result = relay.run(cancel, subscription, &sink).await;
    drop(sink);
    let _ = writer.await;
    result
}

async fn write_line(stdout: &mut tokio::io::Stdout, line: &str) -> std::io::Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(component = COMPONENT, "interrupt received, stopping"),
        Err(err) => warn!(component = COMPONENT, err = %err, "unable to listen for interrupt"),
    }
    cancel.cancel();
}

/// Publishes `<topic>\t<payload>` lines from stdin until EOF or cancellation.
async fn publish_stdin(feed: MemoryFeed, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => return,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => match line.split_once('\t') {
                Some((topic, payload)) if !topic.trim().is_empty() => {
                    feed.publish(topic.trim(), payload);
                }
                _ => warn!(component = COMPONENT, "ignoring line without <topic>\\t<payload>"),
            },
            Ok(None) => {
                info!(component = COMPONENT, "stdin closed, no further input");
                return;
            }
            Err(err) => {
                warn!(component = COMPONENT, err = %err, "stdin read failed");
                return;
            }
        }
    }
}
