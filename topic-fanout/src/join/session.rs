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

//! Join session: subscribes two topics, joins them, and releases both listeners.

use crate::config::SummaryConfig;
use crate::data_plane::listener::Subscription;
use crate::error::PipelineError;
use crate::feed::Topic;
use crate::join::pipeline::JoinPipeline;
use crate::join::trigger::SessionTrigger;
use crate::multiplexer::Multiplexer;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const COMPONENT: &str = "join_session";

/// Binds a [`JoinPipeline`] to two topics of a shared [`Multiplexer`].
pub struct JoinSession {
    multiplexer: Arc<Multiplexer>,
    topic_a: Topic,
    topic_b: Topic,
    trigger: Option<SessionTrigger>,
}

impl JoinSession {
    pub fn new(
        multiplexer: Arc<Multiplexer>,
        topic_a: impl Into<Topic>,
        topic_b: impl Into<Topic>,
    ) -> Self {
        Self {
            multiplexer,
            topic_a: topic_a.into(),
            topic_b: topic_b.into(),
            trigger: None,
        }
    }

    /// Publishes `trigger` at the start of every run, before subscribing.
    pub fn with_trigger(mut self, trigger: SessionTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Uses the first two configured subscription ids as sides A and B.
    pub fn from_config(
        multiplexer: Arc<Multiplexer>,
        config: &SummaryConfig,
    ) -> Result<Self, PipelineError> {
        let (topic_a, topic_b) = config.join_topics().map_err(PipelineError::Config)?;
        Ok(Self::new(multiplexer, topic_a, topic_b))
    }

    pub fn topics(&self) -> (&Topic, &Topic) {
        (&self.topic_a, &self.topic_b)
    }

    /// Publishes the trigger, subscribes both topics, and runs `pipeline` over
    /// them.
    ///
    /// Both listeners are cancelled on every exit path, including a failed or
    /// cancelled second subscription. `cancel` is honored while subscribing.
    pub async fn run(
        &self,
        pipeline: &JoinPipeline,
        cancel: CancellationToken,
    ) -> Result<(), PipelineError> {
        if let Some(trigger) = &self.trigger {
            tokio::select! {
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                _ = trigger.publish_all(pipeline.name()) => {}
            }
        }

        let source_a = self.subscribe(&self.topic_a, &cancel).await?;
        let source_b = match self.subscribe(&self.topic_b, &cancel).await {
            Ok(subscription) => subscription,
            Err(err) => {
                source_a.cancel();
                return Err(err);
            }
        };

        debug!(
            component = COMPONENT,
            pipeline = pipeline.name(),
            topic_a = %self.topic_a,
            topic_b = %self.topic_b,
            "join session subscribed"
        );

        let (receiver_a, listener_a) = source_a.into_parts();
        let (receiver_b, listener_b) = source_b.into_parts();
        let result = pipeline.run(cancel, receiver_a, receiver_b).await;

        listener_a.cancel();
        listener_b.cancel();
        result
    }

    async fn subscribe(
        &self,
        topic: &Topic,
        cancel: &CancellationToken,
    ) -> Result<Subscription, PipelineError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            subscription = self.multiplexer.subscribe(topic) => {
                subscription.map_err(PipelineError::Subscribe)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::JoinSession;
    use crate::config::SummaryConfig;
    use crate::delivery::ChannelSink;
    use crate::error::{FeedError, PipelineError, SubscribeError};
    use crate::feed::memory::MemoryFeed;
    use crate::feed::{FeedClient, FeedConnector, Topic};
    use crate::generation::{PromptContext, PromptEchoGenerator};
    use crate::join::pipeline::JoinPipeline;
    use crate::join::trigger::{SessionTrigger, SummaryRequest};
    use crate::multiplexer::{Multiplexer, MultiplexerOptions};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn session_joins_topics_and_releases_listeners() {
        let feed = MemoryFeed::new();
        let multiplexer = Arc::new(Multiplexer::new(
            "session",
            Arc::new(feed.clone()),
            MultiplexerOptions::default(),
        ));
        let (sink, mut writer) = ChannelSink::<String>::new(4);
        let pipeline = JoinPipeline::new(
            "session",
            PromptContext::new("Combine:", "local"),
            Arc::new(PromptEchoGenerator),
            Arc::new(sink),
        );
        let session = JoinSession::new(multiplexer.clone(), "energy", "traffic");
        let cancel = CancellationToken::new();

        let driver = async {
            for topic in ["energy", "traffic"] {
                while multiplexer
                    .topic_health(topic)
                    .await
                    .map_or(true, |health| health.listeners == 0)
                {
                    tokio::task::yield_now().await;
                }
            }
            feed.publish("energy", "E1");
            feed.publish("traffic", "T1");
            let artifact = writer.recv().await;
            cancel.cancel();
            artifact
        };
        let (result, artifact) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(1), session.run(&pipeline, cancel.clone())),
            driver
        );

        assert!(matches!(
            result.expect("session returned promptly"),
            Err(PipelineError::Cancelled)
        ));
        assert_eq!(artifact.as_deref(), Some("Combine:\n\nE1\nT1"));
        let energy = multiplexer.topic_health("energy").await.expect("energy");
        let traffic = multiplexer.topic_health("traffic").await.expect("traffic");
        assert_eq!(energy.listeners, 0);
        assert_eq!(traffic.listeners, 0);
    }

    #[tokio::test]
    async fn failed_second_subscription_releases_first() {
        let feed = MemoryFeed::new();
        let multiplexer = Arc::new(Multiplexer::new(
            "session",
            Arc::new(feed),
            MultiplexerOptions::default(),
        ));
        let (sink, _writer) = ChannelSink::<String>::new(4);
        let pipeline = JoinPipeline::new(
            "session",
            PromptContext::default(),
            Arc::new(PromptEchoGenerator),
            Arc::new(sink),
        );
        let session = JoinSession::new(multiplexer.clone(), "energy", "");

        let result = session.run(&pipeline, CancellationToken::new()).await;

        assert!(matches!(
            result,
            Err(PipelineError::Subscribe(SubscribeError::EmptyTopic))
        ));
        let energy = multiplexer.topic_health("energy").await.expect("energy");
        assert_eq!(energy.listeners, 0);
    }

    struct StalledConnector;

    #[async_trait]
    impl FeedConnector for StalledConnector {
        async fn connect(&self) -> Result<Arc<dyn FeedClient>, FeedError> {
            std::future::pending().await
        }
    }

    fn echo_pipeline() -> (JoinPipeline, tokio::sync::mpsc::Receiver<String>) {
        let (sink, writer) = ChannelSink::<String>::new(4);
        let pipeline = JoinPipeline::new(
            "session",
            PromptContext::default(),
            Arc::new(PromptEchoGenerator),
            Arc::new(sink),
        );
        (pipeline, writer)
    }

    #[tokio::test]
    async fn cancellation_interrupts_stalled_subscribe() {
        let multiplexer = Arc::new(Multiplexer::new(
            "session",
            Arc::new(StalledConnector),
            MultiplexerOptions::default(),
        ));
        let (pipeline, _writer) = echo_pipeline();
        let session = JoinSession::new(multiplexer, "energy", "traffic");
        let cancel = CancellationToken::new();

        let canceller = async {
            tokio::task::yield_now().await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(1), session.run(&pipeline, cancel.clone())),
            canceller
        );

        assert!(matches!(
            result.expect("session returned promptly"),
            Err(PipelineError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn triggers_are_published_before_subscribing_and_failures_are_skipped() {
        let feed = MemoryFeed::new();
        feed.set_publish_failure("trigger-traffic-update-agent", Some("topic not found"));
        let multiplexer = Arc::new(Multiplexer::new(
            "session",
            Arc::new(feed.clone()),
            MultiplexerOptions::default(),
        ));
        let request = SummaryRequest {
            areas: vec!["Indiranagar".to_string()],
            lat: 12.97,
            long: 77.64,
        };
        let trigger = SessionTrigger::new(
            Arc::new(feed.clone()),
            vec![
                Topic::from("trigger-traffic-update-agent"),
                Topic::from("trigger-energy-management-agent"),
            ],
            &request,
        )
        .expect("encode");
        let expected_trigger = trigger.payload().to_vec();
        let (pipeline, mut writer) = echo_pipeline();
        let session =
            JoinSession::new(multiplexer.clone(), "energy", "traffic").with_trigger(trigger);
        let cancel = CancellationToken::new();

        let mut agent = multiplexer
            .subscribe("trigger-energy-management-agent")
            .await
            .expect("subscribe");
        let driver = async {
            let trigger = agent.recv().await;
            for topic in ["energy", "traffic"] {
                while multiplexer
                    .topic_health(topic)
                    .await
                    .map_or(true, |health| health.listeners == 0)
                {
                    tokio::task::yield_now().await;
                }
            }
            feed.publish("energy", "E1");
            feed.publish("traffic", "T1");
            let artifact = writer.recv().await;
            cancel.cancel();
            (trigger, artifact)
        };
        let (result, (trigger, artifact)) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(1), session.run(&pipeline, cancel.clone())),
            driver
        );

        assert!(matches!(
            result.expect("session returned promptly"),
            Err(PipelineError::Cancelled)
        ));
        assert_eq!(trigger.map(String::into_bytes), Some(expected_trigger));
        assert!(artifact.is_some());
        agent.cancel();
    }

    #[test]
    fn from_config_requires_two_topics() {
        let feed = MemoryFeed::new();
        let multiplexer = Arc::new(Multiplexer::new(
            "session",
            Arc::new(feed),
            MultiplexerOptions::default(),
        ));
        let config = SummaryConfig {
            subscription_ids: vec!["energy".to_string()],
            ..Default::default()
        };

        assert!(matches!(
            JoinSession::from_config(multiplexer.clone(), &config),
            Err(PipelineError::Config(_))
        ));

        let session = JoinSession::from_config(multiplexer, &SummaryConfig::default())
            .expect("default config has two topics");
        assert_eq!(
            session.topics().0.as_str(),
            "energy-management-data-sub"
        );
    }
}
