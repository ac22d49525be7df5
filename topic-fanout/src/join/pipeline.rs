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

//! Dual-source join pipeline.

use crate::delivery::DeliverySink;
use crate::error::PipelineError;
use crate::generation::{Generator, PromptContext};
use crate::join::state::{JoinPhase, JoinSide, JoinState};
use crate::observability::{events, fields};
use crate::validation::PayloadValidator;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "join_pipeline";

/// Joins two independently paced payload streams into generated artifacts.
///
/// Updates from both inputs pass through one selection point, so artifacts reach
/// the sink in the order their triggering updates were processed, and at most
/// one generation call is in flight at a time.
pub struct JoinPipeline {
    name: String,
    context: PromptContext,
    generator: Arc<dyn Generator>,
    sink: Arc<dyn DeliverySink>,
    validator: Option<Arc<dyn PayloadValidator>>,
    state: JoinState,
}

impl JoinPipeline {
    pub fn new(
        name: &str,
        context: PromptContext,
        generator: Arc<dyn Generator>,
        sink: Arc<dyn DeliverySink>,
    ) -> Self {
        Self {
            name: name.to_string(),
            context,
            generator,
            sink,
            validator: None,
            state: JoinState::new(),
        }
    }

    /// Rejects updates the validator refuses instead of treating them as values.
    pub fn with_validator(mut self, validator: Arc<dyn PayloadValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> JoinPhase {
        self.state.phase()
    }

    /// Consumes both inputs until cancellation, a closed input, or a failure.
    /// Each run starts from [`JoinPhase::Idle`].
    ///
    /// - `cancel` fired: returns [`PipelineError::Cancelled`]; an outstanding
    ///   generation call is dropped and its result discarded.
    /// - either input closed: returns `Ok(())`.
    /// - generation or delivery failed: returns that error; nothing further is
    ///   delivered.
    ///
    /// Releasing the listeners behind `source_a` and `source_b` is the caller's
    /// job; see [`crate::JoinSession`].
    pub async fn run(
        &self,
        cancel: CancellationToken,
        mut source_a: Receiver<String>,
        mut source_b: Receiver<String>,
    ) -> Result<(), PipelineError> {
        let mut emitted: u64 = 0;
        self.state.reset();

        loop {
            if cancel.is_cancelled() {
                return Err(self.cancelled(emitted));
            }

            let (side, update) = tokio::select! {
                _ = cancel.cancelled() => return Err(self.cancelled(emitted)),
                update = source_a.recv() => (JoinSide::A, update),
                update = source_b.recv() => (JoinSide::B, update),
            };

            let Some(payload) = update else {
                info!(
                    event = events::JOIN_SOURCE_CLOSED,
                    component = COMPONENT,
                    pipeline = %self.name,
                    side = %side,
                    phase = ?self.state.phase(),
                    emitted,
                    "join input closed"
                );
                return Ok(());
            };

            if !self.accept(side, &payload) {
                continue;
            }

            let Some(pair) = self.state.record(side, payload) else {
                debug!(
                    event = events::JOIN_UPDATE,
                    component = COMPONENT,
                    pipeline = %self.name,
                    side = %side,
                    phase = ?self.state.phase(),
                    "waiting for the other side"
                );
                continue;
            };

            let started = Instant::now();
            let generated = tokio::select! {
                _ = cancel.cancelled() => return Err(self.cancelled(emitted)),
                generated = self.generator.generate(&self.context, &pair.a, &pair.b) => generated,
            };

            let text = match generated {
                Ok(text) => text,
                Err(err) => {
                    error!(
                        event = events::JOIN_GENERATE_FAILED,
                        component = COMPONENT,
                        pipeline = %self.name,
                        side = %side,
                        err = %err,
                        "generation failed, stopping pipeline"
                    );
                    return Err(PipelineError::Generate(err));
                }
            };

            debug!(
                event = events::JOIN_GENERATE_OK,
                component = COMPONENT,
                pipeline = %self.name,
                side = %side,
                latency_ms = started.elapsed().as_millis() as u64,
                artifact = %fields::format_payload_preview(&text),
                "generated artifact"
            );

            let delivered = tokio::select! {
                _ = cancel.cancelled() => return Err(self.cancelled(emitted)),
                delivered = self.sink.deliver(text) => delivered,
            };
            if let Err(err) = delivered {
                error!(
                    event = events::JOIN_DELIVER_FAILED,
                    component = COMPONENT,
                    pipeline = %self.name,
                    err = %err,
                    "delivery failed, stopping pipeline"
                );
                return Err(PipelineError::Deliver(err));
            }
            emitted += 1;
        }
    }

    fn accept(&self, side: JoinSide, payload: &str) -> bool {
        let Some(validator) = &self.validator else {
            return true;
        };
        match validator.validate(payload) {
            Ok(()) => true,
            Err(reason) => {
                warn!(
                    event = events::JOIN_UPDATE_REJECTED,
                    component = COMPONENT,
                    pipeline = %self.name,
                    side = %side,
                    reason = %reason,
                    payload = %fields::format_payload_preview(payload),
                    "rejected malformed update"
                );
                false
            }
        }
    }

    fn cancelled(&self, emitted: u64) -> PipelineError {
        debug!(
            event = events::JOIN_CANCELLED,
            component = COMPONENT,
            pipeline = %self.name,
            emitted,
            "join pipeline cancelled"
        );
        PipelineError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::JoinPipeline;
    use crate::delivery::{ChannelSink, DeliverySink};
    use crate::error::{DeliveryError, GenerateError, PipelineError};
    use crate::generation::{Generator, PromptContext, PromptEchoGenerator};
    use crate::join::state::JoinPhase;
    use crate::validation::JsonPayloadValidator;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    /// Joins as "a|b" and fails on the configured call number.
    struct PairGenerator {
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
    }

    impl PairGenerator {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on_call,
            }
        }
    }

    #[async_trait]
    impl Generator for PairGenerator {
        async fn generate(
            &self,
            _context: &PromptContext,
            payload_a: &str,
            payload_b: &str,
        ) -> Result<String, GenerateError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if Some(call) == self.fail_on_call {
                return Err(GenerateError::new("quota exhausted"));
            }
            Ok(format!("{payload_a}|{payload_b}"))
        }
    }

    struct StalledGenerator;

    #[async_trait]
    impl Generator for StalledGenerator {
        async fn generate(
            &self,
            _context: &PromptContext,
            _payload_a: &str,
            _payload_b: &str,
        ) -> Result<String, GenerateError> {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingSink {
        fn delivered(&self) -> Vec<String> {
            self.delivered.lock().expect("lock delivered").clone()
        }
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn deliver(&self, text: String) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Rejected("stream reset".to_string()));
            }
            self.delivered.lock().expect("lock delivered").push(text);
            Ok(())
        }
    }

    fn pipeline(generator: Arc<dyn Generator>, sink: Arc<dyn DeliverySink>) -> JoinPipeline {
        JoinPipeline::new("unit", PromptContext::default(), generator, sink)
    }

    async fn send_all(sender: &mpsc::Sender<String>, payloads: &[&str]) {
        for payload in payloads {
            sender.send(payload.to_string()).await.expect("send");
        }
    }

    #[tokio::test]
    async fn emits_only_once_both_sides_populated() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = Arc::new(pipeline(Arc::new(PairGenerator::new(None)), sink.clone()));
        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel::<String>(8);
        let cancel = CancellationToken::new();

        let run = tokio::spawn({
            let pipeline = pipeline.clone();
            let cancel = cancel.clone();
            async move { pipeline.run(cancel, rx_a, rx_b).await }
        });

        send_all(&tx_a, &["A1", "A2"]).await;
        tokio::time::timeout(Duration::from_secs(1), async {
            while tx_a.capacity() < 8 || pipeline.phase() != JoinPhase::PartialA {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("A updates consumed");

        assert!(sink.delivered().is_empty());
        cancel.cancel();
        assert!(matches!(
            run.await.expect("join"),
            Err(PipelineError::Cancelled)
        ));
        drop(tx_b);
    }

    #[tokio::test]
    async fn each_run_starts_from_idle() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(Arc::new(PairGenerator::new(None)), sink.clone());

        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);
        send_all(&tx_a, &["A1"]).await;
        send_all(&tx_b, &["B1"]).await;
        let cancel = CancellationToken::new();
        let driver = async {
            while sink.delivered().is_empty() {
                tokio::task::yield_now().await;
            }
            cancel.cancel();
        };
        let (first_run, ()) = tokio::join!(pipeline.run(cancel.clone(), rx_a, rx_b), driver);
        assert!(matches!(first_run, Err(PipelineError::Cancelled)));
        assert_eq!(pipeline.phase(), JoinPhase::Ready);

        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel::<String>(8);
        send_all(&tx_a, &["A2"]).await;
        drop(tx_a);
        drop(tx_b);
        let second_run = pipeline.run(CancellationToken::new(), rx_a, rx_b).await;

        assert!(second_run.is_ok());
        assert_eq!(sink.delivered(), vec!["A1|B1".to_string()]);
    }

    #[tokio::test]
    async fn first_pair_uses_latest_values() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = Arc::new(pipeline(Arc::new(PairGenerator::new(None)), sink.clone()));
        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let run = tokio::spawn({
            let pipeline = pipeline.clone();
            let cancel = cancel.clone();
            async move { pipeline.run(cancel, rx_a, rx_b).await }
        });

        send_all(&tx_a, &["A1", "A2"]).await;
        tokio::time::timeout(Duration::from_secs(1), async {
            while tx_a.capacity() < 8 || pipeline.phase() != JoinPhase::PartialA {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("A updates consumed");
        assert!(sink.delivered().is_empty());

        send_all(&tx_b, &["B1"]).await;
        tokio::time::timeout(Duration::from_secs(1), async {
            while sink.delivered().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("emission");

        assert_eq!(sink.delivered(), vec!["A2|B1".to_string()]);
        cancel.cancel();
        assert!(matches!(
            run.await.expect("join"),
            Err(PipelineError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn ready_pipeline_reemits_with_stale_partner() {
        let (sink, mut writer) = ChannelSink::<String>::new(8);
        let pipeline = pipeline(Arc::new(PairGenerator::new(None)), Arc::new(sink));
        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);

        send_all(&tx_b, &["B1"]).await;
        let cancel = CancellationToken::new();
        let outputs = async {
            tx_a.send("A1".to_string()).await.expect("send");
            let first = writer.recv().await;
            tx_a.send("A2".to_string()).await.expect("send");
            let second = writer.recv().await;
            cancel.cancel();
            (first, second)
        };

        let (result, (first, second)) =
            tokio::join!(pipeline.run(cancel.clone(), rx_a, rx_b), outputs);

        assert_eq!(first.as_deref(), Some("A1|B1"));
        assert_eq!(second.as_deref(), Some("A2|B1"));
        assert!(matches!(result, Err(PipelineError::Cancelled)));
        drop(tx_b);
    }

    #[tokio::test]
    async fn generation_failure_aborts_without_further_delivery() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(Arc::new(PairGenerator::new(Some(2))), sink.clone());
        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);

        send_all(&tx_b, &["B1"]).await;
        let feed_a = async {
            tx_a.send("A1".to_string()).await.expect("send");
            // Wait for the first artifact so "A2" is the second joined pair.
            while sink.delivered().is_empty() {
                tokio::task::yield_now().await;
            }
            // The pipeline stops after "A2", so later sends may find it gone.
            for payload in ["A2", "A3", "A4"] {
                let _ = tx_a.send(payload.to_string()).await;
            }
        };

        let (result, ()) = tokio::join!(
            tokio::time::timeout(
                Duration::from_secs(1),
                pipeline.run(CancellationToken::new(), rx_a, rx_b)
            ),
            feed_a
        );

        let result = result.expect("run returned promptly");
        match result {
            Err(PipelineError::Generate(err)) => assert_eq!(err.reason(), "quota exhausted"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(sink.delivered(), vec!["A1|B1".to_string()]);
        drop(tx_b);
    }

    #[tokio::test]
    async fn delivery_failure_aborts() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let pipeline = pipeline(Arc::new(PromptEchoGenerator), sink);
        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);
        send_all(&tx_a, &["A1"]).await;
        send_all(&tx_b, &["B1"]).await;

        let result = pipeline.run(CancellationToken::new(), rx_a, rx_b).await;

        assert!(matches!(
            result,
            Err(PipelineError::Deliver(DeliveryError::Rejected(_)))
        ));
    }

    #[tokio::test]
    async fn cancellation_before_any_update_returns_promptly() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(Arc::new(PromptEchoGenerator), sink);
        let (_tx_a, rx_a) = mpsc::channel::<String>(8);
        let (_tx_b, rx_b) = mpsc::channel::<String>(8);
        let cancel = CancellationToken::new();

        let run = pipeline.run(cancel.clone(), rx_a, rx_b);
        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_millis(500), run)
            .await
            .expect("run returned promptly");

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert_eq!(pipeline.phase(), JoinPhase::Idle);
    }

    #[tokio::test]
    async fn cancellation_discards_outstanding_generation() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(Arc::new(StalledGenerator), sink.clone());
        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);
        send_all(&tx_a, &["A1"]).await;
        send_all(&tx_b, &["B1"]).await;
        let cancel = CancellationToken::new();

        let canceller = async {
            while pipeline.phase() != JoinPhase::Ready {
                tokio::task::yield_now().await;
            }
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            tokio::time::timeout(
                Duration::from_secs(1),
                pipeline.run(cancel.clone(), rx_a, rx_b)
            ),
            canceller
        );

        assert!(matches!(
            result.expect("run returned promptly"),
            Err(PipelineError::Cancelled)
        ));
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test]
    async fn validator_rejects_malformed_updates() {
        let sink = Arc::new(RecordingSink::default());
        let counting = Arc::new(PairGenerator::new(None));
        let pipeline = pipeline(counting.clone(), sink.clone())
            .with_validator(Arc::new(JsonPayloadValidator));
        let (tx_a, rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        send_all(&tx_a, &[r#"{"load":1}"#]).await;
        send_all(&tx_b, &["not json", r#"{"jam":true}"#]).await;

        let driver = async {
            while sink.delivered().is_empty() {
                tokio::task::yield_now().await;
            }
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            tokio::time::timeout(
                Duration::from_secs(1),
                pipeline.run(cancel.clone(), rx_a, rx_b)
            ),
            driver
        );

        assert!(matches!(
            result.expect("run returned promptly"),
            Err(PipelineError::Cancelled)
        ));
        assert_eq!(
            sink.delivered(),
            vec![r#"{"load":1}|{"jam":true}"#.to_string()]
        );
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
        drop((tx_a, tx_b));
    }
}
