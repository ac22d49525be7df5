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

//! Fan-out benchmarks
//!
//! Measures one upstream message reaching every listener of a topic.
//!
//! Run with: cargo bench --bench fanout_criterion

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use topic_fanout::feed::memory::MemoryFeed;
use topic_fanout::{Multiplexer, MultiplexerOptions, Subscription};

const TOPIC: &str = "traffic-update-data-sub";
const PAYLOAD: &str = r#"{"road":"Outer Ring Road","status":"congested","speed_kmph":12}"#;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("bench runtime")
}

fn subscribe_all(
    runtime: &Runtime,
    multiplexer: &Multiplexer,
    listeners: usize,
) -> Vec<Subscription> {
    runtime.block_on(async {
        let mut subscriptions = Vec::with_capacity(listeners);
        for _ in 0..listeners {
            subscriptions.push(multiplexer.subscribe(TOPIC).await.expect("subscribe"));
        }
        subscriptions
    })
}

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");

    for listeners in [1usize, 8, 32, 128] {
        let runtime = runtime();
        let feed = MemoryFeed::new();
        let multiplexer = Multiplexer::new(
            "bench",
            Arc::new(feed.clone()),
            MultiplexerOptions::default(),
        );
        let mut subscriptions = subscribe_all(&runtime, &multiplexer, listeners);

        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, _| {
                b.iter(|| {
                    runtime.block_on(async {
                        feed.publish(TOPIC, PAYLOAD);
                        for subscription in subscriptions.iter_mut() {
                            black_box(subscription.recv().await);
                        }
                    })
                });
            },
        );

        runtime.block_on(multiplexer.shutdown());
    }

    group.finish();
}

fn bench_payload_copy_per_listener(c: &mut Criterion) {
    let runtime = runtime();
    let feed = MemoryFeed::new();
    let multiplexer = Multiplexer::new(
        "bench-saturated",
        Arc::new(feed.clone()),
        MultiplexerOptions {
            listener_capacity: 1,
            ..Default::default()
        },
    );
    // Never drained: every broadcast after the first takes the drop path.
    let _stalled = subscribe_all(&runtime, &multiplexer, 32);
    let mut healthy = subscribe_all(&runtime, &multiplexer, 1);

    c.bench_function("broadcast_with_saturated_listeners", |b| {
        b.iter(|| {
            runtime.block_on(async {
                feed.publish(TOPIC, PAYLOAD);
                black_box(healthy[0].recv().await);
            })
        });
    });

    runtime.block_on(multiplexer.shutdown());
}

criterion_group!(benches, bench_broadcast, bench_payload_copy_per_listener);
criterion_main!(benches);
