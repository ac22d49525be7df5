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

//! Stable event names used in the `event` field of every log record.

pub const CLIENT_CONNECT_OK: &str = "client_connect_ok";
pub const CLIENT_CONNECT_FAILED: &str = "client_connect_failed";

pub const TOPIC_FANOUT_CREATED: &str = "topic_fanout_created";
pub const TOPIC_SUBSCRIPTION_FAILED: &str = "topic_subscription_failed";

pub const RECEIVE_LOOP_START: &str = "receive_loop_start";
pub const RECEIVE_LOOP_RELAUNCH: &str = "receive_loop_relaunch";
pub const RECEIVE_LOOP_STOPPED: &str = "receive_loop_stopped";
pub const RECEIVE_LOOP_TERMINATED: &str = "receive_loop_terminated";

pub const LISTENER_REGISTERED: &str = "listener_registered";
pub const LISTENER_CANCELLED: &str = "listener_cancelled";
pub const LISTENER_PRUNED: &str = "listener_pruned";

pub const BROADCAST_DELIVERED: &str = "broadcast_delivered";
pub const BROADCAST_DROP_QUEUE_FULL: &str = "broadcast_drop_queue_full";

pub const JOIN_UPDATE: &str = "join_update";
pub const JOIN_UPDATE_REJECTED: &str = "join_update_rejected";
pub const JOIN_SOURCE_CLOSED: &str = "join_source_closed";
pub const JOIN_GENERATE_OK: &str = "join_generate_ok";
pub const JOIN_GENERATE_FAILED: &str = "join_generate_failed";
pub const JOIN_DELIVER_FAILED: &str = "join_deliver_failed";
pub const JOIN_CANCELLED: &str = "join_cancelled";

pub const JOIN_TRIGGER_PUBLISHED: &str = "join_trigger_published";
pub const JOIN_TRIGGER_FAILED: &str = "join_trigger_failed";
pub const RELAY_FORWARD: &str = "relay_forward";
pub const RELAY_FILTERED: &str = "relay_filtered";
pub const RELAY_STOPPED: &str = "relay_stopped";

pub const MULTIPLEXER_SHUTDOWN: &str = "multiplexer_shutdown";
