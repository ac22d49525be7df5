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

//! Lazy construction of the shared upstream client.

use crate::error::FeedError;
use crate::feed::{FeedClient, FeedConnector};
use crate::observability::events;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

const COMPONENT: &str = "client_slot";

/// Holds at most one connected [`FeedClient`], created on first use.
///
/// Connection runs under the slot lock so concurrent first callers share one
/// attempt. A failed attempt is returned to its caller and not remembered.
pub(crate) struct ClientSlot {
    connector: Arc<dyn FeedConnector>,
    client: Mutex<Option<Arc<dyn FeedClient>>>,
}

impl ClientSlot {
    pub(crate) fn new(connector: Arc<dyn FeedConnector>) -> Self {
        Self {
            connector,
            client: Mutex::new(None),
        }
    }

    pub(crate) async fn get_or_connect(&self) -> Result<Arc<dyn FeedClient>, FeedError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        match self.connector.connect().await {
            Ok(client) => {
                info!(
                    event = events::CLIENT_CONNECT_OK,
                    component = COMPONENT,
                    "connected shared upstream client"
                );
                *slot = Some(client.clone());
                Ok(client)
            }
            Err(err) => {
                warn!(
                    event = events::CLIENT_CONNECT_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "unable to connect shared upstream client"
                );
                Err(err)
            }
        }
    }
}
