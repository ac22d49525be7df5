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

//! Field formatters shared by log call sites.

const PREVIEW_CHARS: usize = 48;

/// Returns a bounded, single-line preview of a payload for log fields.
pub fn format_payload_preview(payload: &str) -> String {
    let mut preview: String = payload
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if payload.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
