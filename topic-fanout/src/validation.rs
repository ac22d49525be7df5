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

//! Optional acceptance checks applied to join-pipeline updates.

use std::fmt::Debug;

/// Decides whether an update may become a source's latest value.
pub trait PayloadValidator: Send + Sync + Debug {
    /// Returns the rejection reason for a malformed payload.
    fn validate(&self, payload: &str) -> Result<(), String>;
}

/// Accepts payloads that parse as a JSON document.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonPayloadValidator;

impl PayloadValidator for JsonPayloadValidator {
    fn validate(&self, payload: &str) -> Result<(), String> {
        serde_json::from_str::<serde_json::Value>(payload)
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}

/// Accepts payloads containing at least one non-whitespace character.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonEmptyPayloadValidator;

impl PayloadValidator for NonEmptyPayloadValidator {
    fn validate(&self, payload: &str) -> Result<(), String> {
        if payload.trim().is_empty() {
            Err("payload is empty".to_string())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonPayloadValidator, NonEmptyPayloadValidator, PayloadValidator};

    #[test]
    fn json_validator_accepts_documents_and_rejects_garbage() {
        assert!(JsonPayloadValidator
            .validate(r#"{"area":"Koramangala","load_mw":12.5}"#)
            .is_ok());
        assert!(JsonPayloadValidator.validate("{not json").is_err());
        assert!(JsonPayloadValidator.validate("").is_err());
    }

    #[test]
    fn non_empty_validator_rejects_whitespace() {
        assert!(NonEmptyPayloadValidator.validate(" \n").is_err());
        assert!(NonEmptyPayloadValidator.validate("x").is_ok());
    }
}
