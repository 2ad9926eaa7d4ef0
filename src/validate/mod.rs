// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Document validation reporting.
//!
//! Full JSON-schema evaluation is an external collaborator's job; this
//! module defines the report vocabulary it speaks ([`ValidationIssue`],
//! [`ValidationReport`], the [`DocumentValidator`] trait), exposes the
//! generated schemas for the wire formats, and ships a structural
//! validator covering what the sync engine itself relies on.

use schemars::{schema_for, Schema};
use serde::Serialize;
use serde_json::Value;

use crate::format::canvas::CanvasDocument;
use crate::format::ocif::{graph_from_wire, OcifDocument, OCIF_VERSION};

/// One problem found in a document, located as precisely as the raw text
/// allows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ValidationIssue {
    /// Builds an issue at `path`, recovering line/column and the trimmed
    /// source line from the raw text.
    pub fn at(raw: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        let (line, column) = locate_pointer(raw, &path);
        let context = raw
            .lines()
            .nth(line - 1)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned);
        Self {
            path,
            message: message.into(),
            line,
            column,
            details: None,
            context,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }
}

/// The interface a validation collaborator implements.
pub trait DocumentValidator {
    fn validate(&self, document: &Value, raw: &str) -> ValidationReport;
}

/// Best-effort line/column recovery for a JSON-pointer path: scans the
/// raw text for each quoted pointer segment in order, so a nested key is
/// found after its parent rather than at its first occurrence anywhere.
/// Array indices carry no key to scan for and are skipped, which keeps
/// the result approximate inside arrays of same-shaped objects. Returns
/// 1-based coordinates, `(1, 1)` for the root or when nothing matches.
pub fn locate_pointer(raw: &str, pointer: &str) -> (usize, usize) {
    let mut offset = 0;
    let mut found = None;

    for segment in pointer.split('/').filter(|segment| !segment.is_empty()) {
        if segment.bytes().all(|byte| byte.is_ascii_digit()) {
            continue;
        }
        let needle = format!("\"{segment}\"");
        let Some(position) = raw[offset..].find(&needle) else {
            break;
        };
        offset += position;
        found = Some(offset);
        offset += needle.len();
    }

    let Some(position) = found else {
        return (1, 1);
    };
    let before = &raw[..position];
    let line = before.bytes().filter(|&byte| byte == b'\n').count() + 1;
    let line_start = before.rfind('\n').map(|index| index + 1).unwrap_or(0);
    (line, position - line_start + 1)
}

/// Generated schema for the interchange wire format.
pub fn interchange_schema() -> Schema {
    schema_for!(OcifDocument)
}

/// Generated schema for the canvas wire format.
pub fn canvas_schema() -> Schema {
    schema_for!(CanvasDocument)
}

/// Checks the structural properties the sync engine depends on: the
/// version tag, typed deserialization, and graph invariants (edge
/// endpoints and arrow-node pairing).
#[derive(Debug, Default)]
pub struct InterchangeValidator;

impl DocumentValidator for InterchangeValidator {
    fn validate(&self, document: &Value, raw: &str) -> ValidationReport {
        let mut errors = Vec::new();

        match document.get("ocif").and_then(Value::as_str) {
            None => errors.push(
                ValidationIssue::at(raw, "/ocif", "missing version tag")
                    .with_details(format!("Expected value: {OCIF_VERSION:?}")),
            ),
            Some(version) if version != OCIF_VERSION => errors.push(
                ValidationIssue::at(raw, "/ocif", "unsupported version")
                    .with_details(format!("Expected value: {OCIF_VERSION:?}")),
            ),
            Some(_) => {}
        }

        let wire: OcifDocument = match serde_json::from_value(document.clone()) {
            Ok(wire) => wire,
            Err(err) => {
                errors.push(ValidationIssue::at(raw, "/", err.to_string()));
                return ValidationReport::invalid(errors);
            }
        };

        match graph_from_wire(&wire) {
            Ok(graph) => {
                if let Err(err) = graph.check_invariants() {
                    errors.push(ValidationIssue::at(raw, "/relations", err.to_string()));
                }
            }
            Err(err) => errors.push(ValidationIssue::at(raw, "/", err.to_string())),
        }

        if errors.is_empty() {
            ValidationReport::valid()
        } else {
            ValidationReport::invalid(errors)
        }
    }
}
