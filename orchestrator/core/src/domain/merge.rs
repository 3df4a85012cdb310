// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Field Override Rules
//!
//! Pure functions deciding, field by field, which of two values wins when a
//! specific definition (a chain) is layered over a generic template (a service).
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Override semantics per field type, no I/O
//!
//! | Field type | Result |
//! |------------|--------|
//! | string     | specific if non-empty, else template |
//! | integer    | specific if non-zero, else template |
//! | list       | specific list wholesale if non-empty, else template list |
//! | map        | union; specific value wins on shared keys |

use std::collections::BTreeMap;

pub fn overwrite_string(specific: String, template: String) -> String {
    if specific.is_empty() {
        template
    } else {
        specific
    }
}

pub fn overwrite_int(specific: i64, template: i64) -> i64 {
    if specific == 0 {
        template
    } else {
        specific
    }
}

/// The specific list replaces the template list entirely; elements are never
/// combined.
pub fn overwrite_list(specific: Vec<String>, template: Vec<String>) -> Vec<String> {
    if specific.is_empty() {
        template
    } else {
        specific
    }
}

pub fn merge_map(
    specific: BTreeMap<String, String>,
    template: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = template;
    merged.extend(specific);
    merged
}
