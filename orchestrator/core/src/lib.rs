// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Eris Core
//!
//! Service and chain definition resolution, container lifecycle, and action
//! orchestration for the `eris` tool.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types and rules, application services, and the
//!   file, Docker and shell adapters they run against

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
