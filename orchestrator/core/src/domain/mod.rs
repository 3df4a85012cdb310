// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Definitions, merge and naming rules, and the collaborator contracts the
//! application layer is written against.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and traits; no I/O

pub mod action;
pub mod command;
pub mod config;
pub mod definition;
pub mod environment;
pub mod host_config;
pub mod merge;
pub mod naming;
pub mod runtime;
