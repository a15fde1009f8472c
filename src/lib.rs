//! # IMS Rust Backend
//!
//! Attendance reminder engine for the internship management system.
//!
//! This crate provides a Rust-based backend for the scheduled attendance
//! reminders: a singleton reminder schedule, exact-minute slot matching in
//! the deployment time zone, absence queries grouped by supervisor, and
//! paced notification dispatch over an abstracted messaging transport. The
//! backend exposes a REST API via Axum for the admin frontend and the
//! external minute-cadence scheduler.
//!
//! ## Features
//!
//! - **Schedule Settings**: One record with three named slots (check-in,
//!   break, check-out), replaced wholesale by administrators
//! - **Slot Matching**: Weekend-suppressed exact-minute matching with
//!   check-in > break > check-out priority
//! - **Absence Queries**: Outstanding check-ins/check-outs grouped by
//!   supervisor in deterministic order
//! - **Dispatch**: Per-recipient rendering with inter-send pacing and an
//!   append-only audit trail
//! - **HTTP API**: Trigger, settings and absence preview endpoints
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Identifier newtypes and re-exported domain types
//! - [`db`]: Database operations, repository pattern, and persistence layer
//! - [`scheduler`]: Pure schedule matching
//! - [`services`]: Dispatch cycle orchestration, rendering and audit
//! - [`transport`]: Outbound messaging abstraction and the Telegram backend
//! - [`http`]: Axum-based HTTP server and request handlers
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod config;
pub mod db;
pub mod models;

pub mod scheduler;

pub mod services;
pub mod transport;

#[cfg(feature = "http-server")]
pub mod http;
