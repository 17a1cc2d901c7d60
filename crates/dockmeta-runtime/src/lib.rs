//! Container metadata enrichment for log events.
//!
//! The [`Enricher`](enricher::Enricher) reads a container identifier from
//! each event, resolves it through the [`MetadataStore`](store::MetadataStore)
//! or a [`RuntimeClient`](client::RuntimeClient), and attaches a flat map
//! of env values, labels, and templated fields to the event.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod client;
pub mod enricher;
pub mod extract;
pub mod metrics;
pub mod observer;
pub mod render;
pub mod store;
