//! Scrumline - issue ordering, sprint lifecycle and access rules for a
//! multi-tenant project tracker.
//!
//! Organisations contain projects, projects contain sprints, sprints
//! contain issues on a four-column board. This crate is the server-side
//! core behind that board: a pure ordering engine keeping each column's
//! `order` dense, a sprint state machine (`PLANNED -> ACTIVE ->
//! COMPLETED`), an access guard over explicit actor contexts, and a
//! service layer tying them to storage and identity collaborators.

#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod guard;
pub mod identity;
pub mod lifecycle;
pub mod ordering;
pub mod service;
pub mod storage;

// Internal id minting (not exposed as public API)
pub(crate) mod ids;
