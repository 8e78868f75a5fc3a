//! Calendar Core: shared domain abstractions.
//!
//! This crate defines the event entity, the temporal bucket arithmetic, and the
//! storage contract that every backing store implements. It contains no
//! infrastructure code.

pub mod bucket;
pub mod command;
pub mod error;
pub mod event;
pub mod id;
pub mod storage;
