//! Search orchestrator: concurrent fetch, parse, merge.
//!
//! This module fans requests out to every configured source concurrently,
//! reassembles the responses in source order, parses them, and merges the
//! records into a single score-ordered result set.

pub mod aggregate;
pub mod fetch;
pub mod search;
