//! Message delivery.
//!
//! # Submodules
//!
//! - [`message`]: renders enriched articles and splits long messages into chunks
//! - [`line`]: pushes messages through the LINE Messaging API, pacing a batch

pub mod line;
pub mod message;
