//! Action implementations, one module per action.

pub mod completions;
pub mod get;
