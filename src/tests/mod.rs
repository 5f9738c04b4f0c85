//! Integration-style tests over the whole session lifecycle.

pub(crate) mod fixtures;
