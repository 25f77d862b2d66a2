//! Standalone helper: which Steam games does a whole group own?
//! Unrelated to channel renaming; exposed as the `common-games` subcommand.

pub mod client;
pub mod common;
