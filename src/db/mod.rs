// SPDX-License-Identifier: MIT

//! Entity store: typed collections with transactional multi-document writes.

pub mod store;

pub use store::{Database, Transaction};
