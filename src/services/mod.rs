// SPDX-License-Identifier: MIT

//! Core services: relationship management, cascade deletion, queries, and
//! image storage.

pub mod cascade;
pub mod images;
pub mod links;
pub mod query;

pub use images::ImageStore;
