// SPDX-License-Identifier: MIT

//! Pantry-Planner: household grocery and meal-planning backend.
//!
//! This crate provides the REST API for managing a personal grocery
//! inventory, a buying list, recipes composed of groceries, and meals
//! assembled from recipes. The many-to-many links between those entities
//! are kept consistent through transactional join-row maintenance.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Database;
use services::ImageStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub images: ImageStore,
}
