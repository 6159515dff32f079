//! Cookbook - a recipe sharing backend
//!
//! This library provides the core functionality for the Cookbook API:
//! recipes with ingredients and tags, favorites, shopping carts, and
//! user subscriptions.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
