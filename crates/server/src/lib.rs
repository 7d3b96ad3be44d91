//! Bazaar server library.
//!
//! Exposes the marketplace backend as a library so handlers and services can
//! be tested without starting the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
