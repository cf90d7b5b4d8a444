//! NextShop agent gateway library.
//!
//! Exposes the gateway functionality as a library so the tool dispatch,
//! session, and cart reconciliation layers can be tested in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod tools;
