//! This module contains the core logic of the pagegate page dispatcher.
//!
//! A requested page name runs through the `checkPage` hooks and the access
//! policy, is resolved to a registered handler along the module search path
//! and is then processed and rendered, optionally after the shared header.
//! The admin surface maintains the deny-list at runtime and the front
//! controller maps HTTP requests onto dispatches.

pub mod admin;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod logging;
pub mod pages;
pub mod service;
pub(crate) mod utils;
