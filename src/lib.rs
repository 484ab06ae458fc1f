//! churnctl — terminal client for a churn prediction service.
//!
//! The crate is split so the interesting parts are testable without a
//! terminal or a live service:
//!
//! - [`session`] holds the bearer credential and derives the active view
//! - [`api`] issues requests and classifies failures
//! - [`form`] turns user input into request payloads
//! - [`render`] maps responses to view models and prints them
//! - [`controller`] wires the above into one method per user action

pub mod activity;
pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod form;
pub mod render;
pub mod session;
