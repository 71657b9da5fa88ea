//! Pagemark Server Library
//!
//! Per-page annotations (highlights, comments, notes) and document votes for
//! a library of PDF files, stored as JSON side files and served over HTTP.
//! The server binary is in main.rs.
//!
//! # Modules
//!
//! - `annotations`: record types, JSON file store, editor operations, votes
//! - `documents`: document names and the page-text source
//! - `html`: highlight rendering into page text
//! - `routes`: axum API

pub mod access;
pub mod annotations;
pub mod config;
pub mod documents;
pub mod error;
pub mod html;
pub mod routes;
pub mod state;
