//! Row Matching - reconcile imported bank transaction rows with contributions.

pub mod clients;
pub mod config;
pub mod models;
pub mod services;
pub mod startup;
