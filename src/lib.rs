// ============================================================================
// tailor_crm - customer and order backend for a bespoke tailoring dashboard
// ============================================================================
//
// - store:     persistence traits with PostgreSQL and in-memory backends
// - domain:    custom-size reconciliation and customer commands
// - api:       actix-web routes
// - wire:      field tables and DTOs for the JSON interface
// - dashboard: client-side edit state machines
//
// ============================================================================

pub mod api;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod models;
pub mod query;
pub mod seed;
pub mod store;
pub mod utils;
pub mod wire;
