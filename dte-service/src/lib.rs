//! DTE Service - Chilean purchase-invoice ingestion and double-entry posting.

pub mod batch;
pub mod config;
pub mod dte;
pub mod models;
pub mod services;
pub mod startup;
