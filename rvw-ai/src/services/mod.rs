//! Business logic services

pub mod enrichment_orchestrator;

pub use enrichment_orchestrator::{EnrichError, EnrichmentOrchestrator};
