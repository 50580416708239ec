pub mod domain;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod remote;
pub mod validation;
pub mod validators;
