pub mod analysis_service;
pub mod chart_service;
pub mod cleaner;
pub mod export_service;
pub mod metrics_service;
