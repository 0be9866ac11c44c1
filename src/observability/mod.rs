// Observability: metrics for normalization runs (logging lives in crate::logging)

pub mod metrics;
