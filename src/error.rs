use thiserror::Error;

/// Rejected domain configuration.
/// 被拒绝的域配置。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The reclamation coefficient was NaN or infinite.
    #[error("reclaim coefficient must be finite, got {0}")]
    NonFiniteCoefficient(f64),

    /// The reclamation coefficient was below zero.
    #[error("reclaim coefficient must not be negative, got {0}")]
    NegativeCoefficient(f64),
}
