//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::hyperpriors::HyperpriorConfig;
use crate::sampler::SamplerConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
        }
    }
}

impl From<ValidationError> for btyd_common::Error {
    fn from(err: ValidationError) -> Self {
        btyd_common::Error::Config(err.to_string())
    }
}

/// Validate hyperprior values semantically.
///
/// Names ending in `_lower`/`_upper` bound a probability and must satisfy
/// `0 <= lower < upper <= 1`; every other value must be positive.
pub fn validate_hyperpriors(hyperpriors: &HyperpriorConfig) -> ValidationResult<()> {
    for (name, value) in hyperpriors.iter() {
        if !value.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: name.to_string(),
                message: format!("Must be finite, got {}", value),
            });
        }
        if is_bound(name) {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::InvalidValue {
                    field: name.to_string(),
                    message: format!("Must be in [0, 1], got {}", value),
                });
            }
        } else if value <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: name.to_string(),
                message: format!("Must be positive, got {}", value),
            });
        }
    }

    for (name, lower) in hyperpriors.iter() {
        let Some(stem) = name.strip_suffix("_lower") else {
            continue;
        };
        let upper_name = format!("{}_upper", stem);
        let upper = hyperpriors.require(&upper_name)?;
        if lower >= upper {
            return Err(ValidationError::SemanticError(format!(
                "{} ({}) must be below {} ({})",
                name, lower, upper_name, upper
            )));
        }
    }

    Ok(())
}

/// Validate sampler settings.
pub fn validate_sampler(sampler: &SamplerConfig) -> ValidationResult<()> {
    if sampler.chains == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sampler.chains".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if sampler.draws == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sampler.draws".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if !(sampler.target_accept > 0.0 && sampler.target_accept < 1.0) {
        return Err(ValidationError::InvalidValue {
            field: "sampler.target_accept".to_string(),
            message: format!("Must be in (0, 1), got {}", sampler.target_accept),
        });
    }

    if !(sampler.initial_step.is_finite() && sampler.initial_step > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: "sampler.initial_step".to_string(),
            message: format!("Must be positive, got {}", sampler.initial_step),
        });
    }

    if let Some(max_rhat) = sampler.max_rhat {
        if max_rhat.is_nan() || max_rhat < 1.0 {
            return Err(ValidationError::InvalidValue {
                field: "sampler.max_rhat".to_string(),
                message: format!("Must be >= 1.0, got {}", max_rhat),
            });
        }
    }

    Ok(())
}

fn is_bound(name: &str) -> bool {
    name.ends_with("_lower") || name.ends_with("_upper")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyperpriors::{PHI_PRIOR_LOWER, PHI_PRIOR_UPPER, R_PRIOR_BETA};

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_hyperpriors(&HyperpriorConfig::beta_geo_default()).is_ok());
        assert!(validate_sampler(&SamplerConfig::default()).is_ok());
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        let h = HyperpriorConfig::beta_geo_default().with(R_PRIOR_BETA, 0.0);
        let err = validate_hyperpriors(&h).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let h = HyperpriorConfig::beta_geo_default()
            .with(PHI_PRIOR_LOWER, 0.8)
            .with(PHI_PRIOR_UPPER, 0.2);
        let err = validate_hyperpriors(&h).unwrap_err();
        assert!(matches!(err, ValidationError::SemanticError(_)));
    }

    #[test]
    fn test_bound_outside_unit_interval_rejected() {
        let h = HyperpriorConfig::beta_geo_default().with(PHI_PRIOR_UPPER, 1.5);
        assert!(validate_hyperpriors(&h).is_err());
    }

    #[test]
    fn test_lower_without_upper_is_missing_field() {
        let h = HyperpriorConfig::empty().with("phi_prior_lower", 0.0);
        let err = validate_hyperpriors(&h).unwrap_err();
        assert_eq!(err.code(), 64);
    }

    #[test]
    fn test_sampler_rejects_zero_chains() {
        let s = SamplerConfig::default().with_chains(0);
        assert!(validate_sampler(&s).is_err());
    }

    #[test]
    fn test_sampler_rejects_bad_target_accept() {
        let s = SamplerConfig {
            target_accept: 1.0,
            ..SamplerConfig::default()
        };
        assert!(validate_sampler(&s).is_err());
    }

    #[test]
    fn test_converts_into_common_error() {
        let err: btyd_common::Error = ValidationError::MissingField("x".into()).into();
        assert_eq!(err.category(), btyd_common::ErrorCategory::Config);
    }
}
