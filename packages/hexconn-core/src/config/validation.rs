//! Configuration validation

use super::error::{ConfigError, ConfigResult};

/// Section-level validation
pub trait Validatable {
    /// `Ok(())` if valid, otherwise the first violated constraint
    fn validate(&self) -> ConfigResult<()>;

    /// Section name used in error messages
    fn config_name(&self) -> &'static str {
        "Config"
    }
}

/// Inclusive range check producing a `ConfigError::Range`
pub(crate) fn check_range<T>(field: &str, value: T, min: T, max: T, hint: &str) -> ConfigResult<()>
where
    T: PartialOrd + ToString + Copy,
{
    if value < min || value > max {
        return Err(ConfigError::range_with_hint(field, value, min, max, hint));
    }
    Ok(())
}
