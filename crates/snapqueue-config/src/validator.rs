//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_store(config, &mut result);
        Self::validate_uploader(config, &mut result);
        Self::validate_processor(config, &mut result);
        Self::validate_inbox(config, &mut result);

        Ok(result)
    }

    fn validate_store(config: &Config, result: &mut ValidationResult) {
        if config.store.backend.is_durable() && config.store.path.as_os_str().is_empty() {
            result.add_error(ValidationError::new(
                "store.path",
                "path cannot be empty for a durable backend",
            ));
        }

        if !config.store.backend.is_durable() {
            result.add_warning(ValidationWarning::new(
                "store.backend",
                "memory backend loses queued photos on restart",
            ));
        }
    }

    fn validate_uploader(config: &Config, result: &mut ValidationResult) {
        if config.uploader.public_key.trim().is_empty() {
            result.add_error(ValidationError::new(
                "uploader.public_key",
                "public_key must be set (e.g. public_key = \"${UPLOADCARE_PUBLIC_KEY}\")",
            ));
        }

        for (field, url) in [
            ("uploader.base_url", &config.uploader.base_url),
            ("uploader.cdn_base", &config.uploader.cdn_base),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                result.add_error(ValidationError::new(
                    field,
                    "URL must start with http:// or https://",
                ));
            }
        }

        if config.uploader.timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "uploader.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_processor(config: &Config, result: &mut ValidationResult) {
        if config.processor.retry_delay_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "processor.retry_delay_ms",
                "retry delay is 0, a failing upload will be retried in a tight loop",
            ));
        }
    }

    fn validate_inbox(config: &Config, result: &mut ValidationResult) {
        if config.inbox.patterns.is_empty() {
            result.add_warning(ValidationWarning::new(
                "inbox.patterns",
                "no patterns configured, every file in the inbox will be enqueued",
            ));
        }

        for pattern in &config.inbox.patterns {
            if let Err(e) = glob::Pattern::new(pattern) {
                result.add_error(ValidationError::new(
                    "inbox.patterns",
                    format!("Invalid pattern '{}': {}", pattern, e),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
