//! Password acceptance policy.
//!
//! Checks run to completion so a rejection reports every violation in
//! one round trip instead of one at a time.

use crate::config::PasswordPolicyConfig;

#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    min_length: usize,
    min_character_classes: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            min_character_classes: 2,
        }
    }
}

impl PasswordPolicy {
    pub fn from_config(config: &PasswordPolicyConfig) -> Self {
        Self {
            min_length: config.min_length,
            min_character_classes: config.min_character_classes.min(4),
        }
    }

    pub fn validate(&self, password: &str) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        if password.chars().count() < self.min_length {
            violations.push(format!(
                "password must be at least {} characters",
                self.min_length
            ));
        }

        let classes = [
            password.chars().any(|c| c.is_ascii_lowercase()),
            password.chars().any(|c| c.is_ascii_uppercase()),
            password.chars().any(|c| c.is_ascii_digit()),
            password.chars().any(|c| !c.is_alphanumeric()),
        ]
        .iter()
        .filter(|present| **present)
        .count();

        if classes < self.min_character_classes {
            violations.push(format!(
                "password must mix at least {} of: lowercase, uppercase, digits, symbols",
                self.min_character_classes
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
