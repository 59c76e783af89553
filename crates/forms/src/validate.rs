//! Submit-time field validation.
//!
//! A [`Validator`] walks the fields of a form and collects one message per
//! failing field (the first rule that fails wins). Pattern rules skip empty
//! values so optional fields only get checked when filled in.
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationErrors;

pub static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("hardcoded regex should be valid"));
pub static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("hardcoded regex should be valid"));
pub static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9\-_ ]*$").expect("hardcoded regex should be valid")
});
pub static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("hardcoded regex should be valid"));
pub static PIN_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("hardcoded regex should be valid"));
pub static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("hardcoded regex should be valid")
});

pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts checking a text field.
    pub fn field<'v>(&'v mut self, field: &'static str, value: &'v str) -> FieldCheck<'v> {
        FieldCheck {
            validator: self,
            field,
            value,
            failed: false,
        }
    }

    /// Records `message` for `field` unless `ok` holds.
    pub fn check(&mut self, field: &'static str, ok: bool, message: &str) -> &mut Self {
        if !ok && self.errors.get(field).is_none() {
            self.errors.push(field, message);
        }
        self
    }

    /// Shorthand for a required selection.
    pub fn require<T>(&mut self, field: &'static str, value: Option<T>, message: &str) -> &mut Self {
        self.check(field, value.is_some(), message)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        self.errors.into_result()
    }
}

/// Rules applied to one text field, short-circuiting at the first failure.
pub struct FieldCheck<'v> {
    validator: &'v mut Validator,
    field: &'static str,
    value: &'v str,
    failed: bool,
}

impl FieldCheck<'_> {
    pub fn required(self, message: &str) -> Self {
        let ok = !self.value.trim().is_empty();
        self.rule(ok, message)
    }

    pub fn pattern(self, pattern: &Regex, message: &str) -> Self {
        let ok = self.value.is_empty() || pattern.is_match(self.value);
        self.rule(ok, message)
    }

    pub fn min_chars(self, min: usize, message: &str) -> Self {
        let ok = self.value.chars().count() >= min;
        self.rule(ok, message)
    }

    /// Equality with another field (password confirmation).
    pub fn equals(self, other: &str, message: &str) -> Self {
        let ok = self.value == other;
        self.rule(ok, message)
    }

    /// An arbitrary predicate on the value.
    pub fn satisfies(self, predicate: impl FnOnce(&str) -> bool, message: &str) -> Self {
        let ok = self.failed || self.value.is_empty() || predicate(self.value);
        self.rule(ok, message)
    }

    fn rule(mut self, ok: bool, message: &str) -> Self {
        if !self.failed && !ok {
            self.validator.errors.push(self.field, message);
            self.failed = true;
        }
        self
    }
}
