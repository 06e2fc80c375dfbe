use crate::domain::model::WorklistItem;
use crate::domain::ports::{BarcodeValidator, BusinessRuleCheck};
use async_trait::async_trait;
use regex::Regex;

pub const BARCODE_REQUIRED: &str = "Barcode is required";

/// Rejects blank input and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredBarcodeValidator;

#[async_trait]
impl BarcodeValidator for RequiredBarcodeValidator {
    async fn validate(&self, barcode: &str) -> std::result::Result<(), Vec<String>> {
        if barcode.trim().is_empty() {
            return Err(vec![BARCODE_REQUIRED.to_string()]);
        }
        Ok(())
    }
}

/// Requires a barcode that matches a regular expression.
#[derive(Debug, Clone)]
pub struct PatternBarcodeValidator {
    pattern: Regex,
    message: Option<String>,
}

impl PatternBarcodeValidator {
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn mismatch_message(&self, barcode: &str) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => format!("\"{}\" is not a valid barcode", barcode),
        }
    }
}

#[async_trait]
impl BarcodeValidator for PatternBarcodeValidator {
    async fn validate(&self, barcode: &str) -> std::result::Result<(), Vec<String>> {
        RequiredBarcodeValidator.validate(barcode).await?;
        if !self.pattern.is_match(barcode) {
            return Err(vec![self.mismatch_message(barcode)]);
        }
        Ok(())
    }
}

/// Accepts every found item.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl<I: WorklistItem> BusinessRuleCheck<I> for AcceptAll {
    async fn check(&self, _existing: &[I], _candidate: &I) -> Vec<String> {
        Vec::new()
    }
}
