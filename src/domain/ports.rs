use crate::domain::model::{Address, WorklistItem};
use crate::utils::error::LookupError;
use async_trait::async_trait;

/// Syntactic check run before any lookup. Failures carry user-facing messages.
#[async_trait]
pub trait BarcodeValidator: Send + Sync {
    async fn validate(&self, barcode: &str) -> std::result::Result<(), Vec<String>>;
}

/// Resolves a single scanned barcode to an item.
#[async_trait]
pub trait ItemLookup<I: WorklistItem>: Send + Sync {
    async fn find(&self, barcode: &str) -> std::result::Result<I, LookupError>;
}

/// Resolves a container/location barcode to every item it holds.
#[async_trait]
pub trait LocationLookup<I: WorklistItem>: Send + Sync {
    async fn find_in_location(&self, barcode: &str) -> std::result::Result<Vec<I>, LookupError>;
}

/// Domain checks on a found item. An empty result means the item is acceptable.
#[async_trait]
pub trait BusinessRuleCheck<I: WorklistItem>: Send + Sync {
    async fn check(&self, existing: &[I], candidate: &I) -> Vec<String>;
}

pub type WorklistListener<I> = Box<dyn Fn(&[I]) + Send + Sync>;

pub type SelectionListener = Box<dyn Fn(&[Address]) + Send + Sync>;
