// Adapters layer: concrete collaborators for the worklist controller.

pub mod http;
pub mod inventory;
pub mod rules;

pub use http::HttpLabwareLookup;
pub use inventory::InMemoryInventory;
pub use rules::LabwareRules;
