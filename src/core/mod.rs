pub mod grid;
pub mod ordering;
pub mod selection;
pub mod validators;
pub mod worklist;

pub use crate::domain::model::{
    Address, GridDirection, GridSize, Labware, Slot, SlotGrid, WorklistItem,
};
pub use crate::domain::ports::{BarcodeValidator, BusinessRuleCheck, ItemLookup, LocationLookup};
pub use crate::utils::error::Result;
