use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical label for one grid position, e.g. `"B3"` or `"27,1"`.
pub type Address = String;

/// Traversal order used to enumerate a grid's addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridDirection {
    RightDown,
    DownRight,
    RightUp,
    LeftUp,
    /// Declared but not supported by address generation.
    UpRight,
}

impl GridDirection {
    /// Column-major orders visit every row of a column before moving on.
    pub fn is_column_major(self) -> bool {
        matches!(self, GridDirection::DownRight)
    }
}

impl fmt::Display for GridDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GridDirection::RightDown => "RightDown",
            GridDirection::DownRight => "DownRight",
            GridDirection::RightUp => "RightUp",
            GridDirection::LeftUp => "LeftUp",
            GridDirection::UpRight => "UpRight",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub num_rows: u32,
    pub num_columns: u32,
}

impl GridSize {
    pub fn new(num_rows: u32, num_columns: u32) -> Self {
        Self {
            num_rows,
            num_columns,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.num_rows as usize * self.num_columns as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub address: Address,
    #[serde(default)]
    pub occupied: bool,
}

impl Slot {
    pub fn new(address: impl Into<Address>, occupied: bool) -> Self {
        Self {
            address: address.into(),
            occupied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    pub num_rows: u32,
    pub num_columns: u32,
    pub slots: Vec<Slot>,
}

impl SlotGrid {
    pub fn size(&self) -> GridSize {
        GridSize::new(self.num_rows, self.num_columns)
    }

    pub fn slot(&self, address: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.address == address)
    }
}

/// Predicate restricting which slots may enter a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectableFilter {
    None,
    #[default]
    Any,
    NonEmpty,
    Empty,
}

impl SelectableFilter {
    pub fn admits(self, slot: &Slot) -> bool {
        match self {
            SelectableFilter::None => false,
            SelectableFilter::Any => true,
            SelectableFilter::NonEmpty => slot.occupied,
            SelectableFilter::Empty => !slot.occupied,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SelectableFilter::None => "none",
            SelectableFilter::Any => "any",
            SelectableFilter::NonEmpty => "non_empty",
            SelectableFilter::Empty => "empty",
        }
    }
}

impl std::str::FromStr for SelectableFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SelectableFilter::None),
            "any" => Ok(SelectableFilter::Any),
            "non_empty" => Ok(SelectableFilter::NonEmpty),
            "empty" => Ok(SelectableFilter::Empty),
            other => Err(format!("unknown selectable filter: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    Single,
    Multi,
}

impl SelectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionMode::Single => "single",
            SelectionMode::Multi => "multi",
        }
    }
}

impl std::str::FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(SelectionMode::Single),
            "multi" => Ok(SelectionMode::Multi),
            other => Err(format!("unknown selection mode: {}", other)),
        }
    }
}

/// Anything that can sit in a worklist. The key is the scanned barcode.
pub trait WorklistItem: Clone + fmt::Debug + Send + Sync + 'static {
    fn key(&self) -> &str;
}

/// A physical container as returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labware {
    pub barcode: String,
    pub labware_type: String,
    pub grid: SlotGrid,
    #[serde(default)]
    pub location: Option<String>,
}

impl WorklistItem for Labware {
    fn key(&self) -> &str {
        &self.barcode
    }
}
