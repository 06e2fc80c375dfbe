use crate::core::grid::{decode_address, empty_slot_grid};
use crate::domain::model::{GridSize, Labware};
use crate::domain::ports::{ItemLookup, LocationLookup};
use crate::utils::error::{GridError, LookupError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Largest row or column count accepted from an inventory file.
pub const MAX_GRID_DIMENSION: u32 = 1000;

/// One CSV row: `barcode,labware_type,num_rows,num_columns,occupied,location`.
/// `occupied` lists addresses separated by spaces.
#[derive(Debug, Deserialize)]
struct InventoryRow {
    barcode: String,
    labware_type: String,
    num_rows: u32,
    num_columns: u32,
    #[serde(default)]
    occupied: String,
    #[serde(default)]
    location: Option<String>,
}

impl InventoryRow {
    fn into_labware(self) -> Result<Labware> {
        if self.num_rows > MAX_GRID_DIMENSION || self.num_columns > MAX_GRID_DIMENSION {
            return Err(GridError::TooLarge {
                rows: self.num_rows,
                columns: self.num_columns,
                max: MAX_GRID_DIMENSION,
            }
            .into());
        }
        let mut grid = empty_slot_grid(GridSize::new(self.num_rows, self.num_columns))?;

        for address in self.occupied.split_whitespace() {
            decode_address(address)?;
            let slot = grid
                .slots
                .iter_mut()
                .find(|slot| slot.address == address)
                .ok_or_else(|| {
                    GridError::InvalidAddress(format!("{} (outside {})", address, self.barcode))
                })?;
            slot.occupied = true;
        }

        Ok(Labware {
            barcode: self.barcode,
            labware_type: self.labware_type,
            grid,
            location: self.location.filter(|location| !location.trim().is_empty()),
        })
    }
}

/// Labware held in memory, loaded from a CSV export of the inventory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    labware: Vec<Labware>,
}

impl InMemoryInventory {
    pub fn new(labware: Vec<Labware>) -> Self {
        Self { labware }
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut labware = Vec::new();
        for row in reader.deserialize::<InventoryRow>() {
            labware.push(row?.into_labware()?);
        }
        tracing::debug!("Loaded {} labware into the inventory", labware.len());
        Ok(Self { labware })
    }

    pub fn len(&self) -> usize {
        self.labware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labware.is_empty()
    }
}

#[async_trait]
impl ItemLookup<Labware> for InMemoryInventory {
    async fn find(&self, barcode: &str) -> std::result::Result<Labware, LookupError> {
        self.labware
            .iter()
            .find(|labware| labware.barcode == barcode)
            .cloned()
            .ok_or_else(|| {
                LookupError::new(format!(
                    "Labware lookup : No labware found with barcode: {}",
                    barcode
                ))
            })
    }
}

#[async_trait]
impl LocationLookup<Labware> for InMemoryInventory {
    async fn find_in_location(
        &self,
        barcode: &str,
    ) -> std::result::Result<Vec<Labware>, LookupError> {
        Ok(self
            .labware
            .iter()
            .filter(|labware| labware.location.as_deref() == Some(barcode))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ConsoleError;

    const HEADER: &str = "barcode,labware_type,num_rows,num_columns,occupied,location";

    const INVENTORY: &str = "\
barcode,labware_type,num_rows,num_columns,occupied,location
STAN-0001,Tube,1,1,A1,STO-1
STAN-0002,Slide,4,1,A1 C1,STO-1
STAN-0003,Plate,2,3,,
";

    #[tokio::test]
    async fn test_loads_rows_and_finds_by_barcode() {
        let inventory = InMemoryInventory::from_csv_reader(INVENTORY.as_bytes()).unwrap();
        assert_eq!(inventory.len(), 3);

        let slide = inventory.find("STAN-0002").await.unwrap();
        assert_eq!(slide.labware_type, "Slide");
        let occupied: Vec<&str> = slide
            .grid
            .slots
            .iter()
            .filter(|slot| slot.occupied)
            .map(|slot| slot.address.as_str())
            .collect();
        assert_eq!(occupied, vec!["A1", "C1"]);

        let plate = inventory.find("STAN-0003").await.unwrap();
        assert_eq!(plate.location, None);
        assert_eq!(plate.grid.slots.len(), 6);
    }

    #[tokio::test]
    async fn test_unknown_barcode_reason() {
        let inventory = InMemoryInventory::from_csv_reader(INVENTORY.as_bytes()).unwrap();
        let error = inventory.find("STAN-9999").await.unwrap_err();
        assert_eq!(error.reason(), "No labware found with barcode: STAN-9999");
    }

    #[tokio::test]
    async fn test_location_lookup() {
        let inventory = InMemoryInventory::from_csv_reader(INVENTORY.as_bytes()).unwrap();
        let stored = inventory.find_in_location("STO-1").await.unwrap();
        let barcodes: Vec<&str> = stored.iter().map(|l| l.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["STAN-0001", "STAN-0002"]);
        assert!(inventory.find_in_location("STO-2").await.unwrap().is_empty());
    }

    #[test]
    fn test_rejects_addresses_outside_the_grid() {
        let csv = format!("{}\nSTAN-1,Tube,1,1,B4,\n", HEADER);
        assert!(InMemoryInventory::from_csv_reader(csv.as_bytes()).is_err());

        let csv = format!("{}\nSTAN-1,Tube,1,1,??,\n", HEADER);
        assert!(matches!(
            InMemoryInventory::from_csv_reader(csv.as_bytes()),
            Err(ConsoleError::GridError(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_grids() {
        let csv = format!("{}\nSTAN-1,Tube,4000000000,4000000000,,\n", HEADER);
        assert!(matches!(
            InMemoryInventory::from_csv_reader(csv.as_bytes()),
            Err(ConsoleError::GridError(GridError::TooLarge { max: MAX_GRID_DIMENSION, .. }))
        ));

        let csv = format!("{}\nSTAN-1,Plate,1000,1,,\n", HEADER);
        let inventory = InMemoryInventory::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(inventory.len(), 1);
    }
}
