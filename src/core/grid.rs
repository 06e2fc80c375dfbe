//! Grid addressing: mapping row/column coordinates to canonical address labels.
//!
//! Rows 1..=26 are lettered (`A` is row 1) and followed by the 1-based column,
//! so row 2 column 3 is `"B3"`. Larger grids fall back to `"row,col"`.

use crate::domain::model::{Address, GridDirection, GridSize, Slot, SlotGrid};
use crate::utils::error::GridError;

const LETTERED_ROWS: u32 = 26;

/// Rows and columns start at 1.
pub fn create_address(row: u32, column: u32) -> Address {
    debug_assert!(row >= 1, "rows start at 1");
    if row > LETTERED_ROWS {
        return format!("{},{}", row, column);
    }
    let letter = char::from(b'A' + row.saturating_sub(1) as u8);
    format!("{}{}", letter, column)
}

/// Every address of the grid, visited in the given order.
pub fn build_addresses(
    size: GridSize,
    direction: GridDirection,
) -> std::result::Result<Vec<Address>, GridError> {
    let rows = 1..=size.num_rows;
    let columns = 1..=size.num_columns;
    let mut addresses = Vec::with_capacity(size.slot_count());

    match direction {
        GridDirection::RightDown => {
            for row in rows {
                for column in columns.clone() {
                    addresses.push(create_address(row, column));
                }
            }
        }
        GridDirection::DownRight => {
            for column in columns {
                for row in rows.clone() {
                    addresses.push(create_address(row, column));
                }
            }
        }
        GridDirection::RightUp => {
            for row in rows.rev() {
                for column in columns.clone() {
                    addresses.push(create_address(row, column));
                }
            }
        }
        GridDirection::LeftUp => {
            for row in rows.rev() {
                for column in columns.clone().rev() {
                    addresses.push(create_address(row, column));
                }
            }
        }
        GridDirection::UpRight => return Err(GridError::UnsupportedDirection(direction)),
    }

    Ok(addresses)
}

/// Parses an address back into its 1-based `(row, column)`.
pub fn decode_address(address: &str) -> std::result::Result<(u32, u32), GridError> {
    let invalid = || GridError::InvalidAddress(address.to_string());

    if let Some((row, column)) = address.split_once(',') {
        let row = row.trim().parse::<u32>().map_err(|_| invalid())?;
        let column = column.trim().parse::<u32>().map_err(|_| invalid())?;
        if row == 0 || column == 0 {
            return Err(invalid());
        }
        return Ok((row, column));
    }

    let mut chars = address.chars();
    let letter = chars.next().filter(char::is_ascii_uppercase).ok_or_else(invalid)?;
    let column = chars.as_str().parse::<u32>().map_err(|_| invalid())?;
    if column == 0 {
        return Err(invalid());
    }
    Ok((letter as u32 - 'A' as u32 + 1, column))
}

/// A grid of the given size with every slot unoccupied, in row-major order.
pub fn empty_slot_grid(size: GridSize) -> std::result::Result<SlotGrid, GridError> {
    let slots = build_addresses(size, GridDirection::RightDown)?
        .into_iter()
        .map(|address| Slot::new(address, false))
        .collect();

    Ok(SlotGrid {
        num_rows: size.num_rows,
        num_columns: size.num_columns,
        slots,
    })
}
