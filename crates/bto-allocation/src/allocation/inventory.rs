//! Per-project flat inventory.
//!
//! Each project carries one [`FlatTypeInfo`] cell per flat type it offers. Only
//! `remaining_units` moves at runtime: bookings take exactly one unit through
//! [`FlatTypeInfo::reserve`] and approved withdrawals of booked flats hand exactly one
//! back through [`FlatTypeInfo::release`]. Both operations need `&mut` access, so the
//! availability check and the decrement happen in a single step for whoever holds the
//! project.

use serde::{Deserialize, Serialize};

use super::domain::{FlatAvailability, FlatType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("project does not offer {0} flats")]
    NotOffered(FlatType),
    #[error("no {0} units remaining")]
    Exhausted(FlatType),
    #[error("{flat_type} configured more than once")]
    DuplicateFlatType { flat_type: FlatType },
    #[error("{flat_type} has {remaining} remaining units but only {total} in total")]
    RemainingExceedsTotal {
        flat_type: FlatType,
        remaining: u32,
        total: u32,
    },
}

/// Unit counts and pricing for one flat type within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredFlatTypeInfo")]
pub struct FlatTypeInfo {
    flat_type: FlatType,
    total_units: u32,
    remaining_units: u32,
    price: u32,
}

impl FlatTypeInfo {
    /// Fresh cell with every unit still available.
    pub fn new(flat_type: FlatType, total_units: u32, price: u32) -> Self {
        Self {
            flat_type,
            total_units,
            remaining_units: total_units,
            price,
        }
    }

    /// Rebuild a cell from stored counts.
    pub fn restore(
        flat_type: FlatType,
        total_units: u32,
        remaining_units: u32,
        price: u32,
    ) -> Result<Self, InventoryError> {
        if remaining_units > total_units {
            return Err(InventoryError::RemainingExceedsTotal {
                flat_type,
                remaining: remaining_units,
                total: total_units,
            });
        }

        Ok(Self {
            flat_type,
            total_units,
            remaining_units,
            price,
        })
    }

    pub fn flat_type(&self) -> FlatType {
        self.flat_type
    }

    pub fn total_units(&self) -> u32 {
        self.total_units
    }

    pub fn remaining_units(&self) -> u32 {
        self.remaining_units
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    pub fn has_available(&self) -> bool {
        self.remaining_units > 0
    }

    /// Take one unit, returning `false` when none remain.
    pub fn reserve(&mut self) -> bool {
        match self.remaining_units.checked_sub(1) {
            Some(remaining) => {
                self.remaining_units = remaining;
                true
            }
            None => false,
        }
    }

    /// Return one unit. Never exceeds `total_units`.
    pub fn release(&mut self) {
        if self.remaining_units < self.total_units {
            self.remaining_units += 1;
        }
    }

    pub fn availability(&self) -> FlatAvailability {
        FlatAvailability {
            flat_type: self.flat_type,
            remaining_units: self.remaining_units,
            total_units: self.total_units,
            price: self.price,
        }
    }
}

/// Stored form of a cell; loading goes through [`FlatTypeInfo::restore`].
#[derive(Deserialize)]
struct StoredFlatTypeInfo {
    flat_type: FlatType,
    total_units: u32,
    remaining_units: u32,
    price: u32,
}

impl TryFrom<StoredFlatTypeInfo> for FlatTypeInfo {
    type Error = InventoryError;

    fn try_from(stored: StoredFlatTypeInfo) -> Result<Self, Self::Error> {
        Self::restore(
            stored.flat_type,
            stored.total_units,
            stored.remaining_units,
            stored.price,
        )
    }
}

/// All inventory cells of a single project, keyed by flat type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FlatTypeInfo>", into = "Vec<FlatTypeInfo>")]
pub struct FlatInventory {
    cells: Vec<FlatTypeInfo>,
}

impl TryFrom<Vec<FlatTypeInfo>> for FlatInventory {
    type Error = InventoryError;

    fn try_from(cells: Vec<FlatTypeInfo>) -> Result<Self, Self::Error> {
        Self::new(cells)
    }
}

impl From<FlatInventory> for Vec<FlatTypeInfo> {
    fn from(inventory: FlatInventory) -> Self {
        inventory.cells
    }
}

impl FlatInventory {
    pub fn new(cells: Vec<FlatTypeInfo>) -> Result<Self, InventoryError> {
        let mut sorted: Vec<FlatTypeInfo> = Vec::with_capacity(cells.len());
        for cell in cells {
            if sorted.iter().any(|existing| existing.flat_type == cell.flat_type) {
                return Err(InventoryError::DuplicateFlatType {
                    flat_type: cell.flat_type,
                });
            }
            sorted.push(cell);
        }
        sorted.sort_by_key(|cell| cell.flat_type);

        Ok(Self { cells: sorted })
    }

    pub fn cell(&self, flat_type: FlatType) -> Option<&FlatTypeInfo> {
        self.cells.iter().find(|cell| cell.flat_type == flat_type)
    }

    fn cell_mut(&mut self, flat_type: FlatType) -> Result<&mut FlatTypeInfo, InventoryError> {
        self.cells
            .iter_mut()
            .find(|cell| cell.flat_type == flat_type)
            .ok_or(InventoryError::NotOffered(flat_type))
    }

    pub fn offers(&self, flat_type: FlatType) -> bool {
        self.cell(flat_type).is_some()
    }

    pub fn flat_types(&self) -> impl Iterator<Item = FlatType> + '_ {
        self.cells.iter().map(|cell| cell.flat_type)
    }

    pub fn cells(&self) -> &[FlatTypeInfo] {
        &self.cells
    }

    pub fn has_available(&self, flat_type: FlatType) -> bool {
        self.cell(flat_type)
            .map(FlatTypeInfo::has_available)
            .unwrap_or(false)
    }

    pub fn remaining_units(&self, flat_type: FlatType) -> Option<u32> {
        self.cell(flat_type).map(FlatTypeInfo::remaining_units)
    }

    pub fn reserve(&mut self, flat_type: FlatType) -> Result<(), InventoryError> {
        if self.cell_mut(flat_type)?.reserve() {
            Ok(())
        } else {
            Err(InventoryError::Exhausted(flat_type))
        }
    }

    pub fn release(&mut self, flat_type: FlatType) -> Result<(), InventoryError> {
        self.cell_mut(flat_type)?.release();
        Ok(())
    }

    pub fn availability(&self) -> Vec<FlatAvailability> {
        self.cells.iter().map(FlatTypeInfo::availability).collect()
    }
}
