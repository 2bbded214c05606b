//! Seat estimates for rectangular seating areas.
//!
//! Each side of an area is measured in seating units of [`UNIT_FEET`]. Units are paired
//! into tables, with a leftover unit rounding up to a table of its own, and every
//! table cell seats [`SEATS_PER_CELL`].

use crate::model::SeatingArea;

pub const UNIT_FEET: u32 = 6;
pub const SEATS_PER_CELL: u64 = 4;

/// `feet / UNIT_FEET`, rounded to the nearest integer with ties rounding up.
fn seating_units(feet: u32) -> u64 {
    (u64::from(feet) + u64::from(UNIT_FEET / 2)) / u64::from(UNIT_FEET)
}

fn paired_units(units: u64) -> u64 {
    if units % 2 != 0 {
        units / 2 + 1
    } else {
        units / 2
    }
}

/// Seats contributed by an area of `length` by `width` feet.
pub fn estimate(length: u32, width: u32) -> u32 {
    let tables_long = paired_units(seating_units(length));
    let tables_wide = paired_units(seating_units(width));
    let seats = tables_long * tables_wide * SEATS_PER_CELL;
    u32::try_from(seats).unwrap_or(u32::MAX)
}

/// Adds the estimate for `area` to `capacity`. Inactive areas contribute nothing.
pub fn accumulate(capacity: u32, area: &SeatingArea) -> u32 {
    match area.dimensions() {
        Some((length, width)) => capacity.saturating_add(estimate(length, width)),
        None => capacity,
    }
}
