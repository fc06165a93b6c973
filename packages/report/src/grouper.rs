//! Partitions extracted table grids into per-device row runs.
//!
//! Reports list devices one after another; each device starts with a grid
//! whose first cell reads "Device Information". Everything up to the next
//! such grid belongs to the same device.

use std::num::NonZeroUsize;

use rmm_audit_report_models::{Row, TableGrid};

/// How grids are split into device groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupingMode {
    /// Start a new group at every "Device Information" grid.
    #[default]
    Sentinel,
    /// Start a new group every `n` grids regardless of content.
    ///
    /// Position-dependent compatibility mode for report exports that lost
    /// their section headers. Breaks as soon as a device has an unexpected
    /// number of tables.
    FixedChunks(NonZeroUsize),
}

/// The concatenated rows of one device's grids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowGroup {
    /// Rows of every grid in the group, in source order.
    pub rows: Vec<Row>,
    /// `true` for rows seen before the first sentinel. These usually come
    /// from a cover or summary page and do not describe a device.
    pub is_preamble: bool,
}

impl RowGroup {
    const fn device() -> Self {
        Self {
            rows: Vec::new(),
            is_preamble: false,
        }
    }

    const fn preamble() -> Self {
        Self {
            rows: Vec::new(),
            is_preamble: true,
        }
    }
}

/// Groups grids using the given [`GroupingMode`].
#[must_use]
pub fn group(grids: &[TableGrid], mode: GroupingMode) -> Vec<RowGroup> {
    match mode {
        GroupingMode::Sentinel => group_by_device(grids),
        GroupingMode::FixedChunks(size) => group_fixed_chunks(grids, size),
    }
}

/// Splits grids at every "Device Information" header grid.
///
/// Empty grids are ignored. Grids before the first header form a single
/// leading group flagged with [`RowGroup::is_preamble`], so an input
/// without any header produces at most one group.
#[must_use]
pub fn group_by_device(grids: &[TableGrid]) -> Vec<RowGroup> {
    let mut groups = Vec::new();
    let mut current: Option<RowGroup> = None;

    for grid in grids.iter().filter(|grid| !grid.is_empty()) {
        if grid.is_device_header() {
            groups.extend(current.take());
            current = Some(RowGroup::device());
        }

        current
            .get_or_insert_with(RowGroup::preamble)
            .rows
            .extend(grid.rows.iter().cloned());
    }

    groups.extend(current);
    groups
}

/// Splits grids into consecutive groups of `size` grids.
#[must_use]
pub fn group_fixed_chunks(grids: &[TableGrid], size: NonZeroUsize) -> Vec<RowGroup> {
    grids
        .chunks(size.get())
        .map(|chunk| RowGroup {
            rows: chunk.iter().flat_map(|grid| grid.rows.iter().cloned()).collect(),
            is_preamble: false,
        })
        .collect()
}
