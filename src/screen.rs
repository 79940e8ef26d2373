//! Row-region bookkeeping for mounted visuals.

use std::collections::BTreeMap;

use crate::error::{LoopError, Result};
use crate::writer::TerminalWriter;

/// A half-open row range `[top, bottom)` owned by exactly one visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub top: u16,
    pub bottom: u16,
}

impl Region {
    pub fn new(top: u16, bottom: u16) -> Self {
        Region { top, bottom }
    }

    pub fn height(&self) -> u16 {
        self.bottom.saturating_sub(self.top)
    }

    fn overlaps(&self, other: &Region) -> bool {
        self.top < other.bottom && other.top < self.bottom
    }
}

/// Tracks the disjoint regions currently allocated, keyed by visual name.
///
/// Regions are recomputed from scratch in mount order on every
/// [`ScreenManager::reallocate`] call; nothing about a stale region ever
/// survives a resize.
#[derive(Debug, Default)]
pub struct ScreenManager {
    regions: BTreeMap<String, Region>,
}

impl ScreenManager {
    pub fn new() -> Self {
        ScreenManager {
            regions: BTreeMap::new(),
        }
    }

    /// Record a new region for `name`. Fails with [`LoopError::RegionConflict`]
    /// if it overlaps an existing allocation; the Main Loop is expected to
    /// retry with a fresh `top` on that error, so this never surfaces to a
    /// public caller.
    pub fn allocate(&mut self, name: &str, region: Region) -> Result<()> {
        for existing in self.regions.values() {
            if existing.overlaps(&region) {
                return Err(LoopError::RegionConflict {
                    top: region.top,
                    bottom: region.bottom,
                });
            }
        }
        self.regions.insert(name.to_string(), region);
        Ok(())
    }

    pub fn region_of(&self, name: &str) -> Option<Region> {
        self.regions.get(name).copied()
    }

    /// Emit a cursor-move + clear-line for each row the region covers, then
    /// drop the allocation. Used when a visual unmounts.
    pub fn clear(&mut self, writer: &TerminalWriter, name: &str) -> std::io::Result<()> {
        if let Some(region) = self.regions.remove(name) {
            for row in region.top..region.bottom {
                writer.write(format!("\x1b[{};1H\x1b[2K", row + 1).as_bytes())?;
            }
        }
        Ok(())
    }

    /// Recompute every region top-down in `order`, each requesting
    /// `height` rows, clipping or dropping regions that would fall past
    /// `rows`. Returns the set of names whose region was dropped entirely
    /// so the Main Loop can skip them on the next frame.
    ///
    /// Packing is sequential and monotonic, so [`ScreenManager::allocate`]
    /// should never actually conflict here; it is still the only way a
    /// region is recorded, so a conflict retries once with the next row
    /// down rather than silently trusting the packing math.
    pub fn reallocate(
        &mut self,
        order: &[(String, u16)],
        rows: u16,
    ) -> Vec<String> {
        self.regions.clear();
        let mut dropped = Vec::new();
        let mut top = 0u16;
        for (name, height) in order {
            if top >= rows {
                dropped.push(name.clone());
                continue;
            }
            let bottom = (top + height).min(rows);
            match self.allocate(name, Region::new(top, bottom)) {
                Ok(()) => top = bottom,
                Err(LoopError::RegionConflict { .. }) if top + 1 < rows => {
                    let retry_top = top + 1;
                    let retry_bottom = (retry_top + height).min(rows);
                    match self.allocate(name, Region::new(retry_top, retry_bottom)) {
                        Ok(()) => top = retry_bottom,
                        Err(_) => dropped.push(name.clone()),
                    }
                }
                Err(_) => dropped.push(name.clone()),
            }
        }
        dropped
    }
}
