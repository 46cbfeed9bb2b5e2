//! Uniform spatial hash for broad-phase collision
//!
//! Rebuilt from scratch every frame. Cells store indices into the entity
//! list, so the grid is only valid until that list changes.

use std::collections::HashMap;

use crate::Rect;

use super::state::Entity;

pub type CellKey = (i32, i32);

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    inv_cell_size: f32,
    cell_capacity: usize,
    cells: HashMap<CellKey, Vec<usize>>,
    /// Insertions rejected by full cells since the last rebuild
    overflowed: usize,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, cell_capacity: usize) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cell_capacity,
            cells: HashMap::new(),
            overflowed: 0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Floor-quantised cell of a point (negative coordinates included)
    #[inline]
    pub fn cell_of(&self, x: f32, y: f32) -> CellKey {
        (
            (x * self.inv_cell_size).floor() as i32,
            (y * self.inv_cell_size).floor() as i32,
        )
    }

    /// Cells a rectangle overlaps, as an inclusive key range
    fn cell_range(&self, r: &Rect) -> (CellKey, CellKey) {
        (self.cell_of(r.x, r.y), self.cell_of(r.right(), r.bottom()))
    }

    /// Empty every cell. Cells left empty since the previous clear are
    /// dropped so the map tracks the occupied area.
    pub fn clear(&mut self) {
        self.cells.retain(|_, items| !items.is_empty());
        for items in self.cells.values_mut() {
            items.clear();
        }
        self.overflowed = 0;
    }

    /// Insert `index` into every cell `bounds` overlaps.
    /// Returns false if any cell was already full.
    pub fn insert(&mut self, index: usize, bounds: &Rect) -> bool {
        let ((x0, y0), (x1, y1)) = self.cell_range(bounds);
        let mut complete = true;
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                let items = self.cells.entry((cx, cy)).or_default();
                if items.len() >= self.cell_capacity {
                    complete = false;
                    continue;
                }
                items.push(index);
            }
        }
        if !complete {
            self.overflowed += 1;
        }
        complete
    }

    /// Clear and re-insert every entity
    pub fn rebuild(&mut self, entities: &[Entity]) {
        self.clear();
        for (index, entity) in entities.iter().enumerate() {
            self.insert(index, &entity.bounds());
        }
        if self.overflowed > 0 {
            log::debug!("Spatial grid: {} entities hit full cells", self.overflowed);
        }
    }

    /// Collect indices from every cell `area` overlaps, sorted and deduplicated
    pub fn query_into(&self, area: &Rect, out: &mut Vec<usize>) {
        out.clear();
        let ((x0, y0), (x1, y1)) = self.cell_range(area);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(items) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(items);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
    }

    #[inline]
    pub fn overflowed(&self) -> usize {
        self.overflowed
    }

    /// Cells holding at least one entity
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|items| !items.is_empty()).count()
    }
}
