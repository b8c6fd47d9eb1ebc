//! Marks every module whose role is not payload: finder-adjacent
//! alignment patterns, the metadata block, and the palette cells.
//! Ported from `fillDataMap`; metadata/palette cells are marked directly
//! by the metadata scanner as it walks each symbol's hop sequence.

use crate::geometry::{DISTANCE_TO_BORDER, MINIMUM_DISTANCE_BETWEEN_ALIGNMENTS};

/// Master symbols get the finder-corner L-shaped extension; slave
/// symbols only get the central cross and diagonal pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Master,
    Slave,
}

/// A `width x height` boolean mask: `true` means the module at that
/// position is reserved (not payload).
#[derive(Clone, Debug)]
pub struct DataMap {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl DataMap {
    pub fn new(width: usize, height: usize) -> Self {
        DataMap {
            width,
            height,
            cells: vec![0u8; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_reserved(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x] != 0
    }

    /// Marks `(x, y)` as reserved; out-of-bounds coordinates (which can
    /// occur near a symbol's border in the diagonal-neighbor marking
    /// below) are silently ignored rather than panicking, matching the
    /// fact that the reference implementation's raw pointer writes never
    /// land outside an allocated symbol for any legal side size.
    pub fn mark(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = 1;
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Marks the alignment-pattern crosses (plus finder-corner
    /// extensions for a master symbol) across the whole grid, ported
    /// from `fillDataMap`.
    pub fn fill_alignment_patterns(&mut self, kind: SymbolKind) {
        let width = self.width as i32;
        let height = self.height as i32;

        let mut number_of_ap_x =
            (width - (DISTANCE_TO_BORDER * 2 - 1)) / MINIMUM_DISTANCE_BETWEEN_ALIGNMENTS - 1;
        let mut number_of_ap_y =
            (height - (DISTANCE_TO_BORDER * 2 - 1)) / MINIMUM_DISTANCE_BETWEEN_ALIGNMENTS - 1;
        number_of_ap_x = number_of_ap_x.max(0) + 2;
        number_of_ap_y = number_of_ap_y.max(0) + 2;

        let ap_distance_x = if number_of_ap_x > 2 {
            (width - (DISTANCE_TO_BORDER * 2 - 1)) as f32 / (number_of_ap_x - 1) as f32
        } else {
            (width - (DISTANCE_TO_BORDER * 2 - 1)) as f32
        };
        let ap_distance_y = if number_of_ap_y > 2 {
            (height - (DISTANCE_TO_BORDER * 2 - 1)) as f32 / (number_of_ap_y - 1) as f32
        } else {
            (height - (DISTANCE_TO_BORDER * 2 - 1)) as f32
        };

        let is_master = matches!(kind, SymbolKind::Master);
        for i in 0..number_of_ap_y {
            for j in 0..number_of_ap_x {
                let x_offset = (DISTANCE_TO_BORDER - 1) + (j as f32 * ap_distance_x) as i32;
                let y_offset = (DISTANCE_TO_BORDER - 1) + (i as f32 * ap_distance_y) as i32;

                self.mark(x_offset, y_offset);
                self.mark(x_offset - 1, y_offset);
                self.mark(x_offset + 1, y_offset);
                self.mark(x_offset, y_offset - 1);
                self.mark(x_offset, y_offset + 1);

                if i == 0 && (j == 0 || j == number_of_ap_x - 1) {
                    self.mark(x_offset - 1, y_offset - 1);
                    self.mark(x_offset + 1, y_offset + 1);
                    if is_master {
                        for (dx, dy) in [(-2, -2), (-1, -2), (0, -2), (-2, -1), (-2, 0)] {
                            self.mark(x_offset + dx, y_offset + dy);
                        }
                        for (dx, dy) in [(2, 2), (1, 2), (0, 2), (2, 1), (2, 0)] {
                            self.mark(x_offset + dx, y_offset + dy);
                        }
                    }
                } else if i == number_of_ap_y - 1 && (j == 0 || j == number_of_ap_x - 1) {
                    self.mark(x_offset + 1, y_offset - 1);
                    self.mark(x_offset - 1, y_offset + 1);
                    if is_master {
                        for (dx, dy) in [(2, -2), (1, -2), (0, -2), (2, -1), (2, 0)] {
                            self.mark(x_offset + dx, y_offset + dy);
                        }
                        for (dx, dy) in [(-2, 2), (-1, 2), (0, 2), (-2, 1), (-2, 0)] {
                            self.mark(x_offset + dx, y_offset + dy);
                        }
                    }
                } else if (i % 2 == 0 && j % 2 == 0) || (i % 2 == 1 && j % 2 == 1) {
                    self.mark(x_offset - 1, y_offset - 1);
                    self.mark(x_offset + 1, y_offset + 1);
                } else {
                    self.mark(x_offset - 1, y_offset + 1);
                    self.mark(x_offset + 1, y_offset - 1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_square_has_no_interior_alignment_patterns() {
        // side = 2*DISTANCE_TO_BORDER - 1 exactly -> number_of_ap == 0 before
        // the +2 for the corner finders, per spec.md's boundary case.
        let side = (2 * DISTANCE_TO_BORDER - 1) as usize;
        let mut map = DataMap::new(side, side);
        map.fill_alignment_patterns(SymbolKind::Master);
        // Only the 4 corner finder crosses plus extensions are marked; no
        // interior cross sits at the grid center.
        let center = side / 2;
        assert!(!map.is_reserved(center, center));
    }

    #[test]
    fn slave_corner_gets_no_l_extension() {
        let mut master = DataMap::new(21, 21);
        master.fill_alignment_patterns(SymbolKind::Master);
        let mut slave = DataMap::new(21, 21);
        slave.fill_alignment_patterns(SymbolKind::Slave);
        // The master's corner L-extension marks strictly more cells.
        let master_count: usize = master.as_slice().iter().map(|&c| c as usize).sum();
        let slave_count: usize = slave.as_slice().iter().map(|&c| c as usize).sum();
        assert!(master_count > slave_count);
    }

    #[test]
    fn mark_ignores_out_of_bounds() {
        let mut map = DataMap::new(5, 5);
        map.mark(-1, -1);
        map.mark(100, 100);
        assert_eq!(map.as_slice().iter().filter(|&&c| c != 0).count(), 0);
    }
}
