use chronomap_shared::{Bounds, StateFeature};

const GRID_COLS: usize = 50;
const GRID_ROWS: usize = 50;

/// A flat 2D spatial grid over world space for fast state hit-testing at
/// the overview zoom. Built once when the dataset loads. Candidate states
/// are filtered by bounding box through the grid, then confirmed with an
/// exact point-in-polygon test so concave coastlines hover correctly.
pub struct StateGrid {
    cells: Vec<Vec<usize>>,
    bounds: Vec<Bounds>,
    min_x: f64,
    min_y: f64,
    cell_w: f64,
    cell_h: f64,
}

impl StateGrid {
    pub fn build(states: &[StateFeature]) -> Self {
        if states.is_empty() {
            return Self {
                cells: Vec::new(),
                bounds: Vec::new(),
                min_x: 0.0,
                min_y: 0.0,
                cell_w: 1.0,
                cell_h: 1.0,
            };
        }

        // Empty geometry gets an inverted box that never matches a point.
        let empty = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: -1.0,
            max_y: -1.0,
        };
        let state_bounds: Vec<Bounds> = states
            .iter()
            .map(|s| s.geometry.bounds().unwrap_or(empty))
            .collect();

        let Some(world) = states
            .iter()
            .filter_map(|s| s.geometry.bounds())
            .reduce(|a, b| a.union(&b))
        else {
            return Self {
                cells: Vec::new(),
                bounds: Vec::new(),
                min_x: 0.0,
                min_y: 0.0,
                cell_w: 1.0,
                cell_h: 1.0,
            };
        };
        // Small padding to avoid edge issues
        let min_x = world.min_x - 1.0;
        let min_y = world.min_y - 1.0;
        let max_x = world.max_x + 1.0;
        let max_y = world.max_y + 1.0;

        let cell_w = (max_x - min_x) / GRID_COLS as f64;
        let cell_h = (max_y - min_y) / GRID_ROWS as f64;

        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];
        for (idx, b) in state_bounds.iter().enumerate() {
            let col_start = ((b.min_x - min_x) / cell_w).floor().max(0.0) as usize;
            let col_end = ((b.max_x - min_x) / cell_w).ceil().min(GRID_COLS as f64) as usize;
            let row_start = ((b.min_y - min_y) / cell_h).floor().max(0.0) as usize;
            let row_end = ((b.max_y - min_y) / cell_h).ceil().min(GRID_ROWS as f64) as usize;

            for row in row_start..row_end {
                for col in col_start..col_end {
                    cells[row * GRID_COLS + col].push(idx);
                }
            }
        }

        Self {
            cells,
            bounds: state_bounds,
            min_x,
            min_y,
            cell_w,
            cell_h,
        }
    }

    /// Find the state under a world coordinate. Returns its index into the
    /// `states` slice the grid was built from.
    pub fn find_at(&self, states: &[StateFeature], wx: f64, wy: f64) -> Option<usize> {
        if self.cells.is_empty() {
            return None;
        }

        let col = ((wx - self.min_x) / self.cell_w).floor() as isize;
        let row = ((wy - self.min_y) / self.cell_h).floor() as isize;
        if col < 0 || row < 0 || col >= GRID_COLS as isize || row >= GRID_ROWS as isize {
            return None;
        }

        let cell = &self.cells[row as usize * GRID_COLS + col as usize];
        for &idx in cell {
            if self.bounds[idx].contains_point(wx, wy) && states[idx].geometry.contains(wx, wy) {
                return Some(idx);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronomap_shared::Geometry;

    fn rect_state(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> StateFeature {
        StateFeature {
            id: id.to_string(),
            name: format!("State {id}"),
            geometry: Geometry {
                rings: vec![vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]],
            },
        }
    }

    #[test]
    fn finds_state_under_point() {
        let states = vec![
            rect_state("01", 0.0, 0.0, 100.0, 100.0),
            rect_state("02", 200.0, 0.0, 300.0, 100.0),
        ];
        let grid = StateGrid::build(&states);
        assert_eq!(grid.find_at(&states, 50.0, 50.0), Some(0));
        assert_eq!(grid.find_at(&states, 250.0, 50.0), Some(1));
    }

    #[test]
    fn gap_between_states_is_a_miss() {
        let states = vec![
            rect_state("01", 0.0, 0.0, 100.0, 100.0),
            rect_state("02", 200.0, 0.0, 300.0, 100.0),
        ];
        let grid = StateGrid::build(&states);
        assert_eq!(grid.find_at(&states, 150.0, 50.0), None);
    }

    #[test]
    fn outside_world_is_a_miss() {
        let states = vec![rect_state("01", 0.0, 0.0, 100.0, 100.0)];
        let grid = StateGrid::build(&states);
        assert_eq!(grid.find_at(&states, -500.0, -500.0), None);
        assert_eq!(grid.find_at(&states, 5000.0, 50.0), None);
    }

    #[test]
    fn concave_shape_misses_inside_notch() {
        // L-shaped state: bounding box covers the notch but the polygon
        // does not.
        let l_shape = StateFeature {
            id: "01".to_string(),
            name: "Elbow".to_string(),
            geometry: Geometry {
                rings: vec![vec![
                    [0.0, 0.0],
                    [100.0, 0.0],
                    [100.0, 40.0],
                    [40.0, 40.0],
                    [40.0, 100.0],
                    [0.0, 100.0],
                    [0.0, 0.0],
                ]],
            },
        };
        let states = vec![l_shape];
        let grid = StateGrid::build(&states);
        assert_eq!(grid.find_at(&states, 20.0, 20.0), Some(0));
        assert_eq!(grid.find_at(&states, 80.0, 80.0), None, "the notch");
    }

    #[test]
    fn empty_build_is_inert() {
        let states: Vec<StateFeature> = Vec::new();
        let grid = StateGrid::build(&states);
        assert_eq!(grid.find_at(&states, 0.0, 0.0), None);
    }
}
