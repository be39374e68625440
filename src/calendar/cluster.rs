use super::util::DAYS_IN_WEEK;
use crate::geometry::CellRef;

/// Row tolerances (in layout pixels) tried from tightest to loosest.  The
/// tightest values matter: some builders offset the first cell of each row
/// by a pixel or three relative to the rest.
pub(crate) const DEFAULT_TOLERANCES: [f64; 5] = [3.0, 5.0, 8.0, 12.0, 20.0];

/// Cells sharing one vertical band, ordered left to right
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Row {
    cells: Vec<CellRef>,
    // Running mean of the cells' `top`
    top: f64,
}

impl Row {
    fn new(cell: CellRef) -> Row {
        let top = cell.top;
        Row {
            cells: vec![cell],
            top,
        }
    }

    fn push(&mut self, cell: CellRef) {
        let n = count_f64(self.cells.len());
        self.top = (self.top * n + cell.top) / (n + 1.0);
        self.cells.push(cell);
    }

    pub(crate) fn cells(&self) -> &[CellRef] {
        &self.cells
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Rows ordered top to bottom.  Nothing guarantees seven cells per row.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Grid {
    rows: Vec<Row>,
}

impl Grid {
    pub(crate) fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// All cells in reading order: rows top to bottom, each left to right
    pub(crate) fn cells(&self) -> impl Iterator<Item = &CellRef> + '_ {
        self.rows.iter().flat_map(Row::cells)
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }
}

/// One way of turning loose cells into rows at a given tolerance, together
/// with the test for whether the result looks like a calendar
pub(crate) trait ClusteringStrategy {
    fn cluster(&self, cells: &[CellRef], tolerance: f64) -> Grid;

    fn accepts(&self, grid: &Grid) -> bool;
}

impl<T: ClusteringStrategy + ?Sized> ClusteringStrategy for &T {
    fn cluster(&self, cells: &[CellRef], tolerance: f64) -> Grid {
        (**self).cluster(cells, tolerance)
    }

    fn accepts(&self, grid: &Grid) -> bool {
        (**self).accepts(grid)
    }
}

/// Greedy single pass over the cells sorted by `top`: a cell joins the
/// current row if it is within `tolerance` of the row's running mean `top`,
/// and otherwise starts a new row.  Accepts grids of exactly
/// `round(N / 7)` rows of seven cells.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct RunningMeanRows;

impl ClusteringStrategy for RunningMeanRows {
    fn cluster(&self, cells: &[CellRef], tolerance: f64) -> Grid {
        let mut sorted = cells.to_vec();
        sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left)));
        let mut rows: Vec<Row> = Vec::new();
        for cell in sorted {
            match rows.last_mut() {
                Some(row) if (cell.top - row.top).abs() <= tolerance => row.push(cell),
                _ => rows.push(Row::new(cell)),
            }
        }
        for row in &mut rows {
            row.cells.sort_by(|a, b| a.left.total_cmp(&b.left));
        }
        rows.sort_by(|a, b| a.top.total_cmp(&b.top));
        Grid { rows }
    }

    fn accepts(&self, grid: &Grid) -> bool {
        grid.rows.len() == expected_rows(grid.cell_count())
            && grid.rows.iter().all(|row| row.len() == DAYS_IN_WEEK)
    }
}

/// The outcome of a [`ToleranceSweep`]
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Clustering {
    pub(crate) grid: Grid,
    /// The tolerance that produced `grid`; `None` only for empty input
    pub(crate) tolerance: Option<f64>,
    /// Whether the strategy accepted `grid` or it is a best-effort fallback
    pub(crate) accepted: bool,
}

/// Runs a [`ClusteringStrategy`] at increasing tolerances and keeps the first
/// accepted grid, or the grid from the loosest tolerance if none is accepted
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ToleranceSweep<S = RunningMeanRows> {
    strategy: S,
    tolerances: Vec<f64>,
}

impl ToleranceSweep<RunningMeanRows> {
    pub(crate) fn new(tolerances: &[f64]) -> Self {
        ToleranceSweep::with_strategy(RunningMeanRows, tolerances)
    }
}

impl Default for ToleranceSweep<RunningMeanRows> {
    fn default() -> Self {
        ToleranceSweep::new(&DEFAULT_TOLERANCES)
    }
}

impl<S: ClusteringStrategy> ToleranceSweep<S> {
    /// Negative and non-finite tolerances are discarded; if nothing is left,
    /// [`DEFAULT_TOLERANCES`] are used instead.
    pub(crate) fn with_strategy(strategy: S, tolerances: &[f64]) -> Self {
        let mut tolerances = tolerances
            .iter()
            .copied()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .collect::<Vec<_>>();
        if tolerances.is_empty() {
            tolerances = DEFAULT_TOLERANCES.to_vec();
        }
        tolerances.sort_by(f64::total_cmp);
        ToleranceSweep {
            strategy,
            tolerances,
        }
    }

    pub(crate) fn tolerances(&self) -> &[f64] {
        &self.tolerances
    }

    pub(crate) fn run(&self, cells: &[CellRef]) -> Clustering {
        let mut outcome = Clustering {
            grid: Grid::default(),
            tolerance: None,
            accepted: false,
        };
        if cells.is_empty() {
            return outcome;
        }
        for &tolerance in &self.tolerances {
            let grid = self.strategy.cluster(cells, tolerance);
            let accepted = self.strategy.accepts(&grid);
            outcome = Clustering {
                grid,
                tolerance: Some(tolerance),
                accepted,
            };
            if accepted {
                break;
            }
        }
        outcome
    }
}

/// `round(n / 7)`, but never less than one
fn expected_rows(n: usize) -> usize {
    ((n + 3) / DAYS_IN_WEEK).max(1)
}

fn count_f64(n: usize) -> f64 {
    f64::from(u32::try_from(n).unwrap_or(u32::MAX))
}
