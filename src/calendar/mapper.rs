use super::cluster::Grid;
use super::util::{first_of_month, iter_days_from, same_month};
use crate::config::WeekStart;
use crate::geometry::CellRef;
use time::{Date, Duration};

/// How a cell relates to the month being painted
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) struct CellStyle {
    pub(crate) in_month: bool,
    pub(crate) is_target_day: bool,
}

impl CellStyle {
    pub(crate) fn for_date(date: Date, target: Date) -> CellStyle {
        CellStyle {
            in_month: same_month(date, target),
            is_target_day: date == target,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AssignedCell {
    pub(crate) cell: CellRef,
    pub(crate) date: Date,
    pub(crate) style: CellStyle,
}

/// Grid cells in reading order, each paired with its calendar date
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DateAssignment {
    start: Option<Date>,
    cells: Vec<AssignedCell>,
}

impl DateAssignment {
    /// The date of the first grid cell
    pub(crate) fn start(&self) -> Option<Date> {
        self.start
    }

    pub(crate) fn cells(&self) -> &[AssignedCell] {
        &self.cells
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn target_cells(&self) -> impl Iterator<Item = &AssignedCell> + '_ {
        self.cells.iter().filter(|ac| ac.style.is_target_day)
    }
}

/// The first date shown by a grid for `target`'s month: the week start on or
/// before the 1st of the month.  `None` if that lies before the beginning of
/// time.
pub(crate) fn grid_start(target: Date, week_start: WeekStart) -> Option<Date> {
    let first = first_of_month(target);
    let offset = week_start.column_of(first.weekday());
    first.checked_sub(Duration::days(i64::from(offset)))
}

/// Assigns consecutive dates to the cells of `grid` in reading order,
/// starting at [`grid_start`].  Row lengths are not checked: a short or
/// ragged grid simply receives fewer dates.
pub(crate) fn map_dates(target: Date, grid: &Grid, week_start: WeekStart) -> DateAssignment {
    let Some(start) = grid_start(target, week_start) else {
        return DateAssignment::default();
    };
    let cells = std::iter::zip(grid.cells(), iter_days_from(start))
        .map(|(cell, date)| AssignedCell {
            cell: cell.clone(),
            date,
            style: CellStyle::for_date(date, target),
        })
        .collect();
    DateAssignment {
        start: Some(start),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::cluster::tests::{scramble, synthetic_cells};
    use crate::calendar::cluster::ToleranceSweep;
    use crate::calendar::util::DAYS_IN_WEEK;
    use proptest::prelude::*;
    use test_case::test_case;
    use time::macros::date;
    use time::Month;

    fn six_week_grid() -> Grid {
        ToleranceSweep::default()
            .run(&scramble(synthetic_cells(6, |_, _| 0.0)))
            .grid
    }

    fn cell_at(assignment: &DateAssignment, row: usize, col: usize) -> &AssignedCell {
        &assignment.cells()[row * DAYS_IN_WEEK + col]
    }

    #[test]
    fn test_target_day_position() {
        let target = date!(2026 - 04 - 18);
        let assignment = map_dates(target, &six_week_grid(), WeekStart::Monday);
        assert_eq!(assignment.start(), Some(date!(2026 - 03 - 30)));
        assert_eq!(assignment.len(), 42);
        let targets = assignment.target_cells().collect::<Vec<_>>();
        assert_eq!(targets.len(), 1);
        // Saturday is the sixth column of a Monday-first week
        assert_eq!(targets[0].cell.id, "r2c5");
        assert_eq!(targets[0].date, target);
        assert_eq!(cell_at(&assignment, 2, 5).date, target);
        assert!(!cell_at(&assignment, 2, 6).style.is_target_day);
    }

    #[test]
    fn test_out_of_month_boundaries() {
        let assignment = map_dates(date!(2026 - 04 - 18), &six_week_grid(), WeekStart::Monday);
        let first_two = &assignment.cells()[..2];
        assert_eq!(
            first_two.iter().map(|ac| ac.date).collect::<Vec<_>>(),
            vec![date!(2026 - 03 - 30), date!(2026 - 03 - 31)]
        );
        assert!(first_two.iter().all(|ac| !ac.style.in_month));
        assert!(cell_at(&assignment, 0, 2).style.in_month);
        assert_eq!(cell_at(&assignment, 0, 2).date, date!(2026 - 04 - 01));
        // April ends on Thursday of the fifth week; the sixth week is all May
        assert_eq!(cell_at(&assignment, 4, 3).date, date!(2026 - 04 - 30));
        assert!(!cell_at(&assignment, 4, 4).style.in_month);
        let last_row = &assignment.cells()[35..];
        assert!(last_row.iter().all(|ac| ac.date.month() == Month::May));
        assert!(last_row.iter().all(|ac| !ac.style.in_month));
        let in_month = assignment
            .cells()
            .iter()
            .filter(|ac| ac.style.in_month)
            .count();
        assert_eq!(in_month, 30);
    }

    #[test_case(date!(2026 - 04 - 18), 2 ; "April 2026 starts on Wednesday")]
    #[test_case(date!(2024 - 02 - 29), 3 ; "leap February")]
    #[test_case(date!(2026 - 06 - 01), 0 ; "June 2026 starts on Monday")]
    #[test_case(date!(2026 - 03 - 31), 6 ; "March 2026 starts on Sunday")]
    fn test_first_of_month_column(target: Date, column: usize) {
        let assignment = map_dates(target, &six_week_grid(), WeekStart::Monday);
        let first = assignment
            .cells()
            .iter()
            .find(|ac| ac.date.day() == 1 && ac.date.month() == target.month())
            .unwrap();
        assert_eq!(first.cell.id, format!("r0c{column}"));
    }

    #[test]
    fn test_sunday_start() {
        let assignment = map_dates(date!(2026 - 04 - 18), &six_week_grid(), WeekStart::Sunday);
        assert_eq!(assignment.start(), Some(date!(2026 - 03 - 29)));
        assert_eq!(cell_at(&assignment, 0, 3).date, date!(2026 - 04 - 01));
        assert_eq!(assignment.target_cells().next().unwrap().cell.id, "r2c6");
    }

    #[test]
    fn test_missing_cell_still_consecutive() {
        let mut cells = synthetic_cells(6, |_, _| 0.0);
        cells.remove(40);
        let grid = ToleranceSweep::default().run(&cells).grid;
        let assignment = map_dates(date!(2026 - 04 - 18), &grid, WeekStart::Monday);
        assert_eq!(assignment.len(), 41);
        for pair in assignment.cells().windows(2) {
            assert_eq!(pair[0].date.next_day(), Some(pair[1].date));
        }
    }

    #[test]
    fn test_empty_grid() {
        let assignment = map_dates(date!(2026 - 04 - 18), &Grid::default(), WeekStart::Monday);
        assert!(assignment.is_empty());
        assert_eq!(assignment.start(), Some(date!(2026 - 03 - 30)));
    }

    #[test]
    fn test_end_of_time() {
        let assignment = map_dates(Date::MAX, &six_week_grid(), WeekStart::Monday);
        assert!(assignment.len() < 42);
        assert_eq!(assignment.cells().last().map(|ac| ac.date), Some(Date::MAX));
    }

    proptest! {
        #[test]
        fn prop_first_lands_on_its_weekday(
            year in 1900i32..2200,
            month in 1u8..=12,
            day in 1u8..=28,
        ) {
            let month = Month::try_from(month).unwrap();
            let target = Date::from_calendar_date(year, month, day).unwrap();
            let assignment = map_dates(target, &six_week_grid(), WeekStart::Monday);
            prop_assert_eq!(assignment.len(), 42);
            let first = assignment
                .cells()
                .iter()
                .position(|ac| ac.date.day() == 1 && ac.style.in_month)
                .unwrap();
            let column = usize::from(target.replace_day(1).unwrap().weekday().number_days_from_monday());
            prop_assert_eq!(first, column);
            prop_assert_eq!(assignment.target_cells().count(), 1);
        }
    }
}
