mod cluster;
mod mapper;
mod util;
pub(crate) use self::cluster::ToleranceSweep;
pub(crate) use self::mapper::{map_dates, AssignedCell, DateAssignment};
pub(crate) use self::util::month_title;

#[cfg(test)]
pub(crate) use self::cluster::tests::{scramble, synthetic_cells};
#[cfg(test)]
pub(crate) use self::mapper::CellStyle;
