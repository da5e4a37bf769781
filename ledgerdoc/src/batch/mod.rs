//! Running a list of document operations, one transaction per item.

mod operation;
mod runner;

pub use operation::*;
pub use runner::*;
