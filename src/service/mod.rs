pub mod directory;
pub mod ledger;
pub mod policy;

#[cfg(test)]
mod test_support;

pub use directory::{CreateOutcome, EmployeeDirectory};
pub use ledger::AttendanceLedger;
