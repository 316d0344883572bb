pub mod inspect;
pub mod reports;
pub mod scenarios;
pub mod tester;

pub use inspect::inspect_file;
pub use scenarios::{find_scenario, list_scenarios};
pub use tester::*;
