pub mod report;
pub mod outcome;
pub mod history;
pub mod log_record;

pub use report::*;
pub use outcome::*;
pub use history::*;
pub use log_record::*;
