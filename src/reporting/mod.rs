pub mod formatter;
pub mod writer;

pub use formatter::format_report_markdown;
pub use writer::{atomic_write, fallback_dir, read_report, write_artifact, write_report, ReportLocation};
