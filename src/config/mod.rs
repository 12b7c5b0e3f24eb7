pub mod credentials;
pub mod parser;
pub mod schema;
pub mod types;

pub use types::*;
pub use parser::{load_config, parse_config, parse_config_with_warnings, DEFAULT_CONFIG_FILE};
