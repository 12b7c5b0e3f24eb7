pub mod action;
pub mod command;
pub mod http;

pub use action::{ActionOutput, ExternalAction};
pub use command::CommandAction;
pub use http::HttpProbe;
