pub mod config;
pub mod error;
pub mod types;

pub use config::Settings;
pub use error::{CoreError, CoreResult};
pub use types::{ContentRecord, Document, Heading, Image, Link, TokenStreams, Zone};
