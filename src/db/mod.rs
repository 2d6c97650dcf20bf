mod repository;
mod schema;

pub use repository::{Repository, BUSY_TIMEOUT};
