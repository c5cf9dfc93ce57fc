mod error;
pub use error::{Error, QueryError, Result};

mod app;
mod events;
pub mod historical;
pub mod series;
pub mod watchlist;

#[cfg(test)]
mod testutils;

pub use app::Dashboard;
pub use events::Event;
