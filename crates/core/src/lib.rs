#![forbid(unsafe_code)]

pub mod attempt;
pub mod error;
pub mod experience;
pub mod model;
pub mod slug;
pub mod time;

pub use error::Error;
pub use time::Clock;
