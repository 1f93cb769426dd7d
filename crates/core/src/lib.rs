#![forbid(unsafe_code)]

pub mod countdown;
pub mod error;
pub mod grade_table;
pub mod grading;
pub mod model;
pub mod time;

pub use error::Error;
pub use time::Clock;
