//! Small shared helpers.

pub mod hash;
pub mod panic;
pub mod path;
pub mod plural;
pub mod time;

pub use plural::{plural_count, plural_s};
