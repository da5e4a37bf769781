//! Shared building blocks: values, field-name constants, clocks and lock helpers.

mod clock;
mod constants;
mod type_utils;
mod value;

pub use clock::*;
pub use constants::*;
pub use type_utils::*;
pub use value::*;
