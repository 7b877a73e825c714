pub mod sampling;

pub use sampling::{gaussian, round_to};
