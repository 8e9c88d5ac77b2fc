//! Policy point data (the unit every projection run is keyed by)

mod data;

pub use data::{Gender, PolicyPoint, PolicyTable};
