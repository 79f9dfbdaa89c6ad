mod leap_array;
mod stat_bucket;

pub use leap_array::*;
pub use stat_bucket::*;
