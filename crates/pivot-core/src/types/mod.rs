mod pose;

pub use pose::*;
