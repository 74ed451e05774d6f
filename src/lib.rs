pub mod config;
pub mod content;
pub mod distractor;
pub mod domain;
pub mod drill;
pub mod linguistics;
pub mod maze;
pub mod pools;
pub mod reading;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
