//! Language model domain traits

mod answerer;

pub use answerer::Answerer;

#[cfg(test)]
pub use answerer::mock::MockAnswerer;
