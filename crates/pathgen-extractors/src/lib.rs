//! Protocol diff extractors for TLC state labels

pub mod protocols;
pub mod state;

#[cfg(test)]
pub mod tests;

pub use protocols::{TransitionDiff, available, get_extractor};
