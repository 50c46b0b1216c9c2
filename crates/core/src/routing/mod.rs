pub mod classifier;
pub mod persona;

pub use classifier::IntentClassifier;
