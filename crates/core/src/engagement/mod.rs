pub mod reward;
pub mod tone;
