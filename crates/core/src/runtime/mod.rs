mod pipeline;
mod sessions;

pub use pipeline::{GENERATION_FAILED_MSG, HANDOFF_MSG, NAPPING_MSG, Pipeline, UNHEARD_MSG};
pub use sessions::{SessionManager, SharedSession};
