pub mod error;
pub mod label;
pub mod stimulus;
pub mod trial;
pub mod window;

pub use error::InvalidWindowSpec;
pub use label::{IntervalLabel, Run};
pub use stimulus::{Action, StimulusCategory};
pub use trial::{ResponseAlphabet, Trial, TrialSequence};
pub use window::WindowSpec;
