pub mod definition;
pub mod extract;
pub mod navigator;
pub mod progress;
pub mod registry;
pub mod state;

pub use definition::{Audience, FlowDefinition, Slot, SlotType, Step};
pub use extract::SlotExtractor;
pub use navigator::{check_condition, next_step, NavigationError, NavigationMode};
pub use progress::{compute_progress, Progress};
pub use registry::FlowRegistry;
pub use state::{is_present, merge, SlotValues};
