pub mod checkpoint;
pub mod location;
pub mod record;
pub mod user;

pub use checkpoint::{Checkpoint, CheckpointType};
pub use location::Location;
pub use record::{DailyRecord, Record};
pub use user::{BusinessType, PlanTier, User};
