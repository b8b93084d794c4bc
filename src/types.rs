pub mod missing;
pub mod reported;

// Re-export types for convenience.
pub use crate::types::missing::Missing;
pub use crate::types::reported::Reported;
