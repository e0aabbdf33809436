//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod user;
pub mod location;
pub mod taxonomy;
pub mod event;
pub mod participation;
pub mod forum;
pub mod feedback;

// Re-export repositories
pub use user::UserRepository;
pub use location::LocationRepository;
pub use taxonomy::TaxonomyRepository;
pub use event::{EventRepository, EventScope};
pub use participation::ParticipationRepository;
pub use forum::ForumRepository;
pub use feedback::FeedbackRepository;
