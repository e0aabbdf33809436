//! Data models module
//!
//! Database rows, domain enums and request/response payloads

pub mod user;
pub mod location;
pub mod tag;
pub mod event;
pub mod participation;
pub mod forum;
pub mod review;
pub mod report;
pub mod reward;

// Re-export commonly used models
pub use user::{User, UserSummary, UpdateUserRequest, UserUpdate, CurrentEvent, MonthlyWrap, ContributionSummary};
pub use location::{Location, CreateLocationRequest, LocationPreferenceRequest};
pub use tag::{Tag, EventCategory};
pub use event::{Event, EventData, EventStatus, EventType, NewEvent, ProjectTransaction, EventFilters};
pub use participation::{
    Participation, ParticipationType, AttendanceActivityType, CheckInData, CheckOutData, ContributionResult,
};
pub use forum::{Forum, ForumPost, ForumPostData, VoteDirection};
pub use review::ParticipationReview;
pub use report::EventReport;
pub use reward::{RedeemRequest, RedeemResult};
