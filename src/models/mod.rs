// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Category, EmailFormat, ModelError, NotificationFrequency, Opportunity, OpportunityDraft, Rating,
    ScoredOpportunity, UserProfile, WeakCriteriaPolicy,
};
pub use requests::{
    ListOpportunitiesQuery, PreviewFormat, PreviewQuery, SendDigestRequest, TestEmailRequest, UpdateProfileRequest,
};
pub use responses::{
    ErrorResponse, HealthResponse, OpportunitiesResponse, ProfileResponse, SystemStatusResponse,
};
