//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::application::services::{
    CreateOpportunityDto, ListOpportunitiesQuery, UpdateOpportunityDto, UpdateProfileDto,
};
use crate::domain::{OpportunityStatus, UserRole};

/// Update own profile request
///
/// Absent fields are left untouched; an empty string clears a field.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 80, message = "Display name must be at most 80 characters"))]
    pub display_name: Option<String>,

    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 120, message = "Location must be at most 120 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,

    #[validate(length(max = 30, message = "At most 30 skills"))]
    pub skills: Option<Vec<String>>,

    pub role: Option<UserRole>,

    #[validate(length(max = 120, message = "Organization name must be at most 120 characters"))]
    pub organization_name: Option<String>,

    #[validate(length(max = 200, message = "Website must be at most 200 characters"))]
    pub website: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateProfileDto {
    fn from(body: UpdateProfileRequest) -> Self {
        Self {
            display_name: body.display_name,
            phone: body.phone,
            location: body.location,
            bio: body.bio,
            skills: body.skills,
            role: body.role,
            organization_name: body.organization_name,
            website: body.website,
        }
    }
}

/// Create opportunity request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOpportunityRequest {
    #[validate(length(min = 3, max = 120, message = "Title must be 3-120 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: String,

    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,

    #[validate(length(max = 50, message = "Category must be at most 50 characters"))]
    pub category: Option<String>,

    pub start_time: DateTime<Utc>,

    pub end_time: DateTime<Utc>,

    #[validate(range(min = 1, max = 10000, message = "Seats must be between 1 and 10000"))]
    pub total_seats: i32,
}

impl From<CreateOpportunityRequest> for CreateOpportunityDto {
    fn from(body: CreateOpportunityRequest) -> Self {
        Self {
            title: body.title,
            description: body.description,
            location: body.location,
            category: body.category,
            start_time: body.start_time,
            end_time: body.end_time,
            total_seats: body.total_seats,
        }
    }
}

/// Update opportunity request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOpportunityRequest {
    #[validate(length(min = 3, max = 120, message = "Title must be 3-120 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 50, message = "Category must be at most 50 characters"))]
    pub category: Option<String>,

    pub start_time: Option<DateTime<Utc>>,

    pub end_time: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = 10000, message = "Seats must be between 1 and 10000"))]
    pub total_seats: Option<i32>,
}

impl From<UpdateOpportunityRequest> for UpdateOpportunityDto {
    fn from(body: UpdateOpportunityRequest) -> Self {
        Self {
            title: body.title,
            description: body.description,
            location: body.location,
            category: body.category,
            start_time: body.start_time,
            end_time: body.end_time,
            total_seats: body.total_seats,
        }
    }
}

/// Open / close / complete an opportunity
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: OpportunityStatus,
}

/// Opportunity listing query string
#[derive(Debug, Default, Deserialize)]
pub struct ListOpportunitiesParams {
    pub status: Option<OpportunityStatus>,
    pub category: Option<String>,
    pub organization_id: Option<String>,
    #[serde(default)]
    pub upcoming: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListOpportunitiesParams> for ListOpportunitiesQuery {
    fn from(params: ListOpportunitiesParams) -> Self {
        Self {
            status: params.status,
            category: params.category,
            organization_id: params.organization_id,
            upcoming: params.upcoming,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

/// Apply to an opportunity
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitApplicationRequest {
    #[validate(length(max = 1000, message = "Message must be at most 1000 characters"))]
    pub message: Option<String>,
}

/// Rate a finished opportunity
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitFeedbackRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}
