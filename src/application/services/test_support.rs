//! Fixtures shared by the service unit tests.

use chrono::{Duration, Utc};

use crate::domain::{
    Opportunity, OpportunityRepository, OpportunityStatus, UserProfile, UserRepository, UserRole,
};
use crate::infrastructure::repositories::MemoryStore;

pub fn volunteer(id: &str) -> UserProfile {
    let mut profile = UserProfile::new(id, format!("{}@example.com", id), Some(format!("Volunteer {}", id)));
    profile.role = Some(UserRole::Volunteer);
    profile.phone = Some("555-0100".into());
    profile.location = Some("Springfield".into());
    profile
}

pub fn organization(id: &str) -> UserProfile {
    let mut profile = UserProfile::new(id, format!("{}@example.org", id), Some("Coordinator".into()));
    profile.role = Some(UserRole::Organization);
    profile.phone = Some("555-0199".into());
    profile.organization_name = Some(format!("Org {}", id));
    profile
}

/// An open opportunity starting `starts_in` from now and lasting two hours.
pub fn opportunity(id: i64, organization_id: &str, starts_in: Duration, total_seats: i32) -> Opportunity {
    let now = Utc::now();
    let start_time = now + starts_in;
    Opportunity {
        id,
        organization_id: organization_id.to_string(),
        title: format!("Opportunity {}", id),
        description: "Help out".into(),
        location: "Community Center".into(),
        category: Some("community".into()),
        start_time,
        end_time: start_time + Duration::hours(2),
        total_seats,
        filled_seats: 0,
        status: OpportunityStatus::Open,
        created_at: now,
        updated_at: now,
    }
}

pub async fn seed(store: &MemoryStore, users: &[UserProfile], opportunities: &[Opportunity]) {
    for user in users {
        UserRepository::create(store, user).await.unwrap();
    }
    for opportunity in opportunities {
        OpportunityRepository::create(store, opportunity).await.unwrap();
    }
}
