//! In-memory document store.
//!
//! Implements every document repository over `HashMap`s guarded by a single
//! mutex. Used for `database.backend = "memory"` and by the test suite. All
//! check-and-set operations run under one lock acquisition, which gives the
//! same guarantees as the conditional SQL updates of the PostgreSQL
//! repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::domain::{
    Application, ApplicationRepository, ApplicationStatus, Feedback, FeedbackRepository,
    Opportunity, OpportunityFilter, OpportunityRepository, OpportunityStatus, UserProfile,
    UserRepository,
};
use crate::shared::error::AppError;

#[derive(Default)]
struct State {
    users: HashMap<String, UserProfile>,
    opportunities: HashMap<i64, Opportunity>,
    applications: HashMap<String, Application>,
    feedback: HashMap<String, Feedback>,
}

/// Shared in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.state.lock().users.get(id).cloned())
    }

    async fn create(&self, user: &UserProfile) -> Result<UserProfile, AppError> {
        let mut state = self.state.lock();
        if state.users.contains_key(&user.id) {
            return Err(AppError::Conflict(format!("User {} already exists", user.id)));
        }
        state.users.insert(user.id.clone(), user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &UserProfile) -> Result<UserProfile, AppError> {
        let mut state = self.state.lock();
        let stored = state
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;

        if let (Some(current), Some(requested)) = (stored.role, user.role) {
            if current != requested {
                return Err(AppError::Conflict("Role has already been chosen".into()));
            }
        }

        stored.display_name = user.display_name.clone();
        stored.phone = user.phone.clone();
        stored.location = user.location.clone();
        stored.bio = user.bio.clone();
        stored.skills = user.skills.clone();
        stored.role = stored.role.or(user.role);
        stored.organization_name = user.organization_name.clone();
        stored.website = user.website.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut state = self.state.lock();
        let stored = state
            .users
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        stored.last_login_at = Some(at);
        Ok(())
    }

    async fn claim_welcome_email(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        match state.users.get_mut(id) {
            Some(user) if !user.welcome_email_sent => {
                user.welcome_email_sent = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_welcome_email(&self, id: &str) -> Result<(), AppError> {
        if let Some(user) = self.state.lock().users.get_mut(id) {
            user.welcome_email_sent = false;
        }
        Ok(())
    }
}

#[async_trait]
impl OpportunityRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Opportunity>, AppError> {
        Ok(self.state.lock().opportunities.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Opportunity>, AppError> {
        let state = self.state.lock();
        let mut found: Vec<Opportunity> = ids
            .iter()
            .filter_map(|id| state.opportunities.get(id).cloned())
            .collect();
        found.sort_by_key(|o| (o.start_time, o.id));
        found.dedup_by_key(|o| o.id);
        Ok(found)
    }

    async fn list(&self, filter: &OpportunityFilter) -> Result<Vec<Opportunity>, AppError> {
        let state = self.state.lock();
        let mut matching: Vec<&Opportunity> = state
            .opportunities
            .values()
            .filter(|o| filter.matches(o))
            .collect();
        matching.sort_by_key(|o| (o.start_time, o.id));

        Ok(matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn create(&self, opportunity: &Opportunity) -> Result<Opportunity, AppError> {
        let mut state = self.state.lock();
        if state.opportunities.contains_key(&opportunity.id) {
            return Err(AppError::Conflict(format!(
                "Opportunity {} already exists",
                opportunity.id
            )));
        }
        state.opportunities.insert(opportunity.id, opportunity.clone());
        Ok(opportunity.clone())
    }

    async fn update(&self, opportunity: &Opportunity) -> Result<Opportunity, AppError> {
        let mut state = self.state.lock();
        let stored = state
            .opportunities
            .get_mut(&opportunity.id)
            .ok_or_else(|| AppError::NotFound(format!("Opportunity {} not found", opportunity.id)))?;

        if opportunity.total_seats < stored.filled_seats {
            return Err(AppError::Conflict(
                "total_seats cannot be lower than filled seats".into(),
            ));
        }

        stored.title = opportunity.title.clone();
        stored.description = opportunity.description.clone();
        stored.location = opportunity.location.clone();
        stored.category = opportunity.category.clone();
        stored.start_time = opportunity.start_time;
        stored.end_time = opportunity.end_time;
        stored.total_seats = opportunity.total_seats;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn set_status(
        &self,
        id: i64,
        expected: &[OpportunityStatus],
        next: OpportunityStatus,
    ) -> Result<Option<Opportunity>, AppError> {
        let mut state = self.state.lock();
        match state.opportunities.get_mut(&id) {
            Some(stored) if expected.contains(&stored.status) => {
                stored.status = next;
                stored.updated_at = Utc::now();
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.state.lock();
        match state.opportunities.get(&id) {
            None => return Err(AppError::NotFound(format!("Opportunity {} not found", id))),
            Some(o) if o.filled_seats > 0 => {
                return Err(AppError::Conflict(format!(
                    "Opportunity still has {} active applications",
                    o.filled_seats
                )))
            }
            Some(_) => {}
        }
        state.opportunities.remove(&id);
        // mirrors ON DELETE CASCADE
        state.applications.retain(|_, a| a.opportunity_id != id);
        state.feedback.retain(|_, f| f.opportunity_id != id);
        Ok(())
    }

    async fn reserve_seat(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.state.lock();
        match state.opportunities.get_mut(&id) {
            Some(o) if o.status == OpportunityStatus::Open && o.filled_seats < o.total_seats => {
                o.filled_seats += 1;
                o.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_seat(&self, id: i64) -> Result<(), AppError> {
        if let Some(o) = self.state.lock().opportunities.get_mut(&id) {
            o.filled_seats = (o.filled_seats - 1).max(0);
            o.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Application>, AppError> {
        Ok(self.state.lock().applications.get(id).cloned())
    }

    async fn find_by_opportunity(&self, opportunity_id: i64) -> Result<Vec<Application>, AppError> {
        let state = self.state.lock();
        let mut found: Vec<Application> = state
            .applications
            .values()
            .filter(|a| a.opportunity_id == opportunity_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn find_by_volunteer(&self, volunteer_id: &str) -> Result<Vec<Application>, AppError> {
        let state = self.state.lock();
        let mut found: Vec<Application> = state
            .applications
            .values()
            .filter(|a| a.volunteer_id == volunteer_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn create(&self, application: &Application) -> Result<Application, AppError> {
        let mut state = self.state.lock();
        if state.applications.contains_key(&application.id) {
            return Err(AppError::Conflict(format!(
                "Application {} already exists",
                application.id
            )));
        }
        state
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application.clone())
    }

    async fn transition(
        &self,
        id: &str,
        expected: &[ApplicationStatus],
        next: ApplicationStatus,
        message: Option<String>,
    ) -> Result<Option<Application>, AppError> {
        let mut state = self.state.lock();
        let Some(stored) = state.applications.get_mut(id) else {
            return Ok(None);
        };
        if !expected.contains(&stored.status) {
            return Ok(None);
        }

        let now = Utc::now();
        stored.status = next;
        stored.updated_at = now;
        if message.is_some() {
            stored.message = message;
        }
        match next {
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => {
                stored.decided_at = Some(now)
            }
            ApplicationStatus::Pending => {
                stored.decided_at = None;
                stored.applied_at = now;
            }
            ApplicationStatus::Withdrawn => {}
        }
        Ok(Some(stored.clone()))
    }
}

#[async_trait]
impl FeedbackRepository for MemoryStore {
    async fn create(&self, feedback: &Feedback) -> Result<Feedback, AppError> {
        let mut state = self.state.lock();
        if state.feedback.contains_key(&feedback.id) {
            return Err(AppError::Conflict("Feedback already submitted".into()));
        }
        state.feedback.insert(feedback.id.clone(), feedback.clone());
        Ok(feedback.clone())
    }

    async fn find_by_opportunity(&self, opportunity_id: i64) -> Result<Vec<Feedback>, AppError> {
        let state = self.state.lock();
        let mut found: Vec<Feedback> = state
            .feedback
            .values()
            .filter(|f| f.opportunity_id == opportunity_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_by_volunteer(&self, volunteer_id: &str) -> Result<Vec<Feedback>, AppError> {
        let state = self.state.lock();
        let mut found: Vec<Feedback> = state
            .feedback
            .values()
            .filter(|f| f.volunteer_id == volunteer_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}
