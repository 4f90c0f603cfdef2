//! In-memory store implementing every repository trait, for service tests

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    Acceptance, MatchRepository, MessageRepository, NotificationRepository, PhotoRepository,
    PreferenceRepository, ProfilePhotoRepository, ProfileRepository, RatingRepository,
    SessionRepository, UserRepository,
};
use crate::models::{
    matches::{Match, MatchStatus, NewMatch},
    message::{Message, NewMessage},
    notification::{NewNotification, Notification},
    photo::{
        FlagStatus, FlaggedPhoto, ModerationAction, ModerationStatus, NewPhotoFlag,
        NewProfilePhoto, NewSessionPhoto, PhotoFlag, ProfilePhoto, SessionPhoto,
    },
    preference::{
        Allergy, AllergySeverity, FoodPreference, FoodSpecialty, HostSpecialty, PreferenceLevel,
        UserAllergy,
    },
    profile::{
        CreateDishwasherProfileRequest, CreateHostProfileRequest, DishwasherProfile, HostProfile,
        UpdateDishwasherProfileRequest, UpdateHostProfileRequest,
    },
    rating::{NewRating, Rating, RatingSummary},
    session::{NewSession, Session, SessionStatus, TransitionGuard},
    user::{Role, UpdateUserRequest, User, UserType},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<Session>,
    ratings: Vec<Rating>,
    hosts: Vec<HostProfile>,
    dishwashers: Vec<DishwasherProfile>,
    notifications: Vec<Notification>,
    messages: Vec<Message>,
    matches: Vec<Match>,
    photos: Vec<SessionPhoto>,
    flags: Vec<PhotoFlag>,
    allergies: Vec<Allergy>,
    user_allergies: Vec<UserAllergy>,
    specialties: Vec<FoodSpecialty>,
    host_specialties: Vec<HostSpecialty>,
    food_preferences: Vec<FoodPreference>,
    profile_photos: Vec<ProfilePhoto>,
}

/// Shared in-memory tables; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
    fail_rating_summary: Arc<AtomicBool>,
}

/// Monotonic timestamps so ordering by time is deterministic
fn tick(len: usize) -> DateTime<Utc> {
    Utc::now() + Duration::milliseconds(len as i64)
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, name: &str) -> User {
        self.add_user_with(name, Role::User, Utc::now()).await
    }

    pub async fn add_user_with(&self, name: &str, role: Role, created_at: DateTime<Utc>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", name.to_lowercase()),
            name: Some(name.to_string()),
            role,
            user_type: UserType::Both,
            first_name: None,
            last_name: None,
            phone: None,
            bio: None,
            date_of_birth: None,
            email_verified: false,
            created_at,
            updated_at: created_at,
        };
        self.tables.lock().await.users.push(user.clone());
        user
    }

    pub async fn session(&self, id: Uuid) -> Option<Session> {
        self.tables
            .lock()
            .await
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub async fn set_session_status(&self, id: Uuid, status: SessionStatus) {
        let mut tables = self.tables.lock().await;
        if let Some(session) = tables.sessions.iter_mut().find(|s| s.id == id) {
            session.status = status;
        }
    }

    pub async fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.tables
            .lock()
            .await
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn add_allergy(&self, name: &str) -> Allergy {
        let allergy = Allergy {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
        };
        self.tables.lock().await.allergies.push(allergy.clone());
        allergy
    }

    pub async fn add_specialty(&self, name: &str) -> FoodSpecialty {
        let specialty = FoodSpecialty {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: Some("cuisine".to_string()),
            description: None,
            created_at: Utc::now(),
        };
        self.tables.lock().await.specialties.push(specialty.clone());
        specialty
    }

    /// Make the next rating aggregate writes fail
    pub fn fail_rating_summary(&self, fail: bool) {
        self.fail_rating_summary.store(fail, Ordering::SeqCst);
    }
}

fn admits(guard: &TransitionGuard, session: &Session) -> bool {
    session.is_participant(guard.actor)
        && guard.allowed_from.contains(&session.status)
        && (!guard.requires_dishwasher || session.dishwasher_id.is_some())
}

fn by_scheduled_desc(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.sort_by(|a, b| b.scheduled_date.cmp(&a.scheduled_date));
    sessions
}

#[async_trait]
impl SessionRepository for MemoryRepository {
    async fn create(&self, new_session: &NewSession) -> Result<Session> {
        let mut tables = self.tables.lock().await;
        let now = tick(tables.sessions.len());
        let session = Session {
            id: Uuid::new_v4(),
            host_id: new_session.host_id,
            dishwasher_id: None,
            status: SessionStatus::Open,
            scheduled_date: new_session.scheduled_date,
            estimated_duration_minutes: new_session.estimated_duration_minutes,
            actual_duration_minutes: None,
            dish_count: new_session.dish_count,
            meal_description: new_session.meal_description.clone(),
            special_instructions: new_session.special_instructions.clone(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        Ok(self.session(id).await)
    }

    async fn list_open(&self) -> Result<Vec<Session>> {
        let tables = self.tables.lock().await;
        let mut open: Vec<Session> = tables
            .sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Open)
            .cloned()
            .collect();
        open.sort_by(|a, b| a.scheduled_date.cmp(&b.scheduled_date));
        Ok(open)
    }

    async fn list_by_host(&self, host_id: Uuid) -> Result<Vec<Session>> {
        let tables = self.tables.lock().await;
        Ok(by_scheduled_desc(
            tables
                .sessions
                .iter()
                .filter(|s| s.host_id == host_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_dishwasher(&self, dishwasher_id: Uuid) -> Result<Vec<Session>> {
        let tables = self.tables.lock().await;
        Ok(by_scheduled_desc(
            tables
                .sessions
                .iter()
                .filter(|s| s.dishwasher_id == Some(dishwasher_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_participant(&self, user_id: Uuid) -> Result<Vec<Session>> {
        let tables = self.tables.lock().await;
        Ok(by_scheduled_desc(
            tables
                .sessions
                .iter()
                .filter(|s| s.is_participant(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn claim_open(
        &self,
        id: Uuid,
        dishwasher_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        let mut tables = self.tables.lock().await;
        let Some(session) = tables.sessions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if session.status != SessionStatus::Open || session.host_id == dishwasher_id {
            return Ok(None);
        }

        session.status = SessionStatus::Matched;
        session.dishwasher_id = Some(dishwasher_id);
        session.updated_at = now;
        Ok(Some(session.clone()))
    }

    async fn confirm_matched(
        &self,
        id: Uuid,
        host_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        let mut tables = self.tables.lock().await;
        let Some(session) = tables.sessions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if session.status != SessionStatus::Matched || session.host_id != host_id {
            return Ok(None);
        }

        session.status = SessionStatus::Confirmed;
        session.updated_at = now;
        Ok(Some(session.clone()))
    }

    async fn transition(
        &self,
        id: Uuid,
        guard: &TransitionGuard,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        let mut tables = self.tables.lock().await;
        let Some(session) = tables.sessions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if !admits(guard, session) {
            return Ok(None);
        }

        session.status = guard.target;
        if guard.target == SessionStatus::Completed {
            session.completed_at = Some(now);
        }
        session.updated_at = now;
        Ok(Some(session.clone()))
    }

    async fn record_actual_duration(
        &self,
        id: Uuid,
        participant_id: Uuid,
        minutes: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        let mut tables = self.tables.lock().await;
        let Some(session) = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == id && s.is_participant(participant_id))
        else {
            return Ok(None);
        };

        session.actual_duration_minutes = Some(minutes);
        session.updated_at = now;
        Ok(Some(session.clone()))
    }
}

#[async_trait]
impl RatingRepository for MemoryRepository {
    async fn find_by_session_and_rater(
        &self,
        session_id: Uuid,
        rater_id: Uuid,
    ) -> Result<Option<Rating>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .ratings
            .iter()
            .find(|r| r.session_id == session_id && r.rater_id == rater_id)
            .cloned())
    }

    async fn insert(&self, new_rating: &NewRating) -> Result<Option<Rating>> {
        let mut tables = self.tables.lock().await;
        if tables
            .ratings
            .iter()
            .any(|r| r.session_id == new_rating.session_id && r.rater_id == new_rating.rater_id)
        {
            return Ok(None);
        }

        let now = tick(tables.ratings.len());
        let rating = Rating {
            id: Uuid::new_v4(),
            session_id: new_rating.session_id,
            rater_id: new_rating.rater_id,
            rated_id: new_rating.rated_id,
            rating: new_rating.rating,
            review_text: new_rating.review_text.clone(),
            punctuality_rating: new_rating.punctuality_rating,
            quality_rating: new_rating.quality_rating,
            friendliness_rating: new_rating.friendliness_rating,
            would_recommend: new_rating.would_recommend,
            created_at: now,
            updated_at: now,
        };
        tables.ratings.push(rating.clone());
        Ok(Some(rating))
    }

    async fn list_for_rated(&self, rated_id: Uuid) -> Result<Vec<Rating>> {
        let tables = self.tables.lock().await;
        let mut ratings: Vec<Rating> = tables
            .ratings
            .iter()
            .filter(|r| r.rated_id == rated_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }
}

#[async_trait]
impl ProfileRepository for MemoryRepository {
    async fn create_host(
        &self,
        user_id: Uuid,
        request: &CreateHostProfileRequest,
    ) -> Result<Option<HostProfile>> {
        let mut tables = self.tables.lock().await;
        if tables.hosts.iter().any(|p| p.user_id == user_id) {
            return Ok(None);
        }

        let now = Utc::now();
        let profile = HostProfile {
            id: Uuid::new_v4(),
            user_id,
            address_line1: request.address_line1.clone(),
            address_line2: request.address_line2.clone(),
            city: request.city.clone(),
            state: request.state.clone(),
            postal_code: request.postal_code.clone(),
            country: request.country.clone(),
            latitude: request.latitude.clone(),
            longitude: request.longitude.clone(),
            typical_dish_count: request.typical_dish_count,
            kitchen_size: request.kitchen_size,
            has_dishwasher_machine: request.has_dishwasher_machine,
            average_rating: 0,
            total_ratings: 0,
            total_sessions_hosted: 0,
            created_at: now,
            updated_at: now,
        };
        tables.hosts.push(profile.clone());
        Ok(Some(profile))
    }

    async fn find_host(&self, user_id: Uuid) -> Result<Option<HostProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables.hosts.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn update_host(
        &self,
        user_id: Uuid,
        request: &UpdateHostProfileRequest,
    ) -> Result<Option<HostProfile>> {
        let mut tables = self.tables.lock().await;
        let Some(profile) = tables.hosts.iter_mut().find(|p| p.user_id == user_id) else {
            return Ok(None);
        };

        if let Some(value) = &request.address_line1 {
            profile.address_line1 = value.clone();
        }
        if let Some(value) = &request.address_line2 {
            profile.address_line2 = Some(value.clone());
        }
        if let Some(value) = &request.city {
            profile.city = value.clone();
        }
        if let Some(value) = &request.state {
            profile.state = value.clone();
        }
        if let Some(value) = &request.postal_code {
            profile.postal_code = value.clone();
        }
        if let Some(value) = &request.country {
            profile.country = value.clone();
        }
        if let Some(value) = &request.latitude {
            profile.latitude = Some(value.clone());
        }
        if let Some(value) = &request.longitude {
            profile.longitude = Some(value.clone());
        }
        if let Some(value) = request.typical_dish_count {
            profile.typical_dish_count = value;
        }
        if let Some(value) = request.kitchen_size {
            profile.kitchen_size = value;
        }
        if let Some(value) = request.has_dishwasher_machine {
            profile.has_dishwasher_machine = value;
        }
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn create_dishwasher(
        &self,
        user_id: Uuid,
        request: &CreateDishwasherProfileRequest,
    ) -> Result<Option<DishwasherProfile>> {
        let mut tables = self.tables.lock().await;
        if tables.dishwashers.iter().any(|p| p.user_id == user_id) {
            return Ok(None);
        }

        let now = Utc::now();
        let profile = DishwasherProfile {
            id: Uuid::new_v4(),
            user_id,
            work_range_km: request.work_range_km,
            experience_years: request.experience_years,
            availability_schedule: request.availability_schedule.clone(),
            is_available: true,
            total_dishes_done: 0,
            average_rating: 0,
            total_ratings: 0,
            latitude: request.latitude.clone(),
            longitude: request.longitude.clone(),
            city: request.city.clone(),
            state: request.state.clone(),
            country: request.country.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.dishwashers.push(profile.clone());
        Ok(Some(profile))
    }

    async fn find_dishwasher(&self, user_id: Uuid) -> Result<Option<DishwasherProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .dishwashers
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn update_dishwasher(
        &self,
        user_id: Uuid,
        request: &UpdateDishwasherProfileRequest,
    ) -> Result<Option<DishwasherProfile>> {
        let mut tables = self.tables.lock().await;
        let Some(profile) = tables.dishwashers.iter_mut().find(|p| p.user_id == user_id) else {
            return Ok(None);
        };

        if let Some(value) = request.work_range_km {
            profile.work_range_km = value;
        }
        if let Some(value) = request.experience_years {
            profile.experience_years = value;
        }
        if let Some(value) = &request.availability_schedule {
            profile.availability_schedule = Some(value.clone());
        }
        if let Some(value) = request.is_available {
            profile.is_available = value;
        }
        if let Some(value) = &request.latitude {
            profile.latitude = Some(value.clone());
        }
        if let Some(value) = &request.longitude {
            profile.longitude = Some(value.clone());
        }
        if let Some(value) = &request.city {
            profile.city = Some(value.clone());
        }
        if let Some(value) = &request.state {
            profile.state = Some(value.clone());
        }
        if let Some(value) = &request.country {
            profile.country = Some(value.clone());
        }
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn set_rating_summary(&self, user_id: Uuid, summary: RatingSummary) -> Result<()> {
        if self.fail_rating_summary.load(Ordering::SeqCst) {
            anyhow::bail!("profile store unavailable");
        }

        let mut tables = self.tables.lock().await;
        for profile in tables.hosts.iter_mut().filter(|p| p.user_id == user_id) {
            profile.average_rating = summary.average_rating;
            profile.total_ratings = summary.total_ratings;
        }
        for profile in tables.dishwashers.iter_mut().filter(|p| p.user_id == user_id) {
            profile.average_rating = summary.average_rating;
            profile.total_ratings = summary.total_ratings;
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for MemoryRepository {
    async fn create(&self, notification: &NewNotification) -> Result<Notification> {
        let mut tables = self.tables.lock().await;
        let created = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title.clone(),
            message: notification.message.clone(),
            data: notification.data.clone(),
            related_id: notification.related_id,
            is_read: false,
            created_at: tick(tables.notifications.len()),
        };
        tables.notifications.push(created.clone());
        Ok(created)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
        let tables = self.tables.lock().await;
        let mut notifications: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(limit.max(0) as usize);
        Ok(notifications)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let mut count = 0;
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            notification.is_read = true;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl MessageRepository for MemoryRepository {
    async fn create(&self, message: &NewMessage) -> Result<Message> {
        let mut tables = self.tables.lock().await;
        let created = Message {
            id: Uuid::new_v4(),
            session_id: message.session_id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            message_text: message.message_text.clone(),
            is_read: false,
            created_at: tick(tables.messages.len()),
        };
        tables.messages.push(created.clone());
        Ok(created)
    }

    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<Message>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.receiver_id == receiver_id)
        {
            Some(message) => {
                message.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_between(&self, user_id: Uuid, other_id: Uuid) -> Result<Vec<Message>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == user_id && m.receiver_id == other_id)
                    || (m.sender_id == other_id && m.receiver_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .messages
            .iter()
            .rev()
            .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MatchRepository for MemoryRepository {
    async fn create(&self, new_match: &NewMatch) -> Result<Match> {
        let mut tables = self.tables.lock().await;
        let created = Match {
            id: Uuid::new_v4(),
            session_id: new_match.session_id,
            dishwasher_id: new_match.dishwasher_id,
            match_score: new_match.match_score,
            status: MatchStatus::Pending,
            created_at: tick(tables.matches.len()),
            responded_at: None,
        };
        tables.matches.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Match>> {
        let tables = self.tables.lock().await;
        Ok(tables.matches.iter().find(|m| m.id == id).cloned())
    }

    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<Match>> {
        let tables = self.tables.lock().await;
        let mut matches: Vec<Match> = tables
            .matches
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        // None sorts lowest, so descending puts unscored matches last
        matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        Ok(matches)
    }

    async fn list_for_dishwasher(&self, dishwasher_id: Uuid) -> Result<Vec<Match>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .matches
            .iter()
            .rev()
            .filter(|m| m.dishwasher_id == dishwasher_id)
            .cloned()
            .collect())
    }

    async fn decline(
        &self,
        id: Uuid,
        dishwasher_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .matches
            .iter_mut()
            .find(|m| m.id == id && m.dishwasher_id == dishwasher_id)
            .filter(|m| m.status == MatchStatus::Pending)
            .map(|m| {
                m.status = MatchStatus::Declined;
                m.responded_at = Some(now);
                m.clone()
            }))
    }

    async fn accept(
        &self,
        id: Uuid,
        dishwasher_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Acceptance> {
        let mut tables = self.tables.lock().await;
        let Some(index) = tables.matches.iter().position(|m| {
            m.id == id && m.dishwasher_id == dishwasher_id && m.status == MatchStatus::Pending
        }) else {
            return Ok(Acceptance::NotPending);
        };

        let session_id = tables.matches[index].session_id;
        let Some(session) = tables.sessions.iter_mut().find(|s| {
            s.id == session_id && s.status == SessionStatus::Open && s.host_id != dishwasher_id
        }) else {
            return Ok(Acceptance::SessionUnavailable);
        };
        session.status = SessionStatus::Matched;
        session.dishwasher_id = Some(dishwasher_id);
        session.updated_at = now;
        let session = session.clone();

        let accepted = &mut tables.matches[index];
        accepted.status = MatchStatus::Accepted;
        accepted.responded_at = Some(now);
        Ok(Acceptance::Accepted {
            accepted: accepted.clone(),
            session,
        })
    }
}

#[async_trait]
impl PhotoRepository for MemoryRepository {
    async fn create(&self, photo: &NewSessionPhoto) -> Result<SessionPhoto> {
        let mut tables = self.tables.lock().await;
        let display_order = tables
            .photos
            .iter()
            .filter(|p| p.session_id == photo.session_id)
            .count() as i32;
        let created = SessionPhoto {
            id: Uuid::new_v4(),
            session_id: photo.session_id,
            user_id: photo.user_id,
            photo_url: photo.photo_url.clone(),
            caption: photo.caption.clone(),
            display_order,
            moderation_status: ModerationStatus::Approved,
            flag_count: 0,
            is_hidden: false,
            uploaded_at: tick(tables.photos.len()),
        };
        tables.photos.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SessionPhoto>> {
        let tables = self.tables.lock().await;
        Ok(tables.photos.iter().find(|p| p.id == id).cloned())
    }

    async fn list_visible(&self, session_id: Uuid) -> Result<Vec<SessionPhoto>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .photos
            .iter()
            .filter(|p| p.session_id == session_id && !p.is_hidden)
            .cloned()
            .collect())
    }

    async fn list_visible_for_participant(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SessionPhoto>> {
        let tables = self.tables.lock().await;
        let mut photos: Vec<SessionPhoto> = tables
            .photos
            .iter()
            .filter(|p| !p.is_hidden)
            .filter(|p| {
                tables
                    .sessions
                    .iter()
                    .any(|s| s.id == p.session_id && s.is_participant(user_id))
            })
            .cloned()
            .collect();
        photos.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        photos.truncate(limit.max(0) as usize);
        Ok(photos)
    }

    async fn record_flag(
        &self,
        flag: &NewPhotoFlag,
        auto_hide_threshold: i32,
    ) -> Result<Option<(PhotoFlag, SessionPhoto)>> {
        let mut tables = self.tables.lock().await;
        if tables
            .flags
            .iter()
            .any(|f| f.photo_id == flag.photo_id && f.reporter_id == flag.reporter_id)
        {
            return Ok(None);
        }

        let Some(photo) = tables.photos.iter_mut().find(|p| p.id == flag.photo_id) else {
            anyhow::bail!("photo {} does not exist", flag.photo_id);
        };
        photo.flag_count += 1;
        if photo.flag_count >= auto_hide_threshold {
            photo.is_hidden = true;
            photo.moderation_status = ModerationStatus::PendingReview;
        }
        let photo = photo.clone();

        let created = PhotoFlag {
            id: Uuid::new_v4(),
            photo_id: flag.photo_id,
            reporter_id: flag.reporter_id,
            reason: flag.reason,
            description: flag.description.clone(),
            status: FlagStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: tick(tables.flags.len()),
        };
        tables.flags.push(created.clone());
        Ok(Some((created, photo)))
    }

    async fn list_flagged(&self) -> Result<Vec<FlaggedPhoto>> {
        let tables = self.tables.lock().await;
        let mut flagged: Vec<FlaggedPhoto> = tables
            .photos
            .iter()
            .filter_map(|photo| {
                let flags: Vec<PhotoFlag> = tables
                    .flags
                    .iter()
                    .filter(|f| f.photo_id == photo.id && f.status == FlagStatus::Pending)
                    .cloned()
                    .collect();
                (!flags.is_empty()).then(|| FlaggedPhoto {
                    photo: photo.clone(),
                    flags,
                })
            })
            .collect();
        flagged.sort_by(|a, b| b.photo.flag_count.cmp(&a.photo.flag_count));
        Ok(flagged)
    }

    async fn moderate(
        &self,
        photo_id: Uuid,
        action: ModerationAction,
        reviewer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionPhoto>> {
        let mut tables = self.tables.lock().await;
        let Some(photo) = tables.photos.iter_mut().find(|p| p.id == photo_id) else {
            return Ok(None);
        };

        photo.moderation_status = action.photo_status();
        photo.is_hidden = action == ModerationAction::Reject;
        if action == ModerationAction::Approve {
            photo.flag_count = 0;
        }
        let photo = photo.clone();

        for flag in tables
            .flags
            .iter_mut()
            .filter(|f| f.photo_id == photo_id && f.status == FlagStatus::Pending)
        {
            flag.status = action.flag_status();
            flag.reviewed_by = Some(reviewer_id);
            flag.reviewed_at = Some(now);
        }
        Ok(Some(photo))
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_profile(&self, id: Uuid, request: &UpdateUserRequest) -> Result<Option<User>> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(value) = &request.first_name {
            user.first_name = Some(value.clone());
        }
        if let Some(value) = &request.last_name {
            user.last_name = Some(value.clone());
        }
        if let Some(value) = &request.phone {
            user.phone = Some(value.clone());
        }
        if let Some(value) = &request.bio {
            user.bio = Some(value.clone());
        }
        if let Some(value) = request.date_of_birth {
            user.date_of_birth = Some(value);
        }
        if let Some(value) = request.user_type {
            user.user_type = value;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

fn sorted_by_name<T>(mut items: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    items.sort_by(|a, b| name(a).cmp(name(b)));
    items
}

#[async_trait]
impl PreferenceRepository for MemoryRepository {
    async fn list_allergies(&self) -> Result<Vec<Allergy>> {
        let tables = self.tables.lock().await;
        Ok(sorted_by_name(tables.allergies.clone(), |a| a.name.as_str()))
    }

    async fn find_allergy(&self, id: Uuid) -> Result<Option<Allergy>> {
        let tables = self.tables.lock().await;
        Ok(tables.allergies.iter().find(|a| a.id == id).cloned())
    }

    async fn list_user_allergies(&self, user_id: Uuid) -> Result<Vec<UserAllergy>> {
        let tables = self.tables.lock().await;
        let mine: Vec<UserAllergy> = tables
            .user_allergies
            .iter()
            .filter(|ua| ua.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by_name(mine, |ua| ua.allergy.name.as_str()))
    }

    async fn upsert_user_allergy(
        &self,
        user_id: Uuid,
        allergy_id: Uuid,
        severity: AllergySeverity,
    ) -> Result<UserAllergy> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables
            .user_allergies
            .iter_mut()
            .find(|ua| ua.user_id == user_id && ua.allergy.id == allergy_id)
        {
            existing.severity = severity;
            return Ok(existing.clone());
        }

        let allergy = tables
            .allergies
            .iter()
            .find(|a| a.id == allergy_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("allergy {} does not exist", allergy_id))?;
        let created = UserAllergy {
            id: Uuid::new_v4(),
            user_id,
            allergy,
            severity,
            created_at: Utc::now(),
        };
        tables.user_allergies.push(created.clone());
        Ok(created)
    }

    async fn remove_user_allergy(&self, user_id: Uuid, allergy_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.user_allergies.len();
        tables
            .user_allergies
            .retain(|ua| !(ua.user_id == user_id && ua.allergy.id == allergy_id));
        Ok(tables.user_allergies.len() < before)
    }

    async fn list_specialties(&self) -> Result<Vec<FoodSpecialty>> {
        let tables = self.tables.lock().await;
        Ok(sorted_by_name(tables.specialties.clone(), |s| s.name.as_str()))
    }

    async fn find_specialty(&self, id: Uuid) -> Result<Option<FoodSpecialty>> {
        let tables = self.tables.lock().await;
        Ok(tables.specialties.iter().find(|s| s.id == id).cloned())
    }

    async fn list_host_specialties(&self, host_profile_id: Uuid) -> Result<Vec<HostSpecialty>> {
        let tables = self.tables.lock().await;
        let mine: Vec<HostSpecialty> = tables
            .host_specialties
            .iter()
            .filter(|hs| hs.host_profile_id == host_profile_id)
            .cloned()
            .collect();
        Ok(sorted_by_name(mine, |hs| hs.specialty.name.as_str()))
    }

    async fn add_host_specialty(
        &self,
        host_profile_id: Uuid,
        specialty_id: Uuid,
    ) -> Result<HostSpecialty> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables
            .host_specialties
            .iter()
            .find(|hs| hs.host_profile_id == host_profile_id && hs.specialty.id == specialty_id)
        {
            return Ok(existing.clone());
        }

        let specialty = tables
            .specialties
            .iter()
            .find(|s| s.id == specialty_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("specialty {} does not exist", specialty_id))?;
        let created = HostSpecialty {
            id: Uuid::new_v4(),
            host_profile_id,
            specialty,
            created_at: Utc::now(),
        };
        tables.host_specialties.push(created.clone());
        Ok(created)
    }

    async fn remove_host_specialty(
        &self,
        host_profile_id: Uuid,
        specialty_id: Uuid,
    ) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.host_specialties.len();
        tables.host_specialties.retain(|hs| {
            !(hs.host_profile_id == host_profile_id && hs.specialty.id == specialty_id)
        });
        Ok(tables.host_specialties.len() < before)
    }

    async fn list_dishwasher_preferences(
        &self,
        dishwasher_profile_id: Uuid,
    ) -> Result<Vec<FoodPreference>> {
        let tables = self.tables.lock().await;
        let mine: Vec<FoodPreference> = tables
            .food_preferences
            .iter()
            .filter(|fp| fp.dishwasher_profile_id == dishwasher_profile_id)
            .cloned()
            .collect();
        Ok(sorted_by_name(mine, |fp| fp.specialty.name.as_str()))
    }

    async fn upsert_dishwasher_preference(
        &self,
        dishwasher_profile_id: Uuid,
        specialty_id: Uuid,
        level: PreferenceLevel,
    ) -> Result<FoodPreference> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.food_preferences.iter_mut().find(|fp| {
            fp.dishwasher_profile_id == dishwasher_profile_id && fp.specialty.id == specialty_id
        }) {
            existing.preference_level = level;
            return Ok(existing.clone());
        }

        let specialty = tables
            .specialties
            .iter()
            .find(|s| s.id == specialty_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("specialty {} does not exist", specialty_id))?;
        let created = FoodPreference {
            id: Uuid::new_v4(),
            dishwasher_profile_id,
            specialty,
            preference_level: level,
            created_at: Utc::now(),
        };
        tables.food_preferences.push(created.clone());
        Ok(created)
    }

    async fn remove_dishwasher_preference(
        &self,
        dishwasher_profile_id: Uuid,
        specialty_id: Uuid,
    ) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.food_preferences.len();
        tables.food_preferences.retain(|fp| {
            !(fp.dishwasher_profile_id == dishwasher_profile_id && fp.specialty.id == specialty_id)
        });
        Ok(tables.food_preferences.len() < before)
    }
}

#[async_trait]
impl ProfilePhotoRepository for MemoryRepository {
    async fn create(&self, photo: &NewProfilePhoto) -> Result<ProfilePhoto> {
        let mut tables = self.tables.lock().await;
        let mine = tables
            .profile_photos
            .iter()
            .filter(|p| p.user_id == photo.user_id)
            .count();
        if photo.is_primary {
            for existing in tables
                .profile_photos
                .iter_mut()
                .filter(|p| p.user_id == photo.user_id)
            {
                existing.is_primary = false;
            }
        }

        let created = ProfilePhoto {
            id: Uuid::new_v4(),
            user_id: photo.user_id,
            photo_url: photo.photo_url.clone(),
            is_primary: photo.is_primary,
            display_order: mine as i32,
            uploaded_at: tick(tables.profile_photos.len()),
        };
        tables.profile_photos.push(created.clone());
        Ok(created)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ProfilePhoto>> {
        let tables = self.tables.lock().await;
        let mut photos: Vec<ProfilePhoto> = tables
            .profile_photos
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        photos.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(a.display_order.cmp(&b.display_order))
        });
        Ok(photos)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.profile_photos.len();
        tables
            .profile_photos
            .retain(|p| !(p.id == id && p.user_id == user_id));
        Ok(tables.profile_photos.len() < before)
    }

    async fn set_primary(&self, id: Uuid, user_id: Uuid) -> Result<Option<ProfilePhoto>> {
        let mut tables = self.tables.lock().await;
        if !tables
            .profile_photos
            .iter()
            .any(|p| p.id == id && p.user_id == user_id)
        {
            return Ok(None);
        }

        let mut primary = None;
        for photo in tables
            .profile_photos
            .iter_mut()
            .filter(|p| p.user_id == user_id)
        {
            photo.is_primary = photo.id == id;
            if photo.is_primary {
                primary = Some(photo.clone());
            }
        }
        Ok(primary)
    }
}
