//! Rating models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A review one participant leaves for the other after a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub session_id: Uuid,
    pub rater_id: Uuid,
    pub rated_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
    pub punctuality_rating: Option<i32>,
    pub quality_rating: Option<i32>,
    pub friendliness_rating: Option<i32>,
    pub would_recommend: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub session_id: Uuid,
    pub rater_id: Uuid,
    pub rated_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
    pub punctuality_rating: Option<i32>,
    pub quality_rating: Option<i32>,
    pub friendliness_rating: Option<i32>,
    pub would_recommend: bool,
}

fn default_would_recommend() -> bool {
    true
}

/// Create rating request payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRatingRequest {
    pub session_id: Uuid,
    pub rated_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
    pub punctuality_rating: Option<i32>,
    pub quality_rating: Option<i32>,
    pub friendliness_rating: Option<i32>,
    #[serde(default = "default_would_recommend")]
    pub would_recommend: bool,
}

impl CreateRatingRequest {
    /// Check every score lies in 1..=5
    pub fn validate(&self) -> Result<(), String> {
        let scores = [
            ("rating", Some(self.rating)),
            ("punctuality_rating", self.punctuality_rating),
            ("quality_rating", self.quality_rating),
            ("friendliness_rating", self.friendliness_rating),
        ];

        for (field, score) in scores {
            if let Some(score) = score
                && !(1..=5).contains(&score)
            {
                return Err(format!("{} must be between 1 and 5", field));
            }
        }

        Ok(())
    }

    pub fn into_new_rating(self, rater_id: Uuid) -> NewRating {
        NewRating {
            session_id: self.session_id,
            rater_id,
            rated_id: self.rated_id,
            rating: self.rating,
            review_text: self.review_text,
            punctuality_rating: self.punctuality_rating,
            quality_rating: self.quality_rating,
            friendliness_rating: self.friendliness_rating,
            would_recommend: self.would_recommend,
        }
    }
}

/// Aggregate stored on host and dishwasher profiles
///
/// `average_rating` is the mean score times 100, rounded half up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingSummary {
    pub average_rating: i32,
    pub total_ratings: i32,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[Rating]) -> Option<Self> {
        if ratings.is_empty() {
            return None;
        }

        let sum: i64 = ratings.iter().map(|r| i64::from(r.rating)).sum();
        let count = ratings.len() as i64;

        Some(Self {
            average_rating: scaled_mean(sum, count),
            total_ratings: count as i32,
        })
    }

    pub fn mean(&self) -> f64 {
        f64::from(self.average_rating) / 100.0
    }
}

/// `round_half_up(sum * 100 / count)` in integer arithmetic
pub fn scaled_mean(sum: i64, count: i64) -> i32 {
    ((sum * 200 + count) / (2 * count)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rating: i32) -> CreateRatingRequest {
        CreateRatingRequest {
            session_id: Uuid::new_v4(),
            rated_id: Uuid::new_v4(),
            rating,
            review_text: None,
            punctuality_rating: None,
            quality_rating: None,
            friendliness_rating: None,
            would_recommend: true,
        }
    }

    #[test]
    fn test_scaled_mean_rounds_half_up() {
        // 4, 5, 5 -> 4.666.. -> 467
        assert_eq!(scaled_mean(14, 3), 467);
        // 4, 5 -> 4.5 -> 450
        assert_eq!(scaled_mean(9, 2), 450);
        // 1, 2, 2 -> 1.666.. -> 167
        assert_eq!(scaled_mean(5, 3), 167);
        // 1, 1, 1, 5 -> 2.0 -> 200
        assert_eq!(scaled_mean(8, 4), 200);
        // 2.005 sits exactly on the half
        assert_eq!(scaled_mean(401, 200), 201);
    }

    #[test]
    fn test_summary_of_no_ratings_is_none() {
        assert!(RatingSummary::from_ratings(&[]).is_none());
    }

    #[test]
    fn test_validate_rejects_out_of_range_scores() {
        assert!(request(3).validate().is_ok());
        assert!(request(0).validate().is_err());
        assert!(request(6).validate().is_err());

        let mut sub_score = request(4);
        sub_score.quality_rating = Some(7);
        assert_eq!(
            sub_score.validate().unwrap_err(),
            "quality_rating must be between 1 and 5"
        );
    }

    #[test]
    fn test_would_recommend_defaults_to_true() {
        let json = format!(
            r#"{{"session_id":"{}","rated_id":"{}","rating":5}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let request: CreateRatingRequest = serde_json::from_str(&json).unwrap();
        assert!(request.would_recommend);
    }
}
