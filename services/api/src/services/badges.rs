//! Profile badges derived from a user's activity

use chrono::{DateTime, Utc};

use crate::models::user::{Badge, BadgeCategory, UserStatistics};

const VERIFIED: Badge = Badge {
    id: "verified",
    name: "Verified",
    description: "Email verified account",
    icon: "shield-check",
    color: "blue",
    category: BadgeCategory::Verification,
};

const LEGENDARY_HOST: Badge = Badge {
    id: "legendary-host",
    name: "Legendary Host",
    description: "100+ meals hosted",
    icon: "crown",
    color: "purple",
    category: BadgeCategory::Achievement,
};

const SUPER_HOST: Badge = Badge {
    id: "super-host",
    name: "Super Host",
    description: "50+ meals hosted",
    icon: "star",
    color: "gold",
    category: BadgeCategory::Achievement,
};

const TOP_HOST: Badge = Badge {
    id: "top-host",
    name: "Top Host",
    description: "10+ meals hosted",
    icon: "chef-hat",
    color: "orange",
    category: BadgeCategory::Achievement,
};

const MASTER_DISHWASHER: Badge = Badge {
    id: "master-dishwasher",
    name: "Master Dishwasher",
    description: "100+ sessions completed",
    icon: "trophy",
    color: "purple",
    category: BadgeCategory::Achievement,
};

const EXPERT_DISHWASHER: Badge = Badge {
    id: "expert-dishwasher",
    name: "Expert Dishwasher",
    description: "50+ sessions completed",
    icon: "award",
    color: "gold",
    category: BadgeCategory::Achievement,
};

const PRO_DISHWASHER: Badge = Badge {
    id: "pro-dishwasher",
    name: "Pro Dishwasher",
    description: "10+ sessions completed",
    icon: "sparkles",
    color: "blue",
    category: BadgeCategory::Achievement,
};

const FIVE_STAR: Badge = Badge {
    id: "5-star",
    name: "5-Star Member",
    description: "4.8+ average rating",
    icon: "star",
    color: "yellow",
    category: BadgeCategory::Rating,
};

const HIGHLY_RATED: Badge = Badge {
    id: "highly-rated",
    name: "Highly Rated",
    description: "4.5+ average rating",
    icon: "thumbs-up",
    color: "green",
    category: BadgeCategory::Rating,
};

const CENTURY_CLUB: Badge = Badge {
    id: "century-club",
    name: "Century Club",
    description: "100+ total sessions",
    icon: "medal",
    color: "gold",
    category: BadgeCategory::Milestone,
};

const EARLY_ADOPTER: Badge = Badge {
    id: "early-adopter",
    name: "Early Adopter",
    description: "Member for 6+ months",
    icon: "calendar",
    color: "indigo",
    category: BadgeCategory::Milestone,
};

const CONSISTENT: Badge = Badge {
    id: "consistent",
    name: "Consistent",
    description: "Active member",
    icon: "check-circle",
    color: "teal",
    category: BadgeCategory::Milestone,
};

/// Minimum number of ratings before rating badges apply
const MIN_RATINGS_FOR_BADGE: u32 = 5;

fn tier(count: u32, tiers: [(u32, Badge); 3]) -> Option<Badge> {
    tiers
        .into_iter()
        .find(|(threshold, _)| count >= *threshold)
        .map(|(_, badge)| badge)
}

/// Compute the badges a user has earned
pub fn calculate_badges(
    stats: &UserStatistics,
    email_verified: bool,
    member_since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<Badge> {
    let mut badges = Vec::new();

    if email_verified {
        badges.push(VERIFIED);
    }

    badges.extend(tier(
        stats.completed_sessions_hosted,
        [(100, LEGENDARY_HOST), (50, SUPER_HOST), (10, TOP_HOST)],
    ));
    badges.extend(tier(
        stats.completed_sessions_washed,
        [
            (100, MASTER_DISHWASHER),
            (50, EXPERT_DISHWASHER),
            (10, PRO_DISHWASHER),
        ],
    ));

    if stats.total_ratings >= MIN_RATINGS_FOR_BADGE {
        if stats.average_rating >= 4.8 {
            badges.push(FIVE_STAR);
        } else if stats.average_rating >= 4.5 {
            badges.push(HIGHLY_RATED);
        }
    }

    let total_completed = stats.total_completed();
    if total_completed >= 100 {
        badges.push(CENTURY_CLUB);
    }

    let account_age_days = (now - member_since).num_days();
    if account_age_days >= 180 {
        badges.push(EARLY_ADOPTER);
    }

    // One completed session per 30 days of membership
    if account_age_days >= 30 && i64::from(total_completed) * 30 >= account_age_days {
        badges.push(CONSISTENT);
    }

    badges
}
