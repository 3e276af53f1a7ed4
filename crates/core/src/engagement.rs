//! Engagement metrics.
//!
//! Two distinct numbers live here and are never merged:
//! - `engagement_score`: weighted ranking score (view velocity, reach per
//!   subscriber, like and comment rates).
//! - `engagement_rate`: plain `(likes + comments) / views` percentage, used for
//!   filtering and display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const VIEWS_PER_DAY_WEIGHT: f64 = 0.4;
pub const VIEWS_PER_SUBSCRIBER_WEIGHT: f64 = 0.2;
pub const LIKE_RATE_WEIGHT: f64 = 0.25;
pub const COMMENT_RATE_WEIGHT: f64 = 0.15;
/// Rates are fractions; scale them so they are not swamped by the per-day terms.
pub const RATE_SCALE: f64 = 1000.0;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementInputs {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub subscriber_count: u64,
    pub published_at: DateTime<Utc>,
}

/// Intermediate terms of the weighted score, kept for display and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementBreakdown {
    pub days_since_publication: u64,
    pub views_per_day: f64,
    pub views_per_subscriber: f64,
    pub like_rate: f64,
    pub comment_rate: f64,
    pub score: f64,
}

/// Whole days between publication and `now`, never less than one.
///
/// Future timestamps (clock skew, scheduled premieres) also clamp to one.
pub fn days_since_publication(published_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let elapsed = (now - published_at).num_seconds();
    let days = elapsed.div_euclid(SECONDS_PER_DAY);
    days.max(1) as u64
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn engagement_breakdown(inputs: &EngagementInputs, now: DateTime<Utc>) -> EngagementBreakdown {
    // zero subscribers is treated as one: a documented approximation, not a reach value
    let subscribers = inputs.subscriber_count.max(1);
    let days = days_since_publication(inputs.published_at, now);

    let views_per_day = ratio(inputs.views, days);
    let views_per_subscriber = ratio(inputs.views, subscribers);
    let like_rate = ratio(inputs.likes, inputs.views);
    let comment_rate = ratio(inputs.comments, inputs.views);

    let score = VIEWS_PER_DAY_WEIGHT * views_per_day
        + VIEWS_PER_SUBSCRIBER_WEIGHT * views_per_subscriber
        + LIKE_RATE_WEIGHT * like_rate * RATE_SCALE
        + COMMENT_RATE_WEIGHT * comment_rate * RATE_SCALE;

    EngagementBreakdown {
        days_since_publication: days,
        views_per_day,
        views_per_subscriber,
        like_rate,
        comment_rate,
        score,
    }
}

/// Weighted ranking score evaluated at `now`.
pub fn engagement_score(inputs: &EngagementInputs, now: DateTime<Utc>) -> f64 {
    engagement_breakdown(inputs, now).score
}

/// `(likes + comments) / views * 100`, or 0 when there are no views.
pub fn engagement_rate(views: u64, likes: u64, comments: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    (likes as f64 + comments as f64) / views as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn inputs(views: u64, likes: u64, comments: u64, subs: u64, age: Duration) -> EngagementInputs {
        EngagementInputs {
            views,
            likes,
            comments,
            subscriber_count: subs,
            published_at: now() - age,
        }
    }

    #[test]
    fn test_weighted_score() {
        let score = engagement_score(&inputs(1000, 100, 10, 100, Duration::days(1)), now());
        // 0.4*1000 + 0.2*10 + 0.25*0.1*1000 + 0.15*0.01*1000
        assert!((score - 428.5).abs() < 1e-9);
    }

    #[test]
    fn test_days_are_floored_and_clamped() {
        assert_eq!(days_since_publication(now(), now()), 1);
        assert_eq!(days_since_publication(now() - Duration::hours(47), now()), 1);
        assert_eq!(days_since_publication(now() - Duration::hours(49), now()), 2);
        assert_eq!(days_since_publication(now() + Duration::days(3), now()), 1);
        assert_eq!(days_since_publication(now() - Duration::days(30), now()), 30);
    }

    #[test]
    fn test_zero_guards_keep_score_finite() {
        let breakdown = engagement_breakdown(&inputs(0, 0, 0, 0, Duration::zero()), now());
        assert!(breakdown.score.is_finite());
        assert_eq!(breakdown.score, 0.0);
        assert_eq!(breakdown.like_rate, 0.0);
        assert_eq!(breakdown.comment_rate, 0.0);
    }

    #[test]
    fn test_zero_subscribers_treated_as_one() {
        let zero = engagement_score(&inputs(500, 0, 0, 0, Duration::days(10)), now());
        let one = engagement_score(&inputs(500, 0, 0, 1, Duration::days(10)), now());
        assert_eq!(zero, one);
    }

    #[test]
    fn test_engagement_rate() {
        assert_eq!(engagement_rate(0, 10, 10), 0.0);
        assert!((engagement_rate(1000, 40, 10) - 5.0).abs() < 1e-9);
        assert!((engagement_rate(200, 0, 1) - 0.5).abs() < 1e-9);
    }
}
