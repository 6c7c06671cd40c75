use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, Time};
use uuid::Uuid;

use crate::geo::GeoPoint;

time::serde::format_description!(slot_time, Time, "[hour]:[minute]");

/// A food category. The remote store permits duplicate names; the feed
/// deduplicates on load (see `feed::services::load_categories`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
}

impl Category {
    /// Fallback set used when the store holds no categories at all.
    pub fn default_set() -> Vec<Category> {
        const DEFAULTS: &[(u128, &str, &str)] = &[
            (0x01, "Meals", "fork.knife"),
            (0x02, "Bakery", "birthday.cake"),
            (0x03, "Produce", "carrot"),
            (0x04, "Pantry", "cabinet"),
            (0x05, "Beverages", "cup.and.saucer"),
        ];
        DEFAULTS
            .iter()
            .map(|(id, name, icon)| Category {
                id: Uuid::from_u128(*id),
                name: (*name).to_string(),
                icon: (*icon).to_string(),
            })
            .collect()
    }
}

/// One weekly pickup window. Weekday 0 is Monday, 6 is Sunday. Several
/// slots may share a weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSlot {
    pub weekday: u8,
    #[serde(with = "slot_time")]
    pub start: Time,
    #[serde(with = "slot_time")]
    pub end: Time,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rater_id: Uuid,
    pub stars: f32,
    pub comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Where a listing stands in today's pickup schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupStatus {
    OpenNow,
    OpensToday,
    ClosedToday,
    Unscheduled,
}

/// A single shareable food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    /// Full category record, denormalized at creation time.
    pub category: Category,
    pub location: GeoPoint,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    /// None means the listing has no expiry policy and never expires.
    pub expires_at: Option<OffsetDateTime>,
    pub pickup_slots: Vec<PickupSlot>,
    pub is_available: bool,
    pub ratings: Vec<Rating>,
}

impl Listing {
    /// Mean of rating stars; None when unrated.
    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let sum: f64 = self.ratings.iter().map(|r| f64::from(r.stars)).sum();
        Some(sum / self.ratings.len() as f64)
    }

    /// Expiry is strict: a listing expiring exactly at `now` is still live.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        match self.expires_at {
            Some(at) => at < now,
            None => false,
        }
    }

    pub fn pickup_status(&self, now: OffsetDateTime) -> PickupStatus {
        if self.pickup_slots.is_empty() {
            return PickupStatus::Unscheduled;
        }
        let today = now.weekday().number_days_from_monday();
        let time = now.time();
        let mut opens_later = false;
        for slot in &self.pickup_slots {
            if slot.weekday != today {
                continue;
            }
            if slot.start <= time && time <= slot.end {
                return PickupStatus::OpenNow;
            }
            if time < slot.start {
                opens_later = true;
            }
        }
        if opens_later {
            PickupStatus::OpensToday
        } else {
            PickupStatus::ClosedToday
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use time::macros::datetime;

    pub(crate) const NOW: OffsetDateTime = datetime!(2026-08-01 12:00 UTC);

    pub(crate) fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    pub(crate) fn category(name: &str) -> Category {
        Category {
            id: id(0xC0),
            name: name.to_string(),
            icon: "fork.knife".to_string(),
        }
    }

    /// A valid available listing in central Berlin, created at `NOW`,
    /// without expiry, slots or ratings. Tests tweak fields as needed.
    pub(crate) fn listing(n: u128, title: &str) -> Listing {
        Listing {
            id: id(n),
            owner_id: id(0xFF),
            title: title.to_string(),
            description: String::new(),
            category: category("Meals"),
            location: GeoPoint::new(52.5200, 13.4050),
            address: None,
            created_at: NOW,
            expires_at: None,
            pickup_slots: Vec::new(),
            is_available: true,
            ratings: Vec::new(),
        }
    }
}
