//! Selection of certificates whose expiry is due for a reminder.

use chrono::{DateTime, Duration, Utc};

use certkeep_core::time::format_day;

use crate::storage::{Database, DatabaseError};

/// How many days before expiry a reminder goes out. Zero is expiry day.
pub const EXPIRY_THRESHOLDS_DAYS: [i64; 3] = [30, 7, 0];

/// One reminder ready for delivery.
#[derive(Debug, Clone)]
pub struct DueNotification {
    pub owner_id: i64,
    pub organization: String,
    pub director: String,
    pub valid_to: i64,
    pub days_remaining: i64,
}

impl DueNotification {
    /// Human-readable reminder text.
    pub fn message(&self) -> String {
        let day = format_day(self.valid_to);
        if self.days_remaining == 0 {
            format!(
                "Certificate for {} ({}) expires today, {day}",
                self.organization, self.director
            )
        } else {
            format!(
                "Certificate for {} ({}) expires in {} days, on {day}",
                self.organization, self.director, self.days_remaining
            )
        }
    }
}

/// Collect every reminder due at the given moment.
///
/// A certificate is due when its expiry falls on the calendar day exactly
/// 30, 7 or 0 days from `now`, whatever its time of day.
pub async fn due_notifications(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<DueNotification>, DatabaseError> {
    let mut due = Vec::new();

    for days in EXPIRY_THRESHOLDS_DAYS {
        let target = (now + Duration::days(days)).date_naive();
        for cert in db.find_expiring(target).await? {
            due.push(DueNotification {
                owner_id: cert.owner_id,
                organization: cert.organization,
                director: cert.director,
                valid_to: cert.valid_to,
                days_remaining: days,
            });
        }
    }

    Ok(due)
}
