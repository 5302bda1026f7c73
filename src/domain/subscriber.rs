use chrono::{DateTime, Utc};

use crate::domain::confirmed_at;
use crate::domain::subscriber_email::SubscriberEmail;

/// A subscriber as kept by the store, independent of any wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub id: i64,
    pub email: SubscriberEmail,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub opt_out: bool,
}

impl Subscriber {
    /// Builds a subscriber from its wire fields, where `confirmed_at` is in
    /// seconds since the Unix epoch.
    pub fn parse(
        id: i64,
        email: String,
        confirmed_at: i64,
        opt_out: bool,
    ) -> Result<Subscriber, String> {
        let email = SubscriberEmail::parse(email)?;
        let confirmed_at = confirmed_at::from_seconds(confirmed_at)?;

        Ok(Subscriber {
            id,
            email,
            confirmed_at,
            opt_out,
        })
    }

    pub fn confirmed_at_seconds(&self) -> i64 {
        confirmed_at::to_seconds(self.confirmed_at)
    }
}
