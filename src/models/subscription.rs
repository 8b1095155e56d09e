//! Subscriptions and the recipients that own them.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Internal recipient identifier.
pub type RecipientId = i64;

/// Internal subscription identifier.
pub type SubscriptionId = i64;

/// An addressable notification target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Recipient {
    pub id: RecipientId,
    /// Telegram chat id, kept as text
    pub delivery_address: String,
    /// Cleared once the address turned out to be permanently unreachable
    pub active: bool,
}

/// A recipient's standing search criteria.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub recipient_id: RecipientId,
    /// Free-text query, comma separated as entered
    pub keywords: String,
    /// City name or hh.ru area id
    pub location_filter: Option<String>,
    /// hh.ru experience code, e.g. `between1And3`
    pub experience_filter: Option<String>,
    pub min_salary: Option<i64>,
    pub active: bool,
}

impl Subscription {
    /// Reject criteria the search source cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.keywords.trim().is_empty() {
            return Err(AppError::contract(
                format!("subscription {}", self.id),
                "keywords are empty",
            ));
        }
        if let Some(salary) = self.min_salary {
            if salary < 0 {
                return Err(AppError::contract(
                    format!("subscription {}", self.id),
                    format!("negative minimum salary {salary}"),
                ));
            }
        }
        Ok(())
    }
}

/// Input for registering a subscription.
#[derive(Debug, Clone, Default)]
pub struct NewSubscription {
    pub keywords: String,
    pub location_filter: Option<String>,
    pub experience_filter: Option<String>,
    pub min_salary: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(keywords: &str) -> Subscription {
        Subscription {
            id: 1,
            recipient_id: 1,
            keywords: keywords.to_string(),
            location_filter: None,
            experience_filter: None,
            min_salary: None,
            active: true,
        }
    }

    #[test]
    fn test_validate() {
        assert!(subscription("rust, tokio").validate().is_ok());
        assert!(subscription("   ").validate().is_err());

        let mut negative = subscription("rust");
        negative.min_salary = Some(-1);
        assert!(matches!(
            negative.validate(),
            Err(AppError::Contract { .. })
        ));
    }
}
