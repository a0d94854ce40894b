use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

pub type UserId = i64;
pub type ClassId = i64;
pub type BookingId = i64;
pub type SubscriptionTypeId = i64;

/// Treats an explicit `null` like a missing key.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSession {
    pub id: ClassId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    /// `None` when the class has no date yet; such a class counts as closed.
    #[serde(default)]
    pub datetime: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "nullable")]
    pub price: i64,
    #[serde(default)]
    pub max_participants: Option<i64>,
}

/// A booking as returned by `/api/user/bookings`.
///
/// The schedule page only relies on `id` and `class_id`; the remaining
/// fields feed the bookings page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub class_id: ClassId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "nullable")]
    pub class_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default)]
    pub class_datetime: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "nullable")]
    pub price: i64,
    #[serde(default)]
    pub can_cancel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionType {
    pub id: SubscriptionTypeId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    pub visits_allowed: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub price: i64,
    #[serde(default)]
    pub class_id: Option<ClassId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSubscription {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub class_name: String,
    pub class_id: ClassId,
    pub visits_allowed: i64,
    pub visits_remaining: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub price: i64,
    #[serde(default)]
    pub purchase_date: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookRequest {
    pub user_id: UserId,
    pub class_id: ClassId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub booking_id: BookingId,
    pub user_id: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub user_id: UserId,
    pub subscription_type_id: SubscriptionTypeId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Everything the schedule page needs, fetched in one join.
#[derive(Debug, Clone, Default)]
pub struct ScheduleData {
    pub classes: Vec<ClassSession>,
    pub subscriptions: Vec<ActiveSubscription>,
    pub bookings: Vec<Booking>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_decodes_from_bookings_endpoint_shape() {
        let booking: Booking = serde_json::from_value(serde_json::json!({
            "id": 7,
            "class_id": 1,
            "class_name": "Йога для начинающих",
            "description": "Базовые асаны",
            "class_datetime": "2026-10-20T10:00:00.123456",
            "price": 800,
            "can_cancel": true
        }))
        .unwrap();

        assert_eq!(booking.class_id, 1);
        assert_eq!(booking.user_id, None);
        assert!(booking.can_cancel);
        assert!(booking.class_datetime.is_some());
    }

    #[test]
    fn booking_tolerates_minimal_shape() {
        let booking: Booking =
            serde_json::from_value(serde_json::json!({ "id": 1, "class_id": 3 })).unwrap();
        assert_eq!(booking.class_name, "");
        assert!(!booking.can_cancel);
    }

    #[test]
    fn active_subscription_accepts_missing_purchase_date() {
        let sub: ActiveSubscription = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "Абонемент на 5 занятий",
            "class_name": "Йога для начинающих",
            "class_id": 1,
            "visits_allowed": 5,
            "visits_remaining": 3,
            "price": 3500,
            "purchase_date": null
        }))
        .unwrap();
        assert_eq!(sub.purchase_date, None);
        assert_eq!(sub.visits_remaining, 3);
    }

    #[test]
    fn class_list_survives_null_columns() {
        let classes: Vec<ClassSession> = serde_json::from_value(serde_json::json!([
            {
                "id": 1,
                "name": "Йога",
                "description": null,
                "datetime": "2026-10-20T10:00:00",
                "price": 800,
                "max_participants": 10
            },
            {
                "id": 2,
                "name": null,
                "description": "Без даты",
                "datetime": null,
                "price": null,
                "max_participants": null
            }
        ]))
        .unwrap();

        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].description, "");
        assert!(classes[0].datetime.is_some());
        assert_eq!(classes[1].name, "");
        assert_eq!(classes[1].datetime, None);
        assert_eq!(classes[1].price, 0);
    }

    #[test]
    fn booking_and_subscription_accept_null_labels() {
        let booking: Booking = serde_json::from_value(serde_json::json!({
            "id": 3,
            "class_id": 1,
            "class_name": null,
            "description": null,
            "class_datetime": null,
            "price": null,
            "can_cancel": false
        }))
        .unwrap();
        assert_eq!(booking.class_name, "");
        assert_eq!(booking.price, 0);

        let sub: ActiveSubscription = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "Абонемент",
            "class_name": null,
            "class_id": 1,
            "visits_allowed": 5,
            "visits_remaining": 5,
            "price": null
        }))
        .unwrap();
        assert_eq!(sub.class_name, "");
        assert_eq!(sub.price, 0);
    }
}
