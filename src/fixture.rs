//! In-memory stand-in for the studio backend.
//!
//! Used when `DATA_SOURCE=fixture` so the pages can be exercised without a
//! running backend. Mutations follow the backend's rules and error texts.

use crate::errors::ApiError;
use crate::models::{
    ActiveSubscription, Booking, BookingId, ClassId, ClassSession, SubscriptionType,
    SubscriptionTypeId, UserId,
};
use crate::reconcile::class_is_past;
use chrono::{Duration, Local, NaiveDateTime};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone)]
pub struct OwnedSubscription {
    pub id: i64,
    pub user_id: UserId,
    pub subscription_type_id: SubscriptionTypeId,
    pub visits_remaining: i64,
    pub purchase_date: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct StoredBooking {
    pub id: BookingId,
    pub user_id: UserId,
    pub class_id: ClassId,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureData {
    pub classes: Vec<ClassSession>,
    pub subscription_types: Vec<SubscriptionType>,
    pub subscriptions: Vec<OwnedSubscription>,
    pub bookings: Vec<StoredBooking>,
}

impl FixtureData {
    /// Demo studio: three upcoming classes and one that already happened.
    /// `user_id` owns a subscription for the first class and two bookings.
    pub fn seeded(now: NaiveDateTime, user_id: UserId) -> Self {
        let class = |id, name: &str, description: &str, offset: Duration, capacity, price| {
            ClassSession {
                id,
                name: name.to_string(),
                description: description.to_string(),
                datetime: Some(now + offset),
                price,
                max_participants: Some(capacity),
            }
        };
        let subscription_type = |id, name: &str, class_id, visits_allowed, price| SubscriptionType {
            id,
            name: name.to_string(),
            visits_allowed,
            price,
            class_id: Some(class_id),
        };

        Self {
            classes: vec![
                class(
                    1,
                    "Йога для начинающих",
                    "Базовые асаны для новичков. Подходит для любого уровня подготовки.",
                    Duration::days(1),
                    10,
                    800,
                ),
                class(
                    2,
                    "Продвинутая йога",
                    "Сложные асаны и последовательности для опытных практиков.",
                    Duration::days(2),
                    8,
                    1000,
                ),
                class(
                    3,
                    "Йога для беременных",
                    "Специальные упражнения для будущих мам.",
                    Duration::days(3),
                    6,
                    900,
                ),
                class(
                    4,
                    "Хатха-йога",
                    "Спокойная практика с акцентом на дыхание.",
                    Duration::days(-1),
                    12,
                    700,
                ),
            ],
            subscription_types: vec![
                subscription_type(1, "Абонемент на 5 занятий", 1, 5, 3500),
                subscription_type(2, "Абонемент на 10 занятий", 1, 10, 6000),
                subscription_type(3, "Абонемент на 10 занятий", 2, 10, 6000),
            ],
            subscriptions: vec![OwnedSubscription {
                id: 1,
                user_id,
                subscription_type_id: 1,
                visits_remaining: 3,
                purchase_date: now - Duration::days(10),
            }],
            bookings: vec![
                StoredBooking {
                    id: 1,
                    user_id,
                    class_id: 1,
                },
                StoredBooking {
                    id: 2,
                    user_id,
                    class_id: 4,
                },
            ],
        }
    }

    fn class(&self, class_id: ClassId) -> Option<&ClassSession> {
        self.classes.iter().find(|c| c.id == class_id)
    }

    fn subscription_type(&self, id: SubscriptionTypeId) -> Option<&SubscriptionType> {
        self.subscription_types.iter().find(|t| t.id == id)
    }
}

#[derive(Clone, Default)]
pub struct FixtureStore {
    data: Arc<Mutex<FixtureData>>,
}

impl FixtureStore {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn classes(&self, _user_id: UserId) -> Result<Vec<ClassSession>, ApiError> {
        Ok(self.data.lock().await.classes.clone())
    }

    pub async fn class(&self, class_id: ClassId) -> Result<ClassSession, ApiError> {
        self.data
            .lock()
            .await
            .class(class_id)
            .cloned()
            .ok_or_else(|| ApiError::status(404, "Class not found"))
    }

    pub async fn subscription_types(
        &self,
        class_id: ClassId,
    ) -> Result<Vec<SubscriptionType>, ApiError> {
        let data = self.data.lock().await;
        let types: Vec<_> = data
            .subscription_types
            .iter()
            .filter(|t| t.class_id == Some(class_id))
            .cloned()
            .collect();
        if types.is_empty() {
            return Err(ApiError::status(
                404,
                "No subscription types found for this class",
            ));
        }
        Ok(types)
    }

    pub async fn active_subscriptions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ActiveSubscription>, ApiError> {
        let data = self.data.lock().await;
        let subscriptions = data
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id && s.visits_remaining > 0)
            .filter_map(|s| {
                let kind = data.subscription_type(s.subscription_type_id)?;
                let class = data.class(kind.class_id?)?;
                Some(ActiveSubscription {
                    id: s.id,
                    name: kind.name.clone(),
                    class_name: class.name.clone(),
                    class_id: class.id,
                    visits_allowed: kind.visits_allowed,
                    visits_remaining: s.visits_remaining,
                    price: kind.price,
                    purchase_date: Some(s.purchase_date),
                })
            })
            .collect();
        Ok(subscriptions)
    }

    pub async fn bookings(&self, user_id: UserId) -> Result<Vec<Booking>, ApiError> {
        let now = Local::now().naive_local();
        let data = self.data.lock().await;
        let bookings = data
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| {
                let class = data.class(b.class_id)?;
                Some(Booking {
                    id: b.id,
                    class_id: class.id,
                    user_id: Some(b.user_id),
                    class_name: class.name.clone(),
                    description: class.description.clone(),
                    class_datetime: class.datetime,
                    price: class.price,
                    can_cancel: !class_is_past(class.datetime, now),
                })
            })
            .collect();
        Ok(bookings)
    }

    pub async fn book(&self, user_id: UserId, class_id: ClassId) -> Result<(), ApiError> {
        let now = Local::now().naive_local();
        let mut data = self.data.lock().await;
        let class = data
            .class(class_id)
            .cloned()
            .ok_or_else(|| ApiError::status(404, "Class not found"))?;

        if class_is_past(class.datetime, now) {
            return Err(ApiError::status(400, "Class elready finished"));
        }
        if data
            .bookings
            .iter()
            .any(|b| b.user_id == user_id && b.class_id == class_id)
        {
            return Err(ApiError::status(400, "User already booked this class"));
        }
        let taken = data.bookings.iter().filter(|b| b.class_id == class_id).count() as i64;
        if class.max_participants.is_some_and(|max| taken >= max) {
            return Err(ApiError::status(400, "No available spots left"));
        }

        let id = data.bookings.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        data.bookings.push(StoredBooking {
            id,
            user_id,
            class_id,
        });
        info!(user_id, class_id, booking_id = id, "fixture booking created");
        Ok(())
    }

    pub async fn cancel_booking(
        &self,
        user_id: UserId,
        booking_id: BookingId,
    ) -> Result<(), ApiError> {
        let now = Local::now().naive_local();
        let mut data = self.data.lock().await;
        let index = data
            .bookings
            .iter()
            .position(|b| b.id == booking_id && b.user_id == user_id)
            .ok_or_else(|| ApiError::status(404, "Booking not found"))?;
        let class = data
            .class(data.bookings[index].class_id)
            .ok_or_else(|| ApiError::status(404, "Class not found"))?;

        if class_is_past(class.datetime, now) {
            return Err(ApiError::status(400, "Cannot cancel past class"));
        }

        data.bookings.remove(index);
        info!(user_id, booking_id, "fixture booking cancelled");
        Ok(())
    }

    pub async fn purchase(
        &self,
        user_id: UserId,
        subscription_type_id: SubscriptionTypeId,
    ) -> Result<(), ApiError> {
        let now = Local::now().naive_local();
        let mut data = self.data.lock().await;
        let visits_allowed = data
            .subscription_type(subscription_type_id)
            .map(|t| t.visits_allowed)
            .ok_or_else(|| ApiError::status(404, "Subscription type not found"))?;

        let id = data.subscriptions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        data.subscriptions.push(OwnedSubscription {
            id,
            user_id,
            subscription_type_id,
            visits_remaining: visits_allowed,
            purchase_date: now,
        });
        info!(user_id, subscription_type_id, subscription_id = id, "fixture subscription purchased");
        Ok(())
    }
}
