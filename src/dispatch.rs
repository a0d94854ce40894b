//! Book / cancel / purchase actions.
//!
//! Every rendered control posts an [`ActionForm`]; it is parsed into a typed
//! [`Action`] and run through [`dispatch`]. On success the originating view
//! is reloaded, on failure the view is reloaded unchanged with an alert.

use crate::errors::{ApiError, AppError};
use crate::models::{BookingId, ClassId, SubscriptionTypeId, UserId};
use crate::reconcile::class_is_past;
use crate::source::DataSource;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{info, warn};

pub const PURCHASE_SUCCESS: &str =
    "Абонемент успешно приобретён! Теперь вы можете записаться на занятие.";
pub const ALREADY_PENDING: &str = "Запрос уже выполняется";
const CLASS_UNAVAILABLE: &str = "Не удалось получить данные о занятии";

/// Page an action was triggered from and returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Schedule,
    Bookings,
}

impl View {
    pub fn path(self) -> &'static str {
        match self {
            Self::Schedule => "/schedule",
            Self::Bookings => "/bookings",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Bookings => "bookings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Book {
        class_id: ClassId,
    },
    /// `class_id` enables the pre-flight date check when known.
    Cancel {
        booking_id: BookingId,
        class_id: Option<ClassId>,
    },
    Purchase {
        subscription_type_id: SubscriptionTypeId,
        class_id: ClassId,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Book { .. } => "book",
            Self::Cancel { .. } => "cancel",
            Self::Purchase { .. } => "purchase",
        }
    }

    /// Identifier fields carried by the rendered control.
    pub fn fields(&self) -> Vec<(&'static str, i64)> {
        match *self {
            Self::Book { class_id } => vec![("class_id", class_id)],
            Self::Cancel {
                booking_id,
                class_id,
            } => {
                let mut fields = vec![("booking_id", booking_id)];
                fields.extend(class_id.map(|id| ("class_id", id)));
                fields
            }
            Self::Purchase {
                subscription_type_id,
                class_id,
            } => vec![
                ("subscription_type_id", subscription_type_id),
                ("class_id", class_id),
            ],
        }
    }

    fn failure_fallback(&self) -> &'static str {
        match self {
            Self::Book { .. } => "Ошибка записи",
            Self::Cancel { .. } => "Ошибка отмены записи",
            Self::Purchase { .. } => "Ошибка при покупке абонемента",
        }
    }
}

/// Form body posted by every action control.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionForm {
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub view: Option<View>,
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub booking_id: Option<BookingId>,
    #[serde(default)]
    pub subscription_type_id: Option<SubscriptionTypeId>,
}

impl ActionForm {
    pub fn action(&self) -> Result<Action, AppError> {
        let require = |value: Option<i64>, name: &str| {
            value.ok_or_else(|| AppError::bad_request(format!("{name} is required")))
        };

        match self.kind.trim() {
            "book" => Ok(Action::Book {
                class_id: require(self.class_id, "class_id")?,
            }),
            "cancel" => Ok(Action::Cancel {
                booking_id: require(self.booking_id, "booking_id")?,
                class_id: self.class_id,
            }),
            "purchase" => Ok(Action::Purchase {
                subscription_type_id: require(self.subscription_type_id, "subscription_type_id")?,
                class_id: require(self.class_id, "class_id")?,
            }),
            other => Err(AppError::bad_request(format!("unknown action kind {other:?}"))),
        }
    }
}

/// Actions currently being processed, keyed by user and descriptor.
#[derive(Clone, Default)]
pub struct InFlight {
    pending: Arc<Mutex<HashSet<(UserId, Action)>>>,
}

pub struct InFlightGuard {
    pending: Arc<Mutex<HashSet<(UserId, Action)>>>,
    key: (UserId, Action),
}

impl InFlight {
    pub fn try_acquire(&self, user_id: UserId, action: Action) -> Option<InFlightGuard> {
        let key = (user_id, action);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(key) {
            return None;
        }
        Some(InFlightGuard {
            pending: Arc::clone(&self.pending),
            key,
        })
    }

    #[cfg(test)]
    fn is_pending(&self, user_id: UserId, action: Action) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(user_id, action))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Runs `action` for `user_id`.
///
/// `Ok` carries an optional notice to show after the reload; `Err` carries
/// the alert text for the failure.
pub async fn dispatch(
    source: &DataSource,
    in_flight: &InFlight,
    user_id: UserId,
    action: Action,
) -> Result<Option<&'static str>, String> {
    let Some(_guard) = in_flight.try_acquire(user_id, action) else {
        warn!(user_id, ?action, "duplicate action while one is pending");
        return Err(ALREADY_PENDING.to_string());
    };

    match run(source, user_id, action).await {
        Ok(notice) => {
            info!(user_id, kind = action.kind(), "action completed");
            Ok(notice)
        }
        Err(err) => {
            warn!(user_id, ?action, error = %err, "action failed");
            Err(err.user_message(action.failure_fallback()))
        }
    }
}

async fn run(
    source: &DataSource,
    user_id: UserId,
    action: Action,
) -> Result<Option<&'static str>, ApiError> {
    match action {
        Action::Book { class_id } => {
            ensure_upcoming(source, class_id, "Нельзя записаться на прошедшее занятие").await?;
            source.book(user_id, class_id).await?;
            Ok(None)
        }
        Action::Cancel {
            booking_id,
            class_id,
        } => {
            if let Some(class_id) = class_id {
                ensure_upcoming(source, class_id, "Нельзя отменить прошедшее занятие").await?;
            }
            source.cancel_booking(user_id, booking_id).await?;
            Ok(None)
        }
        Action::Purchase {
            subscription_type_id,
            class_id,
        } => {
            source.purchase(user_id, subscription_type_id).await?;
            info!(user_id, class_id, subscription_type_id, "subscription purchased");
            Ok(Some(PURCHASE_SUCCESS))
        }
    }
}

/// Best-effort check against a fresh copy of the class; the backend makes
/// the authoritative decision.
async fn ensure_upcoming(
    source: &DataSource,
    class_id: ClassId,
    past_message: &str,
) -> Result<(), ApiError> {
    let class = source.class(class_id).await.map_err(|err| {
        warn!(class_id, error = %err, "class re-check failed");
        ApiError::Rejected(CLASS_UNAVAILABLE.to_string())
    })?;

    if class_is_past(class.datetime, Local::now().naive_local()) {
        return Err(ApiError::Rejected(past_message.to_string()));
    }
    Ok(())
}
