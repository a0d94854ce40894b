use crate::api::ApiClient;
use crate::config::{Config, DataSourceKind};
use crate::errors::ApiError;
use crate::fixture::{FixtureData, FixtureStore};
use crate::models::{
    ActiveSubscription, Booking, BookingId, ClassId, ClassSession, ScheduleData,
    SubscriptionType, SubscriptionTypeId, UserId,
};
use chrono::Local;
use tracing::info;

/// Backend the pages read from and mutate through.
#[derive(Clone)]
pub enum DataSource {
    Live(ApiClient),
    Fixture(FixtureStore),
}

macro_rules! delegate {
    ($self:ident . $method:ident ( $($arg:expr),* )) => {
        match $self {
            DataSource::Live(api) => api.$method($($arg),*).await,
            DataSource::Fixture(store) => store.$method($($arg),*).await,
        }
    };
}

impl DataSource {
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        match config.data_source {
            DataSourceKind::Live => {
                info!(backend = %config.backend_url, "using live backend");
                Ok(Self::Live(ApiClient::new(
                    config.backend_url.clone(),
                    config.request_timeout,
                )?))
            }
            DataSourceKind::Fixture => {
                info!("using in-memory fixture data");
                Ok(Self::Fixture(FixtureStore::new(FixtureData::seeded(
                    Local::now().naive_local(),
                    config.fallback_user_id,
                ))))
            }
        }
    }

    pub async fn classes(&self, user_id: UserId) -> Result<Vec<ClassSession>, ApiError> {
        delegate!(self.classes(user_id))
    }

    pub async fn class(&self, class_id: ClassId) -> Result<ClassSession, ApiError> {
        delegate!(self.class(class_id))
    }

    pub async fn subscription_types(
        &self,
        class_id: ClassId,
    ) -> Result<Vec<SubscriptionType>, ApiError> {
        delegate!(self.subscription_types(class_id))
    }

    pub async fn active_subscriptions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ActiveSubscription>, ApiError> {
        delegate!(self.active_subscriptions(user_id))
    }

    pub async fn bookings(&self, user_id: UserId) -> Result<Vec<Booking>, ApiError> {
        delegate!(self.bookings(user_id))
    }

    pub async fn book(&self, user_id: UserId, class_id: ClassId) -> Result<(), ApiError> {
        delegate!(self.book(user_id, class_id))
    }

    pub async fn cancel_booking(
        &self,
        user_id: UserId,
        booking_id: BookingId,
    ) -> Result<(), ApiError> {
        delegate!(self.cancel_booking(user_id, booking_id))
    }

    pub async fn purchase(
        &self,
        user_id: UserId,
        subscription_type_id: SubscriptionTypeId,
    ) -> Result<(), ApiError> {
        delegate!(self.purchase(user_id, subscription_type_id))
    }

    /// Fetches classes, active subscriptions and bookings concurrently.
    /// The first failure aborts the whole load.
    pub async fn schedule(&self, user_id: UserId) -> Result<ScheduleData, ApiError> {
        let (classes, subscriptions, bookings) = tokio::try_join!(
            self.classes(user_id),
            self.active_subscriptions(user_id),
            self.bookings(user_id),
        )?;
        Ok(ScheduleData {
            classes,
            subscriptions,
            bookings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schedule_join_collects_all_three_collections() {
        let now = Local::now().naive_local();
        let source = DataSource::Fixture(FixtureStore::new(FixtureData::seeded(now, 9)));
        let data = source.schedule(9).await.unwrap();
        assert_eq!(data.classes.len(), 4);
        assert_eq!(data.subscriptions.len(), 1);
        assert_eq!(data.bookings.len(), 2);
    }

    #[tokio::test]
    async fn schedule_join_fails_fast_on_transport_error() {
        let api = ApiClient::new("http://127.0.0.1:1", std::time::Duration::from_secs(1)).unwrap();
        let err = DataSource::Live(api).schedule(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
