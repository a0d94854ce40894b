use crate::errors::ApiError;
use crate::models::{
    ActiveSubscription, BookRequest, Booking, BookingId, CancelBookingRequest, ClassId,
    ClassSession, ErrorBody, PurchaseRequest, SubscriptionType, SubscriptionTypeId, UserId,
};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the studio backend HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub async fn classes(&self, user_id: UserId) -> Result<Vec<ClassSession>, ApiError> {
        self.get("/api/classes", &[("user_id", user_id)]).await
    }

    pub async fn class(&self, class_id: ClassId) -> Result<ClassSession, ApiError> {
        self.get(&format!("/api/class/{class_id}"), &[]).await
    }

    pub async fn subscription_types(
        &self,
        class_id: ClassId,
    ) -> Result<Vec<SubscriptionType>, ApiError> {
        self.get(&format!("/api/class/{class_id}/subscription_types"), &[])
            .await
    }

    pub async fn active_subscriptions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ActiveSubscription>, ApiError> {
        self.get("/api/user/active_subscriptions", &[("user_id", user_id)])
            .await
    }

    pub async fn bookings(&self, user_id: UserId) -> Result<Vec<Booking>, ApiError> {
        self.get("/api/user/bookings", &[("user_id", user_id)]).await
    }

    pub async fn book(&self, user_id: UserId, class_id: ClassId) -> Result<(), ApiError> {
        self.post("/api/book", &BookRequest { user_id, class_id })
            .await
    }

    pub async fn cancel_booking(
        &self,
        user_id: UserId,
        booking_id: BookingId,
    ) -> Result<(), ApiError> {
        self.post(
            "/api/cancel_booking",
            &CancelBookingRequest {
                booking_id,
                user_id,
            },
        )
        .await
    }

    pub async fn purchase(
        &self,
        user_id: UserId,
        subscription_type_id: SubscriptionTypeId,
    ) -> Result<(), ApiError> {
        self.post(
            "/api/subscriptions/purchase",
            &PurchaseRequest {
                user_id,
                subscription_type_id,
            },
        )
        .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, i64)],
    ) -> Result<T, ApiError> {
        debug!(path, "backend GET");
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .await?;
        let response = check_status(path, response).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        debug!(path, "backend POST");
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        check_status(path, response).await?;
        Ok(())
    }
}

async fn check_status(path: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.error);
    warn!(path, status = status.as_u16(), ?message, "backend call failed");

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
