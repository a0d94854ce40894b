use crate::dispatch::{dispatch, ActionForm};
use crate::errors::{ApiError, AppError};
use crate::identity::{resolve_user_id, HostContext};
use crate::models::{ClassId, UserId};
use crate::reconcile::{reconcile_bookings, reconcile_schedule, ClassView};
use crate::state::AppState;
use crate::ui::{
    href, render_bookings, render_error, render_main, render_schedule, render_subscriptions,
    Page, PurchaseOverlay,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Local;
use serde::Deserialize;
use tracing::error;

/// Query string of every page: host identity plus an optional alert left
/// by the previous action.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(flatten)]
    pub host: HostContext,
    #[serde(default)]
    pub alert: Option<String>,
}

impl PageQuery {
    fn user_id(&self, state: &AppState) -> UserId {
        resolve_user_id(&self.host, state.config.fallback_user_id)
    }
}

pub async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Html<String> {
    let user_id = query.user_id(&state);
    Html(render_main(&query.host, user_id))
}

pub async fn schedule(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    let user_id = query.user_id(&state);
    match load_schedule(&state, user_id).await {
        Ok(views) => {
            Html(render_schedule(&views, user_id, None, query.alert.as_deref())).into_response()
        }
        Err(err) => schedule_failed(err),
    }
}

pub async fn purchase_options(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Query(query): Query<PageQuery>,
) -> Response {
    let user_id = query.user_id(&state);
    let (views, options) = tokio::join!(
        load_schedule(&state, user_id),
        state.source.subscription_types(class_id),
    );

    let views = match views {
        Ok(views) => views,
        Err(err) => return schedule_failed(err),
    };
    let overlay = match options {
        Ok(options) => PurchaseOverlay::Options { class_id, options },
        Err(ApiError::Status { status: 404, .. }) => PurchaseOverlay::Options {
            class_id,
            options: Vec::new(),
        },
        Err(err) => {
            error!(class_id, error = %err, "failed to load subscription options");
            PurchaseOverlay::Failed {
                message: err.user_message("не удалось получить список абонементов"),
            }
        }
    };

    Html(render_schedule(
        &views,
        user_id,
        Some(&overlay),
        query.alert.as_deref(),
    ))
    .into_response()
}

pub async fn bookings(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    let user_id = query.user_id(&state);
    match state.source.bookings(user_id).await {
        Ok(bookings) => {
            let views = reconcile_bookings(&bookings, Local::now().naive_local());
            Html(render_bookings(&views, user_id, query.alert.as_deref())).into_response()
        }
        Err(err) => load_failed(Page::Bookings, "Ошибка загрузки записей", err),
    }
}

pub async fn subscriptions(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Response {
    let user_id = query.user_id(&state);
    match state.source.active_subscriptions(user_id).await {
        Ok(subscriptions) => Html(render_subscriptions(&subscriptions, user_id)).into_response(),
        Err(err) => load_failed(
            Page::Subscriptions,
            "Ошибка загрузки данных. Пожалуйста, попробуйте позже.",
            err,
        ),
    }
}

pub async fn action(
    State(state): State<AppState>,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, AppError> {
    let action = form.action()?;
    let host = HostContext {
        user_id: form.user_id.clone(),
        ..HostContext::default()
    };
    let user_id = resolve_user_id(&host, state.config.fallback_user_id);
    let view = form.view.unwrap_or_default();

    let alert = match dispatch(&state.source, &state.in_flight, user_id, action).await {
        Ok(notice) => notice.map(str::to_string),
        Err(message) => Some(message),
    };

    Ok(Redirect::to(&href(view.path(), user_id, alert.as_deref())))
}

async fn load_schedule(state: &AppState, user_id: UserId) -> Result<Vec<ClassView>, ApiError> {
    let data = state.source.schedule(user_id).await?;
    Ok(reconcile_schedule(
        &data,
        user_id,
        state.config.booking_match,
        Local::now().naive_local(),
    ))
}

fn schedule_failed(err: ApiError) -> Response {
    let message = format!(
        "Ошибка загрузки: {}",
        err.user_message("не удалось получить расписание")
    );
    load_failed(Page::Schedule, &message, err)
}

fn load_failed(page: Page, message: &str, err: ApiError) -> Response {
    error!(?page, error = %err, "page load failed");
    (StatusCode::BAD_GATEWAY, Html(render_error(page, message))).into_response()
}
