use crate::dispatch::{Action, View};
use crate::identity::{greeting, HostContext};
use crate::models::{ActiveSubscription, ClassId, SubscriptionType, UserId};
use crate::reconcile::{ActionState, BookingView, ClassView};
use chrono::NaiveDateTime;
use reqwest::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Main,
    Schedule,
    Bookings,
    Subscriptions,
}

impl Page {
    fn title(self) -> &'static str {
        match self {
            Self::Main => "Студия йоги",
            Self::Schedule => "Расписание занятий",
            Self::Bookings => "Мои записи",
            Self::Subscriptions => "Мои абонементы",
        }
    }

    fn container(self) -> &'static str {
        match self {
            Self::Main => "main-container",
            Self::Schedule => "schedule-container",
            Self::Bookings => "bookings-container",
            Self::Subscriptions => "subscriptions-container",
        }
    }
}

/// Content of the purchase overlay opened from a schedule card.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOverlay {
    Options {
        class_id: ClassId,
        options: Vec<SubscriptionType>,
    },
    Failed {
        message: String,
    },
}

pub fn render_main(host: &HostContext, user_id: UserId) -> String {
    let body = format!(
        r#"<header>
      <h1 id="username">{greeting}</h1>
      <p class="subtitle">Запишитесь на занятие или посмотрите свои абонементы.</p>
    </header>
    <nav class="menu">
      <a class="menu-item" href="{schedule}">📅 Расписание</a>
      <a class="menu-item" href="{subscriptions}">💳 Мои абонементы</a>
      <a class="menu-item" href="{bookings}">📝 Мои записи</a>
    </nav>"#,
        greeting = escape_html(&greeting(host)),
        schedule = escape_html(&href("/schedule", user_id, None)),
        subscriptions = escape_html(&href("/subscriptions", user_id, None)),
        bookings = escape_html(&href("/bookings", user_id, None)),
    );
    render_page(Page::Main, &body, None)
}

pub fn render_schedule(
    views: &[ClassView],
    user_id: UserId,
    overlay: Option<&PurchaseOverlay>,
    alert: Option<&str>,
) -> String {
    let cards = if views.is_empty() {
        r#"<p class="empty-state">Нет запланированных занятий</p>"#.to_string()
    } else {
        views
            .iter()
            .map(|view| class_card(view, user_id))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut body = format!(
        r#"{back}
    <h1 class="classes-title">📅 Расписание занятий</h1>
    <div class="classes-grid" id="classes-list">
{cards}
    </div>"#,
        back = back_link(user_id),
    );
    if let Some(overlay) = overlay {
        body.push_str(&purchase_overlay(overlay, user_id));
    }
    render_page(Page::Schedule, &body, alert)
}

pub fn class_card(view: &ClassView, user_id: UserId) -> String {
    let class = &view.class;
    let past_badge = if view.is_past {
        r#"<div class="past-badge">Прошло</div>"#
    } else {
        ""
    };
    let booked_badge = if view.is_booked {
        r#"<div class="booking-badge">Вы записаны</div>"#
    } else {
        ""
    };

    let control = match view.action {
        ActionState::Closed => {
            r#"<button class="action-button" type="button" disabled>Запись закрыта</button>"#
                .to_string()
        }
        ActionState::Cancel { booking_id } => action_form(
            &Action::Cancel {
                booking_id,
                class_id: Some(class.id),
            },
            View::Schedule,
            user_id,
            "action-button cancel-button",
            "Не приду",
            false,
        ),
        ActionState::Book => action_form(
            &Action::Book { class_id: class.id },
            View::Schedule,
            user_id,
            "action-button book-button",
            "Записаться",
            false,
        ),
        ActionState::Purchase => format!(
            r#"<form method="get" action="/schedule/classes/{id}/subscription_types">
          <input type="hidden" name="user_id" value="{user_id}" />
          <button class="action-button subscribe-button" type="submit">Купить абонемент</button>
        </form>"#,
            id = class.id,
        ),
    };

    format!(
        r#"      <div class="class-card" data-class-id="{id}" data-action="{state}">
        <h3 class="class-title">{name}</h3>
        {past_badge}{booked_badge}
        <div class="class-meta">
          <span>📅 {when}</span>
          <span>{price} ₽</span>
        </div>
        <p class="class-description">{description}</p>
        <div class="class-actions">
        {control}
        </div>
      </div>"#,
        id = class.id,
        state = action_state_name(view.action),
        name = escape_html(&class.name),
        when = format_when(class.datetime),
        price = class.price,
        description = escape_html(&class.description),
    )
}

fn purchase_overlay(overlay: &PurchaseOverlay, user_id: UserId) -> String {
    let content = match overlay {
        PurchaseOverlay::Options { options, .. } if options.is_empty() => {
            "<p>Нет доступных абонементов для этого занятия</p>".to_string()
        }
        PurchaseOverlay::Options { class_id, options } => options
            .iter()
            .map(|option| {
                format!(
                    r#"<div class="subscription-option">
            <h4>{name}</h4>
            <p>{visits} занятий</p>
            <p>{price} ₽</p>
            {button}
          </div>"#,
                    name = escape_html(&option.name),
                    visits = option.visits_allowed,
                    price = option.price,
                    button = action_form(
                        &Action::Purchase {
                            subscription_type_id: option.id,
                            class_id: *class_id,
                        },
                        View::Schedule,
                        user_id,
                        "action-button",
                        "Купить",
                        false,
                    ),
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        PurchaseOverlay::Failed { message } => format!(
            "<p>Ошибка загрузки абонементов: {}</p>",
            escape_html(message)
        ),
    };

    format!(
        r#"
    <div class="subscription-modal">
      <div class="modal-content">
        <h3>Выберите абонемент</h3>
        <div id="subscription-options">
          {content}
        </div>
        <a class="close-modal" href="{close}">Закрыть</a>
      </div>
    </div>"#,
        close = escape_html(&href("/schedule", user_id, None)),
    )
}

pub fn render_bookings(views: &[BookingView], user_id: UserId, alert: Option<&str>) -> String {
    let list = if views.is_empty() {
        format!(
            r#"<div class="no-bookings">
        <p>У вас нет активных записей</p>
        <a href="{schedule}" class="action-button">Посмотреть расписание</a>
      </div>"#,
            schedule = escape_html(&href("/schedule", user_id, None)),
        )
    } else {
        views
            .iter()
            .map(|view| booking_card(view, user_id))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let body = format!(
        r#"{back}
    <h1 class="bookings-title">📝 Мои записи</h1>
    <div class="bookings-list" id="bookings-list">
      {list}
    </div>"#,
        back = back_link(user_id),
    );
    render_page(Page::Bookings, &body, alert)
}

pub fn booking_card(view: &BookingView, user_id: UserId) -> String {
    let booking = &view.booking;
    let when = format_when(booking.class_datetime);

    format!(
        r#"<div class="booking-card" data-booking-id="{id}">
        <div class="booking-header">
          <h3 class="booking-name">{name}</h3>
        </div>
        <span class="booking-status">{status}</span>
        <div class="booking-details">
          <p>{description}</p>
          <div class="booking-time"><span>📅 {when}</span></div>
          <div class="booking-time"><span>{price} ₽</span></div>
        </div>
        <div class="booking-actions">
          {control}
        </div>
      </div>"#,
        id = booking.id,
        name = escape_html(&booking.class_name),
        status = if view.is_past { "Прошло" } else { "Запланировано" },
        description = escape_html(&booking.description),
        price = booking.price,
        control = action_form(
            &Action::Cancel {
                booking_id: booking.id,
                class_id: Some(booking.class_id),
            },
            View::Bookings,
            user_id,
            "cancel-button",
            "Отменить запись",
            !view.cancel_enabled,
        ),
    )
}

pub fn render_subscriptions(subscriptions: &[ActiveSubscription], user_id: UserId) -> String {
    let list = if subscriptions.is_empty() {
        format!(
            r#"<div class="no-subscriptions">
        <p>У вас нет активных абонементов</p>
        <a href="{schedule}" class="action-button">Посмотреть расписание</a>
      </div>"#,
            schedule = escape_html(&href("/schedule", user_id, None)),
        )
    } else {
        subscriptions
            .iter()
            .map(subscription_card)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let body = format!(
        r#"{back}
    <h1 class="subscriptions-title">💳 Мои абонементы</h1>
    <div class="subscriptions-grid" id="subscriptions-list">
      {list}
    </div>"#,
        back = back_link(user_id),
    );
    render_page(Page::Subscriptions, &body, None)
}

fn subscription_card(sub: &ActiveSubscription) -> String {
    let purchased = sub
        .purchase_date
        .map(|date| date.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| "—".to_string());

    format!(
        r#"<div class="subscription-card">
        <div class="subscription-header">
          <h3 class="subscription-name">{name}</h3>
          <span class="subscription-price">{price} ₽</span>
        </div>
        <p class="subscription-class">Для: {class_name}</p>
        <div class="subscription-details">
          <p>Куплен: {purchased}</p>
          <p>Занятий всего: {allowed}</p>
          <span class="visits-remaining">Осталось: {remaining}</span>
        </div>
      </div>"#,
        name = escape_html(&sub.name),
        price = sub.price,
        class_name = escape_html(&sub.class_name),
        allowed = sub.visits_allowed,
        remaining = sub.visits_remaining,
    )
}

/// Replaces the whole page content after a failed load.
pub fn render_error(page: Page, message: &str) -> String {
    let body = format!(
        r#"<div class="error-container">
      <p>{message}</p>
      <button type="button" class="action-button" data-reload>Попробовать снова</button>
    </div>"#,
        message = escape_html(message),
    );
    render_page(page, &body, None)
}

fn action_form(
    action: &Action,
    view: View,
    user_id: UserId,
    class: &str,
    label: &str,
    disabled: bool,
) -> String {
    let mut hidden = format!(
        r#"<input type="hidden" name="kind" value="{kind}" />
          <input type="hidden" name="view" value="{view}" />
          <input type="hidden" name="user_id" value="{user_id}" />"#,
        kind = action.kind(),
        view = view.as_str(),
    );
    for (name, value) in action.fields() {
        hidden.push_str(&format!(
            "\n          <input type=\"hidden\" name=\"{name}\" value=\"{value}\" />"
        ));
    }

    format!(
        r#"<form method="post" action="/actions" data-action="{kind}">
          {hidden}
          <button class="{class}" type="submit"{disabled}>{label}</button>
        </form>"#,
        kind = action.kind(),
        disabled = if disabled { " disabled" } else { "" },
    )
}

fn back_link(user_id: UserId) -> String {
    format!(
        r#"<a href="{home}" class="back-button">← На главную</a>"#,
        home = escape_html(&href("/", user_id, None)),
    )
}

fn action_state_name(state: ActionState) -> &'static str {
    match state {
        ActionState::Closed => "closed",
        ActionState::Cancel { .. } => "cancel",
        ActionState::Book => "book",
        ActionState::Purchase => "purchase",
    }
}

/// Link to one of the app's pages that keeps the viewer's identity and
/// optionally carries an alert to show on arrival.
pub fn href(path: &str, user_id: UserId, alert: Option<&str>) -> String {
    let plain = format!("{path}?user_id={user_id}");
    let Ok(mut url) = Url::parse("http://mini-app.local").and_then(|base| base.join(path)) else {
        return plain;
    };
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("user_id", &user_id.to_string());
        if let Some(alert) = alert {
            query.append_pair("alert", alert);
        }
    }
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => plain,
    }
}

pub fn format_datetime(at: NaiveDateTime) -> String {
    at.format("%d.%m.%Y, %H:%M").to_string()
}

fn format_when(at: Option<NaiveDateTime>) -> String {
    at.map(format_datetime).unwrap_or_else(|| "—".to_string())
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_page(page: Page, body: &str, alert: Option<&str>) -> String {
    let alert_attr = alert
        .filter(|text| !text.is_empty())
        .map(|text| format!(r#" data-alert="{}""#, escape_html(text)))
        .unwrap_or_default();

    PAGE_HTML
        .replace("{{TITLE}}", page.title())
        .replace("{{ALERT}}", &alert_attr)
        .replace("{{CONTAINER}}", page.container())
        .replace("{{BODY}}", body)
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <script src="https://telegram.org/js/telegram-web-app.js"></script>
  <style>
    :root {
      --bg: var(--tg-theme-bg-color, #f8f3e6);
      --ink: var(--tg-theme-text-color, #2b2a28);
      --muted: var(--tg-theme-hint-color, #8b857d);
      --accent: var(--tg-theme-button-color, #ff6b4a);
      --accent-ink: var(--tg-theme-button-text-color, #ffffff);
      --card: var(--tg-theme-secondary-bg-color, #ffffff);
      --danger: #c63b2b;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: -apple-system, "Segoe UI", Roboto, sans-serif;
      padding: 18px 14px 32px;
    }

    .app {
      width: min(720px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 16px;
    }

    h1 {
      margin: 0;
      font-size: 1.6rem;
    }

    .subtitle,
    .class-description,
    .booking-details p {
      color: var(--muted);
      margin: 0;
    }

    .back-button {
      color: var(--accent);
      text-decoration: none;
    }

    .menu,
    .classes-grid,
    .bookings-list,
    .subscriptions-grid {
      display: grid;
      gap: 12px;
    }

    .menu-item,
    .class-card,
    .booking-card,
    .subscription-card,
    .error-container,
    .no-bookings,
    .no-subscriptions {
      background: var(--card);
      border-radius: 16px;
      padding: 16px;
      display: grid;
      gap: 8px;
      color: inherit;
      text-decoration: none;
    }

    .class-meta {
      display: flex;
      justify-content: space-between;
      color: var(--muted);
    }

    .past-badge,
    .booking-badge,
    .booking-status,
    .visits-remaining {
      justify-self: start;
      font-size: 0.8rem;
      border-radius: 999px;
      padding: 2px 10px;
      background: rgba(47, 72, 88, 0.1);
    }

    .booking-badge {
      background: var(--accent);
      color: var(--accent-ink);
    }

    .action-button,
    .cancel-button,
    .close-modal {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: var(--accent-ink);
      text-align: center;
      text-decoration: none;
      display: inline-block;
    }

    .cancel-button {
      background: var(--danger);
    }

    button:disabled {
      opacity: 0.5;
      cursor: default;
    }

    .subscription-modal {
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.45);
      display: grid;
      place-items: center;
      padding: 16px;
    }

    .modal-content {
      background: var(--card);
      border-radius: 20px;
      padding: 20px;
      width: min(480px, 100%);
      display: grid;
      gap: 12px;
    }

    .subscription-option {
      border: 1px solid rgba(47, 72, 88, 0.12);
      border-radius: 14px;
      padding: 12px;
    }

    .subscription-option h4,
    .subscription-option p {
      margin: 0 0 6px;
    }
  </style>
</head>
<body{{ALERT}}>
  <main class="app {{CONTAINER}}">
    {{BODY}}
  </main>

  <script>
    (function () {
      var tg = window.Telegram && window.Telegram.WebApp;
      var params = new URLSearchParams(window.location.search);

      if (tg) {
        tg.expand();
        var user = tg.initDataUnsafe && tg.initDataUnsafe.user;
        if (user && user.id && params.get('user_id') !== String(user.id)) {
          params.set('user_id', user.id);
          ['first_name', 'last_name', 'username'].forEach(function (key) {
            if (user[key]) {
              params.set(key, user[key]);
            }
          });
          params.delete('alert');
          window.location.replace(window.location.pathname + '?' + params.toString());
          return;
        }
        tg.ready();
      }

      document.querySelectorAll('form[data-action]').forEach(function (form) {
        form.addEventListener('submit', function (event) {
          var button = form.querySelector('button');
          if (!button || button.disabled) {
            event.preventDefault();
            return;
          }
          button.disabled = true;
        });
      });

      document.querySelectorAll('[data-reload]').forEach(function (button) {
        button.addEventListener('click', function () {
          window.location.reload();
        });
      });

      var message = document.body.dataset.alert;
      if (message) {
        if (params.has('alert')) {
          params.delete('alert');
          window.history.replaceState(null, '', window.location.pathname + '?' + params.toString());
        }
        if (tg && tg.showAlert) {
          tg.showAlert(message);
        } else {
          window.alert(message);
        }
      }
    })();
  </script>
</body>
</html>
"#;
