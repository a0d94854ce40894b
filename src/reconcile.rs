//! Joins the fetched collections into render-ready view models.

use crate::config::BookingMatch;
use crate::models::{Booking, BookingId, ClassSession, ScheduleData, UserId};
use chrono::NaiveDateTime;
use tracing::debug;

/// The single control a schedule card offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionState {
    /// The class already started: booking is closed.
    Closed,
    Cancel { booking_id: BookingId },
    Book,
    /// No usable subscription: offer the purchase overlay.
    Purchase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassView {
    pub class: ClassSession,
    pub is_past: bool,
    pub is_booked: bool,
    pub has_usable_subscription: bool,
    pub action: ActionState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingView {
    pub booking: Booking,
    pub is_past: bool,
    pub can_cancel: bool,
    pub cancel_enabled: bool,
}

/// A moment exactly equal to `now` is not in the past.
pub fn is_past(at: NaiveDateTime, now: NaiveDateTime) -> bool {
    at < now
}

/// A class without a date is treated as already finished.
pub fn class_is_past(at: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    at.is_none_or(|at| is_past(at, now))
}

/// Closure wins over everything, then subscription possession decides
/// whether cancel/book is offered at all.
pub fn decide_action(
    is_past: bool,
    has_usable_subscription: bool,
    booking: Option<BookingId>,
) -> ActionState {
    if is_past {
        return ActionState::Closed;
    }
    match (has_usable_subscription, booking) {
        (true, Some(booking_id)) => ActionState::Cancel { booking_id },
        (true, None) => ActionState::Book,
        (false, _) => ActionState::Purchase,
    }
}

pub fn reconcile_schedule(
    data: &ScheduleData,
    user_id: UserId,
    booking_match: BookingMatch,
    now: NaiveDateTime,
) -> Vec<ClassView> {
    data.classes
        .iter()
        .map(|class| {
            let is_past = class_is_past(class.datetime, now);
            let has_usable_subscription = data
                .subscriptions
                .iter()
                .any(|s| s.class_id == class.id && s.visits_remaining > 0);
            let booking = data
                .bookings
                .iter()
                .filter(|b| b.class_id == class.id && owns(b, user_id, booking_match))
                .map(|b| b.id)
                .min();

            ClassView {
                class: class.clone(),
                is_past,
                is_booked: booking.is_some(),
                has_usable_subscription,
                action: decide_action(is_past, has_usable_subscription, booking),
            }
        })
        .collect()
}

fn owns(booking: &Booking, user_id: UserId, booking_match: BookingMatch) -> bool {
    match booking_match {
        BookingMatch::AnyUser => true,
        BookingMatch::CurrentUser => booking.user_id.is_none_or(|owner| owner == user_id),
    }
}

pub fn reconcile_bookings(bookings: &[Booking], now: NaiveDateTime) -> Vec<BookingView> {
    bookings
        .iter()
        .map(|booking| {
            let is_past = booking
                .class_datetime
                .is_some_and(|at| is_past(at, now));
            if booking.can_cancel == is_past {
                debug!(
                    booking_id = booking.id,
                    can_cancel = booking.can_cancel,
                    is_past,
                    "backend cancel flag disagrees with local clock"
                );
            }
            BookingView {
                booking: booking.clone(),
                is_past,
                can_cancel: booking.can_cancel,
                cancel_enabled: booking.can_cancel && !is_past,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActiveSubscription;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn class(id: i64, at: NaiveDateTime) -> ClassSession {
        ClassSession {
            id,
            name: format!("Class {id}"),
            description: String::new(),
            datetime: Some(at),
            price: 800,
            max_participants: Some(10),
        }
    }

    fn subscription(class_id: i64, visits_remaining: i64) -> ActiveSubscription {
        ActiveSubscription {
            id: class_id * 10,
            name: "Абонемент".into(),
            class_name: String::new(),
            class_id,
            visits_allowed: 5,
            visits_remaining,
            price: 3500,
            purchase_date: None,
        }
    }

    fn booking(id: i64, class_id: i64) -> Booking {
        Booking {
            id,
            class_id,
            user_id: None,
            class_name: String::new(),
            description: String::new(),
            class_datetime: None,
            price: 0,
            can_cancel: true,
        }
    }

    fn actions(data: &ScheduleData) -> Vec<ActionState> {
        reconcile_schedule(data, 1, BookingMatch::AnyUser, now())
            .into_iter()
            .map(|view| view.action)
            .collect()
    }

    #[test]
    fn exactly_now_is_not_past() {
        assert!(!is_past(now(), now()));
        assert!(is_past(now() - Duration::seconds(1), now()));
        assert!(!is_past(now() + Duration::seconds(1), now()));
    }

    #[test]
    fn precedence_table() {
        assert_eq!(decide_action(true, true, None), ActionState::Closed);
        assert_eq!(decide_action(true, true, Some(3)), ActionState::Closed);
        assert_eq!(decide_action(true, false, None), ActionState::Closed);
        assert_eq!(
            decide_action(false, true, Some(3)),
            ActionState::Cancel { booking_id: 3 }
        );
        assert_eq!(decide_action(false, true, None), ActionState::Book);
        assert_eq!(decide_action(false, false, Some(3)), ActionState::Purchase);
        assert_eq!(decide_action(false, false, None), ActionState::Purchase);
    }

    #[test]
    fn future_class_with_subscription_offers_booking() {
        let data = ScheduleData {
            classes: vec![class(1, now() + Duration::days(1))],
            subscriptions: vec![subscription(1, 2)],
            bookings: vec![],
        };
        assert_eq!(actions(&data), vec![ActionState::Book]);
    }

    #[test]
    fn booked_class_offers_cancel() {
        let data = ScheduleData {
            classes: vec![class(1, now() + Duration::days(1))],
            subscriptions: vec![subscription(1, 2)],
            bookings: vec![booking(5, 1)],
        };
        assert_eq!(actions(&data), vec![ActionState::Cancel { booking_id: 5 }]);
    }

    #[test]
    fn past_class_is_closed_whatever_else_holds() {
        let past = now() - Duration::days(1);
        for (subscriptions, bookings) in [
            (vec![], vec![]),
            (vec![subscription(2, 2)], vec![]),
            (vec![subscription(2, 2)], vec![booking(1, 2)]),
            (vec![], vec![booking(1, 2)]),
        ] {
            let data = ScheduleData {
                classes: vec![class(2, past)],
                subscriptions,
                bookings,
            };
            assert_eq!(actions(&data), vec![ActionState::Closed]);
        }
    }

    #[test]
    fn undated_class_is_closed() {
        let mut undated = class(3, now());
        undated.datetime = None;
        let data = ScheduleData {
            classes: vec![undated, class(1, now() + Duration::days(1))],
            subscriptions: vec![subscription(3, 2), subscription(1, 2)],
            bookings: vec![],
        };
        assert_eq!(actions(&data), vec![ActionState::Closed, ActionState::Book]);
    }

    #[test]
    fn exhausted_subscription_is_not_usable() {
        let data = ScheduleData {
            classes: vec![class(1, now() + Duration::days(1))],
            subscriptions: vec![subscription(1, 0)],
            bookings: vec![booking(5, 1)],
        };
        let views = reconcile_schedule(&data, 1, BookingMatch::AnyUser, now());
        assert!(!views[0].has_usable_subscription);
        assert!(views[0].is_booked);
        assert_eq!(views[0].action, ActionState::Purchase);
    }

    #[test]
    fn subscription_for_another_class_does_not_count() {
        let data = ScheduleData {
            classes: vec![class(1, now() + Duration::days(1))],
            subscriptions: vec![subscription(2, 5)],
            bookings: vec![],
        };
        assert_eq!(actions(&data), vec![ActionState::Purchase]);
    }

    #[test]
    fn result_does_not_depend_on_collection_order() {
        let tomorrow = now() + Duration::days(1);
        let mut data = ScheduleData {
            classes: vec![
                class(1, tomorrow),
                class(2, tomorrow),
                class(3, now() - Duration::hours(1)),
                class(4, tomorrow),
            ],
            subscriptions: vec![subscription(1, 1), subscription(2, 3), subscription(3, 1)],
            bookings: vec![booking(9, 2), booking(7, 2), booking(8, 3)],
        };
        let forward = reconcile_schedule(&data, 1, BookingMatch::AnyUser, now());

        data.classes.reverse();
        data.subscriptions.reverse();
        data.bookings.reverse();
        let mut backward = reconcile_schedule(&data, 1, BookingMatch::AnyUser, now());
        backward.reverse();

        assert_eq!(forward, backward);
        assert_eq!(
            forward.iter().map(|v| v.action).collect::<Vec<_>>(),
            vec![
                ActionState::Book,
                ActionState::Cancel { booking_id: 7 },
                ActionState::Closed,
                ActionState::Purchase,
            ]
        );
    }

    #[test]
    fn current_user_matching_ignores_foreign_bookings() {
        let mut foreign = booking(5, 1);
        foreign.user_id = Some(2);
        let data = ScheduleData {
            classes: vec![class(1, now() + Duration::days(1))],
            subscriptions: vec![subscription(1, 2)],
            bookings: vec![foreign],
        };

        let any = reconcile_schedule(&data, 1, BookingMatch::AnyUser, now());
        assert_eq!(any[0].action, ActionState::Cancel { booking_id: 5 });

        let mine = reconcile_schedule(&data, 1, BookingMatch::CurrentUser, now());
        assert_eq!(mine[0].action, ActionState::Book);
    }

    #[test]
    fn booking_views_keep_backend_flag_and_local_past() {
        let mut upcoming = booking(1, 1);
        upcoming.class_datetime = Some(now() + Duration::days(1));
        let mut finished = booking(2, 2);
        finished.class_datetime = Some(now() - Duration::days(1));
        finished.can_cancel = false;
        let mut stale = booking(3, 3);
        stale.class_datetime = Some(now() - Duration::minutes(5));
        stale.can_cancel = true;

        let views = reconcile_bookings(&[upcoming, finished, stale], now());
        assert!(views[0].cancel_enabled && !views[0].is_past);
        assert!(!views[1].cancel_enabled && views[1].is_past);
        assert!(views[2].can_cancel && views[2].is_past);
        assert!(!views[2].cancel_enabled);
    }
}
