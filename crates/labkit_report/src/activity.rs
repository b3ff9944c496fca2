//! User activity statistics for the optional User Activity Report sheet.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike, Weekday};

use crate::conf::{
    C_PLACEHOLDER_NA, C_PLACEHOLDER_NAN, C_PLACEHOLDER_NEVER, C_PLACEHOLDER_NEVER_LOGGED_IN,
};
use crate::model::{BorrowRequest, EnumRequestStatus, LoginSession, User};
use crate::spec::{
    EnumAccountStatus, EnumActivityLevel, EnumLoginTimeBucket, EnumRowCell, SpecRenderContext,
};
use crate::util::format_fixed_2;

const N_MS_PER_HOUR: f64 = 3_600_000.0;

fn derive_weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Most frequent key; ties go to the smallest key.
fn select_most_frequent<K: Ord + Copy>(keys: impl Iterator<Item = K>) -> Option<K> {
    let mut dict_counts: BTreeMap<K, usize> = BTreeMap::new();
    for key in keys {
        *dict_counts.entry(key).or_default() += 1;
    }
    let mut best: Option<(K, usize)> = None;
    for (key, n_count) in dict_counts {
        if best.is_none_or(|(_, n_best)| n_count > n_best) {
            best = Some((key, n_count));
        }
    }
    best.map(|(key, _)| key)
}

/// Weekday (Monday first) with the most logins.
pub fn derive_peak_activity_day(
    sessions: &[&LoginSession],
    ctx: &SpecRenderContext,
) -> Option<Weekday> {
    select_most_frequent(
        sessions
            .iter()
            .filter_map(|s| ctx.parse(&s.login_at))
            .map(|dt| dt.with_timezone(&ctx.offset).weekday().num_days_from_monday()),
    )
    .and_then(|n_day| Weekday::try_from(n_day as u8).ok())
}

/// Part of the day with the most logins.
pub fn derive_preferred_login_time(
    sessions: &[&LoginSession],
    ctx: &SpecRenderContext,
) -> Option<EnumLoginTimeBucket> {
    select_most_frequent(
        sessions
            .iter()
            .filter_map(|s| ctx.parse(&s.login_at))
            .map(|dt| EnumLoginTimeBucket::from_hour(dt.with_timezone(&ctx.offset).hour())),
    )
}

/// Most used device description.
pub fn derive_device_usage<'a>(sessions: &[&'a LoginSession]) -> Option<&'a str> {
    select_most_frequent(
        sessions
            .iter()
            .filter_map(|s| s.device_info.as_deref())
            .map(str::trim)
            .filter(|device| !device.is_empty()),
    )
}

/// Summed `session_duration` in hours; sessions without a duration count as zero.
pub fn calculate_total_session_hours(sessions: &[&LoginSession]) -> f64 {
    sessions
        .iter()
        .map(|s| s.session_duration.unwrap_or(0) as f64 / N_MS_PER_HOUR)
        .sum()
}

/// Borrowing counters for requests filed under one student id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecBorrowStats {
    /// Units borrowed across approved and returned requests.
    pub cnt_units_borrowed: i64,
    pub cnt_active: i64,
    pub cnt_returned: i64,
}

impl SpecBorrowStats {
    pub fn from_requests(student_id: &str, requests: &[BorrowRequest]) -> Self {
        let mut stats = Self::default();
        for request in requests.iter().filter(|r| r.student_id == student_id) {
            match request.status {
                EnumRequestStatus::Approved => {
                    stats.cnt_active += 1;
                    stats.cnt_units_borrowed =
                        stats.cnt_units_borrowed.saturating_add(request.quantity);
                }
                EnumRequestStatus::Returned => {
                    stats.cnt_returned += 1;
                    stats.cnt_units_borrowed =
                        stats.cnt_units_borrowed.saturating_add(request.quantity);
                }
                EnumRequestStatus::Pending | EnumRequestStatus::Rejected => {}
            }
        }
        stats
    }

    /// Returned share of approved-or-returned requests in percent.
    pub fn success_rate(&self) -> Option<f64> {
        let n_total = self.cnt_active + self.cnt_returned;
        (n_total > 0).then(|| self.cnt_returned as f64 / n_total as f64 * 100.0)
    }
}

/// One User Activity Report row.
pub fn derive_user_activity_row(
    user: &User,
    sessions: &[LoginSession],
    requests: &[BorrowRequest],
    ctx: &SpecRenderContext,
) -> Vec<EnumRowCell> {
    let l_sessions: Vec<&LoginSession> = sessions.iter().filter(|s| s.user_id == user.id).collect();
    let n_logins = user.login_count.unwrap_or(0);

    let cell_days_since_login = match user.last_login_at.as_deref() {
        None => EnumRowCell::text(C_PLACEHOLDER_NEVER_LOGGED_IN),
        Some(raw) => ctx
            .days_since(raw)
            .map_or(EnumRowCell::text(C_PLACEHOLDER_NAN), EnumRowCell::Integer),
    };
    let n_account_age = ctx.days_since(&user.registered_at);
    let c_engagement = match n_account_age {
        Some(n_age) if n_logins > 0 && n_age > 0 => {
            format_fixed_2(n_logins as f64 / n_age as f64 * 100.0)
        }
        _ => "0.00".to_string(),
    };

    let c_total_hours = format_fixed_2(calculate_total_session_hours(&l_sessions));
    let c_avg_duration = if l_sessions.is_empty() {
        "0 hours".to_string()
    } else {
        let n_total_hours: f64 = c_total_hours.parse().unwrap_or(0.0);
        format!("{} hours", format_fixed_2(n_total_hours / l_sessions.len() as f64))
    };

    let stats = SpecBorrowStats::from_requests(&user.id, requests);

    vec![
        EnumRowCell::text(&user.id),
        EnumRowCell::text(&user.name),
        EnumRowCell::text(&user.email),
        EnumRowCell::text(user.role.to_uppercase()),
        EnumRowCell::text(ctx.format_date(&user.registered_at)),
        EnumRowCell::text(
            user.last_login_at
                .as_deref()
                .map_or(C_PLACEHOLDER_NEVER.to_string(), |raw| ctx.format_date(raw)),
        ),
        EnumRowCell::Integer(n_logins),
        EnumRowCell::text(EnumAccountStatus::from_is_active(user.is_active).label()),
        EnumRowCell::text(EnumActivityLevel::from_login_count(n_logins).label()),
        cell_days_since_login,
        n_account_age.map_or(EnumRowCell::text(C_PLACEHOLDER_NAN), EnumRowCell::Integer),
        EnumRowCell::text(c_engagement),
        EnumRowCell::text(c_total_hours),
        EnumRowCell::text(c_avg_duration),
        EnumRowCell::text(
            derive_peak_activity_day(&l_sessions, ctx)
                .map_or(C_PLACEHOLDER_NA, derive_weekday_name),
        ),
        EnumRowCell::text(
            derive_preferred_login_time(&l_sessions, ctx)
                .map_or(C_PLACEHOLDER_NA, |bucket| bucket.label()),
        ),
        EnumRowCell::text(derive_device_usage(&l_sessions).unwrap_or(C_PLACEHOLDER_NA)),
        EnumRowCell::Integer(stats.cnt_units_borrowed),
        EnumRowCell::Integer(stats.cnt_active),
        EnumRowCell::Integer(stats.cnt_returned),
        EnumRowCell::text(
            stats
                .success_rate()
                .map_or(C_PLACEHOLDER_NA.to_string(), format_fixed_2),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, Utc};

    use super::*;
    use crate::conf::LAYOUT_USER_ACTIVITY;

    fn create_ctx() -> SpecRenderContext {
        SpecRenderContext {
            now: DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            offset: FixedOffset::east_opt(0).unwrap(),
            date_format: "%-m/%-d/%Y".to_string(),
        }
    }

    fn create_session(login_at: &str, duration_ms: Option<i64>, device: Option<&str>) -> LoginSession {
        LoginSession {
            id: format!("s-{login_at}"),
            user_id: "u-1".to_string(),
            login_at: login_at.to_string(),
            logout_at: None,
            session_duration: duration_ms,
            device_info: device.map(str::to_string),
        }
    }

    fn create_user() -> User {
        User {
            id: "u-1".to_string(),
            name: "Grace Hopper".to_string(),
            email: "grace@example.edu".to_string(),
            role: "staff".to_string(),
            registered_at: "2026-09-16T12:00:00Z".to_string(),
            last_login_at: Some("2026-10-14T12:00:00Z".to_string()),
            login_count: Some(12),
            is_active: true,
        }
    }

    fn cell<'a>(row: &'a [EnumRowCell], header: &str) -> &'a EnumRowCell {
        &row[LAYOUT_USER_ACTIVITY.position(header).unwrap()]
    }

    #[test]
    fn most_frequent_prefers_smallest_key_on_ties() {
        assert_eq!(select_most_frequent([3, 1, 3, 1, 2].into_iter()), Some(1));
        assert_eq!(select_most_frequent([2, 5, 5].into_iter()), Some(5));
        assert_eq!(select_most_frequent(std::iter::empty::<u8>()), None);
    }

    #[test]
    fn session_derived_columns() {
        let ctx = create_ctx();
        // 2026-10-12 is a Monday.
        let l_sessions_owned = vec![
            create_session("2026-10-12T08:00:00Z", Some(3_600_000), Some("Chrome")),
            create_session("2026-10-13T09:00:00Z", Some(5_400_000), Some("Chrome")),
            create_session("2026-10-13T19:00:00Z", None, Some("Firefox")),
        ];
        let l_sessions: Vec<&LoginSession> = l_sessions_owned.iter().collect();

        assert_eq!(derive_peak_activity_day(&l_sessions, &ctx), Some(Weekday::Tue));
        assert_eq!(
            derive_preferred_login_time(&l_sessions, &ctx),
            Some(EnumLoginTimeBucket::Morning)
        );
        assert_eq!(derive_device_usage(&l_sessions), Some("Chrome"));
        assert!((calculate_total_session_hours(&l_sessions) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn borrow_stats_ignore_pending_and_rejected() {
        let base = BorrowRequest {
            id: "r".to_string(),
            student_id: "u-1".to_string(),
            student_name: "Grace".to_string(),
            roll_no: "1".to_string(),
            mobile: "1".to_string(),
            component_id: "c".to_string(),
            component_name: "c".to_string(),
            quantity: 2,
            request_date: "2026-10-01".to_string(),
            due_date: "2026-10-20".to_string(),
            status: EnumRequestStatus::Approved,
            approved_by: None,
            approved_at: None,
            returned_at: None,
        };
        let requests = vec![
            base.clone(),
            BorrowRequest {
                status: EnumRequestStatus::Returned,
                quantity: 3,
                ..base.clone()
            },
            BorrowRequest {
                status: EnumRequestStatus::Rejected,
                ..base.clone()
            },
            BorrowRequest {
                student_id: "someone-else".to_string(),
                ..base.clone()
            },
        ];
        let stats = SpecBorrowStats::from_requests("u-1", &requests);
        assert_eq!(stats.cnt_units_borrowed, 5);
        assert_eq!(stats.cnt_active, 1);
        assert_eq!(stats.cnt_returned, 1);
        assert_eq!(stats.success_rate(), Some(50.0));
        assert_eq!(SpecBorrowStats::default().success_rate(), None);

        let requests_extreme = vec![
            BorrowRequest {
                quantity: i64::MAX,
                ..base.clone()
            },
            BorrowRequest {
                status: EnumRequestStatus::Returned,
                quantity: i64::MAX,
                ..base
            },
        ];
        let stats = SpecBorrowStats::from_requests("u-1", &requests_extreme);
        assert_eq!(stats.cnt_units_borrowed, i64::MAX);
    }

    #[test]
    fn user_row_with_sessions() {
        let ctx = create_ctx();
        let sessions = vec![
            create_session("2026-10-12T08:00:00Z", Some(3_600_000), Some("Chrome")),
            create_session("2026-10-13T09:00:00Z", Some(5_400_000), Some("Chrome")),
        ];
        let row = derive_user_activity_row(&create_user(), &sessions, &[], &ctx);

        assert_eq!(row.len(), LAYOUT_USER_ACTIVITY.columns.len());
        assert_eq!(cell(&row, "User Role"), &EnumRowCell::text("STAFF"));
        assert_eq!(cell(&row, "Activity Level"), &EnumRowCell::text("HIGH"));
        assert_eq!(cell(&row, "Days Since Last Login"), &EnumRowCell::Integer(2));
        assert_eq!(cell(&row, "Account Age (Days)"), &EnumRowCell::Integer(30));
        assert_eq!(cell(&row, "Engagement Score"), &EnumRowCell::text("40.00"));
        assert_eq!(cell(&row, "Total Session Time (Hours)"), &EnumRowCell::text("2.50"));
        assert_eq!(cell(&row, "Average Session Duration"), &EnumRowCell::text("1.25 hours"));
        assert_eq!(cell(&row, "Peak Activity Day"), &EnumRowCell::text("Monday"));
        assert_eq!(cell(&row, "Device Usage"), &EnumRowCell::text("Chrome"));
        assert_eq!(cell(&row, "Success Rate (%)"), &EnumRowCell::text("N/A"));
    }

    #[test]
    fn user_row_without_activity() {
        let ctx = create_ctx();
        let user = User {
            last_login_at: None,
            login_count: None,
            is_active: false,
            ..create_user()
        };
        let row = derive_user_activity_row(&user, &[], &[], &ctx);

        assert_eq!(cell(&row, "Last Login Date"), &EnumRowCell::text("Never"));
        assert_eq!(
            cell(&row, "Days Since Last Login"),
            &EnumRowCell::text("Never logged in")
        );
        assert_eq!(cell(&row, "Account Status"), &EnumRowCell::text("INACTIVE"));
        assert_eq!(cell(&row, "Activity Level"), &EnumRowCell::text("INACTIVE"));
        assert_eq!(cell(&row, "Engagement Score"), &EnumRowCell::text("0.00"));
        assert_eq!(cell(&row, "Average Session Duration"), &EnumRowCell::text("0 hours"));
        assert_eq!(cell(&row, "Preferred Login Time"), &EnumRowCell::text("N/A"));
    }
}
