use super::{DAY1, DAY2};
use crate::analytics::DashboardWindow;
use pretty_assertions::assert_eq;

#[test]
fn explicit_bounds_cover_every_day_inclusive() {
    let window = DashboardWindow::resolve(Some(DAY1 + 5), Some(DAY2 + 86_399), 0, 400);

    assert_eq!(window.target_day, DAY2);
    assert_eq!(window.first_day, DAY1);
    assert_eq!(window.days, 2);
    assert_eq!(window.day_starts().collect::<Vec<_>>(), vec![DAY1, DAY2]);
}

#[test]
fn missing_bounds_use_trailing_thirty_days() {
    let now = DAY2 + 3_600;

    let window = DashboardWindow::resolve(None, None, now, 400);

    assert_eq!(window.days, 30);
    assert_eq!(window.target_day, DAY2);
    assert_eq!(window.end, now);
    assert_eq!(window.first_day, DAY2 - 29 * 86_400);
}

#[test]
fn target_day_follows_end_time_not_now() {
    let window = DashboardWindow::resolve(Some(DAY1), Some(DAY1 + 100), DAY2 + 500, 400);

    assert_eq!(window.target_day, DAY1);
    assert_eq!(window.days, 1);
    assert_eq!(window.hour_starts().count(), 24);
}

#[test]
fn reversed_bounds_are_swapped() {
    let window = DashboardWindow::resolve(Some(DAY2 + 10), Some(DAY1), 0, 400);

    assert_eq!((window.start, window.end), (DAY1, DAY2 + 10));
}

#[test]
fn long_windows_keep_most_recent_days() {
    let window = DashboardWindow::resolve(Some(0), Some(DAY2), 0, 7);

    assert_eq!(window.days, 7);
    assert_eq!(window.first_day, DAY2 - 6 * 86_400);
    assert_eq!(window.start, window.first_day);
}
