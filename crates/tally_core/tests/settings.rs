use tally_core::model::settings::{DEFAULT_AUTO_PAUSE_MINUTES, DEFAULT_HOURLY_RATE};
use tally_core::{
    open_db_in_memory, BillingIncrement, DataServices, ManualClock, Repository, SettingsUpdate,
    ValidationError, WorkContext,
};

const T0: i64 = 1_700_000_000_000;

fn services() -> (DataServices, ManualClock) {
    let clock = ManualClock::starting_at(T0);
    let ctx = WorkContext::try_with_clock(open_db_in_memory().unwrap(), clock.clone()).unwrap();
    (DataServices::new(ctx), clock)
}

#[test]
fn first_access_creates_documented_defaults() {
    let (services, _clock) = services();
    assert!(services.settings().get_settings().unwrap().is_none());

    let settings = services.settings().get_or_create_settings(false).unwrap();
    assert_eq!(settings.default_hourly_rate, DEFAULT_HOURLY_RATE);
    assert_eq!(
        settings.default_billing_increment,
        BillingIncrement::TenMinutes
    );
    assert!(!settings.auto_pause_enabled);
    assert_eq!(settings.auto_pause_minutes, DEFAULT_AUTO_PAUSE_MINUTES);
    assert_eq!(settings.created_at, T0);
    assert!(!services.has_changes());
}

#[test]
fn repeated_access_never_creates_a_second_row() {
    let (services, clock) = services();
    let first = services.settings().get_or_create_settings(true).unwrap();
    clock.advance_secs(10);
    let second = services.settings().get_or_create_settings(true).unwrap();
    services.save().unwrap();
    let third = services.settings().get_or_create_settings(false).unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(services.settings().count(&()), 1);
    assert_eq!(services.settings().list(&(), ()).len(), 1);
}

#[test]
fn update_persists_and_touches_modified_at() {
    let (services, clock) = services();
    let mut settings = services.settings().get_or_create_settings(false).unwrap();

    clock.advance_secs(60);
    let changes = SettingsUpdate {
        auto_pause_enabled: Some(true),
        auto_pause_minutes: Some(5),
        notification_settings: Some(Some(vec![1, 2, 3])),
        ..SettingsUpdate::default()
    };
    services
        .settings()
        .update_settings(&mut settings, changes, false)
        .unwrap();

    let stored = services.settings().get_settings().unwrap().unwrap();
    assert!(stored.auto_pause_enabled);
    assert_eq!(stored.auto_pause_minutes, 5);
    assert_eq!(stored.notification_settings, Some(vec![1, 2, 3]));
    assert_eq!(stored.created_at, T0);
    assert_eq!(stored.modified_at, T0 + 60_000);
    assert!(stored.auto_pause_due(T0, T0 + 5 * 60_000));
}

#[test]
fn zero_auto_pause_minutes_is_rejected() {
    let (services, _clock) = services();
    let mut settings = services.settings().get_or_create_settings(false).unwrap();

    let err = services
        .settings()
        .update_settings(
            &mut settings,
            SettingsUpdate {
                auto_pause_minutes: Some(0),
                ..SettingsUpdate::default()
            },
            false,
        )
        .unwrap_err();
    assert_eq!(
        err.as_validation(),
        Some(ValidationError::InvalidAutoPauseMinutes(0))
    );
    assert_eq!(
        services
            .settings()
            .get_settings()
            .unwrap()
            .unwrap()
            .auto_pause_minutes,
        DEFAULT_AUTO_PAUSE_MINUTES
    );
}

#[test]
fn update_with_stored_values_keeps_modified_at() {
    let (services, clock) = services();
    let mut settings = services.settings().get_or_create_settings(false).unwrap();

    clock.advance_secs(60);
    let same = SettingsUpdate {
        default_hourly_rate: Some(settings.default_hourly_rate),
        auto_pause_minutes: Some(settings.auto_pause_minutes),
        ..SettingsUpdate::default()
    };
    services
        .settings()
        .update_settings(&mut settings, same, false)
        .unwrap();

    let stored = services.settings().get_settings().unwrap().unwrap();
    assert_eq!(stored.modified_at, T0);
    assert!(!services.has_changes());
}
