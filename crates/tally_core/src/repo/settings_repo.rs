//! Settings singleton repository.
//!
//! # Invariants
//! - At most one settings row exists (`CHECK (id = 1)`).
//! - Creation uses `INSERT OR IGNORE` inside the unit of work, so repeated
//!   or interleaved `get_or_create_settings` calls converge on one row.

use crate::model::settings::{Settings, SettingsUpdate};
use crate::repo::context::WorkContext;
use crate::repo::{
    bool_to_int, fetch_count, fetch_optional, or_logged_default, parse_bool, parse_increment,
    EntityKind, RepoError, RepoResult, Repository,
};
use log::info;
use rusqlite::{params, Row};

const SETTINGS_ROW_ID: i64 = 1;

const SETTINGS_SELECT_SQL: &str = "SELECT
    default_hourly_rate,
    default_billing_increment,
    auto_pause_enabled,
    auto_pause_minutes,
    notification_settings,
    created_at,
    modified_at
FROM settings
WHERE id = 1;";

pub struct SettingsRepository<'ctx> {
    ctx: &'ctx WorkContext,
}

impl<'ctx> SettingsRepository<'ctx> {
    pub fn new(ctx: &'ctx WorkContext) -> Self {
        Self { ctx }
    }

    /// Returns the settings singleton, creating it with defaults on first
    /// access.
    pub fn get_or_create_settings(&self, defer_save: bool) -> RepoResult<Settings> {
        if let Some(existing) = self.get_settings()? {
            return Ok(existing);
        }

        let defaults = Settings::with_defaults(self.ctx.now_ms());
        self.ctx.begin()?;
        let inserted = self.ctx.connection().execute(
            "INSERT OR IGNORE INTO settings (
                id,
                default_hourly_rate,
                default_billing_increment,
                auto_pause_enabled,
                auto_pause_minutes,
                notification_settings,
                created_at,
                modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                SETTINGS_ROW_ID,
                defaults.default_hourly_rate,
                i64::from(defaults.default_billing_increment.minutes()),
                bool_to_int(defaults.auto_pause_enabled),
                i64::from(defaults.auto_pause_minutes),
                defaults.notification_settings.as_deref(),
                defaults.created_at,
                defaults.modified_at,
            ],
        )?;
        if inserted == 1 {
            info!("event=settings_create module=repo status=ok");
        }
        self.ctx.save_unless_deferred(defer_save)?;

        self.get_settings()?.ok_or_else(|| {
            RepoError::InvalidData("settings row missing after creation".to_string())
        })
    }

    pub fn get_settings(&self) -> RepoResult<Option<Settings>> {
        fetch_optional(
            self.ctx.connection(),
            SETTINGS_SELECT_SQL,
            Vec::new(),
            parse_settings_row,
        )
    }

    pub fn update_settings(
        &self,
        settings: &mut Settings,
        changes: SettingsUpdate,
        defer_save: bool,
    ) -> RepoResult<()> {
        let before = settings.clone();
        changes.apply_to(settings);
        if *settings == before {
            return Ok(());
        }
        settings.touch(self.ctx.now_ms());
        settings.validate()?;

        self.ctx.execute_existing(
            "UPDATE settings
             SET
                default_hourly_rate = ?2,
                default_billing_increment = ?3,
                auto_pause_enabled = ?4,
                auto_pause_minutes = ?5,
                notification_settings = ?6,
                modified_at = ?7
             WHERE id = ?1;",
            params![
                SETTINGS_ROW_ID,
                settings.default_hourly_rate,
                i64::from(settings.default_billing_increment.minutes()),
                bool_to_int(settings.auto_pause_enabled),
                i64::from(settings.auto_pause_minutes),
                settings.notification_settings.as_deref(),
                settings.modified_at,
            ],
            || RepoError::InvalidData(
                "settings must be created before they are updated".to_string(),
            ),
        )?;
        self.ctx.save_unless_deferred(defer_save)?;
        Ok(())
    }
}

impl Repository for SettingsRepository<'_> {
    type Entity = Settings;
    type Filter = ();
    type Sort = ();

    fn list(&self, _filter: &(), _sort: ()) -> Vec<Settings> {
        let result: RepoResult<Vec<Settings>> =
            self.get_settings().map(|found| found.into_iter().collect());
        or_logged_default(EntityKind::Settings, "list", result)
    }

    fn count(&self, _filter: &()) -> usize {
        let result = fetch_count(
            self.ctx.connection(),
            "SELECT COUNT(*) FROM settings;",
            Vec::new(),
        );
        or_logged_default(EntityKind::Settings, "count", result)
    }
}

fn parse_settings_row(row: &Row<'_>) -> RepoResult<Settings> {
    let minutes: i64 = row.get("auto_pause_minutes")?;
    let settings = Settings {
        default_hourly_rate: row.get("default_hourly_rate")?,
        default_billing_increment: parse_increment(
            row.get("default_billing_increment")?,
            "settings.default_billing_increment",
        )?,
        auto_pause_enabled: parse_bool(
            row.get("auto_pause_enabled")?,
            "settings.auto_pause_enabled",
        )?,
        auto_pause_minutes: u32::try_from(minutes).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid auto_pause_minutes `{minutes}` in settings.auto_pause_minutes"
            ))
        })?,
        notification_settings: row.get("notification_settings")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    };
    settings
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("settings: {err}")))?;
    Ok(settings)
}
