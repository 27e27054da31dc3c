//! Settings and journal setters.

use crate::model::record::{ProductivityRecord, Theme};
use crate::service::mutation_error::{MutationError, MutationResult};

/// Settings/journal mutations over one borrowed record.
pub struct SettingsService<'a> {
    record: &'a mut ProductivityRecord,
}

impl<'a> SettingsService<'a> {
    pub fn new(record: &'a mut ProductivityRecord) -> Self {
        Self { record }
    }

    /// Switches theme by wire identifier, e.g. `galaxy-theme`.
    pub fn set_theme(&mut self, identifier: &str) -> MutationResult<Theme> {
        let theme = Theme::parse(identifier)
            .ok_or_else(|| MutationError::UnknownTheme(identifier.trim().to_string()))?;
        self.record.settings.theme = theme;
        Ok(theme)
    }

    pub fn set_sounds_enabled(&mut self, enabled: bool) {
        self.record.settings.sounds_enabled = enabled;
    }

    /// Stores the trimmed user name; empty clears it.
    pub fn set_user_name(&mut self, name: &str) {
        self.record.settings.user_name = name.trim().to_string();
    }

    /// Replaces the journal text verbatim.
    pub fn set_journal(&mut self, text: impl Into<String>) {
        self.record.journal = text.into();
    }
}
