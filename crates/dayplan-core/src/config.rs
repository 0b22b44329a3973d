//! Planner configuration.
//!
//! Every knob of the scoring formula and the timeline builder lives here so
//! callers can supply their own values; `Default` reproduces the stock
//! behaviour.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, PriorityTier};

/// Category assigned when the input names none.
pub const DEFAULT_CATEGORY: &str = "general";

/// Urgency and effort when the input names none.
pub const DEFAULT_RATING: u8 = 3;

/// Valid range for urgency and effort.
pub const RATING_RANGE: RangeInclusive<u8> = 1..=5;

/// Valid range for category importance weights.
pub const IMPORTANCE_RANGE: RangeInclusive<f64> = 0.0..=5.0;

/// Upper bound for `max_duration_minutes` and reminder leads: one week.
pub const DURATION_LIMIT_MINUTES: i64 = 7 * 24 * 60;

/// Planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayplanConfig {
    /// Importance used for categories missing from `category_importance`.
    pub default_importance: f64,

    /// Top of the effort scale; `max_effort - effort` rewards light tasks.
    pub max_effort: u8,

    /// Score bonus for tasks in `preferred_categories`.
    pub preference_bonus: f64,

    /// Duration applied when the input names none.
    pub default_duration_minutes: i64,

    /// Longest task accepted; longer tasks are rejected on `duration_minutes`.
    pub max_duration_minutes: i64,

    /// Whether a break follows the final task of the day.
    pub trailing_break: bool,

    /// Local start of the day, `HH:MM`.
    pub day_start: String,

    /// Categories that get `preference_bonus`.
    pub preferred_categories: Vec<String>,

    /// Scoring weights.
    pub weights: ScoringWeights,

    /// Tier cut points on the final score.
    pub tiers: TierThresholds,

    /// Category name to importance weight.
    pub category_importance: BTreeMap<String, f64>,

    /// Reminder lead times.
    pub reminders: ReminderLeads,

    /// Duration bands mapping to break lengths, ascending.
    pub break_bands: Vec<BreakBand>,
}

impl Default for DayplanConfig {
    fn default() -> Self {
        let category_importance = [
            ("work", 4.0),
            ("meeting", 4.0),
            ("health", 3.0),
            ("coding", 3.0),
            ("review", 3.0),
            ("planning", 3.0),
            ("personal", 2.0),
            ("learning", 2.0),
            ("email", 2.0),
            (DEFAULT_CATEGORY, 2.0),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

        Self {
            default_importance: 2.0,
            max_effort: 5,
            preference_bonus: 0.2,
            default_duration_minutes: 30,
            max_duration_minutes: 24 * 60,
            trailing_break: false,
            day_start: "09:00".to_string(),
            preferred_categories: vec!["meeting".to_string(), "review".to_string()],
            weights: ScoringWeights::default(),
            tiers: TierThresholds::default(),
            category_importance,
            reminders: ReminderLeads::default(),
            break_bands: vec![
                BreakBand::up_to(59, 5),
                BreakBand::up_to(120, 15),
                BreakBand::unbounded(20),
            ],
        }
    }
}

impl DayplanConfig {
    /// Check the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.tiers.validate()?;

        for (name, value) in [
            ("default_importance", self.default_importance),
            ("preference_bonus", self.preference_bonus),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        if !IMPORTANCE_RANGE.contains(&self.default_importance) {
            return Err(ConfigError::InvalidImportance {
                category: "<default>".to_string(),
                value: self.default_importance,
            });
        }
        for (category, value) in &self.category_importance {
            if !IMPORTANCE_RANGE.contains(value) {
                return Err(ConfigError::InvalidImportance {
                    category: category.clone(),
                    value: *value,
                });
            }
        }

        if !RATING_RANGE.contains(&self.max_effort) {
            return Err(ConfigError::InvalidMaxEffort(self.max_effort));
        }
        if self.default_duration_minutes <= 0 {
            return Err(ConfigError::InvalidDefaultDuration(
                self.default_duration_minutes,
            ));
        }
        if self.max_duration_minutes < self.default_duration_minutes
            || self.max_duration_minutes > DURATION_LIMIT_MINUTES
        {
            return Err(ConfigError::InvalidMaxDuration(self.max_duration_minutes));
        }
        self.reminders.validate()?;

        self.validate_break_bands()?;
        self.day_start_time()?;
        Ok(())
    }

    fn validate_break_bands(&self) -> Result<(), ConfigError> {
        let Some((last, bounded)) = self.break_bands.split_last() else {
            return Err(ConfigError::InvalidBreakBands("no bands configured".into()));
        };
        if last.up_to_minutes.is_some() {
            return Err(ConfigError::InvalidBreakBands(
                "last band must be unbounded".into(),
            ));
        }

        let mut previous: Option<i64> = None;
        for band in bounded {
            let Some(limit) = band.up_to_minutes else {
                return Err(ConfigError::InvalidBreakBands(
                    "only the last band may be unbounded".into(),
                ));
            };
            if previous.is_some_and(|p| limit <= p) {
                return Err(ConfigError::InvalidBreakBands(format!(
                    "bounds must ascend, {} follows {}",
                    limit,
                    previous.unwrap_or_default()
                )));
            }
            previous = Some(limit);
        }

        if let Some(band) = self.break_bands.iter().find(|b| b.break_minutes <= 0) {
            return Err(ConfigError::InvalidBreakBands(format!(
                "break length must be positive, got {}",
                band.break_minutes
            )));
        }
        if let Some(band) = self
            .break_bands
            .iter()
            .find(|b| b.break_minutes > DURATION_LIMIT_MINUTES)
        {
            return Err(ConfigError::InvalidBreakBands(format!(
                "break length must be at most {}, got {}",
                DURATION_LIMIT_MINUTES, band.break_minutes
            )));
        }
        Ok(())
    }

    /// Importance weight for a category, falling back to the default.
    pub fn importance_for(&self, category: &str) -> f64 {
        self.category_importance
            .get(category)
            .copied()
            .unwrap_or(self.default_importance)
    }

    /// Whether a category receives the preference bonus.
    pub fn is_preferred(&self, category: &str) -> bool {
        self.preferred_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }

    /// Break length following a task of `duration_minutes`.
    pub fn break_minutes_for(&self, duration_minutes: i64) -> i64 {
        self.break_bands
            .iter()
            .find(|band| band.covers(duration_minutes))
            .or(self.break_bands.last())
            .map(|band| band.break_minutes)
            .unwrap_or_default()
    }

    /// Parsed `day_start`.
    pub fn day_start_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.day_start.trim(), "%H:%M")
            .map_err(|_| ConfigError::InvalidDayStart(self.day_start.clone()))
    }

    /// Day start on `date` in the given offset.
    pub fn day_start_on(
        &self,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> Result<DateTime<FixedOffset>, ConfigError> {
        let time = self.day_start_time()?;
        offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .ok_or_else(|| ConfigError::InvalidDayStart(self.day_start.clone()))
    }
}

/// Weights of the scoring formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub urgency: f64,
    pub importance: f64,
    pub effort: f64,
    pub deadline: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            urgency: 0.4,
            importance: 0.4,
            effort: 0.1,
            deadline: 1.0,
        }
    }
}

impl ScoringWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("urgency", self.urgency),
            ("importance", self.importance),
            ("effort", self.effort),
            ("deadline", self.deadline),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Absolute score thresholds for the priority tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Scores at or above this are high.
    pub high: f64,
    /// Scores at or above this (and below `high`) are medium.
    pub medium: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high: 3.0,
            medium: 2.2,
        }
    }
}

impl TierThresholds {
    /// Tier for a final score.
    pub fn tier_for(&self, score: f64) -> PriorityTier {
        if score >= self.high {
            PriorityTier::High
        } else if score >= self.medium {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.high.is_finite() || !self.medium.is_finite() || self.high < self.medium {
            return Err(ConfigError::InvalidTierThresholds {
                high: self.high,
                medium: self.medium,
            });
        }
        Ok(())
    }
}

/// Break length for tasks up to a duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakBand {
    /// Inclusive upper bound on the task duration; `None` covers the rest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_to_minutes: Option<i64>,

    /// Break length in minutes.
    pub break_minutes: i64,
}

impl BreakBand {
    /// Band for durations up to and including `limit`.
    pub fn up_to(limit: i64, break_minutes: i64) -> Self {
        Self {
            up_to_minutes: Some(limit),
            break_minutes,
        }
    }

    /// Band for every remaining duration.
    pub fn unbounded(break_minutes: i64) -> Self {
        Self {
            up_to_minutes: None,
            break_minutes,
        }
    }

    fn covers(&self, duration_minutes: i64) -> bool {
        self.up_to_minutes
            .map_or(true, |limit| duration_minutes <= limit)
    }
}

/// How long before a task its reminder fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderLeads {
    /// Categories treated as meetings.
    pub meeting_categories: Vec<String>,
    /// Lead time for meetings.
    pub meeting_lead_minutes: i64,
    /// Lead time for high-tier tasks.
    pub high_priority_lead_minutes: i64,
}

impl Default for ReminderLeads {
    fn default() -> Self {
        Self {
            meeting_categories: vec!["meeting".to_string()],
            meeting_lead_minutes: 15,
            high_priority_lead_minutes: 5,
        }
    }
}

impl ReminderLeads {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("meeting_lead_minutes", self.meeting_lead_minutes),
            ("high_priority_lead_minutes", self.high_priority_lead_minutes),
        ] {
            if !(0..=DURATION_LIMIT_MINUTES).contains(&value) {
                return Err(ConfigError::InvalidReminderLead { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DayplanConfig::default().validate().is_ok());
    }

    #[test]
    fn test_break_bands() {
        let config = DayplanConfig::default();
        assert_eq!(config.break_minutes_for(1), 5);
        assert_eq!(config.break_minutes_for(59), 5);
        assert_eq!(config.break_minutes_for(60), 15);
        assert_eq!(config.break_minutes_for(120), 15);
        assert_eq!(config.break_minutes_for(121), 20);
        assert_eq!(config.break_minutes_for(600), 20);
    }

    #[test]
    fn test_unknown_category_uses_default_importance() {
        let config = DayplanConfig::default();
        assert_eq!(config.importance_for("work"), 4.0);
        assert_eq!(config.importance_for("gardening"), 2.0);
    }

    #[test]
    fn test_tier_thresholds() {
        let tiers = TierThresholds::default();
        assert_eq!(tiers.tier_for(3.8), PriorityTier::High);
        assert_eq!(tiers.tier_for(3.0), PriorityTier::High);
        assert_eq!(tiers.tier_for(2.2), PriorityTier::Medium);
        assert_eq!(tiers.tier_for(1.8), PriorityTier::Low);
    }

    #[test]
    fn test_rejects_bounded_last_band() {
        let config = DayplanConfig {
            break_bands: vec![BreakBand::up_to(60, 5)],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBreakBands(_))
        ));
    }

    #[test]
    fn test_rejects_unordered_bands() {
        let config = DayplanConfig {
            break_bands: vec![
                BreakBand::up_to(120, 15),
                BreakBand::up_to(60, 5),
                BreakBand::unbounded(20),
            ],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_tiers() {
        let config = DayplanConfig {
            tiers: TierThresholds {
                high: 1.0,
                medium: 2.0,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTierThresholds { .. })
        ));
    }

    #[test]
    fn test_day_start_on_date() {
        let config = DayplanConfig::default();
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let start = config.day_start_on(date, offset).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-10-19T09:00:00+02:00");
    }

    #[test]
    fn test_invalid_day_start() {
        let config = DayplanConfig {
            day_start: "9am".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDayStart(_))
        ));
    }

    #[test]
    fn test_default_preferred_categories() {
        let config = DayplanConfig::default();
        assert!(config.is_preferred("meeting"));
        assert!(config.is_preferred("Review"));
        assert!(!config.is_preferred("work"));
    }

    #[test]
    fn test_max_duration_bounds() {
        let below_default = DayplanConfig {
            max_duration_minutes: 10,
            ..Default::default()
        };
        assert_eq!(
            below_default.validate(),
            Err(ConfigError::InvalidMaxDuration(10))
        );

        let huge = DayplanConfig {
            max_duration_minutes: i64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::InvalidMaxDuration(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_reminder_lead() {
        let mut config = DayplanConfig::default();
        config.reminders.meeting_lead_minutes = -1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidReminderLead { name: "meeting_lead_minutes", .. })
        ));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: DayplanConfig =
            serde_json::from_str(r#"{"default_duration_minutes": 45, "weights": {"urgency": 1.0}}"#)
                .unwrap();
        assert_eq!(config.default_duration_minutes, 45);
        assert_eq!(config.weights.urgency, 1.0);
        assert_eq!(config.weights.importance, 0.4);
        assert_eq!(config.break_bands.len(), 3);
    }
}
