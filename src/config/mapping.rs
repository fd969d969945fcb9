//! Survey to notification mapping.
//!
//! The mapping is configured as one string of comma-separated
//! `notificationId:surveyName` pairs, for example
//! `"N1:DailyCheckIn,N2:WeeklyMood"`. It is parsed once when configuration
//! is loaded. Entries that do not split into exactly two non-empty tokens
//! are logged and set aside; the remaining pairs keep their configured
//! order. Survey names may repeat, and every matching pair fires.
//!
//! Whitespace around each token is dropped, so `"N1: DailyCheckIn"` matches
//! a task named `DailyCheckIn`. The comparison itself is exact and
//! case-sensitive.

use std::fmt;

/// Separator between pairs
pub const PAIR_SEPARATOR: char = ',';

/// Separator between the notification id and the survey name
pub const FIELD_SEPARATOR: char = ':';

/// One `notificationId:surveyName` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPair {
    pub notification_id: String,
    pub survey_name: String,
}

impl MappingPair {
    pub fn new(notification_id: impl Into<String>, survey_name: impl Into<String>) -> Self {
        Self {
            notification_id: notification_id.into(),
            survey_name: survey_name.into(),
        }
    }

    /// Parse a single entry, returning `None` when it is malformed
    pub fn parse(entry: &str) -> Option<Self> {
        let fields: Vec<&str> = entry.split(FIELD_SEPARATOR).map(str::trim).collect();
        match fields.as_slice() {
            [notification_id, survey_name]
                if !notification_id.is_empty() && !survey_name.is_empty() =>
            {
                Some(Self::new(*notification_id, *survey_name))
            }
            _ => None,
        }
    }
}

impl fmt::Display for MappingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.notification_id, FIELD_SEPARATOR, self.survey_name)
    }
}

/// Ordered, validated survey to notification mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationMapping {
    pairs: Vec<MappingPair>,
    rejected: Vec<String>,
}

impl NotificationMapping {
    /// Parse a mapping string, logging every malformed entry
    pub fn parse(raw: &str) -> Self {
        let mut mapping = Self::default();

        if raw.trim().is_empty() {
            return mapping;
        }

        for entry in raw.split(PAIR_SEPARATOR) {
            match MappingPair::parse(entry) {
                Some(pair) => mapping.pairs.push(pair),
                None => {
                    tracing::warn!(
                        "Malformed pair in NOTIFICATION_SURVEY, skipping: {:?}",
                        entry
                    );
                    mapping.rejected.push(entry.to_string());
                }
            }
        }

        tracing::debug!(
            "Parsed notification mapping: {} pair(s), {} rejected",
            mapping.pairs.len(),
            mapping.rejected.len()
        );
        mapping
    }

    /// Build a mapping from already validated pairs
    pub fn from_pairs(pairs: Vec<MappingPair>) -> Self {
        Self {
            pairs,
            rejected: Vec::new(),
        }
    }

    /// Well-formed pairs in configured order
    pub fn pairs(&self) -> &[MappingPair] {
        &self.pairs
    }

    /// Raw entries that were skipped as malformed
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Pairs whose survey name equals `survey_name`, in configured order
    pub fn matches<'a>(
        &'a self,
        survey_name: &'a str,
    ) -> impl Iterator<Item = &'a MappingPair> + 'a {
        self.pairs
            .iter()
            .filter(move |pair| pair.survey_name == survey_name)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}
