//! Recognized search filters per resource.
//!
//! Filters arrive from the query string; names the service does not know are
//! dropped during deserialization. Absent filters are skipped when serialized, so
//! the cache key only reflects what actually narrows the result.

use serde::{Deserialize, Serialize};

use super::repository::Condition;

/// Narrows a search with AND-combined conditions.
pub trait SearchFilters {
    fn conditions(&self) -> Vec<Condition>;
}

/// Filters for alumni profile searches and listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentorship_available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<u32>,
}

impl SearchFilters for ProfileFilters {
    fn conditions(&self) -> Vec<Condition> {
        let mut conditions = Vec::new();
        if let Some(industry) = non_empty(&self.industry) {
            conditions.push(Condition::equals("industry", industry));
        }
        if let Some(location) = non_empty(&self.location) {
            conditions.push(Condition::contains("location", location));
        }
        if let Some(level) = non_empty(&self.experience_level) {
            conditions.push(Condition::equals("experience_level", level));
        }
        // `false` means "don't care", not "only unavailable mentors"
        if self.mentorship_available == Some(true) {
            conditions.push(Condition::equals("mentorship_available", true));
        }
        if let Some(year) = self.graduation_year {
            conditions.push(Condition::equals("graduation_year", year));
        }
        conditions
    }
}

/// Filters for event searches and listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_virtual: Option<bool>,
}

impl SearchFilters for EventFilters {
    fn conditions(&self) -> Vec<Condition> {
        let mut conditions = Vec::new();
        if let Some(kind) = non_empty(&self.event_type) {
            conditions.push(Condition::equals("event_type", kind));
        }
        if let Some(start) = non_empty(&self.start_date) {
            conditions.push(Condition::at_least("start_date", start));
        }
        if let Some(end) = non_empty(&self.end_date) {
            conditions.push(Condition::at_most("end_date", end));
        }
        if let Some(is_virtual) = self.is_virtual {
            conditions.push(Condition::equals("is_virtual", is_virtual));
        }
        conditions
    }
}

/// Filters for forum post searches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForumFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl SearchFilters for ForumFilters {
    fn conditions(&self) -> Vec<Condition> {
        non_empty(&self.category_id)
            .map(|category| vec![Condition::equals("category_id", category)])
            .unwrap_or_default()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_filters_are_ignored() {
        let filters: ProfileFilters =
            serde_json::from_value(json!({"industry": "Tech", "favourite_colour": "red"})).unwrap();

        assert_eq!(filters.industry.as_deref(), Some("Tech"));
        assert_eq!(serde_json::to_value(&filters).unwrap(), json!({"industry": "Tech"}));
    }

    #[test]
    fn test_profile_conditions() {
        let filters = ProfileFilters {
            industry: Some("Tech".into()),
            location: Some("Berlin".into()),
            mentorship_available: Some(false),
            graduation_year: Some(2015),
            ..Default::default()
        };

        assert_eq!(
            filters.conditions(),
            vec![
                Condition::equals("industry", "Tech"),
                Condition::contains("location", "berlin"),
                Condition::equals("graduation_year", 2015),
            ]
        );
    }

    #[test]
    fn test_event_date_range() {
        let filters = EventFilters {
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-12-31".into()),
            is_virtual: Some(false),
            ..Default::default()
        };

        assert_eq!(
            filters.conditions(),
            vec![
                Condition::at_least("start_date", "2024-01-01"),
                Condition::at_most("end_date", "2024-12-31"),
                Condition::equals("is_virtual", false),
            ]
        );
    }

    #[test]
    fn test_blank_values_do_not_filter() {
        let filters = ForumFilters {
            category_id: Some("  ".into()),
        };
        assert!(filters.conditions().is_empty());
        assert!(EventFilters::default().conditions().is_empty());
    }
}
