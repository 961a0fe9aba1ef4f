//! Road classification normalized at ingestion time.
//!
//! Map data tags a road with one highway type, or occasionally a list of
//! them.  The graph stores a single [`RoadClass`]; the first listed type
//! wins and a missing tag counts as residential.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    /// motorway, trunk, primary
    Major,
    /// secondary, tertiary, unclassified
    Medium,
    /// everything else (residential, service, living streets, …)
    #[default]
    Minor,
}

impl RoadClass {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "motorway" | "trunk" | "primary" => RoadClass::Major,
            "secondary" | "tertiary" | "unclassified" => RoadClass::Medium,
            _ => RoadClass::Minor,
        }
    }

    /// Normalize a possibly multi-valued tag.  Only the first value counts.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        tags.first()
            .map(|t| Self::from_tag(t.as_ref()))
            .unwrap_or_default()
    }

    /// Suggested stroke width for render sinks.
    pub fn line_width(self) -> u8 {
        match self {
            RoadClass::Major  => 3,
            RoadClass::Medium => 2,
            RoadClass::Minor  => 1,
        }
    }
}

impl std::fmt::Display for RoadClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoadClass::Major  => "major",
            RoadClass::Medium => "medium",
            RoadClass::Minor  => "minor",
        };
        f.write_str(s)
    }
}
