use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-assigned visitor identity. Rendered as a hyphenated UUID v4.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One item's counter within a session, plus the latest plus/minus activation times
/// already folded into `count`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: u32,
    #[serde(default)]
    pub last_plus: u64,
    #[serde(default)]
    pub last_minus: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub session: SessionId,
    #[serde(default)]
    pub tallies: BTreeMap<String, Tally>,
}

impl CounterSnapshot {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            tallies: BTreeMap::new(),
        }
    }

    pub fn count(&self, item: &str) -> u32 {
        self.tallies.get(item).map_or(0, |tally| tally.count)
    }
}

/// Summed counts in catalog order, as two parallel sequences.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub items: Vec<String>,
    pub counts: Vec<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct VoteRequest {
    pub plus: Option<u64>,
    pub minus: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ItemCount {
    pub item: String,
    pub count: u32,
}

#[derive(Serialize, Debug)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Serialize, Debug)]
pub struct Trace {
    pub x: Vec<String>,
    pub y: Vec<u64>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
}

#[derive(Serialize, Debug)]
pub struct Layout {
    pub title: String,
}

impl Figure {
    pub fn bar(report: AggregateReport, title: &str) -> Self {
        Self {
            data: vec![Trace {
                x: report.items,
                y: report.counts,
                kind: "bar",
                name: "SF",
            }],
            layout: Layout {
                title: title.to_string(),
            },
        }
    }
}
