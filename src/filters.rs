use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tour {
    #[serde(alias = "atp")]
    ATP,
    #[serde(alias = "wta")]
    WTA,
}

impl Tour {
    pub fn as_str(self) -> &'static str {
        match self {
            Tour::ATP => "ATP",
            Tour::WTA => "WTA",
        }
    }

    /// Marker the site's player directory puts in front of each name: `(M)` or `(W)`.
    pub fn gender_marker(self) -> char {
        match self {
            Tour::ATP => 'M',
            Tour::WTA => 'W',
        }
    }
}

impl fmt::Display for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tour {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ATP" => Ok(Tour::ATP),
            "WTA" => Ok(Tour::WTA),
            _ => Err(Error::InvalidTour(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Start/end dates, folded into the leading `&f=Acx…qq` token.
    Date,
    Query,
    /// Player references carried in their own URL parameter (`&q=`, `&x=`).
    People,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterKey {
    HeadToHead,
    ExcludeOpponent,
    StartDate,
    EndDate,
    Surface,
    Level,
    Event,
    Round,
    Sets,
    Score,
    AsRank,
    VsRank,
    VsCurrentRank,
    AsEntry,
    VsEntry,
    VsHand,
    VsHeight,
}

impl FilterKey {
    pub const ALL: [FilterKey; 17] = [
        FilterKey::HeadToHead,
        FilterKey::ExcludeOpponent,
        FilterKey::StartDate,
        FilterKey::EndDate,
        FilterKey::Surface,
        FilterKey::Level,
        FilterKey::Event,
        FilterKey::Round,
        FilterKey::Sets,
        FilterKey::Score,
        FilterKey::AsRank,
        FilterKey::VsRank,
        FilterKey::VsCurrentRank,
        FilterKey::AsEntry,
        FilterKey::VsEntry,
        FilterKey::VsHand,
        FilterKey::VsHeight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKey::HeadToHead => "head-to-head",
            FilterKey::ExcludeOpponent => "exclude opp",
            FilterKey::StartDate => "start date",
            FilterKey::EndDate => "end date",
            FilterKey::Surface => "surface",
            FilterKey::Level => "level",
            FilterKey::Event => "event",
            FilterKey::Round => "round",
            FilterKey::Sets => "sets",
            FilterKey::Score => "score",
            FilterKey::AsRank => "as rank",
            FilterKey::VsRank => "vs rank",
            FilterKey::VsCurrentRank => "vs current rank",
            FilterKey::AsEntry => "as entry",
            FilterKey::VsEntry => "vs entry",
            FilterKey::VsHand => "vs hand",
            FilterKey::VsHeight => "vs height",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            FilterKey::HeadToHead => "&q=",
            FilterKey::ExcludeOpponent => "&x=",
            FilterKey::StartDate | FilterKey::EndDate => "",
            FilterKey::Surface => "B",
            FilterKey::Level => "C",
            FilterKey::Event => "D",
            FilterKey::Round => "E",
            FilterKey::AsRank => "G",
            FilterKey::AsEntry => "H",
            FilterKey::VsRank => "I",
            FilterKey::VsEntry => "J",
            FilterKey::VsHand => "K",
            FilterKey::VsHeight => "M",
            FilterKey::Sets => "P",
            FilterKey::Score => "Q",
            FilterKey::VsCurrentRank => "R",
        }
    }

    pub fn list_separator(self) -> Option<&'static str> {
        match self {
            FilterKey::HeadToHead | FilterKey::ExcludeOpponent | FilterKey::Event => Some(","),
            FilterKey::Surface
            | FilterKey::Level
            | FilterKey::Round
            | FilterKey::Sets
            | FilterKey::AsEntry
            | FilterKey::VsEntry => Some("i"),
            _ => None,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            FilterKey::StartDate | FilterKey::EndDate => Phase::Date,
            FilterKey::HeadToHead | FilterKey::ExcludeOpponent => Phase::People,
            _ => Phase::Query,
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKey {
    type Err = EncodeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let folded = raw
            .trim()
            .to_ascii_lowercase()
            .split(|c: char| c == ' ' || c == '-' || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let key = match folded.as_str() {
            "head to head" | "h2h" | "versus" => FilterKey::HeadToHead,
            "exclude opp" | "exclude opponent" | "exclude" => FilterKey::ExcludeOpponent,
            "start date" | "from" => FilterKey::StartDate,
            "end date" | "until" => FilterKey::EndDate,
            "surface" => FilterKey::Surface,
            "level" => FilterKey::Level,
            "event" => FilterKey::Event,
            "round" => FilterKey::Round,
            "sets" => FilterKey::Sets,
            "score" => FilterKey::Score,
            "as rank" => FilterKey::AsRank,
            "vs rank" => FilterKey::VsRank,
            "vs current rank" | "vs curr rank" => FilterKey::VsCurrentRank,
            "as entry" => FilterKey::AsEntry,
            "vs entry" => FilterKey::VsEntry,
            "vs hand" | "hand" => FilterKey::VsHand,
            "vs height" | "height" => FilterKey::VsHeight,
            _ => return Err(EncodeError::UnknownKey(raw.to_string())),
        };
        Ok(key)
    }
}

impl TryFrom<String> for FilterKey {
    type Error = EncodeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<FilterKey> for String {
    fn from(key: FilterKey) -> Self {
        key.name().to_string()
    }
}

/// A filter value. Which variants a key accepts is decided by its encoder.
///
/// Deserializes untagged from JSON: `[lo, hi]` integers become a range, string
/// arrays a list, ISO `YYYY-MM-DD` strings a date and any other string text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Range(u32, u32),
    List(Vec<String>),
    Date(NaiveDate),
    Text(String),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        FilterValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FilterValue {
    fn from(values: [&str; N]) -> Self {
        FilterValue::List(values.iter().map(|v| v.to_string()).collect())
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::List(values)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(date: NaiveDate) -> Self {
        FilterValue::Date(date)
    }
}

impl From<(u32, u32)> for FilterValue {
    fn from((lo, hi): (u32, u32)) -> Self {
        FilterValue::Range(lo, hi)
    }
}

/// Insertion-ordered attribute map. Setting a key twice replaces the value but
/// keeps the key's original position, so fragment order stays predictable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(FilterKey, FilterValue)>", into = "Vec<(FilterKey, FilterValue)>")]
pub struct Attrs {
    entries: Vec<(FilterKey, FilterValue)>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: FilterKey, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: FilterKey, value: impl Into<FilterValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn from_named<K, V, I>(pairs: I) -> Result<Self, EncodeError>
    where
        K: AsRef<str>,
        V: Into<FilterValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut attrs = Attrs::new();
        for (name, value) in pairs {
            attrs.insert(name.as_ref().parse()?, value);
        }
        Ok(attrs)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Attrs::new());
        }
        let pairs: Vec<(String, FilterValue)> = serde_json::from_str::<OrderedObject>(trimmed)
            .map_err(|err| anyhow::anyhow!("invalid attrs json: {err}"))?
            .0;
        Ok(Attrs::from_named(pairs)?)
    }

    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, key: FilterKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &FilterValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<(FilterKey, FilterValue)>> for Attrs {
    fn from(pairs: Vec<(FilterKey, FilterValue)>) -> Self {
        let mut attrs = Attrs::new();
        for (key, value) in pairs {
            attrs.insert(key, value);
        }
        attrs
    }
}

impl From<Attrs> for Vec<(FilterKey, FilterValue)> {
    fn from(attrs: Attrs) -> Self {
        attrs.entries
    }
}

/// JSON object read as ordered pairs (serde_json's `Map` would sort the keys).
struct OrderedObject(Vec<(String, FilterValue)>);

impl<'de> Deserialize<'de> for OrderedObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> serde::de::Visitor<'de> for PairsVisitor {
            type Value = OrderedObject;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of attribute names to values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut pairs = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, FilterValue>()? {
                    pairs.push((key, value));
                }
                Ok(OrderedObject(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}
