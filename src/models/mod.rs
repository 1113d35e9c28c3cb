use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar::parse_instant;

// ─── Trips ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub activities: Option<Vec<Activity>>,
    pub participants: Option<Vec<Participant>>,
    pub links: Option<Vec<Link>>,
}

/// Body of `POST /Trip/register`. Invited guests are registered one by one
/// once the trip exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip)]
    pub participants: Vec<NewParticipant>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripUpdate {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

/// Minimal shape returned by `POST /Trip/register`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTrip {
    pub id: String,
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// ─── Activities ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    #[serde(
        deserialize_with = "deserialize_instant",
        serialize_with = "serialize_instant"
    )]
    pub date: DateTime<Utc>,
    /// The API calls this flag `status`; absent means not done yet.
    #[serde(rename = "status", default, deserialize_with = "deserialize_flag")]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewActivity {
    pub name: String,
    #[serde(serialize_with = "serialize_instant")]
    pub date: DateTime<Utc>,
}

// ─── Participants ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_confirmed: bool,
}

impl Participant {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Pendente",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
}

// ─── Links ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLink {
    pub title: String,
    pub url: String,
}

// ─── Serde helpers ──────────────────────────────────────────────────────────

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw).map_err(serde::de::Error::custom)
}

fn serialize_instant<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
