use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::models::*;

// ─── Error types ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rejected by server: {0}")]
    Validation(String),
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

// ─── Client ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TripClient {
    client: Client,
    base_url: Url,
}

impl TripClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid API URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API URL cannot have paths appended: {base_url}"));
        }

        let client = Client::builder()
            .user_agent(concat!("planner-tui/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Base URL plus percent-encoded `segments`.
    fn api_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Other(anyhow!("Bad API base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = self.api_url(segments)?;
        tracing::debug!(%method, %url, "api request");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        Self::check_status(resp).await
    }

    async fn check_status(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        match status {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(resp.url().path().to_string())),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let text = resp.text().await.unwrap_or_default();
                Err(ApiError::Validation(validation_message(&text)))
            }
            s if s.is_client_error() || s.is_server_error() => {
                let message = resp.text().await.unwrap_or_default();
                Err(ApiError::Api {
                    status: s.as_u16(),
                    message,
                })
            }
            _ => Ok(resp),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let resp = self.send::<()>(Method::GET, segments, None).await?;
        Ok(resp.json().await?)
    }

    // ── Trips ───────────────────────────────────────────────────────────

    pub async fn get_trip(&self, trip_id: &str) -> Result<TripDetails, ApiError> {
        self.get_json(&["Trip", trip_id]).await
    }

    /// Register the trip, then each invited participant. A failed participant
    /// is logged and skipped; the trip stays created.
    pub async fn create_trip(&self, trip: &NewTrip) -> Result<TripDetails, ApiError> {
        let resp = self
            .send(Method::POST, &["Trip", "register"], Some(trip))
            .await?;
        let created: CreatedTrip = resp.json().await?;
        tracing::info!(trip_id = %created.id, name = %trip.name, "trip created");

        for participant in &trip.participants {
            if let Err(e) = self.invite_participant(&created.id, participant).await {
                tracing::warn!(trip_id = %created.id, email = %participant.email, error = %e,
                    "failed to register participant");
            }
        }

        Ok(TripDetails {
            id: created.id,
            name: created.name.unwrap_or_else(|| trip.name.clone()),
            start_date: created.start_date.unwrap_or_else(|| trip.start_date.clone()),
            end_date: created.end_date.unwrap_or_else(|| trip.end_date.clone()),
            activities: None,
            participants: None,
            links: None,
        })
    }

    pub async fn update_trip(&self, trip_id: &str, update: &TripUpdate) -> Result<(), ApiError> {
        self.send(Method::PUT, &["Trip", trip_id, "update"], Some(update))
            .await?;
        Ok(())
    }

    // ── Activities ──────────────────────────────────────────────────────

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn list_activities(&self, trip_id: &str) -> Result<Vec<Activity>, ApiError> {
        Ok(self.get_trip(trip_id).await?.activities.unwrap_or_default())
    }

    pub async fn create_activity(
        &self,
        trip_id: &str,
        activity: &NewActivity,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &["TripActivities", trip_id, "register"],
            Some(activity),
        )
        .await?;
        Ok(())
    }

    pub async fn complete_activity(&self, trip_id: &str, activity_id: &str) -> Result<(), ApiError> {
        self.send::<()>(
            Method::PUT,
            &["TripActivities", trip_id, "complete", activity_id],
            None,
        )
        .await?;
        Ok(())
    }

    // ── Participants ────────────────────────────────────────────────────

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn list_participants(&self, trip_id: &str) -> Result<Vec<Participant>, ApiError> {
        Ok(self.get_trip(trip_id).await?.participants.unwrap_or_default())
    }

    pub async fn invite_participant(
        &self,
        trip_id: &str,
        participant: &NewParticipant,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &["TripParticipants", trip_id, "register"],
            Some(participant),
        )
        .await?;
        Ok(())
    }

    pub async fn confirm_participant(
        &self,
        trip_id: &str,
        participant_id: &str,
    ) -> Result<(), ApiError> {
        self.send::<()>(
            Method::PUT,
            &["TripParticipants", trip_id, "confirm", participant_id],
            None,
        )
        .await?;
        Ok(())
    }

    // ── Links ───────────────────────────────────────────────────────────

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn list_links(&self, trip_id: &str) -> Result<Vec<Link>, ApiError> {
        Ok(self.get_trip(trip_id).await?.links.unwrap_or_default())
    }

    pub async fn create_link(&self, trip_id: &str, link: &NewLink) -> Result<(), ApiError> {
        self.send(Method::POST, &["TripLinks", trip_id, "register"], Some(link))
            .await?;
        Ok(())
    }

    pub async fn update_link(
        &self,
        trip_id: &str,
        link_id: &str,
        link: &NewLink,
    ) -> Result<(), ApiError> {
        self.send(
            Method::PUT,
            &["TripLinks", trip_id, "update", link_id],
            Some(link),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_link(&self, trip_id: &str, link_id: &str) -> Result<(), ApiError> {
        self.send::<()>(
            Method::DELETE,
            &["TripLinks", trip_id, "delete", link_id],
            None,
        )
        .await?;
        Ok(())
    }
}

/// Pull the `errors` member out of a validation response, falling back to
/// the raw body.
fn validation_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("errors") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(errors) => errors.to_string(),
            None => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
