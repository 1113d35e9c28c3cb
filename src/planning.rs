use chrono::{Locale, TimeZone};
use std::fmt;

use crate::activities::activity_instant;
use crate::calendar::{CalendarDay, DateError, DateRangeSelection};
use crate::models::{NewActivity, NewLink, NewParticipant, NewTrip, Participant, TripUpdate};
use crate::validate;

/// Longest destination shown before the trip headline is truncated.
const MAX_HEADLINE_DESTINATION: usize = 14;

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Form problems. The display text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanningError {
    #[error("Preencha todas informações da viagem para prosseguir.")]
    IncompleteTrip,
    #[error("Preencha todos campos")]
    MissingFields,
    #[error("E-mail inválido")]
    InvalidEmail,
    #[error("Esse e-mail já foi adicionado")]
    DuplicateEmail,
    #[error("Informe um título para o link")]
    MissingTitle,
    #[error("Link inválido")]
    InvalidUrl,
    #[error("{0}")]
    Date(#[from] DateError),
}

// ─── Guests ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestList {
    guests: Vec<Guest>,
}

impl GuestList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a guest. Emails are compared trimmed and stored lowercased.
    pub fn add(&mut self, name: &str, email: &str) -> Result<(), PlanningError> {
        let name = name.trim();
        let email = email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() {
            return Err(PlanningError::MissingFields);
        }
        if !validate::email(&email) {
            return Err(PlanningError::InvalidEmail);
        }
        if self.contains(&email) {
            return Err(PlanningError::DuplicateEmail);
        }
        self.guests.push(Guest {
            name: name.to_string(),
            email,
        });
        Ok(())
    }

    pub fn remove(&mut self, email: &str) {
        let email = email.trim().to_lowercase();
        self.guests.retain(|g| g.email != email);
    }

    /// Case-insensitive, like `add`.
    pub fn contains(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.guests.iter().any(|g| g.email == email)
    }

    pub fn guests(&self) -> &[Guest] {
        &self.guests
    }

    pub fn len(&self) -> usize {
        self.guests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    pub fn summary(&self) -> String {
        match self.guests.len() {
            0 => String::new(),
            1 => "1 pessoa convidada".into(),
            n => format!("{n} pessoas convidadas"),
        }
    }

    pub fn to_participants(&self) -> Vec<NewParticipant> {
        self.guests
            .iter()
            .map(|g| NewParticipant {
                name: g.name.clone(),
                email: g.email.clone(),
            })
            .collect()
    }
}

// ─── Trip draft ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TripStep {
    #[default]
    TripDetails,
    AddEmail,
}

/// State of the two-step "new trip" form.
#[derive(Debug, Clone, Default)]
pub struct TripDraft {
    pub destination: String,
    pub dates: DateRangeSelection,
    pub guests: GuestList,
    pub step: TripStep,
}

impl TripDraft {
    pub fn select_day(&mut self, day: CalendarDay, locale: Locale) {
        self.dates = self.dates.select_day(day, locale);
    }

    fn check_details(&self) -> Result<(CalendarDay, CalendarDay), PlanningError> {
        if self.destination.trim().is_empty() {
            return Err(PlanningError::IncompleteTrip);
        }
        self.dates.bounds().ok_or(PlanningError::IncompleteTrip)
    }

    /// Move from trip details to guest invitations once destination and
    /// both dates are filled in.
    pub fn next_step(&mut self) -> Result<(), PlanningError> {
        self.check_details()?;
        self.step = TripStep::AddEmail;
        Ok(())
    }

    pub fn back_to_details(&mut self) {
        self.step = TripStep::TripDetails;
    }

    pub fn to_new_trip(&self) -> Result<NewTrip, PlanningError> {
        let (start, end) = self.check_details()?;
        Ok(NewTrip {
            name: self.destination.trim().to_string(),
            start_date: start.date_string(),
            end_date: end.date_string(),
            participants: self.guests.to_participants(),
        })
    }
}

/// Form used to rename a trip or move its dates.
#[derive(Debug, Clone, Default)]
pub struct TripEdit {
    pub destination: String,
    pub dates: DateRangeSelection,
}

impl TripEdit {
    pub fn to_update(&self) -> Result<TripUpdate, PlanningError> {
        if self.destination.trim().is_empty() {
            return Err(PlanningError::MissingFields);
        }
        let (start, end) = self.dates.bounds().ok_or(PlanningError::MissingFields)?;
        Ok(TripUpdate {
            name: self.destination.trim().to_string(),
            start_date: start.date_string(),
            end_date: end.date_string(),
        })
    }
}

// ─── Activity draft ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ActivityDraft {
    pub name: String,
    pub day: Option<CalendarDay>,
    hour: String,
}

impl ActivityDraft {
    pub fn hour(&self) -> &str {
        &self.hour
    }

    /// Keep at most two digits; keypad separators and other noise are dropped.
    pub fn set_hour(&mut self, text: &str) {
        self.hour = text
            .chars()
            .filter(char::is_ascii_digit)
            .take(2)
            .collect();
    }

    pub fn build<Z>(&self, zone: &Z) -> Result<NewActivity, PlanningError>
    where
        Z: TimeZone + fmt::Debug,
    {
        let name = self.name.trim();
        let (Some(day), false, false) = (self.day, name.is_empty(), self.hour.is_empty()) else {
            return Err(PlanningError::MissingFields);
        };
        let hour: u32 = self.hour.parse().map_err(|_| PlanningError::MissingFields)?;
        Ok(NewActivity {
            name: name.to_string(),
            date: activity_instant(&day, hour, zone)?,
        })
    }
}

// ─── Link draft ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LinkDraft {
    /// Set when editing an existing link.
    pub id: Option<String>,
    pub title: String,
    pub url: String,
}

impl LinkDraft {
    pub fn build(&self) -> Result<NewLink, PlanningError> {
        if self.title.trim().is_empty() {
            return Err(PlanningError::MissingTitle);
        }
        if !validate::url(&self.url) {
            return Err(PlanningError::InvalidUrl);
        }
        Ok(NewLink {
            title: self.title.trim().to_string(),
            url: self.url.trim().to_string(),
        })
    }
}

// ─── Participants ───────────────────────────────────────────────────────────

/// Confirmed participants first; the server's order is kept otherwise.
pub fn sort_participants(participants: &mut [Participant]) {
    participants.sort_by_key(|p| !p.is_confirmed);
}

/// "Florianópolis de 5 a 9 de março"; long destinations are cut short.
pub fn trip_headline(destination: &str, dates_label: &str) -> String {
    let shown = if destination.chars().count() > MAX_HEADLINE_DESTINATION {
        let cut: String = destination.chars().take(MAX_HEADLINE_DESTINATION).collect();
        format!("{cut}...")
    } else {
        destination.to_string()
    };
    format!("{shown} de {dates_label}")
}
