pub mod event;
pub mod picker;
pub mod ui;

use std::future::Future;

use chrono::{Locale, Utc};
use chrono_tz::Tz;
use ratatui::widgets::ListState as RListState;
use tokio::sync::oneshot;

use crate::activities::{day_sections, group_by_day, local_day, DaySection, ScheduledActivity};
use crate::api::TripClient;
use crate::calendar::{CalendarDay, DateError, DateRangeSelection};
use crate::models::*;
use crate::planning::{
    sort_participants, trip_headline, ActivityDraft, GuestList, LinkDraft, PlanningError,
    TripDraft, TripEdit, TripStep,
};
use picker::DatePicker;

// ─── Navigation ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Two-step "plan a new trip" form.
    NewTrip,
    Trip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Activities,
    Details,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Activities, Tab::Details];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Activities => "Atividades",
            Tab::Details => "Detalhes",
        }
    }

    pub fn next(&self) -> Tab {
        match self {
            Tab::Activities => Tab::Details,
            Tab::Details => Tab::Activities,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsPane {
    Links,
    Participants,
}

/// What a calendar click feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarPurpose {
    NewTripDates,
    EditTripDates,
    ActivityDay,
}

/// Action waiting for a yes/no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    CompleteActivity { id: String, name: String },
    ConfirmParticipant { id: String, name: String },
    DeleteLink { id: String, title: String },
}

impl PendingAction {
    pub fn title(&self) -> &'static str {
        match self {
            Self::CompleteActivity { .. } => "Atualizar atividade",
            Self::ConfirmParticipant { .. } => "Confirmar participante na viagem",
            Self::DeleteLink { .. } => "Deletar o link da viagem",
        }
    }

    pub fn question(&self) -> String {
        match self {
            Self::CompleteActivity { name, .. } => format!("Já completou a atividade \"{name}\"?"),
            Self::ConfirmParticipant { name, .. } => {
                format!("Quer confirmar o participante {name} nessa viagem?")
            }
            Self::DeleteLink { title, .. } => {
                format!("Tem certeza que quer deletar o link \"{title}\"?")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    None,
    Calendar(CalendarPurpose),
    /// Guest list of the trip being created.
    Guests,
    NewActivity,
    EditTrip,
    /// Create, or edit when the draft carries an id.
    Link,
    /// Invite a participant to an existing trip.
    Invite,
    Confirm(PendingAction),
}

// ─── Background request result ──────────────────────────────────────────────

pub enum ApiOutcome {
    TripLoaded(TripDetails),
    TripCreated(TripDetails),
    /// A write succeeded; the trip is reloaded afterwards.
    Saved(String),
    Failed(String),
}

// ─── List state ─────────────────────────────────────────────────────────────

/// Tracks logical selection plus a persistent ratatui scroll offset.
///
/// `selected` is the index among *selectable* items (header rows excluded).
/// Render functions sync `inner.selected` to the absolute item index before
/// calling `render_stateful_widget`.
pub struct ListState {
    pub inner: RListState,
    pub selected: usize,
    pub len: usize,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListState {
    pub fn new() -> Self {
        let mut inner = RListState::default();
        inner.select(Some(0));
        Self {
            inner,
            selected: 0,
            len: 0,
        }
    }

    /// Move down, clamped at the last item.
    pub fn select_next(&mut self) {
        if self.len > 0 && self.selected + 1 < self.len {
            self.selected += 1;
        }
    }

    /// Move up, clamped at the first item.
    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.selected >= len && len > 0 {
            self.selected = len - 1;
        }
        if len == 0 {
            self.selected = 0;
        }
    }
}

// ─── App State ──────────────────────────────────────────────────────────────

pub struct App {
    pub client: TripClient,
    pub zone: Tz,
    pub locale: Locale,
    pub running: bool,
    pub screen: Screen,
    pub active_tab: Tab,
    pub modal: Modal,
    /// Index of the focused field in the current form.
    pub focus: usize,

    // New trip form
    pub draft: TripDraft,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_list_state: ListState,

    // Loaded trip
    pub trip: Option<TripDetails>,
    pub headline: String,
    pub sections: Vec<DaySection>,
    pub participants: Vec<Participant>,
    pub links: Vec<Link>,

    // Trip forms
    pub trip_edit: TripEdit,
    pub activity_draft: ActivityDraft,
    pub link_draft: LinkDraft,
    pub invite_name: String,
    pub invite_email: String,
    pub picker: Option<DatePicker>,

    // UI state
    pub activity_list_state: ListState,
    pub link_list_state: ListState,
    pub participant_list_state: ListState,
    pub details_pane: DetailsPane,

    // Status
    pub status_message: String,
    pub loading: bool,
    pub pending_rx: Option<oneshot::Receiver<ApiOutcome>>,

    // Incremented each frame; used to drive the loading spinner.
    pub frame_count: u64,
}

impl App {
    pub fn new(client: TripClient, zone: Tz, locale: Locale) -> Self {
        Self {
            client,
            zone,
            locale,
            running: true,
            screen: Screen::NewTrip,
            active_tab: Tab::Activities,
            modal: Modal::None,
            focus: 0,
            draft: TripDraft::default(),
            guest_name: String::new(),
            guest_email: String::new(),
            guest_list_state: ListState::new(),
            trip: None,
            headline: String::new(),
            sections: Vec::new(),
            participants: Vec::new(),
            links: Vec::new(),
            trip_edit: TripEdit::default(),
            activity_draft: ActivityDraft::default(),
            link_draft: LinkDraft::default(),
            invite_name: String::new(),
            invite_email: String::new(),
            picker: None,
            activity_list_state: ListState::new(),
            link_list_state: ListState::new(),
            participant_list_state: ListState::new(),
            details_pane: DetailsPane::Links,
            status_message: "Convide seus amigos e planeje a próxima viagem".into(),
            loading: false,
            pending_rx: None,
            frame_count: 0,
        }
    }

    pub fn today(&self) -> CalendarDay {
        local_day(&Utc::now(), &self.zone)
    }

    fn trip_id(&self) -> Option<String> {
        self.trip.as_ref().map(|t| t.id.clone())
    }

    fn alert(&mut self, err: PlanningError) {
        self.status_message = err.to_string();
    }

    /// A request is in flight; forms keep their input until it settles.
    fn busy(&mut self) -> bool {
        if self.pending_rx.is_some() {
            self.status_message = "Aguarde a operação em andamento…".into();
        }
        self.pending_rx.is_some()
    }

    /// Dates of the loaded trip, as stored on the server.
    fn trip_dates(&self) -> Result<DateRangeSelection, DateError> {
        let Some(trip) = self.trip.as_ref() else {
            return Ok(DateRangeSelection::empty());
        };
        let start = CalendarDay::parse(&trip.start_date)?;
        let end = CalendarDay::parse(&trip.end_date)?;
        Ok(DateRangeSelection::from_bounds(start, end, self.locale))
    }

    /// Drop unsaved edits and show the loaded trip again.
    pub fn reset_trip_edit(&mut self) {
        let Some(name) = self.trip.as_ref().map(|t| t.name.clone()) else {
            return;
        };
        self.trip_edit = TripEdit {
            destination: name,
            dates: self.trip_dates().unwrap_or_default(),
        };
    }

    // ── Background requests ─────────────────────────────────────────────

    /// Spawn `request` on the runtime and collect its outcome later with
    /// `poll_request`. Only one request runs at a time.
    fn spawn_request<F>(&mut self, label: &str, request: F)
    where
        F: Future<Output = ApiOutcome> + Send + 'static,
    {
        if self.busy() {
            return;
        }
        let (tx, rx) = oneshot::channel();
        self.pending_rx = Some(rx);
        self.loading = true;
        self.status_message = label.into();
        tokio::spawn(async move {
            let _ = tx.send(request.await);
        });
    }

    /// Check the request channel without blocking. Returns `true` when an
    /// outcome was applied.
    pub fn poll_request(&mut self) -> bool {
        let outcome = match self.pending_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(o) => o,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.pending_rx = None;
                    self.loading = false;
                    return false;
                }
            },
        };
        self.pending_rx = None;
        self.loading = false;
        self.apply_outcome(outcome);
        true
    }

    fn apply_outcome(&mut self, outcome: ApiOutcome) {
        match outcome {
            ApiOutcome::TripLoaded(trip) => {
                self.apply_trip(trip);
                self.status_message = "Viagem carregada.".into();
            }
            ApiOutcome::TripCreated(trip) => {
                let id = trip.id.clone();
                self.draft = TripDraft::default();
                self.guest_list_state.set_len(0);
                self.apply_trip(trip);
                self.screen = Screen::Trip;
                self.active_tab = Tab::Activities;
                self.open_trip(&id);
            }
            ApiOutcome::Saved(message) => {
                self.modal = Modal::None;
                self.activity_draft = ActivityDraft::default();
                self.link_draft = LinkDraft::default();
                self.invite_name.clear();
                self.invite_email.clear();
                self.status_message = message;
                self.reload_trip();
            }
            ApiOutcome::Failed(message) => {
                tracing::warn!(%message, "request failed");
                self.status_message = message;
            }
        }
    }

    /// Rebuild every derived view of a freshly loaded trip.
    pub fn apply_trip(&mut self, trip: TripDetails) {
        let activities = trip.activities.clone().unwrap_or_default();
        self.sections = day_sections(group_by_day(&activities, &self.zone), &self.zone, self.locale);
        self.activity_list_state.set_len(activities.len());

        let mut participants = trip.participants.clone().unwrap_or_default();
        sort_participants(&mut participants);
        self.participant_list_state.set_len(participants.len());
        self.participants = participants;

        let links = trip.links.clone().unwrap_or_default();
        self.link_list_state.set_len(links.len());
        self.links = links;

        let trip_id = trip.id.clone();
        self.trip = Some(trip);
        let dates = self.trip_dates().unwrap_or_else(|e| {
            tracing::warn!(%trip_id, error = %e, "trip has unparseable dates");
            DateRangeSelection::empty()
        });
        let name = self.trip.as_ref().map(|t| t.name.clone()).unwrap_or_default();
        self.headline = trip_headline(&name, dates.label());
        self.trip_edit = TripEdit {
            destination: name,
            dates,
        };
    }

    pub fn open_trip(&mut self, trip_id: &str) {
        self.screen = Screen::Trip;
        let client = self.client.clone();
        let id = trip_id.to_string();
        self.spawn_request("Carregando viagem…", async move {
            match client.get_trip(&id).await {
                Ok(trip) => ApiOutcome::TripLoaded(trip),
                Err(e) => ApiOutcome::Failed(format!("Erro ao carregar a viagem: {e}")),
            }
        });
    }

    pub fn reload_trip(&mut self) {
        if let Some(id) = self.trip_id() {
            self.open_trip(&id);
        }
    }

    // ── New trip flow ───────────────────────────────────────────────────

    pub fn new_trip_fields(&self) -> usize {
        match self.draft.step {
            TripStep::TripDetails => 2,
            TripStep::AddEmail => 3,
        }
    }

    /// "Continuar" on the first step, "Confirmar viagem" on the second.
    pub fn submit_new_trip(&mut self) {
        match self.draft.step {
            TripStep::TripDetails => match self.draft.next_step() {
                Ok(()) => {
                    self.focus = 2;
                    self.status_message = "Convide quem estará na viagem.".into();
                }
                Err(e) => self.alert(e),
            },
            TripStep::AddEmail => {
                let new_trip = match self.draft.to_new_trip() {
                    Ok(t) => t,
                    Err(e) => return self.alert(e),
                };
                let client = self.client.clone();
                self.spawn_request("Criando viagem…", async move {
                    match client.create_trip(&new_trip).await {
                        Ok(trip) => ApiOutcome::TripCreated(trip),
                        Err(e) => ApiOutcome::Failed(format!("Erro ao criar a viagem: {e}")),
                    }
                });
            }
        }
    }

    pub fn add_guest(&mut self) {
        match self.draft.guests.add(&self.guest_name, &self.guest_email) {
            Ok(()) => {
                self.guest_name.clear();
                self.guest_email.clear();
                self.focus = 0;
                self.guest_list_state.set_len(self.draft.guests.len());
                self.status_message = self.draft.guests.summary();
            }
            Err(e) => self.alert(e),
        }
    }

    pub fn remove_selected_guest(&mut self) {
        let email = self
            .draft
            .guests
            .guests()
            .get(self.guest_list_state.selected)
            .map(|g| g.email.clone());
        if let Some(email) = email {
            self.draft.guests.remove(&email);
            self.guest_list_state.set_len(self.draft.guests.len());
        }
    }

    // ── Calendar ────────────────────────────────────────────────────────

    pub fn open_calendar(&mut self, purpose: CalendarPurpose) {
        let today = self.today();
        let (initial, min, max) = match purpose {
            CalendarPurpose::NewTripDates => {
                (self.draft.dates.starts_at().unwrap_or(today), Some(today), None)
            }
            CalendarPurpose::EditTripDates => {
                (self.trip_edit.dates.starts_at().unwrap_or(today), Some(today), None)
            }
            CalendarPurpose::ActivityDay => match self.trip_dates().ok().and_then(|d| d.bounds()) {
                Some((start, end)) => (self.activity_draft.day.unwrap_or(start), Some(start), Some(end)),
                None => (self.activity_draft.day.unwrap_or(today), None, None),
            },
        };
        self.picker = Some(DatePicker::new(initial, min, max));
        self.modal = Modal::Calendar(purpose);
    }

    /// Calendar "click" on the cursor day.
    pub fn pick_day(&mut self, purpose: CalendarPurpose) {
        let Some(day) = self.picker.as_ref().map(|p| p.cursor()) else {
            return;
        };
        match purpose {
            CalendarPurpose::NewTripDates => self.draft.select_day(day, self.locale),
            CalendarPurpose::EditTripDates => {
                self.trip_edit.dates = self.trip_edit.dates.select_day(day, self.locale);
            }
            CalendarPurpose::ActivityDay => self.activity_draft.day = Some(day),
        }
    }

    /// Marked days shown by the open calendar.
    pub fn calendar_selection(&self, purpose: CalendarPurpose) -> DateRangeSelection {
        match purpose {
            CalendarPurpose::NewTripDates => self.draft.dates.clone(),
            CalendarPurpose::EditTripDates => self.trip_edit.dates.clone(),
            CalendarPurpose::ActivityDay => match self.activity_draft.day {
                Some(day) => DateRangeSelection::empty().select_day(day, self.locale),
                None => DateRangeSelection::empty(),
            },
        }
    }

    pub fn close_calendar(&mut self, purpose: CalendarPurpose) {
        self.picker = None;
        self.modal = match purpose {
            CalendarPurpose::NewTripDates => Modal::None,
            CalendarPurpose::EditTripDates => Modal::EditTrip,
            CalendarPurpose::ActivityDay => Modal::NewActivity,
        };
    }

    // ── Trip edits ──────────────────────────────────────────────────────

    pub fn open_modal(&mut self, modal: Modal) {
        self.focus = 0;
        self.modal = modal;
    }

    pub fn submit_trip_edit(&mut self) {
        let Some(trip_id) = self.trip_id() else {
            return;
        };
        if self.busy() {
            return;
        }
        let update = match self.trip_edit.to_update() {
            Ok(u) => u,
            Err(e) => return self.alert(e),
        };
        let client = self.client.clone();
        self.spawn_request("Atualizando viagem…", async move {
            match client.update_trip(&trip_id, &update).await {
                Ok(()) => ApiOutcome::Saved("Viagem atualizada com sucesso!".into()),
                Err(e) => ApiOutcome::Failed(format!("Erro ao atualizar a viagem: {e}")),
            }
        });
    }

    pub fn submit_activity(&mut self) {
        let Some(trip_id) = self.trip_id() else {
            return;
        };
        if self.busy() {
            return;
        }
        let activity = match self.activity_draft.build(&self.zone) {
            Ok(a) => a,
            Err(e) => return self.alert(e),
        };
        let client = self.client.clone();
        self.spawn_request("Cadastrando atividade…", async move {
            match client.create_activity(&trip_id, &activity).await {
                Ok(()) => ApiOutcome::Saved("Nova atividade cadastrada com sucesso!".into()),
                Err(e) => ApiOutcome::Failed(format!("Erro ao salvar a atividade: {e}")),
            }
        });
    }

    pub fn submit_link(&mut self) {
        let Some(trip_id) = self.trip_id() else {
            return;
        };
        if self.busy() {
            return;
        }
        let link = match self.link_draft.build() {
            Ok(l) => l,
            Err(e) => return self.alert(e),
        };
        let link_id = self.link_draft.id.clone();
        let client = self.client.clone();
        self.spawn_request("Salvando link…", async move {
            let result = match &link_id {
                Some(id) => client.update_link(&trip_id, id, &link).await,
                None => client.create_link(&trip_id, &link).await,
            };
            match (result, link_id) {
                (Ok(()), Some(_)) => ApiOutcome::Saved("Link atualizado com sucesso!".into()),
                (Ok(()), None) => ApiOutcome::Saved("Link criado com sucesso!".into()),
                (Err(e), _) => ApiOutcome::Failed(format!("Erro ao salvar o link: {e}")),
            }
        });
    }

    pub fn submit_invite(&mut self) {
        let Some(trip_id) = self.trip_id() else {
            return;
        };
        if self.busy() {
            return;
        }
        let mut invite = GuestList::new();
        if let Err(e) = invite.add(&self.invite_name, &self.invite_email) {
            return self.alert(e);
        }
        let Some(participant) = invite.to_participants().pop() else {
            return;
        };
        let already_invited = self
            .participants
            .iter()
            .any(|p| p.email.trim().to_lowercase() == participant.email);
        if already_invited {
            return self.alert(PlanningError::DuplicateEmail);
        }
        let client = self.client.clone();
        self.spawn_request("Convidando participante…", async move {
            match client.invite_participant(&trip_id, &participant).await {
                Ok(()) => ApiOutcome::Saved("Participante convidado!".into()),
                Err(e) => ApiOutcome::Failed(format!("Erro ao convidar participante: {e}")),
            }
        });
    }

    pub fn edit_selected_link(&mut self) {
        if let Some(link) = self.links.get(self.link_list_state.selected) {
            self.link_draft = LinkDraft {
                id: Some(link.id.clone()),
                title: link.title.clone(),
                url: link.url.clone(),
            };
            self.open_modal(Modal::Link);
        }
    }

    pub fn new_link(&mut self) {
        self.link_draft = LinkDraft::default();
        self.open_modal(Modal::Link);
    }

    // ── Confirmations ───────────────────────────────────────────────────

    pub fn selected_activity(&self) -> Option<&ScheduledActivity> {
        self.sections
            .iter()
            .flat_map(|s| s.activities.iter())
            .nth(self.activity_list_state.selected)
    }

    pub fn ask_complete_selected_activity(&mut self) {
        let Some(item) = self.selected_activity() else {
            return;
        };
        if item.activity.completed {
            self.status_message = "Essa atividade já foi concluída.".into();
            return;
        }
        let action = PendingAction::CompleteActivity {
            id: item.activity.id.clone(),
            name: item.activity.name.clone(),
        };
        self.modal = Modal::Confirm(action);
    }

    pub fn ask_confirm_selected_participant(&mut self) {
        let Some(p) = self.participants.get(self.participant_list_state.selected) else {
            return;
        };
        if p.is_confirmed {
            self.status_message = "Participante já confirmado.".into();
            return;
        }
        let Some(id) = p.id.clone() else {
            self.status_message = "Participante sem identificador.".into();
            return;
        };
        let action = PendingAction::ConfirmParticipant {
            id,
            name: p.display_name().to_string(),
        };
        self.modal = Modal::Confirm(action);
    }

    pub fn ask_delete_link(&mut self) {
        let target = match &self.link_draft.id {
            Some(id) => Some((id.clone(), self.link_draft.title.clone())),
            None => self
                .links
                .get(self.link_list_state.selected)
                .map(|l| (l.id.clone(), l.title.clone())),
        };
        if let Some((id, title)) = target {
            self.modal = Modal::Confirm(PendingAction::DeleteLink { id, title });
        }
    }

    pub fn run_pending(&mut self, action: PendingAction) {
        let Some(trip_id) = self.trip_id() else {
            return;
        };
        let client = self.client.clone();
        self.modal = Modal::None;
        match action {
            PendingAction::CompleteActivity { id, .. } => {
                self.spawn_request("Atualizando atividade…", async move {
                    match client.complete_activity(&trip_id, &id).await {
                        Ok(()) => ApiOutcome::Saved("Atividade atualizada com sucesso!".into()),
                        Err(e) => ApiOutcome::Failed(format!("Erro ao atualizar a atividade: {e}")),
                    }
                });
            }
            PendingAction::ConfirmParticipant { id, .. } => {
                self.spawn_request("Confirmando participante…", async move {
                    match client.confirm_participant(&trip_id, &id).await {
                        Ok(()) => ApiOutcome::Saved("Participante confirmado!".into()),
                        Err(e) => {
                            ApiOutcome::Failed(format!("Erro ao confirmar participante: {e}"))
                        }
                    }
                });
            }
            PendingAction::DeleteLink { id, .. } => {
                self.spawn_request("Deletando link…", async move {
                    match client.delete_link(&trip_id, &id).await {
                        Ok(()) => ApiOutcome::Saved("Link deletado com sucesso!".into()),
                        Err(e) => ApiOutcome::Failed(format!("Erro ao deletar o link: {e}")),
                    }
                });
            }
        }
    }

    pub fn active_list_state_mut(&mut self) -> &mut ListState {
        match (self.active_tab, self.details_pane) {
            (Tab::Activities, _) => &mut self.activity_list_state,
            (Tab::Details, DetailsPane::Links) => &mut self.link_list_state,
            (Tab::Details, DetailsPane::Participants) => &mut self.participant_list_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let client = TripClient::new("http://localhost:5000").unwrap();
        App::new(client, chrono_tz::UTC, Locale::pt_BR)
    }

    fn trip_json() -> TripDetails {
        serde_json::from_str(
            r#"{"id":"t1","name":"Fernando de Noronha","startDate":"2024-03-05T00:00:00",
                "endDate":"2024-03-09T00:00:00",
                "activities":[
                    {"id":"a2","name":"Mergulho","date":"2024-03-07T09:00:00Z","status":false},
                    {"id":"a1","name":"Trilha","date":"2024-03-06T15:00:00Z","status":true}],
                "participants":[
                    {"id":"p1","name":"Ana","email":"ana@example.com","isConfirmed":false},
                    {"id":"p2","name":"Bia","email":"bia@example.com","isConfirmed":true}],
                "links":[{"id":"l1","title":"Pousada","url":"https://pousada.example.com"}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn apply_trip_builds_views() {
        let mut app = app();
        app.apply_trip(trip_json());

        assert_eq!(app.headline, "Fernando de No... de 5 a 9 de março");
        assert_eq!(app.sections.len(), 2);
        assert_eq!(app.sections[0].title, "Dia 6 - quarta");
        assert_eq!(app.sections[0].activities[0].hour, "03:00h");
        assert_eq!(app.activity_list_state.len, 2);
        assert_eq!(app.participants[0].email, "bia@example.com");
        assert_eq!(app.links.len(), 1);
        assert!(app.trip_edit.dates.is_complete());
    }

    #[test]
    fn completed_activity_is_not_offered_again() {
        let mut app = app();
        app.apply_trip(trip_json());

        app.activity_list_state.selected = 0;
        app.ask_complete_selected_activity();
        assert_eq!(app.modal, Modal::None);

        app.activity_list_state.selected = 1;
        app.ask_complete_selected_activity();
        assert_eq!(
            app.modal,
            Modal::Confirm(PendingAction::CompleteActivity {
                id: "a2".into(),
                name: "Mergulho".into()
            })
        );
    }

    #[test]
    fn activity_calendar_is_bounded_by_trip() {
        let mut app = app();
        app.apply_trip(trip_json());
        app.open_calendar(CalendarPurpose::ActivityDay);

        let picker = app.picker.as_ref().unwrap();
        assert_eq!(picker.cursor(), CalendarDay::from_ymd(2024, 3, 5).unwrap());
        assert!(!picker.is_selectable(&CalendarDay::from_ymd(2024, 3, 10).unwrap()));

        app.pick_day(CalendarPurpose::ActivityDay);
        app.close_calendar(CalendarPurpose::ActivityDay);
        assert_eq!(app.modal, Modal::NewActivity);
        assert_eq!(app.activity_draft.day, CalendarDay::from_ymd(2024, 3, 5));
    }

    #[test]
    fn guests_are_added_and_removed() {
        let mut app = app();
        app.guest_name = "Ana".into();
        app.guest_email = "Ana@Example.com".into();
        app.add_guest();
        assert_eq!(app.draft.guests.len(), 1);
        assert!(app.guest_email.is_empty());

        app.guest_name = "Outra Ana".into();
        app.guest_email = "ana@example.com".into();
        app.add_guest();
        assert_eq!(app.status_message, "Esse e-mail já foi adicionado");

        app.remove_selected_guest();
        assert!(app.draft.guests.is_empty());
    }

    #[test]
    fn first_step_requires_dates() {
        let mut app = app();
        app.draft.destination = "Bonito".into();
        app.submit_new_trip();
        assert_eq!(app.draft.step, TripStep::TripDetails);
        assert_eq!(app.status_message, "Preencha todas informações da viagem para prosseguir.");
    }

    #[test]
    fn invite_rejects_existing_participant() {
        let mut app = app();
        app.apply_trip(trip_json());
        app.invite_name = "Ana".into();
        app.invite_email = "ANA@example.com".into();
        app.submit_invite();
        assert_eq!(app.status_message, "Esse e-mail já foi adicionado");
        assert!(app.pending_rx.is_none());
    }

    #[test]
    fn invite_matches_participant_email_ignoring_case() {
        let mut app = app();
        let mut trip = trip_json();
        if let Some(participants) = trip.participants.as_mut() {
            participants[0].email = "Carla@Example.com".into();
        }
        app.apply_trip(trip);
        app.invite_name = "Carla".into();
        app.invite_email = "carla@example.com".into();
        app.submit_invite();
        assert_eq!(app.status_message, "Esse e-mail já foi adicionado");
        assert!(app.pending_rx.is_none());
    }

    /// Wait for the in-flight request and apply its outcome.
    async fn settle(app: &mut App) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while !app.poll_request() {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn submit_while_busy_keeps_the_form() {
        let mut app = app();
        app.apply_trip(trip_json());
        let (_tx, rx) = oneshot::channel();
        app.pending_rx = Some(rx);

        app.modal = Modal::NewActivity;
        app.activity_draft.name = "Passeio de barco".into();
        app.activity_draft.day = CalendarDay::from_ymd(2024, 3, 6);
        app.activity_draft.set_hour("10");
        app.submit_activity();

        assert_eq!(app.status_message, "Aguarde a operação em andamento…");
        assert_eq!(app.modal, Modal::NewActivity);
        assert_eq!(app.activity_draft.name, "Passeio de barco");
        assert_eq!(app.activity_draft.hour(), "10");
    }

    #[tokio::test]
    async fn failed_save_keeps_the_form() {
        let client = TripClient::new("http://127.0.0.1:1").unwrap();
        let mut app = App::new(client, chrono_tz::UTC, Locale::pt_BR);
        app.apply_trip(trip_json());
        app.edit_selected_link();
        app.link_draft.title = "Pousada Maravilha".into();
        app.submit_link();
        assert!(app.loading);

        settle(&mut app).await;
        assert!(app.status_message.starts_with("Erro ao salvar o link"));
        assert_eq!(app.modal, Modal::Link);
        assert_eq!(app.link_draft.id.as_deref(), Some("l1"));
        assert_eq!(app.link_draft.title, "Pousada Maravilha");
    }

    #[tokio::test]
    async fn successful_save_clears_the_form() {
        let (base, server) = crate::api::tests::serve_once("204 No Content", "").await;
        let client = TripClient::new(&base).unwrap();
        let mut app = App::new(client, chrono_tz::UTC, Locale::pt_BR);
        app.apply_trip(trip_json());
        app.modal = Modal::Invite;
        app.invite_name = "Caio".into();
        app.invite_email = "caio@example.com".into();
        app.submit_invite();

        settle(&mut app).await;
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/TripParticipants/t1/register"));
        assert_eq!(app.modal, Modal::None);
        assert!(app.invite_name.is_empty());
        assert!(app.invite_email.is_empty());
    }
}
