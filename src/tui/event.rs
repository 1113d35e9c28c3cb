use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use std::time::Duration;

use super::{App, CalendarPurpose, DetailsPane, Modal, PendingAction, Screen, Tab};
use crate::planning::TripStep;

pub fn poll_event(timeout: Duration) -> anyhow::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Kind of the focused form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Text,
    Hour,
    /// Read-only; Enter opens the calendar.
    Dates(CalendarPurpose),
    /// Read-only; Enter opens the guest list.
    Guests,
}

pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (code, modifiers) {
        app.running = false;
        return;
    }

    match app.modal.clone() {
        Modal::Confirm(action) => handle_confirm_key(app, code, action),
        Modal::Calendar(purpose) => handle_calendar_key(app, code, purpose),
        Modal::Guests => handle_guests_key(app, code),
        Modal::None if app.screen == Screen::Trip => handle_trip_key(app, code),
        _ => handle_form_key(app, code, modifiers),
    }
}

// ─── Trip screen ────────────────────────────────────────────────────────────

fn handle_trip_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => {
            app.running = false;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.active_tab = app.active_tab.next();
        }
        KeyCode::Char('1') => app.active_tab = Tab::Activities,
        KeyCode::Char('2') => app.active_tab = Tab::Details,
        KeyCode::Down | KeyCode::Char('j') => {
            app.active_list_state_mut().select_next();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.active_list_state_mut().select_prev();
        }
        KeyCode::Home | KeyCode::Char('g') => {
            app.active_list_state_mut().selected = 0;
        }
        KeyCode::End | KeyCode::Char('G') => {
            let ls = app.active_list_state_mut();
            if ls.len > 0 {
                ls.selected = ls.len - 1;
            }
        }
        KeyCode::Char('r') if !app.loading => app.reload_trip(),
        KeyCode::Char('e') if app.trip.is_some() => {
            app.reset_trip_edit();
            app.open_modal(Modal::EditTrip);
        }
        KeyCode::Char('n') if app.trip.is_some() => app.open_modal(Modal::NewActivity),
        KeyCode::Enter if app.active_tab == Tab::Activities => {
            app.ask_complete_selected_activity();
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l')
            if app.active_tab == Tab::Details =>
        {
            app.details_pane = match app.details_pane {
                DetailsPane::Links => DetailsPane::Participants,
                DetailsPane::Participants => DetailsPane::Links,
            };
        }
        KeyCode::Char('a') if app.active_tab == Tab::Details => match app.details_pane {
            DetailsPane::Links => app.new_link(),
            DetailsPane::Participants => app.open_modal(Modal::Invite),
        },
        KeyCode::Enter if app.active_tab == Tab::Details => match app.details_pane {
            DetailsPane::Links => app.edit_selected_link(),
            DetailsPane::Participants => app.ask_confirm_selected_participant(),
        },
        KeyCode::Char('d')
            if app.active_tab == Tab::Details && app.details_pane == DetailsPane::Links =>
        {
            app.link_draft.id = None;
            app.ask_delete_link();
        }
        _ => {}
    }
}

// ─── Forms ──────────────────────────────────────────────────────────────────

fn field_kind(app: &App) -> Option<Field> {
    let kind = match (&app.modal, app.focus) {
        (Modal::None, 0) => Field::Text,
        (Modal::None, 1) if app.draft.step == TripStep::TripDetails => {
            Field::Dates(CalendarPurpose::NewTripDates)
        }
        (Modal::None, 1) => Field::Text,
        (Modal::None, 2) => Field::Guests,
        (Modal::EditTrip, 0) => Field::Text,
        (Modal::EditTrip, 1) => Field::Dates(CalendarPurpose::EditTripDates),
        (Modal::NewActivity, 0) => Field::Text,
        (Modal::NewActivity, 1) => Field::Dates(CalendarPurpose::ActivityDay),
        (Modal::NewActivity, 2) => Field::Hour,
        (Modal::Link | Modal::Invite, 0 | 1) => Field::Text,
        _ => return None,
    };
    Some(kind)
}

fn field_count(app: &App) -> usize {
    match app.modal {
        Modal::None => app.new_trip_fields(),
        Modal::NewActivity => 3,
        _ => 2,
    }
}

fn text_mut(app: &mut App) -> Option<&mut String> {
    let step = app.draft.step;
    let text = match (app.modal.clone(), app.focus) {
        (Modal::None, 0) if step == TripStep::TripDetails => &mut app.draft.destination,
        (Modal::None, 0) => &mut app.guest_name,
        (Modal::None, 1) => &mut app.guest_email,
        (Modal::EditTrip, 0) => &mut app.trip_edit.destination,
        (Modal::NewActivity, 0) => &mut app.activity_draft.name,
        (Modal::Link, 0) => &mut app.link_draft.title,
        (Modal::Link, 1) => &mut app.link_draft.url,
        (Modal::Invite, 0) => &mut app.invite_name,
        (Modal::Invite, 1) => &mut app.invite_email,
        _ => return None,
    };
    Some(text)
}

fn submit_form(app: &mut App) {
    match app.modal {
        Modal::None => app.submit_new_trip(),
        Modal::EditTrip => app.submit_trip_edit(),
        Modal::NewActivity => app.submit_activity(),
        Modal::Link => app.submit_link(),
        Modal::Invite => app.submit_invite(),
        _ => {}
    }
}

fn close_form(app: &mut App) {
    match app.modal {
        Modal::None => app.running = false,
        Modal::Link => {
            app.link_draft = Default::default();
            app.modal = Modal::None;
        }
        Modal::EditTrip => {
            app.reset_trip_edit();
            app.modal = Modal::None;
        }
        _ => app.modal = Modal::None,
    }
}

fn handle_form_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let fields = field_count(app);
    match (code, modifiers) {
        (KeyCode::Esc, _) => return close_form(app),
        (KeyCode::Char('s'), KeyModifiers::CONTROL) => return submit_form(app),
        (KeyCode::Char('e'), KeyModifiers::CONTROL) if app.modal == Modal::None => {
            app.draft.back_to_details();
            app.focus = 0;
            return;
        }
        (KeyCode::Char('d'), KeyModifiers::CONTROL)
            if app.modal == Modal::Link && app.link_draft.id.is_some() =>
        {
            return app.ask_delete_link();
        }
        (KeyCode::Tab | KeyCode::Down, _) => {
            app.focus = (app.focus + 1) % fields;
            return;
        }
        (KeyCode::BackTab | KeyCode::Up, _) => {
            app.focus = (app.focus + fields - 1) % fields;
            return;
        }
        _ => {}
    }

    let Some(kind) = field_kind(app) else {
        app.focus = 0;
        return;
    };
    match (kind, code) {
        (Field::Dates(purpose), KeyCode::Enter | KeyCode::Char(' ')) => app.open_calendar(purpose),
        (Field::Guests, KeyCode::Enter) => app.modal = Modal::Guests,
        (Field::Text, KeyCode::Enter) => {
            let on_guest_email = app.modal == Modal::None
                && app.draft.step == TripStep::AddEmail
                && app.focus == 1;
            if on_guest_email {
                app.add_guest();
            } else if app.focus + 1 == fields {
                submit_form(app);
            } else {
                app.focus += 1;
            }
        }
        (Field::Hour, KeyCode::Enter) => submit_form(app),
        (Field::Hour, KeyCode::Char(c)) => {
            let text = format!("{}{c}", app.activity_draft.hour());
            app.activity_draft.set_hour(&text);
        }
        (Field::Hour, KeyCode::Backspace) => {
            let mut text = app.activity_draft.hour().to_string();
            text.pop();
            app.activity_draft.set_hour(&text);
        }
        (Field::Text, KeyCode::Char(c)) => {
            if let Some(text) = text_mut(app) {
                text.push(c);
            }
        }
        (Field::Text, KeyCode::Backspace) => {
            if let Some(text) = text_mut(app) {
                text.pop();
            }
        }
        _ => {}
    }
}

// ─── Popups ─────────────────────────────────────────────────────────────────

fn handle_calendar_key(app: &mut App, code: KeyCode, purpose: CalendarPurpose) {
    let Some(picker) = app.picker.as_mut() else {
        app.close_calendar(purpose);
        return;
    };
    match code {
        KeyCode::Left | KeyCode::Char('h') => picker.move_days(-1),
        KeyCode::Right | KeyCode::Char('l') => picker.move_days(1),
        KeyCode::Up | KeyCode::Char('k') => picker.move_days(-7),
        KeyCode::Down | KeyCode::Char('j') => picker.move_days(7),
        KeyCode::PageUp | KeyCode::Char('<') => picker.move_months(-1),
        KeyCode::PageDown | KeyCode::Char('>') => picker.move_months(1),
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.pick_day(purpose);
            let done = match purpose {
                CalendarPurpose::ActivityDay => true,
                _ => app.calendar_selection(purpose).is_complete(),
            };
            if done {
                app.close_calendar(purpose);
            }
        }
        KeyCode::Esc | KeyCode::Char('q') => app.close_calendar(purpose),
        _ => {}
    }
}

fn handle_guests_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Down | KeyCode::Char('j') => app.guest_list_state.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.guest_list_state.select_prev(),
        KeyCode::Delete | KeyCode::Backspace | KeyCode::Char('d') => app.remove_selected_guest(),
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => app.modal = Modal::None,
        _ => {}
    }
}

fn handle_confirm_key(app: &mut App, code: KeyCode, action: PendingAction) {
    match code {
        KeyCode::Char('y') | KeyCode::Char('s') | KeyCode::Enter => app.run_pending(action),
        KeyCode::Char('n') | KeyCode::Esc => app.modal = Modal::None,
        _ => {}
    }
}
