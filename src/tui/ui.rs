use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{App, CalendarPurpose, DetailsPane, Modal, PendingAction, Screen, Tab};
use crate::planning::TripStep;

const ACCENT: Color = Color::LightGreen;
const HEADER_BG: Color = Color::DarkGray;
const SELECTED_BG: Color = Color::Rgb(40, 40, 60);
const FIELD_BG: Color = Color::Rgb(24, 24, 27);
const DIM: Color = Color::DarkGray;
const GOOD: Color = Color::Green;
const WARN: Color = Color::Yellow;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const WEEKDAY_HEADER: [&str; 7] = ["D", "S", "T", "Q", "Q", "S", "S"];

// ─── Main render ────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    match app.screen {
        Screen::NewTrip => render_new_trip(f, app, chunks[1]),
        Screen::Trip => match app.active_tab {
            Tab::Activities => render_activities(f, app, chunks[1]),
            Tab::Details => render_details(f, app, chunks[1]),
        },
    }

    render_status_bar(f, app, chunks[2]);
    render_modal(f, app);
}

// ─── Header ─────────────────────────────────────────────────────────────────

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .title(" plann.er ")
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));

    if app.screen == Screen::NewTrip {
        let tagline = Paragraph::new(Span::styled(
            "  Convide seus amigos e planeje sua próxima viagem!",
            Style::default().fg(DIM),
        ))
        .block(block);
        f.render_widget(tagline, area);
        return;
    }

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().fg(DIM)),
                Span::styled(format!("{} ", tab.title()), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let selected = Tab::ALL
        .iter()
        .position(|t| *t == app.active_tab)
        .unwrap_or(0);

    let tabs = Tabs::new(titles).block(block).select(selected).highlight_style(
        Style::default()
            .fg(ACCENT)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    );
    f.render_widget(tabs, area);

    let headline = format!(" {} ", app.headline);
    let width = (headline.width() as u16).min(area.width);
    let headline_area = Rect {
        x: area.right().saturating_sub(width),
        y: area.y,
        width,
        height: 1,
    };
    f.render_widget(
        Paragraph::new(headline).style(Style::default().fg(Color::White)),
        headline_area,
    );
}

// ─── Status Bar ─────────────────────────────────────────────────────────────

fn key_hints(app: &App) -> &'static str {
    match (&app.modal, app.screen, app.active_tab) {
        (Modal::Calendar(_), _, _) => "←→↑↓:dia  PgUp/PgDn:mês  Enter:selecionar  Esc:fechar",
        (Modal::Guests, _, _) => "j/k:nav  d:remover  Esc:fechar",
        (Modal::Confirm(_), _, _) => "s/Enter:confirmar  n/Esc:cancelar",
        (Modal::Link, _, _) => "Tab:campo  Enter:salvar  Ctrl+D:deletar  Esc:fechar",
        (Modal::None, Screen::NewTrip, _) => "Tab:campo  Enter:abrir/avançar  Ctrl+S:continuar  Ctrl+E:voltar  Esc:sair",
        (Modal::None, Screen::Trip, Tab::Activities) => "n:nova  Enter:concluir  e:editar  r:recarregar  Tab:aba  q:sair",
        (Modal::None, Screen::Trip, Tab::Details) => "h/l:painel  a:adicionar  Enter:editar/confirmar  d:deletar  q:sair",
        _ => "Tab:campo  Enter:avançar  Ctrl+S:salvar  Esc:fechar",
    }
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let spinner = if app.loading {
        format!("{} ", SPINNER[(app.frame_count / 2) as usize % SPINNER.len()])
    } else {
        String::new()
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(spinner, Style::default().fg(WARN)),
        Span::styled(
            &app.status_message,
            Style::default().fg(if app.loading { WARN } else { Color::White }),
        ),
        Span::styled(format!("  {}  ", key_hints(app)), Style::default().fg(DIM)),
    ]))
    .style(Style::default().bg(HEADER_BG));

    f.render_widget(status, area);
}

// ─── Forms ──────────────────────────────────────────────────────────────────

fn titled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(ACCENT))
}

/// Clip `text` from the left so its tail fits in `width` cells.
fn fit_tail(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut used = 0;
    let mut kept: Vec<char> = Vec::new();
    for c in text.chars().rev() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        kept.push(c);
    }
    kept.reverse();
    format!("…{}", kept.into_iter().collect::<String>())
}

/// Pad or cut `text` to exactly `width` cells.
fn fit_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(&" ".repeat(width - used));
    out
}

/// One labelled input row. `value` is shown dimmed as `placeholder` when empty.
fn field_line<'a>(
    label: &'a str,
    value: &str,
    placeholder: &'a str,
    focused: bool,
    width: u16,
) -> Line<'a> {
    let label_width = 14;
    let value_width = (width as usize).saturating_sub(label_width + 4);
    let marker = if focused { "> " } else { "  " };
    let bg = if focused { SELECTED_BG } else { FIELD_BG };

    let (text, fg) = if value.is_empty() {
        (placeholder.to_string(), DIM)
    } else if focused {
        (format!("{}▏", fit_tail(value, value_width.saturating_sub(1))), Color::White)
    } else {
        (value.to_string(), Color::White)
    };

    Line::from(vec![
        Span::styled(marker, Style::default().fg(ACCENT)),
        Span::styled(fit_width(label, label_width), Style::default().fg(DIM)),
        Span::styled(fit_width(&text, value_width), Style::default().fg(fg).bg(bg)),
    ])
}

fn render_new_trip(f: &mut Frame, app: &mut App, area: Rect) {
    let width = area.width.min(72);
    let form_area = centered_rect(width, 12, area);
    let inner_width = form_area.width.saturating_sub(2);
    let focus = |i: usize| app.modal == Modal::None && app.focus == i;

    let mut lines = Vec::new();
    match app.draft.step {
        TripStep::TripDetails => {
            lines.push(field_line(
                "Destino",
                &app.draft.destination,
                "Para onde?",
                focus(0),
                inner_width,
            ));
            lines.push(field_line("Quando", app.draft.dates.label(), "Quando?", focus(1), inner_width));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Ctrl+S  Continuar",
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            )));
        }
        TripStep::AddEmail => {
            let summary = format!(
                "{} · {}",
                app.draft.destination.trim(),
                app.draft.dates.label()
            );
            lines.push(Line::from(Span::styled(
                format!("  {summary}"),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            lines.push(field_line("Nome", &app.guest_name, "Seu nome completo", focus(0), inner_width));
            lines.push(field_line("E-mail", &app.guest_email, "E-mail do convidado", focus(1), inner_width));
            let guests = app.draft.guests.summary();
            lines.push(field_line(
                "Convidados",
                &guests,
                "Ninguém convidado ainda",
                focus(2),
                inner_width,
            ));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Ctrl+S  Confirmar viagem    Ctrl+E  Alterar local/data",
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            )));
        }
    }

    let form = Paragraph::new(lines).block(titled_block(" Nova viagem "));
    f.render_widget(form, form_area);
}

// ─── Activities ─────────────────────────────────────────────────────────────

fn render_activities(f: &mut Frame, app: &mut App, area: Rect) {
    let mut items: Vec<ListItem> = Vec::new();
    let mut flat_idx = 0usize;
    let mut selected_item_idx = 0usize;
    let name_width = (area.width as usize).saturating_sub(16);

    for section in &app.sections {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("── {} ──", section.title),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))));

        for item in &section.activities {
            let is_selected = flat_idx == app.activity_list_state.selected;
            if is_selected {
                selected_item_idx = items.len();
            }
            let bg = if is_selected { SELECTED_BG } else { Color::Reset };
            let marker = if is_selected { "> " } else { "  " };
            let (check, check_color) = if item.activity.completed {
                ("✓ ", GOOD)
            } else {
                ("○ ", DIM)
            };

            items.push(ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(ACCENT)),
                Span::styled(check, Style::default().fg(check_color).bg(bg)),
                Span::styled(
                    fit_width(&item.activity.name, name_width),
                    Style::default().fg(Color::White).bg(bg),
                ),
                Span::styled(format!(" {}", item.hour), Style::default().fg(DIM).bg(bg)),
            ])));
            flat_idx += 1;
        }
    }

    if items.is_empty() {
        let msg = if app.loading {
            "  Carregando atividades…"
        } else {
            "  Nenhuma atividade cadastrada. Tecle n para criar uma."
        };
        items.push(ListItem::new(msg));
    }

    let list = List::new(items).block(titled_block(" Atividades "));
    app.activity_list_state.inner.select(Some(selected_item_idx));
    f.render_stateful_widget(list, area, &mut app.activity_list_state.inner);
}

// ─── Details ────────────────────────────────────────────────────────────────

fn pane_block(title: String, active: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(if active { ACCENT } else { DIM }))
        .title_style(Style::default().fg(ACCENT))
}

fn render_details(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let links_active = app.details_pane == DetailsPane::Links;
    let link_items: Vec<ListItem> = if app.links.is_empty() {
        vec![ListItem::new("  Nenhum link adicionado.")]
    } else {
        app.links
            .iter()
            .enumerate()
            .map(|(i, link)| {
                let is_selected = links_active && i == app.link_list_state.selected;
                let marker = if is_selected { "> " } else { "  " };
                let bg = if is_selected { SELECTED_BG } else { Color::Reset };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, Style::default().fg(ACCENT)),
                        Span::styled(link.title.as_str(), Style::default().fg(Color::White).bg(bg)),
                    ]),
                    Line::from(Span::styled(format!("    {}", link.url), Style::default().fg(DIM))),
                ])
            })
            .collect()
    };
    let links = List::new(link_items).block(pane_block(
        format!(" Links importantes ({}) ", app.links.len()),
        links_active,
    ));
    app.link_list_state
        .inner
        .select(Some(app.link_list_state.selected));
    f.render_stateful_widget(links, chunks[0], &mut app.link_list_state.inner);

    let participants_active = !links_active;
    let participant_items: Vec<ListItem> = if app.participants.is_empty() {
        vec![ListItem::new("  Nenhum participante.")]
    } else {
        app.participants
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let is_selected = participants_active && i == app.participant_list_state.selected;
                let marker = if is_selected { "> " } else { "  " };
                let bg = if is_selected { SELECTED_BG } else { Color::Reset };
                let (status, status_color) = if p.is_confirmed {
                    ("✓ confirmado", GOOD)
                } else {
                    ("○ pendente", WARN)
                };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, Style::default().fg(ACCENT)),
                        Span::styled(
                            format!("Participante {}: {}", i + 1, p.display_name()),
                            Style::default().fg(Color::White).bg(bg),
                        ),
                        Span::styled(format!("  {status}"), Style::default().fg(status_color)),
                    ]),
                    Line::from(Span::styled(format!("    {}", p.email), Style::default().fg(DIM))),
                ])
            })
            .collect()
    };
    let participants = List::new(participant_items).block(pane_block(
        format!(" Convidados ({}) ", app.participants.len()),
        participants_active,
    ));
    app.participant_list_state
        .inner
        .select(Some(app.participant_list_state.selected));
    f.render_stateful_widget(participants, chunks[1], &mut app.participant_list_state.inner);
}

// ─── Popups ─────────────────────────────────────────────────────────────────

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}

fn render_modal(f: &mut Frame, app: &App) {
    match &app.modal {
        Modal::None => {}
        Modal::Calendar(purpose) => render_calendar(f, app, *purpose),
        Modal::Guests => render_guests(f, app),
        Modal::Confirm(action) => render_confirm(f, action),
        Modal::EditTrip => {
            let focus = |i| app.focus == i;
            render_form_popup(
                f,
                " Atualizar viagem ",
                |w| {
                    vec![
                        field_line("Destino", &app.trip_edit.destination, "Para onde?", focus(0), w),
                        field_line("Quando", app.trip_edit.dates.label(), "Quando?", focus(1), w),
                    ]
                },
            );
        }
        Modal::NewActivity => {
            let focus = |i| app.focus == i;
            let day = app
                .activity_draft
                .day
                .map(|d| format!("{} de {}", d.day(), d.month_name(app.locale)))
                .unwrap_or_default();
            render_form_popup(f, " Cadastrar atividade ", |w| {
                vec![
                    field_line("Atividade", &app.activity_draft.name, "Qual a atividade?", focus(0), w),
                    field_line("Data", &day, "Data", focus(1), w),
                    field_line("Horário", app.activity_draft.hour(), "Horário (0-23)", focus(2), w),
                ]
            });
        }
        Modal::Link => {
            let focus = |i| app.focus == i;
            let title = if app.link_draft.id.is_some() {
                " Editar link "
            } else {
                " Cadastrar link "
            };
            render_form_popup(f, title, |w| {
                vec![
                    field_line("Título", &app.link_draft.title, "Título do link", focus(0), w),
                    field_line("URL", &app.link_draft.url, "https://…", focus(1), w),
                ]
            });
        }
        Modal::Invite => {
            let focus = |i| app.focus == i;
            render_form_popup(f, " Convidar participante ", |w| {
                vec![
                    field_line("Nome", &app.invite_name, "Nome do convidado", focus(0), w),
                    field_line("E-mail", &app.invite_email, "E-mail do convidado", focus(1), w),
                ]
            });
        }
    }
}

fn render_form_popup<'a>(f: &mut Frame, title: &'a str, lines: impl FnOnce(u16) -> Vec<Line<'a>>) {
    let width = f.area().width.min(64);
    let mut content = lines(width.saturating_sub(2));
    let height = content.len() as u16 + 2;
    content.insert(0, Line::from(""));
    let area = centered_rect(width, height + 1, f.area());
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(content).block(titled_block(title)), area);
}

fn render_calendar(f: &mut Frame, app: &App, purpose: CalendarPurpose) {
    let Some(picker) = app.picker.as_ref() else {
        return;
    };
    let selection = app.calendar_selection(purpose);
    let weeks = picker.weeks();

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {}", picker.title(app.locale)),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(
            WEEKDAY_HEADER
                .iter()
                .map(|d| Span::styled(format!(" {d:>2} "), Style::default().fg(DIM)))
                .collect::<Vec<_>>(),
        ),
    ];

    for week in &weeks {
        let spans: Vec<Span> = week
            .iter()
            .map(|cell| match cell {
                None => Span::raw("    "),
                Some(day) => {
                    let mut style = Style::default().fg(Color::White);
                    if !picker.is_selectable(day) {
                        style = style.fg(DIM);
                    }
                    if selection.is_marked(day) {
                        style = style.bg(Color::Rgb(0, 90, 40)).fg(Color::White);
                    }
                    if *day == picker.cursor() {
                        style = style.bg(ACCENT).fg(Color::Black).add_modifier(Modifier::BOLD);
                    }
                    Span::styled(format!(" {:>2} ", day.day()), style)
                }
            })
            .collect();
        lines.push(Line::from(spans));
    }

    let label = match selection.label() {
        "" => "Selecione as datas".to_string(),
        label => label.to_string(),
    };
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(format!(" {label}"), Style::default().fg(ACCENT))));

    let title = match purpose {
        CalendarPurpose::ActivityDay => " Data da atividade ",
        _ => " Selecione as datas ",
    };
    let area = centered_rect(30, lines.len() as u16 + 2, f.area());
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(titled_block(title)), area);
}

fn render_guests(f: &mut Frame, app: &App) {
    let guests = app.draft.guests.guests();
    let mut lines: Vec<Line> = guests
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let is_selected = i == app.guest_list_state.selected;
            let style = if is_selected {
                Style::default().fg(Color::White).bg(SELECTED_BG)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::styled(if is_selected { "> " } else { "  " }, Style::default().fg(ACCENT)),
                Span::styled(g.name.as_str(), style),
                Span::styled(format!("  {}", g.email), Style::default().fg(DIM)),
            ])
        })
        .collect();
    if app.draft.guests.is_empty() {
        lines.push(Line::from(Span::styled("  Nenhum convidado.", Style::default().fg(DIM))));
    }

    let area = centered_rect(56, lines.len() as u16 + 2, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(titled_block(" Convidados ")),
        area,
    );
}

fn render_confirm(f: &mut Frame, action: &PendingAction) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(action.question(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(vec![
            Span::styled("[s] Sim", Style::default().fg(GOOD).add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled("[n] Não", Style::default().fg(DIM)),
        ]),
    ];
    let area = centered_rect(52, 8, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .alignment(ratatui::layout::Alignment::Center)
            .block(titled_block(action.title())),
        area,
    );
}
