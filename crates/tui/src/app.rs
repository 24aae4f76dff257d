use std::{cmp, io, path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lorekeeper_core::{
    models::MAX_RESOURCES, Card, CardId, DamageOutcome, HttpSource, MatchState, PlayerId,
    RepositoryEvent, SessionController, Startup,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::input::{CardForm, FormField, TextInput};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    success: Color,
    warning: Color,
    danger: Color,
    players: [Color; 2],
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            players: [Color::LightBlue, Color::LightMagenta],
        }
    }
}

impl Theme {
    fn player(&self, id: PlayerId) -> Color {
        self.players[id.index()]
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

enum Modal {
    AddCard(CardForm),
    Rename { player: PlayerId, input: TextInput },
    ImportPath(TextInput),
    Admin,
    ConfirmReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Active(CardId),
    Banished(CardId),
}

/// Terminal front-end for a two-player match.
pub struct LorekeeperApp {
    controller: SessionController<HttpSource>,
    repository_rx: Option<mpsc::Receiver<RepositoryEvent>>,
    theme: Theme,
    focus: PlayerId,
    cursors: [usize; 2],
    modal: Option<Modal>,
    status: String,
    should_quit: bool,
}

impl LorekeeperApp {
    pub fn new(
        controller: SessionController<HttpSource>,
        repository_rx: mpsc::Receiver<RepositoryEvent>,
    ) -> Self {
        Self {
            controller,
            repository_rx: Some(repository_rx),
            theme: Theme::default(),
            focus: PlayerId::One,
            cursors: [0; 2],
            modal: None,
            status: "Ready".to_string(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self, startup: Startup) -> Result<()> {
        self.set_status(match startup {
            Startup::Cached(count) => format!("{count} cards loaded from cache"),
            Startup::Recovered => "Card cache was unreadable and has been cleared".to_string(),
            Startup::Fetching => "Fetching the card list…".to_string(),
        });

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut repository_rx = self.repository_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            if let Some(rx) = repository_rx.as_mut() {
                let mut repository_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_repository = rx.recv() => {
                        match maybe_repository {
                            Some(event) => self.handle_repository_event(event),
                            None => repository_closed = true,
                        }
                    }
                }
                if repository_closed {
                    repository_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }
        }

        restore_terminal(&mut terminal)?;
        info!("Session closed");
        Ok(())
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn handle_repository_event(&mut self, event: RepositoryEvent) {
        match event {
            RepositoryEvent::Completed(report) => {
                info!(origin = %report.origin, count = report.count, "Repository updated");
                let at = report.completed_at.with_timezone(&Local).format("%H:%M:%S");
                self.set_status(format!(
                    "{} cards loaded from {} at {at}",
                    report.count, report.origin
                ));
            }
            RepositoryEvent::Failed { origin, error } => {
                error!(%origin, %error, "Repository update failed");
                self.set_status(format!("Loading cards from {origin} failed: {error}"));
            }
        }
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let Some(modal) = self.modal.take() {
            self.modal = self.handle_modal_key(modal, key);
        } else {
            self.handle_board_key(key);
        }
        self.clamp_cursors();
    }

    fn handle_board_key(&mut self, key: KeyEvent) {
        let state = self.controller.snapshot();
        let player = self.focus;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => self.focus = self.focus.other(),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('+') | KeyCode::Char('=') => self.controller.update_score(player, 1),
            KeyCode::Char('-') => self.controller.update_score(player, -1),
            KeyCode::Char(']') => self.controller.update_resource(player, 1),
            KeyCode::Char('[') => self.controller.update_resource(player, -1),
            KeyCode::Char('}') => self.controller.update_field_bonus(player, 1),
            KeyCode::Char('{') => self.controller.update_field_bonus(player, -1),
            KeyCode::Char('d') => self.damage_selected(&state, 1),
            KeyCode::Char('h') => self.damage_selected(&state, -1),
            KeyCode::Char(' ') => {
                if let Some(Slot::Active(card)) = self.selected_slot(&state) {
                    self.controller.toggle_card_active(player, card);
                }
            }
            KeyCode::Char('x') => {
                if let Some(Slot::Active(card)) = self.selected_slot(&state) {
                    if self.controller.remove_card(player, card) {
                        self.set_status(format!("Card {card} removed"));
                    }
                }
            }
            KeyCode::Char('r') => {
                if let Some(Slot::Banished(card)) = self.selected_slot(&state) {
                    if self.controller.revive_card(player, card) {
                        self.set_status(format!("Card {card} is back in play"));
                    }
                }
            }
            KeyCode::Char('c') => {
                if let Some(Slot::Banished(card)) = self.selected_slot(&state) {
                    if let Some(copy) = self.controller.duplicate_card(player, card) {
                        self.set_status(format!("Copied {card} as {copy}"));
                    }
                }
            }
            KeyCode::Char('a') => {
                self.controller.begin_card_entry(player);
                self.modal = Some(Modal::AddCard(CardForm::new(player)));
            }
            KeyCode::Char('n') => {
                self.controller.begin_rename(player);
                let input = TextInput::new(state.player(player).name(), player.default_name());
                self.modal = Some(Modal::Rename { player, input });
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                let change = self.controller.end_turn();
                let next = self.controller.snapshot();
                let mut message = format!(
                    "Turn {} · {} to play",
                    change.turn,
                    next.player(change.owner).name()
                );
                if change.bonus_applied > 0 {
                    message.push_str(&format!(" (+{} lore from the field)", change.bonus_applied));
                }
                self.set_status(message);
            }
            KeyCode::Char('t') => self
                .controller
                .set_victory_threshold(state.victory_threshold().saturating_add(1)),
            KeyCode::Char('T') => self
                .controller
                .set_victory_threshold(state.victory_threshold().saturating_sub(1).max(1)),
            KeyCode::Char('i') => {
                let shown = self.controller.toggle_resource_display();
                self.set_status(if shown { "Ink shown" } else { "Ink hidden" }.to_string());
            }
            KeyCode::Char('R') => self.modal = Some(Modal::ConfirmReset),
            KeyCode::Char('m') => self.modal = Some(Modal::Admin),
            _ => {}
        }
    }

    fn damage_selected(&mut self, state: &MatchState, delta: i32) {
        let Some(Slot::Active(card)) = self.selected_slot(state) else {
            return;
        };
        match self.controller.apply_damage(self.focus, card, delta) {
            DamageOutcome::Banished { damage } => {
                self.set_status(format!("Card {card} banished with {damage} damage"));
            }
            DamageOutcome::Unchanged if delta > 0 => {
                self.set_status("Exhausted cards cannot take damage".to_string());
            }
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, modal: Modal, key: KeyEvent) -> Option<Modal> {
        match modal {
            Modal::AddCard(form) => self.handle_card_form_key(form, key),
            Modal::Rename { player, mut input } => match key.code {
                KeyCode::Enter => {
                    self.controller.rename_player(player, input.raw());
                    None
                }
                KeyCode::Esc => {
                    self.controller.cancel_rename();
                    None
                }
                _ => {
                    edit_text(&mut input, key);
                    Some(Modal::Rename { player, input })
                }
            },
            Modal::ImportPath(mut input) => match key.code {
                KeyCode::Esc => Some(Modal::Admin),
                KeyCode::Enter => {
                    let path = input.value();
                    if path.is_empty() {
                        self.set_status("Enter the path of a card list".to_string());
                        return Some(Modal::ImportPath(input));
                    }
                    debug!(%path, "Importing repository file");
                    self.controller.import_repository_file(PathBuf::from(&path));
                    self.set_status(format!("Importing {path}…"));
                    None
                }
                _ => {
                    edit_text(&mut input, key);
                    Some(Modal::ImportPath(input))
                }
            },
            Modal::Admin => match key.code {
                KeyCode::Char('f') => {
                    self.controller.refresh_repository_from_remote();
                    self.set_status("Fetching the latest card list…".to_string());
                    None
                }
                KeyCode::Char('l') => Some(Modal::ImportPath(TextInput::empty())),
                KeyCode::Char('C') => {
                    match self.controller.clear_repository() {
                        Ok(()) => self.set_status("Card repository cleared".to_string()),
                        Err(err) => self.set_status(format!("Failed to clear repository: {err}")),
                    }
                    None
                }
                KeyCode::Esc | KeyCode::Char('m') | KeyCode::Char('q') => None,
                _ => Some(Modal::Admin),
            },
            Modal::ConfirmReset => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.controller.reset_match();
                    self.focus = PlayerId::One;
                    self.cursors = [0; 2];
                    self.set_status("New match started".to_string());
                    None
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => None,
                _ => Some(Modal::ConfirmReset),
            },
        }
    }

    fn handle_card_form_key(&mut self, mut form: CardForm, key: KeyEvent) -> Option<Modal> {
        let on_name = form.field == FormField::Name;
        match key.code {
            KeyCode::Esc => {
                self.controller.cancel_card_entry();
                self.set_status("Card entry cancelled".to_string());
                return None;
            }
            KeyCode::Tab => form.field = form.field.next(),
            KeyCode::BackTab => form.field = form.field.previous(),
            KeyCode::Enter => {
                if on_name && form.apply_highlighted() {
                    return Some(Modal::AddCard(form));
                }
                let draft = form.draft();
                return match self.controller.add_card(form.player, &draft) {
                    Some(card) => {
                        info!(player = %form.player, %card, name = %draft.name, "Card added");
                        self.set_status(format!("{} entered play", draft.name));
                        None
                    }
                    None => {
                        self.set_status("A card needs a name and at least 1 willpower".to_string());
                        Some(Modal::AddCard(form))
                    }
                };
            }
            KeyCode::Up if on_name => form.move_highlight(-1),
            KeyCode::Down if on_name => form.move_highlight(1),
            KeyCode::Up | KeyCode::Right if !on_name => form.adjust_current(1),
            KeyCode::Down | KeyCode::Left if !on_name => form.adjust_current(-1),
            KeyCode::Char('+') if !on_name => form.adjust_current(1),
            KeyCode::Char('-') if !on_name => form.adjust_current(-1),
            _ if on_name => {
                if edit_text(&mut form.name, key) {
                    let suggestions = self.controller.suggestions(form.name.raw());
                    form.set_suggestions(suggestions);
                }
            }
            _ => {}
        }
        Some(Modal::AddCard(form))
    }

    fn selected_slot(&self, state: &MatchState) -> Option<Slot> {
        let player = state.player(self.focus);
        let index = self.cursors[self.focus.index()];
        let active = player.cards();
        if index < active.len() {
            Some(Slot::Active(active[index].id()))
        } else {
            player
                .banished()
                .get(index - active.len())
                .map(|card| Slot::Banished(card.id()))
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let cursor = &mut self.cursors[self.focus.index()];
        *cursor = cursor.saturating_add_signed(delta);
    }

    fn clamp_cursors(&mut self) {
        let state = self.controller.snapshot();
        for id in PlayerId::ALL {
            let player = state.player(id);
            let total = player.cards().len() + player.banished().len();
            let cursor = &mut self.cursors[id.index()];
            *cursor = (*cursor).min(total.saturating_sub(1));
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let state = self.controller.snapshot();
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(4)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(37),
                Constraint::Percentage(26),
                Constraint::Percentage(37),
            ])
            .split(rows[0]);

        self.render_player(frame, columns[0], &state, PlayerId::One);
        self.render_controls(frame, columns[1], &state);
        self.render_player(frame, columns[2], &state, PlayerId::Two);
        self.render_status(frame, rows[1]);

        if let Some(modal) = &self.modal {
            self.render_modal(frame, modal, &state);
        }
    }

    fn render_player(&self, frame: &mut Frame, area: Rect, state: &MatchState, id: PlayerId) {
        let player = state.player(id);
        let color = self.theme.player(id);
        let focused = self.focus == id;
        let on_turn = state.turn_owner() == id && state.winner().is_none();
        let muted = Style::default().fg(self.theme.muted);

        let title = if on_turn {
            format!(" ▶ {} ", player.name())
        } else {
            format!(" {} ", player.name())
        };
        let border_style = if focused {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            muted
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));

        let mut lines = vec![Line::from(vec![
            Span::styled("Lore   ", muted),
            Span::styled(
                format!("{} / {}", player.score(), state.victory_threshold()),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            ),
        ])];
        if state.show_resources() {
            lines.push(Line::from(vec![
                Span::styled("Ink    ", muted),
                Span::styled(ink_gauge(player.resources()), Style::default().fg(self.theme.accent)),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("Field  ", muted),
            Span::raw(format!("+{} lore next turn", player.field_bonus())),
        ]));
        lines.push(Line::from(""));

        let cursor = self.cursors[id.index()];
        let mut selected_line = None;
        lines.push(section_header(
            format!("In play ({})", player.cards().len()),
            color,
        ));
        for (index, card) in player.cards().iter().enumerate() {
            let selected = focused && cursor == index;
            if selected {
                selected_line = Some(lines.len());
            }
            lines.push(self.card_line(card, selected, false));
        }
        if player.cards().is_empty() {
            lines.push(Line::from(Span::styled("  no cards", muted)));
        }

        lines.push(Line::from(""));
        lines.push(section_header(
            format!("Banished ({})", player.banished().len()),
            self.theme.danger,
        ));
        for (offset, card) in player.banished().iter().enumerate() {
            let selected = focused && cursor == player.cards().len() + offset;
            if selected {
                selected_line = Some(lines.len());
            }
            lines.push(self.card_line(card, selected, true));
        }

        let visible = area.height.saturating_sub(2) as usize;
        let scroll = match selected_line {
            Some(line) if visible > 0 && line >= visible => line + 1 - visible,
            _ => 0,
        };
        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((scroll as u16, 0));
        frame.render_widget(paragraph, area);
    }

    fn card_line(&self, card: &Card, selected: bool, banished: bool) -> Line<'static> {
        let pointer = if selected {
            Span::styled("▶ ", Style::default().fg(self.theme.accent))
        } else {
            Span::raw("  ")
        };
        let name_style = if banished {
            Style::default()
                .fg(self.theme.muted)
                .add_modifier(Modifier::CROSSED_OUT)
        } else if !card.is_active() {
            Style::default().fg(self.theme.muted)
        } else {
            Style::default().fg(self.theme.primary_fg)
        };

        let mut spans = vec![
            pointer,
            Span::styled(card.name().to_string(), name_style),
            Span::styled(
                format!("  {}/{}", card.strength(), card.willpower()),
                Style::default().fg(self.theme.muted),
            ),
        ];
        if card.damage() > 0 {
            spans.push(Span::styled(
                format!("  dmg {}", card.damage()),
                Style::default().fg(self.theme.danger),
            ));
        }
        if !banished && !card.is_active() {
            spans.push(Span::styled(
                "  exhausted",
                Style::default().fg(self.theme.warning),
            ));
        }
        Line::from(spans)
    }

    fn render_controls(&self, frame: &mut Frame, area: Rect, state: &MatchState) {
        let current = state.current_player();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(Span::styled(
                format!("Turn {}", state.turn()),
                bold.fg(self.theme.primary_fg),
            )),
            Line::from(vec![
                Span::raw("Playing: "),
                Span::styled(
                    current.name().to_string(),
                    bold.fg(self.theme.player(current.id())),
                ),
            ]),
            Line::from(""),
        ];

        if let Some(winner) = state.winner() {
            lines.push(Line::from(Span::styled(
                format!("★ {} wins! ★", winner.name()),
                bold.fg(self.theme.warning),
            )));
            lines.push(Line::from(""));
        }

        lines.push(Line::from(format!(
            "Lore to win: {}",
            state.victory_threshold()
        )));
        lines.push(Line::from(format!(
            "Card list: {} cards",
            self.controller.repository().len()
        )));
        lines.push(Line::from(""));

        let help = [
            ("Tab", "switch player"),
            ("Enter", "end turn"),
            ("+ / -", "lore"),
            ("] / [", "ink"),
            ("} / {", "field bonus"),
            ("j / k", "select card"),
            ("a", "add card"),
            ("d / h", "damage / heal"),
            ("space", "exhaust / ready"),
            ("x", "remove card"),
            ("r / c", "revive / copy"),
            ("n", "rename"),
            ("t / T", "lore to win"),
            ("i", "show / hide ink"),
            ("m", "card list admin"),
            ("R", "new match"),
            ("q", "quit"),
        ];
        for (keys, action) in help {
            lines.push(Line::from(vec![
                Span::styled(format!("{keys:>6} "), Style::default().fg(self.theme.accent)),
                Span::styled(action, Style::default().fg(self.theme.muted)),
            ]));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Match "))
            .alignment(Alignment::Left);
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let clock = Local::now().format("%H:%M");
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(
                format!("{clock} · {} focused", self.focus),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_modal(&self, frame: &mut Frame, modal: &Modal, state: &MatchState) {
        match modal {
            Modal::AddCard(form) => self.render_card_form(frame, form, state),
            Modal::Rename { player, input } => self.render_prompt(
                frame,
                &format!("Rename {}", state.player(*player).name()),
                "New name",
                input,
                Some(format!("Default: {}", input.default_value())),
            ),
            Modal::ImportPath(input) => self.render_prompt(
                frame,
                "Load card list",
                "Path to a JSON card list",
                input,
                None,
            ),
            Modal::Admin => {
                let lines = vec![
                    Line::from(format!(
                        "Card list: {} cards",
                        self.controller.repository().len()
                    )),
                    Line::from(""),
                    key_hint("f", "fetch the latest published list", self.theme.accent),
                    key_hint("l", "load a list from a file", self.theme.accent),
                    key_hint("C", "clear the card list", self.theme.danger),
                    key_hint("Esc", "close", self.theme.muted),
                ];
                self.render_dialog(frame, "Card list", lines, 48);
            }
            Modal::ConfirmReset => {
                let lines = vec![
                    Line::from("Start a new match? Scores and cards will be lost."),
                    Line::from(""),
                    key_hint("y", "new match", self.theme.success),
                    key_hint("n", "keep playing", self.theme.muted),
                ];
                self.render_dialog(frame, "New match", lines, 56);
            }
        }
    }

    fn render_dialog(&self, frame: &mut Frame, title: &str, lines: Vec<Line>, width: u16) {
        let area = centered_rect(width, lines.len() as u16 + 2, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_prompt(
        &self,
        frame: &mut Frame,
        title: &str,
        instruction: &str,
        input: &TextInput,
        note: Option<String>,
    ) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(60_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let area = centered_rect(width, 7, frame_area);
        frame.render_widget(Clear, area);

        let mut lines = vec![
            Line::from(instruction.to_string()),
            Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.accent)),
                Span::raw(input.raw().to_string()),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" confirm  "),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" cancel"),
            ]),
        ];
        if let Some(note) = note {
            lines.push(Line::from(note));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + input.cursor() as u16).min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + 2);
    }

    fn render_card_form(&self, frame: &mut Frame, form: &CardForm, state: &MatchState) {
        let field_style = |field: FormField| {
            if form.field == field {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            }
        };

        let mut lines = vec![Line::from(vec![
            Span::styled("Name       ", field_style(FormField::Name)),
            Span::raw(form.name.raw().to_string()),
        ])];
        for (index, card) in form.suggestions.iter().enumerate() {
            let highlighted = form.highlighted == Some(index);
            let pointer = if highlighted { "  ▶ " } else { "    " };
            let style = if highlighted {
                Style::default().fg(self.theme.accent)
            } else {
                Style::default().fg(self.theme.muted)
            };
            lines.push(Line::from(Span::styled(
                format!("{pointer}{} ({}/{})", card.full_name, card.strength, card.willpower),
                style,
            )));
        }
        lines.push(Line::from(vec![
            Span::styled("Strength   ", field_style(FormField::Strength)),
            Span::raw(form.strength.to_string()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Willpower  ", field_style(FormField::Willpower)),
            Span::raw(form.willpower.to_string()),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Tab field · ↑/↓ suggestion or value · Enter add · Esc cancel",
            Style::default().fg(self.theme.muted),
        )));

        let title = format!("Add card for {}", state.player(form.player).name());
        let frame_area = frame.size();
        let width = cmp::min(70_u16, frame_area.width.saturating_sub(4));
        let area = centered_rect(width, lines.len() as u16 + 2, frame_area);
        frame.render_widget(Clear, area);
        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);

        if form.field == FormField::Name {
            let cursor_x = (area.x + 12 + form.name.cursor() as u16)
                .min(area.x + area.width.saturating_sub(2));
            frame.set_cursor(cursor_x, area.y + 1);
        }
    }
}

/// Apply an editing key to a text field. Returns `true` when the text changed.
fn edit_text(input: &mut TextInput, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Left => input.move_cursor(-1),
        KeyCode::Right => input.move_cursor(1),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Backspace => {
            input.backspace();
            return true;
        }
        KeyCode::Delete => {
            input.delete();
            return true;
        }
        KeyCode::Char(ch) => {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                input.insert(ch);
                return true;
            }
        }
        _ => {}
    }
    false
}

fn ink_gauge(resources: u8) -> String {
    let filled = usize::from(resources);
    let empty = usize::from(MAX_RESOURCES).saturating_sub(filled);
    format!(
        "{}{} {resources}/{MAX_RESOURCES}",
        "●".repeat(filled),
        "○".repeat(empty)
    )
}

fn section_header(label: String, color: Color) -> Line<'static> {
    Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn key_hint(keys: &'static str, action: &'static str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{keys:>4}  "), Style::default().fg(color)),
        Span::raw(action),
    ])
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ink_gauge_shows_ten_slots() {
        assert_eq!(ink_gauge(3), "●●●○○○○○○○ 3/10");
        assert_eq!(ink_gauge(10), "●●●●●●●●●● 10/10");
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect(40, 4, area);
        assert_eq!(rect, Rect::new(0, 3, 20, 4));
    }
}
