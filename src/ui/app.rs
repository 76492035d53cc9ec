use std::collections::HashSet;
use std::mem;

use anyhow::{anyhow, Result};
use crossterm::event::KeyCode;
use open::that as open_image;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::warn;

use crate::db::{create_blog, delete_blog, fetch_blogs, search_blogs};
use crate::models::BlogEntry;

use super::detail::{DetailOutcome, DetailScreen};
use super::forms::{BlogField, BlogForm, ConfirmDeleteSelected};
use super::helpers::{centered_rect, format_size, surface_error};
use super::picker::{
    capture_photo, command_available, media_dir, probe, GalleryState, GrantOutcome, ImagePreview,
    ImageSource, PermissionPrompt, PickSource, SourceChoice, CAPTURE_COMMAND,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height allocation per entry card in the list.
const BLOG_CARD_HEIGHT: u16 = 4;
/// Width of the attachment preview pane when an image is bound.
const PREVIEW_PANE_WIDTH: u16 = 34;
/// Characters of body text shown on a list card.
const BODY_PREVIEW_CHARS: usize = 64;

/// Fine-grained modes scoped to the single list screen. Each modal step of
/// the image flow is its own variant carrying its own typed state, so the
/// pending external operation is always explicit.
enum Mode {
    Normal,
    AddingBlog(BlogForm),
    Searching(SearchState),
    ConfirmDeleteSelected(ConfirmDeleteSelected),
    Detail(DetailScreen),
    PickerPermission(PermissionPrompt),
    PickerChoice(SourceChoice),
    PickerGallery(GalleryState),
}

/// The two states of the search/clear action control. Behavior dispatches on
/// this flag, never on a rendered label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionMode {
    Search,
    Clear,
}

/// State for the search input while the query is being typed.
#[derive(Default)]
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state: the storage handle, the rendered list, and the
/// transient selection/filter/preview state projected onto it.
pub struct App {
    conn: Connection,
    blogs: Vec<BlogEntry>,
    selected_ids: HashSet<i64>,
    cursor: usize,
    action_mode: ActionMode,
    filter: Option<String>,
    mode: Mode,
    status: Option<StatusMessage>,
    preview: Option<ImagePreview>,
}

impl App {
    pub fn new(conn: Connection, blogs: Vec<BlogEntry>) -> Self {
        Self {
            conn,
            blogs,
            selected_ids: HashSet::new(),
            cursor: 0,
            action_mode: ActionMode::Search,
            filter: None,
            mode: Mode::Normal,
            status: None,
            preview: None,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBlog(form) => self.handle_add_blog(code, form)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
            Mode::ConfirmDeleteSelected(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Detail(screen) => self.handle_detail(code, screen)?,
            Mode::PickerPermission(prompt) => self.handle_picker_permission(code, prompt)?,
            Mode::PickerChoice(choice) => self.handle_picker_choice(code, choice)?,
            Mode::PickerGallery(gallery) => self.handle_picker_gallery(code, gallery)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-5),
            KeyCode::PageDown => self.move_cursor(5),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.blogs.len().saturating_sub(1),
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingBlog(BlogForm::default()));
            }
            KeyCode::Enter => {
                if let Some(entry) = self.current_entry() {
                    let screen = DetailScreen::from_entry(entry);
                    self.clear_status();
                    return Ok(Mode::Detail(screen));
                } else {
                    self.set_status("No entry selected.", StatusKind::Error);
                }
            }
            KeyCode::Char(' ') => self.select_one_at_cursor(),
            KeyCode::Char('a') | KeyCode::Char('A') => self.select_all(),
            KeyCode::Char('-') => {
                let count = self.selection_count();
                if count == 0 {
                    self.set_status("No entries selected.", StatusKind::Error);
                } else {
                    self.clear_status();
                    return Ok(Mode::ConfirmDeleteSelected(ConfirmDeleteSelected { count }));
                }
            }
            KeyCode::Char('f') | KeyCode::Char('F') => match self.action_mode {
                ActionMode::Search => {
                    self.clear_status();
                    return Ok(Mode::Searching(SearchState::default()));
                }
                ActionMode::Clear => self.clear_search()?,
            },
            KeyCode::Char('u') | KeyCode::Char('U') => {
                self.clear_status();
                return self.request_upload();
            }
            KeyCode::Char('v') | KeyCode::Char('V') => {
                if let Some(preview) = &self.preview {
                    if let Err(err) = open_image(&preview.path) {
                        self.set_status(
                            format!("Failed to open image: {err}"),
                            StatusKind::Error,
                        );
                    }
                } else {
                    self.set_status("No image attached.", StatusKind::Error);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_blog(&mut self, code: KeyCode, mut form: BlogForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_blog(&form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingBlog(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Search cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                let query = state.query.clone();
                self.run_search(&query)?;
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    state.query.push(ch);
                }
            }
            _ => {}
        }
        Ok(Mode::Searching(state))
    }

    fn handle_confirm_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmDeleteSelected,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.delete_selected()?;
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDeleteSelected(confirm)),
        }
    }

    fn handle_detail(&mut self, code: KeyCode, mut screen: DetailScreen) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.close_detail(DetailOutcome::Closed)?;
                return Ok(Mode::Normal);
            }
            KeyCode::Up => screen.scroll_by(-1),
            KeyCode::Down => screen.scroll_by(1),
            KeyCode::PageUp => screen.scroll_by(-5),
            KeyCode::PageDown => screen.scroll_by(5),
            KeyCode::Char('o') | KeyCode::Char('O') => {
                if let Err(err) = screen.open_externally() {
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
            }
            _ => {}
        }
        Ok(Mode::Detail(screen))
    }

    fn handle_picker_permission(
        &mut self,
        code: KeyCode,
        prompt: PermissionPrompt,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.deny_permission();
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let dir = media_dir()?;
                match prompt.grant(&dir, command_available(CAPTURE_COMMAND)) {
                    GrantOutcome::Granted => Ok(Mode::PickerChoice(SourceChoice::new())),
                    GrantOutcome::Denied => {
                        self.deny_permission();
                        Ok(Mode::Normal)
                    }
                }
            }
            _ => Ok(Mode::PickerPermission(prompt)),
        }
    }

    fn handle_picker_choice(&mut self, code: KeyCode, mut choice: SourceChoice) -> Result<Mode> {
        match code {
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => choice.toggle(),
            KeyCode::Enter => {
                return match choice.selection {
                    PickSource::Camera => self.run_capture(),
                    PickSource::Gallery => self.open_gallery(),
                };
            }
            _ => {}
        }
        Ok(Mode::PickerChoice(choice))
    }

    fn handle_picker_gallery(&mut self, code: KeyCode, mut gallery: GalleryState) -> Result<Mode> {
        match code {
            // Backing out of the picker is not an error; the preview slot
            // just keeps whatever it had.
            KeyCode::Esc => return Ok(Mode::Normal),
            KeyCode::Up => gallery.move_selection(-1),
            KeyCode::Down => gallery.move_selection(1),
            KeyCode::PageUp => gallery.move_selection(-5),
            KeyCode::PageDown => gallery.move_selection(5),
            KeyCode::Enter => {
                if let Some(path) = gallery.current().cloned() {
                    self.bind_preview(path, ImageSource::Gallery);
                    return Ok(Mode::Normal);
                }
            }
            _ => {}
        }
        Ok(Mode::PickerGallery(gallery))
    }

    /// Entry point of the upload action: probe the two capability grants and
    /// either offer the camera/gallery choice directly or ask for permission.
    fn request_upload(&mut self) -> Result<Mode> {
        let dir = media_dir()?;
        let missing = probe(&dir, command_available(CAPTURE_COMMAND));
        if missing.is_empty() {
            Ok(Mode::PickerChoice(SourceChoice::new()))
        } else {
            Ok(Mode::PickerPermission(PermissionPrompt::new(missing)))
        }
    }

    fn deny_permission(&mut self) {
        warn!("media permission denied");
        self.set_status("Permission denied to access media storage.", StatusKind::Error);
    }

    fn run_capture(&mut self) -> Result<Mode> {
        let dir = media_dir()?;
        match capture_photo(&dir, CAPTURE_COMMAND) {
            Ok(Some(path)) => self.bind_preview(path, ImageSource::Camera),
            Ok(None) => {}
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
        Ok(Mode::Normal)
    }

    fn open_gallery(&mut self) -> Result<Mode> {
        let dir = media_dir()?;
        match GalleryState::load(&dir) {
            Ok(gallery) if gallery.entries.is_empty() => {
                self.set_status("No images in your pictures folder.", StatusKind::Error);
                Ok(Mode::Normal)
            }
            Ok(gallery) => Ok(Mode::PickerGallery(gallery)),
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                Ok(Mode::Normal)
            }
        }
    }

    fn bind_preview(&mut self, path: std::path::PathBuf, source: ImageSource) {
        match ImagePreview::bind(path, source) {
            Ok(preview) => {
                self.set_status(format!("Attached {}.", preview.file_name()), StatusKind::Info);
                self.preview = Some(preview);
            }
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn save_new_blog(&mut self, form: &BlogForm) -> Result<()> {
        let (name, body) = form.parse_inputs()?;
        match create_blog(&self.conn, &name, &body) {
            Ok(_) => {
                // A fresh add always returns the view to the unfiltered
                // list; the action control's mode flag stays put.
                self.reload_all()?;
                self.set_status("Blog added successfully", StatusKind::Info);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "insert failed");
                Err(anyhow!("Error adding blog"))
            }
        }
    }

    /// Replace the rendered list with the full table contents. Selection is
    /// transient display state and resets with the rebuild.
    fn reload_all(&mut self) -> Result<()> {
        self.blogs = fetch_blogs(&self.conn)?;
        self.selected_ids.clear();
        self.filter = None;
        if self.cursor >= self.blogs.len() {
            self.cursor = self.blogs.len().saturating_sub(1);
        }
        Ok(())
    }

    fn run_search(&mut self, query: &str) -> Result<()> {
        self.blogs = search_blogs(&self.conn, query)?;
        self.selected_ids.clear();
        self.cursor = 0;
        self.filter = Some(query.to_string());
        self.action_mode = ActionMode::Clear;
        self.set_status(
            format!("{} matching entries.", self.blogs.len()),
            StatusKind::Info,
        );
        Ok(())
    }

    fn clear_search(&mut self) -> Result<()> {
        self.blogs = fetch_blogs(&self.conn)?;
        self.selected_ids.clear();
        self.cursor = 0;
        self.filter = None;
        self.action_mode = ActionMode::Search;
        self.clear_status();
        Ok(())
    }

    /// Mark the entry under the cursor as selected. Selection only ever goes
    /// one way here; a rebuild of the list is the only thing that clears it.
    fn select_one_at_cursor(&mut self) {
        if let Some(entry) = self.current_entry() {
            let id = entry.id;
            self.selected_ids.insert(id);
        }
    }

    fn select_all(&mut self) {
        let ids: Vec<i64> = self.blogs.iter().map(|entry| entry.id).collect();
        self.selected_ids.extend(ids);
    }

    fn selection_count(&self) -> usize {
        self.blogs
            .iter()
            .filter(|entry| self.selected_ids.contains(&entry.id))
            .count()
    }

    /// Delete every rendered row whose id is selected, one statement per row,
    /// then rebuild the full unfiltered list. Row-level failures are counted
    /// and logged rather than aborting the batch.
    fn delete_selected(&mut self) -> Result<()> {
        let targets: Vec<i64> = self
            .blogs
            .iter()
            .map(|entry| entry.id)
            .filter(|id| self.selected_ids.contains(id))
            .collect();

        let mut deleted = 0usize;
        let mut failed = 0usize;
        for id in targets {
            match delete_blog(&self.conn, id) {
                Ok(()) => deleted += 1,
                Err(err) => {
                    failed += 1;
                    warn!(id, %err, "delete failed");
                }
            }
        }

        self.reload_all()?;

        let noun = if deleted == 1 { "blog" } else { "blogs" };
        if failed == 0 {
            self.set_status(format!("Deleted {deleted} {noun}."), StatusKind::Info);
        } else {
            self.set_status(
                format!("Deleted {deleted} {noun}, {failed} failed."),
                StatusKind::Error,
            );
        }
        Ok(())
    }

    /// Consume the detail collaborator's outcome: a save means the list may
    /// be stale and gets rebuilt unfiltered, a plain close changes nothing.
    fn close_detail(&mut self, outcome: DetailOutcome) -> Result<()> {
        if outcome == DetailOutcome::Saved {
            self.reload_all()?;
        }
        Ok(())
    }

    fn current_entry(&self) -> Option<&BlogEntry> {
        self.blogs.get(self.cursor)
    }

    fn move_cursor(&mut self, offset: isize) {
        if self.blogs.is_empty() {
            return;
        }
        let len = self.blogs.len() as isize;
        let next = (self.cursor as isize + offset).clamp(0, len - 1);
        self.cursor = next as usize;
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        let list_area = if self.preview.is_some() && content_area.width > PREVIEW_PANE_WIDTH * 2 {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(PREVIEW_PANE_WIDTH)])
                .split(content_area);
            self.draw_preview_pane(frame, chunks[1]);
            chunks[0]
        } else {
            content_area
        };

        self.draw_blog_list(frame, list_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBlog(form) => self.draw_blog_form(frame, area, form),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::ConfirmDeleteSelected(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Detail(screen) => self.draw_detail(frame, area, screen),
            Mode::PickerPermission(prompt) => self.draw_permission_prompt(frame, area, prompt),
            Mode::PickerChoice(choice) => self.draw_source_choice(frame, area, choice),
            Mode::PickerGallery(gallery) => self.draw_gallery(frame, area, gallery),
            Mode::Normal => {}
        }
    }

    fn draw_blog_list(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.filter {
            Some(query) => format!("Blogs — \"{query}\""),
            None => "Blogs".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        if self.blogs.is_empty() {
            let hint = if self.filter.is_some() {
                "No matching blogs."
            } else {
                "No blogs yet. Press + to add one."
            };
            let paragraph = Paragraph::new(hint)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(paragraph, inner);
            return;
        }

        let card_height = BLOG_CARD_HEIGHT as usize;
        let capacity = ((inner.height as usize) / card_height).max(1);
        let len = self.blogs.len();
        let mut start = if self.cursor >= capacity {
            self.cursor + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }

        for (offset, entry) in self.blogs.iter().skip(start).take(capacity).enumerate() {
            let index = start + offset;
            let card = Rect {
                x: inner.x,
                y: inner.y + (offset * card_height) as u16,
                width: inner.width,
                height: BLOG_CARD_HEIGHT.min(inner.height),
            };
            self.draw_blog_card(frame, card, entry, index == self.cursor);
        }
    }

    fn draw_blog_card(&self, frame: &mut Frame, area: Rect, entry: &BlogEntry, highlighted: bool) {
        let border_style = if highlighted {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let checkbox = if self.selected_ids.contains(&entry.id) {
            "[x] "
        } else {
            "[ ] "
        };
        let name_line = Line::from(vec![
            Span::styled(checkbox, Style::default().fg(Color::Cyan)),
            Span::styled(
                entry.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]);
        let body_line = Line::from(Span::styled(
            entry.body_preview(BODY_PREVIEW_CHARS),
            Style::default().fg(Color::Gray),
        ));

        let paragraph = Paragraph::new(vec![name_line, body_line]);
        frame.render_widget(paragraph, inner);
    }

    fn draw_preview_pane(&self, frame: &mut Frame, area: Rect) {
        let Some(preview) = &self.preview else {
            return;
        };
        let block = Block::default().title("Attached Image").borders(Borders::ALL);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let lines = vec![
            Line::from(Span::styled(
                preview.file_name(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Source: {}", preview.source.label())),
            Line::from(format!("Size: {}", format_size(preview.size_bytes))),
            Line::from(""),
            Line::from(Span::styled(
                "[v] View externally",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        // The search/clear control is one key whose effect follows the mode
        // flag; the label follows it too.
        let action_label = match self.action_mode {
            ActionMode::Search => " Search   ",
            ActionMode::Clear => " Clear   ",
        };
        Line::from(vec![
            Span::styled("[↑↓]", key_style),
            Span::raw(" Move   "),
            Span::styled("[Enter]", key_style),
            Span::raw(" Show   "),
            Span::styled("[+]", key_style),
            Span::raw(" Add   "),
            Span::styled("[Space]", key_style),
            Span::raw(" Select   "),
            Span::styled("[a]", key_style),
            Span::raw(" Select All   "),
            Span::styled("[-]", key_style),
            Span::raw(" Delete Selected   "),
            Span::styled("[f]", key_style),
            Span::raw(action_label),
            Span::styled("[u]", key_style),
            Span::raw(" Image   "),
            Span::styled("[q]", key_style),
            Span::raw(" Quit"),
        ])
    }

    fn draw_blog_form(&self, frame: &mut Frame, area: Rect, form: &BlogForm) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Blog").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let name_line = form.build_line("Name", BlogField::Name);
        let body_line = form.build_line("Body", BlogField::Body);

        let mut lines = vec![name_line, body_line, Line::from("")];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (cursor_x, cursor_y) = match form.active {
            BlogField::Name => {
                let prefix = "Name: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(BlogField::Name) as u16,
                    inner.y,
                )
            }
            BlogField::Body => {
                let prefix = "Body: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(BlogField::Body) as u16,
                    inner.y + 1,
                )
            }
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Name contains: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Name contains: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDeleteSelected) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Delete Selected")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let noun = if confirm.count == 1 { "entry" } else { "entries" };
        let lines = vec![
            Line::from(format!("Delete {} selected {noun}?", confirm.count)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, screen: &DetailScreen) {
        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Blog #{} — {}", screen.id, screen.name))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        let body = Paragraph::new(screen.body.clone())
            .wrap(Wrap { trim: false })
            .scroll((screen.scroll, 0));
        frame.render_widget(body, chunks[0]);

        let hint = Paragraph::new(Span::styled(
            "[↑↓] Scroll   [o] Open externally   [Esc] Close",
            Style::default().fg(Color::Gray),
        ));
        frame.render_widget(hint, chunks[1]);
    }

    fn draw_permission_prompt(&self, frame: &mut Frame, area: Rect, prompt: &PermissionPrompt) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Permission Required")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(prompt.describe()),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to grant or N / Esc to deny.",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_source_choice(&self, frame: &mut Frame, area: Rect, choice: &SourceChoice) {
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Select Image").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut option_spans = Vec::new();
        for (idx, label) in choice.labels().iter().enumerate() {
            if idx > 0 {
                option_spans.push(Span::raw("   "));
            }
            let style = if choice.selected_index() == idx {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            option_spans.push(Span::styled(*label, style));
        }

        let lines = vec![
            Line::from("Where should the image come from?"),
            Line::from(""),
            Line::from(option_spans),
            Line::from(""),
            Line::from(Span::styled(
                "Use ←/→ to choose • Enter to confirm • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_gallery(&self, frame: &mut Frame, area: Rect, gallery: &GalleryState) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Gallery").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let capacity = inner.height.saturating_sub(1) as usize;
        let mut start = if gallery.selected >= capacity && capacity > 0 {
            gallery.selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > gallery.entries.len() {
            start = gallery.entries.len().saturating_sub(capacity);
        }

        let mut lines = Vec::new();
        for (offset, path) in gallery.entries.iter().skip(start).take(capacity).enumerate() {
            let index = start + offset;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            if index == gallery.selected {
                lines.push(Line::from(Span::styled(
                    format!("> {name}"),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )));
            } else {
                lines.push(Line::from(format!("  {name}")));
            }
        }
        lines.push(Line::from(Span::styled(
            "[↑↓] Navigate   [Enter] Attach   [Esc] Cancel",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::ui::picker::Capability;

    fn test_app(seed: &[(&str, &str)]) -> App {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        for (name, body) in seed {
            create_blog(&conn, name, body).unwrap();
        }
        let blogs = fetch_blogs(&conn).unwrap();
        App::new(conn, blogs)
    }

    fn status_text(app: &App) -> String {
        app.status
            .as_ref()
            .map(|s| s.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn quit_key_exits() {
        let mut app = test_app(&[]);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn select_one_is_insertion_only() {
        let mut app = test_app(&[("Trip", "a"), ("Food", "b")]);
        let id = app.blogs[0].id;

        app.select_one_at_cursor();
        assert!(app.selected_ids.contains(&id));

        // Pressing select again must not toggle the flag back off.
        app.select_one_at_cursor();
        assert!(app.selected_ids.contains(&id));
        assert_eq!(app.selection_count(), 1);
    }

    #[test]
    fn select_all_marks_every_rendered_row() {
        let mut app = test_app(&[("a", "1"), ("b", "2"), ("c", "3")]);
        app.select_all();
        assert_eq!(app.selection_count(), 3);
    }

    #[test]
    fn selection_resets_when_the_list_is_rebuilt() {
        let mut app = test_app(&[("Trip", "a"), ("Food", "b")]);
        app.select_all();
        app.run_search("Tri").unwrap();
        assert!(app.selected_ids.is_empty());
    }

    #[test]
    fn search_filters_and_flips_the_action_mode() {
        let mut app = test_app(&[("Trip", "a"), ("Food", "b")]);
        app.run_search("Tri").unwrap();
        assert_eq!(app.blogs.len(), 1);
        assert_eq!(app.blogs[0].name, "Trip");
        assert_eq!(app.action_mode, ActionMode::Clear);
        assert_eq!(app.filter.as_deref(), Some("Tri"));
    }

    #[test]
    fn clear_search_restores_the_full_list_and_mode() {
        let mut app = test_app(&[("Trip", "a"), ("Food", "b")]);
        app.run_search("Tri").unwrap();
        app.clear_search().unwrap();
        assert_eq!(app.blogs.len(), 2);
        assert_eq!(app.action_mode, ActionMode::Search);
        assert!(app.filter.is_none());
    }

    #[test]
    fn add_drops_the_filter_but_not_the_mode_flag() {
        let mut app = test_app(&[("Trip", "a"), ("Food", "b")]);
        app.run_search("Tri").unwrap();

        let mut form = BlogForm::default();
        form.name = "Hike".to_string();
        form.body = "Up the hill".to_string();
        app.save_new_blog(&form).unwrap();

        // Back to the unfiltered list, but the control still reads Clear.
        assert_eq!(app.blogs.len(), 3);
        assert!(app.filter.is_none());
        assert_eq!(app.action_mode, ActionMode::Clear);
        assert_eq!(status_text(&app), "Blog added successfully");
    }

    #[test]
    fn invalid_add_changes_nothing() {
        let mut app = test_app(&[("Trip", "a")]);
        let mut form = BlogForm::default();
        form.name = "   ".to_string();
        form.body = "x".to_string();

        let err = app.save_new_blog(&form).unwrap_err();
        assert_eq!(err.to_string(), "Please enter both name and body");
        assert_eq!(app.blogs.len(), 1);
        assert_eq!(fetch_blogs(&app.conn).unwrap().len(), 1);
    }

    #[test]
    fn delete_selected_removes_exactly_the_flagged_rows() {
        let mut app = test_app(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4"), ("e", "5")]);
        let second = app.blogs[1].id;
        let fifth = app.blogs[4].id;
        app.selected_ids.insert(second);
        app.selected_ids.insert(fifth);

        app.delete_selected().unwrap();

        let names: Vec<&str> = app.blogs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
        assert!(app.selected_ids.is_empty());
        assert_eq!(status_text(&app), "Deleted 2 blogs.");
    }

    #[test]
    fn delete_selected_drops_an_active_filter_but_keeps_the_mode() {
        let mut app = test_app(&[("Trip", "a"), ("Trim", "b"), ("Food", "c")]);
        app.run_search("Tri").unwrap();
        app.select_all();
        app.delete_selected().unwrap();

        assert_eq!(app.blogs.len(), 1);
        assert_eq!(app.blogs[0].name, "Food");
        assert!(app.filter.is_none());
        assert_eq!(app.action_mode, ActionMode::Clear);
    }

    #[test]
    fn delete_selected_reports_rows_that_vanished() {
        let mut app = test_app(&[("Trip", "a"), ("Food", "b")]);
        let stale = app.blogs[0].id;
        app.selected_ids.insert(stale);
        delete_blog(&app.conn, stale).unwrap();

        app.delete_selected().unwrap();
        assert_eq!(status_text(&app), "Deleted 0 blogs, 1 failed.");
        assert_eq!(app.blogs.len(), 1);
    }

    #[test]
    fn detail_saved_outcome_triggers_a_refresh() {
        let mut app = test_app(&[("Trip", "a")]);
        app.run_search("zzz").unwrap();
        assert!(app.blogs.is_empty());

        app.close_detail(DetailOutcome::Saved).unwrap();
        assert_eq!(app.blogs.len(), 1);
        assert!(app.filter.is_none());
    }

    #[test]
    fn detail_closed_outcome_changes_nothing() {
        let mut app = test_app(&[("Trip", "a"), ("Food", "b")]);
        app.run_search("Tri").unwrap();
        let before: Vec<i64> = app.blogs.iter().map(|b| b.id).collect();

        app.close_detail(DetailOutcome::Closed).unwrap();
        let after: Vec<i64> = app.blogs.iter().map(|b| b.id).collect();
        assert_eq!(before, after);
        assert_eq!(app.filter.as_deref(), Some("Tri"));
    }

    #[test]
    fn enter_opens_the_detail_for_the_cursor_row() {
        let mut app = test_app(&[("Trip", "Went hiking")]);
        let mut exit = false;
        let mode = app.handle_normal_key(KeyCode::Enter, &mut exit).unwrap();
        match mode {
            Mode::Detail(screen) => {
                assert_eq!(screen.name, "Trip");
                assert_eq!(screen.body, "Went hiking");
            }
            _ => panic!("expected detail mode"),
        }
        assert!(!exit);
    }

    #[test]
    fn action_key_opens_search_only_in_search_mode() {
        let mut app = test_app(&[("Trip", "a")]);
        let mut exit = false;

        let mode = app
            .handle_normal_key(KeyCode::Char('f'), &mut exit)
            .unwrap();
        assert!(matches!(mode, Mode::Searching(_)));

        app.run_search("Tri").unwrap();
        let mode = app
            .handle_normal_key(KeyCode::Char('f'), &mut exit)
            .unwrap();
        assert!(matches!(mode, Mode::Normal));
        assert_eq!(app.action_mode, ActionMode::Search);
    }

    #[test]
    fn delete_key_requires_a_selection() {
        let mut app = test_app(&[("Trip", "a")]);
        let mut exit = false;
        let mode = app
            .handle_normal_key(KeyCode::Char('-'), &mut exit)
            .unwrap();
        assert!(matches!(mode, Mode::Normal));
        assert_eq!(status_text(&app), "No entries selected.");

        app.select_all();
        let mode = app
            .handle_normal_key(KeyCode::Char('-'), &mut exit)
            .unwrap();
        match mode {
            Mode::ConfirmDeleteSelected(confirm) => assert_eq!(confirm.count, 1),
            _ => panic!("expected confirm mode"),
        }
    }

    #[test]
    fn gallery_cancel_leaves_the_preview_untouched() {
        let mut app = test_app(&[]);
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("shot.jpg");
        std::fs::write(&image, b"jpeg").unwrap();
        app.preview = Some(ImagePreview::bind(image.clone(), ImageSource::Gallery).unwrap());

        let gallery = GalleryState {
            entries: vec![image.clone()],
            selected: 0,
        };
        let mode = app.handle_picker_gallery(KeyCode::Esc, gallery).unwrap();
        assert!(matches!(mode, Mode::Normal));
        assert_eq!(app.preview.as_ref().unwrap().path, image);
    }

    #[test]
    fn picking_a_gallery_image_replaces_the_preview() {
        let mut app = test_app(&[]);
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("new.png");
        std::fs::write(&image, b"png").unwrap();

        let gallery = GalleryState {
            entries: vec![image.clone()],
            selected: 0,
        };
        let mode = app.handle_picker_gallery(KeyCode::Enter, gallery).unwrap();
        assert!(matches!(mode, Mode::Normal));
        let preview = app.preview.as_ref().unwrap();
        assert_eq!(preview.path, image);
        assert_eq!(preview.source, ImageSource::Gallery);
    }

    #[test]
    fn permission_denial_returns_to_idle_with_a_message() {
        let mut app = test_app(&[]);
        let prompt = PermissionPrompt::new(vec![Capability::Camera]);
        let mode = app
            .handle_picker_permission(KeyCode::Char('n'), prompt)
            .unwrap();
        assert!(matches!(mode, Mode::Normal));
        assert_eq!(
            status_text(&app),
            "Permission denied to access media storage."
        );
    }
}
