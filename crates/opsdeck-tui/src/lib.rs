use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use opsdeck_app::{
    AppCommand, AppEvent, AppMode, AppSetting, AppState, DEFAULT_NOTICE_CAP, DashboardCounts,
    FieldKind, FormDraft, FormKind, FormPayload, FormSnapshot, NoticeBoard, NoticeKind,
    NoticePhase, Product, Report, RowAction, SettingKey, SettingValue, TabKind, Theme,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::env;
use std::io;
use std::time::{Duration, Instant};

const POLL_INTERVAL_MS: u64 = 120;
const THEME_FLASH_MS: u64 = 300;
const PANEL_FADE_IN_MS: u64 = 200;
const RESIZE_DEBOUNCE_MS: u64 = 250;
const ROW_FADE_MS: u64 = 300;
// Room for the four full tab labels plus padding and dividers.
const FULL_TABS_MIN_WIDTH: u16 = 52;

pub trait AppRuntime {
    fn load_dashboard_counts(&mut self) -> Result<DashboardCounts>;
    fn load_tab_snapshot(&mut self, tab: TabKind) -> Result<Option<TabSnapshot>>;
    fn submit_form(&mut self, payload: &FormPayload) -> Result<()>;
    fn delete_row(&mut self, tab: TabKind, row_id: i64) -> Result<()>;
    fn persist_theme(&mut self, theme: Theme) -> Result<()>;
    fn persist_fragment(&mut self, fragment: &str) -> Result<()>;
    fn persist_compact_tabs(&mut self, compact: bool) -> Result<()>;
    fn load_form_snapshot(&mut self, kind: FormKind) -> Result<Option<FormSnapshot>>;
    fn save_form_snapshot(&mut self, kind: FormKind, snapshot: &FormSnapshot) -> Result<()>;
    fn clear_form_snapshot(&mut self, kind: FormKind) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabSnapshot {
    Products(Vec<Product>),
    Reports(Vec<Report>),
    Settings(Vec<AppSetting>),
}

impl TabSnapshot {
    pub const fn tab_kind(&self) -> TabKind {
        match self {
            Self::Products(_) => TabKind::Products,
            Self::Reports(_) => TabKind::Reports,
            Self::Settings(_) => TabKind::Settings,
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::Products(rows) => rows.len(),
            Self::Reports(rows) => rows.len(),
            Self::Settings(rows) => rows.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub notice_cap: usize,
    pub compact_tabs_override: Option<bool>,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            notice_cap: DEFAULT_NOTICE_CAP,
            compact_tabs_override: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TableRowProjection {
    row_id: Option<i64>,
    label: String,
    cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct TableProjection {
    title: &'static str,
    columns: Vec<&'static str>,
    rows: Vec<TableRowProjection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct TableUiState {
    selected_row: usize,
    filter: String,
    filter_focused: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct FormUiState {
    draft: FormDraft,
    field_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct ConfirmDelete {
    tab: TabKind,
    row_id: i64,
    label: String,
}

#[derive(Debug, Clone, PartialEq)]
struct RowFade {
    tab: TabKind,
    row_id: i64,
    label: String,
    deadline_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    dashboard_counts: DashboardCounts,
    active_tab_snapshot: Option<TabSnapshot>,
    table_state: TableUiState,
    notices: NoticeBoard,
    form: Option<FormUiState>,
    confirm: Option<ConfirmDelete>,
    row_fade: Option<RowFade>,
    theme_flash_until: Option<u64>,
    panel_entered_at_ms: u64,
    pending_relayout_at_ms: Option<u64>,
    terminal_width: u16,
    compact_tabs: bool,
    compact_override: Option<bool>,
    help_visible: bool,
}

impl ViewData {
    fn new(options: UiOptions) -> Self {
        Self {
            dashboard_counts: DashboardCounts::default(),
            active_tab_snapshot: None,
            table_state: TableUiState::default(),
            notices: NoticeBoard::new(options.notice_cap),
            form: None,
            confirm: None,
            row_fade: None,
            theme_flash_until: None,
            panel_entered_at_ms: 0,
            pending_relayout_at_ms: None,
            terminal_width: 0,
            compact_tabs: options.compact_tabs_override.unwrap_or(false),
            compact_override: options.compact_tabs_override,
            help_visible: false,
        }
    }
}

/// Resolves the terminal's light/dark preference from `COLORFGBG`, when the
/// terminal advertises one.
pub fn detect_theme_preference() -> Option<Theme> {
    detect_theme_from_colorfgbg(env::var("COLORFGBG").ok().as_deref())
}

fn detect_theme_from_colorfgbg(raw: Option<&str>) -> Option<Theme> {
    let raw = raw?;
    let bg_part = raw.split(';').next_back()?;
    let bg: u8 = bg_part.trim().parse().ok()?;
    if bg == 7 || bg == 15 {
        Some(Theme::Light)
    } else {
        Some(Theme::Dark)
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let started = Instant::now();

    let size = terminal.size().context("query terminal size")?;
    view_data.terminal_width = size.width;
    view_data.compact_tabs = effective_compact_tabs(&view_data);

    if let Err(error) = refresh_view_data(state, runtime, &mut view_data) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let mut result = Ok(());
    loop {
        let now_ms = started.elapsed().as_millis() as u64;
        tick(state, runtime, &mut view_data, now_ms);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data, now_ms)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event =
            event::poll(Duration::from_millis(POLL_INTERVAL_MS)).context("poll event")?;
        if has_event {
            let now_ms = started.elapsed().as_millis() as u64;
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, key, now_ms) {
                        break;
                    }
                }
                Event::Resize(width, _) => {
                    view_data.terminal_width = width;
                    view_data.pending_relayout_at_ms = Some(now_ms + RESIZE_DEBOUNCE_MS);
                }
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn tick<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    now_ms: u64,
) {
    view_data.notices.tick(now_ms);

    if let Some(fade) = view_data.row_fade.clone()
        && now_ms >= fade.deadline_ms
    {
        view_data.row_fade = None;
        match runtime.delete_row(fade.tab, fade.row_id) {
            Ok(()) => {
                notify(
                    view_data,
                    format!("deleted {}", fade.label),
                    NoticeKind::Success,
                    now_ms,
                );
                if let Err(error) = refresh_view_data(state, runtime, view_data) {
                    state.dispatch(AppCommand::SetStatus(format!("reload failed: {error}")));
                }
            }
            Err(error) => {
                notify(
                    view_data,
                    format!("delete failed: {error}"),
                    NoticeKind::Error,
                    now_ms,
                );
            }
        }
    }

    if let Some(deadline) = view_data.pending_relayout_at_ms
        && now_ms >= deadline
    {
        view_data.pending_relayout_at_ms = None;
        view_data.compact_tabs = effective_compact_tabs(view_data);
    }

    if let Some(until) = view_data.theme_flash_until
        && now_ms >= until
    {
        view_data.theme_flash_until = None;
    }
}

fn effective_compact_tabs(view_data: &ViewData) -> bool {
    match view_data.compact_override {
        Some(forced) => forced,
        None => view_data.terminal_width < FULL_TABS_MIN_WIDTH,
    }
}

fn notify(view_data: &mut ViewData, message: impl Into<String>, kind: NoticeKind, now_ms: u64) {
    view_data.notices.post(message, kind, now_ms);
}

fn refresh_view_data<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    view_data.dashboard_counts = runtime.load_dashboard_counts()?;
    view_data.active_tab_snapshot = runtime.load_tab_snapshot(state.active_tab)?;
    clamp_selected_row(view_data);
    Ok(())
}

fn clamp_selected_row(view_data: &mut ViewData) {
    let visible = visible_row_count(view_data);
    if visible == 0 {
        view_data.table_state.selected_row = 0;
    } else if view_data.table_state.selected_row >= visible {
        view_data.table_state.selected_row = visible - 1;
    }
}

fn visible_row_count(view_data: &ViewData) -> usize {
    let Some(snapshot) = &view_data.active_tab_snapshot else {
        return 0;
    };
    let projection = projection_for_snapshot(snapshot);
    visible_row_indices(&projection, &view_data.table_state.filter).len()
}

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    command: AppCommand,
    now_ms: u64,
) {
    let events = state.dispatch(command);
    for event in events {
        match event {
            AppEvent::TabChanged(_) => {
                view_data.table_state = TableUiState::default();
                view_data.panel_entered_at_ms = now_ms;
                view_data.row_fade = None;
                view_data.confirm = None;
                if let Err(error) = refresh_view_data(state, runtime, view_data) {
                    state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
                }
            }
            AppEvent::FragmentChanged(fragment) => {
                if let Err(error) = runtime.persist_fragment(&fragment) {
                    state.dispatch(AppCommand::SetStatus(format!(
                        "fragment not saved: {error}"
                    )));
                }
            }
            AppEvent::ThemeChanged(theme) => {
                view_data.theme_flash_until = Some(now_ms + THEME_FLASH_MS);
                if let Err(error) = runtime.persist_theme(theme) {
                    state.dispatch(AppCommand::SetStatus(format!("theme not saved: {error}")));
                }
            }
            AppEvent::ModeChanged(_)
            | AppEvent::StatusUpdated(_)
            | AppEvent::StatusCleared => {}
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    key: KeyEvent,
    now_ms: u64,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if key.modifiers.contains(KeyModifiers::ALT) {
        if let KeyCode::Char(ch) = key.code {
            if let Some(digit) = ch.to_digit(10)
                && let Some(tab) = TabKind::from_position(digit as usize)
            {
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    AppCommand::ActivateTab(tab),
                    now_ms,
                );
                return false;
            }
            if ch == 't' {
                dispatch_and_refresh(state, runtime, view_data, AppCommand::ToggleTheme, now_ms);
                return false;
            }
        }
        return false;
    }

    if view_data.confirm.is_some() {
        handle_confirm_key(view_data, key, now_ms);
        return false;
    }

    if let AppMode::Form(_) = state.mode {
        handle_form_key(state, runtime, view_data, key, now_ms);
        return false;
    }

    if view_data.table_state.filter_focused {
        handle_filter_key(view_data, key);
        return false;
    }

    match key.code {
        KeyCode::Char('?') => {
            view_data.help_visible = true;
        }
        KeyCode::Char('f') => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::NextTab, now_ms);
        }
        KeyCode::Char('b') => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::PrevTab, now_ms);
        }
        KeyCode::Char('[') => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::NavigateBack, now_ms);
        }
        KeyCode::Char(']') => {
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::NavigateForward,
                now_ms,
            );
        }
        KeyCode::Char('j') | KeyCode::Down => move_row_cursor(view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => move_row_cursor(view_data, -1),
        KeyCode::Char('g') => jump_row_cursor(view_data, true),
        KeyCode::Char('G') => jump_row_cursor(view_data, false),
        KeyCode::Char('/') => {
            if view_data.active_tab_snapshot.is_some() {
                view_data.table_state.filter_focused = true;
            }
        }
        KeyCode::Char('a') => match state.active_tab {
            TabKind::Products => open_form(state, runtime, view_data, FormKind::Product, now_ms),
            TabKind::Reports => open_form(state, runtime, view_data, FormKind::Report, now_ms),
            _ => {
                state.dispatch(AppCommand::SetStatus("no form on this view".to_owned()));
            }
        },
        KeyCode::Char('e') => {
            apply_row_action(state, view_data, RowAction::Edit, now_ms);
        }
        KeyCode::Char('d') => {
            apply_row_action(state, view_data, RowAction::Delete, now_ms);
        }
        KeyCode::Enter => {
            if state.active_tab == TabKind::Settings {
                toggle_selected_setting(state, runtime, view_data, now_ms);
            }
        }
        _ => {}
    }
    false
}

fn handle_confirm_key(view_data: &mut ViewData, key: KeyEvent, now_ms: u64) {
    let Some(confirm) = view_data.confirm.clone() else {
        return;
    };
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            view_data.confirm = None;
            view_data.row_fade = Some(RowFade {
                tab: confirm.tab,
                row_id: confirm.row_id,
                label: confirm.label,
                deadline_ms: now_ms + ROW_FADE_MS,
            });
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            view_data.confirm = None;
        }
        _ => {}
    }
}

fn handle_filter_key(view_data: &mut ViewData, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            view_data.table_state.filter.clear();
            view_data.table_state.filter_focused = false;
            clamp_selected_row(view_data);
        }
        KeyCode::Enter => {
            view_data.table_state.filter_focused = false;
        }
        KeyCode::Backspace => {
            view_data.table_state.filter.pop();
            clamp_selected_row(view_data);
        }
        KeyCode::Char(ch) => {
            view_data.table_state.filter.push(ch);
            clamp_selected_row(view_data);
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    key: KeyEvent,
    now_ms: u64,
) {
    let Some(mut form) = view_data.form.take() else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };
    let kind = form.draft.kind();

    match key.code {
        KeyCode::Esc => {
            // Draft already persisted field by field; just close.
            view_data.form = None;
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ExitToNav, now_ms);
            return;
        }
        KeyCode::Tab | KeyCode::Down => {
            form.field_index = (form.field_index + 1) % form.draft.field_count();
        }
        KeyCode::BackTab | KeyCode::Up => {
            form.field_index = form
                .field_index
                .checked_sub(1)
                .unwrap_or(form.draft.field_count() - 1);
        }
        KeyCode::Enter => {
            match form.draft.to_payload() {
                Ok(payload) => match runtime.submit_form(&payload) {
                    Ok(()) => {
                        if let Err(error) = runtime.clear_form_snapshot(kind) {
                            state.dispatch(AppCommand::SetStatus(format!(
                                "draft not cleared: {error}"
                            )));
                        }
                        notify(view_data, "saved", NoticeKind::Success, now_ms);
                        view_data.form = None;
                        dispatch_and_refresh(
                            state,
                            runtime,
                            view_data,
                            AppCommand::ExitToNav,
                            now_ms,
                        );
                        return;
                    }
                    Err(error) => {
                        notify(
                            view_data,
                            format!("save failed: {error}"),
                            NoticeKind::Error,
                            now_ms,
                        );
                    }
                },
                Err(error) => {
                    notify(view_data, error.to_string(), NoticeKind::Error, now_ms);
                }
            }
        }
        KeyCode::Char(' ') => {
            if form.draft.toggle_flag(form.field_index) {
                save_draft(state, runtime, &form.draft);
            } else {
                form.draft.insert_char(form.field_index, ' ');
                save_draft(state, runtime, &form.draft);
            }
        }
        KeyCode::Char(ch) => {
            form.draft.insert_char(form.field_index, ch);
            save_draft(state, runtime, &form.draft);
        }
        KeyCode::Backspace => {
            form.draft.backspace(form.field_index);
            save_draft(state, runtime, &form.draft);
        }
        _ => {}
    }

    view_data.form = Some(form);
}

fn save_draft<R: AppRuntime>(state: &mut AppState, runtime: &mut R, draft: &FormDraft) {
    if let Err(error) = runtime.save_form_snapshot(draft.kind(), &draft.snapshot()) {
        state.dispatch(AppCommand::SetStatus(format!("draft not saved: {error}")));
    }
}

fn open_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    kind: FormKind,
    now_ms: u64,
) {
    let mut draft = FormDraft::blank(kind);
    match runtime.load_form_snapshot(kind) {
        Ok(Some(snapshot)) => {
            draft.restore(&snapshot);
            state.dispatch(AppCommand::SetStatus("draft restored".to_owned()));
        }
        Ok(None) => {}
        Err(error) => {
            notify(view_data, error.to_string(), NoticeKind::Error, now_ms);
        }
    }
    view_data.form = Some(FormUiState {
        draft,
        field_index: 0,
    });
    dispatch_and_refresh(state, runtime, view_data, AppCommand::OpenForm(kind), now_ms);
}

fn apply_row_action(
    state: &mut AppState,
    view_data: &mut ViewData,
    action: RowAction,
    now_ms: u64,
) {
    if !matches!(state.active_tab, TabKind::Products | TabKind::Reports) {
        state.dispatch(AppCommand::SetStatus("no row actions here".to_owned()));
        return;
    }
    let Some((row_id, label)) = selected_row_metadata(view_data) else {
        state.dispatch(AppCommand::SetStatus("no row selected".to_owned()));
        return;
    };
    match action {
        RowAction::Edit => {
            notify(
                view_data,
                format!("edit for {label} is not wired up yet"),
                NoticeKind::Info,
                now_ms,
            );
        }
        RowAction::Delete => {
            view_data.confirm = Some(ConfirmDelete {
                tab: state.active_tab,
                row_id,
                label,
            });
        }
    }
}

fn selected_row_metadata(view_data: &ViewData) -> Option<(i64, String)> {
    let snapshot = view_data.active_tab_snapshot.as_ref()?;
    let projection = projection_for_snapshot(snapshot);
    let visible = visible_row_indices(&projection, &view_data.table_state.filter);
    let row_index = *visible.get(view_data.table_state.selected_row)?;
    let row = &projection.rows[row_index];
    row.row_id.map(|id| (id, row.label.clone()))
}

fn toggle_selected_setting<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    now_ms: u64,
) {
    let Some(TabSnapshot::Settings(settings)) = &view_data.active_tab_snapshot else {
        return;
    };
    let Some(setting) = settings.get(view_data.table_state.selected_row).cloned() else {
        return;
    };
    match (setting.key, setting.value) {
        (SettingKey::UiTheme, _) => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::ToggleTheme, now_ms);
            if let Err(error) = refresh_view_data(state, runtime, view_data) {
                state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
            }
        }
        (SettingKey::UiCompactTabs, SettingValue::Bool(current)) => {
            let next = !current;
            match runtime.persist_compact_tabs(next) {
                Ok(()) => {
                    view_data.compact_override = Some(next);
                    view_data.compact_tabs = next;
                    state.dispatch(AppCommand::SetStatus(
                        if next {
                            "compact tabs on"
                        } else {
                            "compact tabs off"
                        }
                        .to_owned(),
                    ));
                    if let Err(error) = refresh_view_data(state, runtime, view_data) {
                        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
                    }
                }
                Err(error) => {
                    notify(
                        view_data,
                        format!("setting not saved: {error}"),
                        NoticeKind::Error,
                        now_ms,
                    );
                }
            }
        }
        _ => {
            state.dispatch(AppCommand::SetStatus("read-only setting".to_owned()));
        }
    }
}

fn move_row_cursor(view_data: &mut ViewData, delta: isize) {
    let visible = visible_row_count(view_data);
    if visible == 0 {
        return;
    }
    let current = view_data.table_state.selected_row as isize;
    let next = (current + delta).clamp(0, visible as isize - 1);
    view_data.table_state.selected_row = next as usize;
}

fn jump_row_cursor(view_data: &mut ViewData, first: bool) {
    let visible = visible_row_count(view_data);
    if visible == 0 {
        return;
    }
    view_data.table_state.selected_row = if first { 0 } else { visible - 1 };
}

fn projection_for_snapshot(snapshot: &TabSnapshot) -> TableProjection {
    match snapshot {
        TabSnapshot::Products(products) => TableProjection {
            title: "products",
            columns: vec!["name", "sku", "category", "price", "stock", "active"],
            rows: products
                .iter()
                .map(|product| TableRowProjection {
                    row_id: Some(product.id.get()),
                    label: product.name.clone(),
                    cells: vec![
                        product.name.clone(),
                        product.sku.clone(),
                        product.category_id.get().to_string(),
                        product.price_cents.map(format_money).unwrap_or_default(),
                        product.stock.to_string(),
                        if product.active { "yes" } else { "no" }.to_owned(),
                    ],
                })
                .collect(),
        },
        TabSnapshot::Reports(reports) => TableProjection {
            title: "reports",
            columns: vec!["title", "period", "status", "generated"],
            rows: reports
                .iter()
                .map(|report| TableRowProjection {
                    row_id: Some(report.id.get()),
                    label: report.title.clone(),
                    cells: vec![
                        report.title.clone(),
                        report.period.clone(),
                        report.status.as_str().to_owned(),
                        report
                            .generated_at
                            .map(|date| date.to_string())
                            .unwrap_or_default(),
                    ],
                })
                .collect(),
        },
        TabSnapshot::Settings(settings) => TableProjection {
            title: "settings",
            columns: vec!["setting", "value"],
            rows: settings
                .iter()
                .map(|setting| TableRowProjection {
                    row_id: None,
                    label: setting.key.label().to_owned(),
                    cells: vec![setting.key.label().to_owned(), setting.value.display()],
                })
                .collect(),
        },
    }
}

fn row_matches_filter(row: &TableRowProjection, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    row.cells
        .iter()
        .any(|cell| cell.to_lowercase().contains(&needle))
}

fn visible_row_indices(projection: &TableProjection, query: &str) -> Vec<usize> {
    projection
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row_matches_filter(row, query))
        .map(|(index, _)| index)
        .collect()
}

fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    text: Color,
    muted: Color,
    accent: Color,
    success: Color,
    warning: Color,
    error: Color,
    info: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            text: Color::Black,
            muted: Color::DarkGray,
            accent: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
        },
        Theme::Dark => Palette {
            text: Color::White,
            muted: Color::Gray,
            accent: Color::Cyan,
            success: Color::LightGreen,
            warning: Color::LightYellow,
            error: Color::LightRed,
            info: Color::LightCyan,
        },
    }
}

fn notice_color(palette: Palette, kind: NoticeKind) -> Color {
    match kind {
        NoticeKind::Info => palette.info,
        NoticeKind::Success => palette.success,
        NoticeKind::Warning => palette.warning,
        NoticeKind::Error => palette.error,
    }
}

fn tab_title(tab: TabKind, compact: bool) -> String {
    if compact {
        format!(" {} ", tab.short_label())
    } else {
        format!(" {} ", tab.label())
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData, now_ms: u64) {
    let colors = palette(state.theme);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = TabKind::ALL
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let tab_titles = TabKind::ALL
        .iter()
        .map(|tab| tab_title(*tab, view_data.compact_tabs))
        .collect::<Vec<String>>();

    let flash_active = view_data
        .theme_flash_until
        .is_some_and(|until| now_ms < until);
    let tab_border = if flash_active {
        Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors.text)
    };
    let tabs = Tabs::new(tab_titles)
        .block(
            Block::default()
                .title("opsdeck")
                .borders(Borders::ALL)
                .border_style(tab_border),
        )
        .style(Style::default().fg(colors.text))
        .highlight_style(
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    render_panel(frame, layout[1], state, view_data, colors, now_ms);

    let status = status_text(state);
    let status_widget = Paragraph::new(status)
        .style(Style::default().fg(colors.warning))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(confirm) = &view_data.confirm {
        let area = centered_rect(50, 22, frame.area());
        frame.render_widget(Clear, area);
        let body = format!("delete {}?\n\ny confirm | n cancel", confirm.label);
        let dialog = Paragraph::new(body).block(
            Block::default()
                .title("confirm")
                .borders(Borders::ALL)
                .style(Style::default().fg(colors.error)),
        );
        frame.render_widget(dialog, area);
    }

    if let Some(form) = &view_data.form {
        let area = centered_rect(60, 62, frame.area());
        frame.render_widget(Clear, area);
        let title = match form.draft.kind() {
            FormKind::Product => "new product",
            FormKind::Report => "new report",
        };
        let body = Paragraph::new(render_form_text(form)).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(colors.text)),
        );
        frame.render_widget(body, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 68, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_panel(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
    colors: Palette,
    now_ms: u64,
) {
    let entering = now_ms < view_data.panel_entered_at_ms + PANEL_FADE_IN_MS;
    let notice_lines = view_data.notices.len() as u16;
    let (notice_area, body_area) = if notice_lines > 0 {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(notice_lines), Constraint::Min(1)])
            .split(area);
        (Some(split[0]), split[1])
    } else {
        (None, area)
    };

    if let Some(notice_area) = notice_area {
        let lines: Vec<ratatui::text::Line<'_>> = view_data
            .notices
            .iter()
            .map(|notice| {
                let mut style = Style::default().fg(notice_color(colors, notice.kind));
                if notice.phase == NoticePhase::FadingOut {
                    style = style.add_modifier(Modifier::DIM);
                }
                ratatui::text::Line::styled(
                    format!("[{}] {}", notice.kind.as_str(), notice.message),
                    style,
                )
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), notice_area);
    }

    let mut body_style = Style::default().fg(colors.text);
    if entering {
        body_style = body_style.add_modifier(Modifier::DIM);
    }

    if state.active_tab == TabKind::Dashboard {
        let body = Paragraph::new(render_dashboard_text(&view_data.dashboard_counts))
            .style(body_style)
            .block(Block::default().borders(Borders::ALL).title("dashboard"));
        frame.render_widget(body, body_area);
        return;
    }

    let Some(snapshot) = &view_data.active_tab_snapshot else {
        let body = Paragraph::new("no data")
            .style(body_style)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(body, body_area);
        return;
    };

    let projection = projection_for_snapshot(snapshot);
    let visible = visible_row_indices(&projection, &view_data.table_state.filter);
    let selected = view_data
        .table_state
        .selected_row
        .min(visible.len().saturating_sub(1));

    let header = Row::new(
        projection
            .columns
            .iter()
            .map(|column| Cell::from(*column))
            .collect::<Vec<Cell>>(),
    )
    .style(
        Style::default()
            .fg(colors.muted)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = visible
        .iter()
        .enumerate()
        .map(|(position, row_index)| {
            let row = &projection.rows[*row_index];
            let mut style = body_style;
            if view_data
                .row_fade
                .as_ref()
                .is_some_and(|fade| Some(fade.row_id) == row.row_id)
            {
                style = style.add_modifier(Modifier::DIM);
            }
            if position == selected && !visible.is_empty() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Row::new(row.cells.iter().cloned().map(Cell::from).collect::<Vec<Cell>>())
                .style(style)
        })
        .collect();

    let widths = projection
        .columns
        .iter()
        .map(|_| Constraint::Ratio(1, projection.columns.len() as u32))
        .collect::<Vec<Constraint>>();

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(table_block_title(&projection, view_data, visible.len())),
    );
    frame.render_widget(table, body_area);
}

fn table_block_title(
    projection: &TableProjection,
    view_data: &ViewData,
    visible: usize,
) -> String {
    let filter = &view_data.table_state.filter;
    if view_data.table_state.filter_focused {
        format!(
            "{} [{visible}/{}] /{}_",
            projection.title,
            projection.rows.len(),
            filter
        )
    } else if !filter.is_empty() {
        format!(
            "{} [{visible}/{}] /{}",
            projection.title,
            projection.rows.len(),
            filter
        )
    } else {
        format!("{} [{}]", projection.title, projection.rows.len())
    }
}

fn render_dashboard_text(counts: &DashboardCounts) -> String {
    [
        format!("products: {}", counts.products_total),
        format!("low stock: {}", counts.products_low_stock),
        format!("pending reports: {}", counts.reports_pending),
        String::new(),
        "sales overview (sample)".to_owned(),
        "mon  ▇▇▇▇▇▇▇▇▇▇▇▇ 24".to_owned(),
        "tue  ▇▇▇▇▇▇▇▇ 16".to_owned(),
        "wed  ▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇ 30".to_owned(),
        "thu  ▇▇▇▇▇▇ 12".to_owned(),
        "fri  ▇▇▇▇▇▇▇▇▇▇ 20".to_owned(),
    ]
    .join("\n")
}

fn render_form_text(form: &FormUiState) -> String {
    let mut lines = Vec::with_capacity(form.draft.field_count() + 2);
    for (index, field) in form.draft.fields().iter().enumerate() {
        let marker = if index == form.field_index { "> " } else { "  " };
        let value = match field.spec.kind {
            FieldKind::Text => field.text.clone(),
            FieldKind::Flag => if field.flag { "[x]" } else { "[ ]" }.to_owned(),
        };
        lines.push(format!("{marker}{}: {value}", field.spec.label));
    }
    lines.push(String::new());
    lines.push("tab/shift-tab move | space toggle | enter save | esc close".to_owned());
    lines.join("\n")
}

fn status_text(state: &AppState) -> String {
    let status = state.status_line.clone().unwrap_or_default();
    let fragment = format!("#{}", state.active_tab.fragment());
    if status.is_empty() {
        format!("{fragment} | ? help")
    } else {
        format!("{fragment} | {status}")
    }
}

fn help_overlay_text() -> &'static str {
    "alt+1..4 switch view | alt+t theme\n\
     f/b next/prev view | [/] back/forward\n\
     j/k move | g/G top/bottom | / filter\n\
     a add | e edit | d delete | enter toggle setting\n\
     esc close overlays | ctrl+q quit"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::{
        ConfirmDelete, RowFade, TabSnapshot, TableProjection, TableRowProjection, TableUiState,
        UiOptions, ViewData, apply_row_action, clamp_selected_row, detect_theme_from_colorfgbg,
        dispatch_and_refresh, handle_confirm_key, handle_filter_key, handle_key_event, palette,
        projection_for_snapshot, row_matches_filter, tick, visible_row_indices,
    };
    use crate::AppRuntime;
    use anyhow::Result;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use opsdeck_app::{
        AppCommand, AppSetting, AppState, CategoryId, DashboardCounts, FormKind, FormPayload,
        FormSnapshot, NoticeKind, Product, ProductId, RowAction, SettingKey, SettingValue,
        TabKind, Theme,
    };
    use time::OffsetDateTime;

    #[derive(Default)]
    struct FakeRuntime {
        products: Vec<Product>,
        deleted: Vec<(TabKind, i64)>,
        themes: Vec<Theme>,
        fragments: Vec<String>,
        saved_snapshots: Vec<(FormKind, FormSnapshot)>,
        stored_snapshot: Option<FormSnapshot>,
        submitted: Vec<FormPayload>,
    }

    impl AppRuntime for FakeRuntime {
        fn load_dashboard_counts(&mut self) -> Result<DashboardCounts> {
            Ok(DashboardCounts::default())
        }

        fn load_tab_snapshot(&mut self, tab: TabKind) -> Result<Option<TabSnapshot>> {
            Ok(match tab {
                TabKind::Products => Some(TabSnapshot::Products(self.products.clone())),
                TabKind::Reports => Some(TabSnapshot::Reports(Vec::new())),
                TabKind::Settings => Some(TabSnapshot::Settings(vec![AppSetting {
                    key: SettingKey::UiCompactTabs,
                    value: SettingValue::Bool(false),
                }])),
                TabKind::Dashboard => None,
            })
        }

        fn submit_form(&mut self, payload: &FormPayload) -> Result<()> {
            self.submitted.push(payload.clone());
            Ok(())
        }

        fn delete_row(&mut self, tab: TabKind, row_id: i64) -> Result<()> {
            self.deleted.push((tab, row_id));
            self.products.retain(|product| product.id.get() != row_id);
            Ok(())
        }

        fn persist_theme(&mut self, theme: Theme) -> Result<()> {
            self.themes.push(theme);
            Ok(())
        }

        fn persist_fragment(&mut self, fragment: &str) -> Result<()> {
            self.fragments.push(fragment.to_owned());
            Ok(())
        }

        fn persist_compact_tabs(&mut self, _compact: bool) -> Result<()> {
            Ok(())
        }

        fn load_form_snapshot(&mut self, _kind: FormKind) -> Result<Option<FormSnapshot>> {
            Ok(self.stored_snapshot.clone())
        }

        fn save_form_snapshot(&mut self, kind: FormKind, snapshot: &FormSnapshot) -> Result<()> {
            self.saved_snapshots.push((kind, snapshot.clone()));
            Ok(())
        }

        fn clear_form_snapshot(&mut self, _kind: FormKind) -> Result<()> {
            self.stored_snapshot = None;
            Ok(())
        }
    }

    fn fixture_time() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH
    }

    fn product(id: i64, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            sku: format!("SKU-{id:03}"),
            category_id: CategoryId::new(1),
            price_cents: Some(1_000),
            stock: 10,
            active: true,
            notes: String::new(),
            created_at: fixture_time(),
            updated_at: fixture_time(),
            deleted_at: None,
        }
    }

    fn fruit_projection() -> TableProjection {
        projection_for_snapshot(&TabSnapshot::Products(vec![
            product(1, "Apple"),
            product(2, "Banana"),
            product(3, "Cherry"),
        ]))
    }

    fn view_with_products(names: &[(i64, &str)]) -> (ViewData, FakeRuntime) {
        let runtime = FakeRuntime {
            products: names.iter().map(|(id, name)| product(*id, name)).collect(),
            ..FakeRuntime::default()
        };
        let mut view_data = ViewData::new(UiOptions::default());
        view_data.active_tab_snapshot =
            Some(TabSnapshot::Products(runtime.products.clone()));
        (view_data, runtime)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn alt_key(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::ALT)
    }

    #[test]
    fn substring_filter_matches_case_insensitively() {
        let projection = fruit_projection();
        let visible = visible_row_indices(&projection, "an");
        assert_eq!(visible, vec![1]);
        assert_eq!(projection.rows[1].label, "Banana");

        assert!(visible_row_indices(&projection, "").len() == 3);
        assert!(visible_row_indices(&projection, "APPLE").contains(&0));
        assert!(visible_row_indices(&projection, "kiwi").is_empty());
    }

    #[test]
    fn filter_matches_any_cell_not_just_the_name() {
        let projection = fruit_projection();
        // SKU column text is searchable too.
        assert_eq!(visible_row_indices(&projection, "sku-002"), vec![1]);
    }

    #[test]
    fn filter_keystrokes_update_visibility_immediately() {
        let (mut view_data, _) = view_with_products(&[(1, "Apple"), (2, "Banana"), (3, "Cherry")]);
        view_data.table_state.filter_focused = true;
        view_data.table_state.selected_row = 2;

        handle_filter_key(&mut view_data, key(KeyCode::Char('a')));
        handle_filter_key(&mut view_data, key(KeyCode::Char('n')));
        assert_eq!(view_data.table_state.filter, "an");
        // Cursor clamps into the single-row filtered set.
        assert_eq!(view_data.table_state.selected_row, 0);

        handle_filter_key(&mut view_data, key(KeyCode::Esc));
        assert!(view_data.table_state.filter.is_empty());
        assert!(!view_data.table_state.filter_focused);
    }

    #[test]
    fn alt_digit_activates_tab_and_persists_fragment() {
        let mut state = AppState::default();
        let (mut view_data, mut runtime) = view_with_products(&[(1, "Apple")]);

        handle_key_event(&mut state, &mut runtime, &mut view_data, alt_key('2'), 0);
        assert_eq!(state.active_tab, TabKind::Products);
        assert_eq!(runtime.fragments, vec!["products".to_owned()]);

        // Digit outside 1..=4 is a no-op.
        handle_key_event(&mut state, &mut runtime, &mut view_data, alt_key('9'), 0);
        assert_eq!(state.active_tab, TabKind::Products);
        assert_eq!(runtime.fragments.len(), 1);
    }

    #[test]
    fn alt_t_toggles_and_persists_theme() {
        let mut state = AppState::default();
        let (mut view_data, mut runtime) = view_with_products(&[]);

        handle_key_event(&mut state, &mut runtime, &mut view_data, alt_key('t'), 10);
        assert_eq!(state.theme, Theme::Dark);
        assert_eq!(runtime.themes, vec![Theme::Dark]);
        assert_eq!(view_data.theme_flash_until, Some(10 + super::THEME_FLASH_MS));

        handle_key_event(&mut state, &mut runtime, &mut view_data, alt_key('t'), 20);
        assert_eq!(state.theme, Theme::Light);
        assert_eq!(runtime.themes, vec![Theme::Dark, Theme::Light]);
    }

    #[test]
    fn back_key_returns_to_previous_tab() {
        let mut state = AppState::default();
        let (mut view_data, mut runtime) = view_with_products(&[]);

        dispatch_and_refresh(
            &mut state,
            &mut runtime,
            &mut view_data,
            AppCommand::ActivateTab(TabKind::Products),
            0,
        );
        handle_key_event(&mut state, &mut runtime, &mut view_data, key(KeyCode::Char('[')), 0);
        assert_eq!(state.active_tab, TabKind::Dashboard);
    }

    #[test]
    fn edit_action_posts_placeholder_notice() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ActivateTab(TabKind::Products));
        let (mut view_data, _) = view_with_products(&[(1, "Apple")]);

        apply_row_action(&mut state, &mut view_data, RowAction::Edit, 0);
        let notice = view_data.notices.iter().next().expect("notice posted");
        assert_eq!(notice.kind, NoticeKind::Info);
        assert!(notice.message.contains("Apple"));
    }

    #[test]
    fn delete_flow_confirms_fades_then_removes() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ActivateTab(TabKind::Products));
        let (mut view_data, mut runtime) = view_with_products(&[(1, "Apple"), (2, "Banana")]);

        apply_row_action(&mut state, &mut view_data, RowAction::Delete, 0);
        assert_eq!(
            view_data.confirm,
            Some(ConfirmDelete {
                tab: TabKind::Products,
                row_id: 1,
                label: "Apple".to_owned(),
            })
        );

        handle_confirm_key(&mut view_data, key(KeyCode::Char('y')), 100);
        assert!(view_data.confirm.is_none());
        assert_eq!(
            view_data.row_fade,
            Some(RowFade {
                tab: TabKind::Products,
                row_id: 1,
                label: "Apple".to_owned(),
                deadline_ms: 100 + super::ROW_FADE_MS,
            })
        );

        // Nothing removed until the fade deadline passes.
        tick(&mut state, &mut runtime, &mut view_data, 100 + super::ROW_FADE_MS - 1);
        assert!(runtime.deleted.is_empty());

        tick(&mut state, &mut runtime, &mut view_data, 100 + super::ROW_FADE_MS);
        assert_eq!(runtime.deleted, vec![(TabKind::Products, 1)]);
        assert!(view_data.row_fade.is_none());
        assert!(
            view_data
                .notices
                .iter()
                .any(|notice| notice.kind == NoticeKind::Success)
        );
    }

    #[test]
    fn delete_declined_leaves_the_row_alone() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ActivateTab(TabKind::Products));
        let (mut view_data, mut runtime) = view_with_products(&[(1, "Apple")]);

        apply_row_action(&mut state, &mut view_data, RowAction::Delete, 0);
        handle_confirm_key(&mut view_data, key(KeyCode::Char('n')), 0);
        assert!(view_data.confirm.is_none());
        assert!(view_data.row_fade.is_none());

        tick(&mut state, &mut runtime, &mut view_data, 10_000);
        assert!(runtime.deleted.is_empty());
    }

    #[test]
    fn form_keystrokes_persist_the_draft() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ActivateTab(TabKind::Products));
        let (mut view_data, mut runtime) = view_with_products(&[]);

        handle_key_event(&mut state, &mut runtime, &mut view_data, key(KeyCode::Char('a')), 0);
        assert!(view_data.form.is_some());

        handle_key_event(&mut state, &mut runtime, &mut view_data, key(KeyCode::Char('W')), 0);
        handle_key_event(&mut state, &mut runtime, &mut view_data, key(KeyCode::Char('o')), 0);
        assert_eq!(runtime.saved_snapshots.len(), 2);
        let (kind, latest) = runtime.saved_snapshots.last().expect("snapshot saved");
        assert_eq!(*kind, FormKind::Product);
        assert_eq!(
            latest.get("name"),
            Some(&opsdeck_app::FieldValue::Text("Wo".to_owned()))
        );
    }

    #[test]
    fn stored_draft_is_restored_when_the_form_opens() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ActivateTab(TabKind::Products));
        let (mut view_data, mut runtime) = view_with_products(&[]);
        let mut snapshot = FormSnapshot::new();
        snapshot.insert_text("sku", "ABC123");
        runtime.stored_snapshot = Some(snapshot);

        handle_key_event(&mut state, &mut runtime, &mut view_data, key(KeyCode::Char('a')), 0);
        let form = view_data.form.as_ref().expect("form open");
        let sku = form
            .draft
            .fields()
            .iter()
            .find(|field| field.spec.name == "sku")
            .expect("sku field");
        assert_eq!(sku.text, "ABC123");
    }

    #[test]
    fn clamp_handles_empty_and_shrunken_row_sets() {
        let (mut view_data, _) = view_with_products(&[(1, "Apple")]);
        view_data.table_state.selected_row = 5;
        clamp_selected_row(&mut view_data);
        assert_eq!(view_data.table_state.selected_row, 0);

        view_data.active_tab_snapshot = Some(TabSnapshot::Products(Vec::new()));
        clamp_selected_row(&mut view_data);
        assert_eq!(view_data.table_state.selected_row, 0);
    }

    #[test]
    fn row_filter_is_substring_based() {
        let row = TableRowProjection {
            row_id: None,
            label: "Banana".to_owned(),
            cells: vec!["Banana".to_owned(), "fruit".to_owned()],
        };
        assert!(row_matches_filter(&row, "AN"));
        assert!(row_matches_filter(&row, "fruit"));
        assert!(!row_matches_filter(&row, "ana na"));
    }

    #[test]
    fn palettes_differ_between_themes() {
        assert_ne!(palette(Theme::Light), palette(Theme::Dark));
    }

    #[test]
    fn colorfgbg_detection_follows_background_index() {
        assert_eq!(detect_theme_from_colorfgbg(None), None);
        assert_eq!(detect_theme_from_colorfgbg(Some("15;0")), Some(Theme::Dark));
        assert_eq!(
            detect_theme_from_colorfgbg(Some("0;15")),
            Some(Theme::Light)
        );
        assert_eq!(detect_theme_from_colorfgbg(Some("0;7")), Some(Theme::Light));
        assert_eq!(detect_theme_from_colorfgbg(Some("garbage")), None);
    }

    #[test]
    fn resize_debounce_is_last_event_wins() {
        let mut state = AppState::default();
        let (mut view_data, mut runtime) = view_with_products(&[]);
        view_data.compact_override = None;

        view_data.terminal_width = 40;
        view_data.pending_relayout_at_ms = Some(100 + super::RESIZE_DEBOUNCE_MS);
        // A second resize before the deadline replaces the pending deadline.
        view_data.terminal_width = 120;
        view_data.pending_relayout_at_ms = Some(180 + super::RESIZE_DEBOUNCE_MS);

        tick(&mut state, &mut runtime, &mut view_data, 100 + super::RESIZE_DEBOUNCE_MS);
        assert!(view_data.pending_relayout_at_ms.is_some());

        tick(&mut state, &mut runtime, &mut view_data, 180 + super::RESIZE_DEBOUNCE_MS);
        assert!(view_data.pending_relayout_at_ms.is_none());
        assert!(!view_data.compact_tabs);
    }

    #[test]
    fn narrow_terminal_uses_compact_tabs_after_debounce() {
        let mut state = AppState::default();
        let (mut view_data, mut runtime) = view_with_products(&[]);
        view_data.compact_override = None;
        view_data.terminal_width = 30;
        view_data.pending_relayout_at_ms = Some(super::RESIZE_DEBOUNCE_MS);

        tick(&mut state, &mut runtime, &mut view_data, super::RESIZE_DEBOUNCE_MS);
        assert!(view_data.compact_tabs);
    }

    #[test]
    fn settings_snapshot_reports_its_tab_kind() {
        let snapshot = TabSnapshot::Settings(vec![AppSetting {
            key: SettingKey::UiTheme,
            value: SettingValue::Text("light".to_owned()),
        }]);
        assert_eq!(snapshot.tab_kind(), TabKind::Settings);
        assert_eq!(snapshot.row_count(), 1);
    }

    #[test]
    fn money_formatting_pads_cents() {
        assert_eq!(super::format_money(1_250), "$12.50");
        assert_eq!(super::format_money(5), "$0.05");
        assert_eq!(super::format_money(-1_250), "-$12.50");
    }

    #[test]
    fn table_ui_state_defaults_are_inert() {
        let state = TableUiState::default();
        assert_eq!(state.selected_row, 0);
        assert!(state.filter.is_empty());
        assert!(!state.filter_focused);
    }
}
