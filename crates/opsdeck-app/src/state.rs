use crate::{AppMode, FormKind, TabKind, Theme};

const HISTORY_MAX: usize = 32;

/// Browser-style history over tab activations: a bounded entry list plus a
/// cursor. Activations push; back/forward only move the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavHistory {
    entries: Vec<TabKind>,
    cursor: usize,
}

impl NavHistory {
    pub fn new(initial: TabKind) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> TabKind {
        self.entries[self.cursor]
    }

    /// Records an activation. A tab equal to the current entry is not pushed
    /// again; activating mid-history drops the forward entries first.
    pub fn push(&mut self, tab: TabKind) {
        if self.entries[self.cursor] == tab {
            return;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(tab);
        if self.entries.len() > HISTORY_MAX {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn back(&mut self) -> Option<TabKind> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor])
    }

    pub fn forward(&mut self) -> Option<TabKind> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_tab: TabKind,
    pub theme: Theme,
    pub status_line: Option<String>,
    pub history: NavHistory,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_start(TabKind::Dashboard, Theme::Light)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ActivateTab(TabKind),
    NextTab,
    PrevTab,
    ApplyFragment(String),
    NavigateBack,
    NavigateForward,
    ToggleTheme,
    OpenForm(FormKind),
    ExitToNav,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    TabChanged(TabKind),
    FragmentChanged(String),
    ThemeChanged(Theme),
    ModeChanged(AppMode),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn with_start(tab: TabKind, theme: Theme) -> Self {
        Self {
            mode: AppMode::Nav,
            active_tab: tab,
            theme,
            status_line: None,
            history: NavHistory::new(tab),
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ActivateTab(tab) => self.activate(tab, true),
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::ApplyFragment(raw) => match TabKind::parse_fragment(&raw) {
                Some(tab) => self.activate(tab, true),
                // Unknown fragments are a deliberate no-op.
                None => Vec::new(),
            },
            AppCommand::NavigateBack => match self.history.back() {
                Some(tab) => self.activate(tab, false),
                None => Vec::new(),
            },
            AppCommand::NavigateForward => match self.history.forward() {
                Some(tab) => self.activate(tab, false),
                None => Vec::new(),
            },
            AppCommand::ToggleTheme => {
                self.theme = self.theme.toggled();
                vec![
                    AppEvent::ThemeChanged(self.theme),
                    self.set_status(self.theme.as_str()),
                ]
            }
            AppCommand::OpenForm(kind) => {
                self.mode = AppMode::Form(kind);
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("nav")]
            }
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn activate(&mut self, tab: TabKind, push: bool) -> Vec<AppEvent> {
        if self.active_tab == tab {
            return Vec::new();
        }
        self.active_tab = tab;
        if push {
            self.history.push(tab);
        }
        vec![
            AppEvent::TabChanged(tab),
            AppEvent::FragmentChanged(tab.fragment().to_owned()),
        ]
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = TabKind::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.activate(tabs[next], true)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, NavHistory};
    use crate::{AppMode, FormKind, TabKind, Theme};

    #[test]
    fn activate_emits_tab_and_fragment_events() {
        let mut state = AppState::default();

        let events = state.dispatch(AppCommand::ActivateTab(TabKind::Products));
        assert_eq!(state.active_tab, TabKind::Products);
        assert_eq!(
            events,
            vec![
                AppEvent::TabChanged(TabKind::Products),
                AppEvent::FragmentChanged("products".to_owned()),
            ],
        );
    }

    #[test]
    fn activating_the_active_tab_is_a_no_op() {
        let mut state = AppState::default();

        let events = state.dispatch(AppCommand::ActivateTab(TabKind::Dashboard));
        assert!(events.is_empty());
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn tab_rotation_wraps() {
        let mut state = AppState::with_start(TabKind::Settings, Theme::Light);

        let events = state.dispatch(AppCommand::NextTab);
        assert_eq!(state.active_tab, TabKind::Dashboard);
        assert_eq!(
            events,
            vec![
                AppEvent::TabChanged(TabKind::Dashboard),
                AppEvent::FragmentChanged("dashboard".to_owned()),
            ],
        );
    }

    #[test]
    fn unknown_fragment_changes_nothing() {
        let mut state = AppState::default();

        let events = state.dispatch(AppCommand::ApplyFragment("#billing".to_owned()));
        assert!(events.is_empty());
        assert_eq!(state.active_tab, TabKind::Dashboard);
    }

    #[test]
    fn known_fragment_activates_its_tab() {
        let mut state = AppState::default();

        state.dispatch(AppCommand::ApplyFragment("#reports".to_owned()));
        assert_eq!(state.active_tab, TabKind::Reports);
    }

    #[test]
    fn back_returns_to_the_previous_tab() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ActivateTab(TabKind::Products));

        let events = state.dispatch(AppCommand::NavigateBack);
        assert_eq!(state.active_tab, TabKind::Dashboard);
        assert_eq!(
            events,
            vec![
                AppEvent::TabChanged(TabKind::Dashboard),
                AppEvent::FragmentChanged("dashboard".to_owned()),
            ],
        );
    }

    #[test]
    fn forward_after_back_returns_to_the_later_entry() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ActivateTab(TabKind::Products));
        state.dispatch(AppCommand::NavigateBack);

        state.dispatch(AppCommand::NavigateForward);
        assert_eq!(state.active_tab, TabKind::Products);
    }

    #[test]
    fn back_at_the_oldest_entry_is_a_no_op() {
        let mut state = AppState::default();

        assert!(state.dispatch(AppCommand::NavigateBack).is_empty());
        assert_eq!(state.active_tab, TabKind::Dashboard);
    }

    #[test]
    fn activating_mid_history_drops_forward_entries() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::ActivateTab(TabKind::Products));
        state.dispatch(AppCommand::ActivateTab(TabKind::Reports));
        state.dispatch(AppCommand::NavigateBack);

        state.dispatch(AppCommand::ActivateTab(TabKind::Settings));
        assert!(state.dispatch(AppCommand::NavigateForward).is_empty());
        assert_eq!(state.active_tab, TabKind::Settings);

        state.dispatch(AppCommand::NavigateBack);
        assert_eq!(state.active_tab, TabKind::Products);
    }

    #[test]
    fn history_push_is_bounded() {
        let mut history = NavHistory::new(TabKind::Dashboard);
        for _ in 0..40 {
            history.push(TabKind::Products);
            history.push(TabKind::Dashboard);
        }
        assert!(history.len() <= 32);
        assert_eq!(history.current(), TabKind::Dashboard);
    }

    #[test]
    fn toggle_theme_twice_restores_the_original() {
        let mut state = AppState::default();
        let original = state.theme;

        let events = state.dispatch(AppCommand::ToggleTheme);
        assert_eq!(state.theme, Theme::Dark);
        assert_eq!(
            events,
            vec![
                AppEvent::ThemeChanged(Theme::Dark),
                AppEvent::StatusUpdated("dark".to_owned()),
            ],
        );

        state.dispatch(AppCommand::ToggleTheme);
        assert_eq!(state.theme, original);
    }

    #[test]
    fn mode_transitions() {
        let mut state = AppState::default();

        state.dispatch(AppCommand::OpenForm(FormKind::Product));
        assert_eq!(state.mode, AppMode::Form(FormKind::Product));

        state.dispatch(AppCommand::ExitToNav);
        assert_eq!(state.mode, AppMode::Nav);
    }
}
