//! Panel navigation state machine

/// Which part of the page is in focus
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavState {
    /// Whole page visible, no panel focused
    #[default]
    FullPage,
    /// Panel at this array position focused
    OnPanel(usize),
}

impl NavState {
    /// Index encoding where `-1` is the full page
    pub fn index(self) -> isize {
        match self {
            Self::FullPage => -1,
            Self::OnPanel(i) => i as isize,
        }
    }

    pub fn panel(self) -> Option<usize> {
        match self {
            Self::FullPage => None,
            Self::OnPanel(i) => Some(i),
        }
    }
}

/// Tracks the focused panel of the current page.
///
/// Panels are addressed by array position; their `order` field plays no part
/// in traversal.
#[derive(Clone, Debug, Default)]
pub struct PanelNavigator {
    state: NavState,
    panel_count: usize,
}

impl PanelNavigator {
    #[must_use]
    pub fn new(panel_count: usize) -> Self {
        Self {
            state: NavState::FullPage,
            panel_count,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn panel_count(&self) -> usize {
        self.panel_count
    }

    /// Focused panel position, `None` on the full page
    pub fn current(&self) -> Option<usize> {
        self.state.panel()
    }

    pub fn is_full_page(&self) -> bool {
        self.state == NavState::FullPage
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        let next = match cmd {
            Command::Next => self.after_next(),
            Command::Prev => self.after_prev(),
            Command::Reset | Command::JumpToFullPage => NavState::FullPage,
            Command::SetPanelCount(count) => {
                self.panel_count = count;
                NavState::FullPage
            }
        };
        self.transition(next)
    }

    pub fn next(&mut self) -> Vec<Effect> {
        self.apply(Command::Next)
    }

    pub fn prev(&mut self) -> Vec<Effect> {
        self.apply(Command::Prev)
    }

    pub fn reset(&mut self) -> Vec<Effect> {
        self.apply(Command::Reset)
    }

    pub fn jump_to_full_page(&mut self) -> Vec<Effect> {
        self.apply(Command::JumpToFullPage)
    }

    fn after_next(&self) -> NavState {
        if self.panel_count == 0 {
            return NavState::FullPage;
        }
        match self.state {
            NavState::FullPage => NavState::OnPanel(0),
            NavState::OnPanel(i) if i + 1 < self.panel_count => NavState::OnPanel(i + 1),
            NavState::OnPanel(_) => NavState::FullPage,
        }
    }

    fn after_prev(&self) -> NavState {
        match self.state {
            NavState::OnPanel(i) if i > 0 && i <= self.panel_count => NavState::OnPanel(i - 1),
            NavState::OnPanel(_) | NavState::FullPage => NavState::FullPage,
        }
    }

    fn transition(&mut self, next: NavState) -> Vec<Effect> {
        if next == self.state {
            return vec![];
        }
        self.state = next;
        match next {
            NavState::FullPage => vec![Effect::ShowFullPage],
            NavState::OnPanel(i) => vec![Effect::FocusPanel(i)],
        }
    }
}

/// Commands that move panel focus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advance to the next panel, wrapping to the full page after the last
    Next,
    /// Step back one panel; from the first panel, back to the full page
    Prev,
    /// Page image changed
    Reset,
    /// User asked for the whole page
    JumpToFullPage,
    /// Fresh panel set arrived
    SetPanelCount(usize),
}

/// Effects produced by navigation, consumed by the rendering layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Zoom to the panel at this array position
    FocusPanel(usize),
    /// Animate back to the identity transform
    ShowFullPage,
}
