pub mod dialog;
pub mod keybar;
pub mod layout;
pub mod markdown;
pub mod question;
pub mod result;
pub mod sidebar;
pub mod statusbar;
pub mod titlebar;

use ratatui::layout::Rect;
use ratatui::Frame;

use crate::state::{AppState, Screen};

pub fn draw(f: &mut Frame, state: &AppState) {
    let area = f.area();
    let layout = layout::compute_layout(area);

    titlebar::draw_titlebar(f, layout.titlebar, state);
    match state.screen {
        Screen::Working => draw_working(f, layout.sidebar, layout.main, state),
        Screen::Finishing => result::draw_finishing(f, layout.content(), state),
        Screen::Finished => result::draw_finished(f, layout.content(), state),
    }
    statusbar::draw_statusbar(f, layout.statusbar, state);
    keybar::draw_keybar(f, layout.keybar, state);

    if state.has_dialog() {
        dialog::draw_dialog(f, area, state);
    }
}

fn draw_working(f: &mut Frame, sidebar: Rect, main: Rect, state: &AppState) {
    sidebar::draw_sidebar(f, sidebar, state);
    question::draw_question(f, main, state);
}
