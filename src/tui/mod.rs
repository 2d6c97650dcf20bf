mod handler;
mod ui;

pub use handler::{handle_key_event, AppAction};
pub use ui::{draw, plain_text};
