//! Terminal screen, app loop and REST worker.

mod app;
mod backend;
mod screen;

pub use app::App;
pub use backend::{Backend, BackendAction, BackendCommand};
pub use screen::Screen;
