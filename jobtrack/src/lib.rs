mod app;
pub mod cli;
pub mod dashboard;
pub mod logging;

pub use app::App;
