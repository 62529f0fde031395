pub mod app;
pub mod common;
pub mod render;

pub use app::{INIT_FAILURE_EXIT_CODE, run_app};
