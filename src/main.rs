use std::process::ExitCode;

use color_eyre::eyre::WrapErr;
use uv_sphere::{INIT_FAILURE_EXIT_CODE, common::settings::Settings, run_app};

fn main() -> ExitCode {
    env_logger::init();
    if let Err(err) = color_eyre::install() {
        log::warn!("{err}");
    }

    match Settings::load()
        .wrap_err("failed to load settings")
        .and_then(run_app)
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::from(INIT_FAILURE_EXIT_CODE)
        }
    }
}
