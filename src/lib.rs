pub mod certificates;
pub mod cli;
pub mod config;
pub mod core;
pub mod notify;
pub mod portal;

pub use cli::run;

/// Initialises `env_logger` with an `info` default, overridable via `RUST_LOG`.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if let Err(err) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("logger already initialised: {err}");
    }
}
