//! Ambient logging setup: installs `pretty_env_logger` at a level derived
//! from the `-V`/`-q` flags rather than leaving it to `RUST_LOG` alone.

pub fn init(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .try_init()
        .ok();
}
