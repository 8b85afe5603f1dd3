// gifforge-cli/src/logging.rs
//
// Process logging setup. The per-file batch log file is handled separately
// by the core FsGateway; this configures the log facade output on stderr.

use log::LevelFilter;

/// Initializes stderr logging via fern.
///
/// `verbose` raises the level from Info to Debug, which also mirrors every
/// batch log line onto stderr.
pub fn init(verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                message
            ));
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}
