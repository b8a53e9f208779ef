mod cli;
use cli::Cli;

use env_logger::{Builder, Target};
use log::{error, info};
use thiserror::Error;

use rnx2rtcm::{
    message::MessageTypeError,
    prelude::{ObservationSet, Rtcm3Codec, Session},
    ParsingError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("parsing error: {0}")]
    ParsingError(#[from] ParsingError),
    #[error("{0}")]
    SessionError(#[from] rnx2rtcm::Error),
    #[error("{0}")]
    MessageType(#[from] MessageTypeError),
    #[error("invalid epoch \"{0}\"")]
    InvalidEpoch(String),
}

fn main() -> Result<(), Error> {
    // stdout may carry the stream itself
    let mut builder = Builder::from_default_env();
    builder
        .target(Target::Stderr)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let cli = Cli::new();
    let cfg = cli.config()?;
    cfg.validate()?;

    let set = ObservationSet::from_file(&cfg.input, &cfg.read_options()).map_err(|e| {
        error!("failed to read {}: {}", cfg.input.display(), e);
        e
    })?;

    info!(
        "{}: {} observations, {} epochs",
        cfg.input.display(),
        set.records.len(),
        set.epochs()
    );

    let codec = Rtcm3Codec::new(cfg.station_id, cfg.station(&set.station))
        .with_glonass_channels(&set.glo_fcn);

    let mut session = Session::open(&cfg, codec)?;
    session.run(&set.records);
    let report = session.close();

    eprintln!();
    eprint!("{}", report);

    if report.counters.refusals > 0 || report.counters.skipped > 0 || report.short_writes > 0 {
        info!(
            "{} refused, {} skipped, {} short writes",
            report.counters.refusals, report.counters.skipped, report.short_writes
        );
    }

    Ok(())
}
