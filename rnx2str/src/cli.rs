use clap::{value_parser, Arg, ArgAction, ArgMatches, ColorChoice, Command};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use hifitime::{Duration, Epoch};

use rnx2rtcm::{
    config::{Config, Mode, DEFAULT_PORT},
    message::{MessageType, MessageTypeError},
};

use crate::Error;

pub struct Cli {
    /// arguments passed by user
    pub matches: ArgMatches,
}

impl Cli {
    pub fn new() -> Self {
        Self {
            matches: {
                Command::new("rnx2str")
                    .author("Guillaume W. Bres <guillaume.bressaix@gmail.com>")
                    .version(env!("CARGO_PKG_VERSION"))
                    .about("RINEX observations to paced RTCM3 streams")
                    .arg_required_else_help(true)
                    .color(ColorChoice::Always)
                    .arg(
                        Arg::new("filepath")
                            .help("Input RINEX (V3) observation file")
                            .required(true),
                    )
                    .next_help_heading("Output")
                    .arg(
                        Arg::new("output")
                            .short('o')
                            .long("output")
                            .action(ArgAction::Set)
                            .help("Output file. A time tag index (output.tag) is generated alongside.")
                    )
                    .arg(
                        Arg::new("port")
                            .short('p')
                            .long("port")
                            .num_args(0..=1)
                            .default_missing_value("2101")
                            .value_parser(value_parser!(u16))
                            .action(ArgAction::Set)
                            .help(format!("Broadcast to all TCP clients on this port (default: {}).", DEFAULT_PORT))
                    )
                    .arg(
                        Arg::new("fast")
                            .short('f')
                            .long("fast")
                            .action(ArgAction::SetTrue)
                            .help("Generate as fast as possible, along with a virtual time index.
Without --output, the stream is written to stdout.")
                    )
                    .next_help_heading("RTCM3")
                    .arg(
                        Arg::new("messages")
                            .short('m')
                            .long("messages")
                            .action(ArgAction::Set)
                            .help("Comma separated list of message types, transmitted once per epoch, in this order.
0 disables one entry. Default: 1006,1077,1087,1097,1127.")
                    )
                    .arg(
                        Arg::new("id")
                            .long("id")
                            .value_parser(value_parser!(u16))
                            .action(ArgAction::Set)
                            .help("Reference station ID (1..=4095). Default: 1.")
                    )
                    .arg(
                        Arg::new("name")
                            .long("name")
                            .action(ArgAction::Set)
                            .help("Station label. Use an empty label to describe the marker name.")
                    )
                    .next_help_heading("Observations")
                    .arg(
                        Arg::new("start")
                            .long("start")
                            .action(ArgAction::Set)
                            .help("Drop observations before this instant (example: \"2020-06-25T00:00:00 GPST\").")
                    )
                    .arg(
                        Arg::new("end")
                            .long("end")
                            .action(ArgAction::Set)
                            .help("Drop observations after this instant.")
                    )
                    .arg(
                        Arg::new("interval")
                            .short('i')
                            .long("interval")
                            .value_parser(value_parser!(f64))
                            .action(ArgAction::Set)
                            .help("Resampling interval [s].")
                    )
                    .get_matches()
            },
        }
    }
    pub fn input_path(&self) -> PathBuf {
        match self.matches.get_one::<String>("filepath") {
            Some(path) => Path::new(path).to_path_buf(),
            None => PathBuf::new(),
        }
    }
    fn epoch(&self, key: &str) -> Result<Option<Epoch>, Error> {
        match self.matches.get_one::<String>(key) {
            Some(epoch) => Epoch::from_str(epoch.trim())
                .map(Some)
                .map_err(|_| Error::InvalidEpoch(epoch.to_string())),
            None => Ok(None),
        }
    }
    fn messages(&self) -> Result<Option<Vec<MessageType>>, MessageTypeError> {
        match self.matches.get_one::<String>("messages") {
            Some(list) => list
                .split(',')
                .map(MessageType::from_str)
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            None => Ok(None),
        }
    }
    /// Builds the session [Config] from the command line
    pub fn config(&self) -> Result<Config, Error> {
        let mut cfg = Config::default().with_input(&self.input_path());

        if let Some(output) = self.matches.get_one::<String>("output") {
            cfg = cfg.with_output(Path::new(output));
        }
        if let Some(port) = self.matches.get_one::<u16>("port") {
            cfg = cfg.with_port(*port);
        }
        if self.matches.get_flag("fast") {
            cfg = cfg.with_mode(Mode::Fast);
        }
        if let Some(messages) = self.messages()? {
            cfg = cfg.with_messages(&messages);
        }
        if let Some(id) = self.matches.get_one::<u16>("id") {
            cfg = cfg.with_station_id(*id);
        }
        if let Some(name) = self.matches.get_one::<String>("name") {
            cfg = cfg.with_station_name(name);
        }
        if let Some(start) = self.epoch("start")? {
            cfg = cfg.with_start(start);
        }
        if let Some(end) = self.epoch("end")? {
            cfg = cfg.with_end(end);
        }
        if let Some(interval) = self.matches.get_one::<f64>("interval") {
            cfg = cfg.with_interval(Duration::from_seconds(*interval));
        }
        Ok(cfg)
    }
}
