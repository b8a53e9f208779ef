//! Per epoch message sequencing and continuation (sync) flags
use std::collections::BTreeMap;

use log::{debug, warn};

use crate::{
    codec::MessageCodec,
    message::{Category, MessageType},
    observation::Observation,
    page::{paginate, Page},
    signal::SignalSet,
};

/// Message emission counters, accumulated over a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counters {
    /// Number of messages emitted, per message type
    pub messages: BTreeMap<MessageType, u32>,
    /// Number of messages the codec declined to encode
    pub refusals: u32,
    /// Number of (epoch, constellation) pairs skipped
    /// because of signal mask overflow
    pub skipped: u32,
}

impl Counters {
    /// Total number of messages emitted
    pub fn total(&self) -> u32 {
        self.messages.values().sum()
    }
}

/// One encoded message, ready to be transmitted
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub message: MessageType,
    /// True when more messages follow for this epoch
    pub sync: bool,
    pub bytes: Vec<u8>,
}

/// One message to be encoded during this epoch
#[derive(Debug, Clone, PartialEq)]
pub struct Planned<'a> {
    /// Index in the configured message list
    pub index: usize,
    pub message: MessageType,
    pub page: Page<'a>,
}

/// Index of the last configured type that takes part in an epoch.
/// Disabled placeholders and unsupported types are ignored.
pub fn last_index(messages: &[MessageType]) -> Option<usize> {
    messages
        .iter()
        .rposition(|msg| msg.category().is_framed())
}

/// [Sequencer] turns one epoch into an ordered series of [Emission]s,
/// following the configured message list.
#[derive(Debug, Clone)]
pub struct Sequencer {
    messages: Vec<MessageType>,
    last: Option<usize>,
}

impl Sequencer {
    pub fn new(messages: &[MessageType]) -> Self {
        Self {
            messages: messages.to_vec(),
            last: last_index(messages),
        }
    }

    /// Configured message types
    pub fn messages(&self) -> &[MessageType] {
        &self.messages
    }

    /// Index of the terminal message type, if any
    pub fn last_index(&self) -> Option<usize> {
        self.last
    }

    /// Plans all messages of this epoch: one per legacy type,
    /// one per non empty page of each paged type.
    /// Constellations that overflow the signal mask are skipped.
    pub fn plan<'a>(&self, epoch: &'a [Observation], counters: &mut Counters) -> Vec<Planned<'a>> {
        let mut plan = Vec::with_capacity(self.messages.len());
        let last = match self.last {
            Some(last) => last,
            None => return plan,
        };

        for (index, message) in self.messages.iter().enumerate().take(last + 1) {
            match message.category() {
                Category::Legacy => {
                    plan.push(Planned {
                        index,
                        message: *message,
                        page: Page::new(epoch.iter().collect()),
                    });
                },
                Category::Msm { constellation, .. } => {
                    let set = SignalSet::analyze(epoch, constellation);
                    if set.overflows() {
                        warn!(
                            "{} - {} distinct signals: {} not transmitted",
                            message, set.signals, constellation
                        );
                        counters.skipped += 1;
                        continue;
                    }
                    for page in paginate(epoch, constellation, set.signals) {
                        if !page.is_empty() {
                            plan.push(Planned {
                                index,
                                message: *message,
                                page,
                            });
                        }
                    }
                },
                Category::Disabled | Category::Unsupported => {},
            }
        }
        plan
    }

    /// Encodes all messages of this epoch and hands them over to `output`, in order.
    /// Exactly one emitted message ends the epoch (sync = false).
    /// A message the codec declines is not transmitted; when this happens to
    /// the final messages, the previous one is encoded again to close the epoch.
    pub fn run<C, F>(
        &self,
        codec: &mut C,
        epoch: &[Observation],
        counters: &mut Counters,
        mut output: F,
    ) where
        C: MessageCodec + ?Sized,
        F: FnMut(&Emission),
    {
        let first = match epoch.first() {
            Some(first) => first,
            None => return,
        };

        codec.begin_epoch(first.epoch);

        let plan = self.plan(epoch, counters);
        let size = plan.len();

        let mut release = |emission: Emission, counters: &mut Counters| {
            *counters.messages.entry(emission.message).or_insert(0) += 1;
            output(&emission);
        };

        let mut held: Option<(usize, Emission)> = None;

        for (k, planned) in plan.iter().enumerate() {
            let sync = k + 1 < size;
            match codec.encode(planned.message, &planned.page, sync) {
                Ok(bytes) => {
                    let emission = Emission {
                        message: planned.message,
                        sync,
                        bytes,
                    };
                    if let Some((_, previous)) = held.replace((k, emission)) {
                        release(previous, counters);
                    }
                },
                Err(e) => {
                    debug!("{} - {}", planned.message, e);
                    counters.refusals += 1;
                },
            }
        }

        if let Some((k, mut emission)) = held {
            if emission.sync {
                let planned = &plan[k];
                match codec.encode(planned.message, &planned.page, false) {
                    Ok(bytes) => {
                        emission.bytes = bytes;
                        emission.sync = false;
                    },
                    Err(e) => {
                        warn!("{} - failed to close epoch: {}", planned.message, e);
                    },
                }
            }
            release(emission, counters);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        observation::{Code, Signal},
        prelude::{Epoch, SV},
        tests::toolkit::{gps_observation, sv, synthetic_gps_epoch, MockCodec},
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn types(numbers: &[u16]) -> Vec<MessageType> {
        numbers.iter().map(|n| MessageType(*n)).collect()
    }

    fn run(
        numbers: &[u16],
        codec: &mut MockCodec,
        epoch: &[Observation],
    ) -> (Vec<Emission>, Counters) {
        let sequencer = Sequencer::new(&types(numbers));
        let mut counters = Counters::default();
        let mut emitted = Vec::new();
        sequencer.run(codec, epoch, &mut counters, |e| emitted.push(e.clone()));
        (emitted, counters)
    }

    fn syncs(emitted: &[Emission]) -> Vec<bool> {
        emitted.iter().map(|e| e.sync).collect()
    }

    #[test]
    fn terminal_index() {
        assert_eq!(last_index(&types(&[1006, 1077, 0, 1033])), Some(1));
        assert_eq!(last_index(&types(&[0, 1033, 1230])), None);
        assert_eq!(last_index(&types(&[1077, 1087, 1006])), Some(2));
        assert_eq!(last_index(&[]), None);
    }

    #[test]
    fn single_page() {
        let t = Epoch::from_gpst_seconds(0.0);
        let epoch = vec![
            gps_observation(t, sv("G01"), &["1C", "2W"]),
            gps_observation(t, sv("G02"), &["1C", "5Q"]),
            gps_observation(t, sv("G03"), &["1C"]),
            gps_observation(t, sv("G04"), &["2W"]),
        ];
        let mut codec = MockCodec::default();
        let (emitted, counters) = run(&[1077], &mut codec, &epoch);
        assert_eq!(emitted.len(), 1);
        assert!(!emitted[0].sync);
        assert_eq!(codec.calls[0].page_size, 4);
        assert_eq!(counters.messages.get(&MessageType(1077)), Some(&1));
    }

    #[test]
    fn two_hundred_satellites() {
        let t = Epoch::from_gpst_seconds(0.0);
        let epoch = synthetic_gps_epoch(t, 200, &["1C"]);

        let mut codec = MockCodec::default();
        let (emitted, counters) = run(&[1077], &mut codec, &epoch);
        assert_eq!(syncs(&emitted), vec![true, true, true, false]);
        assert_eq!(
            codec.calls.iter().map(|c| c.page_size).collect::<Vec<_>>(),
            vec![64, 64, 64, 8]
        );
        assert_eq!(counters.total(), 4);

        let mut codec = MockCodec::default();
        let (emitted, _) = run(&[1077, 1006], &mut codec, &epoch);
        assert_eq!(syncs(&emitted), vec![true, true, true, true, false]);
        assert_eq!(emitted[4].message, MessageType(1006));
    }

    #[test]
    fn signal_mask_overflow() {
        let t = Epoch::from_gpst_seconds(0.0);
        let mut epoch = Vec::new();
        for prn in 1..=10 {
            let mut obs = gps_observation(t, SV::new(crate::prelude::Constellation::GPS, prn), &[]);
            for i in 0..7 {
                let index = (prn - 1) * 7 + i + 1;
                obs = obs.with_signal(
                    Signal::new(Code::from_index(index).unwrap()).with_pseudorange(2.0E7),
                );
            }
            epoch.push(obs);
        }
        epoch.push(gps_observation(t, sv("E01"), &["1C", "7Q"]));
        epoch.push(gps_observation(t, sv("E02"), &["1C"]));

        let mut codec = MockCodec::default();
        let (emitted, counters) = run(&[1077, 1097], &mut codec, &epoch);
        assert_eq!(counters.skipped, 1);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].message, MessageType(1097));
        assert!(!emitted[0].sync);
        assert_eq!(codec.calls[0].page_size, 2);
    }

    #[test]
    fn declined_messages_are_skipped() {
        let t = Epoch::from_gpst_seconds(0.0);
        let epoch = vec![
            gps_observation(t, sv("G01"), &["1C"]),
            gps_observation(t, sv("E01"), &["1C"]),
        ];

        // terminal message declined: previous message closes the epoch
        let mut codec = MockCodec::default().declining(&[1097]);
        let (emitted, counters) = run(&[1006, 1077, 1097], &mut codec, &epoch);
        assert_eq!(syncs(&emitted), vec![true, false]);
        assert_eq!(emitted[1].message, MessageType(1077));
        assert_eq!(counters.refusals, 1);
        assert_eq!(counters.messages.get(&MessageType(1097)), None);

        // intermediate message declined
        let mut codec = MockCodec::default().declining(&[1077]);
        let (emitted, counters) = run(&[1006, 1077, 1097], &mut codec, &epoch);
        assert_eq!(syncs(&emitted), vec![true, false]);
        assert_eq!(counters.refusals, 1);

        // everything declined
        let mut codec = MockCodec::default().declining(&[1006, 1077, 1097]);
        let (emitted, counters) = run(&[1006, 1077, 1097], &mut codec, &epoch);
        assert!(emitted.is_empty());
        assert_eq!(counters.refusals, 3);
    }

    #[test]
    fn terminal_type_without_data() {
        let t = Epoch::from_gpst_seconds(0.0);
        let epoch = vec![gps_observation(t, sv("G01"), &["1C"])];

        let mut codec = MockCodec::default();
        let (emitted, _) = run(&[1006, 1077, 1127, 0], &mut codec, &epoch);
        assert_eq!(syncs(&emitted), vec![true, false]);
    }

    #[test]
    fn exactly_one_terminal_message() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let pool = [0, 1005, 1006, 1033, 1074, 1077, 1087, 1097, 1127];
        let t = Epoch::from_gpst_seconds(1000.0);

        for _ in 0..200 {
            let ntypes = rng.gen_range(1..6);
            let numbers = (0..ntypes)
                .map(|_| pool[rng.gen_range(0..pool.len())])
                .collect::<Vec<_>>();

            let nsat = rng.gen_range(1..150);
            let codes = ["1C", "2W", "5Q", "2L"];
            let ncodes = rng.gen_range(1..=codes.len());
            let epoch = synthetic_gps_epoch(t, nsat, &codes[..ncodes]);

            let mut codec = MockCodec::default();
            let (emitted, _) = run(&numbers, &mut codec, &epoch);

            let gps = numbers.iter().any(|n| {
                matches!(
                    MessageType(*n).category(),
                    Category::Legacy
                        | Category::Msm {
                            constellation: crate::prelude::Constellation::GPS,
                            ..
                        }
                )
            });

            if gps {
                assert_eq!(
                    emitted.iter().filter(|e| !e.sync).count(),
                    1,
                    "{:?} with {} satellites",
                    numbers,
                    nsat
                );
                assert!(!emitted[emitted.len() - 1].sync);
            } else {
                assert!(emitted.is_empty());
            }
        }
    }
}
