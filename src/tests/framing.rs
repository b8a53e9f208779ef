use rand::{rngs::StdRng, Rng, SeedableRng};
use rtcm_rs::prelude::MsgFrameIter;

use crate::{
    codec::rtcm3::Rtcm3Codec,
    message::MessageType,
    output::{Multiplexer, Primary, WriterTransport},
    pacer::VirtualClock,
    page::{page_count, paginate, satellites_per_page},
    prelude::{Constellation, Epoch},
    reader::{ObservationSet, ReadOptions},
    session::Session,
    signal::SignalSet,
    tests::toolkit::{synthetic_gps_epoch, test_resource, SharedBuffer},
    Framing,
};

const GPS_CODES: [&str; 12] = [
    "1C", "1P", "1W", "2C", "2P", "2W", "2S", "2L", "2X", "5I", "5Q", "5X",
];

/// Splits a byte stream into (message number, multiple message bit) pairs.
/// The multiple message bit is only meaningful for MSM.
fn frames(stream: &[u8]) -> Vec<(u16, bool)> {
    let mut iter = MsgFrameIter::new(stream);
    let frames = (&mut iter)
        .map(|frame| {
            let number = frame.message_number().unwrap();
            (number, frame.data()[6] & 0x02 != 0)
        })
        .collect::<Vec<_>>();
    // every byte belongs to a valid frame
    assert_eq!(iter.consumed(), stream.len());
    frames
}

#[test]
fn random_epoch_paging() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let t = Epoch::from_gpst_seconds(1.0E9);

    for _ in 0..200 {
        let satellites = rng.gen_range(1..=200);
        let signals = rng.gen_range(1..=GPS_CODES.len());
        let epoch = synthetic_gps_epoch(t, satellites, &GPS_CODES[..signals]);

        let set = SignalSet::analyze(&epoch, Constellation::GPS);
        assert_eq!(set.satellites, satellites);
        assert_eq!(set.signals, signals);
        assert!(!set.overflows());

        let pages = paginate(&epoch, Constellation::GPS, set.signals);
        assert_eq!(pages.len(), page_count(satellites, signals));

        let per_page = satellites_per_page(signals);
        for (i, page) in pages.iter().enumerate() {
            assert!(page.len() * signals <= Framing::SIGNAL_CAPACITY);
            if i + 1 < pages.len() {
                assert_eq!(page.len(), per_page);
            } else {
                assert!(!page.is_empty());
            }
        }

        let flattened = pages
            .iter()
            .flat_map(|page| page.records().iter().map(|obs| obs.sv))
            .collect::<Vec<_>>();
        let expected = epoch.iter().map(|obs| obs.sv).collect::<Vec<_>>();
        assert_eq!(flattened, expected);
    }
}

#[test]
fn esbc_stream() {
    let set = ObservationSet::from_file(
        &test_resource("OBS/V3/ESBC00DNK_R_20201770000_01D_30S_MO.rnx"),
        &ReadOptions::default(),
    )
    .unwrap();

    let codec = Rtcm3Codec::new(12, set.station.clone()).with_glonass_channels(&set.glo_fcn);

    let data = SharedBuffer::default();
    let mux = Multiplexer::new(Primary::Fast {
        data: Box::new(WriterTransport::new(data.clone())),
        tags: None,
        clock: VirtualClock::default(),
    });

    let messages = [1006, 1077, 1087, 1097, 1127]
        .into_iter()
        .map(MessageType::new)
        .collect::<Vec<_>>();

    let mut session = Session::new(&messages, codec, mux);
    let report = session.run(&set.records);
    let report_bytes = report.bytes;
    let _ = session.close();

    assert_eq!(report.epochs, 3);
    assert_eq!(report.counters.refusals, 0);
    assert_eq!(report.counters.skipped, 0);
    assert_eq!(report.paced_ms, 60_000);
    assert_eq!(report_bytes as usize, data.len());

    let counts = report
        .counters
        .messages
        .iter()
        .map(|(msg, count)| (msg.number(), *count))
        .collect::<Vec<_>>();
    assert_eq!(counts, vec![(1006, 3), (1077, 3), (1087, 2), (1097, 3)]);

    let frames = frames(&data.bytes());
    let numbers = frames.iter().map(|(number, _)| *number).collect::<Vec<_>>();
    assert_eq!(
        numbers,
        vec![
            1006, 1077, 1087, 1097, // 00:00:00
            1006, 1077, 1087, 1097, // 00:00:30
            1006, 1077, 1097, // 00:01:00
        ]
    );

    let msm_sync = frames
        .iter()
        .filter(|(number, _)| *number != 1006)
        .map(|(_, sync)| *sync)
        .collect::<Vec<_>>();
    assert_eq!(
        msm_sync,
        vec![true, true, false, true, true, false, true, false]
    );
}

#[test]
fn dense_epoch_stream() {
    // 40 satellites x 4 signals: 16 satellites per page
    let t = Epoch::from_gpst_seconds(1.0E9);
    let epoch = synthetic_gps_epoch(t, 40, &["1C", "2W", "2L", "5Q"]);

    let data = SharedBuffer::default();
    let mux = Multiplexer::new(Primary::Fast {
        data: Box::new(WriterTransport::new(data.clone())),
        tags: None,
        clock: VirtualClock::default(),
    });

    let codec = Rtcm3Codec::new(1, Default::default());
    let mut session = Session::new(&[MessageType::new(1077)], codec, mux);
    let report = session.run(&epoch);
    let _ = session.close();

    assert_eq!(report.counters.messages.get(&MessageType::new(1077)), Some(&3));
    assert_eq!(
        frames(&data.bytes()),
        vec![(1077, true), (1077, true), (1077, false)]
    );
}
