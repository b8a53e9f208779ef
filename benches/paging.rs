//! Benchmarking epoch paging & RTCM3 framing
//! using a dense multi constellation epoch
extern crate criterion;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::{path::Path, str::FromStr};

use rnx2rtcm::{
    page::paginate,
    prelude::*,
    sequencer::{Counters, Sequencer},
    signal::SignalSet,
};

fn dense_epoch(t: Epoch) -> Vec<Observation> {
    let mut epoch = Vec::new();
    for (constellation, satellites, codes) in [
        (Constellation::GPS, 32, ["1C", "2W", "2L", "5Q"]),
        (Constellation::Galileo, 36, ["1C", "5Q", "7Q", "8Q"]),
        (Constellation::BeiDou, 46, ["2I", "6I", "7I", "5P"]),
    ] {
        for prn in 1..=satellites {
            let mut obs = Observation::new(t, SV::new(constellation, prn));
            for (i, code) in codes.iter().enumerate() {
                let pr = 2.2E7 + 1.0E3 * prn as f64 + i as f64;
                obs = obs.with_signal(
                    Signal::new(Code::from_str(code).unwrap())
                        .with_pseudorange(pr)
                        .with_phase(pr / 0.2)
                        .with_snr(42.0),
                );
            }
            epoch.push(obs);
        }
    }
    epoch.sort_by(|a, b| a.sv.cmp(&b.sv));
    epoch
}

fn benchmark(c: &mut Criterion) {
    let t = Epoch::from_gpst_seconds(1.0E9);
    let epoch = dense_epoch(t);

    let mut paging_grp = c.benchmark_group("paging");

    paging_grp.bench_function("analyze+paginate", |b| {
        b.iter(|| {
            for constellation in [
                Constellation::GPS,
                Constellation::Galileo,
                Constellation::BeiDou,
            ] {
                let set = SignalSet::analyze(black_box(&epoch), constellation);
                black_box(paginate(&epoch, constellation, set.signals));
            }
        })
    });

    paging_grp.finish();

    let mut framing_grp = c.benchmark_group("framing");

    let messages = [1006, 1077, 1097, 1127].map(MessageType::new);
    let sequencer = Sequencer::new(&messages);
    let station = Station::new("BENCH").with_position(3582105.291, 532589.7313, 5232754.8054);
    let mut codec = Rtcm3Codec::new(1, station);
    let mut counters = Counters::default();

    framing_grp.bench_function("MSM7", |b| {
        b.iter(|| {
            let mut size = 0;
            sequencer.run(&mut codec, black_box(&epoch), &mut counters, |emission| {
                size += emission.bytes.len();
            });
            black_box(size);
        })
    });

    framing_grp.finish();

    let mut parsing_grp = c.benchmark_group("parsing");

    parsing_grp.bench_function("OBS/V3", |b| {
        b.iter(|| {
            let set = ObservationSet::from_file(
                Path::new("test_resources/OBS/V3/ESBC00DNK_R_20201770000_01D_30S_MO.rnx"),
                &ReadOptions::default(),
            )
            .unwrap();
            black_box(set);
        })
    });

    parsing_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
