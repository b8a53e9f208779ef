//! Page splitting: bounds the signal cells carried by one message.
use num_integer::div_ceil;

use crate::{constants::Framing, observation::Observation, prelude::Constellation};

/// [Page] is the subset of one constellation's satellites
/// carried by a single encoded message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<'a> {
    records: Vec<&'a Observation>,
}

impl<'a> Page<'a> {
    /// Builds a [Page] from already selected records.
    pub fn new(records: Vec<&'a Observation>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[&'a Observation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Maximal number of satellites per page, for given number of signals.
/// Returns 0 when no signal is present.
pub fn satellites_per_page(signals: usize) -> usize {
    if signals == 0 {
        0
    } else {
        Framing::SIGNAL_CAPACITY / signals
    }
}

/// Number of pages needed to carry `satellites`, for given number of signals.
/// A set with no signal still counts as one (empty) page.
pub fn page_count(satellites: usize, signals: usize) -> usize {
    match satellites_per_page(signals) {
        0 => 1,
        per_page => div_ceil(satellites, per_page),
    }
}

/// Splits the records of targeted [Constellation] into successive [Page]s
/// of at most [satellites_per_page] satellites. Order is preserved and
/// every record lands in exactly one page. When `signals` is zero,
/// a single empty page is returned.
pub fn paginate<'a>(
    epoch: &'a [Observation],
    constellation: Constellation,
    signals: usize,
) -> Vec<Page<'a>> {
    let per_page = satellites_per_page(signals);
    if per_page == 0 {
        return vec![Page::default()];
    }

    let records = epoch
        .iter()
        .filter(|obs| obs.is_constellation(constellation))
        .collect::<Vec<_>>();

    records
        .chunks(per_page)
        .map(|chunk| Page::new(chunk.to_vec()))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        prelude::{Constellation, Epoch},
        tests::toolkit::{gps_observation, sv, synthetic_gps_epoch},
    };

    #[test]
    fn pages_per_signal_count() {
        assert_eq!(satellites_per_page(0), 0);
        assert_eq!(satellites_per_page(1), 64);
        assert_eq!(satellites_per_page(3), 21);
        assert_eq!(satellites_per_page(64), 1);
        assert_eq!(satellites_per_page(65), 0);

        assert_eq!(page_count(4, 3), 1);
        assert_eq!(page_count(200, 1), 4);
        assert_eq!(page_count(0, 0), 1);
        assert_eq!(page_count(0, 2), 0);
        assert_eq!(page_count(22, 3), 2);
        assert_eq!(page_count(64, 64), 64);
    }

    #[test]
    fn four_satellites_three_signals() {
        let t = Epoch::from_gpst_seconds(0.0);
        let epoch = vec![
            gps_observation(t, sv("G01"), &["1C", "2W"]),
            gps_observation(t, sv("G02"), &["1C", "5Q"]),
            gps_observation(t, sv("G03"), &["1C"]),
            gps_observation(t, sv("G04"), &["2W"]),
        ];
        let pages = paginate(&epoch, Constellation::GPS, 3);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 4);
    }

    #[test]
    fn stable_split() {
        let t = Epoch::from_gpst_seconds(0.0);
        let epoch = synthetic_gps_epoch(t, 200, &["1C"]);

        let pages = paginate(&epoch, Constellation::GPS, 1);
        assert_eq!(pages.len(), 4);
        assert_eq!(
            pages.iter().map(|p| p.len()).collect::<Vec<_>>(),
            vec![64, 64, 64, 8]
        );

        let rebuilt = pages
            .iter()
            .flat_map(|p| p.records().iter().copied())
            .collect::<Vec<_>>();

        assert_eq!(rebuilt.len(), epoch.len());
        for (a, b) in rebuilt.iter().zip(epoch.iter()) {
            assert!(std::ptr::eq(*a, b));
        }
    }

    #[test]
    fn other_constellations_filtered_out() {
        let t = Epoch::from_gpst_seconds(0.0);
        let epoch = vec![
            gps_observation(t, sv("G01"), &["1C"]),
            gps_observation(t, sv("E01"), &["1C"]),
            gps_observation(t, sv("G02"), &["1C"]),
        ];
        let pages = paginate(&epoch, Constellation::GPS, 1);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].records()[1].sv, sv("G02"));

        let pages = paginate(&epoch, Constellation::BeiDou, 0);
        assert_eq!(pages, vec![Page::default()]);
    }
}
