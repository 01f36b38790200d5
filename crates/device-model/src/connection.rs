//! Physical video connectors and the round-robin connector search.
//!
//! Format auto-detection only works on the connector an input is switched
//! to, so a device with several connectors has to be searched: whenever a
//! poll finds no signal, the input moves on to the next connector.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A physical input connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoConnection {
    /// No connector selected (device has no signal monitor or no inputs).
    #[default]
    Unspecified,
    Sdi,
    Hdmi,
    OpticalSdi,
    Component,
    Composite,
    #[serde(rename = "svideo")]
    SVideo,
}

impl VideoConnection {
    /// Every real connector, in bit order.
    pub const ALL: [VideoConnection; 6] = [
        VideoConnection::Sdi,
        VideoConnection::Hdmi,
        VideoConnection::OpticalSdi,
        VideoConnection::Component,
        VideoConnection::Composite,
        VideoConnection::SVideo,
    ];

    /// Driver-level connector code (one bit per connector, 0 = unspecified).
    pub fn code(self) -> u32 {
        match self {
            VideoConnection::Unspecified => 0,
            VideoConnection::Sdi => 1 << 0,
            VideoConnection::Hdmi => 1 << 1,
            VideoConnection::OpticalSdi => 1 << 2,
            VideoConnection::Component => 1 << 3,
            VideoConnection::Composite => 1 << 4,
            VideoConnection::SVideo => 1 << 5,
        }
    }

    /// Map a single connector code back; unknown codes become `Unspecified`.
    pub fn from_code(code: u32) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .unwrap_or(VideoConnection::Unspecified)
    }

    /// Split a connector bit mask into connectors, in bit order.
    pub fn from_mask(mask: u32) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|c| mask & c.code() != 0)
            .collect()
    }

    /// Human-readable label. Empty for `Unspecified`.
    pub fn label(self) -> &'static str {
        match self {
            VideoConnection::Unspecified => "",
            VideoConnection::Sdi => "SDI",
            VideoConnection::Hdmi => "HDMI",
            VideoConnection::OpticalSdi => "Optical SDI",
            VideoConnection::Component => "Component",
            VideoConnection::Composite => "Composite",
            VideoConnection::SVideo => "S-Video",
        }
    }
}

impl fmt::Display for VideoConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Round-robin search position over a device's connectors.
///
/// The only state is the index of the connector currently probed. There is
/// no timer: the caller decides when to [`advance`](Self::advance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCycler {
    connectors: Vec<VideoConnection>,
    index: usize,
}

impl ConnectionCycler {
    /// Start the search at the first connector.
    pub fn new(connectors: impl IntoIterator<Item = VideoConnection>) -> Self {
        let mut unique: Vec<VideoConnection> = Vec::new();
        for connector in connectors {
            if connector != VideoConnection::Unspecified && !unique.contains(&connector) {
                unique.push(connector);
            }
        }
        Self {
            connectors: unique,
            index: 0,
        }
    }

    /// Start the search at `current`, or at the first connector if
    /// `current` is not one of `connectors`.
    pub fn starting_at(
        connectors: impl IntoIterator<Item = VideoConnection>,
        current: VideoConnection,
    ) -> Self {
        let mut cycler = Self::new(connectors);
        if let Some(index) = cycler.connectors.iter().position(|c| *c == current) {
            cycler.index = index;
        }
        cycler
    }

    /// Connector currently probed, or `Unspecified` when there are none.
    pub fn current(&self) -> VideoConnection {
        self.connectors
            .get(self.index)
            .copied()
            .unwrap_or(VideoConnection::Unspecified)
    }

    /// Move to the next connector, wrapping around. Returns the new one.
    pub fn advance(&mut self) -> VideoConnection {
        if !self.connectors.is_empty() {
            self.index = (self.index + 1) % self.connectors.len();
        }
        self.current()
    }

    /// Number of connectors searched.
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Whether there is nothing to search.
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Connectors in search order.
    pub fn connectors(&self) -> &[VideoConnection] {
        &self.connectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mask_splits_in_bit_order() {
        let mask = VideoConnection::Hdmi.code() | VideoConnection::Sdi.code();
        assert_eq!(
            VideoConnection::from_mask(mask),
            vec![VideoConnection::Sdi, VideoConnection::Hdmi]
        );
        assert!(VideoConnection::from_mask(0).is_empty());
    }

    #[test]
    fn unknown_code_is_unspecified() {
        assert_eq!(VideoConnection::from_code(4), VideoConnection::OpticalSdi);
        assert_eq!(VideoConnection::from_code(3), VideoConnection::Unspecified);
        assert_eq!(VideoConnection::Unspecified.to_string(), "");
    }

    #[test]
    fn empty_cycler_stays_unspecified() {
        let mut cycler = ConnectionCycler::new([]);
        for _ in 0..5 {
            assert_eq!(cycler.advance(), VideoConnection::Unspecified);
        }
        assert!(cycler.is_empty());
    }

    #[test]
    fn duplicates_and_unspecified_are_dropped() {
        let cycler = ConnectionCycler::new([
            VideoConnection::Sdi,
            VideoConnection::Unspecified,
            VideoConnection::Hdmi,
            VideoConnection::Sdi,
        ]);
        assert_eq!(
            cycler.connectors(),
            &[VideoConnection::Sdi, VideoConnection::Hdmi]
        );
    }

    #[test]
    fn starts_at_the_current_connector() {
        let mut cycler = ConnectionCycler::starting_at(
            [
                VideoConnection::Sdi,
                VideoConnection::Hdmi,
                VideoConnection::Component,
            ],
            VideoConnection::Hdmi,
        );
        assert_eq!(cycler.current(), VideoConnection::Hdmi);
        assert_eq!(cycler.advance(), VideoConnection::Component);
        assert_eq!(cycler.advance(), VideoConnection::Sdi);
    }

    #[test]
    fn serde_names_are_stable() {
        let json = serde_json::to_string(&[VideoConnection::OpticalSdi, VideoConnection::SVideo])
            .unwrap();
        assert_eq!(json, r#"["optical_sdi","svideo"]"#);
    }

    fn connector_set() -> impl Strategy<Value = Vec<VideoConnection>> {
        proptest::sample::subsequence(VideoConnection::ALL.to_vec(), 1..=6)
    }

    proptest! {
        #[test]
        fn full_cycle_visits_every_connector_once(
            connectors in connector_set(),
            start in 0usize..6,
        ) {
            let start = connectors[start % connectors.len()];
            let mut cycler = ConnectionCycler::starting_at(connectors.clone(), start);
            let n = cycler.len();

            let mut visited = vec![cycler.current()];
            for _ in 0..n {
                visited.push(cycler.advance());
            }

            // Back at the start after exactly N steps.
            prop_assert_eq!(visited[n], start);
            let mut seen = visited[..n].to_vec();
            seen.sort_by_key(|c| c.code());
            let mut expected = connectors.clone();
            expected.sort_by_key(|c| c.code());
            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn visiting_order_is_fixed(connectors in connector_set()) {
            let mut a = ConnectionCycler::new(connectors.clone());
            let mut b = ConnectionCycler::new(connectors);
            for _ in 0..20 {
                prop_assert_eq!(a.advance(), b.advance());
            }
        }
    }
}
