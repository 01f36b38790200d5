//! Per-device prober: capability detection, status queries, and teardown.
//!
//! A [`DeviceProber`] wraps one hardware handle. Capability flags are
//! queried once, at construction; a [`SignalMonitor`] exists if and only if
//! the device can both capture and auto-detect its input format. Probers are
//! shared through [`ProberHandle`], whose last release tears everything down
//! in a fixed order: attributes, then the monitor (stopped and required to
//! quiesce), then the hardware handle.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use rigscan_common::error::{RigscanError, RigscanResult};
use rigscan_device_model::{
    CapabilityAttributes, CapabilityFlag, CaptureDevice, DeviceHandle, InputFrame, PixelFormat,
    SignalMonitor, VideoConnection,
};

/// One capture device together with its capability flags and optional
/// signal monitor.
pub struct DeviceProber {
    device: Option<DeviceHandle>,
    attributes: Option<Box<dyn CapabilityAttributes>>,
    monitor: Option<Box<dyn SignalMonitor>>,
    can_input: bool,
    can_autodetect: bool,
}

impl DeviceProber {
    /// Run capability detection for `device` and start its signal monitor
    /// when the device supports one.
    pub fn new(device: DeviceHandle) -> RigscanResult<Self> {
        let attributes = device.query_attributes()?;
        let can_input = query_can_input(device.as_ref());
        let can_autodetect = attributes.flag(CapabilityFlag::SupportsInputFormatDetection)?;
        tracing::debug!(can_input, can_autodetect, "Queried device capabilities");

        let monitor = if can_input && can_autodetect {
            tracing::debug!("Creating signal monitor");
            let monitor = device.create_signal_monitor()?;
            monitor.start()?;
            Some(monitor)
        } else {
            None
        };

        Ok(Self {
            device: Some(device),
            attributes: Some(attributes),
            monitor,
            can_input,
            can_autodetect,
        })
    }

    /// Display name of the device.
    pub fn device_name(&self) -> RigscanResult<String> {
        match &self.device {
            Some(device) => device.display_name(),
            None => Err(RigscanError::display_name("device already released")),
        }
    }

    /// The wrapped hardware handle; `None` only once torn down.
    pub fn device(&self) -> Option<&DeviceHandle> {
        self.device.as_ref()
    }

    pub fn can_autodetect(&self) -> bool {
        self.can_autodetect
    }

    pub fn can_input(&self) -> bool {
        self.can_input
    }

    /// Whether a signal monitor is running for this device.
    pub fn has_monitor(&self) -> bool {
        self.monitor.is_some()
    }

    pub fn signal_detected(&self) -> bool {
        self.monitor.as_ref().is_some_and(|m| m.signal_detected())
    }

    pub fn is_sub_device(&self) -> bool {
        self.monitor.as_ref().is_some_and(|m| m.is_sub_device())
    }

    /// Detected display mode, or an empty string unless a signal is
    /// detected right now.
    ///
    /// Detection is re-checked on every call; a caller that read
    /// [`signal_detected`](Self::signal_detected) earlier may see the
    /// signal drop in between.
    pub fn detected_mode(&self) -> String {
        match &self.monitor {
            Some(monitor) if monitor.signal_detected() => monitor.detected_mode(),
            _ => String::new(),
        }
    }

    /// Detected pixel format, or [`PixelFormat::UNKNOWN`] unless a signal
    /// is detected right now.
    pub fn pixel_format(&self) -> PixelFormat {
        match &self.monitor {
            Some(monitor) if monitor.signal_detected() => monitor.pixel_format(),
            _ => PixelFormat::UNKNOWN,
        }
    }

    pub fn last_frame(&self) -> Option<InputFrame> {
        self.monitor.as_ref().and_then(|m| m.last_frame())
    }

    /// Connector currently probed, or `Unspecified` without a monitor.
    pub fn active_connection(&self) -> VideoConnection {
        self.monitor
            .as_ref()
            .map_or(VideoConnection::Unspecified, |m| m.active_connection())
    }

    /// Move the search to the next connector. No-op without a monitor.
    pub fn select_next_connection(&self) {
        if let Some(monitor) = &self.monitor {
            monitor.select_next_connection();
        }
    }

    /// Release held resources in order. Safe to call more than once; later
    /// calls find nothing left to release.
    fn teardown(&mut self) -> RigscanResult<()> {
        let mut first_error: Option<RigscanError> = None;

        if self.attributes.take().is_some() {
            tracing::debug!("Released capability attributes");
        }

        if let Some(monitor) = self.monitor.take() {
            tracing::debug!("Releasing signal monitor");
            if let Err(e) = monitor.stop() {
                first_error.get_or_insert(e);
            }
            let remaining = monitor.release();
            if remaining != 0 {
                first_error.get_or_insert(RigscanError::MonitorNotQuiescent {
                    device: self.label(),
                    remaining,
                });
            }
        }

        if self.device.take().is_some() {
            tracing::debug!("Released hardware handle");
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn label(&self) -> String {
        self.device_name()
            .unwrap_or_else(|_| "<unnamed device>".to_string())
    }
}

impl Drop for DeviceProber {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            tracing::error!(error = %e, "Device prober teardown failed");
        }
    }
}

impl fmt::Debug for DeviceProber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceProber")
            .field("can_input", &self.can_input)
            .field("can_autodetect", &self.can_autodetect)
            .field("has_monitor", &self.has_monitor())
            .finish()
    }
}

/// Presence test: the input interface is acquired and dropped at once.
fn query_can_input(device: &dyn CaptureDevice) -> bool {
    match device.acquire_input() {
        Some(input) => {
            tracing::debug!(
                connections = input.supported_connections().len(),
                "Device has a video input"
            );
            true
        }
        None => false,
    }
}

/// What a call to [`ProberHandle::release`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Other handles still share the prober.
    Shared { remaining: usize },
    /// This was the last handle; the prober has been torn down.
    TornDown,
}

/// Shared, reference-counted handle to a [`DeviceProber`].
///
/// A new handle starts with a count of one. `clone` adds a reference;
/// [`release`](Self::release) (or dropping the handle) removes one. The
/// release that brings the count to zero tears the prober down exactly once.
#[derive(Clone)]
pub struct ProberHandle {
    inner: Arc<DeviceProber>,
}

impl ProberHandle {
    /// Construct a prober for `device`.
    pub fn probe(device: DeviceHandle) -> RigscanResult<Self> {
        Ok(Self {
            inner: Arc::new(DeviceProber::new(device)?),
        })
    }

    /// Number of handles currently sharing the prober.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both handles share the same prober.
    pub fn ptr_eq(&self, other: &ProberHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Give up this reference. The last one tears the prober down and
    /// reports teardown failures, such as a monitor that did not quiesce.
    ///
    /// Concurrent releases of the last handles are decided atomically:
    /// exactly one of them observes `TornDown`. The `remaining` count of a
    /// `Shared` outcome is read before the decrement and is advisory.
    pub fn release(self) -> RigscanResult<ReleaseOutcome> {
        let others = Arc::strong_count(&self.inner).saturating_sub(1).max(1);
        match Arc::into_inner(self.inner) {
            Some(mut prober) => {
                prober.teardown()?;
                Ok(ReleaseOutcome::TornDown)
            }
            None => Ok(ReleaseOutcome::Shared { remaining: others }),
        }
    }
}

impl Deref for ProberHandle {
    type Target = DeviceProber;

    fn deref(&self) -> &DeviceProber {
        &self.inner
    }
}

impl fmt::Debug for ProberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProberHandle")
            .field("ref_count", &self.ref_count())
            .field("prober", &*self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rigscan_device_model::InputInterface;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Mutex, OnceLock, Weak};

    type EventLog = Arc<Mutex<Vec<String>>>;

    fn record(log: &EventLog, event: impl Into<String>) {
        log.lock().unwrap().push(event.into());
    }

    #[derive(Default)]
    struct FakeConfig {
        no_attributes: bool,
        no_input: bool,
        autodetect: Option<bool>,
        leaks_reference: bool,
    }

    struct FakeDevice {
        config: FakeConfig,
        log: EventLog,
        detected: Arc<AtomicBool>,
        selections: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        myself: OnceLock<Weak<FakeDevice>>,
    }

    struct Fixture {
        device: DeviceHandle,
        weak: Weak<FakeDevice>,
        log: EventLog,
        detected: Arc<AtomicBool>,
        selections: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    fn fixture(config: FakeConfig) -> Fixture {
        let log = EventLog::default();
        let detected = Arc::new(AtomicBool::new(false));
        let selections = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let device = Arc::new(FakeDevice {
            config,
            log: log.clone(),
            detected: detected.clone(),
            selections: selections.clone(),
            stops: stops.clone(),
            myself: OnceLock::new(),
        });
        let weak = Arc::downgrade(&device);
        device.myself.set(weak.clone()).unwrap();
        Fixture {
            device,
            weak,
            log,
            detected,
            selections,
            stops,
        }
    }

    fn capable() -> FakeConfig {
        FakeConfig {
            autodetect: Some(true),
            ..FakeConfig::default()
        }
    }

    impl Drop for FakeDevice {
        fn drop(&mut self) {
            record(&self.log, "device released");
        }
    }

    impl CaptureDevice for FakeDevice {
        fn display_name(&self) -> RigscanResult<String> {
            Ok("Fake Capture".to_string())
        }

        fn query_attributes(&self) -> RigscanResult<Box<dyn CapabilityAttributes>> {
            if self.config.no_attributes {
                return Err(RigscanError::capability("Fake Capture", "no attributes"));
            }
            Ok(Box::new(FakeAttributes {
                autodetect: self.config.autodetect,
                log: self.log.clone(),
            }))
        }

        fn acquire_input(&self) -> Option<Box<dyn InputInterface>> {
            (!self.config.no_input).then(|| Box::new(FakeInput) as Box<dyn InputInterface>)
        }

        fn create_signal_monitor(&self) -> RigscanResult<Box<dyn SignalMonitor>> {
            Ok(Box::new(FakeMonitor {
                device: self.myself.get().cloned().unwrap_or_default(),
                log: self.log.clone(),
                detected: self.detected.clone(),
                selections: self.selections.clone(),
                stops: self.stops.clone(),
                leaks_reference: self.config.leaks_reference,
            }))
        }
    }

    struct FakeAttributes {
        autodetect: Option<bool>,
        log: EventLog,
    }

    impl Drop for FakeAttributes {
        fn drop(&mut self) {
            record(&self.log, "attributes released");
        }
    }

    impl CapabilityAttributes for FakeAttributes {
        fn flag(&self, _flag: CapabilityFlag) -> RigscanResult<bool> {
            self.autodetect
                .ok_or_else(|| RigscanError::capability("Fake Capture", "flag unreadable"))
        }
    }

    struct FakeInput;

    impl InputInterface for FakeInput {
        fn supported_connections(&self) -> Vec<VideoConnection> {
            vec![VideoConnection::Sdi]
        }
    }

    const FAKE_FRAME: InputFrame = InputFrame {
        sequence: 42,
        width: 1920,
        height: 1080,
        row_bytes: 5120,
    };

    struct FakeMonitor {
        device: Weak<FakeDevice>,
        log: EventLog,
        detected: Arc<AtomicBool>,
        selections: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        leaks_reference: bool,
    }

    impl SignalMonitor for FakeMonitor {
        fn start(&self) -> RigscanResult<()> {
            record(&self.log, "monitor started");
            Ok(())
        }

        fn stop(&self) -> RigscanResult<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            record(
                &self.log,
                format!("monitor stopped (device refs: {})", self.device.strong_count()),
            );
            Ok(())
        }

        fn signal_detected(&self) -> bool {
            self.detected.load(Ordering::SeqCst)
        }

        fn detected_mode(&self) -> String {
            "1080i59.94".to_string()
        }

        fn pixel_format(&self) -> PixelFormat {
            PixelFormat(7)
        }

        fn last_frame(&self) -> Option<InputFrame> {
            self.detected.load(Ordering::SeqCst).then_some(FAKE_FRAME)
        }

        fn active_connection(&self) -> VideoConnection {
            VideoConnection::Sdi
        }

        fn select_next_connection(&self) {
            self.selections.fetch_add(1, Ordering::SeqCst);
        }

        fn is_sub_device(&self) -> bool {
            false
        }

        fn release(self: Box<Self>) -> usize {
            record(&self.log, "monitor released");
            usize::from(self.leaks_reference)
        }
    }

    #[test]
    fn monitor_exists_only_with_input_and_autodetect() {
        let cases = [
            (capable(), true),
            (
                FakeConfig {
                    autodetect: Some(false),
                    ..FakeConfig::default()
                },
                false,
            ),
            (
                FakeConfig {
                    no_input: true,
                    ..capable()
                },
                false,
            ),
        ];
        for (config, expect_monitor) in cases {
            let f = fixture(config);
            let prober = ProberHandle::probe(f.device).unwrap();
            assert_eq!(prober.has_monitor(), expect_monitor);
            assert_eq!(
                prober.has_monitor(),
                prober.can_input() && prober.can_autodetect()
            );
        }
    }

    #[test]
    fn missing_attributes_fail_construction() {
        let f = fixture(FakeConfig {
            no_attributes: true,
            ..capable()
        });
        let err = ProberHandle::probe(f.device).unwrap_err();
        assert!(matches!(err, RigscanError::CapabilityQuery { .. }));
        // Construction failure still gives the handle back.
        assert_eq!(f.weak.strong_count(), 0);
    }

    #[test]
    fn unreadable_autodetect_flag_fails_construction() {
        let f = fixture(FakeConfig::default());
        let err = ProberHandle::probe(f.device).unwrap_err();
        assert!(matches!(err, RigscanError::CapabilityQuery { .. }));
    }

    #[test]
    fn teardown_runs_in_order_with_the_handle_last() {
        let f = fixture(capable());
        let prober = ProberHandle::probe(f.device).unwrap();
        assert_eq!(prober.release().unwrap(), ReleaseOutcome::TornDown);

        let log = f.log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                "monitor started",
                "attributes released",
                "monitor stopped (device refs: 1)",
                "monitor released",
                "device released",
            ]
        );
        assert_eq!(f.weak.strong_count(), 0);
    }

    #[test]
    fn non_quiescent_monitor_is_reported_and_handle_still_released() {
        let f = fixture(FakeConfig {
            leaks_reference: true,
            ..capable()
        });
        let prober = ProberHandle::probe(f.device).unwrap();
        let err = prober.release().unwrap_err();
        assert!(matches!(
            err,
            RigscanError::MonitorNotQuiescent { remaining: 1, .. }
        ));
        assert_eq!(f.weak.strong_count(), 0);
    }

    #[test]
    fn shared_release_does_not_tear_down() {
        let f = fixture(capable());
        let prober = ProberHandle::probe(f.device).unwrap();
        let other = prober.clone();
        assert_eq!(prober.ref_count(), 2);

        assert_eq!(
            prober.release().unwrap(),
            ReleaseOutcome::Shared { remaining: 1 }
        );
        assert_eq!(f.stops.load(Ordering::SeqCst), 0);
        assert_eq!(other.ref_count(), 1);

        assert_eq!(other.release().unwrap(), ReleaseOutcome::TornDown);
        assert_eq!(f.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_the_last_handle_tears_down() {
        let f = fixture(capable());
        let prober = ProberHandle::probe(f.device).unwrap();
        drop(prober);
        assert_eq!(f.stops.load(Ordering::SeqCst), 1);
        assert_eq!(f.weak.strong_count(), 0);
    }

    #[test]
    fn select_next_without_monitor_is_a_no_op() {
        let f = fixture(FakeConfig {
            no_input: true,
            ..capable()
        });
        let prober = ProberHandle::probe(f.device).unwrap();
        for _ in 0..10 {
            prober.select_next_connection();
        }
        assert_eq!(f.selections.load(Ordering::SeqCst), 0);
        assert!(!prober.signal_detected());
        assert_eq!(prober.active_connection(), VideoConnection::Unspecified);
        assert_eq!(prober.detected_mode(), "");
        assert!(prober.pixel_format().is_unknown());
        assert!(prober.last_frame().is_none());
        assert!(!prober.is_sub_device());
    }

    #[test]
    fn mode_and_format_follow_detection() {
        let f = fixture(capable());
        let prober = ProberHandle::probe(f.device).unwrap();

        assert_eq!(prober.detected_mode(), "");
        assert_eq!(prober.pixel_format(), PixelFormat::UNKNOWN);

        f.detected.store(true, Ordering::SeqCst);
        assert_eq!(prober.detected_mode(), "1080i59.94");
        assert_eq!(prober.pixel_format(), PixelFormat(7));

        f.detected.store(false, Ordering::SeqCst);
        assert_eq!(prober.detected_mode(), "");
        assert_eq!(prober.pixel_format(), PixelFormat::UNKNOWN);
    }

    #[test]
    fn last_frame_comes_from_the_monitor() {
        let f = fixture(capable());
        let prober = ProberHandle::probe(f.device).unwrap();
        assert_eq!(prober.last_frame(), None);

        f.detected.store(true, Ordering::SeqCst);
        assert_eq!(prober.last_frame(), Some(FAKE_FRAME));
    }

    #[test]
    fn concurrent_last_releases_tear_down_exactly_once() {
        use std::sync::Barrier;

        for _ in 0..2_000 {
            let f = fixture(capable());
            let first = ProberHandle::probe(f.device).unwrap();
            let second = first.clone();
            let barrier = Arc::new(Barrier::new(2));

            let outcomes: Vec<ReleaseOutcome> = [first, second]
                .into_iter()
                .map(|handle| {
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        handle.release().unwrap()
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|worker| worker.join().unwrap())
                .collect();

            let torn_down = outcomes
                .iter()
                .filter(|o| **o == ReleaseOutcome::TornDown)
                .count();
            assert_eq!(torn_down, 1, "outcomes: {outcomes:?}");
            assert_eq!(f.stops.load(Ordering::SeqCst), 1);
            assert_eq!(f.weak.strong_count(), 0);
        }
    }

    proptest! {
        #[test]
        fn ref_count_tracks_net_clones(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
            let f = fixture(capable());
            let root = ProberHandle::probe(f.device).unwrap();
            let mut extra: Vec<ProberHandle> = Vec::new();

            for add in ops {
                if add {
                    extra.push(root.clone());
                } else if let Some(handle) = extra.pop() {
                    let outcome = handle.release().unwrap();
                    prop_assert!(matches!(outcome, ReleaseOutcome::Shared { .. }), "expected ReleaseOutcome::Shared");
                }
                prop_assert_eq!(root.ref_count(), 1 + extra.len());
                prop_assert_eq!(f.stops.load(Ordering::SeqCst), 0);
            }

            for handle in extra.drain(..) {
                prop_assert!(matches!(handle.release().unwrap(), ReleaseOutcome::Shared { .. }), "expected ReleaseOutcome::Shared");
            }
            prop_assert_eq!(root.release().unwrap(), ReleaseOutcome::TornDown);
            prop_assert_eq!(f.stops.load(Ordering::SeqCst), 1);
        }
    }
}
