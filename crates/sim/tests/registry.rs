use std::sync::Arc;
use std::time::{Duration, Instant};

use rigscan_common::error::RigscanError;
use rigscan_device_model::{CapabilityFlag, HardwareRegistry, PixelFormat, VideoConnection};
use rigscan_sim::{SimulatedDeviceSpec, SimulatedRegistry, SimulatedRig};

#[test]
fn enumerates_devices_in_rig_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rig.json");
    std::fs::write(
        &path,
        r#"{"devices":[
            {"name":"DeckLink Duo (1)","connections":["sdi"]},
            {"name":"DeckLink Duo (2)","sub_device":true},
            {"name":"Intensity Pro 4K","connections":["hdmi","component","composite"]}
        ]}"#,
    )
    .unwrap();

    let mut registry = SimulatedRegistry::from_rig(SimulatedRig::from_file(&path).unwrap());
    assert_eq!(registry.name(), "simulated");
    let devices = registry.enumerate().unwrap();
    let names: Vec<String> = devices
        .iter()
        .map(|d| d.display_name().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["DeckLink Duo (1)", "DeckLink Duo (2)", "Intensity Pro 4K"]
    );
    for device in &devices {
        assert_eq!(Arc::strong_count(device), 1);
    }
}

#[test]
fn missing_driver_fails_enumeration() {
    let mut registry = SimulatedRegistry::unavailable();
    let err = registry.enumerate().err().expect("expected enumerate to fail");
    assert!(matches!(err, RigscanError::DriverUnavailable { .. }));
    assert!(err.to_string().contains("capture drivers may not be installed"));
    assert!(registry.signal_control(0).is_none());
}

#[test]
fn hot_plug_is_visible_through_the_monitor() {
    let mut registry = SimulatedRegistry::from_specs(vec![SimulatedDeviceSpec {
        connections: vec![VideoConnection::Sdi, VideoConnection::Hdmi],
        frame_interval_ms: 1,
        ..SimulatedDeviceSpec::named("UltraStudio 4K")
    }]);
    let control = registry.signal_control(0).unwrap();
    let device = registry.enumerate().unwrap().remove(0);

    let attributes = device.query_attributes().unwrap();
    assert!(attributes
        .flag(CapabilityFlag::SupportsInputFormatDetection)
        .unwrap());

    let monitor = device.create_signal_monitor().unwrap();
    monitor.start().unwrap();
    assert!(!monitor.signal_detected());

    control.set_format("2160p25", PixelFormat::RGB_10BIT);
    control.plug(VideoConnection::Hdmi);
    assert!(!monitor.signal_detected());
    monitor.select_next_connection();
    assert!(monitor.signal_detected());
    assert_eq!(monitor.detected_mode(), "2160p25");
    assert_eq!(monitor.pixel_format(), PixelFormat::RGB_10BIT);

    let deadline = Instant::now() + Duration::from_secs(2);
    let frame = loop {
        if let Some(frame) = monitor.last_frame() {
            break frame;
        }
        assert!(Instant::now() < deadline, "no frame produced");
        std::thread::sleep(Duration::from_millis(2));
    };
    assert_eq!((frame.width, frame.height), (3840, 2160));

    control.unplug();
    assert!(!monitor.signal_detected());
    assert!(monitor.last_frame().is_none());

    monitor.stop().unwrap();
    assert_eq!(monitor.release(), 0);
}

#[test]
fn demo_rig_fixture_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/demo-rig.json");
    let rig = SimulatedRig::from_file(&path).unwrap();

    assert_eq!(rig.devices.len(), 4);
    assert!(rig.devices[1].sub_device);
    assert_eq!(rig.devices[0].pixel_format, PixelFormat::YUV_10BIT);
    assert_eq!(rig.devices[2].pixel_format, PixelFormat::YUV_8BIT);
    assert_eq!(rig.devices[2].connections.last(), Some(&VideoConnection::SVideo));
    assert!(!rig.devices[3].can_input);
}
