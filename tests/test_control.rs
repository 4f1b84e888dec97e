mod common;
use common::*;

fn slider_value(snapshot: &Snapshot, key: &str) -> Option<f32> {
    match snapshot.control(key).map(|c| &c.control) {
        Some(Control::Slider { value, .. }) => Some(*value),
        _ => None,
    }
}

fn switch_on(snapshot: &Snapshot, key: &str) -> Option<bool> {
    match snapshot.control(key).map(|c| &c.control) {
        Some(Control::Switch { on, .. }) => Some(*on),
        _ => None,
    }
}

#[tokio::test]
async fn volume_write_is_visible_immediately() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    bridge.apply_control("LineInLeft#Volume(dB)", "-3.5").await?;
    assert_eq!(
        device.sent_with_timeouts(),
        vec![("audio line_in_left volume set -3.5".to_string(), Duration::from_secs(3))]
    );

    let snapshot = bridge.poll_snapshot().await?;
    assert_eq!(snapshot.property("LineInLeft#Volume(dB)"), Some("-3.5"));
    assert_eq!(snapshot.property("LineInLeft#VolumeCurrentValue(dB)"), Some("-3"));
    assert_eq!(slider_value(&snapshot, "LineInLeft#Volume(dB)"), Some(-3.5));

    Ok(())
}

#[tokio::test]
async fn switch_write_lowercases_and_patches() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    bridge.apply_control("HDMIInRight#Mute", "1").await?;
    assert_eq!(device.sent(), vec!["audio hdmi_in_right mute on".to_string()]);

    let snapshot = bridge.poll_snapshot().await?;
    assert_eq!(snapshot.property("HDMIInRight#Mute"), Some("1"));
    assert_eq!(switch_on(&snapshot, "HDMIInRight#Mute"), Some(true));

    Ok(())
}

#[tokio::test]
async fn streaming_mode_write() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    bridge.apply_control("StreamingMode", "0").await?;
    assert_eq!(device.sent(), vec!["streaming mode set usb".to_string()]);
    assert_eq!(switch_on(&bridge.poll_snapshot().await?, "StreamingMode"), Some(false));

    Ok(())
}

#[tokio::test]
async fn rejected_write_changes_nothing() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;
    device.respond("video mute on", "Syntax error: unknown command\r\n");

    let err = bridge.apply_control("VideoMute", "1").await.unwrap_err();
    assert!(matches!(err, BridgeError::Rejected { .. }));

    let snapshot = bridge.last_snapshot().await.unwrap();
    assert_eq!(snapshot.property("VideoMute"), Some("0"));
    assert_eq!(switch_on(&snapshot, "VideoMute"), Some(false));

    // no priority delivery after a failure
    device.clear_sent();
    bridge.poll_snapshot().await?;
    assert_eq!(device.sent().len(), Factory::base_reads());

    Ok(())
}

#[tokio::test]
async fn write_without_ok_is_rejected() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;
    device.respond("video mute on", "\r\n");

    let err = bridge.apply_control("VideoMute", "1").await.unwrap_err();
    assert!(matches!(err, BridgeError::Rejected { .. }));

    device.fail("video mute off", Fault::Banner);
    let err = bridge.apply_control("VideoMute", "0").await.unwrap_err();
    assert!(matches!(err, BridgeError::Rejected { .. }));

    Ok(())
}

#[tokio::test]
async fn timeout_is_restored_after_failed_control() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;
    device.fail("video mute on", Fault::Timeout);

    let err = bridge.apply_control("VideoMute", "1").await.unwrap_err();
    assert!(matches!(err, BridgeError::Transport(TransportError::Timeout(t)) if t == Duration::from_secs(3)));

    device.clear_faults();
    bridge.poll_snapshot().await?;

    let sent = device.sent_with_timeouts();
    assert_eq!(sent[0], ("video mute on".to_string(), Duration::from_secs(3)));
    assert!(sent[1..].iter().all(|(_, timeout)| *timeout == Duration::from_secs(30)));
    assert_eq!(sent.len(), 1 + Factory::base_reads());

    Ok(())
}

#[tokio::test]
async fn master_mute_on_hides_output_mutes() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    bridge.apply_control("AudioMute", "1").await?;
    assert_eq!(device.sent(), vec!["audio mute on".to_string()]);

    let snapshot = bridge.poll_snapshot().await?;
    assert_eq!(snapshot.property("AudioMute"), Some("1"));
    for output in OUTPUTS.iter() {
        let key = format!("{}#Mute", output.group);
        assert_eq!(snapshot.property(&key), Some("On"));
        assert!(snapshot.control(&key).is_none());
    }
    for input in INPUTS.iter() {
        assert!(snapshot.control(&format!("{}#Mute", input.group)).is_some());
    }

    Ok(())
}

#[tokio::test]
async fn master_mute_off_rereads_outputs() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    bridge.apply_control("AudioMute", "1").await?;
    device.clear_sent();
    device.respond("audio hdmi_out_left volume get", "volume: -7.5\r\n");

    bridge.apply_control("AudioMute", "0").await?;
    let sent = device.sent();
    assert_eq!(sent[0], "audio mute off");
    assert_eq!(sent.len(), 1 + 2 * OUTPUTS.len());
    for output in OUTPUTS.iter() {
        assert!(sent.contains(&format!("audio {} volume get", output.token)));
        assert!(sent.contains(&format!("audio {} mute get", output.token)));
    }

    let snapshot = bridge.poll_snapshot().await?;
    for output in OUTPUTS.iter() {
        let key = format!("{}#Mute", output.group);
        assert_eq!(snapshot.property(&key), Some("0"));
        assert_eq!(switch_on(&snapshot, &key), Some(false));
    }
    assert_eq!(snapshot.property("HDMIOutLeft#Volume(dB)"), Some("-7.5"));
    assert_eq!(slider_value(&snapshot, "HDMIOutLeft#Volume(dB)"), Some(-7.5));

    Ok(())
}

#[tokio::test]
async fn master_mute_off_keeps_state_when_reread_fails() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    bridge.apply_control("AudioMute", "1").await?;
    device.fail("audio hdmi_out_left volume get", Fault::Timeout);

    let err = bridge.apply_control("AudioMute", "0").await.unwrap_err();
    assert!(matches!(err, BridgeError::Transport(TransportError::Timeout(_))));

    let snapshot = bridge.last_snapshot().await.unwrap();
    assert_eq!(snapshot.property("AudioMute"), Some("1"));
    assert_eq!(switch_on(&snapshot, "AudioMute"), Some(true));
    for output in OUTPUTS.iter() {
        let key = format!("{}#Mute", output.group);
        assert_eq!(snapshot.property(&key), Some("On"));
        assert!(snapshot.control(&key).is_none());
    }

    Ok(())
}

#[tokio::test]
async fn crosspoint_gain_write_updates_companion() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    let key = "CrosspointGainIPStreamLeft#HDMIInLeftGain(dB)";
    bridge.apply_control(key, "-6.5").await?;
    assert_eq!(
        device.sent(),
        vec!["audio ip_out_left crosspoint-gain hdmi_in_left set -6.5".to_string()]
    );

    let snapshot = bridge.poll_snapshot().await?;
    assert_eq!(snapshot.property(key), Some("-6.5"));
    assert_eq!(
        snapshot.property("CrosspointGainIPStreamLeft#HDMIInLeftGainCurrentValue(dB)"),
        Some("-6")
    );
    assert_eq!(slider_value(&snapshot, key), Some(-6.5));

    Ok(())
}

#[tokio::test]
async fn reboot_uses_configured_delay() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    bridge.apply_control("SystemRebootDelay(s)", "15").await?;
    assert!(device.sent().is_empty());
    assert_eq!(
        bridge.last_snapshot().await.unwrap().property("SystemRebootDelay(s)"),
        Some("15")
    );

    bridge.apply_control("SystemReboot", "").await?;
    assert_eq!(device.sent(), vec!["system reboot 15".to_string()]);

    let err = bridge.apply_control("SystemRebootDelay(s)", "soon").await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidValue { .. }));

    Ok(())
}

#[tokio::test]
async fn reboot_rejected_on_syntax_error() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;
    device.respond("system reboot", "Syntax error\r\n");

    let err = bridge.apply_control("SystemReboot", "").await.unwrap_err();
    assert!(matches!(err, BridgeError::Rejected { .. }));

    Ok(())
}

#[tokio::test]
async fn unknown_key_is_ignored() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    bridge.apply_control("NetworkSettings#IPAddress", "10.0.0.9").await?;
    bridge.apply_control("Bogus#Volume(dB)", "1").await?;
    assert!(device.sent().is_empty());

    // not a control, so the next poll is not skipped
    bridge.poll_snapshot().await?;
    assert_eq!(device.sent().len(), Factory::base_reads());

    Ok(())
}

#[tokio::test]
async fn control_before_snapshot_is_not_ready() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::bridge(&device, Factory::settings());

    let err = bridge.apply_control("VideoMute", "1").await.unwrap_err();
    assert!(matches!(err, BridgeError::NotReady));

    // the staged first call is empty too
    bridge.poll_snapshot().await?;
    let err = bridge.apply_control("VideoMute", "1").await.unwrap_err();
    assert!(matches!(err, BridgeError::NotReady));
    assert!(!device.sent().contains(&"video mute on".to_string()));

    Ok(())
}

#[tokio::test]
async fn out_of_range_values_are_refused() -> Result<()> {
    common_setup();
    let device = Factory::device();
    let bridge = Factory::primed_bridge(&device).await?;

    let err = bridge.apply_control("LineInLeft#Volume(dB)", "20").await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidValue { .. }));
    let err = bridge.apply_control("HDMIInLeft#Volume(dB)", "-45").await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidValue { .. }));
    let err = bridge.apply_control("VideoMute", "maybe").await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidValue { .. }));
    assert!(device.sent().is_empty());

    // line paths reach further down
    bridge.apply_control("LineInLeft#Volume(dB)", "-45").await?;
    assert_eq!(device.sent(), vec!["audio line_in_left volume set -45".to_string()]);

    Ok(())
}
