//! End-to-end tests: scheduler → drivers → monitors → radio.
//!
//! Default timings: 3 s startup delay, 10 ms echo poll, 1 s ranging
//! interval.  With an immediate echo the first distance arrives at
//! 3010 and then every second at x010.

use crate::mock_hw::{MockI2c, MockPin, RecordingRadio, make_device, run_until};

use rangefinder::adapters::sim_serial::{SimEcho, SimRanger};
use rangefinder::app::events::{TelemetryValue, topic};
use rangefinder::app::service::Device;
use rangefinder::config::DeviceConfig;
use rangefinder::error::Error;
use rangefinder::events::{InputEvent, InputQueue};
use rangefinder::scheduler::MAX_DISPATCH_PER_PASS;
use rangefinder::sensors::ranging::UpdateInterval;

fn set_echo(device: &mut crate::mock_hw::TestDevice, echo: SimEcho) {
    device.ranging_mut().channel_mut().set_echo(echo);
}

#[test]
fn nothing_is_triggered_before_startup_delay() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(1000));

    run_until(&mut device, &inputs, 2999);

    assert_eq!(device.ranging().channel().triggers(), 0);
    assert!(device.radio().distances().is_empty());
    // The thermometer is not gated by the ranging startup delay.
    assert_eq!(
        device.radio().on_topic(topic::TEMPERATURE),
        vec![TelemetryValue::Float(25.0)]
    );
}

#[test]
fn first_distance_is_always_published() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(1000));

    run_until(&mut device, &inputs, 3100);

    assert_eq!(device.radio().distances(), vec![TelemetryValue::Int(1000)]);
    assert_eq!(
        device.distance_monitor().and_then(|m| m.last_distance_mm()),
        Some(1000)
    );
}

#[test]
fn small_changes_are_suppressed_until_threshold() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(1000));

    run_until(&mut device, &inputs, 3500);
    set_echo(&mut device, SimEcho::Distance(1010));
    run_until(&mut device, &inputs, 4500);
    set_echo(&mut device, SimEcho::Distance(1030));
    run_until(&mut device, &inputs, 5500);

    assert_eq!(
        device.radio().distances(),
        vec![TelemetryValue::Int(1000), TelemetryValue::Int(1030)]
    );
}

#[test]
fn silence_deadline_forces_a_publish() {
    let config = DeviceConfig {
        distance_max_silence: 5000,
        ..DeviceConfig::default()
    };
    let inputs = InputQueue::new();
    let mut device = make_device(config, SimEcho::Distance(1000));

    run_until(&mut device, &inputs, 8000);
    assert_eq!(device.radio().distances().len(), 1);

    run_until(&mut device, &inputs, 8100);
    assert_eq!(device.radio().distances().len(), 2);
}

#[test]
fn armed_alarm_publishes_every_sample_and_lights_indicator() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(300));
    device.set_alarm_armed(true);

    run_until(&mut device, &inputs, 5100);

    assert_eq!(device.radio().alarms().len(), 3);
    assert_eq!(device.radio().distances(), vec![TelemetryValue::Int(300)]);
    assert!(device.indicator_lit());

    // Alarm goes first within a cycle.
    let first_two: Vec<&str> = device.radio().sent.iter().skip(1).take(2).map(|(t, _)| t.as_str()).collect();
    assert_eq!(first_two, vec![topic::ALARM, topic::DISTANCE]);
}

#[test]
fn indicator_switches_off_after_pulse() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(300));
    device.set_alarm_armed(true);

    run_until(&mut device, &inputs, 5100);
    set_echo(&mut device, SimEcho::Distance(1000));

    // Last trip at 5010, pulse 2000.
    run_until(&mut device, &inputs, 7000);
    assert!(device.indicator_lit());
    run_until(&mut device, &inputs, 7100);
    assert!(!device.indicator_lit());
    assert_eq!(device.radio().alarms().len(), 3);
}

#[test]
fn start_pulses_indicator_once() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(1000));
    assert!(device.indicator_lit());

    run_until(&mut device, &inputs, 1999);
    assert!(device.indicator_lit());
    run_until(&mut device, &inputs, 2000);
    assert!(!device.indicator_lit());
}

#[test]
fn self_replanning_task_cannot_starve_a_pass() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(1000));
    // A zero period keeps the thermometer due "now" after every read.
    device.set_temperature_interval(UpdateInterval::Every(0));

    assert_eq!(device.run_pending(0, &inputs), MAX_DISPATCH_PER_PASS);
    assert_eq!(device.next_wake(), Some(0));
    assert_eq!(device.run_pending(0, &inputs), MAX_DISPATCH_PER_PASS);

    // Other due tasks still get their turn in the next pass.
    device.run_pending(3000, &inputs);
    assert_eq!(device.ranging().channel().triggers(), 1);
    assert_eq!(
        device.radio().on_topic(topic::TEMPERATURE),
        vec![TelemetryValue::Float(25.0)]
    );
}

#[test]
fn disarmed_alarm_stays_quiet() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(100));

    run_until(&mut device, &inputs, 6000);

    assert!(device.radio().alarms().is_empty());
    assert!(!device.indicator_lit());
}

#[test]
fn interval_never_stops_periodic_ranging() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(1000));

    run_until(&mut device, &inputs, 3100);
    device.set_ranging_interval(UpdateInterval::Never);
    run_until(&mut device, &inputs, 10_000);
    assert_eq!(device.ranging().channel().triggers(), 1);

    // One-shot requests still work.
    assert!(device.measure_distance());
    assert!(!device.measure_distance());
    run_until(&mut device, &inputs, 10_100);
    assert_eq!(device.ranging().channel().triggers(), 2);
    assert!(!device.ranging().is_measuring());
}

#[test]
fn echo_timeout_is_published_as_error() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Silent);

    run_until(&mut device, &inputs, 3099);
    assert!(device.radio().on_topic(topic::RANGING_ERROR).is_empty());

    run_until(&mut device, &inputs, 3100);
    assert_eq!(
        device.radio().on_topic(topic::RANGING_ERROR),
        vec![TelemetryValue::Int(1)]
    );
    assert!(device.radio().distances().is_empty());
    assert_eq!(device.ranging().stats().timeouts, 1);
}

#[test]
fn out_of_range_echo_is_an_error() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Raw([0x00, 0x05]));

    run_until(&mut device, &inputs, 4100);

    assert_eq!(
        device.radio().on_topic(topic::RANGING_ERROR),
        vec![TelemetryValue::Int(1), TelemetryValue::Int(2)]
    );
    assert_eq!(device.ranging().stats().malformed, 2);
}

#[test]
fn device_recovers_after_errors() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Silent);

    run_until(&mut device, &inputs, 3500);
    set_echo(&mut device, SimEcho::Distance(800));
    run_until(&mut device, &inputs, 4100);

    assert_eq!(device.radio().distances(), vec![TelemetryValue::Int(800)]);
}

#[test]
fn user_inputs_adjust_alarm() {
    let inputs = InputQueue::new();
    let mut device = make_device(DeviceConfig::default(), SimEcho::Distance(1000));

    inputs.push(InputEvent::EncoderUp);
    inputs.push(InputEvent::EncoderUp);
    inputs.push(InputEvent::ButtonClick);
    device.run_pending(0, &inputs);

    let alarm = device.alarm().copied().expect("alarm state");
    assert!(alarm.is_armed());
    assert_eq!(alarm.alarm_distance_cm(), 60);

    for _ in 0..15 {
        inputs.push(InputEvent::EncoderDown);
    }
    device.run_pending(1, &inputs);
    assert_eq!(device.alarm().map(|a| a.alarm_distance_cm()), Some(2));

    inputs.push(InputEvent::ButtonHold);
    device.run_pending(2, &inputs);
    let alarm = device.alarm().copied().expect("alarm state");
    assert_eq!(alarm.alarm_distance_cm(), 50);
    assert!(alarm.is_armed());
    assert!(inputs.is_empty());
}

#[test]
fn thermometer_failure_does_not_stop_ranging() {
    let inputs = InputQueue::new();
    let mut device = Device::new(
        DeviceConfig::default(),
        SimRanger::new(SimEcho::Distance(1500)),
        MockI2c { register: None },
        MockPin::default(),
        RecordingRadio::default(),
    )
    .expect("device construction");
    device.start();

    run_until(&mut device, &inputs, 3100);

    assert!(device.radio().on_topic(topic::TEMPERATURE).is_empty());
    assert_eq!(device.radio().distances(), vec![TelemetryValue::Int(1500)]);
}

#[test]
fn invalid_config_is_rejected() {
    let config = DeviceConfig {
        alarm_step_cm: 0,
        ..DeviceConfig::default()
    };
    let result = Device::new(
        config,
        SimRanger::new(SimEcho::Silent),
        MockI2c::room_temperature(),
        MockPin::default(),
        RecordingRadio::default(),
    );
    assert!(matches!(result, Err(Error::Config(_))));
}
