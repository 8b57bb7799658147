//! Command dispatcher integration tests.

use std::thread;
use std::time::Duration;

use busylight_engine::palette::{self, NAMED_COLORS};
use busylight_engine::transport::mock::RecordingTransport;
use busylight_engine::{
    BusylightConfig, DispatchError, Dispatcher, EffectKind, EffectTiming, Outcome,
    SharedTransport, TransportError,
};
use busylight_hid_kuando_protocol::{Instruction, Rgb, Ring};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn config() -> BusylightConfig {
    BusylightConfig {
        timing: EffectTiming {
            keep_alive_interval_ms: 10,
            rainbow_hold_ms: 5,
            fade_step_ms: 2,
            fade_step: 5,
            ringtone_settle_ms: 5,
        },
        ..BusylightConfig::default()
    }
}

fn dispatcher(config: &BusylightConfig) -> (Dispatcher, RecordingTransport) {
    let recorder = RecordingTransport::new();
    let dispatcher = Dispatcher::new(SharedTransport::new(recorder.clone()), config);
    (dispatcher, recorder)
}

#[test]
fn test_raw_color_out_of_range_sends_nothing() {
    let (mut dispatcher, recorder) = dispatcher(&config());

    let result = dispatcher.handle("raw_color 10,20,300");

    assert!(matches!(result, Err(DispatchError::MalformedCommand { .. })));
    assert!(recorder.is_empty());
}

#[test]
fn test_raw_color_sends_exactly_one_frame() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    assert_eq!(dispatcher.handle("raw_color 10,20,30")?, Outcome::Sent);

    assert_eq!(
        recorder.instructions(),
        vec![Instruction::solid(Rgb::new(10, 20, 30))]
    );
    Ok(())
}

#[test]
fn test_solid_and_blink_tables() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    for (name, rgb) in NAMED_COLORS {
        recorder.clear();
        assert_eq!(dispatcher.handle(&format!("color_{name}"))?, Outcome::Sent);
        assert_eq!(recorder.instructions(), vec![Instruction::solid(rgb)]);

        recorder.clear();
        assert_eq!(dispatcher.handle(&format!("blink_color_{name}"))?, Outcome::Sent);
        let sent = recorder.instructions();
        assert_eq!(sent, vec![Instruction::blink(rgb, 5, 5)]);
        assert_eq!((sent[0].dc_on(), sent[0].dc_off()), (5, 5));
    }
    Ok(())
}

#[test]
fn test_ring_plays_tone_then_red_blink() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    assert_eq!(dispatcher.handle("ring_funky")?, Outcome::Sent);

    let writes = recorder.writes();
    assert_eq!(writes.len(), 2);
    let tone = writes[0].instruction().ok_or("short frame")?;
    assert_eq!(tone, Instruction::ring(Ring::Funky, 7));
    assert_eq!((tone.update(), tone.volume(), tone.repeat()), (1, 7, 1));
    assert_eq!(tone.ring_tone(), Some(Ring::Funky));
    assert_eq!(
        writes[1].instruction(),
        Some(Instruction::blink(Rgb::new(255, 0, 0), 1, 1))
    );
    assert!(writes[1].at.duration_since(writes[0].at) >= Duration::from_millis(5));
    Ok(())
}

#[test]
fn test_failed_tone_still_sends_follow_up_blink() {
    let (mut dispatcher, recorder) = dispatcher(&config());
    recorder.fail_next(1);

    let result = dispatcher.handle("ring_funky");

    assert_eq!(
        result,
        Err(DispatchError::Transport(TransportError::Disconnected))
    );
    assert_eq!(
        recorder.instructions(),
        vec![Instruction::blink(Rgb::new(255, 0, 0), 1, 1)]
    );
    let stats = dispatcher.transport().stats();
    assert_eq!((stats.frames_failed(), stats.frames_sent()), (1, 1));
}

#[test]
fn test_every_ringtone_is_reachable() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    for ring in Ring::ALL {
        recorder.clear();
        dispatcher.handle(&format!("ring_{}", ring.name()))?;
        assert_eq!(recorder.instructions().first().copied(), Some(Instruction::ring(ring, 7)));
    }
    Ok(())
}

#[test]
fn test_stop_ringtone() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    dispatcher.handle("stop_ringtone")?;

    let sent = recorder.instructions();
    assert_eq!(sent, vec![Instruction::stop_ringtone()]);
    assert_eq!((sent[0].update(), sent[0].volume()), (1, 0));
    assert_eq!(sent[0].ring_tone(), Some(Ring::Off));
    Ok(())
}

#[test]
fn test_off_stops_rainbow_before_off_frame() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    assert_eq!(
        dispatcher.handle("rainbow_on")?,
        Outcome::EffectStarted(EffectKind::Rainbow)
    );
    thread::sleep(Duration::from_millis(30));
    assert_eq!(dispatcher.handle("off")?, Outcome::Sent);
    assert!(!dispatcher.scheduler().is_running(EffectKind::Rainbow));
    thread::sleep(Duration::from_millis(30));

    let writes = recorder.writes();
    let last = writes.last().ok_or("no frames")?;
    assert_eq!(last.instruction(), Some(Instruction::off()));
    assert_ne!(last.thread_name.as_deref(), Some("busylight-rainbow"));
    assert!(writes.len() > 1);
    Ok(())
}

#[test]
fn test_rainbow_off_stops_and_turns_light_off() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    dispatcher.handle("rainbow_on")?;
    thread::sleep(Duration::from_millis(20));
    assert_eq!(
        dispatcher.handle("rainbow_off")?,
        Outcome::EffectStopped(EffectKind::Rainbow)
    );

    assert_eq!(recorder.instructions().last(), Some(&Instruction::off()));
    Ok(())
}

#[test]
fn test_off_commands_leave_keep_alive_running() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());
    dispatcher.start_keep_alive()?;

    dispatcher.handle("rainbow_on")?;
    dispatcher.handle("fade_blue")?;
    for command in ["off", "rainbow_off", "fade_off"] {
        dispatcher.handle(command)?;
        assert!(dispatcher.scheduler().is_running(EffectKind::KeepAlive));
    }
    assert!(!dispatcher.scheduler().is_running(EffectKind::Rainbow));
    assert!(!dispatcher.scheduler().is_running(EffectKind::Fade));

    recorder.clear();
    thread::sleep(Duration::from_millis(40));
    assert!(
        recorder
            .writes()
            .iter()
            .any(|w| w.thread_name.as_deref() == Some("busylight-keep-alive"))
    );

    dispatcher.shutdown()?;
    Ok(())
}

#[test]
fn test_fade_named_color_then_fade_off() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    assert_eq!(
        dispatcher.handle("fade_blue")?,
        Outcome::EffectStarted(EffectKind::Fade)
    );
    thread::sleep(Duration::from_millis(30));
    assert_eq!(
        dispatcher.handle("fade_off")?,
        Outcome::EffectStopped(EffectKind::Fade)
    );

    let colors = recorder.colors();
    let (last, faded) = colors.split_last().ok_or("no frames")?;
    assert_eq!(*last, Rgb::BLACK);
    assert!(!faded.is_empty());
    assert!(faded.iter().all(|c| c.red == 0 && c.green == 0));
    Ok(())
}

#[test]
fn test_unknown_fade_color_is_ignored() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    assert_eq!(dispatcher.handle("fade_chartreuse")?, Outcome::Ignored);
    assert!(!dispatcher.scheduler().is_running(EffectKind::Fade));
    assert!(recorder.is_empty());
    Ok(())
}

#[test]
fn test_unknown_commands_are_ignored() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    for input in ["", "hello", "color_", "COLOR_RED", "blink_red", "ring_loud"] {
        assert_eq!(dispatcher.handle(input)?, Outcome::Ignored, "{input}");
    }
    assert!(recorder.is_empty());
    Ok(())
}

#[test]
fn test_effects_are_independent_by_default() -> TestResult {
    let (mut dispatcher, _recorder) = dispatcher(&config());

    dispatcher.handle("rainbow_on")?;
    dispatcher.handle("fade_red")?;

    assert!(dispatcher.scheduler().is_running(EffectKind::Rainbow));
    assert!(dispatcher.scheduler().is_running(EffectKind::Fade));
    dispatcher.shutdown()?;
    Ok(())
}

#[test]
fn test_exclusive_effects_cancel_each_other() -> TestResult {
    let config = BusylightConfig {
        exclusive_effects: true,
        ..config()
    };
    let (mut dispatcher, _recorder) = dispatcher(&config);

    dispatcher.handle("rainbow_on")?;
    dispatcher.handle("fade_red")?;
    assert!(!dispatcher.scheduler().is_running(EffectKind::Rainbow));
    assert!(dispatcher.scheduler().is_running(EffectKind::Fade));

    dispatcher.handle("rainbow_on")?;
    assert!(dispatcher.scheduler().is_running(EffectKind::Rainbow));
    assert!(!dispatcher.scheduler().is_running(EffectKind::Fade));
    dispatcher.shutdown()?;
    Ok(())
}

#[test]
fn test_transport_failure_is_reported() {
    let (mut dispatcher, recorder) = dispatcher(&config());
    recorder.set_failing(true);

    let result = dispatcher.handle("color_red");

    assert_eq!(
        result,
        Err(DispatchError::Transport(TransportError::Disconnected))
    );
    assert_eq!(dispatcher.transport().stats().frames_failed(), 1);
}

#[test]
fn test_shutdown_stops_everything_then_sends_off() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    dispatcher.start_keep_alive()?;
    dispatcher.handle("rainbow_on")?;
    dispatcher.handle("fade_green")?;
    thread::sleep(Duration::from_millis(20));

    dispatcher.shutdown()?;
    let count = recorder.len();
    thread::sleep(Duration::from_millis(30));

    assert_eq!(recorder.len(), count);
    assert_eq!(recorder.instructions().last(), Some(&Instruction::off()));
    assert!(recorder.is_closed());
    assert!(
        recorder
            .instructions()
            .contains(&Instruction::keep_alive(15))
    );
    Ok(())
}

#[test]
fn test_table_commands_all_dispatch() -> TestResult {
    let (mut dispatcher, recorder) = dispatcher(&config());

    for command in palette::table_commands() {
        recorder.clear();
        assert_eq!(dispatcher.handle(&command)?, Outcome::Sent, "{command}");
        assert!(!recorder.is_empty(), "{command}");
    }
    Ok(())
}
