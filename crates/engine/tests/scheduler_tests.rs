//! Effect scheduler integration tests against a recording transport.

use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use busylight_engine::palette::RAINBOW;
use busylight_engine::transport::mock::RecordingTransport;
use busylight_engine::{
    Effect, EffectKind, EffectScheduler, EffectState, EffectTiming, SharedTransport,
};
use busylight_hid_kuando_protocol::{Instruction, OpCode, Rgb};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn timing(rainbow_hold_ms: u64) -> EffectTiming {
    EffectTiming {
        keep_alive_interval_ms: 10_000,
        rainbow_hold_ms,
        fade_step_ms: 2,
        fade_step: 5,
        ringtone_settle_ms: 1,
    }
}

fn scheduler(recorder: &RecordingTransport, timing: EffectTiming) -> EffectScheduler {
    EffectScheduler::new(SharedTransport::new(recorder.clone()), timing)
}

#[test]
fn test_restart_never_overlaps_instances() -> TestResult {
    let recorder = RecordingTransport::new();
    recorder.set_write_delay(Duration::from_millis(2));
    let mut scheduler = scheduler(&recorder, timing(5));

    for _ in 0..3 {
        scheduler.start(Effect::Rainbow)?;
        thread::sleep(Duration::from_millis(30));
    }
    scheduler.stop_all()?;

    // Each worker's frames form one contiguous run: once a newer instance
    // has written, the older one never writes again.
    let mut runs: Vec<ThreadId> = Vec::new();
    for write in recorder.writes() {
        if runs.last() != Some(&write.thread_id) {
            assert!(!runs.contains(&write.thread_id), "stale instance wrote after restart");
            runs.push(write.thread_id);
        }
    }
    assert_eq!(runs.len(), 3);
    assert_eq!(recorder.max_in_flight(), 1);
    Ok(())
}

#[test]
fn test_rainbow_emits_palette_in_order() -> TestResult {
    let recorder = RecordingTransport::new();
    let mut scheduler = scheduler(&recorder, timing(20));

    scheduler.start(Effect::Rainbow)?;
    thread::sleep(Duration::from_millis(200));
    scheduler.stop(EffectKind::Rainbow)?;

    let colors = recorder.colors();
    assert!(colors.len() >= RAINBOW.len(), "only {} frames", colors.len());
    assert_eq!(&colors[..RAINBOW.len()], &RAINBOW);
    for (i, color) in colors.iter().enumerate() {
        assert_eq!(*color, RAINBOW[i % RAINBOW.len()], "frame {i}");
    }
    Ok(())
}

#[test]
fn test_fade_scales_color() -> TestResult {
    let recorder = RecordingTransport::new();
    let mut scheduler = scheduler(&recorder, timing(20));
    let orange = Rgb::new(255, 165, 0);

    scheduler.start(Effect::Fade { color: orange })?;
    thread::sleep(Duration::from_millis(60));
    scheduler.stop(EffectKind::Fade)?;

    let colors = recorder.colors();
    assert!(colors.len() >= 3);
    let expected: Vec<Rgb> = busylight_engine::fade_ramp(5)
        .take(colors.len())
        .map(|b| orange.scaled(b))
        .collect();
    assert_eq!(colors, expected);
    assert_eq!(colors[0], Rgb::BLACK);
    assert_eq!(colors[1], Rgb::new(5, 3, 0));
    Ok(())
}

#[test]
fn test_keep_alive_sends_immediately_and_stops_promptly() -> TestResult {
    let recorder = RecordingTransport::new();
    let mut scheduler = scheduler(&recorder, timing(20));

    scheduler.start(Effect::KeepAlive { timeout: 15 })?;
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    assert!(scheduler.stop(EffectKind::KeepAlive)?);
    assert!(started.elapsed() < Duration::from_secs(1));

    let instructions = recorder.instructions();
    assert_eq!(instructions, vec![Instruction::keep_alive(15)]);
    assert_eq!(instructions[0].opcode(), Some(OpCode::KeepAlive));
    Ok(())
}

#[test]
fn test_no_frames_after_stop_returns() -> TestResult {
    let recorder = RecordingTransport::new();
    let mut scheduler = scheduler(&recorder, timing(1));

    scheduler.start(Effect::Rainbow)?;
    thread::sleep(Duration::from_millis(20));
    scheduler.stop(EffectKind::Rainbow)?;

    let stopped_at = recorder.len();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(recorder.len(), stopped_at);
    Ok(())
}

#[test]
fn test_different_effects_run_side_by_side() -> TestResult {
    let recorder = RecordingTransport::new();
    let mut scheduler = scheduler(&recorder, timing(5));
    let status = scheduler.status();

    scheduler.start(Effect::Rainbow)?;
    scheduler.start(Effect::Fade {
        color: Rgb::new(0, 0, 255),
    })?;
    assert!(scheduler.is_running(EffectKind::Rainbow));
    assert!(scheduler.is_running(EffectKind::Fade));
    assert_eq!(status.get(EffectKind::Fade), EffectState::Running);
    assert_eq!(
        scheduler.active_effect(EffectKind::Fade),
        Some(Effect::Fade {
            color: Rgb::new(0, 0, 255)
        })
    );

    scheduler.stop_all()?;
    for kind in EffectKind::ALL {
        assert_eq!(status.get(kind), EffectState::Idle);
    }
    Ok(())
}

#[test]
fn test_failing_transport_does_not_kill_effect() -> TestResult {
    let recorder = RecordingTransport::new();
    recorder.set_failing(true);
    let mut scheduler = scheduler(&recorder, timing(2));

    scheduler.start(Effect::Rainbow)?;
    thread::sleep(Duration::from_millis(20));
    assert!(scheduler.is_running(EffectKind::Rainbow));

    recorder.set_failing(false);
    thread::sleep(Duration::from_millis(20));
    scheduler.stop(EffectKind::Rainbow)?;
    assert!(!recorder.is_empty());
    Ok(())
}
