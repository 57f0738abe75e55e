//! Integration tests for the typewriter against the scheduler.
//!
//! The scheduled state machine and the closed-form `revealed_at` must agree
//! at every millisecond, and unmounting must leave nothing behind.

use folio_fx::schedule::Scheduler;
use folio_fx::typewriter::{Typewriter, TypewriterConfig, TypewriterMode, TypewriterState};

fn drive(typewriter: &mut Typewriter, scheduler: &mut Scheduler, now: u64) {
    loop {
        let due = scheduler.pop_due(now);
        if due.is_empty() {
            break;
        }
        for fired in &due {
            typewriter.on_timer(scheduler, fired);
        }
    }
}

fn assert_matches_formula(config: TypewriterConfig, until_ms: u64, step_ms: u64) {
    let mut scheduler = Scheduler::new();
    let mut typewriter = Typewriter::new(config);
    typewriter.mount(&mut scheduler, 0);

    let mut now = 0;
    while now <= until_ms {
        drive(&mut typewriter, &mut scheduler, now);
        assert_eq!(
            typewriter.revealed(),
            typewriter.revealed_at(now),
            "mismatch at {} ms",
            now
        );
        now += step_ms;
    }
}

#[test]
fn test_hold_mode_matches_formula() {
    let config = TypewriterConfig::new("Architecting")
        .with_speed(120)
        .with_delay(500)
        .with_mode(TypewriterMode::Hold);
    assert_matches_formula(config, 4_000, 1);
}

#[test]
fn test_loop_mode_matches_formula() {
    let config = TypewriterConfig::new("Future")
        .with_speed(100)
        .with_delay(300)
        .with_mode(TypewriterMode::Loop { pause_ms: 700 });
    // Three full cycles of 300 + 600 + 700 ms
    assert_matches_formula(config, 4_800, 1);
}

#[test]
fn test_coarse_frames_catch_up() {
    // Frames arrive far apart; several timers fire per frame
    let config = TypewriterConfig::new("Computing")
        .with_speed(40)
        .with_delay(100)
        .with_mode(TypewriterMode::Loop { pause_ms: 250 });
    assert_matches_formula(config, 5_000, 33);
}

#[test]
fn test_multibyte_text_cuts_on_char_boundaries() {
    let mut scheduler = Scheduler::new();
    let mut typewriter = Typewriter::new(
        TypewriterConfig::new("架构未来")
            .with_speed(10)
            .with_delay(0)
            .with_mode(TypewriterMode::Hold),
    );
    typewriter.mount(&mut scheduler, 0);

    drive(&mut typewriter, &mut scheduler, 20);
    assert_eq!(typewriter.text(), "架构");
    drive(&mut typewriter, &mut scheduler, 1_000);
    assert_eq!(typewriter.text(), "架构未来");
    assert_eq!(typewriter.state(), TypewriterState::Holding);
}

#[test]
fn test_unmount_releases_timers() {
    let mut scheduler = Scheduler::new();
    let mut typewriter = Typewriter::new(TypewriterConfig::new("Hello"));
    typewriter.mount(&mut scheduler, 0);
    let owner = typewriter.owner().unwrap();
    assert_eq!(scheduler.pending_for(owner), 1);

    typewriter.unmount(&mut scheduler);
    assert_eq!(scheduler.pending_for(owner), 0);
    assert!(scheduler.next_deadline().is_none());
    assert!(!typewriter.is_mounted());
    assert_eq!(typewriter.text(), "");

    // Nothing fires later
    assert!(scheduler.pop_due(u64::MAX).is_empty());
}

#[test]
fn test_remount_restarts_from_empty() {
    let mut scheduler = Scheduler::new();
    let mut typewriter = Typewriter::new(
        TypewriterConfig::new("Hello")
            .with_speed(10)
            .with_delay(0)
            .with_mode(TypewriterMode::Hold),
    );
    typewriter.mount(&mut scheduler, 0);
    drive(&mut typewriter, &mut scheduler, 100);
    assert_eq!(typewriter.text(), "Hello");

    typewriter.mount(&mut scheduler, 100);
    assert_eq!(typewriter.text(), "");
    drive(&mut typewriter, &mut scheduler, 120);
    assert_eq!(typewriter.text(), "He");
}
