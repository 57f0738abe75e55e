//! Integration tests for the particle field.
//!
//! These drive fields for many frames with a moving pointer and check the
//! properties that must hold on every frame: fixed count, positions inside
//! the wrap bounds, finite state and clamped energy. A long run with a still
//! or absent pointer checks that speeds settle instead of diverging.

use folio_fx::field::MIN_BOUND;
use folio_fx::prelude::*;
use folio_fx::trail::PointerTrail;

const HALF: Vec2 = Vec2::new(30.0, 17.0);

fn run_frames(field: &mut ParticleField, frames: usize, mut check: impl FnMut(&ParticleField)) {
    let mut trail = PointerTrail::default();
    for frame in 0..frames {
        let time = frame as f32 / 60.0;
        let pointer = Vec3::new((time * 1.3).sin() * 20.0, (time * 0.7).cos() * 12.0, 0.0);
        trail.push(pointer, time);
        field.update(
            &FrameInput::new(time, HALF)
                .with_pointer(Some(pointer))
                .with_trail(&trail),
        );
        check(field);
    }
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_count_is_fixed() {
    for variant in [Variant::Instanced, Variant::FlowSprites, Variant::Aurora] {
        let mut field = ParticleField::new(FieldConfig::preset(variant).with_count(250));
        run_frames(&mut field, 120, |f| {
            assert_eq!(f.len(), 250);
            assert_eq!(f.buffers().positions().len(), 750);
            assert_eq!(f.buffers().sizes().len(), 250);
            assert_eq!(f.buffers().colors().len(), 750);
        });
    }
}

#[test]
fn test_positions_stay_in_bounds() {
    for variant in [Variant::Instanced, Variant::FlowSprites, Variant::Aurora] {
        let mut field = ParticleField::new(FieldConfig::preset(variant).with_count(200));
        run_frames(&mut field, 300, |f| {
            let bounds = f.bounds();
            for p in f.particles().positions() {
                assert!(p.is_finite());
                assert!(p.x.abs() <= bounds.x + 1e-4, "{:?} outside {:?}", p, bounds);
                assert!(p.y.abs() <= bounds.y + 1e-4, "{:?} outside {:?}", p, bounds);
                assert!(p.z.abs() <= bounds.z + 1e-4, "{:?} outside {:?}", p, bounds);
            }
        });
    }
}

#[test]
fn test_energy_clamped() {
    let mut field = ParticleField::new(FieldConfig::preset(Variant::Aurora).with_count(200));
    let floor = field.config().energy.floor;
    run_frames(&mut field, 400, |f| {
        for &e in f.particles().energies() {
            assert!(e >= floor - 1e-6 && e <= 1.0, "energy {} out of range", e);
        }
    });
}

#[test]
fn test_speed_never_exceeds_bound() {
    let mut field = ParticleField::new(FieldConfig::preset(Variant::Aurora).with_count(200));
    let bound = field.speed_bound(PointerTrail::default().capacity());
    run_frames(&mut field, 400, |f| {
        for v in f.particles().velocities() {
            assert!(v.length() <= bound + 1e-3, "speed {} above {}", v.length(), bound);
        }
    });
}

#[test]
fn test_long_run_with_still_or_absent_pointer_settles() {
    let capacity = PointerTrail::default().capacity();
    for variant in [Variant::Instanced, Variant::FlowSprites, Variant::Aurora] {
        for pointer in [Some(Vec3::new(3.0, 2.0, 0.0)), None] {
            let mut backdrop = Backdrop::from_configs([FieldConfig::preset(variant).with_count(150)]);
            let bound = backdrop.layers()[0].speed_bound(capacity);
            let mut window_max = [0.0f32; 2];

            for frame in 0..2000 {
                backdrop.update(frame as f32 / 60.0, pointer, HALF);
                let fastest = backdrop.layers()[0]
                    .particles()
                    .velocities()
                    .iter()
                    .map(|v| v.length())
                    .fold(0.0f32, f32::max);
                assert!(
                    fastest <= bound + 1e-3,
                    "{:?} {:?}: speed {} above {} at frame {}",
                    variant,
                    pointer,
                    fastest,
                    bound,
                    frame
                );
                match frame {
                    1800..=1899 => window_max[0] = window_max[0].max(fastest),
                    1900..=1999 => window_max[1] = window_max[1].max(fastest),
                    _ => {}
                }
            }

            // The flow field drifts over time, so allow slack for noise but not growth
            let [earlier, last] = window_max;
            assert!(
                last <= earlier * 1.5 + 1e-4,
                "{:?} {:?}: speed still growing ({} after {})",
                variant,
                pointer,
                last,
                earlier
            );
        }
    }
}

#[test]
fn test_sizes_positive_and_capped() {
    for variant in [Variant::Instanced, Variant::FlowSprites] {
        let mut field = ParticleField::new(FieldConfig::preset(variant).with_count(100));
        let config = field.config().clone();
        run_frames(&mut field, 120, |f| {
            for (size, factor) in f.buffers().sizes().iter().zip(f.particles().size_factors()) {
                assert!(*size > 0.0);
                assert!(*size <= factor * config.base_size * config.max_size_multiple + 1e-6);
            }
        });
    }
}

// ============================================================================
// Degenerate input
// ============================================================================

#[test]
fn test_zero_viewport_is_clamped() {
    let mut field = ParticleField::new(FieldConfig::preset(Variant::Instanced).with_count(50));
    field.update(&FrameInput::new(0.0, Vec2::ZERO));

    let bounds = field.bounds();
    assert!(bounds.x >= MIN_BOUND && bounds.y >= MIN_BOUND);
    for p in field.particles().positions() {
        assert!(p.is_finite());
        assert!(p.x.abs() <= bounds.x + 1e-4 && p.y.abs() <= bounds.y + 1e-4);
    }
}

#[test]
fn test_pointer_on_particle_stays_finite() {
    let mut field = ParticleField::new(FieldConfig::preset(Variant::Aurora).with_count(20));
    let target = field.particles().positions()[0];
    for frame in 0..10 {
        field.update(&FrameInput::new(frame as f32 / 60.0, HALF).with_pointer(Some(target)));
    }
    assert!(field.particles().positions().iter().all(|p| p.is_finite()));
    assert!(field.particles().velocities().iter().all(|v| v.is_finite()));
}

#[test]
fn test_same_seed_same_motion() {
    let config = FieldConfig::preset(Variant::Aurora).with_count(64).with_seed(7);
    let mut a = ParticleField::new(config.clone());
    let mut b = ParticleField::new(config);
    run_frames(&mut a, 60, |_| {});
    run_frames(&mut b, 60, |_| {});
    assert_eq!(a.buffers().positions(), b.buffers().positions());
}

#[test]
fn test_dirty_flags_reset_on_take() {
    let mut field = ParticleField::new(FieldConfig::preset(Variant::Instanced).with_count(10));
    assert!(field.buffers_mut().take_dirty().any());
    assert!(!field.buffers().dirty().any());

    field.update(&FrameInput::new(0.1, HALF));
    let dirty = field.buffers_mut().take_dirty();
    assert!(dirty.positions && dirty.sizes);
    // Flat-colored variants never rewrite colors after construction
    assert!(!dirty.colors);
}
