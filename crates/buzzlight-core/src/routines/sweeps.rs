//! Position and step based routines

use crate::animation::Frame;
use crate::color::Color;

/// Pastel palette stepping across zones
pub fn candy(frame: &mut Frame<'_>, tick: u64) {
    for idx in 0..frame.zone_count() {
        let phase = (tick as f32 * 0.05 + idx as f32 * 0.33).rem_euclid(1.0);
        let color = if phase < 0.33 {
            Color::new(120, 60, 80)
        } else if phase < 0.66 {
            Color::new(50, 80, 120)
        } else {
            Color::new(120, 120, 40)
        };
        frame.set(idx, color);
    }
}

/// Red dot bouncing linearly between the outer zones
pub fn knight(frame: &mut Frame<'_>, tick: u64) {
    const CYCLE: u64 = 30;
    let half = (CYCLE / 2) as f32;
    let phase = (tick % CYCLE) as f32;
    let span = frame.zone_count().saturating_sub(1) as f32;
    let pos = if phase < half {
        phase / half * span
    } else {
        span - (phase - half) / half * span
    };

    for idx in 0..frame.zone_count() {
        let level = (1.0 - (pos - idx as f32).abs() * 1.5).max(0.0);
        frame.set(idx, Color::floor(127.0 * level, 0.0, 0.0));
    }
}

/// Red and blue alternating every four ticks, white center on the second beat
pub fn police(frame: &mut Frame<'_>, tick: u64) {
    const RED: Color = Color::new(127, 0, 0);
    const BLUE: Color = Color::new(0, 0, 127);
    if (tick / 4) % 2 == 0 {
        frame.set(0, RED);
        frame.set(1, Color::OFF);
        frame.set(2, BLUE);
    } else {
        frame.set(0, BLUE);
        frame.set(1, Color::WHITE);
        frame.set(2, RED);
    }
}

/// Red dot swinging sinusoidally across zones
pub fn scanner(frame: &mut Frame<'_>, tick: u64) {
    let pos = (tick as f32 * 0.15).sin() + 1.0;
    for idx in 0..frame.zone_count() {
        let dist = (pos - idx as f32).abs();
        frame.set(idx, Color::floor((127.0 - dist * 150.0).max(0.0), 0.0, 0.0));
    }
}

pub fn strobe(frame: &mut Frame<'_>, tick: u64) {
    if tick % 2 == 0 {
        frame.fill(Color::WHITE);
    } else {
        frame.fill(Color::OFF);
    }
}

/// Teal highlight circling through the zones
pub fn wave(frame: &mut Frame<'_>, tick: u64) {
    let count = frame.zone_count() as f32;
    let pos = (tick as f32 * 0.2).rem_euclid(count.max(1.0));
    for idx in 0..frame.zone_count() {
        let mut dist = (pos - idx as f32).abs();
        if dist > count / 2.0 {
            dist = (dist - count).abs();
        }
        let level = (127.0 - dist * 100.0).max(0.0);
        frame.set(idx, Color::floor(0.0, level, level * 0.8));
    }
}
