//! Smooth sine-driven routines without state

use crate::animation::Frame;
use crate::color::Color;
use std::f32::consts::TAU;

fn phase(tick: u64, rate: f32, offset: f32) -> f32 {
    tick as f32 * rate + offset
}

/// Green to blue to violet curtain drifting across zones
pub fn aurora(frame: &mut Frame<'_>, tick: u64) {
    for idx in 0..frame.zone_count() {
        let t = phase(tick, 0.03, idx as f32 * 1.5);
        let position = (t.sin() + 1.0) / 2.0;
        let color = if position < 0.5 {
            let local = position * 2.0;
            Color::floor(0.0, 100.0 + 27.0 * (1.0 - local), 100.0 * local)
        } else {
            let local = (position - 0.5) * 2.0;
            Color::floor(80.0 * local, 100.0 * (1.0 - local), 100.0 + 27.0 * local)
        };
        frame.set(idx, color);
    }
}

/// Warm white rising and falling on every zone at once
pub fn breathing(frame: &mut Frame<'_>, tick: u64) {
    let level = (phase(tick, 0.05, 0.0).sin() + 1.0) / 2.0;
    frame.fill(Color::floor(127.0 * level, 100.0 * level, 70.0 * level));
}

pub fn ice(frame: &mut Frame<'_>, tick: u64) {
    for idx in 0..frame.zone_count() {
        let t = phase(tick, 0.1, idx as f32);
        let b = 100.0 + t.sin() * 27.0;
        let g = 80.0 + (t * 1.5).cos() * 40.0;
        let r = ((t * 2.3).sin() * 100.0).max(0.0);
        frame.set(idx, Color::floor(r, g, b));
    }
}

pub fn jungle(frame: &mut Frame<'_>, tick: u64) {
    let pulse = (phase(tick, 0.1, 0.0).sin() + 1.0) / 2.0;
    frame.fill(Color::floor(60.0 * pulse, 80.0 + 47.0 * pulse, 0.0));
}

pub fn plasma(frame: &mut Frame<'_>, tick: u64) {
    for idx in 0..frame.zone_count() {
        let i = idx as f32;
        let r = phase(tick, 0.05, i).sin() * 63.0 + 64.0;
        let b = phase(tick, 0.08, i * 2.0).sin() * 63.0 + 64.0;
        frame.set(idx, Color::floor(r, 0.0, b));
    }
}

/// Three phase-shifted sines per zone
pub fn rainbow(frame: &mut Frame<'_>, tick: u64) {
    for idx in 0..frame.zone_count() {
        let t = phase(tick, 0.1, idx as f32 * 0.5);
        frame.set(
            idx,
            Color::floor(
                t.sin() * 63.0 + 64.0,
                (t + 2.0).sin() * 63.0 + 64.0,
                (t + 4.0).sin() * 63.0 + 64.0,
            ),
        );
    }
}

/// Red base, orange in the first half of each cycle, magenta in the second
pub fn sunset(frame: &mut Frame<'_>, tick: u64) {
    for idx in 0..frame.zone_count() {
        let t = phase(tick, 0.02, idx as f32 * 0.8);
        let cycle = t.rem_euclid(TAU) / TAU;
        let (g, b) = if cycle < 0.5 {
            (80.0 * (1.0 - cycle * 2.0), 0.0)
        } else {
            let local = (cycle - 0.5) * 2.0;
            (0.0, 60.0 * (local * std::f32::consts::PI).sin())
        };
        frame.set(idx, Color::floor(127.0, g, b));
    }
}

/// Green glow with occasional violet bubbles
pub fn toxic(frame: &mut Frame<'_>, tick: u64) {
    for idx in 0..frame.zone_count() {
        let t = phase(tick, 0.1, idx as f32);
        let color = if (t * 3.0).sin() > 0.8 {
            Color::new(100, 20, 127)
        } else {
            Color::floor(0.0, 80.0 + t.sin() * 40.0, 0.0)
        };
        frame.set(idx, color);
    }
}

/// Deep blue swell with a teal undertone ("Ocean")
pub fn water(frame: &mut Frame<'_>, tick: u64) {
    for idx in 0..frame.zone_count() {
        let t = phase(tick, 0.05, idx as f32 * 2.5);
        let b = 80.0 + t.sin() * 47.0;
        let g = 30.0 + (t * 0.7 + 1.0).sin() * 30.0;
        frame.set(idx, Color::floor(0.0, g, b));
    }
}
