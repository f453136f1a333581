//! The built-in background animation catalog

mod noise;
mod sweeps;
mod waves;

use crate::animation::{Animation, FnRoutine, Frame};
use crate::error::Result;
use crate::registry::{AnimationDescriptor, RoutineSource};
use noise::{NoiseRoutine, NoiseStyle};

type TickFn = fn(&mut Frame<'_>, u64);

const STATELESS: &[(&str, &str, u64, TickFn)] = &[
    ("aurora", "Aurora", 60, waves::aurora),
    ("breathing", "Breathing", 50, waves::breathing),
    ("candy", "Candy", 80, sweeps::candy),
    ("ice", "Ice", 80, waves::ice),
    ("jungle", "Jungle", 70, waves::jungle),
    ("knight", "Knight", 30, sweeps::knight),
    ("plasma", "Plasma", 40, waves::plasma),
    ("police", "Police", 50, sweeps::police),
    ("rainbow", "Rainbow", 50, waves::rainbow),
    ("scanner", "Scanner", 30, sweeps::scanner),
    ("strobe", "Strobe", 50, sweeps::strobe),
    ("sunset", "Sunset", 80, waves::sunset),
    ("toxic", "Toxic", 60, waves::toxic),
    ("water", "Ocean", 50, waves::water),
    ("wave", "Wave", 40, sweeps::wave),
];

const RANDOM: &[(&str, &str, u64, NoiseStyle)] = &[
    ("cyber", "Cyber", 35, NoiseStyle::Cyber),
    ("disco", "Disco", 60, NoiseStyle::Disco),
    ("fire", "Fire", 60, NoiseStyle::Fire),
    ("matrix", "Matrix", 30, NoiseStyle::Matrix),
    ("volcano", "Volcano", 40, NoiseStyle::Volcano),
];

/// Every built-in routine
pub fn builtin_descriptors() -> Vec<AnimationDescriptor> {
    let stateless = STATELESS.iter().map(|&(id, name, interval, routine)| {
        AnimationDescriptor::new(id, name, interval, move || -> Box<dyn Animation> {
            Box::new(FnRoutine(routine))
        })
    });
    let random = RANDOM.iter().map(|&(id, name, interval, style)| {
        AnimationDescriptor::new(id, name, interval, move || -> Box<dyn Animation> {
            Box::new(NoiseRoutine::new(style))
        })
    });
    stateless.chain(random).collect()
}

/// [`RoutineSource`] for the compiled-in catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

impl RoutineSource for BuiltinSource {
    fn label(&self) -> String {
        "builtin".to_string()
    }

    fn scan(&self) -> Vec<Result<AnimationDescriptor>> {
        builtin_descriptors().into_iter().map(Ok).collect()
    }
}
