//! Condition loss applied to a copy when it comes back

use rand::Rng;

/// Decides how much condition a returned copy loses
pub trait WearModel: Send + Sync {
    fn wear(&self) -> i32;
}

/// Uniform wear in `0..=max`
#[derive(Debug, Clone, Copy)]
pub struct RandomWear {
    max: i32,
}

impl RandomWear {
    pub fn new(max: i32) -> Self {
        Self { max: max.max(0) }
    }

    pub fn max(&self) -> i32 {
        self.max
    }
}

impl WearModel for RandomWear {
    fn wear(&self) -> i32 {
        rand::rng().random_range(0..=self.max)
    }
}

/// Always the same wear
#[derive(Debug, Clone, Copy)]
pub struct FixedWear(pub i32);

impl WearModel for FixedWear {
    fn wear(&self) -> i32 {
        self.0
    }
}
