// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::FaultConfig;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFault {
    None,
    Failure,
    Straggle(Duration),
}

impl FaultConfig {
    pub fn is_enabled(&self) -> bool {
        self.failure_probability > 0 || self.straggler_probability > 0
    }

    /// Roll the dice for one task
    pub fn sample(&self, rng: &mut impl Rng) -> InjectedFault {
        if self.failure_probability > 0 && rng.random_range(0..100) < self.failure_probability {
            return InjectedFault::Failure;
        }
        if self.straggler_probability > 0 && rng.random_range(0..100) < self.straggler_probability
        {
            let delay = rng.random_range(1..=self.straggler_delay_ms.max(1));
            return InjectedFault::Straggle(Duration::from_millis(delay));
        }
        InjectedFault::None
    }
}
