//! Drop (sudden energy surge) detection
//!
//! ```text
//! surge = energy(t) - energy(t-1)            (envelope-normalised energy)
//! if surge > threshold && elapsed > cooldown:  intensity = min(1, surge)
//! intensity ·= decay                          (every frame)
//! energy(t) = 0                               (silent frames)
//! intensity  = 0 if intensity < epsilon
//! ```

use crate::config::DropConfig;

/// Surge detector with cooldown and exponential decay
#[derive(Debug, Clone)]
pub struct DropDetector {
    config: DropConfig,
    previous_energy: f32,
    intensity: f32,
    /// Timestamp (seconds) of the last trigger
    last_trigger: Option<f64>,
}

impl DropDetector {
    /// Create a detector from configuration
    pub fn new(config: DropConfig) -> Self {
        Self {
            config,
            previous_energy: 0.0,
            intensity: 0.0,
            last_trigger: None,
        }
    }

    /// Current intensity (0.0-1.0)
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Feed this frame's normalised energy at `timestamp` seconds
    ///
    /// # Returns
    ///
    /// Drop intensity after this frame's decay
    pub fn process(&mut self, energy: f32, timestamp: f64) -> f32 {
        let surge = energy - self.previous_energy;
        self.previous_energy = energy;

        let cooled_down = self
            .last_trigger
            .map_or(true, |t| (timestamp - t) * 1000.0 > self.config.cooldown_ms);

        if surge > self.config.threshold && cooled_down {
            self.intensity = surge.min(1.0);
            self.last_trigger = Some(timestamp);
            log::debug!("Drop at {:.3}s (surge {:.3})", timestamp, surge);
        }

        self.decay()
    }

    /// Silent frame: decay without a trigger and record zero energy
    ///
    /// The next audible frame's surge is measured from silence.
    pub fn silence(&mut self) -> f32 {
        self.previous_energy = 0.0;
        self.decay()
    }

    fn decay(&mut self) -> f32 {
        self.intensity *= self.config.decay;
        if self.intensity < self.config.epsilon {
            self.intensity = 0.0;
        }
        self.intensity
    }

    /// Forget energy, intensity and trigger time
    pub fn reset(&mut self) {
        self.previous_energy = 0.0;
        self.intensity = 0.0;
        self.last_trigger = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 60.0;

    #[test]
    fn test_surge_triggers_and_decays() {
        let mut drop = DropDetector::new(DropConfig::default());
        let mut t = 0.0;
        for _ in 0..60 {
            assert_eq!(drop.process(0.1, t), 0.0);
            t += FRAME;
        }

        let first = drop.process(0.9, t);
        assert!((first - 0.8 * 0.95).abs() < 1e-5, "got {}", first);

        let mut last = first;
        let mut frames = 0;
        while last > 0.0 {
            t += FRAME;
            let next = drop.process(0.9, t);
            assert!(next < last);
            last = next;
            frames += 1;
            assert!(frames < 200, "intensity never reached zero");
        }
    }

    #[test]
    fn test_cooldown_blocks_retrigger() {
        let mut drop = DropDetector::new(DropConfig::default());
        drop.process(0.0, 0.0);
        assert!(drop.process(1.0, 0.1) > 0.0);
        drop.process(0.0, 0.2);
        let before = drop.intensity();

        // 300 ms after the first trigger: still cooling down
        let during = drop.process(1.0, 0.4);
        assert!((during - before * 0.95).abs() < 1e-6);

        // 700 ms after: allowed again
        drop.process(0.0, 0.75);
        let after = drop.process(1.0, 0.8);
        assert!((after - 0.95).abs() < 1e-5);
    }

    #[test]
    fn test_small_surge_ignored() {
        let mut drop = DropDetector::new(DropConfig::default());
        drop.process(0.2, 0.0);
        assert_eq!(drop.process(0.6, 1.0), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut drop = DropDetector::new(DropConfig::default());
        drop.process(0.0, 0.0);
        drop.process(1.0, 1.0);
        drop.reset();
        assert_eq!(drop.intensity(), 0.0);
        assert_eq!(drop.silence(), 0.0);
    }

    #[test]
    fn test_drop_after_silent_break() {
        let mut drop = DropDetector::new(DropConfig::default());
        let mut t = 0.0;
        for _ in 0..60 {
            drop.process(0.9, t);
            t += FRAME;
        }
        assert_eq!(drop.intensity(), 0.0);

        for _ in 0..30 {
            assert_eq!(drop.silence(), 0.0);
            t += FRAME;
        }

        // Back at the pre-break level: the jump from silence counts
        let after = drop.process(0.9, t);
        assert!((after - 0.9 * 0.95).abs() < 1e-5, "got {}", after);
    }
}
