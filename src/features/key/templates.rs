//! Krumhansl-Kessler key templates
//!
//! Probe-tone ratings for C major and C minor, rotated to every root.
//!
//! # Reference
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in Perceived
//! Tonal Organization in a Spatial Representation of Musical Keys. *Psychological Review*,
//! 89(4), 334-368.

/// C major probe-tone profile
pub const KK_MAJOR: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// C minor probe-tone profile
pub const KK_MINOR: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Key templates for all 24 keys
#[derive(Debug, Clone)]
pub struct KeyTemplates {
    /// Major key templates (index = root: C, C#, D, ..., B)
    pub major: [[f32; 12]; 12],

    /// Minor key templates (index = root: C, C#, D, ..., B)
    pub minor: [[f32; 12]; 12],
}

impl KeyTemplates {
    /// Rotate the C profiles to all 12 roots
    pub fn new() -> Self {
        Self {
            major: rotations(&KK_MAJOR),
            minor: rotations(&KK_MINOR),
        }
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}

fn rotations(profile: &[f32; 12]) -> [[f32; 12]; 12] {
    let mut out = [[0.0; 12]; 12];
    for (root, template) in out.iter_mut().enumerate() {
        for (pc, value) in template.iter_mut().enumerate() {
            *value = profile[(pc + 12 - root) % 12];
        }
    }
    out
}
