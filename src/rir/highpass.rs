//! Allen & Berkley DC-removal filter for impulse responses.
//!
//! Fixed 100 Hz cutoff, two-pole recursion:
//!
//! ```text
//! Y0 = B1·Y1 + B2·Y2 + x
//! y  = Y0 + A1·Y1 + R1·Y2
//! ```

use std::f32::consts::TAU;

pub const CUTOFF_HZ: f32 = 100.0;

pub struct HighPass {
    y1: f32,
    y2: f32,

    r1: f32,
    b1: f32,
    b2: f32,
    a1: f32,
}

impl HighPass {
    pub fn new(sample_rate: f32) -> Self {
        let w = TAU * CUTOFF_HZ / sample_rate;
        let r1 = (-w).exp();
        Self {
            y1: 0.0,
            y2: 0.0,
            r1,
            b1: 2.0 * r1 * w.cos(),
            b2: -r1 * r1,
            a1: -(1.0 + r1),
        }
    }

    #[inline]
    pub fn next_sample(&mut self, x: f32) -> f32 {
        let y0 = self.b1 * self.y1 + self.b2 * self.y2 + x;
        let out = y0 + self.a1 * self.y1 + self.r1 * self.y2;
        self.y2 = self.y1;
        self.y1 = y0;
        out
    }

    /// Filter in place, starting from rest.
    pub fn render(&mut self, buffer: &mut [f32]) {
        self.reset();
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
