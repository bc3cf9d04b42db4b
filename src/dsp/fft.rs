//! Iterative radix-2 FFT.
//!
//! ```text
//! x[0..N] ──→ bit-reverse permutation ──→ log2(N) butterfly stages ──→ X[0..N]
//!
//! stage with span m:   a' = a + w·b
//!                      b' = a - w·b        w = e^(∓2πik/m)
//! ```
//!
//! The direction picks the twiddle sign; the inverse also scales by `1/N`
//! so `inverse(forward(x)) == x`.

use std::f32::consts::TAU;

use rustfft::num_complex::Complex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

/// Power-of-two transform with precomputed twiddles and permutation.
#[derive(Debug, Clone)]
pub struct Radix2Fft {
    len: usize,
    /// `e^(-2πik/N)` for `k < N/2`
    twiddles: Vec<Complex<f32>>,
    reversed: Vec<usize>,
}

impl Radix2Fft {
    /// Plan a transform of `len` points. `len` must be a power of two.
    pub fn new(len: usize) -> Self {
        assert!(len.is_power_of_two(), "FFT length {} is not a power of two", len);

        let twiddles = (0..len / 2)
            .map(|k| Complex::from_polar(1.0, -TAU * k as f32 / len as f32))
            .collect();

        let bits = len.trailing_zeros();
        let reversed = (0..len)
            .map(|i| if bits == 0 { 0 } else { i.reverse_bits() >> (usize::BITS - bits) })
            .collect();

        Self {
            len,
            twiddles,
            reversed,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Transform `buffer` in place.
    pub fn process(&self, buffer: &mut [Complex<f32>], direction: Direction) {
        debug_assert_eq!(buffer.len(), self.len);

        for (i, &j) in self.reversed.iter().enumerate() {
            if i < j {
                buffer.swap(i, j);
            }
        }

        let mut span = 2;
        while span <= self.len {
            let half = span / 2;
            let stride = self.len / span;
            for block in buffer.chunks_exact_mut(span) {
                let (lo, hi) = block.split_at_mut(half);
                for (k, (a, b)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                    let w = match direction {
                        Direction::Forward => self.twiddles[k * stride],
                        Direction::Inverse => self.twiddles[k * stride].conj(),
                    };
                    let t = w * *b;
                    *b = *a - t;
                    *a += t;
                }
            }
            span *= 2;
        }

        if direction == Direction::Inverse {
            let scale = 1.0 / self.len as f32;
            for x in buffer.iter_mut() {
                *x *= scale;
            }
        }
    }

    pub fn forward(&self, buffer: &mut [Complex<f32>]) {
        self.process(buffer, Direction::Forward);
    }

    pub fn inverse(&self, buffer: &mut [Complex<f32>]) {
        self.process(buffer, Direction::Inverse);
    }
}
