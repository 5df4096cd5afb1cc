//! Bounded scalar controls with an adjustable rate of change
//!
//! A [`Slider`] decouples the value from the step applied by
//! `increase`/`decrease`, and the step from the factor used to make it
//! faster or slower. Pan, zoom and the black/white threshold all run on it.

/// Exponent of the logistic-style S-curve
pub const S_CURVE_CURVYNESS: f64 = 1.75;

/// Response curve applied by one increase/decrease step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// `value ± max(rate, quantum)`
    Linear,
    /// `value × rate` / `value ÷ rate`, rate > 1
    Exponential,
    /// Step is taken in a logistic domain so the ends move slower than the middle
    SCurve,
}

/// A bounded value plus its own rate of change
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    value: f64,
    default: f64,
    rate: f64,
    rate_default: f64,
    rate_multiplier: f64,
    min: f64,
    max: f64,
    strict_bounds: bool,
    curve: Curve,
    quantum: Option<f64>,
}

impl Slider {
    pub fn new(
        default: f64,
        rate_default: f64,
        rate_multiplier: f64,
        curve: Curve,
        min: f64,
        max: f64,
        strict_bounds: bool,
    ) -> Self {
        Self {
            value: default,
            default,
            rate: rate_default,
            rate_default,
            rate_multiplier,
            min,
            max,
            strict_bounds,
            curve,
            quantum: None,
        }
    }

    /// Round values to multiples of `quantum` offset from `min`
    pub fn with_quantum(mut self, quantum: f64) -> Self {
        self.quantum = Some(quantum);
        self
    }

    pub fn get(&self) -> f64 {
        self.value
    }

    /// Set the value directly. Not clamped.
    pub fn set(&mut self, value: f64) {
        self.value = value;
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Change the bounds (e.g. when the screen size becomes known)
    pub fn set_bounds(&mut self, min: f64, max: f64) {
        self.min = min;
        self.max = max;
    }

    /// Position of the value inside `[min, max]`
    pub fn normalized(&self) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        (self.value - self.min) / span
    }

    /// Map `n` in `[0, 1]` onto `[min, max]`, then quantize and clamp.
    pub fn set_normalized(&mut self, n: f64) {
        let mut value = n * (self.max - self.min) + self.min;
        value = self.quantize(value);
        if self.strict_bounds {
            value = value.clamp(self.min, self.max);
        }
        self.value = value;
    }

    pub fn increase(&mut self) {
        self.step(self.rate, true);
    }

    pub fn decrease(&mut self) {
        self.step(self.rate, false);
    }

    /// Increase using `rate / divisor` as the step.
    ///
    /// Pan sliders divide by the current zoom so one step covers the same
    /// share of the visible area at any zoom level.
    pub fn increase_scaled(&mut self, divisor: f64) {
        if let Some(rate) = scaled_rate(self.rate, divisor) {
            self.step(rate, true);
        }
    }

    pub fn decrease_scaled(&mut self, divisor: f64) {
        if let Some(rate) = scaled_rate(self.rate, divisor) {
            self.step(rate, false);
        }
    }

    pub fn increase_rate(&mut self) {
        self.rate = match self.curve {
            Curve::Exponential => (self.rate - 1.0) * self.rate_multiplier + 1.0,
            _ => self.rate * self.rate_multiplier,
        };
    }

    pub fn decrease_rate(&mut self) {
        self.rate = match self.curve {
            Curve::Exponential => (self.rate - 1.0) / self.rate_multiplier + 1.0,
            _ => self.rate / self.rate_multiplier,
        };
    }

    /// Restore both value and rate to their construction defaults
    pub fn reset(&mut self) {
        self.value = self.default;
        self.rate = self.rate_default;
    }

    fn step(&mut self, rate: f64, up: bool) {
        let n = self.value;
        let mut next = match self.curve {
            Curve::Exponential => {
                if up {
                    n * rate
                } else {
                    n / rate
                }
            }
            Curve::SCurve => {
                let signed = if up { rate } else { -rate };
                self.s_curve_step(n, signed)
            }
            Curve::Linear => {
                let step = self.quantum.map_or(rate, |q| rate.max(q));
                if up {
                    n + step
                } else {
                    n - step
                }
            }
        };

        if self.strict_bounds {
            next = next.clamp(self.min, self.max);
        }
        self.value = self.quantize(next);
    }

    fn s_curve_step(&self, n: f64, rate: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return n;
        }
        let orig = (n - self.min) / span;
        let transformed = s_curve_inverse(orig) + rate / span;
        s_curve(transformed) * span + self.min
    }

    fn quantize(&self, n: f64) -> f64 {
        let Some(q) = self.quantum.filter(|q| *q > 0.0) else {
            return n;
        };
        let rounded = ((n - self.min) / q).round() * q + self.min;
        if self.strict_bounds {
            rounded.clamp(self.min, self.max)
        } else {
            rounded
        }
    }
}

fn scaled_rate(rate: f64, divisor: f64) -> Option<f64> {
    if divisor.is_finite() && divisor > 0.0 {
        Some(rate / divisor)
    } else {
        tracing::warn!("Ignoring slider step with divisor {}", divisor);
        None
    }
}

/// Logistic-style curve on `(0, 1)`. Values at or beyond either end pass through.
pub fn s_curve(x: f64) -> f64 {
    if x >= 1.0 || x <= 0.0 {
        return x;
    }
    1.0 / (1.0 + (x / (1.0 - x)).powf(-S_CURVE_CURVYNESS))
}

/// Inverse of [`s_curve`], same pass-through policy
pub fn s_curve_inverse(y: f64) -> f64 {
    if y >= 1.0 || y <= 0.0 {
        return y;
    }
    if y == 0.5 {
        return 0.5;
    }
    1.0 / ((1.0 / y - 1.0).powf(1.0 / S_CURVE_CURVYNESS) + 1.0)
}

/// Moves several sliders together
///
/// Zoom X and Y scale in lockstep so the aspect fit is kept; the pan axes
/// share rate changes but are stepped on their own.
pub struct CompositeSlider<'a> {
    sliders: Vec<&'a mut Slider>,
}

impl<'a> CompositeSlider<'a> {
    pub fn new(sliders: Vec<&'a mut Slider>) -> Self {
        Self { sliders }
    }

    pub fn increase(&mut self) {
        self.sliders.iter_mut().for_each(|s| s.increase());
    }

    pub fn decrease(&mut self) {
        self.sliders.iter_mut().for_each(|s| s.decrease());
    }

    pub fn increase_rate(&mut self) {
        self.sliders.iter_mut().for_each(|s| s.increase_rate());
    }

    pub fn decrease_rate(&mut self) {
        self.sliders.iter_mut().for_each(|s| s.decrease_rate());
    }

    /// Move the first member to `n` and keep every other member at its
    /// previous ratio to the first.
    ///
    /// If the first member is zero no ratio exists, so every member is set
    /// to `n` on its own.
    pub fn set_normalized(&mut self, n: f64) {
        let Some(first) = self.sliders.first() else {
            return;
        };
        let first_value = first.get();
        if first_value == 0.0 {
            self.sliders.iter_mut().for_each(|s| s.set_normalized(n));
            return;
        }

        let ratios: Vec<f64> = self.sliders.iter().map(|s| s.get() / first_value).collect();
        self.sliders[0].set_normalized(n);
        let new_first = self.sliders[0].get();
        for (slider, ratio) in self.sliders.iter_mut().zip(ratios).skip(1) {
            slider.set(new_first * ratio);
        }
    }
}
