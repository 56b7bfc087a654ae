// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small HSL color type with CSS conversion semantics.

use core::fmt;

/// A color in HSL space.
///
/// `h` is in degrees (any value; normalized modulo 360 on conversion),
/// `s` and `l` are in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hsl {
    /// Hue angle in degrees.
    pub h: f64,
    /// Saturation.
    pub s: f64,
    /// Lightness.
    pub l: f64,
}

impl Hsl {
    /// Creates a color; components are taken as-is.
    #[must_use]
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    /// Same hue and saturation at a different lightness, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_lightness(self, l: f64) -> Self {
        Self {
            l: l.clamp(0.0, 1.0),
            ..self
        }
    }

    /// A lighter variant of this color.
    #[must_use]
    pub fn lighten(self, amount: f64) -> Self {
        self.with_lightness(self.l + amount)
    }

    /// Converts to 8-bit RGB using the CSS HSL model.
    #[must_use]
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let h = self.h.rem_euclid(360.0);
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = h / 60.0;
        let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
        let (r1, g1, b1) = match hp {
            v if v < 1.0 => (c, x, 0.0),
            v if v < 2.0 => (x, c, 0.0),
            v if v < 3.0 => (0.0, c, x),
            v if v < 4.0 => (0.0, x, c),
            v if v < 5.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "channels are clamped to [0, 1] before scaling."
        )]
        let to8 = |v: f64| ((v + m) * 255.0).round() as u8;
        (to8(r1), to8(g1), to8(b1))
    }

    /// Converts to a `#rrggbb` hex string.
    #[must_use]
    pub fn to_hex(self) -> String {
        let (r, g, b) = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({:.0}, {:.0}%, {:.0}%)",
            self.h.rem_euclid(360.0),
            self.s * 100.0,
            self.l * 100.0
        )
    }
}
