use fixed::types::I32F32;

/// A length in PostScript points, stored as fixed point so repeated derivations stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pt(I32F32);

impl Pt {
    pub const ZERO: Pt = Pt(I32F32::from_bits(0));

    pub const fn from_whole(value: i32) -> Pt {
        Pt(I32F32::from_bits((value as i64) << 32))
    }

    pub fn from_f32(value: f32) -> Pt {
        if !value.is_finite() {
            return Pt::ZERO;
        }
        let milli = (value as f64 * 1000.0).round();
        let milli = milli.clamp(i32::MIN as f64, i32::MAX as f64) as i64;
        Pt::from_milli(milli)
    }

    pub fn from_px(px: f32) -> Pt {
        Pt::from_f32(px * 0.75)
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn to_px(self) -> f32 {
        self.to_f32() / 0.75
    }

    pub fn max(self, other: Pt) -> Pt {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Pt) -> Pt {
        if self <= other { self } else { other }
    }

    fn from_milli(milli: i64) -> Pt {
        let denom = 1i128 << 32;
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli as i128 * denom + adj) / 1000;
        let bits = bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Pt(I32F32::from_bits(bits))
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Mul<f32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: f32) -> Pt {
        if !rhs.is_finite() {
            return Pt::ZERO;
        }
        Pt::from_f32(self.to_f32() * rhs)
    }
}

impl std::ops::Div<f32> for Pt {
    type Output = Pt;
    fn div(self, rhs: f32) -> Pt {
        if rhs == 0.0 || !rhs.is_finite() {
            Pt::ZERO
        } else {
            Pt::from_f32(self.to_f32() / rhs)
        }
    }
}

impl std::ops::Neg for Pt {
    type Output = Pt;
    fn neg(self) -> Pt {
        Pt(self.0.saturating_neg())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: Pt,
    pub height: Pt,
}

impl Size {
    pub fn a4() -> Self {
        Self {
            width: Pt::from_f32(595.28),
            height: Pt::from_f32(841.89),
        }
    }

    pub fn letter() -> Self {
        // 8.5in x 11in at 72pt/in.
        Self {
            width: Pt::from_f32(612.0),
            height: Pt::from_f32(792.0),
        }
    }
}

/// sRGB color with straight alpha, components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

/// Device CMYK color, components in 0..=1. Only produced when CMYK support is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CmykColor {
    pub c: f32,
    pub m: f32,
    pub y: f32,
    pub k: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintColor {
    Rgb(Color),
    Cmyk(CmykColor),
}

impl PaintColor {
    pub fn is_transparent(&self) -> bool {
        match self {
            PaintColor::Rgb(color) => color.is_transparent(),
            PaintColor::Cmyk(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn px_and_points_convert_at_96_dpi() {
        assert_eq!(Pt::from_px(16.0), Pt::from_f32(12.0));
        assert!((Pt::from_f32(12.0).to_px() - 16.0).abs() < 0.001);
    }

    #[test]
    fn arithmetic_is_stable() {
        let a = Pt::from_f32(1.5);
        let b = Pt::from_f32(0.25);
        assert_eq!(a + b, Pt::from_f32(1.75));
        assert_eq!(a - b, Pt::from_f32(1.25));
        assert_eq!(a * 2.0, Pt::from_f32(3.0));
        assert_eq!(a / 0.0, Pt::ZERO);
        assert_eq!(-a, Pt::from_f32(-1.5));
        assert_eq!(a.max(b), a);
    }

    #[test]
    fn rgba8_scales_components() {
        let color = Color::rgba8(255, 0, 51, 0);
        assert_eq!(color.r, 1.0);
        assert!((color.b - 0.2).abs() < 0.001);
        assert!(color.is_transparent());
        assert!(!PaintColor::Rgb(Color::BLACK).is_transparent());
    }
}
