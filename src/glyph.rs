use crossterm::style::Color;
use rand::Rng;

pub(crate) const CHARSET: &[char] = &[
    '0', '1', '<', '>', '[', ']', '{', '}', '/', '*', '-', '=', '+', '▒', '▓', '░', '◊', '∆', 'Σ',
    'Ω', 'Ψ', 'λ',
];

// #0aff9d, #3ef8ff, #45f4b0
pub(crate) const PALETTE: [Rgb; 3] = [
    Rgb::new(10.0 / 255.0, 1.0, 157.0 / 255.0),
    Rgb::new(62.0 / 255.0, 248.0 / 255.0, 1.0),
    Rgb::new(69.0 / 255.0, 244.0 / 255.0, 176.0 / 255.0),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rgb {
    pub(crate) r: f32,
    pub(crate) g: f32,
    pub(crate) b: f32,
}

impl Rgb {
    pub(crate) const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub(crate) const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub(crate) fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub(crate) fn mix(self, top: Rgb, a: f32) -> Rgb {
        let a = a.clamp(0.0, 1.0);
        Rgb {
            r: self.r + (top.r - self.r) * a,
            g: self.g + (top.g - self.g) * a,
            b: self.b + (top.b - self.b) * a,
        }
    }

    pub(crate) fn screen(self, top: Rgb, a: f32) -> Rgb {
        let scr = |d: f32, s: f32| 1.0 - (1.0 - d) * (1.0 - s);
        self.mix(
            Rgb {
                r: scr(self.r, top.r),
                g: scr(self.g, top.g),
                b: scr(self.b, top.b),
            },
            a,
        )
    }

    pub(crate) fn distance(self, o: Rgb) -> f32 {
        (self.r - o.r)
            .abs()
            .max((self.g - o.g).abs())
            .max((self.b - o.b).abs())
    }

    pub(crate) fn to_color(self) -> Color {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        Color::Rgb {
            r: q(self.r),
            g: q(self.g),
            b: q(self.b),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rgba {
    pub(crate) rgb: Rgb,
    pub(crate) a: f32,
}

impl Rgba {
    pub(crate) const fn new(rgb: Rgb, a: f32) -> Self {
        Self { rgb, a }
    }
}

pub(crate) fn pick_glyph<R: Rng + ?Sized>(rng: &mut R) -> char {
    CHARSET[rng.gen_range(0..CHARSET.len())]
}

pub(crate) fn pick_color<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    PALETTE[rng.gen_range(0..PALETTE.len())]
}
