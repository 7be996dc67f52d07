/// Counter representation for `list-style-type` and the `counter()` style argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStyle {
    Decimal,
    DecimalLeadingZero,
    LowerRoman,
    UpperRoman,
    LowerAlpha,
    UpperAlpha,
    LowerGreek,
    Disc,
    Circle,
    Square,
    None,
}

impl CounterStyle {
    /// Unknown names fall back to decimal.
    pub fn from_name(name: &str) -> CounterStyle {
        match name.trim().to_ascii_lowercase().as_str() {
            "decimal-leading-zero" => CounterStyle::DecimalLeadingZero,
            "lower-roman" => CounterStyle::LowerRoman,
            "upper-roman" => CounterStyle::UpperRoman,
            "lower-alpha" | "lower-latin" => CounterStyle::LowerAlpha,
            "upper-alpha" | "upper-latin" => CounterStyle::UpperAlpha,
            "lower-greek" => CounterStyle::LowerGreek,
            "disc" => CounterStyle::Disc,
            "circle" => CounterStyle::Circle,
            "square" => CounterStyle::Square,
            "none" => CounterStyle::None,
            _ => CounterStyle::Decimal,
        }
    }

    pub fn format(self, value: i32) -> String {
        match self {
            CounterStyle::Decimal => value.to_string(),
            CounterStyle::DecimalLeadingZero => {
                if (0..10).contains(&value) {
                    format!("0{value}")
                } else if (-9..0).contains(&value) {
                    format!("-0{}", -value)
                } else {
                    value.to_string()
                }
            }
            CounterStyle::LowerRoman => roman(value).to_ascii_lowercase(),
            CounterStyle::UpperRoman => roman(value),
            CounterStyle::LowerAlpha => alphabetic(value, &LATIN),
            CounterStyle::UpperAlpha => alphabetic(value, &LATIN).to_ascii_uppercase(),
            CounterStyle::LowerGreek => alphabetic(value, &GREEK),
            CounterStyle::Disc => "\u{2022}".to_string(),
            CounterStyle::Circle => "\u{25e6}".to_string(),
            CounterStyle::Square => "\u{25aa}".to_string(),
            CounterStyle::None => String::new(),
        }
    }
}

const LATIN: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z',
];

const GREEK: [char; 24] = [
    'α', 'β', 'γ', 'δ', 'ε', 'ζ', 'η', 'θ', 'ι', 'κ', 'λ', 'μ', 'ν', 'ξ', 'ο', 'π', 'ρ', 'σ', 'τ',
    'υ', 'φ', 'χ', 'ψ', 'ω',
];

/// Roman numerals cover 1..=3999; other values print as decimal.
fn roman(value: i32) -> String {
    const TABLE: [(i32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if !(1..=3999).contains(&value) {
        return value.to_string();
    }
    let mut rest = value;
    let mut out = String::new();
    for (amount, digits) in TABLE {
        while rest >= amount {
            out.push_str(digits);
            rest -= amount;
        }
    }
    out
}

/// Bijective base-N: a..z, aa, ab, ...
fn alphabetic(value: i32, alphabet: &[char]) -> String {
    if value < 1 {
        return value.to_string();
    }
    let base = alphabet.len() as u32;
    let mut rest = value as u32;
    let mut out = Vec::new();
    while rest > 0 {
        rest -= 1;
        out.push(alphabet[(rest % base) as usize]);
        rest /= base;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_styles() {
        assert_eq!(CounterStyle::from_name("decimal").format(12), "12");
        assert_eq!(CounterStyle::DecimalLeadingZero.format(7), "07");
        assert_eq!(CounterStyle::DecimalLeadingZero.format(42), "42");
        assert_eq!(CounterStyle::UpperRoman.format(1994), "MCMXCIV");
        assert_eq!(CounterStyle::LowerRoman.format(4), "iv");
        assert_eq!(CounterStyle::LowerRoman.format(0), "0");
    }

    #[test]
    fn alphabetic_styles() {
        assert_eq!(CounterStyle::LowerAlpha.format(1), "a");
        assert_eq!(CounterStyle::LowerAlpha.format(26), "z");
        assert_eq!(CounterStyle::from_name("upper-latin").format(27), "AA");
        assert_eq!(CounterStyle::LowerGreek.format(2), "β");
        assert_eq!(CounterStyle::LowerAlpha.format(-1), "-1");
    }

    #[test]
    fn symbols_and_fallback() {
        assert_eq!(CounterStyle::from_name("none").format(3), "");
        assert_eq!(CounterStyle::from_name("disc").format(3), "\u{2022}");
        assert_eq!(CounterStyle::from_name("klingon"), CounterStyle::Decimal);
    }
}
