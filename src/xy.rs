use std::{error::Error, fmt::Display};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XyError(String);

impl Display for XyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Error for XyError {}

pub type XyResult<T> = Result<T, XyError>;

/// A cell coordinate. `x` is the column, `y` is the row, both 0-based.
///
/// XY is the lingua franca between the parser's point locations, the sheet's
/// cell map and the A1 notation users type. Rows are 1-based in A1 notation
/// and 0-based here.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct XY {
    pub x: u32,
    pub y: u32,
}

impl XY {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Parse A1 notation: one or more uppercase column letters followed by a
    /// 1-based row number.
    pub fn from_a1(a1: &str) -> XyResult<Self> {
        let letters: String = a1.chars().take_while(char::is_ascii_uppercase).collect();
        let digits = &a1[letters.len()..];

        let x = column_letter_to_integer(&letters)?;

        let row = digits
            .parse::<u32>()
            .map_err(|_| XyError(format!("'{a1}' must end with a valid row number")))?;
        if row == 0 {
            return Err(XyError("row numbers start at 1".into()));
        }

        Ok(Self { x, y: row - 1 })
    }

    pub fn to_a1(self) -> String {
        format!("{}{}", integer_to_column_letter(self.x), self.y + 1)
    }

    pub fn to_column_letter(self) -> String {
        integer_to_column_letter(self.x)
    }
}

impl Display for XY {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Convert a column letter string to its 0-based index. Bijective base-26:
/// A..Z, AA..AZ, BA..ZZ, AAA..
pub fn column_letter_to_integer(letters: &str) -> XyResult<u32> {
    if letters.is_empty() {
        return Err(XyError("empty column letters".into()));
    }

    let mut value: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return Err(XyError(format!("'{c}' is not in [A-Z]")));
        }
        value = value * 26 + (c as u64 - 'A' as u64 + 1);
    }

    Ok((value - 1) as u32)
}

/// Inverse of [`column_letter_to_integer`].
pub fn integer_to_column_letter(i: u32) -> String {
    let mut letters = String::new();
    if i / 26 > 0 {
        letters.push_str(&integer_to_column_letter(i / 26 - 1));
    }
    letters.push((b'A' + (i % 26) as u8) as char);
    letters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(integer_to_column_letter(0), "A");
        assert_eq!(integer_to_column_letter(25), "Z");
        assert_eq!(integer_to_column_letter(26), "AA");
        assert_eq!(integer_to_column_letter(27), "AB");
        assert_eq!(integer_to_column_letter(51), "AZ");
        assert_eq!(integer_to_column_letter(52), "BA");
        assert_eq!(integer_to_column_letter(701), "ZZ");
        assert_eq!(integer_to_column_letter(702), "AAA");
    }

    #[test]
    fn test_column_letter_to_integer() {
        assert_eq!(column_letter_to_integer("A"), Ok(0));
        assert_eq!(column_letter_to_integer("Z"), Ok(25));
        assert_eq!(column_letter_to_integer("AA"), Ok(26));
        assert_eq!(column_letter_to_integer("AAA"), Ok(702));

        assert!(column_letter_to_integer("").is_err());
        assert!(column_letter_to_integer("a").is_err());
        assert!(column_letter_to_integer("A1").is_err());
    }

    #[test]
    fn test_column_letter_bijection() {
        for i in 0..=10_000 {
            assert_eq!(
                column_letter_to_integer(&integer_to_column_letter(i)),
                Ok(i)
            );
        }
    }

    #[test]
    fn test_column_letter_monotone() {
        let mut previous = integer_to_column_letter(0);
        for i in 1..=10_000 {
            let current = integer_to_column_letter(i);
            assert!(
                (previous.len(), previous.clone()) < (current.len(), current.clone()),
                "{previous} should precede {current}"
            );
            previous = current;
        }
    }

    #[test]
    fn test_from_a1() {
        assert_eq!(XY::from_a1("A1"), Ok(XY::new(0, 0)));
        assert_eq!(XY::from_a1("B3"), Ok(XY::new(1, 2)));
        assert_eq!(XY::from_a1("AA100"), Ok(XY::new(26, 99)));

        assert!(XY::from_a1("").is_err());
        assert!(XY::from_a1("A").is_err());
        assert!(XY::from_a1("1").is_err());
        assert!(XY::from_a1("A0").is_err());
        assert!(XY::from_a1("a1").is_err());
    }

    #[test]
    fn test_a1_round_trip() {
        for xy in [XY::new(0, 0), XY::new(26, 99), XY::new(17, 3)] {
            assert_eq!(XY::from_a1(&xy.to_a1()), Ok(xy));
        }
    }
}
