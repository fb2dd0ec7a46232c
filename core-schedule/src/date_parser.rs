//! Day-month-year token parsing.

use chrono::NaiveDate;

struct DateFormat {
    separator: char,
    year_digits: usize,
    pattern: &'static str,
}

/// Tried in order; the first format that parses wins.
const FORMATS: [DateFormat; 6] = [
    DateFormat { separator: '_', year_digits: 4, pattern: "%d_%m_%Y" },
    DateFormat { separator: '.', year_digits: 4, pattern: "%d.%m.%Y" },
    DateFormat { separator: '-', year_digits: 4, pattern: "%d-%m-%Y" },
    DateFormat { separator: '_', year_digits: 2, pattern: "%d_%m_%y" },
    DateFormat { separator: '.', year_digits: 2, pattern: "%d.%m.%y" },
    DateFormat { separator: '-', year_digits: 2, pattern: "%d-%m-%y" },
];

impl DateFormat {
    fn parse(&self, token: &str) -> Option<NaiveDate> {
        if !self.matches_shape(token) {
            return None;
        }
        NaiveDate::parse_from_str(token, self.pattern).ok()
    }

    /// chrono is lenient about field widths, so the digit counts are checked
    /// up front.
    fn matches_shape(&self, token: &str) -> bool {
        let parts: Vec<&str> = token.split(self.separator).collect();
        let [day, month, year] = parts.as_slice() else {
            return false;
        };

        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        all_digits(day)
            && all_digits(month)
            && all_digits(year)
            && day.len() <= 2
            && month.len() <= 2
            && year.len() == self.year_digits
    }
}

/// Parse a date token such as `01_01_2022`, `1.1.22` or `31-12-2022`.
///
/// Returns `None` when no accepted format matches; callers treat that as
/// "no constraint". Two-digit years follow chrono's `%y` century rule,
/// so `22` is 2022 and `99` is 1999.
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    let token = token.trim();
    FORMATS.iter().find_map(|format| format.parse(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_separators_agree() {
        let expected = date(2022, 1, 1);
        assert_eq!(parse_date("01_01_2022"), expected);
        assert_eq!(parse_date("01.01.2022"), expected);
        assert_eq!(parse_date("01-01-2022"), expected);
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(parse_date("02.04.22"), date(2022, 4, 2));
        assert_eq!(parse_date("1_1_22"), date(2022, 1, 1));
        assert_eq!(parse_date("31-12-99"), date(1999, 12, 31));
        assert_eq!(parse_date("01_01_00"), date(2000, 1, 1));
    }

    #[test]
    fn test_single_digit_day_and_month() {
        assert_eq!(parse_date("3_3_2022"), date(2022, 3, 3));
        assert_eq!(parse_date("9.11.2023"), date(2023, 11, 9));
    }

    #[test]
    fn test_rejected_tokens() {
        assert_eq!(parse_date("2022_01_01"), None);
        assert_eq!(parse_date("01-01_2022"), None);
        assert_eq!(parse_date("01_01_202"), None);
        assert_eq!(parse_date("001_01_2022"), None);
        assert_eq!(parse_date("01/01/2022"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("tomorrow"), None);
    }

    #[test]
    fn test_calendar_invalid_dates() {
        assert_eq!(parse_date("31_02_2022"), None);
        assert_eq!(parse_date("00.01.2022"), None);
        assert_eq!(parse_date("29-02-2024"), date(2024, 2, 29));
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(parse_date(" 04_04_2022\n"), date(2022, 4, 4));
    }
}
