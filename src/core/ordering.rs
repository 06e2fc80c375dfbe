use crate::core::grid::decode_address;
use crate::domain::model::{Address, GridDirection};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

/// Patterns that strip a token down to its alphabetic and numeric parts.
/// Each pattern matches the characters to remove.
#[derive(Debug, Clone)]
pub struct SortPatterns {
    pub alpha: Regex,
    pub numeric: Regex,
}

static DEFAULT_PATTERNS: Lazy<SortPatterns> = Lazy::new(|| SortPatterns {
    alpha: Regex::new(r"[^a-zA-Z]").expect("static pattern"),
    numeric: Regex::new(r"[^0-9]").expect("static pattern"),
});

// None sorts after every number.
#[derive(Debug, PartialEq, Eq)]
struct NumericKey(Option<u64>);

impl PartialOrd for NumericKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumericKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

fn sort_keys(value: &str, patterns: &SortPatterns) -> (String, NumericKey) {
    let alpha = patterns.alpha.replace_all(value, "").into_owned();
    let digits = patterns.numeric.replace_all(value, "");
    (alpha, NumericKey(digits.parse::<u64>().ok()))
}

/// Compares two tokens by their alphabetic and numeric parts.
///
/// With `alpha_first` the alphabetic part is the primary key and the number
/// breaks ties; otherwise the number comes first.
pub fn regex_sort(a: &str, b: &str, patterns: &SortPatterns, alpha_first: bool) -> Ordering {
    let (alpha_a, numeric_a) = sort_keys(a, patterns);
    let (alpha_b, numeric_b) = sort_keys(b, patterns);

    if alpha_first {
        alpha_a.cmp(&alpha_b).then_with(|| numeric_a.cmp(&numeric_b))
    } else {
        numeric_a.cmp(&numeric_b).then_with(|| alpha_a.cmp(&alpha_b))
    }
}

/// [`regex_sort`] with letters and digits split out, so `"A2" < "A10"`.
pub fn alpha_numeric_sort_default(a: &str, b: &str, alpha_first: bool) -> Ordering {
    regex_sort(a, b, &DEFAULT_PATTERNS, alpha_first)
}

/// Orders addresses by (column, row) for column-major directions, else by
/// (row, column). Addresses that cannot be decoded go last, in input order.
pub fn sort_with_direction(addresses: &[Address], direction: GridDirection) -> Vec<Address> {
    let mut keyed: Vec<(Option<(u32, u32)>, &Address)> = addresses
        .iter()
        .map(|address| {
            let position = decode_address(address).ok().map(|(row, column)| {
                if direction.is_column_major() {
                    (column, row)
                } else {
                    (row, column)
                }
            });
            (position, address)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    keyed.into_iter().map(|(_, address)| address.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut values: Vec<&str>, alpha_first: bool) -> Vec<&str> {
        values.sort_by(|a, b| alpha_numeric_sort_default(a, b, alpha_first));
        values
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert_eq!(sorted(vec!["A10", "A2", "A1"], true), vec!["A1", "A2", "A10"]);
    }

    #[test]
    fn test_alpha_first_groups_by_letters() {
        assert_eq!(
            sorted(vec!["B1", "A10", "A2", "B10"], true),
            vec!["A2", "A10", "B1", "B10"]
        );
    }

    #[test]
    fn test_numeric_first_groups_by_number() {
        assert_eq!(
            sorted(vec!["B1", "A10", "A2", "B10"], false),
            vec!["B1", "A2", "A10", "B10"]
        );
    }

    #[test]
    fn test_missing_number_sorts_last() {
        assert_eq!(sorted(vec!["Tube", "Tube2", "Tube1"], true), vec!["Tube1", "Tube2", "Tube"]);
        assert_eq!(alpha_numeric_sort_default("X", "X", true), Ordering::Equal);
    }

    #[test]
    fn test_custom_patterns() {
        let patterns = SortPatterns {
            alpha: Regex::new(r"[^a-z]").unwrap(),
            numeric: Regex::new(r"[^0-9]").unwrap(),
        };
        // upper-case letters are stripped, leaving only the number to decide
        assert_eq!(regex_sort("Z1", "A2", &patterns, true), Ordering::Less);
    }

    #[test]
    fn test_sort_with_direction() {
        let addresses: Vec<Address> =
            ["B2", "A2", "B1", "A1"].iter().map(|a| a.to_string()).collect();

        assert_eq!(
            sort_with_direction(&addresses, GridDirection::RightDown),
            vec!["A1", "A2", "B1", "B2"]
        );
        assert_eq!(
            sort_with_direction(&addresses, GridDirection::DownRight),
            vec!["A1", "B1", "A2", "B2"]
        );
    }

    #[test]
    fn test_sort_with_direction_handles_large_grids() {
        let addresses: Vec<Address> = ["27,1", "B10", "B9", "bogus"]
            .iter()
            .map(|a| a.to_string())
            .collect();
        assert_eq!(
            sort_with_direction(&addresses, GridDirection::RightDown),
            vec!["B9", "B10", "27,1", "bogus"]
        );
    }
}
