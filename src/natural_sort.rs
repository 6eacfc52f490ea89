//! Natural alphanumeric ordering
//!
//! Runs of ASCII digits compare by numeric value, every other character
//! compares case-insensitively, so `page2.jpg` sorts before `page10.jpg` and
//! `B.png` after `a.jpg`.

use std::cmp::Ordering;

/// Split a leading run of ASCII digits off `s`
fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Compare two digit runs by value without parsing (runs may exceed `u64`)
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Case-insensitive natural comparison; names that differ only in case or
/// leading zeros compare equal here.
pub fn natural_cmp_loose(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        let (x, y) = match (a.chars().next(), b.chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => (x, y),
        };

        if x.is_ascii_digit() && y.is_ascii_digit() {
            let (run_a, rest_a) = split_digits(a);
            let (run_b, rest_b) = split_digits(b);
            match compare_numeric(run_a, run_b) {
                Ordering::Equal => {}
                ord => return ord,
            }
            a = rest_a;
            b = rest_b;
        } else {
            match x.to_lowercase().cmp(y.to_lowercase()) {
                Ordering::Equal => {}
                ord => return ord,
            }
            a = &a[x.len_utf8()..];
            b = &b[y.len_utf8()..];
        }
    }
}

/// Total natural ordering: loose comparison first, raw byte order as the
/// final tie breaker so sorting never depends on input order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_cmp_loose(a, b).then_with(|| a.cmp(b))
}

/// Sort items in place by a string key using [`natural_cmp`]
pub fn sort_natural_by_key<T, F>(items: &mut [T], mut key: F)
where
    F: FnMut(&T) -> &str,
{
    items.sort_by(|a, b| natural_cmp(key(a), key(b)));
}
