//! Range and bracket-pattern expansion used when bulk-creating named objects,
//! e.g. `Gi0/[1-3]` or `192.0.2.[10,20-22]/24`.

use crate::error::CsvImportError;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static ALPHANUMERIC_EXPANSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[((?:[a-zA-Z0-9]+[?:,-])+[a-zA-Z0-9]+)\]").expect("valid pattern")
});

static IP4_EXPANSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[((?:[0-9]{1,3}[?:,-])+[0-9]{1,3})\]").expect("valid pattern")
});

static IP6_EXPANSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[((?:[0-9a-f]{1,4}[?:,-])+[0-9a-f]{1,4})\]").expect("valid pattern")
});

/// Split `s` around the first bracket group: `(lead, inner, remnant)`.
fn split_once_on<'a>(re: &Regex, s: &'a str) -> Option<(&'a str, &'a str, &'a str)> {
    let caps = re.captures(s)?;
    let whole = caps.get(0)?;
    let inner = caps.get(1)?;
    Some((&s[..whole.start()], inner.as_str(), &s[whole.end()..]))
}

/// `a-b` splits into exactly two parts; anything else is a single value.
fn split_dash(part: &str) -> Option<(&str, &str)> {
    let mut pieces = part.split('-');
    match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(begin), Some(end), None) => Some((begin, end)),
        _ => None,
    }
}

/// Expand a numeric range list into sorted unique values.
///
/// `"0-3,5"` yields `[0, 1, 2, 3, 5]`; with base 16, `"8-b"` yields `[8, 9, 10, 11]`.
pub fn parse_numeric_range(s: &str, base: u32) -> Result<Vec<u64>, CsvImportError> {
    let mut values = BTreeSet::new();
    for dash_range in s.split(',') {
        let (begin, end) = split_dash(dash_range).unwrap_or((dash_range, dash_range));
        let parse = |v: &str| {
            u64::from_str_radix(v.trim(), base)
                .map_err(|_| CsvImportError::InvalidRange(dash_range.to_string()))
        };
        let (begin, end) = (parse(begin)?, parse(end)?);
        values.extend(begin..=end);
    }
    Ok(values.into_iter().collect())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}

/// Expand an alphanumeric range list.
///
/// `"a-d,f"` yields `[a, b, c, d, f]` and `"0-3,a-d"` yields
/// `[0, 1, 2, 3, a, b, c, d]`. A range mixing digits and letters, or mixing
/// letter case, yields an empty list.
pub fn parse_alphanumeric_range(s: &str) -> Result<Vec<String>, CsvImportError> {
    let mut values = Vec::new();
    for dash_range in s.split(',') {
        let (begin, end) = match split_dash(dash_range) {
            Some((begin, end)) => {
                let vals = format!("{begin}{end}");
                let mixed_kind = !is_digits(&vals) && !is_alpha(&vals);
                let mixed_case = is_alpha(&vals)
                    && !vals.chars().all(char::is_uppercase)
                    && !vals.chars().all(char::is_lowercase);
                if mixed_kind || mixed_case {
                    return Ok(Vec::new());
                }
                (begin, end)
            }
            None => (dash_range, dash_range),
        };

        if is_digits(begin) && is_digits(end) {
            let parse = |v: &str| {
                v.parse::<u64>()
                    .map_err(|_| CsvImportError::InvalidRange(dash_range.to_string()))
            };
            values.extend((parse(begin)?..=parse(end)?).map(|n| n.to_string()));
        } else if begin == end {
            values.push(begin.to_string());
        } else {
            let mut b = begin.chars();
            let mut e = end.chars();
            match (b.next(), b.next(), e.next(), e.next()) {
                (Some(first), None, Some(last), None) => {
                    values.extend((first..=last).map(String::from));
                }
                _ => return Err(CsvImportError::InvalidRange(dash_range.to_string())),
            }
        }
    }
    Ok(values)
}

/// Expand every bracket group in an alphanumeric pattern.
///
/// A string without a bracket group is returned unchanged.
pub fn expand_alphanumeric_pattern(s: &str) -> Result<Vec<String>, CsvImportError> {
    let Some((lead, pattern, remnant)) = split_once_on(&ALPHANUMERIC_EXPANSION, s) else {
        return Ok(vec![s.to_string()]);
    };

    let tails = if ALPHANUMERIC_EXPANSION.is_match(remnant) {
        expand_alphanumeric_pattern(remnant)?
    } else {
        vec![remnant.to_string()]
    };

    let mut out = Vec::new();
    for value in parse_alphanumeric_range(pattern)? {
        for tail in &tails {
            out.push(format!("{lead}{value}{tail}"));
        }
    }
    Ok(out)
}

/// Expand an IP address pattern. Family 4 ranges are decimal, family 6
/// ranges are hexadecimal.
///
/// `"192.0.2.[1,2,100-101]/24"` yields four addresses;
/// `"2001:db8:0:[0,fd-ff]::/64"` yields four prefixes.
pub fn expand_ipaddress_pattern(s: &str, family: u8) -> Result<Vec<String>, CsvImportError> {
    let (regex, base): (&Regex, u32) = match family {
        4 => (&IP4_EXPANSION, 10),
        6 => (&IP6_EXPANSION, 16),
        other => return Err(CsvImportError::InvalidFamily(other)),
    };

    let Some((lead, pattern, remnant)) = split_once_on(regex, s) else {
        return Ok(vec![s.to_string()]);
    };

    let tails = if regex.is_match(remnant) {
        expand_ipaddress_pattern(remnant, family)?
    } else {
        vec![remnant.to_string()]
    };

    let mut out = Vec::new();
    for value in parse_numeric_range(pattern, base)? {
        let rendered = if family == 6 {
            format!("{value:x}")
        } else {
            value.to_string()
        };
        for tail in &tails {
            out.push(format!("{lead}{rendered}{tail}"));
        }
    }
    Ok(out)
}
