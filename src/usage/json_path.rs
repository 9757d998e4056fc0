//! Read-only JSON path helpers for probing usage envelopes.

use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PathSeg {
    Key(String),
    Index(usize),
}

/// Parse a dotted/array path like `generations[0][0].message.usage_metadata`
pub(crate) fn parse_path(path: &str) -> Vec<PathSeg> {
    let mut segs = Vec::new();
    for part in path.split('.') {
        if part.is_empty() {
            continue;
        }
        let mut key = String::new();
        let mut chars = part.chars().peekable();
        while let Some(&ch) = chars.peek() {
            if ch == '[' {
                break;
            }
            key.push(ch);
            chars.next();
        }
        if !key.is_empty() {
            segs.push(PathSeg::Key(key));
        }
        // Zero or more [number]
        while let Some(&ch) = chars.peek() {
            if ch != '[' {
                break;
            }
            chars.next();
            let mut num = String::new();
            while let Some(&d) = chars.peek() {
                if d == ']' {
                    break;
                }
                num.push(d);
                chars.next();
            }
            let _ = chars.next();
            if let Ok(idx) = num.parse::<usize>() {
                segs.push(PathSeg::Index(idx));
            }
        }
    }
    segs
}

/// Get immutable reference by path
pub(crate) fn get_path<'a>(v: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = v;
    for seg in parse_path(path) {
        match (seg, cur) {
            (PathSeg::Key(k), Value::Object(map)) => {
                cur = map.get(&k)?;
            }
            (PathSeg::Index(i), Value::Array(arr)) => {
                cur = arr.get(i)?;
            }
            _ => return None,
        }
    }
    Some(cur)
}

/// Read a token count leniently.
///
/// Accepts integers, floats (truncated) and numeric strings. Negative, null and
/// non-numeric values count as absent.
pub(crate) fn read_count(v: &Value, path: &str) -> Option<u32> {
    match get_path(v, path)? {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(u32::try_from(u).unwrap_or(u32::MAX))
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.min(f64::from(u32::MAX)) as u32)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.min(f64::from(u32::MAX)) as u32)
            })
        }
        _ => None,
    }
}

/// First path that yields a count wins.
pub(crate) fn read_first_count(v: &Value, paths: &[&str]) -> Option<u32> {
    paths.iter().find_map(|p| read_count(v, p))
}
