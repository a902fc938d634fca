//! Next-version computation for wildcard prefix patterns.
//!
//! A pattern such as `v4.3.*` fixes the literal prefix `v4.3.` and marks the
//! numeric group right after it as the one to bump. Every numeric group after
//! the bumped one resets to `0`; everything else is copied verbatim.

pub const WILDCARD: char = '*';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("tag '{tag}' has no number at position {position} required by pattern '{pattern}'")]
    NoNumericSegment {
        tag: String,
        pattern: String,
        position: usize,
    },

    #[error("numeric segment '{digits}' of tag '{tag}' is too large")]
    Overflow { tag: String, digits: String },
}

/// Length of the literal prefix of `pattern`, i.e. the pattern without
/// wildcard markers, counted in characters.
pub fn literal_prefix_len(pattern: &str) -> usize {
    pattern.chars().filter(|c| *c != WILDCARD).count()
}

/// The part of `pattern` a matching tag must start with.
pub fn literal_prefix(pattern: &str) -> &str {
    pattern.split(WILDCARD).next().unwrap_or("")
}

/// Compute the tag that follows `current` under `pattern`.
pub fn next(current: &str, pattern: &str) -> Result<String, VersionError> {
    let position = literal_prefix_len(pattern);
    let chars: Vec<char> = current.chars().collect();

    if !chars.get(position).is_some_and(char::is_ascii_digit) {
        return Err(VersionError::NoNumericSegment {
            tag: current.to_string(),
            pattern: pattern.to_string(),
            position,
        });
    }

    let mut out: String = chars[..position].iter().collect();

    let end = chars[position..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(chars.len(), |offset| position + offset);
    let digits: String = chars[position..end].iter().collect();
    let bumped = digits
        .parse::<u64>()
        .ok()
        .and_then(|value| value.checked_add(1))
        .ok_or_else(|| VersionError::Overflow {
            tag: current.to_string(),
            digits: digits.clone(),
        })?;
    out.push_str(&bumped.to_string());

    let mut in_run = false;
    for c in &chars[end..] {
        if c.is_ascii_digit() {
            if !in_run {
                out.push('0');
                in_run = true;
            }
        } else {
            out.push(*c);
            in_run = false;
        }
    }
    Ok(out)
}
