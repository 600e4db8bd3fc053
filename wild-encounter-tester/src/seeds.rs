use anyhow::{Result, bail};

/// Seeds used when the caller asks for the `default` sweep.
pub const DEFAULT_SWEEP: [u64; 8] = [
    1337,
    0xC0FFEE,
    0xDEAD_BEEF,
    42,
    7,
    0x5EED,
    2024,
    0xFACE_B00C,
];

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Resolve CLI seed tokens into a de-duplicated seed list.
///
/// Supports decimal (negative values use their magnitude), `0x` hex, and
/// the keyword `default` which expands to [`DEFAULT_SWEEP`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("default") {
            pending.extend(DEFAULT_SWEEP);
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(&hex.replace('_', ""), 16)
        {
            pending.push(value);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<u64> = Vec::with_capacity(pending.len());
    for seed in pending {
        if !deduped.contains(&seed) {
            deduped.push(seed);
        }
    }

    if deduped.is_empty() {
        deduped.push(DEFAULT_SWEEP[0]);
    }

    Ok(deduped)
}
