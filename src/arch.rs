//! CPU architecture family detection from an instance shape string.
//!
//! No teacher analogue exists for this: it is pure domain logic distilled
//! from the provider's instance-naming convention. The detection rule only
//! ever inspects the *family token* (the text before the first `.`), never
//! the full shape string — the size suffix (`large`, `xlarge`, `2xlarge`)
//! contains letters (`g`, `a`, `i`) that would misclassify a naive
//! substring search over the whole shape, which is exactly the trap this
//! module is built to avoid. See the test table below for every case this
//! protects against.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArchFamily {
    Arm,
    Amd,
    Intel,
}

/// Detect the CPU architecture family from an instance shape like
/// `c7g.large` or `m7a.4xlarge`.
///
/// Only the family token (everything before the first `.`) is inspected.
/// Within that token, the letters after the numeric generation digits are
/// the processor-family suffix: `g` marks an ARM (Graviton-class)
/// processor, a leading `a` in that suffix marks AMD, a leading `i` marks
/// Intel. Absent any suffix, Intel is the default.
pub fn detect_family(shape: &str) -> ArchFamily {
    let family_token = shape.split('.').next().unwrap_or(shape);

    if family_token.ends_with('g') {
        return ArchFamily::Arm;
    }

    let first_digit = family_token.find(|c: char| c.is_ascii_digit());
    let suffix = match first_digit {
        Some(start) => {
            let digits_end = family_token[start..]
                .find(|c: char| !c.is_ascii_digit())
                .map(|offset| start + offset)
                .unwrap_or(family_token.len());
            &family_token[digits_end..]
        }
        None => "",
    };

    if suffix.starts_with('a') {
        ArchFamily::Amd
    } else if suffix.starts_with('i') {
        ArchFamily::Intel
    } else {
        ArchFamily::Intel
    }
}
