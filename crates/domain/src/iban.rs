//! IBAN structure and checksum validation (ISO 13616).

/// Normalizes an IBAN for storage: uppercase, whitespace removed, then
/// split into blocks of four characters.
///
/// ```
/// use domain::iban::canonicalize_iban;
/// assert_eq!(canonicalize_iban("de89370400440532013000"), "DE89 3704 0044 0532 0130 00");
/// ```
pub fn canonicalize_iban(input: &str) -> String {
    let compact = compact(input);
    let mut out = String::with_capacity(compact.len() + compact.len() / 4);
    for (i, c) in compact.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Returns true if `input` is a structurally valid IBAN with a correct
/// mod-97 check. Whitespace and letter case are ignored.
pub fn is_valid_iban(input: &str) -> bool {
    let iban = compact(input);
    let bytes = iban.as_bytes();

    if !(15..=34).contains(&bytes.len()) {
        return false;
    }
    if !bytes[..2].iter().all(u8::is_ascii_uppercase)
        || !bytes[2..4].iter().all(u8::is_ascii_digit)
        || !bytes.iter().all(u8::is_ascii_alphanumeric)
    {
        return false;
    }

    // Move the country code and check digits to the end, then read the
    // string as one big number with A=10 … Z=35.
    let rearranged = bytes[4..].iter().chain(&bytes[..4]);
    let mut remainder: u32 = 0;
    for &b in rearranged {
        let value = if b.is_ascii_digit() {
            u32::from(b - b'0')
        } else {
            u32::from(b - b'A') + 10
        };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }

    remainder == 1
}

fn compact(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}
