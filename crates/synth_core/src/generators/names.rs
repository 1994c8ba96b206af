//! Company names and identifiers drawn from a seeded stream.

use crate::rng::SynthRng;

/// Instruments one run can number without reusing an ISIN body.
pub const ISIN_SEQUENCE_LIMIT: usize = 1_000_000_000;

const SURNAMES: &[&str] = &[
    "Abbott", "Barker", "Castillo", "Dalton", "Ellison", "Fischer", "Garrett", "Hale",
    "Ingram", "Jensen", "Keller", "Lambert", "Mercer", "Nolan", "Osborne", "Porter",
    "Quinn", "Reyes", "Sutton", "Tanaka", "Underwood", "Vaughn", "Whitaker", "Yates",
];

const COMPANY_SUFFIXES: &[&str] = &["Inc", "and Sons", "LLC", "Group", "PLC", "Ltd"];

/// Faker-style company name: `Hale Group`, `Hale-Quinn`, or `Hale, Quinn and Yates`.
pub fn company_name(rng: &mut SynthRng) -> String {
    match rng.gen_index(3) {
        0 => format!("{} {}", rng.pick(SURNAMES), rng.pick(COMPANY_SUFFIXES)),
        1 => format!("{}-{}", rng.pick(SURNAMES), rng.pick(SURNAMES)),
        _ => format!(
            "{}, {} and {}",
            rng.pick(SURNAMES),
            rng.pick(SURNAMES),
            rng.pick(SURNAMES)
        ),
    }
}

/// ISIN from a country prefix and a sequence number.
///
/// The 9-digit national part is the zero-padded sequence number, which makes
/// ISINs unique per dataset; the final character is the Luhn check digit.
///
/// The body holds nine sequence digits, so `sequence` must stay below
/// [`ISIN_SEQUENCE_LIMIT`] for the identifier to keep its standard length.
///
/// ```rust
/// use synth_core::generators::isin;
///
/// assert_eq!(isin("US", 37833100), "US0378331005");
/// ```
pub fn isin(prefix: &str, sequence: usize) -> String {
    let body = format!("{}{:09}", prefix, sequence);
    let check = isin_check_digit(&body);
    format!("{body}{check}")
}

fn isin_check_digit(body: &str) -> u32 {
    let digits: Vec<u32> = body
        .chars()
        .filter_map(|c| c.to_digit(36))
        .flat_map(|v| {
            if v >= 10 {
                vec![v / 10, v % 10]
            } else {
                vec![v]
            }
        })
        .collect();
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    (10 - sum % 10) % 10
}
