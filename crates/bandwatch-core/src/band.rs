//! # Band Selection Codec
//!
//! Converts between operator-facing band selection expressions and the
//! hexadecimal band bitmask the modem's management API speaks.
//!
//! An expression is a `+`-separated list of 3GPP LTE band numbers:
//!
//! | Expression   | Meaning                                            |
//! |--------------|----------------------------------------------------|
//! | `1+3+20`     | lock to bands 1, 3 and 20                          |
//! | `3m+1+20`    | same combination, but apply band 3 alone first     |
//! | `AUTO`       | release the lock, let the modem choose             |
//!
//! A single token may carry an `m`/`M` marker naming the *main* band — the
//! band the orchestrator submits on its own before applying the full
//! combination. `AUTO` anywhere in the expression wins over everything else.
//!
//! In the mask, bit `n-1` set means band `n` is enabled. The mask is held as
//! a `u128` so that the whole 1..=90 band range round-trips; every value a
//! real device reports fits the low 64 bits and renders identically.

use std::fmt;

/// All-bits sentinel the device uses for automatic band selection.
pub const AUTO_MASK: u128 = 0x7FFF_FFFF_FFFF_FFFF;

/// Highest band number accepted in a selection expression.
pub const MAX_BAND: u16 = 90;

/// Errors from band expression parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BandError {
    /// The token is neither `AUTO` nor an integer in `1..=90`, or a second
    /// token carried the main-band marker.
    #[error("invalid band token {0:?}")]
    InvalidBandToken(String),
}

// ─── Selection ──────────────────────────────────────────────────────────────

/// A parsed band selection: either automatic, or an explicit combination
/// with at most one band marked as *main*.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandSelection {
    /// Encodes to [`AUTO_MASK`]; the modem picks bands itself.
    Auto,
    /// Explicit combination. `main`, when set, is also present in `bands`.
    Bands {
        bands: Vec<u16>,
        main: Option<u16>,
    },
}

impl BandSelection {
    /// Parse a selection expression.
    ///
    /// Splits on `+`, strips one `m`/`M` marker per token, and validates the
    /// band numbers. `AUTO` (any case) short-circuits the whole expression.
    pub fn parse(expr: &str) -> Result<Self, BandError> {
        let mut bands = Vec::new();
        let mut main = None;

        for raw in expr.split('+') {
            let token = raw.trim();
            if token.eq_ignore_ascii_case("auto") {
                return Ok(BandSelection::Auto);
            }

            let (digits, is_main) = match token.find(['m', 'M']) {
                Some(pos) => {
                    let mut stripped = token.to_string();
                    stripped.remove(pos);
                    (stripped, true)
                }
                None => (token.to_string(), false),
            };

            let band: u16 = digits
                .parse()
                .map_err(|_| BandError::InvalidBandToken(raw.to_string()))?;
            if band == 0 || band > MAX_BAND {
                return Err(BandError::InvalidBandToken(raw.to_string()));
            }

            if is_main {
                if main.is_some() {
                    return Err(BandError::InvalidBandToken(raw.to_string()));
                }
                main = Some(band);
            }
            bands.push(band);
        }

        Ok(BandSelection::Bands { bands, main })
    }

    /// The band to apply alone in the first phase, if any.
    pub fn main_band(&self) -> Option<u16> {
        match self {
            BandSelection::Auto => None,
            BandSelection::Bands { main, .. } => *main,
        }
    }

    /// The same combination with the main marker dropped — what the second
    /// phase of a two-phase lock submits.
    pub fn without_main(&self) -> BandSelection {
        match self {
            BandSelection::Auto => BandSelection::Auto,
            BandSelection::Bands { bands, .. } => BandSelection::Bands {
                bands: bands.clone(),
                main: None,
            },
        }
    }

    /// Encode this selection as a band bitmask.
    pub fn mask(&self) -> u128 {
        match self {
            BandSelection::Auto => AUTO_MASK,
            BandSelection::Bands { bands, .. } => bands
                .iter()
                .fold(0u128, |mask, band| mask | 1u128 << (band - 1)),
        }
    }
}

impl fmt::Display for BandSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandSelection::Auto => write!(f, "AUTO"),
            BandSelection::Bands { bands, main } => {
                let mut first = true;
                for band in bands {
                    if !first {
                        write!(f, "+")?;
                    }
                    first = false;
                    write!(f, "{band}")?;
                    if Some(*band) == *main {
                        write!(f, "m")?;
                    }
                }
                Ok(())
            }
        }
    }
}

// ─── Mask Rendering ─────────────────────────────────────────────────────────

/// Render a mask as lowercase hex without leading zeros (`"0"` for zero).
pub fn mask_to_hex(mask: u128) -> String {
    format!("{mask:x}")
}

/// Parse a hex mask as reported by the device. Returns `None` on anything
/// that is not plain hex; callers treat that as a missing field.
pub fn mask_from_hex(hex: &str) -> Option<u128> {
    u128::from_str_radix(hex.trim(), 16).ok()
}

/// Decode a mask into the `B{n}` labels of its set bits, ascending, joined
/// with `+`. No bits set yields an empty string.
pub fn decode_mask(mask: u128) -> String {
    let mut labels = Vec::new();
    for bit in 0..u32::from(MAX_BAND) {
        if mask & (1u128 << bit) != 0 {
            labels.push(format!("B{}", bit + 1));
        }
    }
    labels.join("+")
}

// ─── Tests ──────────────────────────────────────────────────────────────────
