//! Cell identity decoding and carrier code normalization.
//!
//! The modem reports the serving cell either as `"<enbid>-<cell>"` or as a
//! single decimal value whose low byte is the cell number within the eNB.
//! [`decode_enb_id`] recovers the base-station identifier from both forms.
//!
//! [`normalize_plmn`] reproduces the carrier-id aliasing table used by the
//! BTS map service; the remaps must match exactly or generated links point
//! at the wrong operator.

/// Errors from cell identity decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellIdError {
    /// Not a decimal value, or nothing left once the cell byte is dropped.
    #[error("malformed cell id {0:?}")]
    MalformedCellId(String),
}

/// Base of the external BTS map; the fragment carries `{plmn}.{enbid}`.
const BTS_MAP_BASE: &str = "https://lteitaly.it/internal/map.php";

/// Decode the eNB identifier from a raw `cell_id` field.
///
/// `"12345-678"` → `"12345"` (decimal prefix, leading zeros normalized).
/// `"185620738"` → `"725081"` (decimal → hex, drop the low byte's two hex
/// digits, back to decimal).
pub fn decode_enb_id(raw: &str) -> Result<String, CellIdError> {
    let raw = raw.trim();

    if let Some((prefix, _)) = raw.split_once('-') {
        let id: u64 = prefix
            .parse()
            .map_err(|_| CellIdError::MalformedCellId(raw.to_string()))?;
        return Ok(id.to_string());
    }

    let value: u64 = raw
        .parse()
        .map_err(|_| CellIdError::MalformedCellId(raw.to_string()))?;
    let hex = format!("{value:x}");
    let truncated = &hex[..hex.len().saturating_sub(2)];
    let enb = u64::from_str_radix(truncated, 16)
        .map_err(|_| CellIdError::MalformedCellId(raw.to_string()))?;
    Ok(enb.to_string())
}

/// Normalize a PLMN code for map-link generation.
///
/// Known carrier aliases: `22201` → `2221`, `22299` → `22288`, and `22250`
/// reported with a 6-digit eNB id → `22288`. Everything else passes through.
pub fn normalize_plmn(plmn: &str, enb_id_len: usize) -> String {
    match plmn {
        "22201" => "2221".to_string(),
        "22299" => "22288".to_string(),
        "22250" if enb_id_len == 6 => "22288".to_string(),
        other => other.to_string(),
    }
}

/// Build the external map link for a decoded base station.
pub fn bts_map_url(plmn: &str, enb_id: &str) -> String {
    format!("{BTS_MAP_BASE}#bts={plmn}.{enb_id}")
}
