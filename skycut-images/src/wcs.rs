use crate::errors::Result;
use crate::header::{Header, Keyword, KeywordValue};
use skycut_wcs::{KeywordProvider, Wcs, WcsBuilder, WcsKeyword, WcsKeywordValue};

impl KeywordProvider for Header {
    fn get_string(&self, key: &str) -> Option<String> {
        self.get_keyword_value(key)?
            .as_string()
            .map(|s| s.to_string())
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.get_keyword_value(key)?.as_real()
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.get_keyword_value(key)?.as_integer()
    }
}

/// Parses the celestial WCS of a header, `None` when the header carries no `CTYPE1`.
pub fn wcs_from_header(header: &Header) -> Result<Option<Wcs>> {
    if header.get_keyword_value("CTYPE1").is_none() {
        return Ok(None);
    }
    let wcs = WcsBuilder::from_header(header)?.build()?;
    Ok(Some(wcs))
}

impl From<WcsKeyword> for Keyword {
    fn from(keyword: WcsKeyword) -> Self {
        let value = match keyword.value {
            WcsKeywordValue::Real(v) => KeywordValue::Real(v),
            WcsKeywordValue::Integer(v) => KeywordValue::Integer(v),
            WcsKeywordValue::String(v) => KeywordValue::String(v),
        };
        Keyword::new(keyword.name).with_value(value)
    }
}

pub fn wcs_keywords(wcs: &Wcs) -> Vec<Keyword> {
    wcs.to_keywords().into_iter().map(Keyword::from).collect()
}

/// Names that belong to a celestial WCS description, including the alternatives
/// (`PC`/`CDELT`, `CROTA`, SIP and its inverse) that a rewritten WCS replaces.
pub fn is_wcs_keyword(name: &str) -> bool {
    const EXACT: &[&str] = &[
        "WCSAXES", "LONPOLE", "LATPOLE", "RADESYS", "RADECSYS", "EQUINOX", "EPOCH", "A_ORDER",
        "B_ORDER", "AP_ORDER", "BP_ORDER", "A_DMAX", "B_DMAX", "WCSNAME",
    ];
    if EXACT.contains(&name) {
        return true;
    }

    let indexed = |prefix: &str| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    };
    let pair = |prefix: &str| {
        name.strip_prefix(prefix).is_some_and(|rest| {
            let mut parts = rest.split('_');
            matches!(
                (parts.next(), parts.next(), parts.next()),
                (Some(a), Some(b), None)
                    if !a.is_empty() && !b.is_empty()
                        && a.chars().all(|c| c.is_ascii_digit())
                        && b.chars().all(|c| c.is_ascii_digit())
            )
        })
    };

    ["CTYPE", "CRPIX", "CRVAL", "CDELT", "CUNIT", "CROTA"]
        .iter()
        .any(|p| indexed(p))
        || ["CD", "PC", "PV", "PS", "A_", "B_", "AP_", "BP_"]
            .iter()
            .any(|p| pair(p))
}

/// Replaces the WCS keywords of `header` with those of `wcs`, appended at the end.
pub fn set_wcs(header: &mut Header, wcs: &Wcs) {
    header.retain(|k| !is_wcs_keyword(&k.name));
    for keyword in wcs_keywords(wcs) {
        header.add_keyword(keyword);
    }
}
