use tracing::debug;

use crate::encode::encode;
use crate::error::EncodeError;
use crate::filters::{Attrs, FilterKey, Phase, Tour};
use crate::names::NameResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeCodes {
    /// `(start, end)` as `YYYYMMDD`, earliest first; `None` means whole career.
    pub dates: Option<(String, String)>,
    pub fragments: Vec<(FilterKey, String)>,
}

impl AttributeCodes {
    pub fn code_string(&self) -> String {
        let mut code = match &self.dates {
            Some((start, end)) => format!("&f=Acx{start}{end}"),
            None => "&f=ACareer".to_string(),
        };
        code.push_str("qq");
        for phase in [Phase::Query, Phase::People] {
            for (key, fragment) in &self.fragments {
                if key.phase() == phase {
                    code.push_str(fragment);
                }
            }
        }
        code
    }
}

pub fn encode_attrs(
    tour: Option<Tour>,
    attrs: &Attrs,
    names: &dyn NameResolver,
) -> Result<AttributeCodes, EncodeError> {
    let dates = match (attrs.get(FilterKey::StartDate), attrs.get(FilterKey::EndDate)) {
        (None, None) => None,
        (Some(start), Some(end)) => {
            let start = encode(FilterKey::StartDate, start, tour, names)?;
            let end = encode(FilterKey::EndDate, end, tour, names)?;
            // YYYYMMDD sorts chronologically.
            if start > end {
                Some((end, start))
            } else {
                Some((start, end))
            }
        }
        _ => return Err(EncodeError::IncompleteRange),
    };

    let mut fragments = Vec::with_capacity(attrs.len());
    for (key, value) in attrs.iter() {
        if key.phase() == Phase::Date {
            continue;
        }
        let fragment = encode(key, value, tour, names)?;
        debug!(%key, %fragment, "encoded attribute");
        fragments.push((key, fragment));
    }

    Ok(AttributeCodes { dates, fragments })
}

/// Validates every attribute and returns the code string that follows
/// `p=<Id>` in a player URL.
pub fn assemble(
    tour: Option<Tour>,
    attrs: &Attrs,
    names: &dyn NameResolver,
) -> Result<String, EncodeError> {
    encode_attrs(tour, attrs, names).map(|codes| codes.code_string())
}
