//! Conversion between raw domain tokens and typed domain values.
//!
//! A token holding `/` is a range (`lower/upper`), anything else an instant.
//! Custom dimensions are classified once, from the first token of the domain,
//! and every later token is converted with that same kind.

use wms_common::{parse_timestamp, DataType, DomainKind, DomainValue, WmsError, WmsResult};

/// Converts tokens of one already-classified kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueConverter {
    kind: DomainKind,
}

impl ValueConverter {
    pub fn new(kind: DomainKind) -> Self {
        Self { kind }
    }

    /// Pick the converter for a domain whose first raw token is `first_token`.
    pub fn for_domain(data_type: DataType, first_token: &str) -> Self {
        Self::new(classify(data_type, first_token))
    }

    pub fn kind(&self) -> DomainKind {
        self.kind
    }

    pub fn parse(&self, token: &str) -> WmsResult<DomainValue> {
        parse(self.kind, token)
    }
}

/// Resolve the kind of a dimension's values.
///
/// Temporal and numeric types are fixed. Custom types try a temporal parse,
/// then a numeric one, and fall back to text.
pub fn classify(data_type: DataType, first_token: &str) -> DomainKind {
    if let Some(kind) = data_type.fixed_kind() {
        return kind;
    }
    if parse(DomainKind::Temporal, first_token).is_ok() {
        DomainKind::Temporal
    } else if parse(DomainKind::Numeric, first_token).is_ok() {
        DomainKind::Numeric
    } else {
        DomainKind::Text
    }
}

/// Parse one raw token as a value of `kind`.
pub fn parse(kind: DomainKind, token: &str) -> WmsResult<DomainValue> {
    let token = token.trim();
    match token.split_once('/') {
        Some((lower, upper)) => {
            let lower = parse_instant(kind, lower.trim())?;
            let upper = parse_instant(kind, upper.trim())?;
            DomainValue::range(lower, upper)
                .ok_or_else(|| WmsError::parse(kind.to_string(), token))
        }
        None => parse_instant(kind, token),
    }
}

fn parse_instant(kind: DomainKind, token: &str) -> WmsResult<DomainValue> {
    match kind {
        DomainKind::Temporal => parse_timestamp(token)
            .map(DomainValue::Time)
            .map_err(|_| WmsError::parse(kind.to_string(), token)),
        DomainKind::Numeric => match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(DomainValue::Number(v)),
            _ => Err(WmsError::parse(kind.to_string(), token)),
        },
        DomainKind::Text => Ok(DomainValue::Text(token.to_string())),
    }
}

/// Encode a value back into its raw token.
pub fn format(value: &DomainValue) -> String {
    value.to_string()
}
