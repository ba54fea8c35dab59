use {alloy::primitives::U256, serde::Serializer, serde_with::SerializeAs};

/// Serialize [`U256`] as a decimal string.
///
/// JSON numbers lose precision beyond 2^53 in most clients, so token amounts
/// in base units are always exchanged as strings.
#[derive(Debug)]
pub struct DecimalU256;

impl SerializeAs<U256> for DecimalU256 {
    fn serialize_as<S>(source: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&source.to_string())
    }
}
