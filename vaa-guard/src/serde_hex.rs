use serde::{de::Error, Deserialize, Deserializer, Serializer};

pub fn serialize<const N: usize, S>(value: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(value))
}

pub fn deserialize<'de, const N: usize, D>(deserializer: D) -> Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.strip_prefix("0x").unwrap_or(&s);

    let mut buf = [0u8; N];
    hex::decode_to_slice(s, &mut buf).map_err(Error::custom)?;

    Ok(buf)
}
