//! Hex serde helpers for fixed-size byte fields in JSON logs and bundles.

pub mod hex_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let raw = String::deserialize(deserializer)?;
        let stripped = raw.strip_prefix("0x").unwrap_or(&raw);
        let bytes = hex::decode(stripped).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| serde::de::Error::custom(format!("expected {} bytes, got {}", N, v.len())))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Wrapper {
        #[serde(with = "super::hex_array")]
        bytes: [u8; 32],
    }

    #[test]
    fn test_hex_array_round_trip() {
        let value = Wrapper { bytes: [0x5Au8; 32] };
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("0x5a5a"));
        assert_eq!(serde_json::from_str::<Wrapper>(&json).unwrap(), value);
    }

    #[test]
    fn test_hex_array_rejects_wrong_length() {
        assert!(serde_json::from_str::<Wrapper>("{\"bytes\":\"0x1234\"}").is_err());
    }
}
