//! Snowflake (de)serialization helpers.
//!
//! The API sends snowflakes as decimal strings, but some payloads and older
//! captures use plain numbers. Both forms are accepted; strings are written.

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serializer};
use std::fmt;

struct SnowflakeVisitor;

impl Visitor<'_> for SnowflakeVisitor {
    type Value = u64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string or integer snowflake")
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        u64::try_from(value).map_err(|_| E::custom(format!("negative snowflake {value}")))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        value.trim().parse::<u64>().map_err(de::Error::custom)
    }
}

pub mod string_to_u64 {
    use super::{Deserializer, Serializer, SnowflakeVisitor};

    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    /// # Errors
    ///
    /// Returns an error if the value is neither a numeric string nor a non-negative integer.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SnowflakeVisitor)
    }

    /// Nullable snowflakes.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        #[derive(Deserialize)]
        #[serde(transparent)]
        struct Id(#[serde(with = "super")] u64);

        /// # Errors
        ///
        /// Returns an error if the serializer fails.
        #[allow(clippy::ref_option)]
        pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// # Errors
        ///
        /// Returns an error if a present value is not a valid snowflake.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok(Option::<Id>::deserialize(deserializer)?.map(|Id(value)| value))
        }
    }
}

/// Lists of snowflakes.
pub mod vec_string_to_u64 {
    use super::{Deserialize, Deserializer, SeqAccess, Serializer, Visitor, fmt};

    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &[u64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(value.iter().map(ToString::to_string))
    }

    /// # Errors
    ///
    /// Returns an error if any element is not a valid snowflake.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeqVisitor;

        impl<'de> Visitor<'de> for SeqVisitor {
            type Value = Vec<u64>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of snowflakes")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                #[derive(Deserialize)]
                #[serde(transparent)]
                struct Id(#[serde(with = "super::string_to_u64")] u64);

                let mut ids = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(Id(id)) = seq.next_element()? {
                    ids.push(id);
                }
                Ok(ids)
            }
        }

        deserializer.deserialize_seq(SeqVisitor)
    }
}
