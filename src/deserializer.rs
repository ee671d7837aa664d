//! Key and value deserializers applied to raw Kafka payloads.

use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::error::{ClientError, Component};

/// Where the bytes being deserialized came from.
#[derive(Debug, Clone, Copy)]
pub struct SerializationContext<'a> {
    pub component: Component,
    pub topic: &'a str,
    pub partition: i32,
    pub offset: i64,
}

impl SerializationContext<'_> {
    pub(crate) fn error(&self, err: anyhow::Error) -> ClientError {
        ClientError::Deserialization {
            component: self.component,
            topic: self.topic.to_string(),
            partition: self.partition,
            offset: self.offset,
            reason: format!("{err:#}"),
        }
    }
}

/// Converts a raw key or payload into a typed value.
///
/// `data` is `None` when the record carries a null key or value.
pub trait Deserializer: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn deserialize(
        &self,
        data: Option<&[u8]>,
        ctx: &SerializationContext<'_>,
    ) -> anyhow::Result<Self::Output>;
}

/// UTF-8 string; null is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl Deserializer for Utf8 {
    type Output = String;

    fn deserialize(&self, data: Option<&[u8]>, _ctx: &SerializationContext<'_>) -> anyhow::Result<String> {
        let data = data.ok_or_else(|| anyhow!("unexpected null"))?;
        Ok(std::str::from_utf8(data)?.to_string())
    }
}

/// UTF-8 string that may be null.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalUtf8;

impl Deserializer for OptionalUtf8 {
    type Output = Option<String>;

    fn deserialize(
        &self,
        data: Option<&[u8]>,
        _ctx: &SerializationContext<'_>,
    ) -> anyhow::Result<Option<String>> {
        data.map(|d| -> anyhow::Result<String> { Ok(std::str::from_utf8(d)?.to_string()) })
            .transpose()
    }
}

/// Raw bytes; null becomes an empty buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bytes;

impl Deserializer for Bytes {
    type Output = Vec<u8>;

    fn deserialize(&self, data: Option<&[u8]>, _ctx: &SerializationContext<'_>) -> anyhow::Result<Vec<u8>> {
        Ok(data.map(<[u8]>::to_vec).unwrap_or_default())
    }
}

/// Discards the data without looking at it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ignore;

impl Deserializer for Ignore {
    type Output = ();

    fn deserialize(&self, _data: Option<&[u8]>, _ctx: &SerializationContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Big-endian 32-bit integer, the layout of the Java client's `IntegerSerializer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigEndianI32;

impl Deserializer for BigEndianI32 {
    type Output = i32;

    fn deserialize(&self, data: Option<&[u8]>, _ctx: &SerializationContext<'_>) -> anyhow::Result<i32> {
        let data = data.ok_or_else(|| anyhow!("unexpected null"))?;
        let bytes: [u8; 4] = data
            .try_into()
            .map_err(|_| anyhow!("expected 4 bytes, got {}", data.len()))?;
        Ok(i32::from_be_bytes(bytes))
    }
}

/// Big-endian 64-bit integer, the layout of the Java client's `LongSerializer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigEndianI64;

impl Deserializer for BigEndianI64 {
    type Output = i64;

    fn deserialize(&self, data: Option<&[u8]>, _ctx: &SerializationContext<'_>) -> anyhow::Result<i64> {
        let data = data.ok_or_else(|| anyhow!("unexpected null"))?;
        let bytes: [u8; 8] = data
            .try_into()
            .map_err(|_| anyhow!("expected 8 bytes, got {}", data.len()))?;
        Ok(i64::from_be_bytes(bytes))
    }
}

/// JSON document decoded with serde.
pub struct Json<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Json<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Json<{}>", std::any::type_name::<T>())
    }
}

impl<T> Deserializer for Json<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Output = T;

    fn deserialize(&self, data: Option<&[u8]>, ctx: &SerializationContext<'_>) -> anyhow::Result<T> {
        let data = data.ok_or_else(|| anyhow!("unexpected null"))?;
        serde_json::from_slice(data)
            .with_context(|| format!("{} is not valid JSON for {}", ctx.component, std::any::type_name::<T>()))
    }
}
