use std::fmt;

/// Address of a record within the log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPartitionOffset {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl fmt::Display for TopicPartitionOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}", self.topic, self.partition, self.offset)
    }
}

/// A record retrieved from Kafka with its key and value deserialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Message<K, V> {
    /// Kafka topic
    pub topic: String,
    /// Kafka partition
    pub partition: i32,
    /// Kafka offset
    pub offset: i64,
    pub key: K,
    pub value: V,
    /// Message timestamp (milliseconds since epoch)
    pub timestamp: Option<i64>,
    /// Message headers in broker order
    pub headers: Vec<Header>,
}

impl<K, V> Message<K, V> {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, key: K, value: V) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            key,
            value,
            timestamp: None,
            headers: Vec::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: Option<Vec<u8>>) -> Self {
        self.headers.push(Header {
            key: key.into(),
            value,
        });
        self
    }

    pub fn topic_partition_offset(&self) -> TopicPartitionOffset {
        TopicPartitionOffset {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
        }
    }

    /// First header with the given key.
    pub fn header(&self, key: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: Option<Vec<u8>>,
}

/// Outcome of a single retrieval from a consumer handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Consumed<K, V> {
    Message(Message<K, V>),
    /// No further records are currently available in the partition.
    EndOfPartition { partition: i32 },
}

impl<K, V> Consumed<K, V> {
    pub fn is_partition_eof(&self) -> bool {
        matches!(self, Consumed::EndOfPartition { .. })
    }
}
