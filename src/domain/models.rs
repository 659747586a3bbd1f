use serde::Deserialize;

/// The body of one work message: which blob to load.
///
/// Any field other than `bucket` and `key` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkDescriptor {
    pub bucket: String,
    pub key: String,
}

/// One line of blob content split into positional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Every record derived from one blob, in blob order. Written as one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertBatch {
    records: Vec<Record>,
}

impl InsertBatch {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}

/// A message pulled from the work queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub id: Option<String>,
    pub body: Option<String>,
    /// Needed to delete the message; without it the message can only expire.
    pub receipt_handle: Option<String>,
}

/// Connection parameters for the relational database.
#[derive(Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
