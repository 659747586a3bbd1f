use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, error, info};
use crate::domain::{
    error::DatabaseError,
    models::{DbSettings, InsertBatch, Record},
    ports::{DbConnection, DbConnector},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl DbConnector for MySqlConnector {
    async fn open(&self, settings: &DbSettings) -> Result<Box<dyn DbConnection>, DatabaseError> {
        debug!("Connecting to MySQL at {}:{}/{}", settings.host, settings.port, settings.name);

        let connection = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .database(&settings.name)
            .username(&settings.user)
            .password(&settings.password)
            .charset("utf8mb4")
            .connect()
            .await
            .map_err(|e| {
                error!("Failed to connect to MySQL at {}:{}: {}", settings.host, settings.port, e);
                DatabaseError::Sqlx(e)
            })?;

        debug!("MySQL connection established");
        Ok(Box::new(MySqlSession { connection: Some(connection) }))
    }
}

pub struct MySqlSession {
    connection: Option<MySqlConnection>,
}

#[async_trait]
impl DbConnection for MySqlSession {
    async fn execute_many(&mut self, statement: &str, batch: &InsertBatch) -> Result<u64, DatabaseError> {
        let connection = self.connection.as_mut().ok_or(DatabaseError::NotConnected)?;
        let records: Vec<&Record> = batch.iter().collect();

        // Dropping the transaction without commit rolls it back.
        let mut tx = connection.begin().await?;
        let mut rows_affected = 0;
        match ValuesClause::parse(statement) {
            Some(clause) => {
                for chunk in records.chunks(clause.rows_per_statement()) {
                    let sql = clause.expand(chunk.len());
                    let mut query = sqlx::query(&sql);
                    for field in chunk.iter().flat_map(|record| record.fields()) {
                        query = query.bind(field.as_str());
                    }
                    rows_affected += query.execute(&mut *tx).await?.rows_affected();
                }
            }
            None => {
                debug!("Statement has no expandable VALUES clause; inserting row by row");
                for record in &records {
                    let mut query = sqlx::query(statement);
                    for field in record.fields() {
                        query = query.bind(field.as_str());
                    }
                    rows_affected += query.execute(&mut *tx).await?.rows_affected();
                }
            }
        }
        tx.commit().await?;

        info!("Committed {} records ({} rows affected)", batch.len(), rows_affected);
        Ok(rows_affected)
    }

    async fn close(&mut self) -> Result<(), DatabaseError> {
        if let Some(connection) = self.connection.take() {
            connection.close().await?;
            debug!("MySQL connection closed");
        }
        Ok(())
    }
}

/// MySQL rejects statements with more than this many placeholders.
const MAX_PLACEHOLDERS: usize = 65_535;

/// An `INSERT ... VALUES (?, ...)` statement split around its row group so
/// the group can be repeated once per record.
#[derive(Debug, PartialEq, Eq)]
struct ValuesClause<'a> {
    head: &'a str,
    row: &'a str,
    tail: &'a str,
    placeholders: usize,
}

impl<'a> ValuesClause<'a> {
    fn parse(statement: &'a str) -> Option<Self> {
        let lower = statement.to_ascii_lowercase();
        if !lower.trim_start().starts_with("insert") && !lower.trim_start().starts_with("replace") {
            return None;
        }
        let values_at = lower.rfind("values")? + "values".len();
        let group_at = values_at + statement[values_at..].find(|c: char| !c.is_whitespace())?;
        if !statement[group_at..].starts_with('(') {
            return None;
        }

        let mut depth = 0usize;
        let mut group_end = None;
        for (offset, c) in statement[group_at..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        group_end = Some(group_at + offset + 1);
                        break;
                    }
                }
                _ => {}
            }
        }
        let group_end = group_end?;

        let row = &statement[group_at..group_end];
        let placeholders = row.matches('?').count();
        if placeholders == 0 {
            return None;
        }
        Some(Self {
            head: &statement[..group_at],
            row,
            tail: statement[group_end..].trim_end().trim_end_matches(';'),
            placeholders,
        })
    }

    fn rows_per_statement(&self) -> usize {
        (MAX_PLACEHOLDERS / self.placeholders).max(1)
    }

    fn expand(&self, rows: usize) -> String {
        let mut sql = String::with_capacity(self.head.len() + (self.row.len() + 2) * rows + self.tail.len());
        sql.push_str(self.head);
        for i in 0..rows {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(self.row);
        }
        sql.push_str(self.tail);
        sql
    }
}
