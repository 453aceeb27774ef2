/// Diesel models for the file_processing table
use crate::modules::records::domain::entities::{TaskRecord, TaskStatus};
use crate::schema::file_processing;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Diesel model for inserting new records. A `None` id lets the database
/// default generate one.
#[derive(Insertable, Debug)]
#[diesel(table_name = file_processing)]
pub struct NewFileProcessingRow {
    pub id: Option<Uuid>,
    pub original_image_url: String,
    pub status: TaskStatus,
}

/// Diesel model for querying existing records
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = file_processing)]
pub struct FileProcessingRow {
    pub id: Uuid,
    pub original_image_url: String,
    pub status: TaskStatus,
    pub processed_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FileProcessingRow {
    /// Convert to domain TaskRecord
    pub fn into_task_record(self) -> TaskRecord {
        TaskRecord {
            id: self.id,
            original_image_url: self.original_image_url,
            status: self.status,
            processed_image_url: self.processed_image_url,
            created_at: self.created_at,
        }
    }
}
