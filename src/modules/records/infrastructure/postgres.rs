/// Diesel-based implementation of TaskRecordStore
///
/// Status moves are expressed as conditional UPDATEs so concurrent runners
/// cannot double-claim a record or overwrite a terminal status.
use crate::modules::records::domain::entities::{
    ChangeKind, NewTaskRecord, TaskRecord, TaskRecordChange, TaskStatus,
};
use crate::modules::records::domain::store::{BeginOutcome, TaskRecordStore};
use crate::modules::records::infrastructure::models::{FileProcessingRow, NewFileProcessingRow};
use crate::schema::file_processing;
use crate::shared::database::{DbConnection, DbPool};
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

pub struct PgTaskRecordStore {
    pool: DbPool,
    changes: broadcast::Sender<TaskRecordChange>,
}

impl PgTaskRecordStore {
    pub fn new(pool: DbPool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    /// Get database connection from pool
    fn get_conn(&self) -> AppResult<DbConnection> {
        self.pool
            .get()
            .map_err(|e| AppError::DatabaseError(format!("Failed to get connection: {}", e)))
    }

    fn load_by_url(
        &self,
        conn: &mut DbConnection,
        original_image_url: &str,
    ) -> AppResult<Option<FileProcessingRow>> {
        file_processing::table
            .filter(file_processing::original_image_url.eq(original_image_url))
            .first(conn)
            .optional()
            .map_err(|e| AppError::DatabaseError(format!("Failed to load task record: {}", e)))
    }

    fn publish(&self, kind: ChangeKind, record: &TaskRecord) {
        // A send error only means nobody is subscribed right now
        let _ = self.changes.send(TaskRecordChange {
            kind,
            record: record.clone(),
        });
    }
}

#[async_trait]
impl TaskRecordStore for PgTaskRecordStore {
    async fn insert(&self, new_record: NewTaskRecord) -> AppResult<TaskRecord> {
        let new_row = NewFileProcessingRow {
            id: new_record.id,
            original_image_url: new_record.original_image_url,
            status: TaskStatus::Queued,
        };

        let mut conn = self.get_conn()?;

        let inserted: FileProcessingRow = diesel::insert_into(file_processing::table)
            .values(&new_row)
            .get_result(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                    AppError::Duplicate(format!(
                        "Task record already exists: {}",
                        info.message()
                    ))
                }
                _ => AppError::DatabaseError(format!("Failed to insert task record: {}", e)),
            })?;

        let record = inserted.into_task_record();
        self.publish(ChangeKind::Inserted, &record);
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<TaskRecord>> {
        let mut conn = self.get_conn()?;

        let row: Option<FileProcessingRow> = file_processing::table
            .find(id)
            .first(&mut conn)
            .optional()
            .map_err(|e| AppError::DatabaseError(format!("Failed to get task record: {}", e)))?;

        Ok(row.map(|r| r.into_task_record()))
    }

    async fn find_by_original_url(
        &self,
        original_image_url: &str,
    ) -> AppResult<Option<TaskRecord>> {
        let mut conn = self.get_conn()?;
        let row = self.load_by_url(&mut conn, original_image_url)?;
        Ok(row.map(|r| r.into_task_record()))
    }

    async fn begin_processing(&self, original_image_url: &str) -> AppResult<BeginOutcome> {
        let mut conn = self.get_conn()?;

        // Conditional claim; zero rows means the record is gone or already
        // past queued
        let claimed: Option<FileProcessingRow> = diesel::update(
            file_processing::table
                .filter(file_processing::original_image_url.eq(original_image_url))
                .filter(file_processing::status.eq(TaskStatus::Queued)),
        )
        .set(file_processing::status.eq(TaskStatus::Ongoing))
        .get_result(&mut conn)
        .optional()
        .map_err(|e| AppError::DatabaseError(format!("Failed to claim task record: {}", e)))?;

        if let Some(row) = claimed {
            let record = row.into_task_record();
            self.publish(ChangeKind::Updated, &record);
            return Ok(BeginOutcome::Started(record));
        }

        match self.load_by_url(&mut conn, original_image_url)? {
            Some(row) => Ok(BeginOutcome::AlreadyStarted(row.into_task_record())),
            None => Ok(BeginOutcome::NotFound),
        }
    }

    async fn complete(
        &self,
        original_image_url: &str,
        processed_image_url: &str,
    ) -> AppResult<TaskRecord> {
        let mut conn = self.get_conn()?;

        let updated: Option<FileProcessingRow> = diesel::update(
            file_processing::table
                .filter(file_processing::original_image_url.eq(original_image_url))
                .filter(file_processing::status.eq_any([TaskStatus::Queued, TaskStatus::Ongoing])),
        )
        .set((
            file_processing::status.eq(TaskStatus::Successful),
            file_processing::processed_image_url.eq(Some(processed_image_url)),
        ))
        .get_result(&mut conn)
        .optional()
        .map_err(|e| AppError::DatabaseError(format!("Failed to complete task record: {}", e)))?;

        match updated {
            Some(row) => {
                let record = row.into_task_record();
                self.publish(ChangeKind::Updated, &record);
                Ok(record)
            }
            None => match self.load_by_url(&mut conn, original_image_url)? {
                Some(row) => Err(AppError::InvalidOperation(format!(
                    "Cannot complete task record in terminal status {}",
                    row.status
                ))),
                None => Err(AppError::NotFound(format!(
                    "No task record for {}",
                    original_image_url
                ))),
            },
        }
    }

    async fn mark_failed(&self, original_image_url: &str) -> AppResult<TaskRecord> {
        let mut conn = self.get_conn()?;

        let updated: Option<FileProcessingRow> = diesel::update(
            file_processing::table
                .filter(file_processing::original_image_url.eq(original_image_url))
                .filter(file_processing::status.eq_any([TaskStatus::Queued, TaskStatus::Ongoing])),
        )
        .set(file_processing::status.eq(TaskStatus::Failed))
        .get_result(&mut conn)
        .optional()
        .map_err(|e| AppError::DatabaseError(format!("Failed to fail task record: {}", e)))?;

        match updated {
            Some(row) => {
                let record = row.into_task_record();
                self.publish(ChangeKind::Updated, &record);
                Ok(record)
            }
            None => match self.load_by_url(&mut conn, original_image_url)? {
                Some(row) => Err(AppError::InvalidOperation(format!(
                    "Cannot fail task record in terminal status {}",
                    row.status
                ))),
                None => Err(AppError::NotFound(format!(
                    "No task record for {}",
                    original_image_url
                ))),
            },
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskRecordChange> {
        self.changes.subscribe()
    }
}
