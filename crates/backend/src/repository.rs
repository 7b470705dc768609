//! Storage seam for the day planner.
//!
//! The scheduling rules in [`crate::services::day_planner`] only see the
//! [`DayBlockStore`] trait. [`PgDayBlocks`] backs it with PostgreSQL; tests
//! substitute an in-memory store.

use anyhow::Result;
use chrono::NaiveDate;
use diesel_async::AsyncPgConnection;
use planner_types::{BlockTiming, DayBlock, HourSpan};
use uuid::Uuid;

use crate::db;

/// A write named a block that no longer exists, usually because the day was
/// replaced by a template in the meantime.
#[derive(Debug, thiserror::Error)]
#[error("Day block {0} no longer exists")]
pub struct StaleBlock(pub Uuid);

/// Persistence operations the day planner needs.
///
/// Multi-row writes (`replace_day`, `set_hours`) must be all-or-nothing.
#[allow(async_fn_in_trait)]
pub trait DayBlockStore {
    async fn workspace_exists(&mut self, workspace_id: Uuid) -> Result<bool>;

    /// The workspace owning `project_id`, or `None` if there is no such project.
    async fn project_workspace(&mut self, project_id: Uuid) -> Result<Option<Uuid>>;

    /// Blocks of one day ordered by start hour, joined with project display fields.
    async fn list_day(&mut self, workspace_id: Uuid, date: NaiveDate) -> Result<Vec<DayBlock>>;

    async fn get_block(&mut self, block_id: Uuid) -> Result<Option<DayBlock>>;

    /// Insert `spans` as the day's blocks; sort order follows slice order.
    async fn insert_day(
        &mut self,
        workspace_id: Uuid,
        date: NaiveDate,
        spans: &[HourSpan],
    ) -> Result<()>;

    /// Delete every block of the day and insert `spans` instead.
    async fn replace_day(
        &mut self,
        workspace_id: Uuid,
        date: NaiveDate,
        spans: &[HourSpan],
    ) -> Result<()>;

    /// Returns `false` if the block does not exist.
    async fn set_project(&mut self, block_id: Uuid, project_id: Option<Uuid>) -> Result<bool>;

    /// Fails with [`StaleBlock`] if any timing names a missing block.
    async fn set_hours(&mut self, timings: &[BlockTiming]) -> Result<()>;
}

/// [`DayBlockStore`] over a pooled Postgres connection.
pub struct PgDayBlocks<'c> {
    conn: &'c mut AsyncPgConnection,
}

impl<'c> PgDayBlocks<'c> {
    pub fn new(conn: &'c mut AsyncPgConnection) -> Self {
        PgDayBlocks { conn }
    }
}

impl DayBlockStore for PgDayBlocks<'_> {
    async fn workspace_exists(&mut self, workspace_id: Uuid) -> Result<bool> {
        db::workspaces::exists(self.conn, workspace_id).await
    }

    async fn project_workspace(&mut self, project_id: Uuid) -> Result<Option<Uuid>> {
        db::projects::workspace_of(self.conn, project_id).await
    }

    async fn list_day(&mut self, workspace_id: Uuid, date: NaiveDate) -> Result<Vec<DayBlock>> {
        db::day_blocks::list_for_day(self.conn, workspace_id, date).await
    }

    async fn get_block(&mut self, block_id: Uuid) -> Result<Option<DayBlock>> {
        db::day_blocks::get_by_id(self.conn, block_id).await
    }

    async fn insert_day(
        &mut self,
        workspace_id: Uuid,
        date: NaiveDate,
        spans: &[HourSpan],
    ) -> Result<()> {
        db::day_blocks::insert_spans(self.conn, workspace_id, date, spans).await
    }

    async fn replace_day(
        &mut self,
        workspace_id: Uuid,
        date: NaiveDate,
        spans: &[HourSpan],
    ) -> Result<()> {
        db::day_blocks::replace_day(self.conn, workspace_id, date, spans).await
    }

    async fn set_project(&mut self, block_id: Uuid, project_id: Option<Uuid>) -> Result<bool> {
        db::day_blocks::set_project(self.conn, block_id, project_id).await
    }

    async fn set_hours(&mut self, timings: &[BlockTiming]) -> Result<()> {
        db::day_blocks::set_hours(self.conn, timings).await
    }
}
