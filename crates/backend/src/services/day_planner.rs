//! Day-block scheduling.
//!
//! Keeps each (workspace, date) partitioned into contiguous hourly blocks.
//! Every change to block timing is validated as a whole day before anything
//! is written, so a rejected edit leaves the stored day untouched.

use chrono::NaiveDate;
use planner_types::{
    resize, validate_layout, BlockTiming, Boundary, DayBlock, DayTemplate, HourSpan, LayoutError,
};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::repository::DayBlockStore;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Workspace {0} not found")]
    WorkspaceNotFound(Uuid),

    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("Day block {0} not found")]
    BlockNotFound(Uuid),

    #[error("{0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type PlannerResult<T> = Result<T, PlannerError>;

/// Service for day-block business logic
pub struct DayPlanner;

impl DayPlanner {
    /// Return the day's blocks, seeding the weekday template on first read.
    pub async fn get_or_seed<S: DayBlockStore>(
        store: &mut S,
        workspace_id: Uuid,
        date: NaiveDate,
    ) -> PlannerResult<Vec<DayBlock>> {
        Self::require_workspace(store, workspace_id).await?;

        let blocks = store.list_day(workspace_id, date).await?;
        if !blocks.is_empty() {
            return Ok(blocks);
        }

        let spans = DayTemplate::Weekday.spans();
        if let Err(e) = store.insert_day(workspace_id, date, &spans).await {
            // A concurrent first read may have seeded the day already
            let blocks = store.list_day(workspace_id, date).await?;
            if blocks.is_empty() {
                return Err(e.into());
            }
            tracing::warn!(
                "Seeding {} for {} raced with another request: {}",
                date,
                workspace_id,
                e
            );
            return Ok(blocks);
        }

        tracing::info!("Seeded {} blocks on {} for {}", spans.len(), date, workspace_id);
        Ok(store.list_day(workspace_id, date).await?)
    }

    /// Replace the whole day with `template`.
    pub async fn apply_template<S: DayBlockStore>(
        store: &mut S,
        workspace_id: Uuid,
        date: NaiveDate,
        template: DayTemplate,
    ) -> PlannerResult<Vec<DayBlock>> {
        Self::require_workspace(store, workspace_id).await?;

        store
            .replace_day(workspace_id, date, &template.spans())
            .await?;

        tracing::info!(
            "Applied {} template on {} for {}",
            template.as_str(),
            date,
            workspace_id
        );
        Ok(store.list_day(workspace_id, date).await?)
    }

    /// Assign a project to a block, or clear it with `None`.
    pub async fn assign_project<S: DayBlockStore>(
        store: &mut S,
        block_id: Uuid,
        project_id: Option<Uuid>,
    ) -> PlannerResult<DayBlock> {
        Self::update_block(store, block_id, None, Some(project_id)).await
    }

    /// Move one block's hours, dragging its neighbours' shared boundaries along.
    pub async fn retime_block<S: DayBlockStore>(
        store: &mut S,
        block_id: Uuid,
        span: HourSpan,
    ) -> PlannerResult<DayBlock> {
        Self::update_block(store, block_id, Some(span), None).await
    }

    /// Retime a block, assign its project, or both.
    ///
    /// The new layout and the project are both checked before either is
    /// written, so a rejected edit changes nothing.
    pub async fn update_block<S: DayBlockStore>(
        store: &mut S,
        block_id: Uuid,
        span: Option<HourSpan>,
        project: Option<Option<Uuid>>,
    ) -> PlannerResult<DayBlock> {
        let block = Self::require_block(store, block_id).await?;

        if let Some(Some(project_id)) = project {
            Self::require_project_in(store, &block, project_id).await?;
        }
        let timings = match span {
            Some(span) => Self::plan_retime(store, &block, span).await?,
            None => None,
        };

        if let Some(timings) = timings {
            store.set_hours(&timings).await?;
        }
        if let Some(project_id) = project {
            if !store.set_project(block_id, project_id).await? {
                return Err(PlannerError::BlockNotFound(block_id));
            }
        }

        Self::require_block(store, block_id).await
    }

    /// The day's new timings after moving `block` to `span`, or `None` when
    /// nothing changes.
    async fn plan_retime<S: DayBlockStore>(
        store: &mut S,
        block: &DayBlock,
        span: HourSpan,
    ) -> PlannerResult<Option<Vec<BlockTiming>>> {
        let day = store.list_day(block.workspace_id, block.date).await?;

        let mut timings: Vec<BlockTiming> = day.iter().map(BlockTiming::from).collect();
        let index = timings
            .iter()
            .position(|t| t.id == block.id)
            .ok_or(PlannerError::BlockNotFound(block.id))?;

        if span.start_hour != block.start_hour {
            resize(&mut timings, index, Boundary::Start, span.start_hour)?;
        }
        if span.end_hour != block.end_hour {
            resize(&mut timings, index, Boundary::End, span.end_hour)?;
        }
        let unchanged = timings
            .iter()
            .zip(&day)
            .all(|(t, b)| t.start_hour == b.start_hour && t.end_hour == b.end_hour);
        if unchanged {
            return Ok(None);
        }

        validate_layout(&timings)?;
        Ok(Some(timings))
    }

    /// Replace the hours of every block of a day at once.
    ///
    /// `candidates` must name exactly the day's blocks. Nothing is written
    /// unless the whole candidate layout is contiguous.
    pub async fn batch_retime<S: DayBlockStore>(
        store: &mut S,
        workspace_id: Uuid,
        date: NaiveDate,
        candidates: &[BlockTiming],
    ) -> PlannerResult<Vec<DayBlock>> {
        Self::require_workspace(store, workspace_id).await?;

        let stored = store.list_day(workspace_id, date).await?;
        let stored_ids: HashSet<Uuid> = stored.iter().map(|b| b.id).collect();

        let mut seen = HashSet::with_capacity(candidates.len());
        for candidate in candidates {
            if !seen.insert(candidate.id) {
                return Err(PlannerError::Invalid(format!(
                    "Block {} appears more than once",
                    candidate.id
                )));
            }
            if !stored_ids.contains(&candidate.id) {
                return Err(PlannerError::BlockNotFound(candidate.id));
            }
        }
        if seen.len() != stored_ids.len() {
            return Err(PlannerError::Invalid(
                "Batch must include every block of the day".to_string(),
            ));
        }

        validate_layout(candidates)?;
        store.set_hours(candidates).await?;

        tracing::info!("Retimed {} blocks on {} for {}", candidates.len(), date, workspace_id);
        Ok(store.list_day(workspace_id, date).await?)
    }

    async fn require_workspace<S: DayBlockStore>(
        store: &mut S,
        workspace_id: Uuid,
    ) -> PlannerResult<()> {
        if store.workspace_exists(workspace_id).await? {
            Ok(())
        } else {
            Err(PlannerError::WorkspaceNotFound(workspace_id))
        }
    }

    async fn require_project_in<S: DayBlockStore>(
        store: &mut S,
        block: &DayBlock,
        project_id: Uuid,
    ) -> PlannerResult<()> {
        let owner = store
            .project_workspace(project_id)
            .await?
            .ok_or(PlannerError::ProjectNotFound(project_id))?;
        if owner != block.workspace_id {
            return Err(PlannerError::Invalid(
                "Project belongs to a different workspace".to_string(),
            ));
        }
        Ok(())
    }

    async fn require_block<S: DayBlockStore>(
        store: &mut S,
        block_id: Uuid,
    ) -> PlannerResult<DayBlock> {
        store
            .get_block(block_id)
            .await?
            .ok_or(PlannerError::BlockNotFound(block_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::StaleBlock;
    use chrono::Utc;
    use std::collections::HashMap;

    struct ProjectRecord {
        workspace_id: Uuid,
        name: String,
        color: String,
    }

    /// In-memory store with the same all-or-nothing contract as Postgres.
    #[derive(Default)]
    struct MemoryStore {
        workspaces: HashSet<Uuid>,
        projects: HashMap<Uuid, ProjectRecord>,
        blocks: Vec<DayBlock>,
        writes: usize,
        fail_inserts: bool,
    }

    impl MemoryStore {
        fn with_workspace() -> (Self, Uuid) {
            let workspace_id = Uuid::new_v4();
            let mut store = MemoryStore::default();
            store.workspaces.insert(workspace_id);
            (store, workspace_id)
        }

        fn add_project(&mut self, workspace_id: Uuid, name: &str, color: &str) -> Uuid {
            let id = Uuid::new_v4();
            self.projects.insert(
                id,
                ProjectRecord {
                    workspace_id,
                    name: name.to_string(),
                    color: color.to_string(),
                },
            );
            id
        }

        fn joined(&self, block: &DayBlock) -> DayBlock {
            let project = block.project_id.and_then(|id| self.projects.get(&id));
            DayBlock {
                project_name: project.map(|p| p.name.clone()),
                project_color: project.map(|p| p.color.clone()),
                ..block.clone()
            }
        }

        fn push_spans(&mut self, workspace_id: Uuid, date: NaiveDate, spans: &[HourSpan]) {
            for (idx, span) in spans.iter().enumerate() {
                self.blocks.push(DayBlock {
                    id: Uuid::new_v4(),
                    workspace_id,
                    date,
                    start_hour: span.start_hour,
                    end_hour: span.end_hour,
                    project_id: None,
                    project_name: None,
                    project_color: None,
                    sort_order: idx as i32,
                    created_at: Utc::now(),
                });
            }
        }
    }

    impl DayBlockStore for MemoryStore {
        async fn workspace_exists(&mut self, workspace_id: Uuid) -> anyhow::Result<bool> {
            Ok(self.workspaces.contains(&workspace_id))
        }

        async fn project_workspace(&mut self, project_id: Uuid) -> anyhow::Result<Option<Uuid>> {
            Ok(self.projects.get(&project_id).map(|p| p.workspace_id))
        }

        async fn list_day(
            &mut self,
            workspace_id: Uuid,
            date: NaiveDate,
        ) -> anyhow::Result<Vec<DayBlock>> {
            let mut day: Vec<DayBlock> = self
                .blocks
                .iter()
                .filter(|b| b.workspace_id == workspace_id && b.date == date)
                .map(|b| self.joined(b))
                .collect();
            day.sort_by_key(|b| b.start_hour);
            Ok(day)
        }

        async fn get_block(&mut self, block_id: Uuid) -> anyhow::Result<Option<DayBlock>> {
            Ok(self
                .blocks
                .iter()
                .find(|b| b.id == block_id)
                .map(|b| self.joined(b)))
        }

        async fn insert_day(
            &mut self,
            workspace_id: Uuid,
            date: NaiveDate,
            spans: &[HourSpan],
        ) -> anyhow::Result<()> {
            if self.fail_inserts {
                anyhow::bail!("duplicate key value violates unique constraint");
            }
            self.writes += 1;
            self.push_spans(workspace_id, date, spans);
            Ok(())
        }

        async fn replace_day(
            &mut self,
            workspace_id: Uuid,
            date: NaiveDate,
            spans: &[HourSpan],
        ) -> anyhow::Result<()> {
            self.writes += 1;
            self.blocks
                .retain(|b| !(b.workspace_id == workspace_id && b.date == date));
            self.push_spans(workspace_id, date, spans);
            Ok(())
        }

        async fn set_project(
            &mut self,
            block_id: Uuid,
            project_id: Option<Uuid>,
        ) -> anyhow::Result<bool> {
            self.writes += 1;
            match self.blocks.iter_mut().find(|b| b.id == block_id) {
                Some(block) => {
                    block.project_id = project_id;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn set_hours(&mut self, timings: &[BlockTiming]) -> anyhow::Result<()> {
            if let Some(missing) = timings
                .iter()
                .find(|t| !self.blocks.iter().any(|b| b.id == t.id))
            {
                return Err(StaleBlock(missing.id).into());
            }
            self.writes += 1;
            for timing in timings {
                if let Some(block) = self.blocks.iter_mut().find(|b| b.id == timing.id) {
                    block.start_hour = timing.start_hour;
                    block.end_hour = timing.end_hour;
                }
            }
            Ok(())
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn boundaries(blocks: &[DayBlock]) -> Vec<i32> {
        let mut edges: Vec<i32> = blocks.iter().map(|b| b.start_hour).collect();
        edges.extend(blocks.last().map(|b| b.end_hour));
        edges
    }

    fn timings(blocks: &[DayBlock]) -> Vec<BlockTiming> {
        blocks.iter().map(BlockTiming::from).collect()
    }

    #[tokio::test]
    async fn test_first_read_seeds_weekday_template() {
        let (mut store, ws) = MemoryStore::with_workspace();

        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        assert_eq!(blocks.len(), 7);
        assert_eq!(boundaries(&blocks), vec![8, 11, 12, 15, 16, 19, 20, 22]);
        assert!(validate_layout(&blocks).is_ok());
        assert!(blocks.iter().all(|b| b.project_id.is_none()));
        let orders: Vec<i32> = blocks.iter().map(|b| b.sort_order).collect();
        assert_eq!(orders, (0..7).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_second_read_does_not_reseed() {
        let (mut store, ws) = MemoryStore::with_workspace();

        let first = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        let second = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.writes, 1);
        assert_eq!(store.blocks.len(), 7);
    }

    #[tokio::test]
    async fn test_seed_unknown_workspace() {
        let (mut store, _) = MemoryStore::with_workspace();

        let err = DayPlanner::get_or_seed(&mut store, Uuid::new_v4(), day())
            .await
            .unwrap_err();

        assert!(matches!(err, PlannerError::WorkspaceNotFound(_)));
        assert!(store.blocks.is_empty());
    }

    #[tokio::test]
    async fn test_seed_failure_surfaces_when_day_still_empty() {
        let (mut store, ws) = MemoryStore::with_workspace();
        store.fail_inserts = true;

        let err = tokio_test::assert_err!(DayPlanner::get_or_seed(&mut store, ws, day()).await);

        assert!(matches!(err, PlannerError::Storage(_)));
    }

    #[tokio::test]
    async fn test_weekend_template_replaces_day() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let seeded = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let blocks = DayPlanner::apply_template(&mut store, ws, day(), DayTemplate::Weekend)
            .await
            .unwrap();

        assert_eq!(blocks.len(), 4);
        assert_eq!(boundaries(&blocks), vec![8, 11, 14, 16, 18]);
        assert!(blocks.iter().all(|b| !seeded.iter().any(|s| s.id == b.id)));
    }

    #[tokio::test]
    async fn test_template_only_touches_its_day() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let other_day = day().succ_opt().unwrap();
        DayPlanner::get_or_seed(&mut store, ws, other_day)
            .await
            .unwrap();

        DayPlanner::apply_template(&mut store, ws, day(), DayTemplate::Weekend)
            .await
            .unwrap();

        let untouched = DayPlanner::get_or_seed(&mut store, ws, other_day)
            .await
            .unwrap();
        assert_eq!(untouched.len(), 7);
    }

    #[tokio::test]
    async fn test_assign_project_joins_display_fields() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let project = store.add_project(ws, "Deep work", "#22c55e");
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let updated = DayPlanner::assign_project(&mut store, blocks[0].id, Some(project))
            .await
            .unwrap();
        assert_eq!(updated.project_id, Some(project));

        let refreshed = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        assert_eq!(refreshed[0].project_name.as_deref(), Some("Deep work"));
        assert_eq!(refreshed[0].project_color.as_deref(), Some("#22c55e"));
        assert!(refreshed[1..]
            .iter()
            .all(|b| b.project_name.is_none() && b.project_color.is_none()));
        assert_eq!(boundaries(&refreshed), boundaries(&blocks));
    }

    #[tokio::test]
    async fn test_assign_project_can_be_cleared() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let project = store.add_project(ws, "Admin", "#f97316");
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        DayPlanner::assign_project(&mut store, blocks[3].id, Some(project))
            .await
            .unwrap();
        let cleared = DayPlanner::assign_project(&mut store, blocks[3].id, None)
            .await
            .unwrap();

        assert_eq!(cleared.project_id, None);
        assert_eq!(cleared.project_name, None);
    }

    #[tokio::test]
    async fn test_assign_rejects_unknown_and_foreign_projects() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let other_ws = Uuid::new_v4();
        store.workspaces.insert(other_ws);
        let foreign = store.add_project(other_ws, "Elsewhere", "#000000");
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let err = DayPlanner::assign_project(&mut store, blocks[0].id, Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::ProjectNotFound(_)));

        let err = DayPlanner::assign_project(&mut store, blocks[0].id, Some(foreign))
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::Invalid(_)));

        let err = DayPlanner::assign_project(&mut store, Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::BlockNotFound(_)));
    }

    #[tokio::test]
    async fn test_batch_retime_accepts_coupled_resize() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let mut candidate = timings(&blocks);
        resize(&mut candidate, 2, Boundary::End, 14).unwrap();

        let updated =
            tokio_test::assert_ok!(DayPlanner::batch_retime(&mut store, ws, day(), &candidate).await);

        assert_eq!(boundaries(&updated), vec![8, 11, 12, 14, 16, 19, 20, 22]);
        assert_eq!(updated[3].id, blocks[3].id);
        assert_eq!((updated[3].start_hour, updated[3].end_hour), (14, 16));
    }

    #[tokio::test]
    async fn test_batch_retime_rejects_gap_without_writing() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        let writes_before = store.writes;

        // block 2 shrinks to 12-14 while block 3 still starts at 15
        let mut candidate = timings(&blocks);
        candidate[2].end_hour = 14;

        let err = DayPlanner::batch_retime(&mut store, ws, day(), &candidate)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlannerError::Layout(LayoutError::GapOrOverlap { .. })
        ));
        assert_eq!(store.writes, writes_before);
        let after = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        assert_eq!(after, blocks);
    }

    #[tokio::test]
    async fn test_batch_retime_rejects_inverted_block() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let mut candidate = timings(&blocks);
        candidate[1].end_hour = 11;
        candidate[2].start_hour = 11;

        let err = DayPlanner::batch_retime(&mut store, ws, day(), &candidate)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlannerError::Layout(LayoutError::EmptySpan { .. })
        ));
        let after = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        assert_eq!(after, blocks);
    }

    #[tokio::test]
    async fn test_batch_retime_requires_the_full_day() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let partial = timings(&blocks[..3]);
        let err = DayPlanner::batch_retime(&mut store, ws, day(), &partial)
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::Invalid(_)));

        let mut stranger = timings(&blocks);
        stranger[0].id = Uuid::new_v4();
        let err = DayPlanner::batch_retime(&mut store, ws, day(), &stranger)
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::BlockNotFound(_)));

        let mut doubled = timings(&blocks);
        doubled.push(doubled[0]);
        let err = DayPlanner::batch_retime(&mut store, ws, day(), &doubled)
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_batch_retime_accepts_unsorted_input() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let mut candidate = timings(&blocks);
        resize(&mut candidate, 4, Boundary::Start, 17).unwrap();
        candidate.reverse();

        let updated = DayPlanner::batch_retime(&mut store, ws, day(), &candidate)
            .await
            .unwrap();
        assert_eq!(boundaries(&updated), vec![8, 11, 12, 15, 17, 19, 20, 22]);
    }

    #[tokio::test]
    async fn test_retime_block_moves_neighbours() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let updated = DayPlanner::retime_block(&mut store, blocks[2].id, HourSpan::new(13, 14))
            .await
            .unwrap();
        assert_eq!((updated.start_hour, updated.end_hour), (13, 14));

        let after = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        assert_eq!(boundaries(&after), vec![8, 11, 13, 14, 16, 19, 20, 22]);
    }

    #[tokio::test]
    async fn test_retime_block_refuses_day_anchors() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let err = DayPlanner::retime_block(&mut store, blocks[0].id, HourSpan::new(7, 11))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Layout(LayoutError::FixedAnchor("start"))
        ));

        let err = DayPlanner::retime_block(&mut store, blocks[6].id, HourSpan::new(20, 23))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Layout(LayoutError::FixedAnchor("end"))
        ));

        let after = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        assert_eq!(after, blocks);
    }

    #[tokio::test]
    async fn test_retime_block_that_swallows_neighbour_is_rejected() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        let writes_before = store.writes;

        let err = DayPlanner::retime_block(&mut store, blocks[0].id, HourSpan::new(8, 13))
            .await
            .unwrap_err();

        assert!(matches!(err, PlannerError::Layout(_)));
        assert_eq!(store.writes, writes_before);
    }

    #[tokio::test]
    async fn test_retime_block_noop() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        let writes_before = store.writes;

        let same = DayPlanner::retime_block(&mut store, blocks[1].id, HourSpan::new(11, 12))
            .await
            .unwrap();

        assert_eq!(same, blocks[1]);
        assert_eq!(store.writes, writes_before);
    }

    #[tokio::test]
    async fn test_update_block_retimes_and_assigns_together() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let project = store.add_project(ws, "Writing", "#3b82f6");
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let updated = DayPlanner::update_block(
            &mut store,
            blocks[2].id,
            Some(HourSpan::new(12, 14)),
            Some(Some(project)),
        )
        .await
        .unwrap();

        assert_eq!((updated.start_hour, updated.end_hour), (12, 14));
        assert_eq!(updated.project_name.as_deref(), Some("Writing"));
        let after = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        assert_eq!(boundaries(&after), vec![8, 11, 12, 14, 16, 19, 20, 22]);
    }

    #[tokio::test]
    async fn test_update_block_with_foreign_project_leaves_hours_alone() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let other_ws = Uuid::new_v4();
        store.workspaces.insert(other_ws);
        let foreign = store.add_project(other_ws, "Elsewhere", "#000000");
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        let writes_before = store.writes;

        let err = DayPlanner::update_block(
            &mut store,
            blocks[2].id,
            Some(HourSpan::new(12, 14)),
            Some(Some(foreign)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PlannerError::Invalid(_)));

        let err = DayPlanner::update_block(
            &mut store,
            blocks[2].id,
            Some(HourSpan::new(12, 14)),
            Some(Some(Uuid::new_v4())),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PlannerError::ProjectNotFound(_)));

        assert_eq!(store.writes, writes_before);
        let after = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        assert_eq!(after, blocks);
    }

    #[tokio::test]
    async fn test_update_block_with_bad_layout_leaves_project_alone() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let project = store.add_project(ws, "Writing", "#3b82f6");
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let err = DayPlanner::update_block(
            &mut store,
            blocks[0].id,
            Some(HourSpan::new(7, 11)),
            Some(Some(project)),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PlannerError::Layout(_)));
        let after = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();
        assert_eq!(after, blocks);
    }

    #[tokio::test]
    async fn test_vanished_block_surfaces_as_stale() {
        let (mut store, ws) = MemoryStore::with_workspace();
        let blocks = DayPlanner::get_or_seed(&mut store, ws, day()).await.unwrap();

        let mut candidate = timings(&blocks);
        candidate[6].id = Uuid::new_v4();
        let err = store.set_hours(&candidate).await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<StaleBlock>().map(|stale| stale.0),
            Some(candidate[6].id)
        );
    }
}
