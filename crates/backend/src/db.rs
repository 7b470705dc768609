use anyhow::Context;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{
        deadpool::{Object, Pool},
        AsyncDieselConnectionManager, ManagerConfig,
    },
    scoped_futures::ScopedFutureExt,
    AsyncConnection, AsyncPgConnection, RunQueryDsl, SimpleAsyncConnection,
};
use planner_types::{
    BlockTiming, DayBlock, HourSpan, Project, ProjectSummary, Tag, Task, TaskTemplate,
    TimerSession, Workspace,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::{DayBlockRow, NewDayBlock, NewTask, TaskChangeset, TaskRow};
use crate::repository::StaleBlock;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConn = Object<AsyncPgConnection>;

const INITIAL_SCHEMA: &str =
    include_str!("../migrations/2026-01-01-000000_initial_schema/up.sql");

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    // The connection future drives the socket; it must be polled for the client to work
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    AsyncPgConnection::try_from(client).await
}

pub fn establish_connection_pool(config: &AppConfig) -> anyhow::Result<DbPool> {
    let manager = if config.database_tls {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            config.database_url.clone(),
            manager_config,
        )
    } else {
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url.clone())
    };

    let pool = Pool::builder(manager)
        .max_size(config.database_pool_size)
        .build()?;

    Ok(pool)
}

pub async fn get_conn(pool: &DbPool) -> anyhow::Result<DbConn> {
    pool.get().await.context("Failed to get connection")
}

/// Create any missing tables. Safe to run on every start.
pub async fn bootstrap_schema(pool: &DbPool) -> anyhow::Result<()> {
    let mut conn = get_conn(pool).await?;
    conn.batch_execute(INITIAL_SCHEMA)
        .await
        .context("Failed to apply initial schema")?;
    tracing::info!("Database schema ready");
    Ok(())
}

// Workspace database operations
pub mod workspaces {
    use super::*;

    pub async fn list_all(conn: &mut AsyncPgConnection) -> anyhow::Result<Vec<Workspace>> {
        use crate::schema::workspaces::dsl::*;

        let items = workspaces
            .order_by(created_at.desc())
            .load::<Workspace>(conn)
            .await?;

        Ok(items)
    }

    pub async fn get_by_id(
        conn: &mut AsyncPgConnection,
        workspace_id: Uuid,
    ) -> anyhow::Result<Option<Workspace>> {
        use crate::schema::workspaces::dsl::*;

        let workspace = workspaces
            .filter(id.eq(workspace_id))
            .first::<Workspace>(conn)
            .await
            .optional()?;

        Ok(workspace)
    }

    pub async fn exists(conn: &mut AsyncPgConnection, workspace_id: Uuid) -> anyhow::Result<bool> {
        use crate::schema::workspaces::dsl::*;

        let found = diesel::select(diesel::dsl::exists(workspaces.filter(id.eq(workspace_id))))
            .get_result::<bool>(conn)
            .await?;

        Ok(found)
    }

    pub async fn create(conn: &mut AsyncPgConnection, name_val: &str) -> anyhow::Result<Workspace> {
        use crate::schema::workspaces::dsl::*;

        let workspace = diesel::insert_into(workspaces)
            .values(name.eq(name_val))
            .get_result::<Workspace>(conn)
            .await?;

        Ok(workspace)
    }

    pub async fn rename(
        conn: &mut AsyncPgConnection,
        workspace_id: Uuid,
        name_val: &str,
    ) -> anyhow::Result<Option<Workspace>> {
        use crate::schema::workspaces::dsl::*;

        let updated = diesel::update(workspaces.filter(id.eq(workspace_id)))
            .set(name.eq(name_val))
            .get_result::<Workspace>(conn)
            .await
            .optional()?;

        Ok(updated)
    }

    pub async fn delete(conn: &mut AsyncPgConnection, workspace_id: Uuid) -> anyhow::Result<()> {
        use crate::schema::workspaces::dsl::*;

        diesel::delete(workspaces.filter(id.eq(workspace_id)))
            .execute(conn)
            .await?;

        Ok(())
    }
}

// Project database operations
pub mod projects {
    use super::*;

    pub async fn list(
        conn: &mut AsyncPgConnection,
        workspace_filter: Option<Uuid>,
    ) -> anyhow::Result<Vec<Project>> {
        use crate::schema::projects::dsl::*;

        let mut query = projects.order_by(created_at.desc()).into_boxed();
        if let Some(ws) = workspace_filter {
            query = query.filter(workspace_id.eq(ws));
        }

        let items = query.load::<Project>(conn).await?;
        Ok(items)
    }

    pub async fn get_by_id(
        conn: &mut AsyncPgConnection,
        project_id: Uuid,
    ) -> anyhow::Result<Option<Project>> {
        use crate::schema::projects::dsl::*;

        let project = projects
            .filter(id.eq(project_id))
            .first::<Project>(conn)
            .await
            .optional()?;

        Ok(project)
    }

    pub async fn workspace_of(
        conn: &mut AsyncPgConnection,
        project_id: Uuid,
    ) -> anyhow::Result<Option<Uuid>> {
        use crate::schema::projects::dsl::*;

        let owner = projects
            .filter(id.eq(project_id))
            .select(workspace_id)
            .first::<Uuid>(conn)
            .await
            .optional()?;

        Ok(owner)
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        workspace_id_val: Uuid,
        name_val: &str,
        color_val: &str,
    ) -> anyhow::Result<Project> {
        use crate::schema::projects::dsl::*;

        let project = diesel::insert_into(projects)
            .values((
                workspace_id.eq(workspace_id_val),
                name.eq(name_val),
                color.eq(color_val),
            ))
            .get_result::<Project>(conn)
            .await?;

        Ok(project)
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        project_id: Uuid,
        name_val: Option<&str>,
        color_val: Option<&str>,
    ) -> anyhow::Result<Option<Project>> {
        use crate::schema::projects::dsl::*;

        if let Some(n) = name_val {
            diesel::update(projects.filter(id.eq(project_id)))
                .set(name.eq(n))
                .execute(conn)
                .await?;
        }
        if let Some(c) = color_val {
            diesel::update(projects.filter(id.eq(project_id)))
                .set(color.eq(c))
                .execute(conn)
                .await?;
        }

        get_by_id(conn, project_id).await
    }

    pub async fn delete(conn: &mut AsyncPgConnection, project_id: Uuid) -> anyhow::Result<()> {
        use crate::schema::projects::dsl::*;

        diesel::delete(projects.filter(id.eq(project_id)))
            .execute(conn)
            .await?;

        Ok(())
    }
}

// Tag database operations
pub mod tags {
    use super::*;

    pub async fn list(
        conn: &mut AsyncPgConnection,
        workspace_filter: Option<Uuid>,
    ) -> anyhow::Result<Vec<Tag>> {
        use crate::schema::tags::dsl::*;

        let mut query = tags.order_by(name.asc()).into_boxed();
        if let Some(ws) = workspace_filter {
            query = query.filter(workspace_id.eq(ws));
        }

        let items = query.load::<Tag>(conn).await?;
        Ok(items)
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        workspace_id_val: Uuid,
        name_val: &str,
        color_val: &str,
        icon_val: &str,
    ) -> anyhow::Result<Tag> {
        use crate::schema::tags::dsl::*;

        let tag = diesel::insert_into(tags)
            .values((
                workspace_id.eq(workspace_id_val),
                name.eq(name_val),
                color.eq(color_val),
                icon.eq(icon_val),
            ))
            .get_result::<Tag>(conn)
            .await?;

        Ok(tag)
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        tag_id: Uuid,
        name_val: Option<&str>,
        color_val: Option<&str>,
        icon_val: Option<&str>,
    ) -> anyhow::Result<Option<Tag>> {
        use crate::schema::tags::dsl::*;

        if let Some(n) = name_val {
            diesel::update(tags.filter(id.eq(tag_id)))
                .set(name.eq(n))
                .execute(conn)
                .await?;
        }
        if let Some(c) = color_val {
            diesel::update(tags.filter(id.eq(tag_id)))
                .set(color.eq(c))
                .execute(conn)
                .await?;
        }
        if let Some(i) = icon_val {
            diesel::update(tags.filter(id.eq(tag_id)))
                .set(icon.eq(i))
                .execute(conn)
                .await?;
        }

        let tag = tags
            .filter(id.eq(tag_id))
            .first::<Tag>(conn)
            .await
            .optional()?;

        Ok(tag)
    }

    pub async fn delete(conn: &mut AsyncPgConnection, tag_id: Uuid) -> anyhow::Result<()> {
        use crate::schema::tags::dsl::*;

        diesel::delete(tags.filter(id.eq(tag_id))).execute(conn).await?;

        Ok(())
    }
}

// Task database operations
pub mod tasks {
    use super::*;
    use crate::schema::{projects, tags, task_tags, tasks};
    use planner_types::{TaskListQuery, TaskStatus};

    type TaskWithProject = (TaskRow, Uuid, String, String);

    /// Load the tags of every task in `task_ids`, grouped by task.
    async fn tags_by_task(
        conn: &mut AsyncPgConnection,
        task_ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, Vec<Tag>>> {
        let pairs = task_tags::table
            .inner_join(tags::table)
            .filter(task_tags::task_id.eq_any(task_ids))
            .order_by(tags::name.asc())
            .select((
                task_tags::task_id,
                (tags::id, tags::workspace_id, tags::name, tags::color, tags::icon),
            ))
            .load::<(Uuid, Tag)>(conn)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for (task_id, tag) in pairs {
            grouped.entry(task_id).or_default().push(tag);
        }
        Ok(grouped)
    }

    async fn assemble(
        conn: &mut AsyncPgConnection,
        rows: Vec<TaskWithProject>,
    ) -> anyhow::Result<Vec<Task>> {
        let ids: Vec<Uuid> = rows.iter().map(|(row, ..)| row.id).collect();
        let mut tags = tags_by_task(conn, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|(row, project_id, project_name, project_color)| {
                let task_tags = tags.remove(&row.id).unwrap_or_default();
                row.into_task(
                    ProjectSummary {
                        id: project_id,
                        name: project_name,
                        color: project_color,
                    },
                    task_tags,
                )
            })
            .collect())
    }

    pub async fn list(
        conn: &mut AsyncPgConnection,
        filter: &TaskListQuery,
    ) -> anyhow::Result<Vec<Task>> {
        let mut query = tasks::table
            .inner_join(projects::table)
            .select((
                TaskRow::as_select(),
                projects::id,
                projects::name,
                projects::color,
            ))
            .order_by(tasks::scheduled_at.asc())
            .into_boxed();

        if let Some(project_id) = filter.project_id {
            query = query.filter(tasks::project_id.eq(project_id));
        }
        if let Some(workspace_id) = filter.workspace_id {
            query = query.filter(projects::workspace_id.eq(workspace_id));
        }
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            query = query
                .filter(tasks::scheduled_at.ge(start))
                .filter(tasks::scheduled_at.le(end));
        }
        if filter.pending == Some(true) {
            query = query
                .filter(tasks::status.eq(TaskStatus::Pending.as_str()))
                .filter(tasks::scheduled_at.lt(Utc::now()));
        }

        let rows = query.load::<TaskWithProject>(conn).await?;
        assemble(conn, rows).await
    }

    pub async fn get_by_id(
        conn: &mut AsyncPgConnection,
        task_id: Uuid,
    ) -> anyhow::Result<Option<Task>> {
        let row = tasks::table
            .inner_join(projects::table)
            .filter(tasks::id.eq(task_id))
            .select((
                TaskRow::as_select(),
                projects::id,
                projects::name,
                projects::color,
            ))
            .first::<TaskWithProject>(conn)
            .await
            .optional()?;

        match row {
            Some(row) => Ok(assemble(conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn replace_tags(
        conn: &mut AsyncPgConnection,
        task_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), diesel::result::Error> {
        diesel::delete(task_tags::table.filter(task_tags::task_id.eq(task_id)))
            .execute(conn)
            .await?;

        if !tag_ids.is_empty() {
            let links: Vec<_> = tag_ids
                .iter()
                .map(|tag_id| (task_tags::task_id.eq(task_id), task_tags::tag_id.eq(*tag_id)))
                .collect();
            diesel::insert_into(task_tags::table)
                .values(links)
                .execute(conn)
                .await?;
        }

        Ok(())
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_task: NewTask,
        tag_ids: &[Uuid],
    ) -> anyhow::Result<Task> {
        let task_id = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let task_id = diesel::insert_into(tasks::table)
                        .values(&new_task)
                        .returning(tasks::id)
                        .get_result::<Uuid>(conn)
                        .await?;
                    replace_tags(conn, task_id, tag_ids).await?;
                    Ok(task_id)
                }
                .scope_boxed()
            })
            .await?;

        get_by_id(conn, task_id)
            .await?
            .context("Task vanished after insert")
    }

    /// Apply `changes` and optionally replace the tag set. Returns `None` when
    /// the task does not exist.
    pub async fn update(
        conn: &mut AsyncPgConnection,
        task_id: Uuid,
        changes: TaskChangeset,
        tag_ids: Option<Vec<Uuid>>,
    ) -> anyhow::Result<Option<Task>> {
        let found = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let exists = diesel::select(diesel::dsl::exists(
                        tasks::table.filter(tasks::id.eq(task_id)),
                    ))
                    .get_result::<bool>(conn)
                    .await?;
                    if !exists {
                        return Ok(false);
                    }

                    if !changes.is_empty() {
                        diesel::update(tasks::table.filter(tasks::id.eq(task_id)))
                            .set(&changes)
                            .execute(conn)
                            .await?;
                    }
                    if let Some(tag_ids) = tag_ids {
                        replace_tags(conn, task_id, &tag_ids).await?;
                    }
                    Ok(true)
                }
                .scope_boxed()
            })
            .await?;

        if !found {
            return Ok(None);
        }
        get_by_id(conn, task_id).await
    }

    pub async fn delete(conn: &mut AsyncPgConnection, task_id: Uuid) -> anyhow::Result<()> {
        diesel::delete(tasks::table.filter(tasks::id.eq(task_id)))
            .execute(conn)
            .await?;

        Ok(())
    }
}

// Task template database operations
pub mod task_templates {
    use super::*;

    pub async fn list(
        conn: &mut AsyncPgConnection,
        project_filter: Option<Uuid>,
    ) -> anyhow::Result<Vec<TaskTemplate>> {
        use crate::schema::task_templates::dsl::*;

        let mut query = task_templates.order_by(created_at.asc()).into_boxed();
        if let Some(project) = project_filter {
            query = query.filter(project_id.eq(project));
        }

        let items = query.load::<TaskTemplate>(conn).await?;
        Ok(items)
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        project_id_val: Uuid,
        title_val: &str,
    ) -> anyhow::Result<TaskTemplate> {
        use crate::schema::task_templates::dsl::*;

        let template = diesel::insert_into(task_templates)
            .values((project_id.eq(project_id_val), title.eq(title_val)))
            .get_result::<TaskTemplate>(conn)
            .await?;

        Ok(template)
    }

    pub async fn delete(conn: &mut AsyncPgConnection, template_id: Uuid) -> anyhow::Result<()> {
        use crate::schema::task_templates::dsl::*;

        diesel::delete(task_templates.filter(id.eq(template_id)))
            .execute(conn)
            .await?;

        Ok(())
    }
}

// Timer session database operations
pub mod timer_sessions {
    use super::*;

    pub const RECENT_LIMIT: i64 = 50;

    pub async fn list_recent(conn: &mut AsyncPgConnection) -> anyhow::Result<Vec<TimerSession>> {
        use crate::schema::timer_sessions::dsl::*;

        let items = timer_sessions
            .order_by(started_at.desc())
            .limit(RECENT_LIMIT)
            .load::<TimerSession>(conn)
            .await?;

        Ok(items)
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        task_id_val: Option<Uuid>,
        duration_seconds_val: i32,
    ) -> anyhow::Result<TimerSession> {
        use crate::schema::timer_sessions::dsl::*;

        let session = diesel::insert_into(timer_sessions)
            .values((
                task_id.eq(task_id_val),
                started_at.eq(Utc::now()),
                duration_seconds.eq(duration_seconds_val),
            ))
            .get_result::<TimerSession>(conn)
            .await?;

        Ok(session)
    }
}

// Day block database operations
pub mod day_blocks {
    use super::*;
    use crate::schema::{day_blocks, projects};

    type JoinedRow = (DayBlockRow, Option<String>, Option<String>);

    fn new_rows(workspace_id: Uuid, date: NaiveDate, spans: &[HourSpan]) -> Vec<NewDayBlock> {
        spans
            .iter()
            .enumerate()
            .map(|(idx, span)| NewDayBlock {
                workspace_id,
                date,
                start_hour: span.start_hour,
                end_hour: span.end_hour,
                sort_order: idx as i32,
            })
            .collect()
    }

    pub async fn list_for_day(
        conn: &mut AsyncPgConnection,
        workspace_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<DayBlock>> {
        let rows = day_blocks::table
            .left_join(projects::table)
            .filter(day_blocks::workspace_id.eq(workspace_id))
            .filter(day_blocks::date.eq(date))
            .order_by(day_blocks::start_hour.asc())
            .select((
                DayBlockRow::as_select(),
                projects::name.nullable(),
                projects::color.nullable(),
            ))
            .load::<JoinedRow>(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(row, name, color)| row.joined(name, color))
            .collect())
    }

    pub async fn get_by_id(
        conn: &mut AsyncPgConnection,
        block_id: Uuid,
    ) -> anyhow::Result<Option<DayBlock>> {
        let row = day_blocks::table
            .left_join(projects::table)
            .filter(day_blocks::id.eq(block_id))
            .select((
                DayBlockRow::as_select(),
                projects::name.nullable(),
                projects::color.nullable(),
            ))
            .first::<JoinedRow>(conn)
            .await
            .optional()?;

        Ok(row.map(|(row, name, color)| row.joined(name, color)))
    }

    pub async fn insert_spans(
        conn: &mut AsyncPgConnection,
        workspace_id: Uuid,
        date: NaiveDate,
        spans: &[HourSpan],
    ) -> anyhow::Result<()> {
        diesel::insert_into(day_blocks::table)
            .values(new_rows(workspace_id, date, spans))
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Delete the day's blocks and insert `spans` in their place, atomically.
    pub async fn replace_day(
        conn: &mut AsyncPgConnection,
        workspace_id: Uuid,
        date: NaiveDate,
        spans: &[HourSpan],
    ) -> anyhow::Result<()> {
        let rows = new_rows(workspace_id, date, spans);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let removed = diesel::delete(
                    day_blocks::table
                        .filter(day_blocks::workspace_id.eq(workspace_id))
                        .filter(day_blocks::date.eq(date)),
                )
                .execute(conn)
                .await?;
                tracing::debug!("Replacing {} blocks on {} for {}", removed, date, workspace_id);

                diesel::insert_into(day_blocks::table)
                    .values(&rows)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        Ok(())
    }

    /// Returns whether the block existed.
    pub async fn set_project(
        conn: &mut AsyncPgConnection,
        block_id: Uuid,
        project_id: Option<Uuid>,
    ) -> anyhow::Result<bool> {
        let affected = diesel::update(day_blocks::table.filter(day_blocks::id.eq(block_id)))
            .set(day_blocks::project_id.eq(project_id))
            .execute(conn)
            .await?;

        Ok(affected > 0)
    }

    /// Write every timing in one transaction; any missing block rolls it all back.
    pub async fn set_hours(
        conn: &mut AsyncPgConnection,
        timings: &[BlockTiming],
    ) -> anyhow::Result<()> {
        conn.transaction::<_, anyhow::Error, _>(|conn| {
            async move {
                for timing in timings {
                    let affected =
                        diesel::update(day_blocks::table.filter(day_blocks::id.eq(timing.id)))
                            .set((
                                day_blocks::start_hour.eq(timing.start_hour),
                                day_blocks::end_hour.eq(timing.end_hour),
                            ))
                            .execute(conn)
                            .await?;
                    if affected == 0 {
                        return Err(StaleBlock(timing.id).into());
                    }
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }
}

// Single-row PIN storage
pub mod auth_pin {
    use super::*;

    const PIN_ROW_ID: i32 = 1;

    pub async fn get_hash(conn: &mut AsyncPgConnection) -> anyhow::Result<Option<String>> {
        use crate::schema::auth_pin::dsl::*;

        let hash = auth_pin
            .select(pin_hash)
            .first::<String>(conn)
            .await
            .optional()?;

        Ok(hash)
    }

    pub async fn set_hash(conn: &mut AsyncPgConnection, hash: &str) -> anyhow::Result<()> {
        use crate::schema::auth_pin::dsl::*;

        diesel::insert_into(auth_pin)
            .values((id.eq(PIN_ROW_ID), pin_hash.eq(hash)))
            .on_conflict(id)
            .do_update()
            .set(pin_hash.eq(hash))
            .execute(conn)
            .await?;

        Ok(())
    }
}
