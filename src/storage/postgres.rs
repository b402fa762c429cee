//! Postgres storage

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use chrono::Utc;
use serde_json::Value;
use sqlx::FromRow;
use sqlx::PgExecutor;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use uuid::Uuid;

use crate::activity::Activity;
use crate::activity::ActivityAction;
use crate::activity::ActivityEntry;
use crate::actors::Actor;
use crate::blocks::Block;
use crate::blocks::BlockType;
use crate::comments::Comment;
use crate::comments::Resolution;
use crate::guard::Conflict;
use crate::notes::Note;
use crate::pipeline::NoteChange;
use crate::pipeline::PlanError;
use crate::pipeline::plan;
use crate::revisions::Revision;
use crate::shares::ShareLink;

use super::Commit;
use super::Config;
use super::CreateCommentValues;
use super::CreateNoteValues;
use super::Error;
use super::Result;
use super::ShareLinkValues;
use super::Storage;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Columns of a note, in `SqlxNote` order
const NOTE_COLUMNS: &str =
    "id, workspace_id, title, version, created_by, last_edited_by, created_at, last_edited_at";

/// Columns of a share link, in `SqlxShareLink` order
const SHARE_LINK_COLUMNS: &str = "note_id, token, created_by, created_at, expires_at";

/// Columns of a comment, in `SqlxComment` order
const COMMENT_COLUMNS: &str = "id, note_id, workspace_id, block_id, author_id, content, \
                               resolved_by, resolved_at, created_at";

/// Columns of an activity, in `SqlxActivity` order
const ACTIVITY_COLUMNS: &str =
    "id, action, workspace_id, note_id, actor_id, metadata, ip_address, created_at";

/// Postgres type for block type
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "block_type")]
#[sqlx(rename_all = "kebab-case")]
enum BlockTypeType {
    /// Plain text
    Paragraph,

    /// Heading
    Heading,

    /// Bulleted list item
    Bullet,

    /// Checkbox list item
    Checkbox,

    /// Code
    Code,
}

impl BlockTypeType {
    /// Create block type type from block type
    fn from_block_type(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Paragraph => Self::Paragraph,
            BlockType::Heading => Self::Heading,
            BlockType::Bullet => Self::Bullet,
            BlockType::Checkbox => Self::Checkbox,
            BlockType::Code => Self::Code,
        }
    }

    /// Create block type from block type type
    fn to_block_type(&self) -> BlockType {
        match self {
            Self::Paragraph => BlockType::Paragraph,
            Self::Heading => BlockType::Heading,
            Self::Bullet => BlockType::Bullet,
            Self::Checkbox => BlockType::Checkbox,
            Self::Code => BlockType::Code,
        }
    }
}

/// Postgres type for activity action
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "activity_action_type")]
#[sqlx(rename_all = "kebab-case")]
enum ActivityActionType {
    /// Note is created
    CreateNote,

    /// Blocks of a note are replaced
    EditNote,

    /// Note got a new title
    RenameNote,

    /// Note is deleted
    DeleteNote,

    /// Note is restored to a revision
    RestoreVersion,

    /// Comment is placed on a note
    CreateComment,

    /// Comment on a note is resolved
    ResolveComment,
}

impl ActivityActionType {
    /// Create activity action type from activity action
    fn from_action(action: ActivityAction) -> Self {
        match action {
            ActivityAction::CreateNote => Self::CreateNote,
            ActivityAction::EditNote => Self::EditNote,
            ActivityAction::RenameNote => Self::RenameNote,
            ActivityAction::DeleteNote => Self::DeleteNote,
            ActivityAction::RestoreVersion => Self::RestoreVersion,
            ActivityAction::CreateComment => Self::CreateComment,
            ActivityAction::ResolveComment => Self::ResolveComment,
        }
    }

    /// Create activity action from activity action type
    fn to_action(&self) -> ActivityAction {
        match self {
            Self::CreateNote => ActivityAction::CreateNote,
            Self::EditNote => ActivityAction::EditNote,
            Self::RenameNote => ActivityAction::RenameNote,
            Self::DeleteNote => ActivityAction::DeleteNote,
            Self::RestoreVersion => ActivityAction::RestoreVersion,
            Self::CreateComment => ActivityAction::CreateComment,
            Self::ResolveComment => ActivityAction::ResolveComment,
        }
    }
}

/// Postgres version of a note, without blocks
#[derive(FromRow)]
struct SqlxNote {
    id: Uuid,
    workspace_id: Uuid,
    title: String,
    version: i64,
    created_by: Uuid,
    last_edited_by: Uuid,
    created_at: NaiveDateTime,
    last_edited_at: NaiveDateTime,
}

impl SqlxNote {
    /// Combine with its blocks
    fn into_note(self, blocks: Vec<Block>) -> Note {
        Note {
            id: self.id,
            workspace_id: self.workspace_id,
            title: self.title,
            blocks,
            version: self.version,
            created_by: self.created_by,
            last_edited_by: self.last_edited_by,
            created_at: self.created_at,
            last_edited_at: self.last_edited_at,
        }
    }
}

/// Postgres version of a block
#[derive(FromRow)]
struct SqlxBlock {
    id: Uuid,
    note_id: Uuid,
    block_type: BlockTypeType,
    content: String,
    checked: bool,
    position: i32,
}

impl SqlxBlock {
    /// Create block from postgres version
    fn into_block(self) -> Block {
        Block {
            id: self.id,
            block_type: self.block_type.to_block_type(),
            content: self.content,
            checked: self.checked,
            position: self.position,
        }
    }
}

/// Postgres version of a revision
#[derive(FromRow)]
struct SqlxRevision {
    id: Uuid,
    note_id: Uuid,
    blocks: Json<Vec<Block>>,
    version: i64,
    created_by: Uuid,
    created_at: NaiveDateTime,
}

impl SqlxRevision {
    /// Create revision from postgres version
    fn into_revision(self) -> Revision {
        Revision {
            id: self.id,
            note_id: self.note_id,
            blocks: self.blocks.0,
            version: self.version,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

/// Postgres version of a share link
#[derive(FromRow)]
struct SqlxShareLink {
    note_id: Uuid,
    token: String,
    created_by: Uuid,
    created_at: NaiveDateTime,
    expires_at: Option<NaiveDateTime>,
}

impl SqlxShareLink {
    /// Create share link from postgres version
    fn into_share_link(self) -> ShareLink {
        ShareLink {
            note_id: self.note_id,
            token: self.token,
            created_by: self.created_by,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Postgres version of a comment
#[derive(FromRow)]
struct SqlxComment {
    id: Uuid,
    note_id: Uuid,
    workspace_id: Uuid,
    block_id: Option<Uuid>,
    author_id: Uuid,
    content: String,
    resolved_by: Option<Uuid>,
    resolved_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

impl SqlxComment {
    /// Create comment from postgres version
    fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            note_id: self.note_id,
            workspace_id: self.workspace_id,
            block_id: self.block_id,
            author_id: self.author_id,
            content: self.content,
            resolution: self.resolved_by.zip(self.resolved_at).map(
                |(resolved_by, resolved_at)| Resolution {
                    resolved_by,
                    resolved_at,
                },
            ),
            created_at: self.created_at,
        }
    }
}

/// Postgres version of an activity
#[derive(FromRow)]
struct SqlxActivity {
    id: Uuid,
    action: ActivityActionType,
    workspace_id: Uuid,
    note_id: Uuid,
    actor_id: Uuid,
    metadata: Json<Value>,
    ip_address: Option<String>,
    created_at: NaiveDateTime,
}

impl SqlxActivity {
    /// Create activity from postgres version
    fn into_activity(self) -> Activity {
        Activity {
            id: self.id,
            action: self.action.to_action(),
            workspace_id: self.workspace_id,
            note_id: self.note_id,
            actor_id: self.actor_id,
            metadata: self.metadata.0,
            ip_address: self
                .ip_address
                .and_then(|ip_address| ip_address.parse::<IpAddr>().ok()),
            created_at: self.created_at,
        }
    }
}

/// Postgres storage
#[derive(Clone, Debug)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create a new Postgres storage
    ///
    /// Migrations will be run
    ///
    /// # Errors
    ///
    /// Will return `Err` when the database can not be reached or migrated
    pub async fn from_config(config: Config) -> Result<Self> {
        let connection_pool = match config {
            Config::ExistingConnection(pool) => pool,
            Config::DetectConfig | Config::Memory => connect().await?,
        };

        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(|err| Error::Connection(format!("Migrations could not run: {err}")))?;

        Ok(Self { connection_pool })
    }
}

/// Connect using the `DATABASE_URL` environment variable
async fn connect() -> Result<PgPool> {
    let database_connection_string = std::env::var("DATABASE_URL")
        .map_err(|_| Error::Connection("Missing `DATABASE_URL`".to_string()))?;

    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_connection_string)
        .await
        .map_err(connection_error)
}

/// Fetch the blocks of the given notes, grouped by note and ordered by position
async fn fetch_blocks<'e, E>(executor: E, note_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Block>>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, SqlxBlock>(
        r"
        SELECT id, note_id, block_type, content, checked, position
        FROM blocks
        WHERE note_id = ANY($1)
        ORDER BY note_id, position
        ",
    )
    .bind(note_ids)
    .fetch_all(executor)
    .await
    .map_err(connection_error)?;

    let mut blocks = HashMap::<Uuid, Vec<Block>>::new();

    for row in rows {
        blocks.entry(row.note_id).or_default().push(row.into_block());
    }

    Ok(blocks)
}

/// Insert blocks for a note
async fn insert_blocks(
    connection: &mut sqlx::PgConnection,
    note_id: &Uuid,
    blocks: &[Block],
) -> Result<()> {
    for block in blocks {
        sqlx::query(
            r"
            INSERT INTO blocks (id, note_id, block_type, content, checked, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(block.id)
        .bind(note_id)
        .bind(BlockTypeType::from_block_type(block.block_type))
        .bind(&block.content)
        .bind(block.checked)
        .bind(block.position)
        .execute(&mut *connection)
        .await
        .map_err(connection_error)?;
    }

    Ok(())
}

#[async_trait]
impl Storage for Postgres {
    async fn find_all_notes_by_workspace(&self, workspace_id: &Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query_as::<_, SqlxNote>(&format!(
            r"
            SELECT {NOTE_COLUMNS}
            FROM notes
            WHERE workspace_id = $1
            ORDER BY last_edited_at DESC
            "
        ))
        .bind(workspace_id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        let note_ids = rows.iter().map(|row| row.id).collect::<Vec<_>>();
        let mut blocks = fetch_blocks(&self.connection_pool, &note_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let note_blocks = blocks.remove(&row.id).unwrap_or_default();
                row.into_note(note_blocks)
            })
            .collect())
    }

    async fn find_single_note_by_id(&self, note_id: &Uuid) -> Result<Option<Note>> {
        let row = sqlx::query_as::<_, SqlxNote>(&format!(
            r"
            SELECT {NOTE_COLUMNS}
            FROM notes
            WHERE id = $1
            LIMIT 1
            "
        ))
        .bind(note_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut blocks = fetch_blocks(&self.connection_pool, &[row.id]).await?;
        let note_blocks = blocks.remove(&row.id).unwrap_or_default();

        Ok(Some(row.into_note(note_blocks)))
    }

    async fn create_note(&self, values: &CreateNoteValues) -> Result<Note> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        let row = sqlx::query_as::<_, SqlxNote>(&format!(
            r"
            INSERT INTO notes (id, workspace_id, title, created_by, last_edited_by)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {NOTE_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(values.workspace_id)
        .bind(values.title)
        .bind(values.actor.id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(connection_error)?;

        insert_blocks(&mut transaction, &row.id, &values.blocks).await?;

        transaction.commit().await.map_err(connection_error)?;

        Ok(row.into_note(values.blocks.clone()))
    }

    async fn commit_note_change(&self, note_id: &Uuid, change: &NoteChange) -> Result<Commit> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        // row lock, concurrent commits on the same note queue up here
        let row = sqlx::query_as::<_, SqlxNote>(&format!(
            r"
            SELECT {NOTE_COLUMNS}
            FROM notes
            WHERE id = $1
            FOR UPDATE
            "
        ))
        .bind(note_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(connection_error)?;

        let Some(row) = row else {
            return Ok(Commit::NotFound);
        };

        let mut blocks = fetch_blocks(&mut *transaction, &[row.id]).await?;
        let current = row.into_note(blocks.remove(note_id).unwrap_or_default());

        let now = Utc::now().naive_utc();

        let plan = match plan(&current, change, now) {
            Ok(plan) => plan,
            Err(err) => return Ok(Commit::Rejected(err)),
        };

        let updated = sqlx::query(
            r"
            UPDATE notes
            SET title = $1, version = $2, last_edited_by = $3, last_edited_at = $4
            WHERE id = $5 AND version = $6
            ",
        )
        .bind(&plan.note.title)
        .bind(plan.note.version)
        .bind(plan.note.last_edited_by)
        .bind(plan.note.last_edited_at)
        .bind(note_id)
        .bind(change.expected_version)
        .execute(&mut *transaction)
        .await
        .map_err(connection_error)?;

        if updated.rows_affected() != 1 {
            return Ok(Commit::Rejected(PlanError::Conflict(Box::new(
                Conflict::from_note(&current, change.expected_version),
            ))));
        }

        if plan.blocks_replaced {
            sqlx::query("DELETE FROM blocks WHERE note_id = $1")
                .bind(note_id)
                .execute(&mut *transaction)
                .await
                .map_err(connection_error)?;

            insert_blocks(&mut transaction, note_id, &plan.note.blocks).await?;
        }

        if let Some(revision) = &plan.revision {
            sqlx::query(
                r"
                INSERT INTO revisions (id, note_id, blocks, version, created_by, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(Uuid::new_v4())
            .bind(note_id)
            .bind(Json(&revision.blocks))
            .bind(revision.version)
            .bind(revision.created_by)
            .bind(now)
            .execute(&mut *transaction)
            .await
            .map_err(connection_error)?;
        }

        transaction.commit().await.map_err(connection_error)?;

        Ok(Commit::Applied(plan))
    }

    async fn delete_note(&self, note: &Note) -> Result<()> {
        // blocks, revisions, comments and the share link cascade
        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(note.id)
            .execute(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(())
    }

    async fn find_all_revisions_by_note(&self, note_id: &Uuid) -> Result<Vec<Revision>> {
        let revisions = sqlx::query_as::<_, SqlxRevision>(
            r"
            SELECT id, note_id, blocks, version, created_by, created_at
            FROM revisions
            WHERE note_id = $1
            ORDER BY created_at DESC, seq DESC
            ",
        )
        .bind(note_id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(revisions
            .into_iter()
            .map(SqlxRevision::into_revision)
            .collect())
    }

    async fn find_single_revision_by_id(&self, revision_id: &Uuid) -> Result<Option<Revision>> {
        let revision = sqlx::query_as::<_, SqlxRevision>(
            r"
            SELECT id, note_id, blocks, version, created_by, created_at
            FROM revisions
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(revision_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(revision.map(SqlxRevision::into_revision))
    }

    async fn save_share_link(&self, values: &ShareLinkValues) -> Result<ShareLink> {
        let share_link = sqlx::query_as::<_, SqlxShareLink>(&format!(
            r"
            INSERT INTO share_links (note_id, token, created_by, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (note_id) DO UPDATE
            SET token = EXCLUDED.token,
                created_by = EXCLUDED.created_by,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            RETURNING {SHARE_LINK_COLUMNS}
            "
        ))
        .bind(values.note.id)
        .bind(values.token)
        .bind(values.actor.id)
        .bind(Utc::now().naive_utc())
        .bind(values.expires_at)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(share_link.into_share_link())
    }

    async fn find_share_link_by_note(&self, note_id: &Uuid) -> Result<Option<ShareLink>> {
        let share_link = sqlx::query_as::<_, SqlxShareLink>(&format!(
            r"
            SELECT {SHARE_LINK_COLUMNS}
            FROM share_links
            WHERE note_id = $1
            LIMIT 1
            "
        ))
        .bind(note_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(share_link.map(SqlxShareLink::into_share_link))
    }

    async fn find_share_link_by_token(&self, token: &str) -> Result<Option<ShareLink>> {
        let share_link = sqlx::query_as::<_, SqlxShareLink>(&format!(
            r"
            SELECT {SHARE_LINK_COLUMNS}
            FROM share_links
            WHERE token = $1
            LIMIT 1
            "
        ))
        .bind(token)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(share_link.map(SqlxShareLink::into_share_link))
    }

    async fn delete_share_link(&self, note_id: &Uuid) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM share_links WHERE note_id = $1")
            .bind(note_id)
            .execute(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn create_comment(&self, values: &CreateCommentValues) -> Result<Comment> {
        let comment = sqlx::query_as::<_, SqlxComment>(&format!(
            r"
            INSERT INTO comments (id, note_id, workspace_id, block_id, author_id, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COMMENT_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(values.note.id)
        .bind(values.note.workspace_id)
        .bind(values.block_id)
        .bind(values.actor.id)
        .bind(values.content)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(comment.into_comment())
    }

    async fn find_all_comments_by_note(&self, note_id: &Uuid) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, SqlxComment>(&format!(
            r"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE note_id = $1
            ORDER BY created_at DESC, seq DESC
            "
        ))
        .bind(note_id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(comments.into_iter().map(SqlxComment::into_comment).collect())
    }

    async fn find_single_comment_by_id(&self, comment_id: &Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, SqlxComment>(&format!(
            r"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE id = $1
            LIMIT 1
            "
        ))
        .bind(comment_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(comment.map(SqlxComment::into_comment))
    }

    async fn update_comment_resolution(
        &self,
        comment: &Comment,
        resolved_by: Option<&Actor>,
    ) -> Result<Option<Comment>> {
        let resolved_at = resolved_by.map(|_| Utc::now().naive_utc());

        let comment = sqlx::query_as::<_, SqlxComment>(&format!(
            r"
            UPDATE comments
            SET resolved_by = $1, resolved_at = $2
            WHERE id = $3
            RETURNING {COMMENT_COLUMNS}
            "
        ))
        .bind(resolved_by.map(|actor| actor.id))
        .bind(resolved_at)
        .bind(comment.id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(comment.map(SqlxComment::into_comment))
    }

    async fn delete_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment.id)
            .execute(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(())
    }

    async fn register_activity(
        &self,
        actor: &Actor,
        entry: &ActivityEntry,
        ip_address: Option<&IpAddr>,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO activity (id, action, workspace_id, note_id, actor_id, metadata, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(Uuid::new_v4())
        .bind(ActivityActionType::from_action(entry.action()))
        .bind(entry.workspace_id())
        .bind(entry.note_id())
        .bind(actor.id)
        .bind(Json(entry.metadata()))
        .bind(ip_address.map(ToString::to_string))
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn find_all_activity_by_workspace(
        &self,
        workspace_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Activity>> {
        let activity = sqlx::query_as::<_, SqlxActivity>(&format!(
            r"
            SELECT {ACTIVITY_COLUMNS}
            FROM activity
            WHERE workspace_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(workspace_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(activity
            .into_iter()
            .map(SqlxActivity::into_activity)
            .collect())
    }

    async fn find_all_activity_by_note(
        &self,
        note_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Activity>> {
        let activity = sqlx::query_as::<_, SqlxActivity>(&format!(
            r"
            SELECT {ACTIVITY_COLUMNS}
            FROM activity
            WHERE note_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(note_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(activity
            .into_iter()
            .map(SqlxActivity::into_activity)
            .collect())
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
