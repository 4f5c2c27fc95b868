use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Opaque project identifier, read as text so integer and text ids both work
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        ProjectId(id.to_string())
    }
}

/// A persisted (project_id, regexp) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub project_id: ProjectId,
    pub regexp: String,
}

/// Data access used by the rule pipeline
pub trait RuleStore {
    /// One entry per distinct project present in the domain store.
    /// Rows without a project id belong to no project and are ignored.
    fn list_project_ids(&mut self) -> Result<Vec<ProjectId>>;

    /// Whitespace-trimmed domain names for one project, in stored order
    fn list_domains(&mut self, project_id: &ProjectId) -> Result<Vec<String>>;

    /// Append one rule and commit it in its own transaction
    fn persist_rule(&mut self, project_id: &ProjectId, regexp: &str) -> Result<()>;

    /// Every stored rule, oldest first
    fn list_rules(&mut self) -> Result<Vec<FilterRule>>;
}

/// SQLite-backed store over the `domains` and `rules` tables.
///
/// The connection is closed when the store is dropped.
pub struct SqliteRuleStore {
    conn: Connection,
}

impl SqliteRuleStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open domain database: {}", db_path.display()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Create both tables if they do not exist yet
    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS domains (
                    project_id TEXT NOT NULL,
                    name TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS rules (
                    project_id TEXT NOT NULL,
                    regexp TEXT NOT NULL
                );",
            )
            .context("Failed to create schema")?;
        Ok(())
    }

    /// Insert a domain row; used to seed databases
    pub fn add_domain(&self, project_id: &ProjectId, name: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO domains (project_id, name) VALUES (?1, ?2)",
                params![project_id.0, name],
            )
            .with_context(|| format!("Failed to insert domain for project {project_id}"))?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RuleStore for SqliteRuleStore {
    fn list_project_ids(&mut self) -> Result<Vec<ProjectId>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT DISTINCT CAST(project_id AS TEXT) FROM domains
                 WHERE project_id IS NOT NULL",
            )
            .context("Failed to query project ids")?;

        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|id| id.map(ProjectId))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    fn list_domains(&mut self, project_id: &ProjectId) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM domains
                 WHERE CAST(project_id AS TEXT) = ?1 AND name IS NOT NULL",
            )
            .with_context(|| format!("Failed to query domains for project {project_id}"))?;

        let domains = stmt
            .query_map(params![project_id.0], |row| row.get::<_, String>(0))?
            .map(|name| name.map(|n| n.trim().to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(domains)
    }

    fn persist_rule(&mut self, project_id: &ProjectId, regexp: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO rules (project_id, regexp) VALUES (?1, ?2)",
            params![project_id.0, regexp],
        )
        .with_context(|| format!("Failed to insert rule for project {project_id}"))?;
        tx.commit()
            .with_context(|| format!("Failed to commit rule for project {project_id}"))?;
        Ok(())
    }

    fn list_rules(&mut self) -> Result<Vec<FilterRule>> {
        let mut stmt = self
            .conn
            .prepare("SELECT CAST(project_id AS TEXT), regexp FROM rules ORDER BY rowid")
            .context("Failed to query rules")?;

        let rules = stmt
            .query_map([], |row| {
                Ok(FilterRule {
                    project_id: ProjectId(row.get(0)?),
                    regexp: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rules)
    }
}
