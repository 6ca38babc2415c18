use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{plot::CustomPlot, run::Run, ExtraFields};

/// Longest session id accepted; ids double as file names.
pub const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub custom_plots: Vec<CustomPlot>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Body of `POST /sessions`. Everything except `id` and `name` may be left
/// out by the client.
#[derive(Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionModel {
    pub id: Option<String>,
    pub name: Option<String>,

    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub custom_plots: Vec<CustomPlot>,

    pub created_at: Option<DateTime<Utc>>,

    /// Anything else the client sent, kept verbatim apart from `updatedAt`,
    /// which every save stamps itself.
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl SaveSessionModel {
    /// Checks the required fields and stamps `updatedAt` with `now`.
    pub fn into_session(self, now: DateTime<Utc>) -> Result<Session, String> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or("Session id is required")?;
        validate_session_id(&id)?;

        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or("Session name is required")?;

        let created_at = self.created_at.unwrap_or(now).min(now);
        let mut extra = self.extra;
        extra.remove("updatedAt");

        Ok(Session {
            id,
            name,
            runs: self.runs,
            custom_plots: self.custom_plots,
            created_at,
            updated_at: now,
            extra,
        })
    }
}

/// Session ids end up in file names, so only `[A-Za-z0-9_-]` is allowed.
pub fn validate_session_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("Session id is required".into());
    }
    if id.len() > MAX_SESSION_ID_LEN {
        return Err(format!(
            "Session id is longer than {MAX_SESSION_ID_LEN} characters"
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "Session id '{id}' may only contain ASCII letters, digits, '-' and '_'"
        ));
    }
    Ok(())
}

impl Session {
    pub fn run(&self, id: i64) -> Option<&Run> {
        self.runs.iter().find(|run| run.id == id)
    }

    pub fn custom_plot(&self, id: i64) -> Option<&CustomPlot> {
        self.custom_plots.iter().find(|plot| plot.id == id)
    }

    /// Sorts sessions by `updatedAt`, newest first.
    pub fn by_recency(sessions: impl IntoIterator<Item = Session>) -> Vec<Session> {
        let mut sessions: Vec<Session> = sessions.into_iter().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }
}
