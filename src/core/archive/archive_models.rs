// Archive domain models - thread preferences, history rendering, reports.
//
// These are pure domain types with no Discord dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Auto-archive duration applied to recreated private threads and restored
/// by the refresh sweep (3 days).
pub const THREE_DAYS_MINUTES: u16 = 4320;

/// Auto-archive duration the refresh sweep bumps threads to first (7 days).
pub const ONE_WEEK_MINUTES: u16 = 10080;

/// Name of the discussion thread opened at the end of every off-server archive.
pub const DISCUSSION_THREAD_NAME: &str = "Chat about the game";

// ============================================================================
// THREAD PREFERENCES
// ============================================================================

/// Per-channel record of threads whose archival default was overridden.
///
/// Private threads listed in `private_to_archive` are archived publicly.
/// Public threads listed in `public_to_not_archive` are left out entirely.
/// A thread id lives in at most one of the two lists; the toggles in
/// `ArchiveService` keep it that way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadList {
    #[serde(default)]
    pub private_to_archive: Vec<u64>,
    #[serde(default)]
    pub public_to_not_archive: Vec<u64>,
}

impl ThreadList {
    /// Decide how a source thread is carried into the archive.
    pub fn plan_for(&self, thread: &ThreadInfo) -> ThreadPlan {
        match thread.visibility {
            ThreadVisibility::Private if self.private_to_archive.contains(&thread.id) => {
                ThreadPlan::RecreatePublic
            }
            ThreadVisibility::Private => ThreadPlan::RecreatePrivate,
            ThreadVisibility::Public if self.public_to_not_archive.contains(&thread.id) => {
                ThreadPlan::Skip
            }
            ThreadVisibility::Public => ThreadPlan::RecreatePublic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadVisibility {
    Public,
    Private,
}

/// Result of an include/exclude toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Updated,
    AlreadyIncluded,
    AlreadyExcluded,
}

impl ToggleOutcome {
    /// Notice for the invoker when the toggle changed nothing.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ToggleOutcome::Updated => None,
            ToggleOutcome::AlreadyIncluded => {
                Some("This thread is already included in the archive.")
            }
            ToggleOutcome::AlreadyExcluded => {
                Some("This thread is already not included in the archive.")
            }
        }
    }
}

/// A thread under the channel being archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: u64,
    pub name: String,
    pub visibility: ThreadVisibility,
}

/// What the off-server archive does with one source thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPlan {
    Skip,
    RecreatePrivate,
    RecreatePublic,
}

impl ThreadPlan {
    pub fn visibility(&self) -> Option<ThreadVisibility> {
        match self {
            ThreadPlan::Skip => None,
            ThreadPlan::RecreatePrivate => Some(ThreadVisibility::Private),
            ThreadPlan::RecreatePublic => Some(ThreadVisibility::Public),
        }
    }
}

// ============================================================================
// MESSAGE HISTORY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedAttachment {
    pub filename: String,
    pub url: String,
    pub size: u64,
}

/// One reaction on a message and the names of everyone who used it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedReaction {
    pub emoji: String,
    pub users: Vec<String>,
}

/// A historical message as read from the source channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedMessage {
    pub author: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub attachments: Vec<ArchivedAttachment>,
    pub reactions: Vec<ArchivedReaction>,
}

/// The embed-shaped re-post of an `ArchivedMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    pub author_line: String,
    pub icon_url: Option<String>,
    pub description: String,
    pub footer: Option<String>,
    pub attachments: Vec<ArchivedAttachment>,
}

impl RenderedPost {
    pub fn total_attachment_size(&self) -> u64 {
        self.attachments.iter().map(|a| a.size).sum()
    }
}

// ============================================================================
// OFF-SERVER ARCHIVE
// ============================================================================

/// Everything the off-server archive needs to know about one invocation.
#[derive(Debug, Clone)]
pub struct OffServerArchiveRequest {
    pub invoker_id: u64,
    pub source_channel_id: u64,
    pub source_channel_name: String,
    pub destination_guild_id: u64,
    pub destination_channel_id: Option<u64>,
    pub storyteller_id: u64,
    pub storyteller_name: String,
}

impl OffServerArchiveRequest {
    /// `{source-channel-name}-{storyteller-display-name}`
    pub fn destination_channel_name(&self) -> String {
        format!("{}-{}", self.source_channel_name, self.storyteller_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    pub channel_name: String,
    pub destination_channel_id: u64,
    pub errors: usize,
    pub threads_copied: usize,
    pub threads_skipped: usize,
    pub threads_failed: Vec<String>,
}

impl ArchiveReport {
    /// The DM sent to the invoker once the archive is done.
    pub fn completion_message(&self) -> String {
        let mut message = format!("Your Archive for {} is done.", self.channel_name);
        if self.errors > 0 {
            message.push_str(&format!(
                " {} messages caused unknown errors and were not archived.",
                self.errors
            ));
        }
        message
    }
}

// ============================================================================
// THREAD REFRESH
// ============================================================================

/// Which channels the daily refresh sweep visits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadRefreshConfig {
    pub category_ids: Vec<u64>,
    pub excluded_channel_ids: Vec<u64>,
}

/// An active thread together with the channel it lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveThread {
    pub parent_id: u64,
    pub thread: ThreadInfo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub refreshed: usize,
    pub failed: usize,
}
