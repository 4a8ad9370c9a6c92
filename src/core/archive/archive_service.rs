// Archive service - thread preferences and the off-server archive.
//
// This service handles:
// - IncludeInArchive / ExcludeFromArchive toggles (persisted per channel)
// - ClaimRole on the archive server
// - Copying a whole channel, its threads included, to another server
//
// NO Discord dependencies here - the platform is reached through ports.

use super::archive_models::{
    ArchiveReport, OffServerArchiveRequest, ThreadList, ThreadVisibility, ToggleOutcome,
    DISCUSSION_THREAD_NAME,
};
use super::archive_platform::ArchivePlatform;
use super::archive_store::ThreadListStore;
use super::history::{copy_history, CopyAborted};
use crate::core::ports::{PlatformError, ResourceKind, StoreError};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("You do not have permission to use this command")]
    PermissionDenied,

    #[error("Was unable to find server with ID {0}")]
    GuildNotFound(u64),

    #[error("You need to join the archive server before claiming your role")]
    NotArchiveMember,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    HistoryRead(#[from] CopyAborted),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Settings the archive service needs besides its ports.
#[derive(Debug, Clone, Default)]
pub struct ArchiveSettings {
    /// Users allowed to run OffServerArchive without the moderator role.
    pub privileged_user_ids: Vec<u64>,
    /// Server whose per-user roles ClaimRole hands out.
    pub archive_guild_id: u64,
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct ArchiveService<S: ThreadListStore, P: ArchivePlatform> {
    store: S,
    platform: Arc<P>,
    settings: ArchiveSettings,
}

impl<S: ThreadListStore, P: ArchivePlatform> ArchiveService<S, P> {
    pub fn new(store: S, platform: Arc<P>, settings: ArchiveSettings) -> Self {
        Self {
            store,
            platform,
            settings,
        }
    }

    /// The preferences recorded for a channel, or an empty record.
    pub async fn threads_for(&self, channel_id: u64) -> Result<ThreadList, ArchiveError> {
        Ok(self.store.get_threads(channel_id).await?.unwrap_or_default())
    }

    /// Opt a private thread into the archive, or undo an exclusion of a
    /// public one.
    pub async fn include_thread(
        &self,
        channel_id: u64,
        thread_id: u64,
        visibility: ThreadVisibility,
    ) -> Result<ToggleOutcome, ArchiveError> {
        let mut threads = self.threads_for(channel_id).await?;

        let changed = match visibility {
            ThreadVisibility::Private => insert_unique(&mut threads.private_to_archive, thread_id),
            ThreadVisibility::Public => remove_id(&mut threads.public_to_not_archive, thread_id),
        };

        self.store.save_threads(channel_id, threads).await?;

        Ok(if changed {
            ToggleOutcome::Updated
        } else {
            ToggleOutcome::AlreadyIncluded
        })
    }

    /// Opt a public thread out of the archive, or undo an inclusion of a
    /// private one.
    pub async fn exclude_thread(
        &self,
        channel_id: u64,
        thread_id: u64,
        visibility: ThreadVisibility,
    ) -> Result<ToggleOutcome, ArchiveError> {
        let mut threads = self.threads_for(channel_id).await?;

        let changed = match visibility {
            ThreadVisibility::Private => remove_id(&mut threads.private_to_archive, thread_id),
            ThreadVisibility::Public => insert_unique(&mut threads.public_to_not_archive, thread_id),
        };

        self.store.save_threads(channel_id, threads).await?;

        Ok(if changed {
            ToggleOutcome::Updated
        } else {
            ToggleOutcome::AlreadyExcluded
        })
    }

    /// Drop a channel's preferences. Returns whether there were any.
    pub async fn forget_channel(&self, channel_id: u64) -> Result<bool, ArchiveError> {
        Ok(self.store.remove_threads(channel_id).await?)
    }

    /// Give the user the archive-server role named after their id.
    pub async fn claim_role(&self, user_id: u64) -> Result<u64, ArchiveError> {
        let guild_id = self.settings.archive_guild_id;
        let role_id = self
            .platform
            .get_or_create(guild_id, ResourceKind::Role, &user_id.to_string())
            .await?;

        match self.platform.add_member_role(guild_id, user_id, role_id).await {
            Ok(()) => Ok(role_id),
            Err(PlatformError::NotFound(_)) => Err(ArchiveError::NotArchiveMember),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the user may run the off-server archive.
    pub async fn may_archive(&self, user_id: u64) -> Result<bool, ArchiveError> {
        if self.settings.privileged_user_ids.contains(&user_id) {
            return Ok(true);
        }
        Ok(self.platform.authorize_mod(user_id).await?)
    }

    /// Copy a channel and its threads into another server.
    ///
    /// Nothing is rolled back: a failure midway leaves the destination
    /// partially filled and the channel's preferences untouched.
    pub async fn archive_off_server(
        &self,
        request: &OffServerArchiveRequest,
    ) -> Result<ArchiveReport, ArchiveError> {
        if !self.may_archive(request.invoker_id).await? {
            return Err(ArchiveError::PermissionDenied);
        }

        let guild_id = request.destination_guild_id;
        if !self.platform.guild_exists(guild_id).await? {
            return Err(ArchiveError::GuildNotFound(guild_id));
        }

        let existing = match request.destination_channel_id {
            Some(channel_id) => self.platform.find_channel(guild_id, channel_id).await?,
            None => None,
        };
        let destination = match existing {
            Some(channel_id) => channel_id,
            None => {
                self.platform
                    .get_or_create(
                        guild_id,
                        ResourceKind::TextChannel,
                        &request.destination_channel_name(),
                    )
                    .await?
            }
        };

        let role_id = self
            .platform
            .get_or_create(guild_id, ResourceKind::Role, &request.storyteller_id.to_string())
            .await?;

        tracing::info!(
            source = request.source_channel_id,
            destination,
            "Starting off-server archive"
        );

        let mut report = ArchiveReport {
            channel_name: request.source_channel_name.clone(),
            destination_channel_id: destination,
            ..Default::default()
        };

        report.errors += copy_history(
            &*self.platform,
            destination,
            self.platform.history(request.source_channel_id),
        )
        .await?;

        let preferences = self.threads_for(request.source_channel_id).await?;
        for thread in self.platform.list_threads(request.source_channel_id).await? {
            let Some(visibility) = preferences.plan_for(&thread).visibility() else {
                report.threads_skipped += 1;
                continue;
            };

            let archive_thread = match self
                .platform
                .create_thread(destination, &thread.name, visibility)
                .await
            {
                Ok(id) => id,
                Err(err) => {
                    tracing::warn!(thread = %thread.name, error = %err, "Failed to create archive thread");
                    self.post_notice(destination, &format!("Failed to create thread '{}'", thread.name))
                        .await;
                    report.threads_failed.push(thread.name.clone());
                    continue;
                }
            };

            match copy_history(&*self.platform, archive_thread, self.platform.history(thread.id)).await {
                Ok(errors) => {
                    report.errors += errors;
                    report.threads_copied += 1;
                }
                Err(aborted) => {
                    report.errors += aborted.errors;
                    tracing::warn!(thread = %thread.name, error = %aborted, "Thread history copy aborted");
                    self.post_notice(
                        destination,
                        &format!("Failed to copy all messages of thread '{}'", thread.name),
                    )
                    .await;
                    report.threads_failed.push(thread.name.clone());
                }
            }
        }

        self.platform
            .create_thread(destination, DISCUSSION_THREAD_NAME, ThreadVisibility::Public)
            .await?;
        self.platform
            .grant_thread_management(destination, role_id)
            .await?;

        self.forget_channel(request.source_channel_id).await?;

        tracing::info!(
            source = request.source_channel_id,
            destination,
            errors = report.errors,
            threads = report.threads_copied,
            "Off-server archive finished"
        );

        Ok(report)
    }

    async fn post_notice(&self, destination: u64, notice: &str) {
        if let Err(err) = self.platform.post_text(destination, notice).await {
            tracing::warn!(error = %err, "Failed to post archive notice");
        }
    }
}

fn insert_unique(ids: &mut Vec<u64>, id: u64) -> bool {
    if ids.contains(&id) {
        return false;
    }
    ids.push(id);
    true
}

fn remove_id(ids: &mut Vec<u64>, id: u64) -> bool {
    let before = ids.len();
    ids.retain(|existing| *existing != id);
    ids.len() != before
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::archive::{
        ArchivedMessage, HistoryStream, MessagePoster, PostError, RenderedPost, ThreadInfo,
        ThreadPlan,
    };
    use crate::core::ports::Authorizer;
    use async_trait::async_trait;
    use chrono::Utc;
    use dashmap::DashMap;
    use futures::stream::{self, StreamExt};
    use std::collections::HashMap;
    use std::sync::Mutex;

    const SOURCE: u64 = 100;
    const ARCHIVE_GUILD: u64 = 9000;
    const MOD: u64 = 1;
    const PLAYER: u64 = 2;
    const PRIVILEGED: u64 = 3;

    /// In-memory store for testing
    #[derive(Default)]
    struct MockThreadStore {
        records: DashMap<u64, ThreadList>,
        writes: Mutex<usize>,
    }

    #[async_trait]
    impl ThreadListStore for MockThreadStore {
        async fn get_threads(&self, channel_id: u64) -> Result<Option<ThreadList>, StoreError> {
            Ok(self.records.get(&channel_id).map(|r| r.clone()))
        }

        async fn save_threads(&self, channel_id: u64, threads: ThreadList) -> Result<(), StoreError> {
            self.records.insert(channel_id, threads);
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }

        async fn remove_threads(&self, channel_id: u64) -> Result<bool, StoreError> {
            *self.writes.lock().unwrap() += 1;
            Ok(self.records.remove(&channel_id).is_some())
        }

        async fn all_threads(&self) -> Result<HashMap<u64, ThreadList>, StoreError> {
            Ok(self
                .records
                .iter()
                .map(|r| (*r.key(), r.value().clone()))
                .collect())
        }
    }

    /// Records every platform effect. Channel and thread ids are handed out
    /// from a counter starting at 5000.
    #[derive(Default)]
    struct MockPlatform {
        guilds: Vec<u64>,
        members: Vec<u64>,
        threads: Vec<ThreadInfo>,
        histories: HashMap<u64, Vec<ArchivedMessage>>,
        /// Thread names whose creation fails.
        broken_threads: Vec<String>,
        /// Message texts whose post is rejected with a 500.
        broken_posts: Vec<String>,
        /// Channels whose history read fails after the last message.
        broken_histories: Vec<u64>,
        resources: DashMap<(u64, String), u64>,
        next_id: Mutex<u64>,
        created_threads: Mutex<Vec<(u64, String, ThreadVisibility)>>,
        posts: DashMap<u64, Vec<String>>,
        grants: Mutex<Vec<(u64, u64)>>,
        role_grants: Mutex<Vec<(u64, u64, u64)>>,
    }

    impl MockPlatform {
        fn new() -> Self {
            Self {
                guilds: vec![ARCHIVE_GUILD],
                members: vec![PLAYER],
                next_id: Mutex::new(5000),
                ..Default::default()
            }
        }

        fn allocate(&self) -> u64 {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        }

        fn posts_in(&self, channel_id: u64) -> Vec<String> {
            self.posts
                .get(&channel_id)
                .map(|p| p.clone())
                .unwrap_or_default()
        }

        fn thread_id(&self, name: &str) -> Option<u64> {
            self.resources.get(&(0, format!("thread:{name}"))).map(|id| *id)
        }
    }

    #[async_trait]
    impl Authorizer for MockPlatform {
        async fn authorize_mod(&self, user_id: u64) -> Result<bool, PlatformError> {
            Ok(user_id == MOD)
        }

        async fn authorize_st(&self, user_id: u64, _game: &str) -> Result<bool, PlatformError> {
            Ok(user_id == MOD)
        }
    }

    #[async_trait]
    impl MessagePoster for MockPlatform {
        async fn post_rendered(&self, channel_id: u64, post: &RenderedPost) -> Result<(), PostError> {
            if self.broken_posts.contains(&post.description) {
                return Err(PostError::Http {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                });
            }
            self.posts
                .entry(channel_id)
                .or_default()
                .push(post.description.clone());
            Ok(())
        }

        async fn post_text(&self, channel_id: u64, text: &str) -> Result<(), PostError> {
            self.posts.entry(channel_id).or_default().push(text.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl ArchivePlatform for MockPlatform {
        async fn guild_exists(&self, guild_id: u64) -> Result<bool, PlatformError> {
            Ok(self.guilds.contains(&guild_id))
        }

        async fn find_channel(
            &self,
            _guild_id: u64,
            channel_id: u64,
        ) -> Result<Option<u64>, PlatformError> {
            Ok((channel_id == 777).then_some(channel_id))
        }

        async fn get_or_create(
            &self,
            guild_id: u64,
            kind: ResourceKind,
            name: &str,
        ) -> Result<u64, PlatformError> {
            let key = (guild_id, format!("{kind}:{name}"));
            if let Some(id) = self.resources.get(&key) {
                return Ok(*id);
            }
            let id = self.allocate();
            self.resources.insert(key, id);
            Ok(id)
        }

        async fn add_member_role(
            &self,
            guild_id: u64,
            user_id: u64,
            role_id: u64,
        ) -> Result<(), PlatformError> {
            if !self.members.contains(&user_id) {
                return Err(PlatformError::NotFound(format!("member {user_id}")));
            }
            self.role_grants
                .lock()
                .unwrap()
                .push((guild_id, user_id, role_id));
            Ok(())
        }

        async fn list_threads(&self, _channel_id: u64) -> Result<Vec<ThreadInfo>, PlatformError> {
            Ok(self.threads.clone())
        }

        async fn create_thread(
            &self,
            channel_id: u64,
            name: &str,
            visibility: ThreadVisibility,
        ) -> Result<u64, PlatformError> {
            if self.broken_threads.iter().any(|b| b == name) {
                return Err(PlatformError::Http {
                    status: 400,
                    message: "Maximum number of threads reached".to_string(),
                });
            }
            let id = self.allocate();
            self.resources.insert((0, format!("thread:{name}")), id);
            self.created_threads
                .lock()
                .unwrap()
                .push((channel_id, name.to_string(), visibility));
            Ok(id)
        }

        fn history(&self, channel_id: u64) -> HistoryStream<'_> {
            let messages = self.histories.get(&channel_id).cloned().unwrap_or_default();
            let mut items: Vec<Result<ArchivedMessage, PlatformError>> =
                messages.into_iter().map(Ok).collect();
            if self.broken_histories.contains(&channel_id) {
                items.push(Err(PlatformError::Http {
                    status: 503,
                    message: "unavailable".to_string(),
                }));
            }
            stream::iter(items).boxed()
        }

        async fn grant_thread_management(
            &self,
            channel_id: u64,
            role_id: u64,
        ) -> Result<(), PlatformError> {
            self.grants.lock().unwrap().push((channel_id, role_id));
            Ok(())
        }
    }

    fn service(platform: MockPlatform) -> ArchiveService<MockThreadStore, MockPlatform> {
        ArchiveService::new(
            MockThreadStore::default(),
            Arc::new(platform),
            ArchiveSettings {
                privileged_user_ids: vec![PRIVILEGED],
                archive_guild_id: ARCHIVE_GUILD,
            },
        )
    }

    fn text(content: &str) -> ArchivedMessage {
        ArchivedMessage {
            author: "st".to_string(),
            avatar_url: None,
            created_at: Utc::now(),
            content: content.to_string(),
            attachments: Vec::new(),
            reactions: Vec::new(),
        }
    }

    fn thread(id: u64, name: &str, visibility: ThreadVisibility) -> ThreadInfo {
        ThreadInfo {
            id,
            name: name.to_string(),
            visibility,
        }
    }

    fn request(invoker_id: u64) -> OffServerArchiveRequest {
        OffServerArchiveRequest {
            invoker_id,
            source_channel_id: SOURCE,
            source_channel_name: "text-game-4".to_string(),
            destination_guild_id: ARCHIVE_GUILD,
            destination_channel_id: None,
            storyteller_id: 42,
            storyteller_name: "Ivy".to_string(),
        }
    }

    // ------------------------------------------------------------------------
    // Preference toggles
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_private_include_then_exclude_round_trips() {
        let service = service(MockPlatform::new());
        let before = service.threads_for(SOURCE).await.unwrap();

        let included = service
            .include_thread(SOURCE, 11, ThreadVisibility::Private)
            .await
            .unwrap();
        assert_eq!(included, ToggleOutcome::Updated);
        assert_eq!(
            service.threads_for(SOURCE).await.unwrap().private_to_archive,
            vec![11]
        );

        let excluded = service
            .exclude_thread(SOURCE, 11, ThreadVisibility::Private)
            .await
            .unwrap();
        assert_eq!(excluded, ToggleOutcome::Updated);
        assert_eq!(service.threads_for(SOURCE).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_public_exclude_then_include_round_trips() {
        let service = service(MockPlatform::new());
        let before = service.threads_for(SOURCE).await.unwrap();

        service
            .exclude_thread(SOURCE, 12, ThreadVisibility::Public)
            .await
            .unwrap();
        assert_eq!(
            service.threads_for(SOURCE).await.unwrap().public_to_not_archive,
            vec![12]
        );

        service
            .include_thread(SOURCE, 12, ThreadVisibility::Public)
            .await
            .unwrap();
        assert_eq!(service.threads_for(SOURCE).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_repeated_toggle_reports_already_and_does_not_duplicate() {
        let service = service(MockPlatform::new());

        service
            .include_thread(SOURCE, 11, ThreadVisibility::Private)
            .await
            .unwrap();
        let again = service
            .include_thread(SOURCE, 11, ThreadVisibility::Private)
            .await
            .unwrap();
        assert_eq!(again, ToggleOutcome::AlreadyIncluded);
        assert_eq!(
            service.threads_for(SOURCE).await.unwrap().private_to_archive,
            vec![11]
        );

        service
            .exclude_thread(SOURCE, 12, ThreadVisibility::Public)
            .await
            .unwrap();
        let again = service
            .exclude_thread(SOURCE, 12, ThreadVisibility::Public)
            .await
            .unwrap();
        assert_eq!(again, ToggleOutcome::AlreadyExcluded);
        assert_eq!(
            service.threads_for(SOURCE).await.unwrap().public_to_not_archive,
            vec![12]
        );
    }

    #[tokio::test]
    async fn test_default_state_toggles_report_already() {
        let service = service(MockPlatform::new());

        let public = service
            .include_thread(SOURCE, 12, ThreadVisibility::Public)
            .await
            .unwrap();
        let private = service
            .exclude_thread(SOURCE, 11, ThreadVisibility::Private)
            .await
            .unwrap();

        assert_eq!(public, ToggleOutcome::AlreadyIncluded);
        assert_eq!(private, ToggleOutcome::AlreadyExcluded);
        // The lazily created record is still written.
        assert_eq!(*service.store.writes.lock().unwrap(), 2);
    }

    #[test]
    fn test_plan_rules() {
        let prefs = ThreadList {
            private_to_archive: vec![1],
            public_to_not_archive: vec![3],
        };

        let opted_in = thread(1, "a", ThreadVisibility::Private);
        let private = thread(2, "b", ThreadVisibility::Private);
        let opted_out = thread(3, "c", ThreadVisibility::Public);
        let public = thread(4, "d", ThreadVisibility::Public);

        assert_eq!(prefs.plan_for(&opted_in), ThreadPlan::RecreatePublic);
        assert_eq!(prefs.plan_for(&private), ThreadPlan::RecreatePrivate);
        assert_eq!(prefs.plan_for(&opted_out), ThreadPlan::Skip);
        assert_eq!(prefs.plan_for(&public), ThreadPlan::RecreatePublic);
    }

    // ------------------------------------------------------------------------
    // ClaimRole
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_claim_role_creates_role_once() {
        let service = service(MockPlatform::new());

        let first = service.claim_role(PLAYER).await.unwrap();
        let second = service.claim_role(PLAYER).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(service.platform.role_grants.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_claim_role_requires_membership() {
        let service = service(MockPlatform::new());

        let result = service.claim_role(77).await;

        assert!(matches!(result, Err(ArchiveError::NotArchiveMember)));
    }

    // ------------------------------------------------------------------------
    // Off-server archive
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_archive_denied_for_regular_user() {
        let service = service(MockPlatform::new());

        let result = service.archive_off_server(&request(PLAYER)).await;

        assert!(matches!(result, Err(ArchiveError::PermissionDenied)));
        assert!(service.platform.resources.is_empty());
    }

    #[tokio::test]
    async fn test_may_archive_without_side_effects() {
        let service = service(MockPlatform::new());

        assert!(service.may_archive(MOD).await.unwrap());
        assert!(service.may_archive(PRIVILEGED).await.unwrap());
        assert!(!service.may_archive(PLAYER).await.unwrap());
        assert!(service.platform.resources.is_empty());
        assert!(service.platform.posts.is_empty());
    }

    #[tokio::test]
    async fn test_archive_allows_privileged_user() {
        let service = service(MockPlatform::new());

        let report = service.archive_off_server(&request(PRIVILEGED)).await.unwrap();

        assert_eq!(report.errors, 0);
    }

    #[tokio::test]
    async fn test_archive_unknown_guild_aborts() {
        let service = service(MockPlatform::new());
        let mut req = request(MOD);
        req.destination_guild_id = 1234;

        let result = service.archive_off_server(&req).await;

        assert!(matches!(result, Err(ArchiveError::GuildNotFound(1234))));
        assert!(service.platform.created_threads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_archive_uses_existing_destination_channel() {
        let service = service(MockPlatform::new());
        let mut req = request(MOD);
        req.destination_channel_id = Some(777);

        let report = service.archive_off_server(&req).await.unwrap();

        assert_eq!(report.destination_channel_id, 777);
    }

    #[tokio::test]
    async fn test_archive_copies_channel_and_threads() {
        let mut platform = MockPlatform::new();
        platform.threads = vec![
            thread(11, "whispers", ThreadVisibility::Private),
            thread(12, "opted in", ThreadVisibility::Private),
            thread(13, "nominations", ThreadVisibility::Public),
            thread(14, "spoilers", ThreadVisibility::Public),
        ];
        platform.histories = HashMap::from([
            (SOURCE, vec![text("day one"), text("day two")]),
            (11, vec![text("psst")]),
            (12, vec![text("I am the spy")]),
            (13, vec![text("I nominate Bob")]),
            (14, vec![text("hidden")]),
        ]);
        let service = service(platform);
        service
            .include_thread(SOURCE, 12, ThreadVisibility::Private)
            .await
            .unwrap();
        service
            .exclude_thread(SOURCE, 14, ThreadVisibility::Public)
            .await
            .unwrap();

        let report = service.archive_off_server(&request(MOD)).await.unwrap();

        assert_eq!(report.errors, 0);
        assert_eq!(report.threads_copied, 3);
        assert_eq!(report.threads_skipped, 1);
        assert_eq!(
            service.platform.posts_in(report.destination_channel_id),
            vec!["day one", "day two"]
        );

        let created = service.platform.created_threads.lock().unwrap().clone();
        let names: Vec<_> = created
            .iter()
            .map(|(_, name, vis)| (name.as_str(), *vis))
            .collect();
        assert_eq!(
            names,
            vec![
                ("whispers", ThreadVisibility::Private),
                ("opted in", ThreadVisibility::Public),
                ("nominations", ThreadVisibility::Public),
                (DISCUSSION_THREAD_NAME, ThreadVisibility::Public),
            ]
        );

        let whispers = service.platform.thread_id("whispers").unwrap();
        assert_eq!(service.platform.posts_in(whispers), vec!["psst"]);

        let role = service
            .platform
            .resources
            .get(&(ARCHIVE_GUILD, "role:42".to_string()))
            .map(|id| *id)
            .unwrap();
        assert_eq!(
            *service.platform.grants.lock().unwrap(),
            vec![(report.destination_channel_id, role)]
        );

        // Preferences are dropped once the channel is archived.
        assert!(service.store.get_threads(SOURCE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_thread_is_noticed_and_archive_continues() {
        let mut platform = MockPlatform::new();
        platform.threads = vec![
            thread(11, "too many", ThreadVisibility::Public),
            thread(12, "fine", ThreadVisibility::Public),
        ];
        platform.broken_threads = vec!["too many".to_string()];
        platform.histories = HashMap::from([(12, vec![text("ok")])]);
        let service = service(platform);

        let report = service.archive_off_server(&request(MOD)).await.unwrap();

        assert_eq!(report.threads_failed, vec!["too many".to_string()]);
        assert_eq!(report.threads_copied, 1);
        assert_eq!(
            service.platform.posts_in(report.destination_channel_id),
            vec!["Failed to create thread 'too many'"]
        );
    }

    #[tokio::test]
    async fn test_error_totals_sum_channel_and_threads() {
        let mut platform = MockPlatform::new();
        platform.threads = vec![
            thread(11, "whispers", ThreadVisibility::Private),
            thread(13, "nominations", ThreadVisibility::Public),
        ];
        platform.histories = HashMap::from([
            (SOURCE, vec![text("day one"), text("corrupt a")]),
            (11, vec![text("corrupt b"), text("psst")]),
            (13, vec![text("corrupt c"), text("corrupt d"), text("I nominate Bob")]),
        ]);
        platform.broken_posts = ["corrupt a", "corrupt b", "corrupt c", "corrupt d"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let service = service(platform);

        let report = service.archive_off_server(&request(MOD)).await.unwrap();

        assert_eq!(report.errors, 4);
        assert_eq!(report.threads_copied, 2);
        assert!(report.threads_failed.is_empty());
        assert_eq!(
            report.completion_message(),
            "Your Archive for text-game-4 is done. 4 messages caused unknown errors and were not archived."
        );
        let whispers = service.platform.thread_id("whispers").unwrap();
        assert_eq!(
            service.platform.posts_in(whispers),
            vec![
                "Error: this message caused an unknown issue: 500 - Internal Server Error",
                "psst",
            ]
        );
    }

    #[tokio::test]
    async fn test_thread_read_failure_keeps_its_errors_and_gets_own_notice() {
        let mut platform = MockPlatform::new();
        platform.threads = vec![
            thread(11, "whispers", ThreadVisibility::Public),
            thread(12, "fine", ThreadVisibility::Public),
        ];
        platform.histories = HashMap::from([
            (11, vec![text("corrupt"), text("psst")]),
            (12, vec![text("ok")]),
        ]);
        platform.broken_posts = vec!["corrupt".to_string()];
        platform.broken_histories = vec![11];
        let service = service(platform);

        let report = service.archive_off_server(&request(MOD)).await.unwrap();

        assert_eq!(report.errors, 1);
        assert_eq!(report.threads_copied, 1);
        assert_eq!(report.threads_failed, vec!["whispers".to_string()]);
        // The thread itself was created and partly filled.
        let whispers = service.platform.thread_id("whispers").unwrap();
        assert_eq!(service.platform.posts_in(whispers).len(), 2);
        assert_eq!(
            service.platform.posts_in(report.destination_channel_id),
            vec!["Failed to copy all messages of thread 'whispers'"]
        );
    }

    #[tokio::test]
    async fn test_channel_read_failure_aborts_archive() {
        let mut platform = MockPlatform::new();
        platform.histories = HashMap::from([(SOURCE, vec![text("day one")])]);
        platform.broken_histories = vec![SOURCE];
        let service = service(platform);
        service
            .include_thread(SOURCE, 11, ThreadVisibility::Private)
            .await
            .unwrap();

        let result = service.archive_off_server(&request(MOD)).await;

        assert!(matches!(result, Err(ArchiveError::HistoryRead(_))));
        // Preferences survive a failed archive.
        assert!(service.store.get_threads(SOURCE).await.unwrap().is_some());
    }

    #[test]
    fn test_completion_message_mentions_errors() {
        let clean = ArchiveReport {
            channel_name: "text-game-4".to_string(),
            ..Default::default()
        };
        let dirty = ArchiveReport {
            errors: 2,
            ..clean.clone()
        };

        assert_eq!(clean.completion_message(), "Your Archive for text-game-4 is done.");
        assert_eq!(
            dirty.completion_message(),
            "Your Archive for text-game-4 is done. 2 messages caused unknown errors and were not archived."
        );
    }
}
