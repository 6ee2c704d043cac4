use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use postdeck::application::bootstrap::{
    BootstrapPhase, DecodeError, QrBootstrap, QrScanner, ScanConfig,
};
use postdeck::application::console::{
    Console, ConsoleError, DELETE_CONFIRMATION, DeleteOutcome, EMPTY_DESCRIPTION_NOTICE,
    LOAD_FAILED_NOTICE, STATUS_FAILED_NOTICE,
};
use postdeck::application::credentials::{CredentialSlot, StoreError};
use postdeck::application::editor::{PostEditForm, UPLOAD_FAILED_NOTICE};
use postdeck::application::prompt::Prompt;
use postdeck::application::repos::{PostsRepo, RepoError, page_offset};
use postdeck::application::session::{AppContext, ClientFactory, Session, SessionError};
use postdeck::application::uploads::{ImageUploader, UploadError};
use postdeck::domain::credentials::CredentialBundle;
use postdeck::domain::posts::{Post, PostDraft, PostPatch, PostStatus};
use postdeck::domain::uploads::ImageFile;
use serde_json::Value;

const BUNDLE: &str = r#"{"dataStore":{"url":"u","key":"k"},"imageHost":{"apiKey":"a"}}"#;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Count,
    List(u32, u32),
    Get(i64),
    Create(PostDraft),
    Update(i64, PostPatch),
    Delete(i64),
}

#[derive(Default)]
struct MemoryRepo {
    rows: Mutex<Vec<Post>>,
    calls: Mutex<Vec<Call>>,
    fail: Mutex<bool>,
    fail_counts: Mutex<bool>,
}

impl MemoryRepo {
    fn seeded(count: i64, status: PostStatus) -> Arc<Self> {
        let repo = Self::default();
        *repo.rows.lock().expect("lock") = (1..=count)
            .map(|id| Post {
                id: Some(id),
                description: format!("post {id}"),
                status,
                images: vec![],
                created_at: None,
                updated_at: None,
            })
            .collect();
        Arc::new(repo)
    }

    fn set_failing(&self, fail: bool) {
        *self.fail.lock().expect("lock") = fail;
    }

    fn set_failing_counts(&self, fail: bool) {
        *self.fail_counts.lock().expect("lock") = fail;
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    fn clear_calls(&self) {
        self.calls.lock().expect("lock").clear();
    }

    fn record(&self, call: Call) -> Result<(), RepoError> {
        self.calls.lock().expect("lock").push(call);
        if *self.fail.lock().expect("lock") {
            return Err(RepoError::Transport("connection reset".into()));
        }
        Ok(())
    }

    fn status_of(&self, id: i64) -> Option<PostStatus> {
        self.rows
            .lock()
            .expect("lock")
            .iter()
            .find(|post| post.id == Some(id))
            .map(|post| post.status)
    }
}

#[async_trait]
impl PostsRepo for MemoryRepo {
    async fn count(&self) -> Result<u64, RepoError> {
        self.record(Call::Count)?;
        if *self.fail_counts.lock().expect("lock") {
            return Err(RepoError::Transport("down".into()));
        }
        Ok(self.rows.lock().expect("lock").len() as u64)
    }

    async fn list(&self, page: u32, page_size: u32) -> Result<Vec<Post>, RepoError> {
        self.record(Call::List(page, page_size))?;
        let offset = page_offset(page, page_size) as usize;
        Ok(self
            .rows
            .lock()
            .expect("lock")
            .iter()
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Post>, RepoError> {
        self.record(Call::Get(id))?;
        Ok(self
            .rows
            .lock()
            .expect("lock")
            .iter()
            .find(|post| post.id == Some(id))
            .cloned())
    }

    async fn create(&self, draft: &PostDraft) -> Result<Post, RepoError> {
        self.record(Call::Create(draft.clone()))?;
        let mut rows = self.rows.lock().expect("lock");
        let id = rows.iter().filter_map(|post| post.id).max().unwrap_or(0) + 1;
        let post = Post {
            id: Some(id),
            description: draft.description.clone(),
            status: draft.status,
            images: draft.images.clone(),
            created_at: None,
            updated_at: None,
        };
        rows.push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: i64, patch: &PostPatch) -> Result<(), RepoError> {
        self.record(Call::Update(id, patch.clone()))?;
        let mut rows = self.rows.lock().expect("lock");
        if let Some(post) = rows.iter_mut().find(|post| post.id == Some(id)) {
            post.apply_patch(patch, time::OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.record(Call::Delete(id))?;
        self.rows
            .lock()
            .expect("lock")
            .retain(|post| post.id != Some(id));
        Ok(())
    }
}

/// Fails every upload whose file name contains `fail`.
struct NamedUploader;

#[async_trait]
impl ImageUploader for NamedUploader {
    async fn upload(&self, file: &ImageFile) -> Result<String, UploadError> {
        if file.file_name.contains("fail") {
            return Err(UploadError::Rejected { status: 500 });
        }
        Ok(format!("https://img.example/{}", file.file_name))
    }
}

struct ScriptedPrompt {
    answer: bool,
    alerts: Mutex<Vec<String>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            alerts: Mutex::new(Vec::new()),
            questions: Mutex::new(Vec::new()),
        })
    }

    fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("lock").clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn alert(&self, message: &str) {
        self.alerts.lock().expect("lock").push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.questions.lock().expect("lock").push(message.to_string());
        self.answer
    }
}

#[derive(Default)]
struct MemorySlot(Mutex<Option<Value>>);

impl CredentialSlot for MemorySlot {
    fn load(&self) -> Result<Option<Value>, StoreError> {
        Ok(self.0.lock().expect("lock").clone())
    }

    fn save(&self, payload: &Value) -> Result<(), StoreError> {
        *self.0.lock().expect("lock") = Some(payload.clone());
        Ok(())
    }
}

struct SharedRepoFactory(Arc<MemoryRepo>);

impl ClientFactory for SharedRepoFactory {
    fn connect(&self, _bundle: &CredentialBundle) -> Result<Session, SessionError> {
        Ok(Session {
            posts: self.0.clone(),
            uploader: Arc::new(NamedUploader),
        })
    }
}

#[derive(Default)]
struct FileOnlyScanner {
    result: Option<String>,
    frames: VecDeque<String>,
}

#[async_trait]
impl QrScanner for FileOnlyScanner {
    async fn start(&mut self, _config: &ScanConfig) -> Result<(), DecodeError> {
        Ok(())
    }

    async fn poll_frame(&mut self) -> Result<Option<String>, DecodeError> {
        Ok(self.frames.pop_front())
    }

    async fn stop(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }

    fn clear(&mut self) {}

    async fn scan_file(&mut self, _bytes: &[u8]) -> Result<String, DecodeError> {
        self.result.clone().ok_or(DecodeError::NotFound)
    }
}

fn page_size(size: u32) -> NonZeroU32 {
    NonZeroU32::new(size).expect("non-zero")
}

fn console(repo: &Arc<MemoryRepo>, prompt: &Arc<ScriptedPrompt>, size: u32) -> Console {
    let session = Session {
        posts: repo.clone(),
        uploader: Arc::new(NamedUploader),
    };
    Console::new(&session, prompt.clone(), page_size(size))
}

#[tokio::test(start_paused = true)]
async fn fresh_start_scans_initializes_and_loads_first_page() {
    let repo = MemoryRepo::seeded(12, PostStatus::Pending);
    let slot = Arc::new(MemorySlot::default());
    let mut ctx = AppContext::new(slot.clone(), Arc::new(SharedRepoFactory(repo.clone())));

    assert!(ctx.resume().expect("resume").is_none(), "bootstrap required");

    let scanner = FileOnlyScanner {
        result: Some(BUNDLE.to_string()),
        ..FileOnlyScanner::default()
    };
    let mut flow = QrBootstrap::new(scanner, ctx.credential_slot(), ScanConfig::default());
    let payload = flow.scan_image(b"qr.png").await.expect("scan");
    assert_eq!(flow.phase(), &BootstrapPhase::Ready);
    assert!(slot.load().expect("load").is_some());

    let session = ctx.initialize(&payload).expect("session");
    let prompt = ScriptedPrompt::answering(true);
    let mut console = Console::new(&session, prompt.clone(), page_size(10));
    console.load_page().await.expect("first page");

    assert_eq!(console.posts().len(), 10);
    assert_eq!(console.cursor().total_count(), 12);
    assert_eq!(console.cursor().max_page(), 2);
    assert!(prompt.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn camera_scan_with_garbage_keeps_previous_credentials() {
    let slot = Arc::new(MemorySlot::default());
    let previous: Value = serde_json::from_str(BUNDLE).expect("json");
    slot.save(&previous).expect("seed");

    let scanner = FileOnlyScanner {
        frames: VecDeque::from(vec!["WIFI:S:cafe;;".to_string()]),
        ..FileOnlyScanner::default()
    };
    let mut flow = QrBootstrap::new(scanner, slot.clone(), ScanConfig::default());
    assert!(flow.run_camera().await.is_err());
    assert!(!flow.has_open_session());
    assert_eq!(slot.load().expect("load"), Some(previous));
}

#[tokio::test]
async fn creating_hello_appends_and_counts() {
    let repo = MemoryRepo::seeded(3, PostStatus::Approved);
    let prompt = ScriptedPrompt::answering(true);
    let mut console = console(&repo, &prompt, 10);
    console.load_page().await.expect("load");
    let mut revisions = console.subscribe();
    revisions.mark_unchanged();
    repo.clear_calls();

    let mut form = PostEditForm::blank();
    form.set_description("hello");
    console.submit_form(&form).await.expect("create");

    assert_eq!(
        repo.calls(),
        vec![Call::Create(PostDraft {
            description: "hello".into(),
            status: PostStatus::Pending,
            images: vec![],
        })]
    );
    assert_eq!(console.posts().len(), 4);
    assert_eq!(console.cursor().total_count(), 4);
    assert!(revisions.has_changed().expect("sender alive"));
}

#[tokio::test]
async fn empty_description_alerts_without_repository_call() {
    let repo = MemoryRepo::seeded(1, PostStatus::Pending);
    let prompt = ScriptedPrompt::answering(true);
    let mut console = console(&repo, &prompt, 10);

    let mut form = PostEditForm::blank();
    form.set_description("   ");
    let err = console.submit_form(&form).await.expect_err("invalid");

    assert!(matches!(err, ConsoleError::Validation(_)));
    assert!(repo.calls().is_empty());
    assert_eq!(prompt.alerts(), vec![EMPTY_DESCRIPTION_NOTICE.to_string()]);
}

#[tokio::test]
async fn declined_delete_makes_no_call() {
    let repo = MemoryRepo::seeded(3, PostStatus::Pending);
    let prompt = ScriptedPrompt::answering(false);
    let mut console = console(&repo, &prompt, 10);
    console.load_page().await.expect("load");
    let before = console.posts().posts().to_vec();
    repo.clear_calls();

    let outcome = console.delete(2).await.expect("delete");

    assert_eq!(outcome, DeleteOutcome::Declined);
    assert!(repo.calls().is_empty());
    assert_eq!(console.posts().posts(), before.as_slice());
    assert_eq!(
        *prompt.questions.lock().expect("lock"),
        vec![DELETE_CONFIRMATION.to_string()]
    );
}

#[tokio::test]
async fn deleting_last_row_of_last_page_steps_back() {
    let repo = MemoryRepo::seeded(11, PostStatus::Pending);
    let prompt = ScriptedPrompt::answering(true);
    let mut console = console(&repo, &prompt, 10);
    console.load_page_at(2).await.expect("load");
    assert_eq!(console.posts().len(), 1);

    assert_eq!(console.delete(11).await.expect("delete"), DeleteOutcome::Deleted);

    assert_eq!(console.cursor().current_page(), 1);
    assert_eq!(console.cursor().max_page(), 1);
    assert_eq!(console.posts().len(), 10);
}

#[tokio::test]
async fn delete_stands_when_the_follow_up_reload_fails() {
    let repo = MemoryRepo::seeded(11, PostStatus::Pending);
    let prompt = ScriptedPrompt::answering(true);
    let mut console = console(&repo, &prompt, 10);
    console.load_page_at(2).await.expect("load");
    repo.set_failing_counts(true);

    assert_eq!(console.delete(11).await.expect("delete"), DeleteOutcome::Deleted);

    assert_eq!(repo.status_of(11), None);
    assert_eq!(console.cursor().total_count(), 10);
    assert_eq!(prompt.alerts(), vec![LOAD_FAILED_NOTICE.to_string()]);

    repo.set_failing_counts(false);
    console.load_page().await.expect("reload");
    assert_eq!(console.cursor().current_page(), 1);
    assert_eq!(console.posts().len(), 10);
}

#[tokio::test]
async fn toggling_twice_restores_status() {
    let repo = MemoryRepo::seeded(2, PostStatus::Approved);
    let prompt = ScriptedPrompt::answering(true);
    let mut console = console(&repo, &prompt, 10);
    console.load_page().await.expect("load");

    assert_eq!(console.toggle_status(1).await.expect("toggle"), PostStatus::Pending);
    assert_eq!(console.posts().find(1).map(|p| p.status), Some(PostStatus::Pending));
    assert_eq!(console.toggle_status(1).await.expect("toggle"), PostStatus::Approved);
    assert_eq!(repo.status_of(1), Some(PostStatus::Approved));
}

#[tokio::test]
async fn rejected_post_toggles_to_pending_even_off_page() {
    let repo = MemoryRepo::seeded(15, PostStatus::Rejected);
    let prompt = ScriptedPrompt::answering(true);
    let mut console = console(&repo, &prompt, 10);
    console.load_page().await.expect("load");
    repo.clear_calls();

    assert_eq!(console.toggle_status(14).await.expect("toggle"), PostStatus::Pending);
    assert_eq!(repo.calls()[0], Call::Get(14));
    assert_eq!(repo.status_of(14), Some(PostStatus::Pending));
}

#[tokio::test]
async fn failures_leave_state_untouched_and_alert_once() {
    let repo = MemoryRepo::seeded(25, PostStatus::Approved);
    let prompt = ScriptedPrompt::answering(true);
    let mut console = console(&repo, &prompt, 10);
    console.load_page().await.expect("load");
    let before = console.posts().posts().to_vec();
    let cursor = *console.cursor();
    let mut revisions = console.subscribe();
    revisions.mark_unchanged();

    repo.set_failing(true);
    assert!(console.next_page().await.is_err());
    assert!(console.toggle_status(1).await.is_err());

    assert_eq!(console.cursor(), &cursor, "page must not advance");
    assert_eq!(console.posts().posts(), before.as_slice());
    assert_eq!(
        prompt.alerts(),
        vec![LOAD_FAILED_NOTICE.to_string(), STATUS_FAILED_NOTICE.to_string()]
    );
    assert!(!revisions.has_changed().expect("sender alive"));

    repo.set_failing(false);
    assert!(console.next_page().await.expect("next"));
    assert_eq!(console.cursor().current_page(), 2);
}

#[tokio::test]
async fn second_of_three_uploads_failing_keeps_order() {
    let repo = MemoryRepo::seeded(0, PostStatus::Pending);
    let prompt = ScriptedPrompt::answering(true);
    let console = console(&repo, &prompt, 10);

    let mut form = PostEditForm::blank();
    let files = vec![
        ImageFile::new("a.png", vec![1]),
        ImageFile::new("fail.png", vec![2]),
        ImageFile::new("c.jpg", vec![3]),
    ];
    let report = console.upload_images(&mut form, files).await;

    assert_eq!(report.uploaded, 2);
    assert_eq!(report.failed, 1);
    form.set_description("batch");
    let submission = form.submit().expect("submit");
    assert_eq!(
        submission.images,
        vec![
            "https://img.example/a.png".to_string(),
            "https://img.example/c.jpg".to_string()
        ]
    );
    assert_eq!(prompt.alerts(), vec![UPLOAD_FAILED_NOTICE.to_string()]);
}

#[tokio::test]
async fn navigation_never_passes_the_last_page() {
    for total in [0_i64, 1, 9, 10, 11, 20, 21, 35] {
        let repo = MemoryRepo::seeded(total, PostStatus::Pending);
        let prompt = ScriptedPrompt::answering(true);
        let mut console = console(&repo, &prompt, 10);
        console.load_page().await.expect("load");

        let expected_max = u32::try_from(total.max(1) + 9).expect("fits") / 10;
        assert_eq!(console.cursor().max_page(), expected_max, "total {total}");

        while console.next_page().await.expect("next") {}
        assert_eq!(console.cursor().current_page(), console.cursor().max_page());
        assert!(!console.next_page().await.expect("next"));

        while console.prev_page().await.expect("prev") {}
        assert_eq!(console.cursor().current_page(), 1);
    }
}

#[tokio::test]
async fn editing_merges_into_loaded_row() {
    let repo = MemoryRepo::seeded(2, PostStatus::Pending);
    let prompt = ScriptedPrompt::answering(true);
    let mut console = console(&repo, &prompt, 10);
    console.load_page().await.expect("load");

    let mut form = console.open_editor(2).await.expect("editor");
    form.set_description("renamed");
    form.set_status(PostStatus::Rejected);
    console.submit_form(&form).await.expect("update");

    let row = console.posts().find(2).expect("row");
    assert_eq!(row.description, "renamed");
    assert_eq!(row.status, PostStatus::Rejected);
    assert!(row.updated_at.is_some());
    assert_eq!(console.cursor().total_count(), 2);
}
