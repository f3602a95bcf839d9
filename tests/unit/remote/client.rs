use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::assets::decode::SourceImage;
use crate::foundation::cancel::CancelHandle;
use crate::foundation::error::ErrorKind;
use crate::generate::request::DurationSecs;
use crate::remote::wire::CreatedJob;

#[derive(Default)]
struct Scripted {
    create: Mutex<Option<Result<CreatedJob, ProviderError>>>,
    polls: Mutex<VecDeque<Result<JobSnapshot, ProviderError>>>,
    requests: Mutex<Vec<CreateJobRequest>>,
    polled_ids: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(id: &str, statuses: &[&str]) -> Self {
        let s = Self::default();
        *s.create.lock().unwrap() = Some(Ok(CreatedJob {
            id: id.to_string(),
            status: None,
        }));
        for json in statuses {
            s.polls
                .lock()
                .unwrap()
                .push_back(Ok(serde_json::from_str(json).unwrap()));
        }
        s
    }
}

#[async_trait]
impl JobTransport for Scripted {
    async fn create_job(&self, request: &CreateJobRequest) -> Result<CreatedJob, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.create
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ProviderError::Network("create called twice".into())))
    }

    async fn get_job(&self, job_id: &str) -> Result<JobSnapshot, ProviderError> {
        self.polled_ids.lock().unwrap().push(job_id.to_string());
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(serde_json::from_str(r#"{"status":"running"}"#).unwrap()))
    }
}

fn png_request() -> GenerationRequest {
    let img = image::RgbaImage::from_pixel(64, 64, image::Rgba([1, 2, 3, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    GenerationRequest::new(SourceImage::from_bytes(out.into_inner()), DurationSecs::Five)
        .with_prompt("waves")
        .with_camera_stabilized(true)
}

fn client(transport: Arc<Scripted>, policy: PollPolicy) -> RemoteJobClient {
    RemoteJobClient::new(transport, RemoteJobSettings::default(), policy)
}

fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(10),
        max_wait: None,
        max_attempts: None,
    }
}

#[test]
fn payload_derives_frames_and_intensity() {
    let c = client(Arc::new(Scripted::default()), fast_policy());
    let req = png_request();
    let payload = c.job_request(&req).unwrap();
    assert_eq!(payload.num_frames, 120);
    assert_eq!(payload.motion_intensity, MotionIntensity::Low);
    assert_eq!((payload.width, payload.height), (1024, 576));
    assert!(payload.prompt.starts_with("waves, "));
    assert!(payload.image.starts_with("data:image/png;base64,"));

    let natural = req.with_camera_stabilized(false);
    let payload = c.job_request(&natural).unwrap();
    assert_eq!(payload.motion_intensity, MotionIntensity::High);
}

#[tokio::test(start_paused = true)]
async fn two_pending_then_one_extraction() {
    let t = Arc::new(Scripted::new(
        "abc",
        &[
            r#"{"status":"queued"}"#,
            r#"{"status":"queued"}"#,
            r#"{"status":"succeeded","outputs":[{"url":"https://x/video.mp4"}]}"#,
        ],
    ));
    let c = client(t.clone(), fast_policy());
    let mut job = c.submit(&png_request()).await.unwrap();
    assert_eq!(job.id, "abc");
    assert_eq!(job.status, JobStatus::Queued);

    assert_eq!(c.poll(&mut job).await.unwrap(), JobStatus::Queued);
    assert!(job.outcome().is_none());
    assert_eq!(c.poll(&mut job).await.unwrap(), JobStatus::Queued);
    assert!(job.outcome().is_none());
    assert_eq!(c.poll(&mut job).await.unwrap(), JobStatus::Succeeded);

    let art = job.outcome().unwrap().unwrap();
    assert_eq!(art.as_url(), Some("https://x/video.mp4"));
    assert_eq!(job.polls, 3);
    assert_eq!(*t.polled_ids.lock().unwrap(), vec!["abc"; 3]);
}

#[tokio::test(start_paused = true)]
async fn wait_drives_to_terminal_state() {
    let t = Arc::new(Scripted::new(
        "abc",
        &[
            r#"{"status":"running"}"#,
            r#"{"status":"succeeded","output":{"url":"https://x/v.mp4"}}"#,
        ],
    ));
    let c = client(t, fast_policy());
    let mut job = c.submit(&png_request()).await.unwrap();
    let art = c.wait(&mut job, &CancelToken::never()).await.unwrap();
    assert_eq!(art, VideoArtifact::Url("https://x/v.mp4".into()));
    assert_eq!(job.polls, 2);
}

#[tokio::test(start_paused = true)]
async fn succeeded_without_output_is_job_failed() {
    let t = Arc::new(Scripted::new("abc", &[r#"{"status":"succeeded","outputs":[]}"#]));
    let c = client(t, fast_policy());
    let mut job = c.submit(&png_request()).await.unwrap();
    let err = c.wait(&mut job, &CancelToken::never()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::JobFailed);
    assert_eq!(err.message(), NO_VIDEO_REFERENCE);
    assert_eq!(job.polls, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_status_carries_detail_or_fallback() {
    let t = Arc::new(Scripted::new(
        "abc",
        &[r#"{"status":"failed","error_message":"content policy"}"#],
    ));
    let c = client(t, fast_policy());
    let mut job = c.submit(&png_request()).await.unwrap();
    let err = c.wait(&mut job, &CancelToken::never()).await.unwrap_err();
    assert_eq!(err.message(), "content policy");

    let t = Arc::new(Scripted::new("abc", &[r#"{"status":"failed"}"#]));
    let c = client(t, fast_policy());
    let mut job = c.submit(&png_request()).await.unwrap();
    let err = c.wait(&mut job, &CancelToken::never()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::JobFailed);
    assert_eq!(err.message(), UNKNOWN_JOB_ERROR);
}

#[tokio::test(start_paused = true)]
async fn attempt_budget_yields_timeout() {
    let t = Arc::new(Scripted::new("abc", &[]));
    let policy = PollPolicy {
        max_attempts: Some(4),
        ..fast_policy()
    };
    let c = client(t, policy);
    let mut job = c.submit(&png_request()).await.unwrap();
    let err = c.wait(&mut job, &CancelToken::never()).await.unwrap_err();
    assert!(matches!(err, MotionError::Timeout { attempts: 4, .. }));
}

#[tokio::test(start_paused = true)]
async fn wait_budget_yields_timeout() {
    let t = Arc::new(Scripted::new("abc", &[]));
    let policy = PollPolicy {
        interval: Duration::from_secs(2),
        max_wait: Some(Duration::from_secs(5)),
        max_attempts: None,
    };
    let c = client(t, policy);
    let mut job = c.submit(&png_request()).await.unwrap();
    let err = c.wait(&mut job, &CancelToken::never()).await.unwrap_err();
    match err {
        MotionError::Timeout { waited, attempts } => {
            assert_eq!(attempts, 3);
            assert!(waited >= Duration::from_secs(5));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_polling() {
    let t = Arc::new(Scripted::new("abc", &[]));
    let c = client(t.clone(), fast_policy());
    let mut job = c.submit(&png_request()).await.unwrap();
    let (handle, token) = CancelHandle::pair();

    let canceller = async {
        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.cancel();
    };
    let (res, ()) = tokio::join!(c.wait(&mut job, &token), canceller);
    assert!(matches!(res, Err(MotionError::Cancelled)));
    assert_eq!(t.polled_ids.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn submit_error_uses_provider_detail() {
    let t = Arc::new(Scripted::default());
    *t.create.lock().unwrap() = Some(Err(ProviderError::api(
        429,
        r#"{"detail":"quota exceeded"}"#.into(),
    )));
    let c = client(t.clone(), fast_policy());
    let err = c.submit(&png_request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    assert_eq!(err.message(), "quota exceeded");
    assert!(t.polled_ids.lock().unwrap().is_empty());
}

#[tokio::test]
async fn poll_transport_error_is_provider_unavailable() {
    let t = Arc::new(Scripted::new("abc", &[]));
    t.polls
        .lock()
        .unwrap()
        .push_back(Err(ProviderError::Network("reset by peer".into())));
    let c = client(t, fast_policy());
    let mut job = c.submit(&png_request()).await.unwrap();
    let err = c.poll(&mut job).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    assert_eq!(job.polls, 0);
}

#[tokio::test(start_paused = true)]
async fn transient_status_failure_keeps_job_pending() {
    let t = Arc::new(Scripted::new("abc", &[]));
    {
        let mut polls = t.polls.lock().unwrap();
        polls.push_back(Err(ProviderError::api(503, "Service Unavailable".into())));
        polls.push_back(Ok(serde_json::from_str(
            r#"{"status":"succeeded","outputs":[{"url":"https://x/v.mp4"}]}"#,
        )
        .unwrap()));
    }
    let c = client(t.clone(), fast_policy());
    let mut job = c.submit(&png_request()).await.unwrap();
    let art = c.wait(&mut job, &CancelToken::never()).await.unwrap();
    assert_eq!(art.as_url(), Some("https://x/v.mp4"));
    assert_eq!(job.polls, 2);
    assert_eq!(t.polled_ids.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_count_against_attempt_budget() {
    let t = Arc::new(Scripted::new("abc", &[]));
    for _ in 0..5 {
        t.polls
            .lock()
            .unwrap()
            .push_back(Err(ProviderError::Network("reset by peer".into())));
    }
    let policy = PollPolicy {
        max_attempts: Some(3),
        ..fast_policy()
    };
    let c = client(t.clone(), policy);
    let mut job = c.submit(&png_request()).await.unwrap();
    let err = c.wait(&mut job, &CancelToken::never()).await.unwrap_err();
    assert!(matches!(err, MotionError::Timeout { attempts: 3, .. }));
    assert_eq!(t.polled_ids.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn rejected_status_request_ends_wait() {
    let t = Arc::new(Scripted::new("abc", &[]));
    t.polls.lock().unwrap().push_back(Err(ProviderError::api(
        404,
        r#"{"detail":"no such job"}"#.into(),
    )));
    let c = client(t.clone(), fast_policy());
    let mut job = c.submit(&png_request()).await.unwrap();
    let err = c.wait(&mut job, &CancelToken::never()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    assert!(err.message().contains("no such job"));
    assert_eq!(t.polled_ids.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn already_cancelled_token_wins_over_ready_poll() {
    let t = Arc::new(Scripted::new(
        "abc",
        &[r#"{"status":"succeeded","outputs":[{"url":"https://x/v.mp4"}]}"#],
    ));
    let policy = PollPolicy {
        interval: Duration::ZERO,
        ..fast_policy()
    };
    let c = client(t.clone(), policy);
    let mut job = c.submit(&png_request()).await.unwrap();
    let (handle, token) = CancelHandle::pair();
    handle.cancel();

    for _ in 0..16 {
        let res = c.wait(&mut job, &token).await;
        assert!(matches!(res, Err(MotionError::Cancelled)));
    }
    assert!(t.polled_ids.lock().unwrap().is_empty());
}
