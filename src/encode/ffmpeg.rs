use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{
    EncoderBackend, EncoderConfig, EncoderSession, FrameGate, VideoArtifact, validate_config,
};
use crate::foundation::core::{Fps, FrameIndex, FrameRGBA};
use crate::foundation::error::{MotionError, MotionResult};
use crate::foundation::math::flatten_premul_over_bg;

const STDOUT_CHUNK_BYTES: usize = 64 * 1024;

/// Container produced by [`FfmpegEncoder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// H.264 in MP4 (fragmented when streamed to memory).
    #[default]
    Mp4,
    /// VP9 in WebM.
    Webm,
}

impl Container {
    /// MIME type of the container.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
        }
    }

    fn muxer(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }

    fn video_codec_args(self) -> [&'static str; 4] {
        match self {
            Self::Mp4 => ["-c:v", "libx264", "-pix_fmt", "yuv420p"],
            Self::Webm => ["-c:v", "libvpx-vp9", "-pix_fmt", "yuv420p"],
        }
    }
}

/// Options for [`FfmpegEncoder`].
#[derive(Clone, Debug)]
pub struct FfmpegEncoderOpts {
    /// Output container.
    pub container: Container,
    /// Write to this file instead of collecting the stream in memory.
    pub out_path: Option<PathBuf>,
    /// Overwrite `out_path` if it already exists.
    pub overwrite: bool,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegEncoderOpts {
    fn default() -> Self {
        Self {
            container: Container::Mp4,
            out_path: None,
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Encoder that spawns the system `ffmpeg` and streams raw RGBA frames to its stdin.
#[derive(Clone, Debug, Default)]
pub struct FfmpegEncoder {
    opts: FfmpegEncoderOpts,
}

impl FfmpegEncoder {
    /// Create an encoder with `opts`.
    pub fn new(opts: FfmpegEncoderOpts) -> Self {
        Self { opts }
    }
}

impl EncoderBackend for FfmpegEncoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn open(&self, cfg: EncoderConfig) -> MotionResult<Box<dyn EncoderSession>> {
        validate_config(&cfg, "ffmpeg")?;

        if let Some(out) = self.opts.out_path.as_deref() {
            ensure_parent_dir(out)?;
            if !self.opts.overwrite && out.exists() {
                return Err(MotionError::encoder_failure(format!(
                    "output file '{}' already exists",
                    out.display()
                )));
            }
        }

        if !is_ffmpeg_on_path() {
            return Err(MotionError::encoder_failure(
                "ffmpeg is required for this encoder, but was not found on PATH",
            ));
        }

        let mut cmd = build_command(&self.opts, &cfg);
        let mut child = cmd.spawn().map_err(|e| {
            MotionError::encoder_failure(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MotionError::encoder_failure("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MotionError::encoder_failure("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        let stdout_drain = match self.opts.out_path {
            Some(_) => None,
            None => {
                let mut stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| MotionError::encoder_failure("failed to open ffmpeg stdout"))?;
                Some(std::thread::spawn(move || -> std::io::Result<Vec<Vec<u8>>> {
                    let mut chunks = Vec::new();
                    loop {
                        let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
                        let n = stdout.read(&mut buf)?;
                        if n == 0 {
                            return Ok(chunks);
                        }
                        buf.truncate(n);
                        chunks.push(buf);
                    }
                }))
            }
        };

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            container = ?self.opts.container,
            "ffmpeg encoder started"
        );

        Ok(Box::new(FfmpegSession {
            opts: self.opts.clone(),
            gate: FrameGate::new(cfg),
            child: Some(child),
            stdin: Some(stdin),
            stdout_drain,
            stderr_drain: Some(stderr_drain),
            scratch: vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4],
        }))
    }
}

type Drain<T> = JoinHandle<std::io::Result<T>>;

struct FfmpegSession {
    opts: FfmpegEncoderOpts,
    gate: FrameGate,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<Drain<Vec<Vec<u8>>>>,
    stderr_drain: Option<Drain<Vec<u8>>>,
    scratch: Vec<u8>,
}

impl EncoderSession for FfmpegSession {
    fn submit_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> MotionResult<()> {
        self.gate.admit(idx, frame)?;

        // ffmpeg does not understand premultiplied input.
        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MotionError::encoder_failure("ffmpeg session is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            MotionError::encoder_failure(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> MotionResult<VideoArtifact> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| MotionError::encoder_failure("ffmpeg session not started"))?;

        let status = child.wait().map_err(|e| {
            MotionError::encoder_failure(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = join_drain(self.stderr_drain.take(), "stderr")?.unwrap_or_default();
        let chunks = join_drain(self.stdout_drain.take(), "stdout")?;

        if self.gate.admitted() == 0 {
            return Err(MotionError::encoder_failure("ffmpeg: no frames submitted"));
        }
        if !status.success() {
            if let Some(path) = self.opts.out_path.as_deref() {
                let _ = std::fs::remove_file(path);
            }
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(MotionError::encoder_failure(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        let mime = self.opts.container.mime().to_string();
        match (self.opts.out_path.clone(), chunks) {
            (Some(path), _) => Ok(VideoArtifact::File { path, mime }),
            (None, Some(chunks)) => {
                let data = chunks.concat();
                if data.is_empty() {
                    return Err(MotionError::encoder_failure("ffmpeg produced an empty stream"));
                }
                Ok(VideoArtifact::Bytes { mime, data })
            }
            (None, None) => Err(MotionError::encoder_failure("ffmpeg stdout was not captured")),
        }
    }

    fn abort(mut self: Box<Self>) {
        self.kill();
    }
}

impl FfmpegSession {
    fn kill(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!("ffmpeg encoder aborted; partial output discarded");
        }
        if let Some(path) = self.opts.out_path.as_deref() {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.kill();
        }
    }
}

fn join_drain<T>(handle: Option<Drain<T>>, stream: &str) -> MotionResult<Option<T>> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| {
                MotionError::encoder_failure(format!("ffmpeg {stream} drain thread panicked"))
            })?
            .map(Some)
            .map_err(|e| MotionError::encoder_failure(format!("ffmpeg {stream} read failed: {e}"))),
        None => Ok(None),
    }
}

fn build_command(opts: &FfmpegEncoderOpts, cfg: &EncoderConfig) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::piped()).stderr(Stdio::piped());
    cmd.stdout(if opts.out_path.is_some() {
        Stdio::null()
    } else {
        Stdio::piped()
    });

    if opts.overwrite {
        cmd.arg("-y");
    } else {
        cmd.arg("-n");
    }

    cmd.args([
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
        &format!("{}x{}", cfg.width, cfg.height),
    ]);
    push_input_fps(&mut cmd, cfg.fps);
    cmd.args(["-i", "pipe:0", "-an"]);
    cmd.args(opts.container.video_codec_args());

    match (&opts.out_path, opts.container) {
        (Some(path), Container::Mp4) => {
            cmd.args(["-movflags", "+faststart"]).arg(path);
        }
        (Some(path), Container::Webm) => {
            cmd.arg(path);
        }
        (None, Container::Mp4) => {
            // A seekable moov atom is impossible on a pipe; emit a fragmented stream instead.
            cmd.args(["-movflags", "frag_keyframe+empty_moov", "-f", "mp4", "pipe:1"]);
        }
        (None, Container::Webm) => {
            cmd.args(["-f", opts.container.muxer(), "pipe:1"]);
        }
    }
    cmd
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MotionResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            MotionError::encoder_failure(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
