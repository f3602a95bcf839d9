use super::*;

fn cfg(w: u32, h: u32) -> EncoderConfig {
    EncoderConfig {
        width: w,
        height: h,
        fps: Fps::integer(30).unwrap(),
    }
}

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: rgba.repeat((w * h) as usize),
        premultiplied: true,
    }
}

fn args_of(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn in_memory_mp4_uses_fragmented_stream() {
    let cmd = build_command(&FfmpegEncoderOpts::default(), &cfg(64, 36));
    let args = args_of(&cmd);
    assert_eq!(cmd.get_program(), "ffmpeg");
    assert!(args.windows(2).any(|w| w == ["-s", "64x36"]));
    assert!(args.windows(2).any(|w| w == ["-r", "30/1"]));
    assert!(args.windows(2).any(|w| w == ["-movflags", "frag_keyframe+empty_moov"]));
    assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
}

#[test]
fn file_output_targets_path() {
    let opts = FfmpegEncoderOpts {
        container: Container::Webm,
        out_path: Some(PathBuf::from("out/clip.webm")),
        overwrite: false,
        ..FfmpegEncoderOpts::default()
    };
    let args = args_of(&build_command(&opts, &cfg(64, 36)));
    assert_eq!(args.first().map(String::as_str), Some("-n"));
    assert!(args.iter().any(|a| a == "libvpx-vp9"));
    assert_eq!(args.last().map(String::as_str), Some("out/clip.webm"));
}

#[test]
fn container_mime() {
    assert_eq!(Container::Mp4.mime(), "video/mp4");
    assert_eq!(Container::Webm.mime(), "video/webm");
    let c: Container = serde_json::from_str("\"webm\"").unwrap();
    assert_eq!(c, Container::Webm);
}

#[test]
fn odd_dimensions_rejected_before_spawn() {
    let err = FfmpegEncoder::default().open(cfg(63, 36)).err().unwrap();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::EncoderFailure);
}

#[test]
fn encodes_small_clip_when_ffmpeg_available() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let mut s = FfmpegEncoder::default().open(cfg(16, 16)).unwrap();
    for i in 0..6u64 {
        s.submit_frame(FrameIndex(i), &solid(16, 16, [200, 40, 40, 255]))
            .unwrap();
    }
    match s.finish().unwrap() {
        VideoArtifact::Bytes { mime, data } => {
            assert_eq!(mime, "video/mp4");
            assert!(!data.is_empty());
        }
        other => panic!("unexpected artifact {other:?}"),
    }
}

#[test]
fn abort_discards_session_when_ffmpeg_available() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let mut s = FfmpegEncoder::default().open(cfg(16, 16)).unwrap();
    s.submit_frame(FrameIndex(0), &solid(16, 16, [0, 0, 0, 255]))
        .unwrap();
    let err = s
        .submit_frame(FrameIndex(0), &solid(16, 16, [0, 0, 0, 255]))
        .unwrap_err();
    assert!(err.to_string().contains("out-of-order"));
    s.abort();
}
