use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use motionforge::{
    CancelHandle, Container, DurationSecs, EncoderChoice, GenerationRequest, Generator,
    GeneratorConfig, LocalConfig, MotionStyle, Pacing, RemoteConfig, Secret, SourceImage,
    StrategyConfig, VideoArtifact,
};

const TOKEN_VARS: [&str; 2] = ["MOTIONFORGE_API_TOKEN", "REPLICATE_API_TOKEN"];

#[derive(Parser, Debug)]
#[command(name = "motionforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize the clip locally.
    Local(LocalArgs),
    /// Generate the clip with a remote inference provider (token read from the environment).
    Remote(RemoteArgs),
}

#[derive(Parser, Debug)]
struct ClipArgs {
    /// Source image (PNG, JPEG, WebP, ...).
    #[arg(long)]
    image: PathBuf,

    /// Camera movement: pan, zoom-in, zoom-out, orbit, dynamic.
    #[arg(long, default_value = "dynamic")]
    style: String,

    /// Clip length in seconds (5 or 10).
    #[arg(long, default_value_t = 5)]
    duration: u32,

    /// Give up after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncoderArg {
    Y4m,
    Mp4,
    Webm,
}

#[derive(Parser, Debug)]
struct LocalArgs {
    #[command(flatten)]
    clip: ClipArgs,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Output encoder (`mp4`/`webm` require `ffmpeg` on PATH).
    #[arg(long, value_enum, default_value_t = EncoderArg::Y4m)]
    encoder: EncoderArg,

    /// Working canvas width in pixels.
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Pace frames at 60 per second of wall-clock time.
    #[arg(long, default_value_t = false)]
    realtime: bool,
}

#[derive(Parser, Debug)]
struct RemoteArgs {
    #[command(flatten)]
    clip: ClipArgs,

    /// Scene description.
    #[arg(long)]
    prompt: Option<String>,

    /// Keep the camera steady.
    #[arg(long, default_value_t = false)]
    stabilized: bool,

    /// Provider configuration JSON (remote strategy); defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("motionforge=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Local(args) => cmd_local(args).await,
        Command::Remote(args) => cmd_remote(args).await,
    }
}

async fn cmd_local(args: LocalArgs) -> anyhow::Result<()> {
    let encoder = match args.encoder {
        EncoderArg::Y4m => EncoderChoice::Y4m,
        EncoderArg::Mp4 => EncoderChoice::Ffmpeg {
            container: Container::Mp4,
            out_path: Some(args.out.clone()),
        },
        EncoderArg::Webm => EncoderChoice::Ffmpeg {
            container: Container::Webm,
            out_path: Some(args.out.clone()),
        },
    };
    let config = GeneratorConfig {
        strategy: StrategyConfig::Local(LocalConfig {
            working_width: args.width,
            pacing: if args.realtime {
                Pacing::Realtime
            } else {
                Pacing::Cooperative
            },
            encoder,
            ..LocalConfig::default()
        }),
    };
    let request = load_request(&args.clip, None, false)?;
    let artifact = run(&config, &request, args.clip.timeout_secs).await?;

    match artifact {
        VideoArtifact::Bytes { data, .. } => {
            if let Some(parent) = args.out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(&args.out, &data)
                .with_context(|| format!("write video '{}'", args.out.display()))?;
            eprintln!("wrote {} ({} bytes)", args.out.display(), data.len());
        }
        VideoArtifact::File { path, .. } => eprintln!("wrote {}", path.display()),
        VideoArtifact::Url(url) => println!("{url}"),
    }
    Ok(())
}

async fn cmd_remote(args: RemoteArgs) -> anyhow::Result<()> {
    let mut remote = match &args.config {
        Some(path) => match GeneratorConfig::from_path(path)?.strategy {
            StrategyConfig::Remote(remote) => remote,
            StrategyConfig::Local(_) => {
                anyhow::bail!("config '{}' does not select the remote strategy", path.display())
            }
        },
        None => RemoteConfig::default(),
    };
    if remote.token.is_empty() {
        remote.token = token_from_env()?;
    }

    let config = GeneratorConfig {
        strategy: StrategyConfig::Remote(remote),
    };
    let request = load_request(&args.clip, args.prompt.clone(), args.stabilized)?;
    let artifact = run(&config, &request, args.clip.timeout_secs).await?;

    match artifact.as_url() {
        Some(url) => println!("{url}"),
        None => anyhow::bail!("provider returned a non-URL artifact"),
    }
    Ok(())
}

fn token_from_env() -> anyhow::Result<Secret> {
    TOKEN_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .map(Secret::new)
        .with_context(|| format!("set {} (or {})", TOKEN_VARS[0], TOKEN_VARS[1]))
}

fn load_request(
    clip: &ClipArgs,
    prompt: Option<String>,
    stabilized: bool,
) -> anyhow::Result<GenerationRequest> {
    let bytes = std::fs::read(&clip.image)
        .with_context(|| format!("read image '{}'", clip.image.display()))?;
    let duration = DurationSecs::try_from(clip.duration)?;
    let style = MotionStyle::parse(&clip.style);
    if style == MotionStyle::Dynamic && !clip.style.trim().eq_ignore_ascii_case("dynamic") {
        tracing::warn!(requested = %clip.style, "unknown motion style, using dynamic");
    }

    let mut request = GenerationRequest::new(SourceImage::from_bytes(bytes), duration)
        .with_motion(style)
        .with_camera_stabilized(stabilized);
    request.prompt = prompt;
    Ok(request)
}

async fn run(
    config: &GeneratorConfig,
    request: &GenerationRequest,
    timeout_secs: Option<u64>,
) -> anyhow::Result<VideoArtifact> {
    let generator = Generator::from_config(config)?;
    let (handle, token) = CancelHandle::pair();
    let deadline = timeout_secs.map(Duration::from_secs);

    let work = generator.generate_with(request, &token, deadline);
    tokio::pin!(work);
    let result = tokio::select! {
        r = &mut work => r,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("interrupted, stopping");
            handle.cancel();
            work.await
        }
    };
    Ok(result?)
}
