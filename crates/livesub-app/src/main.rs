//! # livesub-app
//!
//! livesub 실행 파일 진입점.
//! 설정 로드, 어댑터 와이어링(DI), 번역 파이프라인 구동, 라이프사이클 관리.

mod lifecycle;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use livesub_core::config::{AppConfig, SubtitleRenderer};
use livesub_core::error::CoreError;
use livesub_core::config_manager::ConfigManager;
use livesub_core::ports::frame_source::FrameSource;
use livesub_core::ports::subtitle_sink::SubtitleSink;
use livesub_core::ports::text_extractor::TextExtractor;
use livesub_core::ports::translator::Translator;
use livesub_network::gemini_translator::GeminiTranslator;
use livesub_overlay::{ChannelSubtitleSink, LogSubtitleSink, TerminalOverlay};
use livesub_pipeline::{PipelinePorts, TranslationPipeline};
use livesub_vision::capture::ScreenCapture;
use livesub_vision::local_text_extractor::LocalTextExtractor;

use crate::lifecycle::LifecycleManager;

/// API 키 환경 변수 (앞쪽이 우선)
const API_KEY_ENV_VARS: [&str; 2] = ["LIVESUB_GEMINI_API_KEY", "GEMINI_API_KEY"];

/// 자막 렌더러 선택
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RendererArg {
    Terminal,
    Log,
}

impl From<RendererArg> for SubtitleRenderer {
    fn from(arg: RendererArg) -> Self {
        match arg {
            RendererArg::Terminal => SubtitleRenderer::Terminal,
            RendererArg::Log => SubtitleRenderer::Log,
        }
    }
}

/// livesub: 실시간 화면 대사 번역 자막
///
/// 화면의 대사 영역을 주기적으로 OCR 하고, 바뀐 대사만 번역해 자막으로 표시한다.
#[derive(Parser, Debug)]
#[command(name = "livesub")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 번역 대상 언어 (예: "French")
    #[arg(long, short = 't')]
    target_language: Option<String>,

    /// OCR 텍스트 대신 장면 이미지를 번역
    #[arg(long)]
    image_mode: bool,

    /// 이전 대화를 문맥으로 유지
    #[arg(long)]
    chat_mode: bool,

    /// 캡처할 모니터 인덱스
    #[arg(long, short = 'm')]
    monitor: Option<usize>,

    /// 자막 렌더러
    #[arg(long, value_enum)]
    renderer: Option<RendererArg>,

    /// 사이클 간격 (밀리초)
    #[arg(long)]
    poll_interval: Option<u64>,

    /// 캡처 중 오버레이 숨김
    #[arg(long)]
    hide_overlay: bool,

    /// 연결된 모니터 수 출력 후 종료
    #[arg(long)]
    list_monitors: bool,
}

/// 설정 로드 (CLI 경로가 있으면 우선, 없으면 플랫폼 기본 경로)
fn load_config_manager(cli_path: Option<&PathBuf>) -> Result<ConfigManager, CoreError> {
    match cli_path {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
}

/// 환경 변수에서 API 키 조회 (빈 값은 무시)
fn api_key_from_env<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// CLI 인자로 이번 실행의 설정 덮어쓰기 (파일에는 저장하지 않음)
fn apply_overrides(args: &Args, config: &mut AppConfig) {
    if let Some(language) = &args.target_language {
        config.translation.target_language = language.clone();
    }
    if args.image_mode {
        config.translation.image_input = true;
    }
    if args.chat_mode {
        config.translation.chat_mode = true;
    }
    if let Some(index) = args.monitor {
        config.capture.monitor_index = Some(index);
    }
    if let Some(renderer) = args.renderer {
        config.subtitle.renderer = renderer.into();
    }
    if let Some(ms) = args.poll_interval {
        config.detection.poll_interval_ms = ms;
    }
    if args.hide_overlay {
        config.capture.hide_overlay_during_capture = true;
    }
}

/// 설정에 맞는 자막 싱크 생성: 터미널 렌더러는 별도 태스크로 실행
fn build_sink(config: &AppConfig) -> (Arc<dyn SubtitleSink>, Option<JoinHandle<()>>) {
    match config.subtitle.renderer {
        SubtitleRenderer::Terminal => {
            let (sink, rx) = ChannelSubtitleSink::new();
            let overlay = TerminalOverlay::new(std::io::stdout(), config.subtitle.wrap_width);
            let handle = tokio::spawn(async move {
                overlay.run(rx).await;
            });
            (Arc::new(sink), Some(handle))
        }
        SubtitleRenderer::Log => (Arc::new(LogSubtitleSink::new()), None),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 로깅 초기화: 터미널 자막과 섞이지 않도록 stderr로 출력
    let log_filter = format!(
        "livesub={},livesub_app={},livesub_core={},livesub_vision={},livesub_network={},livesub_pipeline={},livesub_overlay={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.list_monitors {
        let count = ScreenCapture::monitor_count().map_err(|e| anyhow!("모니터 조회 실패: {e}"))?;
        println!("모니터 {count}개");
        return Ok(());
    }

    info!("livesub v{} 시작", env!("CARGO_PKG_VERSION"));

    // 설정 로드
    let config_manager =
        load_config_manager(args.config.as_ref()).map_err(|e| anyhow!("설정 로드 실패: {e}"))?;
    info!("설정 파일: {:?}", config_manager.config_path());

    let mut config = config_manager.get();
    if let Some(key) = api_key_from_env(|name| std::env::var(name).ok()) {
        config.translation.api_key = key;
    }
    apply_overrides(&args, &mut config);
    config.validate().map_err(|e| anyhow!("{e}"))?;

    // 어댑터 생성
    let frame_source: Arc<dyn FrameSource> =
        Arc::new(ScreenCapture::new(config.capture.monitor_index));
    let text_extractor: Arc<dyn TextExtractor> = Arc::new(LocalTextExtractor::new(&config.ocr));
    let translator: Arc<dyn Translator> = Arc::new(
        GeminiTranslator::new(&config.translation)
            .map_err(|e| anyhow!("번역 백엔드 초기화 실패: {e}"))?,
    );
    let (sink, renderer) = build_sink(&config);

    info!(
        frame_source = frame_source.source_name(),
        ocr = text_extractor.provider_name(),
        translator = translator.provider_name(),
        renderer = ?config.subtitle.renderer,
        "어댑터 와이어링 완료"
    );

    let ports = PipelinePorts {
        frame_source,
        text_extractor,
        translator,
        sink,
    };
    let mut pipeline = TranslationPipeline::new(&config, ports)
        .map_err(|e| anyhow!("파이프라인 생성 실패: {e}"))?;

    // 라이프사이클
    let lifecycle = Arc::new(LifecycleManager::new());
    let shutdown_rx = lifecycle.subscribe();
    let signal_lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        signal_lifecycle.wait_for_signal().await;
    });

    info!("livesub 실행 중 (Ctrl+C로 종료)");
    pipeline.run(shutdown_rx).await;

    // 파이프라인 종료 시 Stop 명령이 나가므로 렌더러도 곧 끝난다
    if let Some(handle) = renderer {
        if let Err(e) = handle.await {
            warn!("자막 렌더러 태스크 비정상 종료: {e}");
        }
    }

    info!(shutdown = lifecycle.is_shutting_down(), "livesub 종료");
    Ok(())
}
