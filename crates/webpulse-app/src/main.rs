//! # webpulse-app
//!
//! WebPulse 바이너리 진입점.
//! 설정 로드, 로깅 초기화, 어댑터 와이어링, 기록된 트레이스 리플레이.

mod dry_run;
mod replay;
mod replay_host;
mod trace;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webpulse_core::config::AppConfig;
use webpulse_core::config_manager::ConfigManager;
use webpulse_core::event_bus::EventBus;
use webpulse_core::ports::storage::DurableStore;
use webpulse_core::ports::transport::TelemetryTransport;
use webpulse_network::HttpTelemetryTransport;
use webpulse_rum::{MemoryStore, RumHosts, RumPipeline};

use crate::dry_run::LoggingTransport;
use crate::replay_host::{FileStore, NoCacheWorker, ReplayPerformanceHost, ReplayPreloadHost};
use crate::trace::Trace;

/// 영속 저장소 파일 이름
const STORE_FILE_NAME: &str = "store.json";

/// 프리로드 워밍 요청 타임아웃
const PRELOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// WebPulse 클라이언트 성능/텔레메트리 파이프라인
#[derive(Parser, Debug)]
#[command(name = "webpulse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 샘플링 비율 오버라이드 (0.0 ~ 1.0)
    #[arg(long, global = true)]
    sample_rate: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 기록된 트레이스를 파이프라인으로 재생
    Replay {
        /// 트레이스 JSON 파일
        #[arg(long, short = 't')]
        trace: PathBuf,

        /// 텔레메트리 엔드포인트 (상대 경로면 페이지 URL 기준)
        #[arg(long, short = 'e')]
        endpoint: Option<String>,

        /// 전송하지 않고 페이로드를 로그로 출력
        #[arg(long)]
        dry_run: bool,

        /// 프리로드 힌트를 HTTP로 받아올 origin
        #[arg(long)]
        origin: Option<String>,

        /// 단계 사이 대기 없이 재생
        #[arg(long)]
        instant: bool,

        /// 사용자 ID를 파일에 저장하지 않음
        #[arg(long)]
        ephemeral: bool,
    },
    /// 적용될 설정 출력
    Config,
}

/// 설정 로드 (파일 + CLI 오버라이드)
fn load_config(args: &Args) -> Result<(AppConfig, PathBuf)> {
    let manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone())?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.get();

    if let Some(rate) = args.sample_rate {
        config.telemetry.sample_rate = rate;
    }
    if let Command::Replay {
        endpoint: Some(endpoint),
        ..
    } = &args.command
    {
        config.telemetry.endpoint = endpoint.clone();
    }

    config
        .validate()
        .map_err(|e| anyhow!("설정 검증 실패: {e}"))?;
    Ok((config, manager.config_path().to_path_buf()))
}

/// 사용자 ID 영속 저장소 (데이터 디렉토리 사용 불가 시 메모리)
fn open_store(ephemeral: bool) -> Arc<dyn DurableStore> {
    if ephemeral {
        return Arc::new(MemoryStore::new());
    }
    let opened =
        ConfigManager::data_dir().and_then(|dir| FileStore::open(dir.join(STORE_FILE_NAME)));
    match opened {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("영속 저장소 열기 실패, 메모리 저장소 사용: {e}");
            Arc::new(MemoryStore::new())
        }
    }
}

struct ReplayArgs {
    trace: PathBuf,
    dry_run: bool,
    origin: Option<String>,
    instant: bool,
    ephemeral: bool,
}

async fn run_replay(config: AppConfig, args: ReplayArgs) -> Result<()> {
    let trace = Trace::from_path(&args.trace)?;
    let device = trace.device_or(args.origin.as_deref());
    info!(
        "트레이스 로드: {} ({}단계, 엔트리 {}개)",
        args.trace.display(),
        trace.steps.len(),
        trace.entry_count()
    );

    let dry_run = args.dry_run.then(|| Arc::new(LoggingTransport::default()));
    let transport: Arc<dyn TelemetryTransport> = match &dry_run {
        Some(logging) => {
            info!("dry-run: 텔레메트리를 전송하지 않고 로그로 출력");
            logging.clone()
        }
        None => {
            info!("텔레메트리 엔드포인트: {}", config.telemetry.endpoint);
            Arc::new(HttpTelemetryTransport::with_default_timeout(&device.url)?)
        }
    };

    let performance = Arc::new(ReplayPerformanceHost::new(trace.supports.clone()));
    let hosts = RumHosts {
        performance: performance.clone(),
        transport,
        preload: Arc::new(ReplayPreloadHost::new(
            args.origin.as_deref(),
            device.connection.clone(),
            PRELOAD_TIMEOUT,
        )?),
        cache_worker: Arc::new(NoCacheWorker),
        store: open_store(args.ephemeral),
    };

    let pipeline = RumPipeline::new(config, hosts, device, EventBus::default())?;
    pipeline.start().await;

    let counts = tokio::select! {
        counts = replay::drive(&pipeline, &performance, &trace, args.instant) => counts,
        _ = tokio::signal::ctrl_c() => {
            warn!("Ctrl+C 수신, 재생 중단");
            replay::ReplayCounts::default()
        }
    };

    pipeline.shutdown().await;
    if let Some(logging) = &dry_run {
        info!("dry-run 페이로드 {}개 출력", logging.payload_count());
    }

    let report = replay::report(&pipeline, counts);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // tracing 초기화
    let log_filter = format!(
        "webpulse={level},webpulse_app={level},webpulse_core={level},webpulse_monitor={level},webpulse_network={level},webpulse_preload={level},webpulse_cache={level},webpulse_rum={level}",
        level = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let (config, config_path) = load_config(&args)?;

    match args.command {
        Command::Config => {
            println!("# {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Replay {
            trace,
            dry_run,
            origin,
            instant,
            ephemeral,
            ..
        } => {
            info!("WebPulse 리플레이 시작");
            let result = run_replay(
                config,
                ReplayArgs {
                    trace,
                    dry_run,
                    origin,
                    instant,
                    ephemeral,
                },
            )
            .await;
            info!("WebPulse 리플레이 종료");
            result
        }
    }
}
