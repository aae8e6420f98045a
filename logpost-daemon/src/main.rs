use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use logpost_relay::RelayPipelineBuilder;

mod cli;
mod logging;
mod metrics_server;

/// 파이프라인/설정 구성 실패
const EXIT_CONFIG: u8 = 2;
/// 예기치 않은 런타임 실패
const EXIT_RUNTIME: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::DaemonCli::parse();

    // 설정 로드 — 로깅 초기화 전이므로 stderr로 보고
    let mut config = match logpost_core::load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // CLI 오버라이드 적용
    if let Some(level) = &args.log_level {
        config.service.log_level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.service.log_format = format.clone();
    }

    if args.validate {
        println!("configuration OK: {}", args.config.display());
        println!("  inputs:       {}", config.inputs.len());
        println!("  transforms:   {}", config.transforms.len());
        println!("  filters:      {}", config.filters.len());
        println!("  destinations: {}", config.destinations.len());
        return ExitCode::SUCCESS;
    }

    // 로깅 초기화
    if let Err(e) = logging::init_tracing(&config.service) {
        eprintln!("error: {e}");
        return ExitCode::from(EXIT_CONFIG);
    }

    info!(config_file = %args.config.display(), "logpost-daemon starting");

    let cancel = CancellationToken::new();

    // 관측 엔드포인트 기동
    let mut endpoint_task = None;
    if config.service.metrics.enabled {
        match metrics_server::start_observation_endpoint(&config.service.metrics, cancel.clone())
            .await
        {
            Ok(task) => endpoint_task = Some(task),
            Err(e) if config.service.metrics.required => {
                error!(error = %e, "failed to start observation endpoint");
                return ExitCode::from(EXIT_RUNTIME);
            }
            Err(e) => {
                warn!(error = %e, "observation endpoint disabled after bind failure");
            }
        }
    }

    // 파이프라인 구성 — 구성 실패는 종료 코드 2
    let mut pipeline = match RelayPipelineBuilder::new(config)
        .cancel_token(cancel.clone())
        .build()
    {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "pipeline construction failed");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = pipeline.start().await {
        error!(error = %e, "failed to start pipeline");
        cancel.cancel();
        return ExitCode::from(EXIT_RUNTIME);
    }

    // 종료 시그널 대기
    match wait_for_shutdown_signal().await {
        Ok(signal) => info!(signal, "shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to install signal handlers");
            cancel.cancel();
            let _ = pipeline.shutdown().await;
            return ExitCode::from(EXIT_RUNTIME);
        }
    }

    // 우아한 종료: 수신 중단 -> 드레인 -> 송신기/엔드포인트 정리
    cancel.cancel();
    if let Err(e) = pipeline.shutdown().await {
        error!(error = %e, "pipeline shutdown failed");
        return ExitCode::from(EXIT_RUNTIME);
    }
    if let Some(task) = endpoint_task {
        let _ = task.await;
    }

    info!("logpost-daemon shut down");
    ExitCode::SUCCESS
}

/// SIGTERM 또는 SIGINT를 기다립니다.
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
