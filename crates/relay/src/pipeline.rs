//! 파이프라인 슈퍼바이저 — 수신/라우팅/변형/송신의 전체 흐름을 관리합니다.
//!
//! # 내부 아키텍처
//! ```text
//! UDP/TCP inputs -> Dispatcher(parse -> route -> transform) -> per-destination queues -> senders
//! ```
//!
//! 레코드는 하나의 파이프라인 통과 동안만 존재합니다. 수신 컨텍스트
//! 안에서는 도착 순서대로 처리되고, destination 큐가 그 순서를 송신까지
//! 보존합니다. 규칙/변형/대상 목록은 실행 중 불변이며, 설정 변경은
//! 새 파이프라인을 만들어 교체하는 방식으로만 이루어집니다.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::{counter, histogram};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use logpost_core::{Action, Config, Protocol, SyslogRecord, metrics as m};

use crate::error::RelayError;
use crate::input::{TcpInput, UdpInput};
use crate::output::{SenderHandle, spawn_sender};
use crate::parser;
use crate::route::Router;
use crate::transform::Transformer;

/// 종료 시 모든 컨텍스트가 반환해야 하는 유예 시간
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// 파이프라인 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Initialized,
    Running,
    Stopped,
}

/// 파이프라인 내부 카운터 — 메트릭 레코더와 무관하게 항상 집계됩니다.
///
/// 레코드마다 정확히 하나의 종결 카운터(destination별 forwarded 또는
/// 전체 dropped 1회)가 증가합니다.
#[derive(Debug, Default)]
pub struct RelayStats {
    received: AtomicU64,
    forwarded: AtomicU64,
    parse_errors: AtomicU64,
    dropped_filter: AtomicU64,
    dropped_no_match: AtomicU64,
    dropped_parse_error: AtomicU64,
    dropped_send_failed: AtomicU64,
}

impl RelayStats {
    /// 파싱에 성공해 파이프라인에 진입한 레코드 수
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// destination별 송신 성공 횟수의 합
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// 파싱 실패 수
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    /// drop 필터에 의한 폐기 수
    pub fn dropped_filter(&self) -> u64 {
        self.dropped_filter.load(Ordering::Relaxed)
    }

    /// 매칭 실패에 의한 폐기 수
    pub fn dropped_no_match(&self) -> u64 {
        self.dropped_no_match.load(Ordering::Relaxed)
    }

    /// 송신 실패에 의한 폐기 수
    pub fn dropped_send_failed(&self) -> u64 {
        self.dropped_send_failed.load(Ordering::Relaxed)
    }

    /// 모든 사유를 합한 폐기 수 (parse_error 포함)
    pub fn dropped_total(&self) -> u64 {
        self.dropped_filter.load(Ordering::Relaxed)
            + self.dropped_no_match.load(Ordering::Relaxed)
            + self.dropped_parse_error.load(Ordering::Relaxed)
            + self.dropped_send_failed.load(Ordering::Relaxed)
    }

    pub(crate) fn note_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        self.dropped_parse_error.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_dropped_filter(&self) {
        self.dropped_filter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_dropped_no_match(&self) {
        self.dropped_no_match.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_send_failed(&self) {
        self.dropped_send_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// 수신 컨텍스트가 호출하는 메시지 처리기: 파싱 → 라우팅 → 변형 → 분배
///
/// 모든 입력이 같은 Dispatcher를 공유하며, 내부 상태는 읽기 전용이거나
/// 동시 증가에 안전한 카운터뿐입니다.
pub struct Dispatcher {
    router: Router,
    transformer: Transformer,
    outputs: HashMap<String, SenderHandle>,
    stats: Arc<RelayStats>,
}

impl Dispatcher {
    pub(crate) fn new(
        router: Router,
        transformer: Transformer,
        outputs: HashMap<String, SenderHandle>,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            router,
            transformer,
            outputs,
            stats,
        }
    }

    /// 프레이밍이 끝난 메시지 한 건을 처리합니다.
    ///
    /// 파싱 실패는 여기서 계수되고 레코드는 라우터로 전달되지 않습니다.
    pub async fn handle_raw(&self, data: &[u8], protocol: Protocol) {
        let record = match parser::parse(data) {
            Ok(record) => record,
            Err(e) => {
                debug!(protocol = protocol.as_str(), error = %e, "failed to parse message");
                self.stats.note_parse_error();
                counter!(
                    m::MESSAGES_PARSE_ERRORS_TOTAL,
                    m::LABEL_PROTOCOL => protocol.as_str()
                )
                .increment(1);
                counter!(
                    m::MESSAGES_DROPPED_TOTAL,
                    m::LABEL_REASON => m::REASON_PARSE_ERROR
                )
                .increment(1);
                return;
            }
        };

        self.stats.note_received();
        counter!(
            m::MESSAGES_RECEIVED_TOTAL,
            m::LABEL_PROTOCOL => protocol.as_str(),
            m::LABEL_FACILITY => record.facility.as_str(),
            m::LABEL_SEVERITY => record.severity.as_str()
        )
        .increment(1);

        self.handle_record(record).await;
    }

    /// 파싱된 레코드를 라우팅하고 선택된 destination에 분배합니다.
    async fn handle_record(&self, mut record: SyslogRecord) {
        let started = std::time::Instant::now();
        let decision = self.router.route(&record);
        let filter_label = decision
            .rule_name
            .clone()
            .unwrap_or_else(|| "none".to_owned());
        histogram!(m::PROCESSING_LATENCY_SECONDS, m::LABEL_FILTER => filter_label)
            .record(started.elapsed().as_secs_f64());

        if !decision.matched {
            debug!(record = %record, "no filter matched, dropping");
            self.stats.note_dropped_no_match();
            counter!(m::MESSAGES_DROPPED_TOTAL, m::LABEL_REASON => m::REASON_NO_MATCH)
                .increment(1);
            return;
        }

        if decision.action == Action::Drop {
            debug!(filter = ?decision.rule_name, record = %record, "dropped by filter");
            self.stats.note_dropped_filter();
            counter!(m::MESSAGES_DROPPED_TOTAL, m::LABEL_REASON => m::REASON_FILTER).increment(1);
            return;
        }

        if !decision.transforms.is_empty() {
            self.transformer.apply(&mut record, &decision.transforms);
        }

        for destination in &decision.destinations {
            if let Some(handle) = self.outputs.get(destination) {
                handle.enqueue(record.clone()).await;
            }
        }
    }
}

/// 릴레이 파이프라인
///
/// 검증된 설정 스냅샷으로부터 리스너/송신기/라우터/트랜스포머를
/// 구성하고 생명주기를 관리합니다.
///
/// # 사용 예시
/// ```ignore
/// let mut pipeline = RelayPipelineBuilder::new(config).build()?;
/// pipeline.start().await?;
/// // ... SIGTERM 대기 ...
/// pipeline.cancel_token().cancel();
/// pipeline.shutdown().await?;
/// ```
pub struct RelayPipeline {
    config: Config,
    state: PipelineState,
    router: Option<Router>,
    transformer: Option<Transformer>,
    dispatcher: Option<Arc<Dispatcher>>,
    stats: Arc<RelayStats>,
    cancel: CancellationToken,
    input_addrs: Vec<(String, SocketAddr)>,
    input_tasks: Vec<JoinHandle<()>>,
    sender_tasks: Vec<JoinHandle<()>>,
}

impl RelayPipeline {
    /// 현재 상태 이름을 반환합니다.
    pub fn state_name(&self) -> &'static str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 내부 카운터에 대한 참조를 반환합니다.
    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// 종료 신호용 취소 토큰을 반환합니다.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 실제로 바인드된 입력 주소 목록을 반환합니다 (start 이후 유효).
    pub fn input_addrs(&self) -> &[(String, SocketAddr)] {
        &self.input_addrs
    }

    /// 송신기와 리스너를 기동합니다.
    ///
    /// 송신기를 먼저 띄워 수신 즉시 분배가 가능하게 한 뒤 리스너를
    /// 바인드합니다. 바인드 실패는 시작 실패이며 이미 띄운 컨텍스트는
    /// 취소됩니다.
    pub async fn start(&mut self) -> Result<(), RelayError> {
        if self.state == PipelineState::Running {
            return Err(RelayError::State("pipeline already running"));
        }

        info!("starting relay pipeline");

        let mut outputs = HashMap::with_capacity(self.config.destinations.len());
        for dest in &self.config.destinations {
            let (handle, task) =
                spawn_sender(dest.clone(), self.cancel.clone(), Arc::clone(&self.stats));
            outputs.insert(dest.name.clone(), handle);
            self.sender_tasks.push(task);
        }

        let router = self
            .router
            .take()
            .ok_or(RelayError::State("pipeline cannot be restarted"))?;
        let transformer = self
            .transformer
            .take()
            .ok_or(RelayError::State("pipeline cannot be restarted"))?;
        let dispatcher = Arc::new(Dispatcher::new(
            router,
            transformer,
            outputs,
            Arc::clone(&self.stats),
        ));
        self.dispatcher = Some(Arc::clone(&dispatcher));

        for input in &self.config.inputs {
            let bound = match input.protocol {
                Protocol::Udp => {
                    let listener =
                        UdpInput::bind(input, Arc::clone(&dispatcher), self.cancel.clone()).await;
                    match listener {
                        Ok(listener) => {
                            let addr = listener.local_addr()?;
                            let task = tokio::spawn(async move {
                                if let Err(e) = listener.run().await {
                                    tracing::error!(error = %e, "UDP listener terminated");
                                }
                            });
                            Ok((addr, task))
                        }
                        Err(e) => Err(e),
                    }
                }
                Protocol::Tcp => {
                    let listener =
                        TcpInput::bind(input, Arc::clone(&dispatcher), self.cancel.clone()).await;
                    match listener {
                        Ok(listener) => {
                            let addr = listener.local_addr()?;
                            let task = tokio::spawn(async move {
                                if let Err(e) = listener.run().await {
                                    tracing::error!(error = %e, "TCP listener terminated");
                                }
                            });
                            Ok((addr, task))
                        }
                        Err(e) => Err(e),
                    }
                }
            };

            match bound {
                Ok((addr, task)) => {
                    self.input_addrs.push((input.name.clone(), addr));
                    self.input_tasks.push(task);
                }
                Err(e) => {
                    self.cancel.cancel();
                    return Err(e);
                }
            }
        }

        self.state = PipelineState::Running;
        info!(
            inputs = self.config.inputs.len(),
            destinations = self.config.destinations.len(),
            filters = self.config.filters.len(),
            "relay pipeline started"
        );
        Ok(())
    }

    /// 파이프라인을 정지합니다.
    ///
    /// 1. 리스너에 취소를 전파해 새 수신을 멈추고,
    /// 2. 처리 중인 레코드가 라우팅을 마치도록 리스너 종료를 기다린 뒤,
    /// 3. 송신 큐를 닫아 남은 레코드를 단일 시도로 드레인합니다.
    ///
    /// 유예 시간이 지나면 남은 태스크는 중단(abort)됩니다.
    pub async fn shutdown(&mut self) -> Result<(), RelayError> {
        if self.state != PipelineState::Running {
            return Err(RelayError::State("pipeline is not running"));
        }

        info!("stopping relay pipeline");
        self.cancel.cancel();

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        join_with_deadline(self.input_tasks.drain(..).collect(), deadline).await;

        // 마지막 Dispatcher 참조를 버려 송신 큐를 닫는다
        self.dispatcher = None;
        join_with_deadline(self.sender_tasks.drain(..).collect(), deadline).await;

        self.state = PipelineState::Stopped;
        info!("relay pipeline stopped");
        Ok(())
    }
}

/// 유예 기한 안에서 태스크들을 기다리고, 넘긴 태스크는 중단합니다.
async fn join_with_deadline(tasks: Vec<JoinHandle<()>>, deadline: Instant) {
    for mut task in tasks {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if timeout(remaining, &mut task).await.is_err() {
            task.abort();
        }
    }
}

/// 릴레이 파이프라인 빌더
pub struct RelayPipelineBuilder {
    config: Config,
    cancel: CancellationToken,
}

impl RelayPipelineBuilder {
    /// 설정 스냅샷으로 새 빌더를 생성합니다.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// 외부에서 관리하는 취소 토큰을 연결합니다.
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 설정을 검증하고 파이프라인을 구성합니다.
    ///
    /// 이름 중복, 알 수 없는 destination/transform 참조, 잘못된
    /// 정규식은 모두 여기서 실패합니다. 소켓은 아직 열지 않습니다.
    pub fn build(self) -> Result<RelayPipeline, RelayError> {
        self.config.validate().map_err(RelayError::Build)?;

        let router = Router::new(&self.config.filters)?;
        let transformer = Transformer::new(&self.config.transforms)?;
        for filter in &self.config.filters {
            transformer.resolve(&filter.name, &filter.transforms)?;
        }

        Ok(RelayPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            router: Some(router),
            transformer: Some(transformer),
            dispatcher: None,
            stats: Arc::new(RelayStats::default()),
            cancel: self.cancel,
            input_addrs: Vec::new(),
            input_tasks: Vec::new(),
            sender_tasks: Vec::new(),
        })
    }
}
