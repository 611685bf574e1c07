//! Round-robin pool of multiplexed Redis connections for the query service.
//! Same shape as [`crate::wip_common_rs::clients::async_weather_client::ConnectionPool`]'s
//! UDP socket pool, adapted to a resource that needs an explicit handshake.

use redis::aio::MultiplexedConnection;
use redis::Client;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::wip_common_rs::packet::core::{BitFieldError, WipResult};

pub struct RedisPool {
    connections: Vec<MultiplexedConnection>,
    next: Arc<Mutex<usize>>,
}

impl RedisPool {
    pub async fn new(redis_url: &str, pool_size: usize) -> WipResult<Self> {
        let client = Client::open(redis_url).map_err(|e| BitFieldError::new(format!("invalid redis url {redis_url:?}: {e}")))?;
        let mut connections = Vec::with_capacity(pool_size.max(1));
        for _ in 0..pool_size.max(1) {
            let conn = client
                .get_multiplexed_async_connection()
                .await
                .map_err(|e| BitFieldError::new(format!("failed to connect to redis at {redis_url:?}: {e}")))?;
            connections.push(conn);
        }
        Ok(Self { connections, next: Arc::new(Mutex::new(0)) })
    }

    /// Hands out a clone of the next connection in rotation. `MultiplexedConnection`
    /// is itself a cheap, thread-safe handle, so cloning it is the checkout.
    pub async fn checkout(&self) -> MultiplexedConnection {
        let mut index = self.next.lock().await;
        let conn = self.connections[*index].clone();
        *index = (*index + 1) % self.connections.len();
        conn
    }
}
