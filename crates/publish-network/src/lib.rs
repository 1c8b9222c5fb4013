//! # publish-network
//!
//! 수집 서버 HTTP 어댑터.
//! `publish_core::ports::transport::MetricTransport`를 reqwest로 구현한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use publish_network::http_transport::HttpMetricTransport;
//!
//! let transport = Arc::new(HttpMetricTransport::from_config(&config)?);
//! let session = Session::new(agent, transport);
//! ```

pub mod http_transport;
pub mod user_agent;
