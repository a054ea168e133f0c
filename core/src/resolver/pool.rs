//! Rotating upstream resolvers.
//!
//! Every call picks one upstream uniformly at random, so load and
//! fingerprint spread across the pool. There is no per-name stickiness and
//! no retry: a timeout is reported to the caller, who treats it as absence.
//! The one exception is a truncated datagram answer, which is asked again
//! over TCP on the same upstream.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::rngs::StdRng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tracing::trace;

use subscratch_protocols::dns::{self, DnsAnswer, MAX_UDP_PAYLOAD, QueryType};

use super::{RecordLookup, Resolution, Resolve, ResolveError, ResolverId};

pub const DNS_PORT: u16 = 53;
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

const PUBLIC_RESOLVERS: &[(Ipv4Addr, &str)] = &[
    (Ipv4Addr::new(8, 8, 8, 8), "Google"),
    (Ipv4Addr::new(8, 8, 4, 4), "Google-2"),
    (Ipv4Addr::new(1, 1, 1, 1), "Cloudflare"),
    (Ipv4Addr::new(1, 0, 0, 1), "Cloudflare-2"),
    (Ipv4Addr::new(9, 9, 9, 9), "Quad9"),
    (Ipv4Addr::new(149, 112, 112, 112), "Quad9-2"),
    (Ipv4Addr::new(208, 67, 222, 222), "OpenDNS"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub addr: SocketAddr,
    pub name: String,
}

impl Upstream {
    pub fn new(addr: SocketAddr, name: impl Into<String>) -> Self {
        Self {
            addr,
            name: name.into(),
        }
    }

    pub fn id(&self) -> ResolverId {
        ResolverId::Upstream {
            addr: self.addr,
            name: self.name.clone(),
        }
    }
}

/// The well-known public resolvers the pool rotates through by default.
pub fn default_upstreams() -> Vec<Upstream> {
    PUBLIC_RESOLVERS
        .iter()
        .map(|(ip, name)| Upstream::new(SocketAddr::new(IpAddr::V4(*ip), DNS_PORT), *name))
        .collect()
}

pub struct ResolverPool {
    upstreams: Vec<Upstream>,
    rng: Mutex<StdRng>,
    timeout: Duration,
    offline: bool,
}

impl ResolverPool {
    pub fn new(upstreams: Vec<Upstream>, rng: StdRng, offline: bool) -> Self {
        Self {
            upstreams,
            rng: Mutex::new(rng),
            timeout: QUERY_TIMEOUT,
            offline,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn upstreams(&self) -> &[Upstream] {
        &self.upstreams
    }

    /// Picks an upstream and a transaction id.
    ///
    /// Also the single offline gate: nothing below this point runs when the
    /// pool is offline.
    fn pick(&self) -> Result<(&Upstream, u16), ResolveError> {
        if self.offline {
            return Err(ResolveError::Offline);
        }
        if self.upstreams.is_empty() {
            return Err(ResolveError::NoUpstream);
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let idx: usize = rng.random_range(0..self.upstreams.len());
        let id: u16 = rng.random();
        Ok((&self.upstreams[idx], id))
    }

    async fn query(
        &self,
        upstream: &Upstream,
        name: &str,
        qtype: QueryType,
        id: u16,
    ) -> Result<DnsAnswer, ResolveError> {
        tokio::time::timeout(self.timeout, exchange(upstream.addr, name, qtype, id))
            .await
            .map_err(|_| ResolveError::Timeout {
                resolver: upstream.addr.to_string(),
            })?
    }
}

#[async_trait]
impl Resolve for ResolverPool {
    async fn resolve(&self, name: &str) -> Result<Resolution, ResolveError> {
        let (upstream, id) = self.pick()?;
        trace!("resolving {name} via {}", upstream.name);

        let (v4, v6) = tokio::join!(
            self.query(upstream, name, QueryType::A, id),
            self.query(upstream, name, QueryType::Aaaa, id.wrapping_add(1)),
        );

        let addresses = match (v4, v6) {
            (Err(err), Err(_)) => return Err(err),
            (v4, v6) => super::dedup_addresses(
                v4.into_iter()
                    .chain(v6)
                    .flat_map(|answer| answer.addresses),
            ),
        };

        Ok(Resolution {
            name: name.to_string(),
            addresses,
            resolver: upstream.id(),
        })
    }
}

#[async_trait]
impl RecordLookup for ResolverPool {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, ResolveError> {
        let (upstream, id) = self.pick()?;
        let answer = self.query(upstream, name, QueryType::Txt, id).await?;
        Ok(answer.txt)
    }

    async fn lookup_cname(&self, name: &str) -> Result<Option<String>, ResolveError> {
        let (upstream, id) = self.pick()?;
        let answer = self.query(upstream, name, QueryType::Cname, id).await?;
        Ok(answer.cnames.into_iter().next())
    }
}

/// Sends one query and waits for the response carrying the same id.
///
/// Datagrams that do not parse or carry another id are ignored; the caller's
/// timeout bounds the wait, including the TCP retry after a truncated answer.
async fn exchange(
    server: SocketAddr,
    name: &str,
    qtype: QueryType,
    id: u16,
) -> Result<DnsAnswer, ResolveError> {
    let packet: Vec<u8> = dns::create_query_packet(name, qtype, id)
        .map_err(|e| ResolveError::Protocol(e.to_string()))?;

    let bind_addr: SocketAddr = match server {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    };
    let socket = UdpSocket::bind(bind_addr).await?;
    socket.connect(server).await?;
    socket.send(&packet).await?;

    let mut buffer: Vec<u8> = vec![0u8; MAX_UDP_PAYLOAD];
    let answer: DnsAnswer = loop {
        let len: usize = socket.recv(&mut buffer).await?;
        match dns::parse_answer(&buffer[..len]) {
            Ok(answer) if answer.id == id => break answer,
            _ => continue,
        }
    };

    if !answer.truncated {
        return Ok(answer);
    }
    trace!("{name}: truncated answer from {server}, retrying over TCP");
    exchange_stream(server, &packet, id).await
}

/// One query over TCP, framed with the two-byte length prefix.
async fn exchange_stream(
    server: SocketAddr,
    packet: &[u8],
    id: u16,
) -> Result<DnsAnswer, ResolveError> {
    let framed: Vec<u8> =
        dns::frame_for_stream(packet).map_err(|e| ResolveError::Protocol(e.to_string()))?;

    let mut stream = TcpStream::connect(server).await?;
    stream.write_all(&framed).await?;

    let len: usize = stream.read_u16().await? as usize;
    let mut buffer: Vec<u8> = vec![0u8; len];
    stream.read_exact(&mut buffer).await?;

    let answer: DnsAnswer =
        dns::parse_answer(&buffer).map_err(|e| ResolveError::Protocol(e.to_string()))?;
    if answer.id != id {
        return Err(ResolveError::Protocol(format!(
            "TCP answer id {} does not match query id {id}",
            answer.id
        )));
    }
    if answer.truncated {
        return Err(ResolveError::Protocol("answer truncated over TCP".to_string()));
    }
    Ok(answer)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
