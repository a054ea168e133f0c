use std::net::IpAddr;

use anyhow::{Context, ensure};
use dns_parser::{Packet, RData, ResponseCode};
use pnet::packet::dns::{DnsClass, DnsType, DnsTypes, MutableDnsPacket, Opcode, Retcode};

pub const DNS_HDR_LEN: usize = 12;
pub const MAX_UDP_PAYLOAD: usize = 1232;
/// Size of the EDNS0 OPT pseudo-record appended to every query.
pub const OPT_RECORD_LEN: usize = 11;

const OPT_TYPE: u16 = 41;

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 255;

/// Record types the engine asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    A,
    Aaaa,
    Cname,
    Txt,
}

impl QueryType {
    fn as_dns_type(self) -> DnsType {
        match self {
            QueryType::A => DnsTypes::A,
            QueryType::Aaaa => DnsTypes::AAAA,
            QueryType::Cname => DnsTypes::CNAME,
            QueryType::Txt => DnsTypes::TXT,
        }
    }
}

/// Everything useful pulled out of a single DNS response.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub id: u16,
    pub nxdomain: bool,
    /// TC bit: the server cut the answer to fit a datagram.
    pub truncated: bool,
    pub addresses: Vec<IpAddr>,
    pub cnames: Vec<String>,
    pub txt: Vec<String>,
}

pub fn create_query_packet(name: &str, qtype: QueryType, id: u16) -> anyhow::Result<Vec<u8>> {
    let qname: Vec<u8> = encode_dns_name(name)?;
    let q_fixed_len: usize = 4;
    let total: usize = DNS_HDR_LEN + qname.len() + q_fixed_len + OPT_RECORD_LEN;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(1);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(1);
    }

    // The question section is written by hand, pnet only models the header.
    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + qname.len()].copy_from_slice(&qname);
    cursor += qname.len();

    let type_bytes: [u8; 2] = qtype.as_dns_type().0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&type_bytes);
    cursor += 2;

    let class_bytes: [u8; 2] = DnsClass(1).0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&class_bytes);
    cursor += 2;

    // EDNS0 OPT: root owner, advertised payload size in CLASS, zero TTL and RDLEN.
    buffer[cursor + 1..cursor + 3].copy_from_slice(&OPT_TYPE.to_be_bytes());
    buffer[cursor + 3..cursor + 5].copy_from_slice(&(MAX_UDP_PAYLOAD as u16).to_be_bytes());

    Ok(buffer)
}

/// Prefixes `packet` with its two-byte length for DNS over TCP.
pub fn frame_for_stream(packet: &[u8]) -> anyhow::Result<Vec<u8>> {
    let len: u16 = u16::try_from(packet.len()).context("DNS message too large for TCP")?;
    let mut framed: Vec<u8> = Vec::with_capacity(packet.len() + 2);
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(packet);
    Ok(framed)
}

/// Parses a response and collects A/AAAA, CNAME and TXT answers.
///
/// Non-answer sections are ignored, so a referral without answers comes back
/// as an empty [`DnsAnswer`] rather than an error.
pub fn parse_answer(payload: &[u8]) -> anyhow::Result<DnsAnswer> {
    let packet = Packet::parse(payload).context("failed to parse DNS response")?;
    ensure!(!packet.header.query, "packet is a query, not a response");

    let mut answer = DnsAnswer {
        id: packet.header.id,
        nxdomain: packet.header.response_code == ResponseCode::NameError,
        truncated: packet.header.truncated,
        ..DnsAnswer::default()
    };

    for record in &packet.answers {
        match &record.data {
            RData::A(a) => answer.addresses.push(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => answer.addresses.push(IpAddr::V6(aaaa.0)),
            RData::CNAME(cname) => answer.cnames.push(cname.0.to_string()),
            RData::TXT(txt) => {
                let joined: String = txt
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                    .collect();
                answer.txt.push(joined);
            }
            _ => {}
        }
    }

    Ok(answer)
}

fn encode_dns_name(name: &str) -> anyhow::Result<Vec<u8>> {
    let mut encoded: Vec<u8> = Vec::with_capacity(name.len() + 2);
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        ensure!(label.len() <= MAX_LABEL_LEN, "label '{label}' is too long");
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    ensure!(encoded.len() <= MAX_NAME_LEN, "name '{name}' is too long");
    Ok(encoded)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
