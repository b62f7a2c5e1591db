//! Local mock servers the integration tests point the probe at.

#![allow(dead_code)]

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

use rsmprobe::dns::{DNSPacket, DNSResource, DNSResourceClass, DNSResourceType, EdnsOpt};

pub type ReplyFn = dyn Fn(DNSPacket) -> DNSPacket + Send + Sync + 'static;

/// UDP nameserver answering every query through `reply`.
pub async fn spawn_udp_dns(
    reply: impl Fn(DNSPacket) -> DNSPacket + Send + Sync + 'static,
) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 65535];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                return;
            };

            if let Ok(query) = DNSPacket::parse(&buf[..len]) {
                let response = reply(query);
                let _ = socket.send_to(&response.to_wire(), peer).await;
            }
        }
    });

    addr
}

/// UDP nameserver that waits before answering, for RTT-limit tests.
pub async fn spawn_udp_dns_delayed(
    delay_ms: u64,
    reply: impl Fn(DNSPacket) -> DNSPacket + Send + Sync + 'static,
) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 65535];
        loop {
            let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                return;
            };

            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;

            if let Ok(query) = DNSPacket::parse(&buf[..len]) {
                let response = reply(query);
                let _ = socket.send_to(&response.to_wire(), peer).await;
            }
        }
    });

    addr
}

/// TCP nameserver with the 2-byte length framing.
pub async fn spawn_tcp_dns(
    reply: impl Fn(DNSPacket) -> DNSPacket + Send + Sync + 'static,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };

            let mut length_buf = [0u8; 2];
            if stream.read_exact(&mut length_buf).await.is_err() {
                continue;
            }

            let mut buf = vec![0u8; u16::from_be_bytes(length_buf) as usize];
            if stream.read_exact(&mut buf).await.is_err() {
                continue;
            }

            if let Ok(query) = DNSPacket::parse(&buf) {
                let wire = reply(query).to_wire();
                let _ = stream.write_all(&(wire.len() as u16).to_be_bytes()).await;
                let _ = stream.write_all(&wire).await;
                let _ = stream.flush().await;
            }
        }
    });

    addr
}

/// Port-43-style server that sends a fixed answer and closes.
pub async fn spawn_whois(answer: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };

            /* read the query line, then answer and hang up */
            let mut buf = [0u8; 512];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(answer.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    addr
}

/// Authoritative-style NXDOMAIN reply: AA set, question echoed, an NSID
/// option attached.
pub fn nxdomain_reply(query: DNSPacket, nsid: &[u8]) -> DNSPacket {
    let mut reply = DNSPacket::default();
    reply.header.id = query.header.id;
    reply.header.qr = true;
    reply.header.aa = true;
    reply.header.rcode = 3;
    reply.questions = query.questions;

    let mut opt = EdnsOpt::with_payload_size(4096);
    opt.add_option(3, nsid.to_vec());
    reply.add_edns(opt);

    reply
}

/// Recursive-resolver-style reply: RA set, A answers for A queries,
/// empty NOERROR otherwise.
pub fn resolver_reply(query: DNSPacket, a_records: &[[u8; 4]]) -> DNSPacket {
    let mut reply = DNSPacket::default();
    reply.header.id = query.header.id;
    reply.header.qr = true;
    reply.header.ra = true;

    if let Some(question) = query.questions.first() {
        if question.qtype == DNSResourceType::A {
            for addr in a_records {
                reply.answers.push(DNSResource {
                    labels: question.labels.clone(),
                    rtype: DNSResourceType::A,
                    rclass: DNSResourceClass::IN,
                    raw_class: 1,
                    ttl: 60,
                    rdata: addr.to_vec(),
                });
            }
        }
    }

    reply.questions = query.questions;
    reply
}

/// `SOA .` reply used by the connectivity checks, optionally with an
/// RRSIG next to the SOA.
pub fn soa_reply(query: DNSPacket, with_rrsig: bool) -> DNSPacket {
    let mut reply = DNSPacket::default();
    reply.header.id = query.header.id;
    reply.header.qr = true;
    reply.header.ra = true;

    /* SOA rdata: root mname, root rname, five counters */
    let mut soa_rdata = vec![0u8, 0u8];
    for value in [2026u32, 3600, 900, 86400, 300] {
        soa_rdata.extend_from_slice(&value.to_be_bytes());
    }

    reply.answers.push(DNSResource {
        labels: Vec::new(),
        rtype: DNSResourceType::SOA,
        rclass: DNSResourceClass::IN,
        raw_class: 1,
        ttl: 60,
        rdata: soa_rdata,
    });

    if with_rrsig {
        /* presence is what the check looks at, content is irrelevant */
        let mut rrsig_rdata = Vec::new();
        rrsig_rdata.extend_from_slice(&u16::from(DNSResourceType::SOA).to_be_bytes());
        rrsig_rdata.extend_from_slice(&[8, 0]);
        rrsig_rdata.extend_from_slice(&60u32.to_be_bytes());
        rrsig_rdata.extend_from_slice(&u32::MAX.to_be_bytes());
        rrsig_rdata.extend_from_slice(&0u32.to_be_bytes());
        rrsig_rdata.extend_from_slice(&12345u16.to_be_bytes());
        rrsig_rdata.push(0); /* root signer */
        rrsig_rdata.extend_from_slice(&[0xAB; 64]);

        reply.answers.push(DNSResource {
            labels: Vec::new(),
            rtype: DNSResourceType::RRSIG,
            rclass: DNSResourceClass::IN,
            raw_class: 1,
            ttl: 60,
            rdata: rrsig_rdata,
        });
    }

    reply.questions = query.questions;
    reply
}
