//! In-process SNMPv2c agent answering GETBULK over UDP.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use dot1q_discovery::pdu::{GetBulkRequest, Message, Pdu, Response};
use dot1q_discovery::{Oid, Value, VarBind};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

pub struct FakeAgent {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl FakeAgent {
    /// Serve `mib` on a loopback port, answering requests for `community`.
    pub async fn start(mib: BTreeMap<Oid, Value>, community: &'static [u8]) -> Self {
        Self::start_dropping(mib, community, 0).await
    }

    /// Like [`start`](Self::start) but ignore the first `drop_first`
    /// requests.
    pub async fn start_dropping(
        mib: BTreeMap<Oid, Value>,
        community: &'static [u8],
        drop_first: usize,
    ) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 65535];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    continue;
                };
                let seen = counter.fetch_add(1, Ordering::SeqCst);
                if seen < drop_first {
                    continue;
                }
                let Ok(message) = Message::decode(Bytes::copy_from_slice(&buf[..len])) else {
                    continue;
                };
                if message.community != community {
                    continue;
                }
                let Pdu::GetBulk(request) = message.pdu else {
                    continue;
                };

                let reply = Message::new(
                    message.community.clone(),
                    Pdu::Response(Response {
                        request_id: request.request_id,
                        error_status: 0,
                        error_index: 0,
                        varbinds: answer(&mib, &request),
                    }),
                );
                let _ = socket.send_to(&reply.encode(), peer).await;
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Datagrams received so far, answered or not.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for FakeAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn answer(mib: &BTreeMap<Oid, Value>, request: &GetBulkRequest) -> Vec<VarBind> {
    let repetitions = request.max_repetitions.max(1) as usize;
    let mut out = Vec::new();
    for vb in &request.varbinds {
        let mut entries = mib.range((Bound::Excluded(&vb.oid), Bound::Unbounded));
        for _ in 0..repetitions {
            match entries.next() {
                Some((oid, value)) => out.push(VarBind::new(oid.clone(), value.clone())),
                None => {
                    out.push(VarBind::new(vb.oid.clone(), Value::EndOfMibView));
                    break;
                }
            }
        }
    }
    out
}
