//! In-process transport for tests and demos
//!
//! [`MemoryNetwork`] is a hub wiring endpoints together by port number.
//! Frames hop between endpoints through per-endpoint event queues under a
//! single hub lock, so delivery is inherently reliable and ordered and the
//! requested [`Delivery`] mode is ignored. The connect key is accepted
//! unconditionally — acceptance policy belongs to real transports.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::{Delivery, DisconnectReason, PeerId, Transport, TransportError, TransportEvent};

type EndpointId = u64;

#[derive(Clone, Copy)]
struct Link {
    /// Endpoint on the other side of the connection.
    endpoint: EndpointId,
    /// Handle the other side uses for us.
    remote_handle: PeerId,
}

#[derive(Default)]
struct EndpointState {
    events: VecDeque<TransportEvent>,
    links: HashMap<PeerId, Link>,
}

#[derive(Default)]
struct HubState {
    next_endpoint: EndpointId,
    next_peer: u64,
    listeners: HashMap<u16, EndpointId>,
    endpoints: HashMap<EndpointId, EndpointState>,
}

impl HubState {
    fn endpoint_mut(&mut self, id: EndpointId) -> &mut EndpointState {
        self.endpoints
            .get_mut(&id)
            .expect("endpoint registered at creation")
    }

    fn alloc_peer(&mut self) -> PeerId {
        let id = PeerId::new(self.next_peer);
        self.next_peer += 1;
        id
    }
}

/// Hub connecting in-process endpoints by port number.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    state: Arc<Mutex<HubState>>,
}

impl MemoryNetwork {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh endpoint attached to this hub.
    #[must_use]
    pub fn endpoint(&self) -> MemoryTransport {
        let mut state = self.state.lock().expect("memory hub mutex poisoned");
        let id = state.next_endpoint;
        state.next_endpoint += 1;
        state.endpoints.insert(id, EndpointState::default());
        MemoryTransport {
            state: Arc::clone(&self.state),
            endpoint: id,
        }
    }
}

/// One endpoint of a [`MemoryNetwork`].
pub struct MemoryTransport {
    state: Arc<Mutex<HubState>>,
    endpoint: EndpointId,
}

impl Transport for MemoryTransport {
    fn listen(&self, port: u16) -> Result<(), TransportError> {
        let mut state = self.state.lock().expect("memory hub mutex poisoned");
        if let Some(&holder) = state.listeners.get(&port) {
            if holder != self.endpoint {
                return Err(TransportError::PortInUse { port });
            }
            return Ok(());
        }
        state.listeners.insert(port, self.endpoint);
        Ok(())
    }

    fn connect(&self, _address: &str, port: u16, _key: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().expect("memory hub mutex poisoned");
        let listener = *state
            .listeners
            .get(&port)
            .ok_or(TransportError::NoListener { port })?;

        // One handle per direction: how we name them, how they name us.
        let their_handle = state.alloc_peer();
        let our_handle = state.alloc_peer();

        {
            let ours = state.endpoint_mut(self.endpoint);
            ours.links.insert(
                their_handle,
                Link {
                    endpoint: listener,
                    remote_handle: our_handle,
                },
            );
            ours.events
                .push_back(TransportEvent::PeerConnected(their_handle));
        }
        {
            let theirs = state.endpoint_mut(listener);
            theirs.links.insert(
                our_handle,
                Link {
                    endpoint: self.endpoint,
                    remote_handle: their_handle,
                },
            );
            theirs
                .events
                .push_back(TransportEvent::PeerConnected(our_handle));
        }
        Ok(())
    }

    fn pump(&self, sink: &mut dyn FnMut(TransportEvent)) {
        let drained = {
            let mut state = self.state.lock().expect("memory hub mutex poisoned");
            std::mem::take(&mut state.endpoint_mut(self.endpoint).events)
        };
        // Sink runs outside the hub lock.
        for event in drained {
            sink(event);
        }
    }

    fn send(
        &self,
        peers: &[PeerId],
        frame: &[u8],
        _delivery: Delivery,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().expect("memory hub mutex poisoned");
        let payload = Bytes::copy_from_slice(frame);
        for &peer in peers {
            let link = *state
                .endpoint_mut(self.endpoint)
                .links
                .get(&peer)
                .ok_or(TransportError::UnknownPeer { peer })?;
            state
                .endpoint_mut(link.endpoint)
                .events
                .push_back(TransportEvent::Frame {
                    peer: link.remote_handle,
                    payload: payload.clone(),
                });
        }
        Ok(())
    }

    fn disconnect_all(&self) {
        let mut state = self.state.lock().expect("memory hub mutex poisoned");
        let links = std::mem::take(&mut state.endpoint_mut(self.endpoint).links);
        for (local_handle, link) in links {
            let remote = state.endpoint_mut(link.endpoint);
            remote.links.remove(&link.remote_handle);
            remote.events.push_back(TransportEvent::PeerDisconnected {
                peer: link.remote_handle,
                reason: DisconnectReason::RemoteClose,
            });

            let ours = state.endpoint_mut(self.endpoint);
            ours.events.push_back(TransportEvent::PeerDisconnected {
                peer: local_handle,
                reason: DisconnectReason::LocalClose,
            });
        }
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.disconnect_all();
        let mut state = self.state.lock().expect("memory hub mutex poisoned");
        state.endpoints.remove(&self.endpoint);
        state.listeners.retain(|_, holder| *holder != self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(transport: &MemoryTransport) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        transport.pump(&mut |event| events.push(event));
        events
    }

    fn connected_peer(events: &[TransportEvent]) -> PeerId {
        events
            .iter()
            .find_map(|event| match event {
                TransportEvent::PeerConnected(peer) => Some(*peer),
                _ => None,
            })
            .expect("a connected event")
    }

    #[test]
    fn test_connect_surfaces_events_on_both_sides() {
        let network = MemoryNetwork::new();
        let server = network.endpoint();
        let client = network.endpoint();

        server.listen(7000).unwrap();
        client.connect("memory", 7000, "").unwrap();

        assert!(matches!(
            drain(&server).as_slice(),
            [TransportEvent::PeerConnected(_)]
        ));
        assert!(matches!(
            drain(&client).as_slice(),
            [TransportEvent::PeerConnected(_)]
        ));
    }

    #[test]
    fn test_frames_cross_the_link_in_order() {
        let network = MemoryNetwork::new();
        let server = network.endpoint();
        let client = network.endpoint();

        server.listen(7001).unwrap();
        client.connect("memory", 7001, "").unwrap();
        let server_handle = connected_peer(&drain(&client));

        client
            .send(&[server_handle], &[1], Delivery::ReliableOrdered)
            .unwrap();
        client
            .send(&[server_handle], &[2], Delivery::ReliableOrdered)
            .unwrap();

        let payloads: Vec<u8> = drain(&server)
            .into_iter()
            .filter_map(|event| match event {
                TransportEvent::Frame { payload, .. } => Some(payload[0]),
                _ => None,
            })
            .collect();
        assert_eq!(payloads, vec![1, 2]);
    }

    #[test]
    fn test_connect_without_listener_fails() {
        let network = MemoryNetwork::new();
        let client = network.endpoint();
        let result = client.connect("memory", 4444, "");
        assert!(matches!(
            result,
            Err(TransportError::NoListener { port: 4444 })
        ));
    }

    #[test]
    fn test_second_listener_on_port_fails() {
        let network = MemoryNetwork::new();
        let first = network.endpoint();
        let second = network.endpoint();

        first.listen(7002).unwrap();
        first.listen(7002).unwrap(); // same endpoint may re-listen
        assert!(matches!(
            second.listen(7002),
            Err(TransportError::PortInUse { port: 7002 })
        ));
    }

    #[test]
    fn test_send_to_unknown_peer_fails() {
        let network = MemoryNetwork::new();
        let endpoint = network.endpoint();
        let result = endpoint.send(&[PeerId::new(99)], &[0], Delivery::Unreliable);
        assert!(matches!(result, Err(TransportError::UnknownPeer { .. })));
    }

    #[test]
    fn test_disconnect_all_notifies_both_sides() {
        let network = MemoryNetwork::new();
        let server = network.endpoint();
        let client = network.endpoint();

        server.listen(7003).unwrap();
        client.connect("memory", 7003, "").unwrap();
        drain(&server);
        drain(&client);

        client.disconnect_all();

        assert!(matches!(
            drain(&client).as_slice(),
            [TransportEvent::PeerDisconnected {
                reason: DisconnectReason::LocalClose,
                ..
            }]
        ));
        assert!(matches!(
            drain(&server).as_slice(),
            [TransportEvent::PeerDisconnected {
                reason: DisconnectReason::RemoteClose,
                ..
            }]
        ));
    }

    #[test]
    fn test_each_connection_gets_distinct_handles() {
        let network = MemoryNetwork::new();
        let server = network.endpoint();
        let one = network.endpoint();
        let two = network.endpoint();

        server.listen(7004).unwrap();
        one.connect("memory", 7004, "").unwrap();
        two.connect("memory", 7004, "").unwrap();

        let events = drain(&server);
        let handles: Vec<PeerId> = events
            .iter()
            .filter_map(|event| match event {
                TransportEvent::PeerConnected(peer) => Some(*peer),
                _ => None,
            })
            .collect();
        assert_eq!(handles.len(), 2);
        assert_ne!(handles[0], handles[1]);
    }
}
