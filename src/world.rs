use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, warn};
use uuid::Uuid;

use crate::proto::command::{NUM_PARAMS, Value};
use crate::proto::status::{ErrorOrigin, InvokeError, TeeError};
use crate::proto::wire::{self, Request, RequestKind, Response};
use crate::session::Transport;
use crate::ta::handler::{SwitchTa, TaSession};
use crate::ta::peripheral::Peripheral;

/// In-process secure world: routes decoded frames to a single trusted
/// application. An optional fixed latency is added to every invoke to
/// simulate the cost of a world switch.
pub struct LoopbackWorld<P> {
    uuid: Uuid,
    ta: SwitchTa<P>,
    sessions: BTreeMap<u32, TaSession>,
    next_session: u32,
    latency: Duration,
}

impl<P: Peripheral> LoopbackWorld<P> {
    pub fn new(uuid: Uuid, peripheral: P) -> Self {
        Self {
            uuid,
            ta: SwitchTa::new(peripheral),
            sessions: BTreeMap::new(),
            next_session: 1,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn handle(&mut self, req: Request) -> Response {
        match req.kind {
            RequestKind::OpenSession => {
                if req.uuid != self.uuid {
                    debug!("no TA with uuid {}", req.uuid);
                    return Response::err(TeeError::ItemNotFound, ErrorOrigin::Tee);
                }
                match self.ta.open_session(req.param_types) {
                    Ok(sess) => {
                        let id = self.next_session;
                        self.next_session = self.next_session.wrapping_add(1);
                        self.sessions.insert(id, sess);
                        Response::ok(id, req.params)
                    }
                    Err(e) => Response::err(e, ErrorOrigin::TrustedApp),
                }
            }
            RequestKind::Invoke => {
                let Some(sess) = self.sessions.get(&req.session) else {
                    return Response::err(TeeError::BadState, ErrorOrigin::Tee);
                };
                if !self.latency.is_zero() {
                    std::thread::sleep(self.latency);
                }
                let mut params = req.params;
                match self
                    .ta
                    .invoke(sess, req.cmd_id, req.param_types, &mut params)
                {
                    Ok(()) => Response::ok(req.session, params),
                    Err(e) => Response::err(e, ErrorOrigin::TrustedApp),
                }
            }
            RequestKind::CloseSession => {
                if let Some(mut sess) = self.sessions.remove(&req.session) {
                    self.ta.close_session(&mut sess);
                }
                Response::ok(req.session, [Value::default(); NUM_PARAMS])
            }
        }
    }
}

impl<P: Peripheral> Transport for LoopbackWorld<P> {
    fn exchange(&mut self, request: &[u8]) -> Result<Vec<u8>, InvokeError> {
        let req = wire::decode_request(request).map_err(|e| {
            warn!("malformed request: {}", e);
            InvokeError::new(TeeError::Communication, ErrorOrigin::Comms)
        })?;
        Ok(wire::encode_response(&self.handle(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::command::{Command, Operation, ParamTypes, TA_UUID};
    use crate::ta::peripheral::StubPeripheral;

    fn roundtrip<P: Peripheral>(world: &mut LoopbackWorld<P>, req: &Request) -> Response {
        let raw = world.exchange(&wire::encode_request(req)).unwrap();
        wire::decode_response(&raw).unwrap()
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let mut world = LoopbackWorld::new(TA_UUID, StubPeripheral);
        let op = Operation::new(ParamTypes::NONE);
        let a = roundtrip(&mut world, &Request::open_session(TA_UUID, &op));
        let b = roundtrip(&mut world, &Request::open_session(TA_UUID, &op));
        assert_ne!(a.session, b.session);
        assert_eq!(world.open_sessions(), 2);
    }

    #[test]
    fn open_with_params_is_rejected_by_ta() {
        let mut world = LoopbackWorld::new(TA_UUID, StubPeripheral);
        let op = Operation::for_command(Command::Read);
        let resp = roundtrip(&mut world, &Request::open_session(TA_UUID, &op));
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.error, TeeError::BadParameters);
        assert_eq!(err.origin, ErrorOrigin::TrustedApp);
        assert_eq!(world.open_sessions(), 0);
    }

    #[test]
    fn invoke_after_close_is_bad_state() {
        let mut world = LoopbackWorld::new(TA_UUID, StubPeripheral);
        let op = Operation::new(ParamTypes::NONE);
        let id = roundtrip(&mut world, &Request::open_session(TA_UUID, &op)).session;
        roundtrip(&mut world, &Request::close_session(id));

        let op = Operation::for_command(Command::Read);
        let resp = roundtrip(&mut world, &Request::invoke(id, Command::Read.id(), &op));
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.error, TeeError::BadState);
        assert_eq!(err.origin, ErrorOrigin::Tee);
    }

    #[test]
    fn malformed_request_is_a_comms_error() {
        let mut world = LoopbackWorld::new(TA_UUID, StubPeripheral);
        let err = world.exchange(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.error, TeeError::Communication);
        assert_eq!(err.origin, ErrorOrigin::Comms);
    }
}
