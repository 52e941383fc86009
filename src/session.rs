use log::{debug, warn};
use uuid::Uuid;

use crate::proto::command::{Command, Operation, ParamTypes};
use crate::proto::status::{ErrorOrigin, InvokeError, TeeError};
use crate::proto::wire::{self, Request, Response};

/// Blocking request/response crossing into the secure world. The caller is
/// suspended until the reply frame is back; there is no timeout.
pub trait Transport {
    fn exchange(&mut self, request: &[u8]) -> Result<Vec<u8>, InvokeError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn exchange(&mut self, request: &[u8]) -> Result<Vec<u8>, InvokeError> {
        (**self).exchange(request)
    }
}

/// Client-side connection to a TEE.
pub struct Context<T> {
    transport: T,
}

impl<T: Transport> Context<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn open_session(&mut self, uuid: &Uuid) -> Result<Session<'_, T>, InvokeError> {
        let op = Operation::new(ParamTypes::NONE);
        let resp = self.call(&Request::open_session(*uuid, &op))?;
        debug!("session {} opened to {}", resp.session, uuid);
        Ok(Session {
            id: resp.session,
            ctx: self,
            open: true,
        })
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn call(&mut self, req: &Request) -> Result<Response, InvokeError> {
        let raw = self.transport.exchange(&wire::encode_request(req))?;
        let resp = wire::decode_response(&raw).map_err(|e| {
            warn!("undecodable response: {}", e);
            InvokeError::new(TeeError::Communication, ErrorOrigin::Comms)
        })?;
        resp.into_result()
    }
}

/// An open session. Closed explicitly with [`Session::close`] or on drop.
pub struct Session<'a, T: Transport> {
    ctx: &'a mut Context<T>,
    id: u32,
    open: bool,
}

impl<T: Transport> Session<'_, T> {
    pub fn invoke(&mut self, cmd: Command, op: &mut Operation) -> Result<(), InvokeError> {
        self.invoke_raw(cmd.id(), op)
    }

    /// Sends any command id; the trusted application decides what is valid.
    /// Output slots are copied back only on success.
    pub fn invoke_raw(&mut self, cmd_id: u32, op: &mut Operation) -> Result<(), InvokeError> {
        let resp = self.ctx.call(&Request::invoke(self.id, cmd_id, op))?;
        let types = op.param_types;
        for (i, slot) in op.params.iter_mut().enumerate() {
            if types.get(i).is_output() {
                *slot = resp.params[i];
            }
        }
        Ok(())
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        match self.ctx.call(&Request::close_session(self.id)) {
            Ok(_) => debug!("session {} closed", self.id),
            Err(e) => warn!("closing session {}: {}", self.id, e),
        }
    }
}

impl<T: Transport> Drop for Session<'_, T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
