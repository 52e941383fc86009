// Fixed-size frames exchanged across the world boundary. All words are
// little-endian u32.
//
// request:  kind | session | cmd_id | param_types | uuid[16] | 4 x (a, b)
// response: status | origin | session | 4 x (a, b)

use thiserror::Error;
use uuid::Uuid;

use super::command::{NUM_PARAMS, Operation, ParamTypes, Value};
use super::status::{ErrorOrigin, InvokeError, SUCCESS, TeeError};

pub const REQUEST_LEN: usize = 4 * 4 + 16 + NUM_PARAMS * 8;
pub const RESPONSE_LEN: usize = 3 * 4 + NUM_PARAMS * 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("frame is {got} bytes, expected {expected}")]
    Length { got: usize, expected: usize },
    #[error("unknown request kind: {0}")]
    BadKind(u32),
    #[error("invalid parameter types: 0x{0:x}")]
    BadParamTypes(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RequestKind {
    OpenSession = 0,
    Invoke = 1,
    CloseSession = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: RequestKind,
    pub session: u32,
    pub cmd_id: u32,
    pub param_types: ParamTypes,
    pub uuid: Uuid,
    pub params: [Value; NUM_PARAMS],
}

impl Request {
    pub fn open_session(uuid: Uuid, op: &Operation) -> Self {
        Self {
            kind: RequestKind::OpenSession,
            session: 0,
            cmd_id: 0,
            param_types: op.param_types,
            uuid,
            params: op.params,
        }
    }

    pub fn invoke(session: u32, cmd_id: u32, op: &Operation) -> Self {
        Self {
            kind: RequestKind::Invoke,
            session,
            cmd_id,
            param_types: op.param_types,
            uuid: Uuid::nil(),
            params: op.params,
        }
    }

    pub fn close_session(session: u32) -> Self {
        Self {
            kind: RequestKind::CloseSession,
            session,
            cmd_id: 0,
            param_types: ParamTypes::NONE,
            uuid: Uuid::nil(),
            params: [Value::default(); NUM_PARAMS],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u32,
    pub origin: u32,
    pub session: u32,
    pub params: [Value; NUM_PARAMS],
}

impl Response {
    pub fn ok(session: u32, params: [Value; NUM_PARAMS]) -> Self {
        Self {
            status: SUCCESS,
            origin: ErrorOrigin::TrustedApp.raw(),
            session,
            params,
        }
    }

    /// Failure responses never carry parameter data back.
    pub fn err(error: TeeError, origin: ErrorOrigin) -> Self {
        Self {
            status: error.code(),
            origin: origin.raw(),
            session: 0,
            params: [Value::default(); NUM_PARAMS],
        }
    }

    pub fn into_result(self) -> Result<Self, InvokeError> {
        if self.status == SUCCESS {
            Ok(self)
        } else {
            Err(InvokeError::new(
                TeeError::from_code(self.status),
                ErrorOrigin::from_raw(self.origin),
            ))
        }
    }
}

pub fn encode_request(req: &Request) -> Vec<u8> {
    let mut out = Vec::with_capacity(REQUEST_LEN);
    put_u32(&mut out, req.kind as u32);
    put_u32(&mut out, req.session);
    put_u32(&mut out, req.cmd_id);
    put_u32(&mut out, req.param_types.raw());
    out.extend_from_slice(req.uuid.as_bytes());
    put_params(&mut out, &req.params);
    out
}

pub fn decode_request(buf: &[u8]) -> Result<Request, WireError> {
    let mut r = Reader::new(buf, REQUEST_LEN)?;
    let kind = match r.u32() {
        0 => RequestKind::OpenSession,
        1 => RequestKind::Invoke,
        2 => RequestKind::CloseSession,
        other => return Err(WireError::BadKind(other)),
    };
    let session = r.u32();
    let cmd_id = r.u32();
    let raw_types = r.u32();
    let param_types = ParamTypes::from_raw(raw_types).ok_or(WireError::BadParamTypes(raw_types))?;
    let uuid = Uuid::from_bytes(r.bytes16());
    let params = r.params();
    Ok(Request {
        kind,
        session,
        cmd_id,
        param_types,
        uuid,
        params,
    })
}

pub fn encode_response(resp: &Response) -> Vec<u8> {
    let mut out = Vec::with_capacity(RESPONSE_LEN);
    put_u32(&mut out, resp.status);
    put_u32(&mut out, resp.origin);
    put_u32(&mut out, resp.session);
    put_params(&mut out, &resp.params);
    out
}

pub fn decode_response(buf: &[u8]) -> Result<Response, WireError> {
    let mut r = Reader::new(buf, RESPONSE_LEN)?;
    Ok(Response {
        status: r.u32(),
        origin: r.u32(),
        session: r.u32(),
        params: r.params(),
    })
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_params(out: &mut Vec<u8>, params: &[Value; NUM_PARAMS]) {
    for v in params {
        put_u32(out, v.a);
        put_u32(out, v.b);
    }
}

/// Cursor over a frame whose length was checked up front.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], expected: usize) -> Result<Self, WireError> {
        if buf.len() != expected {
            return Err(WireError::Length {
                got: buf.len(),
                expected,
            });
        }
        Ok(Self { buf, pos: 0 })
    }

    fn u32(&mut self) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        u32::from_le_bytes(word)
    }

    fn bytes16(&mut self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out.copy_from_slice(&self.buf[self.pos..self.pos + 16]);
        self.pos += 16;
        out
    }

    fn params(&mut self) -> [Value; NUM_PARAMS] {
        let mut params = [Value::default(); NUM_PARAMS];
        for v in params.iter_mut() {
            v.a = self.u32();
            v.b = self.u32();
        }
        params
    }
}
