use log::debug;

use super::peripheral::Peripheral;
use crate::proto::command::{Command, NUM_PARAMS, ParamTypes, Value};
use crate::proto::status::TeeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// Per-session handle. Holds no command state; only the lifecycle.
#[derive(Debug)]
pub struct TaSession {
    state: SessionState,
}

impl TaSession {
    pub fn state(&self) -> SessionState {
        self.state
    }
}

/// The secure switch trusted application.
#[derive(Debug)]
pub struct SwitchTa<P> {
    peripheral: P,
}

impl<P: Peripheral> SwitchTa<P> {
    pub fn new(peripheral: P) -> Self {
        debug!("secure_switch TA created");
        Self { peripheral }
    }

    /// Sessions take no parameters.
    pub fn open_session(&self, param_types: ParamTypes) -> Result<TaSession, TeeError> {
        if param_types != ParamTypes::NONE {
            debug!("open session rejected: params {}", param_types);
            return Err(TeeError::BadParameters);
        }
        Ok(TaSession {
            state: SessionState::Open,
        })
    }

    pub fn close_session(&self, session: &mut TaSession) {
        session.state = SessionState::Closed;
    }

    /// Services one command. On any error `params` is left untouched and
    /// the session stays usable.
    pub fn invoke(
        &self,
        session: &TaSession,
        cmd_id: u32,
        param_types: ParamTypes,
        params: &mut [Value; NUM_PARAMS],
    ) -> Result<(), TeeError> {
        if session.state() != SessionState::Open {
            return Err(TeeError::BadState);
        }
        match Command::try_from(cmd_id) {
            Ok(Command::Read) => self.cmd_read(param_types, params),
            Ok(Command::Benchmark) => self.cmd_benchmark(param_types, params),
            Err(id) => {
                debug!("unknown command id {}", id);
                Err(TeeError::BadParameters)
            }
        }
    }

    fn cmd_read(
        &self,
        param_types: ParamTypes,
        params: &mut [Value; NUM_PARAMS],
    ) -> Result<(), TeeError> {
        check_params(Command::Read, param_types)?;
        params[0].a = self.peripheral.read_state();
        Ok(())
    }

    // out: params[0].a = switch state
    //      params[0].b = cycles spent in the register read
    //      params[1].a = cycles from command entry to exit
    //      params[1].b = reserved, 0
    fn cmd_benchmark(
        &self,
        param_types: ParamTypes,
        params: &mut [Value; NUM_PARAMS],
    ) -> Result<(), TeeError> {
        let entry = self.peripheral.read_cycle_counter();
        check_params(Command::Benchmark, param_types)?;

        let before = self.peripheral.read_cycle_counter();
        let state = self.peripheral.read_state();
        let after = self.peripheral.read_cycle_counter();

        params[0] = Value {
            a: state,
            b: after.wrapping_sub(before),
        };
        let exit = self.peripheral.read_cycle_counter();
        params[1] = Value {
            a: exit.wrapping_sub(entry),
            b: 0,
        };
        Ok(())
    }
}

fn check_params(cmd: Command, got: ParamTypes) -> Result<(), TeeError> {
    let expected = cmd.param_types();
    if got != expected {
        debug!("{:?}: params {} != expected {}", cmd, got, expected);
        return Err(TeeError::BadParameters);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::command::ParamType;
    use crate::ta::peripheral::StubPeripheral;
    use crate::ta::peripheral::testing::ScriptedPeripheral;

    const SENTINEL: Value = Value {
        a: 0xDEAD_BEEF,
        b: 0xCAFE_F00D,
    };

    fn open<P: Peripheral>(ta: &SwitchTa<P>) -> TaSession {
        ta.open_session(ParamTypes::NONE).unwrap()
    }

    #[test]
    fn open_session_requires_empty_params() {
        let ta = SwitchTa::new(StubPeripheral);
        let s = open(&ta);
        assert_eq!(s.state(), SessionState::Open);
        assert_eq!(
            ta.open_session(Command::Read.param_types()).unwrap_err(),
            TeeError::BadParameters
        );
    }

    #[test]
    fn read_reports_state_in_slot0_a() {
        let ta = SwitchTa::new(ScriptedPeripheral::new(0b10, 0, 1));
        let s = open(&ta);
        let mut params = [Value::default(); NUM_PARAMS];
        ta.invoke(&s, 0, Command::Read.param_types(), &mut params)
            .unwrap();
        assert_eq!(params[0].a, 0b10);
        assert_eq!(params[0].b, 0);
    }

    #[test]
    fn benchmark_fills_cycle_slots() {
        // counter reads: entry=100, before=107, after=114, exit=121
        let ta = SwitchTa::new(ScriptedPeripheral::new(0b01, 100, 7));
        let s = open(&ta);
        let mut params = [SENTINEL; NUM_PARAMS];
        ta.invoke(&s, 1, Command::Benchmark.param_types(), &mut params)
            .unwrap();
        assert_eq!(params[0], Value { a: 0b01, b: 7 });
        assert_eq!(params[1], Value { a: 21, b: 0 });
        // unused slots are not written
        assert_eq!(params[2], SENTINEL);
        assert_eq!(params[3], SENTINEL);
    }

    #[test]
    fn cycle_deltas_survive_counter_wrap() {
        let ta = SwitchTa::new(ScriptedPeripheral::new(0, u32::MAX - 1, 2));
        let s = open(&ta);
        let mut params = [Value::default(); NUM_PARAMS];
        ta.invoke(&s, 1, Command::Benchmark.param_types(), &mut params)
            .unwrap();
        assert_eq!(params[0].b, 2);
        assert_eq!(params[1].a, 6);
    }

    #[test]
    fn stub_peripheral_reports_zeros() {
        let ta = SwitchTa::new(StubPeripheral);
        let s = open(&ta);
        let mut params = [SENTINEL; NUM_PARAMS];
        ta.invoke(&s, 1, Command::Benchmark.param_types(), &mut params)
            .unwrap();
        assert_eq!(params[0], Value::default());
        assert_eq!(params[1], Value::default());
    }

    #[test]
    fn signature_mismatch_leaves_params_untouched() {
        let ta = SwitchTa::new(ScriptedPeripheral::new(0b11, 0, 5));
        let s = open(&ta);
        let wrong = [
            ParamTypes::NONE,
            ParamTypes::new([
                ParamType::ValueInput,
                ParamType::None,
                ParamType::None,
                ParamType::None,
            ]),
            ParamTypes::new([
                ParamType::ValueOutput,
                ParamType::ValueOutput,
                ParamType::ValueOutput,
                ParamType::None,
            ]),
        ];
        for cmd in [Command::Read, Command::Benchmark] {
            let other = match cmd {
                Command::Read => Command::Benchmark,
                Command::Benchmark => Command::Read,
            };
            for types in wrong.iter().copied().chain([other.param_types()]) {
                let mut params = [SENTINEL; NUM_PARAMS];
                assert_eq!(
                    ta.invoke(&s, cmd.id(), types, &mut params),
                    Err(TeeError::BadParameters)
                );
                assert_eq!(params, [SENTINEL; NUM_PARAMS]);
            }
        }
        // session is still usable afterwards
        let mut params = [Value::default(); NUM_PARAMS];
        ta.invoke(&s, 0, Command::Read.param_types(), &mut params)
            .unwrap();
        assert_eq!(params[0].a, 0b11);
    }

    #[test]
    fn unknown_command_is_bad_parameters() {
        let ta = SwitchTa::new(StubPeripheral);
        let s = open(&ta);
        let mut params = [SENTINEL; NUM_PARAMS];
        assert_eq!(
            ta.invoke(&s, 42, Command::Read.param_types(), &mut params),
            Err(TeeError::BadParameters)
        );
        assert_eq!(params, [SENTINEL; NUM_PARAMS]);
    }

    #[test]
    fn closed_session_rejects_commands() {
        let ta = SwitchTa::new(StubPeripheral);
        let mut s = open(&ta);
        ta.close_session(&mut s);
        assert_eq!(s.state(), SessionState::Closed);
        let mut params = [Value::default(); NUM_PARAMS];
        assert_eq!(
            ta.invoke(&s, 0, Command::Read.param_types(), &mut params),
            Err(TeeError::BadState)
        );
    }
}
