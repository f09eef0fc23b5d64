//! Turns keys into resolved commands for one mode.
//!
//! The runner implements the `[count]["x][count]{command}` prefix grammar on
//! top of a [`CommandBindingRegistry`]. Counts typed before and after the
//! register selection multiply.

use tracing::trace;

use super::{
    BindData, BindResult, BindingKind, CommandBinding, CommandBindingRegistry, CommandFlags,
    KeyRemapMode, Lookup,
};
use crate::command::CommandData;
use crate::key::{KeyInput, KeyInputSet};
use crate::motion::motion_bind_data;
use crate::register::RegisterName;

/// A binding whose keys have all been typed.
#[derive(Debug, Clone)]
pub struct ResolvedCommand<T> {
    pub name: KeyInputSet,
    pub flags: CommandFlags,
    pub command: T,
    pub data: CommandData,
}

#[derive(Debug)]
pub enum RunResult<T> {
    Complete(ResolvedCommand<T>),
    NeedMoreInput,
    Cancelled,
    /// Nothing is bound to the keys typed so far. Carries those keys.
    Error(KeyInputSet),
}

enum State<T> {
    Idle,
    /// After `"`, waiting for the register name.
    Register,
    /// Keys typed so far are a prefix of one or more binding names.
    Prefix(KeyInputSet),
    /// A binding's own continuation is reading keys. `fresh` is set while a
    /// longer binding name could still win over the continuation.
    Binding {
        binding: CommandBinding<T>,
        data: BindData<T>,
        fresh: bool,
    },
}

pub struct CommandRunner<T> {
    registry: CommandBindingRegistry<T>,
    counts_enabled: bool,
    registers_enabled: bool,
    state: State<T>,
    count: Option<usize>,
    digits: Option<usize>,
    register: Option<RegisterName>,
    typed: KeyInputSet,
}

impl<T: Clone + 'static> CommandRunner<T> {
    pub fn new(registry: CommandBindingRegistry<T>, counts_enabled: bool, registers_enabled: bool) -> Self {
        Self {
            registry,
            counts_enabled,
            registers_enabled,
            state: State::Idle,
            count: None,
            digits: None,
            register: None,
            typed: KeyInputSet::empty(),
        }
    }

    pub fn registry(&self) -> &CommandBindingRegistry<T> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandBindingRegistry<T> {
        &mut self.registry
    }

    /// No keys of a command have been typed yet.
    pub fn is_idle(&self) -> bool {
        self.typed.is_empty()
    }

    /// Keys typed towards the command in progress.
    pub fn pending_keys(&self) -> &KeyInputSet {
        &self.typed
    }

    /// The remap table that applies to the next key, or `None` when the
    /// mode's own table applies.
    pub fn pending_remap_mode(&self) -> Option<KeyRemapMode> {
        match &self.state {
            State::Idle | State::Prefix(_) => None,
            State::Register => Some(KeyRemapMode::Language),
            State::Binding { data, .. } => Some(data.remap_mode().unwrap_or(KeyRemapMode::Language)),
        }
    }

    /// Drops any partially typed command.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.count = None;
        self.digits = None;
        self.register = None;
        self.typed.clear();
    }

    pub fn run(&mut self, key: KeyInput) -> RunResult<T> {
        if key.is_escape() && (!self.is_idle() || !self.registry.starts_with_key(&key)) {
            trace!(pending = %self.typed, "pending command cancelled");
            self.reset();
            return RunResult::Cancelled;
        }
        self.typed.push(key);

        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => self.run_start(key),
            State::Register => match key.printable_char().and_then(RegisterName::from_char) {
                Some(name) => {
                    self.register = Some(name);
                    RunResult::NeedMoreInput
                }
                None => self.fail(),
            },
            State::Prefix(keys) => self.run_name(keys.add(key)),
            State::Binding { binding, data, fresh } => self.run_binding(binding, data, fresh, key),
        }
    }

    fn run_start(&mut self, key: KeyInput) -> RunResult<T> {
        if self.counts_enabled {
            if let Some(digit) = key.digit() {
                if digit != 0 || self.digits.is_some() {
                    let digits = self.digits.unwrap_or(0);
                    self.digits = Some(digits.saturating_mul(10).saturating_add(digit as usize));
                    return RunResult::NeedMoreInput;
                }
            }
        }
        self.commit_digits();

        if self.registers_enabled && key.printable_char() == Some('"') {
            self.state = State::Register;
            return RunResult::NeedMoreInput;
        }
        self.run_name(KeyInputSet::one(key))
    }

    fn commit_digits(&mut self) {
        if let Some(digits) = self.digits.take() {
            self.count = Some(self.count.unwrap_or(1).saturating_mul(digits));
        }
    }

    fn run_name(&mut self, keys: KeyInputSet) -> RunResult<T> {
        match self.registry.lookup(&keys) {
            Lookup::NoMatch => self.fail(),
            Lookup::Prefix => {
                self.state = State::Prefix(keys);
                RunResult::NeedMoreInput
            }
            Lookup::Exact { binding, has_longer } => self.start_binding(binding, has_longer),
        }
    }

    fn start_binding(&mut self, binding: CommandBinding<T>, has_longer: bool) -> RunResult<T> {
        let data = match &binding.kind {
            BindingKind::Normal(command) => {
                if has_longer {
                    self.state = State::Prefix(binding.name.clone());
                    return RunResult::NeedMoreInput;
                }
                let command = command.clone();
                return self.complete(binding, command);
            }
            BindingKind::Motion { convert, line_keys } => {
                let convert = std::rc::Rc::clone(convert);
                motion_bind_data(line_keys.clone()).map(move |motion| convert(motion))
            }
            BindingKind::Complex(storage) => storage.create_bind_data(),
        };
        self.state = State::Binding {
            binding,
            data,
            fresh: has_longer,
        };
        RunResult::NeedMoreInput
    }

    fn run_binding(
        &mut self,
        binding: CommandBinding<T>,
        data: BindData<T>,
        fresh: bool,
        key: KeyInput,
    ) -> RunResult<T> {
        if fresh {
            // `g` followed by `~` names `g~` before it means anything to the
            // continuation started by `g`.
            let keys = binding.name.add(key);
            match self.registry.lookup(&keys) {
                Lookup::NoMatch => {}
                Lookup::Prefix => {
                    self.state = State::Prefix(keys);
                    return RunResult::NeedMoreInput;
                }
                Lookup::Exact { binding, has_longer } => return self.start_binding(binding, has_longer),
            }
        }

        match data.run(key) {
            BindResult::Complete(command) => self.complete(binding, command),
            BindResult::NeedMoreInput(next) => {
                self.state = State::Binding {
                    binding,
                    data: next,
                    fresh: false,
                };
                RunResult::NeedMoreInput
            }
            BindResult::Cancelled => {
                self.reset();
                RunResult::Cancelled
            }
            BindResult::Error => self.fail(),
        }
    }

    fn complete(&mut self, binding: CommandBinding<T>, command: T) -> RunResult<T> {
        self.commit_digits();
        let data = CommandData {
            count: self.count,
            register_name: self.register,
        };
        trace!(name = %binding.name, ?data, "command resolved");
        self.reset();
        RunResult::Complete(ResolvedCommand {
            name: binding.name,
            flags: binding.flags,
            command,
            data,
        })
    }

    fn fail(&mut self) -> RunResult<T> {
        let typed = std::mem::take(&mut self.typed);
        self.reset();
        RunResult::Error(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindDataStorage;
    use crate::key::parse_keys;
    use crate::motion::{Motion, MotionData};
    use crate::text::WordKind;

    #[derive(Debug, Clone, PartialEq)]
    enum Cmd {
        DeleteChar,
        FirstLine,
        Delete(MotionData),
        Upper(MotionData),
        Replace(char),
        Escape,
    }

    fn runner() -> CommandRunner<Cmd> {
        let registry = CommandBindingRegistry::new(vec![
            CommandBinding::normal("x", CommandFlags::REPEATABLE, Cmd::DeleteChar),
            CommandBinding::normal("gg", CommandFlags::MOVEMENT, Cmd::FirstLine),
            CommandBinding::normal("<Esc>", CommandFlags::empty(), Cmd::Escape),
            CommandBinding::motion("d", CommandFlags::REPEATABLE, &["d"], Cmd::Delete),
            CommandBinding::motion("gU", CommandFlags::REPEATABLE, &["U", "gU"], Cmd::Upper),
            CommandBinding::complex(
                "r",
                CommandFlags::REPEATABLE,
                BindDataStorage::Simple(BindData::read_char(|c| BindResult::Complete(Cmd::Replace(c)))),
            ),
        ]);
        CommandRunner::new(registry, true, true)
    }

    fn feed(runner: &mut CommandRunner<Cmd>, keys: &str) -> RunResult<Cmd> {
        let keys = parse_keys(keys);
        let (last, rest) = keys.split_last().unwrap();
        for key in rest {
            assert!(
                matches!(runner.run(*key), RunResult::NeedMoreInput),
                "expected more input before {key}"
            );
        }
        runner.run(*last)
    }

    fn complete(runner: &mut CommandRunner<Cmd>, keys: &str) -> ResolvedCommand<Cmd> {
        match feed(runner, keys) {
            RunResult::Complete(resolved) => resolved,
            other => panic!("{keys}: unexpected {other:?}"),
        }
    }

    #[test]
    fn test_simple_binding() {
        let mut runner = runner();
        let resolved = complete(&mut runner, "x");
        assert_eq!(resolved.command, Cmd::DeleteChar);
        assert_eq!(resolved.data, CommandData::default());
        assert!(runner.is_idle());
    }

    #[test]
    fn test_prefix_needs_more_input() {
        let mut runner = runner();
        assert!(matches!(runner.run(KeyInput::from_char('g')), RunResult::NeedMoreInput));
        assert!(!runner.is_idle());
        assert_eq!(complete(&mut runner, "g").command, Cmd::FirstLine);
    }

    #[test]
    fn test_counts_and_register_multiply() {
        let mut runner = runner();
        let resolved = complete(&mut runner, "3\"a2x");
        assert_eq!(resolved.data.count, Some(6));
        assert_eq!(resolved.data.register_name, Some(RegisterName::Named('a')));
    }

    #[test]
    fn test_zero_is_a_count_only_after_digits() {
        let mut runner = runner();
        assert_eq!(complete(&mut runner, "10x").data.count, Some(10));
        assert!(matches!(feed(&mut runner, "0"), RunResult::Error(_)));
    }

    #[test]
    fn test_operator_with_motion_count() {
        let mut runner = runner();
        let resolved = complete(&mut runner, "2d3w");
        assert_eq!(resolved.data.count, Some(2));
        let Cmd::Delete(motion) = resolved.command else {
            panic!("expected delete");
        };
        assert_eq!(motion.motion, Motion::WordForward(WordKind::NormalWord));
        assert_eq!(motion.argument.count, Some(3));
    }

    #[test]
    fn test_doubled_operator_is_whole_line() {
        let mut runner = runner();
        let Cmd::Delete(motion) = complete(&mut runner, "dd").command else {
            panic!("expected delete");
        };
        assert_eq!(motion.motion, Motion::WholeLine);

        let Cmd::Upper(motion) = complete(&mut runner, "gUU").command else {
            panic!("expected upper");
        };
        assert_eq!(motion.motion, Motion::WholeLine);
        let Cmd::Upper(motion) = complete(&mut runner, "gUgU").command else {
            panic!("expected upper");
        };
        assert_eq!(motion.motion, Motion::WholeLine);
    }

    #[test]
    fn test_complex_binding() {
        let mut runner = runner();
        assert_eq!(complete(&mut runner, "rz").command, Cmd::Replace('z'));
    }

    #[test]
    fn test_escape_cancels_pending_register() {
        let mut runner = runner();
        assert!(matches!(runner.run(KeyInput::from_char('"')), RunResult::NeedMoreInput));
        assert_eq!(runner.pending_remap_mode(), Some(KeyRemapMode::Language));
        assert!(matches!(runner.run(KeyInput::escape()), RunResult::Cancelled));
        assert!(runner.is_idle());
        assert_eq!(complete(&mut runner, "x").data, CommandData::default());
    }

    #[test]
    fn test_escape_when_idle_runs_binding() {
        let mut runner = runner();
        assert_eq!(complete(&mut runner, "<Esc>").command, Cmd::Escape);
    }

    #[test]
    fn test_no_match_reports_keys() {
        let mut runner = runner();
        match feed(&mut runner, "gq") {
            RunResult::Error(keys) => assert_eq!(keys, KeyInputSet::from_notation("gq")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(runner.is_idle());
    }

    #[test]
    fn test_motion_capture_remap_mode() {
        let mut runner = runner();
        assert!(matches!(runner.run(KeyInput::from_char('d')), RunResult::NeedMoreInput));
        assert_eq!(runner.pending_remap_mode(), Some(KeyRemapMode::OperatorPending));
    }
}
