//! The modal state machine a host feeds keys into.
//!
//! [`VimBuffer`] owns one [`CommandRunner`] per mode, applies key remaps,
//! routes resolved commands to the [`CommandExecutor`] inside undo
//! transactions and keeps the state that outlives a single command: the
//! caret and selection, the insert session, the last change for `.`, and
//! macro recording and playback.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::binding::{CommandBindingRegistry, CommandFlags, CommandRunner, KeyRemapMode, ResolvedCommand, RunResult};
use crate::command::{
    Command, CommandData, CommandLineCommand, CommandResult, CommandRunData, InsertCommand, ModeArgument,
    ModeSwitch, NormalCommand, SelectCommand, VisualCommand,
};
use crate::config::{Config, EditorConfig, KeymapConfig};
use crate::error::{ExecutionError, VimError};
use crate::executor::{CommandExecutor, Execution, ExecutionContext, InsertKind, InsertSession, Selection};
use crate::host::{RegexSearchService, SearchService, StatusSink, TextSurface, TracingStatus};
use crate::key::{parse_keys, KeyInput, KeyInputSet};
use crate::macros::{MacroPlayer, MacroRecorder};
use crate::mode::{
    command_line_bindings, insert_bindings, normal_bindings, select_bindings, visual_bindings, ModeKind,
};
use crate::motion::MotionState;
use crate::register::{RegisterMap, RegisterName, RegisterValue};
use crate::text::TextSnapshot;
use crate::undo::{LinkedTransaction, UndoHost, UndoTransaction};

/// What happened to one key.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessResult {
    /// The key completed a command.
    Complete(CommandRunData),
    /// The key was consumed without completing a command, e.g. a
    /// character typed on the command line.
    Handled,
    /// The key is part of a command that needs more keys.
    NeedMoreInput,
    /// `<Esc>` dropped a partially typed command.
    Cancelled,
    /// The current mode does not process keys.
    Ignored,
    Error(VimError),
}

impl ProcessResult {
    pub fn is_error(&self) -> bool {
        matches!(self, ProcessResult::Error(_))
    }
}

/// A change `.` can repeat: the command, plus the text typed in the Insert
/// session it opened.
#[derive(Debug, Clone, PartialEq)]
struct LastChange {
    run: CommandRunData,
    inserted: Option<String>,
}

pub struct VimBuffer<S: TextSurface + UndoHost> {
    surface: S,
    registers: RegisterMap,
    motion_state: MotionState,
    search: Box<dyn SearchService>,
    status: Box<dyn StatusSink>,
    settings: EditorConfig,
    remaps: HashMap<KeyRemapMode, HashMap<KeyInput, Vec<KeyInput>>>,

    mode: ModeKind,
    previous_mode: ModeKind,
    caret: usize,
    selection: Selection,
    command_line: String,

    normal: CommandRunner<NormalCommand>,
    visual: CommandRunner<VisualCommand>,
    insert: CommandRunner<InsertCommand>,
    select: CommandRunner<SelectCommand>,
    command_line_runner: CommandRunner<CommandLineCommand>,

    insert_session: Option<InsertSession>,
    linked_transaction: Option<LinkedTransaction>,

    last_change: Option<LastChange>,
    /// A change whose Insert session is still open.
    pending_change: Option<CommandRunData>,
    last_command_line: Option<String>,

    recorder: MacroRecorder,
    player: MacroPlayer,
    dispatching: bool,
}

/// The mode a switch leads to.
fn target_mode(current: ModeKind, previous: ModeKind, switch: &ModeSwitch) -> ModeKind {
    match switch {
        ModeSwitch::NoSwitch => current,
        ModeSwitch::SwitchMode(mode) | ModeSwitch::SwitchModeWithArgument(mode, _) => *mode,
        ModeSwitch::SwitchPreviousMode => previous,
    }
}

fn remap_table(keymap: &KeymapConfig) -> HashMap<KeyRemapMode, HashMap<KeyInput, Vec<KeyInput>>> {
    [KeyRemapMode::Normal, KeyRemapMode::Visual, KeyRemapMode::Insert]
        .into_iter()
        .map(|mode| (mode, keymap.remaps(mode).into_iter().collect()))
        .collect()
}

impl<S: TextSurface + UndoHost> VimBuffer<S> {
    /// A buffer with default settings, an in-memory clipboard and no remaps.
    pub fn new(surface: S) -> Self {
        Self::build(surface, RegisterMap::default(), EditorConfig::default(), HashMap::new())
    }

    /// A buffer configured from `config`, using the clipboard it selects.
    pub fn with_config(surface: S, config: &Config) -> Self {
        let mut registers = RegisterMap::new(crate::clipboard::create_bridge(&config.clipboard));
        registers.set_clipboard_unnamed(config.clipboard.unnamed);
        Self::build(surface, registers, config.editor.clone(), remap_table(&config.keymap))
    }

    fn build(
        surface: S,
        registers: RegisterMap,
        settings: EditorConfig,
        remaps: HashMap<KeyRemapMode, HashMap<KeyInput, Vec<KeyInput>>>,
    ) -> Self {
        Self {
            surface,
            registers,
            motion_state: MotionState::default(),
            search: Box::new(RegexSearchService),
            status: Box::new(TracingStatus),
            player: MacroPlayer::new(settings.max_macro_depth),
            settings,
            remaps,
            mode: ModeKind::Normal,
            previous_mode: ModeKind::Normal,
            caret: 0,
            selection: Selection::default(),
            command_line: String::new(),
            normal: CommandRunner::new(normal_bindings(), true, true),
            visual: CommandRunner::new(visual_bindings(), true, true),
            insert: CommandRunner::new(insert_bindings(), false, false),
            select: CommandRunner::new(select_bindings(), false, false),
            command_line_runner: CommandRunner::new(command_line_bindings(), false, false),
            insert_session: None,
            linked_transaction: None,
            last_change: None,
            pending_change: None,
            last_command_line: None,
            recorder: MacroRecorder::new(),
            dispatching: false,
        }
    }

    pub fn with_registers(mut self, registers: RegisterMap) -> Self {
        self.registers = registers;
        self
    }

    pub fn with_status(mut self, status: impl StatusSink + 'static) -> Self {
        self.status = Box::new(status);
        self
    }

    pub fn with_search(mut self, search: impl SearchService + 'static) -> Self {
        self.search = Box::new(search);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for host-side edits. Follow with [`set_caret`](Self::set_caret)
    /// if the text under the caret changed.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn mode(&self) -> ModeKind {
        self.mode
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn set_caret(&mut self, caret: usize) {
        self.caret = caret;
        self.clamp_caret();
    }

    /// The selection, while a Visual or Select mode is active.
    pub fn selection(&self) -> Option<Selection> {
        self.mode.has_selection().then_some(self.selection)
    }

    /// Text typed after `:`, while the command line is open.
    pub fn command_line(&self) -> Option<&str> {
        (self.mode == ModeKind::CommandLine).then_some(self.command_line.as_str())
    }

    pub fn registers(&self) -> &RegisterMap {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RegisterMap {
        &mut self.registers
    }

    pub fn settings(&self) -> &EditorConfig {
        &self.settings
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Sets the `%` register.
    pub fn set_file_name(&mut self, name: &str) {
        self.registers
            .set_read_only_register(RegisterName::FileName, name);
    }

    /// Normal mode bindings, for hosts that add their own commands.
    pub fn normal_bindings_mut(&mut self) -> &mut CommandBindingRegistry<NormalCommand> {
        self.normal.registry_mut()
    }

    /// Keys typed towards the command in progress.
    pub fn pending_keys(&self) -> &KeyInputSet {
        match self.mode {
            ModeKind::Insert | ModeKind::Replace => self.insert.pending_keys(),
            ModeKind::VisualCharacter | ModeKind::VisualLine | ModeKind::VisualBlock => {
                self.visual.pending_keys()
            }
            ModeKind::Select => self.select.pending_keys(),
            ModeKind::CommandLine => self.command_line_runner.pending_keys(),
            _ => self.normal.pending_keys(),
        }
    }

    /// Switches mode on behalf of the host, e.g. to Disabled while it loads.
    /// Partially typed commands are dropped.
    pub fn set_mode(&mut self, mode: ModeKind) {
        self.reset_runners();
        self.enter_mode(mode, None);
    }

    /// Feeds one key.
    pub fn process(&mut self, key: KeyInput) -> ProcessResult {
        if self.dispatching {
            warn!(key = %key, "reentrant key rejected");
            return ProcessResult::Error(VimError::Reentrant);
        }
        self.dispatching = true;
        let result = self.dispatch(key);
        self.dispatching = false;
        result
    }

    /// Feeds keys until one fails.
    pub fn process_keys(&mut self, keys: &[KeyInput]) -> Result<(), VimError> {
        for key in keys {
            if let ProcessResult::Error(err) = self.process(*key) {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Feeds keys written in `<C-x>` notation.
    pub fn process_notation(&mut self, keys: &str) -> Result<(), VimError> {
        self.process_keys(&parse_keys(keys))
    }

    fn dispatch(&mut self, key: KeyInput) -> ProcessResult {
        if !self.mode.processes_keys() {
            trace!(key = %key, mode = ?self.mode, "key ignored");
            return ProcessResult::Ignored;
        }
        self.revalidate_positions();

        if self.recorder.is_recording() && !self.player.is_playing() {
            if self.runner_is_idle() {
                self.recorder.begin_command();
            }
            self.recorder.record(key);
        }

        let remap_mode = self.remap_mode();
        let remapped = self
            .remaps
            .get(&remap_mode)
            .and_then(|table| table.get(&key))
            .cloned();
        match remapped {
            Some(keys) => {
                trace!(key = %key, to = keys.len(), "key remapped");
                let mut result = ProcessResult::Handled;
                for key in keys {
                    result = self.run_key(key);
                    if result.is_error() {
                        break;
                    }
                }
                result
            }
            None => self.run_key(key),
        }
    }

    fn runner_is_idle(&self) -> bool {
        self.pending_keys().is_empty()
    }

    fn remap_mode(&self) -> KeyRemapMode {
        let (pending, default) = match self.mode {
            ModeKind::Insert | ModeKind::Replace => (self.insert.pending_remap_mode(), KeyRemapMode::Insert),
            ModeKind::VisualCharacter | ModeKind::VisualLine | ModeKind::VisualBlock => {
                (self.visual.pending_remap_mode(), KeyRemapMode::Visual)
            }
            ModeKind::Select => (self.select.pending_remap_mode(), KeyRemapMode::Select),
            ModeKind::CommandLine => (
                self.command_line_runner.pending_remap_mode(),
                KeyRemapMode::CommandLine,
            ),
            _ => (self.normal.pending_remap_mode(), KeyRemapMode::Normal),
        };
        pending.unwrap_or(default)
    }

    fn reset_runners(&mut self) {
        self.normal.reset();
        self.visual.reset();
        self.insert.reset();
        self.select.reset();
        self.command_line_runner.reset();
    }

    fn run_key(&mut self, key: KeyInput) -> ProcessResult {
        match self.mode {
            ModeKind::Normal => {
                if self.recorder.is_recording()
                    && self.normal.is_idle()
                    && key.printable_char() == Some('q')
                {
                    self.stop_recording();
                    return ProcessResult::Handled;
                }
                match self.normal.run(key) {
                    RunResult::Complete(resolved) => self.run_normal_command(resolved),
                    other => self.unresolved(other),
                }
            }
            ModeKind::VisualCharacter | ModeKind::VisualLine | ModeKind::VisualBlock => {
                match self.visual.run(key) {
                    RunResult::Complete(resolved) => self.run_visual_command(resolved),
                    other => self.unresolved(other),
                }
            }
            ModeKind::Insert | ModeKind::Replace => {
                if self.insert.is_idle() {
                    if let Some(c) = key.printable_char() {
                        return self.run_insert_key(KeyInputSet::one(key), InsertCommand::InsertChar(c));
                    }
                }
                match self.insert.run(key) {
                    RunResult::Complete(resolved) => self.run_insert_key(resolved.name, resolved.command),
                    other => self.unresolved(other),
                }
            }
            ModeKind::Select => {
                if self.select.is_idle() {
                    if let Some(c) = key.printable_char() {
                        return self.run_select_command(
                            KeyInputSet::one(key),
                            SelectCommand::ReplaceSelection(c),
                            CommandData::default(),
                        );
                    }
                }
                match self.select.run(key) {
                    RunResult::Complete(resolved) => {
                        self.run_select_command(resolved.name, resolved.command, resolved.data)
                    }
                    other => self.unresolved(other),
                }
            }
            ModeKind::CommandLine => {
                if self.command_line_runner.is_idle() {
                    if let Some(c) = key.printable_char() {
                        self.command_line.push(c);
                        return ProcessResult::Handled;
                    }
                }
                match self.command_line_runner.run(key) {
                    RunResult::Complete(resolved) => self.run_command_line(resolved.command),
                    other => self.unresolved(other),
                }
            }
            ModeKind::Disabled | ModeKind::External => ProcessResult::Ignored,
        }
    }

    fn unresolved<T>(&mut self, result: RunResult<T>) -> ProcessResult {
        match result {
            RunResult::NeedMoreInput => ProcessResult::NeedMoreInput,
            RunResult::Cancelled => ProcessResult::Cancelled,
            RunResult::Error(keys) => self.fail(VimError::NoBinding(keys)),
            RunResult::Complete(_) => ProcessResult::Handled,
        }
    }

    /// Logs a failure and shows it to the user. Unbound keys only beep in
    /// Vim, so they are not reported; neither are keys failing inside a
    /// macro, whose playback error is reported once instead.
    fn fail(&mut self, err: VimError) -> ProcessResult {
        warn!(error = %err, mode = ?self.mode, "command failed");
        if !matches!(err, VimError::NoBinding(_)) && !self.player.is_playing() {
            self.status.report_error(&err.to_string());
        }
        ProcessResult::Error(err)
    }

    fn finish(
        &mut self,
        name: KeyInputSet,
        flags: CommandFlags,
        command: Command,
        data: CommandData,
        result: Result<ModeSwitch, VimError>,
    ) -> ProcessResult {
        if let Some((pattern, _)) = &self.motion_state.last_search {
            self.registers
                .set_read_only_register(RegisterName::LastSearch, pattern);
        }
        match result {
            Ok(switch) => ProcessResult::Complete(CommandRunData {
                name,
                flags,
                command,
                data,
                result: CommandResult::Completed(switch),
            }),
            Err(err) => self.fail(err),
        }
    }

    /// Runs `f` against the executor inside an undo transaction. A command
    /// that ends in Insert or Replace leaves its transaction open for the
    /// session; any other outcome commits it, and an error rolls it back.
    fn execute<F>(&mut self, name: &str, f: F) -> Result<Execution, ExecutionError>
    where
        F: FnOnce(&mut CommandExecutor<'_>) -> Result<Execution, ExecutionError>,
    {
        let mut transaction = match self.linked_transaction.take() {
            Some(linked) => UndoTransaction::resume(&mut self.surface, linked),
            None => UndoTransaction::begin(&mut self.surface, name),
        };
        let result = CommandExecutor::new(ExecutionContext {
            surface: &mut *transaction,
            registers: &mut self.registers,
            motion_state: &mut self.motion_state,
            search: &*self.search,
            status: &mut *self.status,
            settings: &self.settings,
        })
        .and_then(|mut executor| f(&mut executor));

        match result {
            Ok(execution) => {
                if target_mode(self.mode, self.previous_mode, &execution.switch).is_insert() {
                    self.linked_transaction = Some(transaction.detach());
                } else {
                    transaction.commit();
                }
                Ok(execution)
            }
            Err(err) => {
                transaction.rollback();
                Err(err)
            }
        }
    }

    fn apply(&mut self, execution: Execution) -> ModeSwitch {
        let Execution {
            switch,
            caret,
            selection,
        } = execution;
        self.caret = caret;
        if let Some(selection) = selection {
            self.selection = selection;
            self.caret = selection.caret;
        }
        match &switch {
            ModeSwitch::NoSwitch => {}
            ModeSwitch::SwitchMode(mode) => self.enter_mode(*mode, None),
            ModeSwitch::SwitchModeWithArgument(mode, argument) => {
                self.enter_mode(*mode, Some(argument.clone()))
            }
            ModeSwitch::SwitchPreviousMode => self.enter_mode(self.previous_mode, None),
        }
        if self.mode.is_normal() {
            self.clamp_caret();
        }
        switch
    }

    fn enter_mode(&mut self, mode: ModeKind, argument: Option<ModeArgument>) {
        if mode != self.mode {
            debug!(from = ?self.mode, to = ?mode, "switch mode");
        }
        if !mode.is_insert() {
            self.insert_session = None;
            self.pending_change = None;
            if let Some(linked) = self.linked_transaction.take() {
                UndoTransaction::resume(&mut self.surface, linked).commit();
            }
        }
        if mode != self.mode {
            self.previous_mode = self.mode;
        }
        self.mode = mode;

        match mode {
            ModeKind::Insert | ModeKind::Replace => {
                let kind = if mode == ModeKind::Replace {
                    InsertKind::Replace
                } else {
                    InsertKind::Insert
                };
                self.insert_session = Some(InsertSession::new(kind, argument.as_ref()));
            }
            ModeKind::VisualCharacter | ModeKind::VisualLine | ModeKind::VisualBlock | ModeKind::Select => {
                self.selection = match argument {
                    Some(ModeArgument::InitialSelection { anchor, caret }) => Selection::new(anchor, caret),
                    _ => Selection::at(self.caret),
                };
                self.caret = self.selection.caret;
            }
            ModeKind::CommandLine => {
                self.command_line = match argument {
                    Some(ModeArgument::CommandLine(text)) => text,
                    _ => String::new(),
                };
            }
            ModeKind::Normal => self.clamp_caret(),
            ModeKind::Disabled | ModeKind::External => {}
        }
    }

    /// The host may have edited the surface through [`surface_mut`](Self::surface_mut)
    /// since the last key.
    fn revalidate_positions(&mut self) {
        self.clamp_caret();
        if self.mode.has_selection() {
            let len = self.surface.length();
            self.selection = Selection::new(self.selection.anchor.min(len), self.selection.caret.min(len));
        }
    }

    fn clamp_caret(&mut self) {
        if let Ok(text) = TextSnapshot::capture(&self.surface) {
            self.caret = if self.mode.is_normal() {
                text.clamp_caret(self.caret)
            } else {
                self.caret.min(text.len())
            };
        }
    }

    fn run_normal_command(&mut self, resolved: ResolvedCommand<NormalCommand>) -> ProcessResult {
        let ResolvedCommand {
            name,
            flags,
            command,
            data,
        } = resolved;
        debug!(keys = %name, command = ?command, count = ?data.count, "run normal command");
        let result = match &command {
            NormalCommand::Undo => self.undo(data.count_or_default(), false),
            NormalCommand::Redo => self.undo(data.count_or_default(), true),
            NormalCommand::RepeatLastChange => self.repeat_last_change(data.count),
            NormalCommand::RecordMacro(register) => self.start_recording(*register),
            NormalCommand::RunMacro(register) => self.run_macro(*register, data.count_or_default()),
            _ => self.run_normal_change(&name, flags, &command, data),
        };
        self.finish(name, flags, Command::Normal(command), data, result)
    }

    fn run_normal_change(
        &mut self,
        name: &KeyInputSet,
        flags: CommandFlags,
        command: &NormalCommand,
        data: CommandData,
    ) -> Result<ModeSwitch, VimError> {
        let caret = self.caret;
        let execution = self.execute(&name.to_string(), |executor| {
            executor.run_normal(caret, command, data)
        })?;
        let switch = self.apply(execution);
        if !matches!(
            command,
            NormalCommand::MoveCaret(_)
                | NormalCommand::StartVisual(_)
                | NormalCommand::StartSelect
                | NormalCommand::EnterCommandLine
        ) {
            self.motion_state.desired_column = None;
        }

        if flags.contains(CommandFlags::REPEATABLE) {
            let run = CommandRunData {
                name: name.clone(),
                flags,
                command: Command::Normal(command.clone()),
                data,
                result: CommandResult::Completed(switch.clone()),
            };
            if self.mode.is_insert() {
                self.pending_change = Some(run);
            } else {
                self.last_change = Some(LastChange {
                    run,
                    inserted: None,
                });
            }
        }
        Ok(switch)
    }

    fn undo(&mut self, count: usize, redo: bool) -> Result<ModeSwitch, VimError> {
        let done = if redo {
            self.surface.redo(count)
        } else {
            self.surface.undo(count)
        };
        self.clamp_caret();
        if !done {
            let message = if redo {
                "already at newest change"
            } else {
                "already at oldest change"
            };
            return Err(ExecutionError::Failed(message.to_string()).into());
        }
        Ok(ModeSwitch::NoSwitch)
    }

    fn repeat_last_change(&mut self, count: Option<usize>) -> Result<ModeSwitch, VimError> {
        let change = self
            .last_change
            .clone()
            .ok_or(ExecutionError::NothingToRepeat)?;
        let run = change.run.with_count(count);
        let Command::Normal(command) = &run.command else {
            return Err(ExecutionError::NothingToRepeat.into());
        };
        debug!(keys = %run.name, count = ?run.data.count, "repeat last change");

        let result = self.replay_change(&run.name, command, run.data, change.inserted.as_deref());

        if result.is_ok() {
            self.last_change = Some(LastChange {
                run,
                inserted: change.inserted,
            });
        }
        result
    }

    /// Runs a change without recording it, so the change being repeated
    /// stays the last one.
    fn replay_change(
        &mut self,
        name: &KeyInputSet,
        command: &NormalCommand,
        data: CommandData,
        inserted: Option<&str>,
    ) -> Result<ModeSwitch, VimError> {
        let switch = self.run_normal_change(name, CommandFlags::empty(), command, data)?;
        if self.mode.is_insert() {
            for c in inserted.unwrap_or_default().chars() {
                self.run_insert_command(InsertCommand::InsertChar(c))?;
            }
            self.run_insert_command(InsertCommand::Exit)?;
        }
        Ok(switch)
    }

    fn start_recording(&mut self, register: RegisterName) -> Result<ModeSwitch, VimError> {
        if register.is_read_only() || register == RegisterName::BlackHole {
            return Err(ExecutionError::ReadOnlyRegister(register).into());
        }
        self.recorder.start(register);
        Ok(ModeSwitch::NoSwitch)
    }

    fn stop_recording(&mut self) {
        if let Some((register, keys)) = self.recorder.stop() {
            self.registers
                .set_register(register, RegisterValue::from_keys(&keys));
        }
    }

    fn run_macro(&mut self, register: Option<RegisterName>, count: usize) -> Result<ModeSwitch, VimError> {
        let register = match register {
            Some(register) => register,
            None => self
                .player
                .last_register()
                .ok_or(ExecutionError::NothingToRepeat)?,
        };
        if register == RegisterName::LastCommandLine {
            let line = self
                .last_command_line
                .clone()
                .ok_or(ExecutionError::RegisterEmpty(register))?;
            for _ in 0..count {
                self.run_ex_line(&line)?;
            }
            return Ok(ModeSwitch::NoSwitch);
        }

        let keys = self.registers.get_register(register.storage()).value.to_keys();
        if keys.is_empty() {
            return Err(ExecutionError::RegisterEmpty(register).into());
        }
        self.player.enter(register)?;
        debug!(register = %register, keys = keys.len(), count, "play macro");
        let result = self.play(register, &keys, count);
        self.player.leave();
        result.map(|_| ModeSwitch::NoSwitch)
    }

    fn play(&mut self, register: RegisterName, keys: &[KeyInput], count: usize) -> Result<(), VimError> {
        for _ in 0..count {
            for (index, key) in keys.iter().enumerate() {
                if let ProcessResult::Error(err) = self.dispatch(*key) {
                    return Err(VimError::MacroPlayback {
                        register,
                        index,
                        key: *key,
                        reason: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn run_visual_command(&mut self, resolved: ResolvedCommand<VisualCommand>) -> ProcessResult {
        let ResolvedCommand {
            name,
            flags,
            command,
            data,
        } = resolved;
        let mode = self.mode;
        let selection = self.selection;
        let result = self
            .execute(&name.to_string(), |executor| {
                executor.run_visual(mode, selection, &command, data)
            })
            .map(|execution| self.apply(execution))
            .map_err(VimError::from);
        if !matches!(
            command,
            VisualCommand::Move(_) | VisualCommand::SwitchKind(_) | VisualCommand::SwitchToSelect
        ) {
            self.motion_state.desired_column = None;
        }
        self.finish(name, flags, Command::Visual(command), data, result)
    }

    fn run_select_command(&mut self, name: KeyInputSet, command: SelectCommand, data: CommandData) -> ProcessResult {
        let selection = self.selection;
        let mut result = self
            .execute(&name.to_string(), |executor| {
                executor.run_select(selection, &command, data)
            })
            .map(|execution| self.apply(execution))
            .map_err(VimError::from);
        if let (Ok(_), SelectCommand::ReplaceSelection(c)) = (&result, &command) {
            if let Err(err) = self.run_insert_command(InsertCommand::InsertChar(*c)) {
                result = Err(err);
            }
        }
        self.finish(name, CommandFlags::empty(), Command::Select(command), data, result)
    }

    fn run_insert_key(&mut self, name: KeyInputSet, command: InsertCommand) -> ProcessResult {
        let result = self.run_insert_command(command.clone());
        self.finish(name, CommandFlags::empty(), Command::Insert(command), CommandData::default(), result)
    }

    fn run_insert_command(&mut self, command: InsertCommand) -> Result<ModeSwitch, VimError> {
        let mut session = self.insert_session.take().unwrap_or_else(|| {
            let kind = if self.mode == ModeKind::Replace {
                InsertKind::Replace
            } else {
                InsertKind::Insert
            };
            InsertSession::new(kind, None)
        });
        let caret = self.caret;
        match self.execute("insert", |executor| executor.run_insert(caret, &command, &mut session)) {
            Ok(execution) => {
                let leaving = !target_mode(self.mode, self.previous_mode, &execution.switch).is_insert();
                if leaving {
                    if let Some(run) = self.pending_change.take() {
                        let inserted = self.registers.get_register(RegisterName::LastInserted).value.text();
                        self.last_change = Some(LastChange {
                            run,
                            inserted: Some(inserted),
                        });
                    }
                } else {
                    self.insert_session = Some(session);
                }
                Ok(self.apply(execution))
            }
            Err(err) => {
                // The whole session was rolled back with its transaction.
                self.enter_mode(ModeKind::Normal, None);
                Err(err.into())
            }
        }
    }

    fn run_command_line(&mut self, command: CommandLineCommand) -> ProcessResult {
        match command {
            CommandLineCommand::Execute => {
                let line = std::mem::take(&mut self.command_line);
                self.enter_mode(ModeKind::Normal, None);
                if line.trim().is_empty() {
                    return ProcessResult::Handled;
                }
                self.registers
                    .set_read_only_register(RegisterName::LastCommandLine, &line);
                self.last_command_line = Some(line.clone());
                match self.run_ex_line(&line) {
                    Ok(()) => ProcessResult::Handled,
                    Err(err) => self.fail(err),
                }
            }
            CommandLineCommand::Backspace => {
                if self.command_line.pop().is_none() {
                    self.enter_mode(ModeKind::Normal, None);
                }
                ProcessResult::Handled
            }
            CommandLineCommand::Cancel => {
                self.command_line.clear();
                self.enter_mode(ModeKind::Normal, None);
                ProcessResult::Cancelled
            }
        }
    }

    fn run_ex_line(&mut self, line: &str) -> Result<(), VimError> {
        debug!(line, "run ex command");
        let caret = self.caret;
        let execution = self.execute(line, |executor| executor.run_ex(caret, line))?;
        self.apply(execution);
        Ok(())
    }
}
