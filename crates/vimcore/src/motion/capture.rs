//! Reading motions from keys.
//!
//! The same table serves plain movement in Normal and Visual mode and the
//! motion that follows an operator.

use std::rc::Rc;

use super::{CharSearch, CharSearchKind, Motion, MotionArgument, MotionContext, MotionData, TextObject};
use crate::binding::{BindData, BindDataStorage, BindResult, BindingKind, CommandBinding, CommandFlags, KeyRemapMode};
use crate::host::SearchDirection;
use crate::key::{KeyInputSet, VimKey};
use crate::text::WordKind;

/// What follows a motion's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MotionEntry {
    /// The name alone.
    Simple(Motion),
    /// A target character (`f{c}`).
    CharSearch(CharSearchKind, SearchDirection),
    /// A pattern ended by `<CR>` (`/pat<CR>`).
    Search(SearchDirection),
}

impl MotionEntry {
    fn resolve<T: 'static>(&self, finish: Rc<dyn Fn(Motion) -> T>) -> BindResult<T> {
        match self {
            MotionEntry::Simple(motion) => BindResult::Complete(finish(motion.clone())),
            MotionEntry::CharSearch(..) | MotionEntry::Search(_) => {
                BindResult::NeedMoreInput(self.argument_bind_data(finish))
            }
        }
    }

    /// Continuation reading the entry's argument. Plain entries complete on
    /// any key, so this is only used for the argument-taking ones.
    fn argument_bind_data<T: 'static>(&self, finish: Rc<dyn Fn(Motion) -> T>) -> BindData<T> {
        match *self {
            MotionEntry::CharSearch(kind, direction) => BindData::read_char(move |target| {
                BindResult::Complete(finish(Motion::CharSearch(CharSearch {
                    kind,
                    direction,
                    target,
                })))
            }),
            MotionEntry::Search(direction) => search_input(direction, String::new(), finish),
            MotionEntry::Simple(ref motion) => {
                let motion = motion.clone();
                BindData::new(None, move |_| BindResult::Complete(finish(motion.clone())))
            }
        }
    }
}

/// Reads a search pattern up to `<CR>`. `<BS>` on an empty pattern cancels.
fn search_input<T: 'static>(
    direction: SearchDirection,
    pattern: String,
    finish: Rc<dyn Fn(Motion) -> T>,
) -> BindData<T> {
    BindData::new(Some(KeyRemapMode::CommandLine), move |key| match key.key() {
        VimKey::Escape => BindResult::Cancelled,
        VimKey::Enter => BindResult::Complete(finish(Motion::Search {
            pattern: pattern.clone(),
            direction,
        })),
        VimKey::Back => {
            if pattern.is_empty() {
                return BindResult::Cancelled;
            }
            let mut shorter = pattern.clone();
            shorter.pop();
            BindResult::NeedMoreInput(search_input(direction, shorter, Rc::clone(&finish)))
        }
        _ => {
            let mut longer = pattern.clone();
            if let Some(c) = key.printable_char() {
                longer.push(c);
            }
            BindResult::NeedMoreInput(search_input(direction, longer, Rc::clone(&finish)))
        }
    })
}

/// Motions available everywhere a motion is accepted.
pub(crate) fn motion_table() -> Vec<(KeyInputSet, MotionEntry)> {
    use MotionEntry::Simple;
    use WordKind::{BigWord, NormalWord};

    let entries = [
        ("h", Simple(Motion::CharLeft)),
        ("<Left>", Simple(Motion::CharLeft)),
        ("l", Simple(Motion::CharRight)),
        ("<Right>", Simple(Motion::CharRight)),
        ("<Space>", Simple(Motion::CharRight)),
        ("j", Simple(Motion::LineDown)),
        ("<Down>", Simple(Motion::LineDown)),
        ("k", Simple(Motion::LineUp)),
        ("<Up>", Simple(Motion::LineUp)),
        ("w", Simple(Motion::WordForward(NormalWord))),
        ("W", Simple(Motion::WordForward(BigWord))),
        ("b", Simple(Motion::WordBackward(NormalWord))),
        ("B", Simple(Motion::WordBackward(BigWord))),
        ("e", Simple(Motion::EndOfWord(NormalWord))),
        ("E", Simple(Motion::EndOfWord(BigWord))),
        ("0", Simple(Motion::BeginningOfLine)),
        ("<Home>", Simple(Motion::BeginningOfLine)),
        ("^", Simple(Motion::FirstNonBlank)),
        ("$", Simple(Motion::EndOfLine)),
        ("<End>", Simple(Motion::EndOfLine)),
        ("gg", Simple(Motion::FirstLine)),
        ("G", Simple(Motion::LastLine)),
        ("+", Simple(Motion::LineDownToFirstNonBlank)),
        ("<CR>", Simple(Motion::LineDownToFirstNonBlank)),
        ("-", Simple(Motion::LineUpToFirstNonBlank)),
        ("}", Simple(Motion::ParagraphForward)),
        ("{", Simple(Motion::ParagraphBackward)),
        (";", Simple(Motion::RepeatCharSearch)),
        (",", Simple(Motion::RepeatCharSearchReverse)),
        ("n", Simple(Motion::NextMatch)),
        ("N", Simple(Motion::PreviousMatch)),
        ("%", Simple(Motion::MatchingToken)),
        ("f", MotionEntry::CharSearch(CharSearchKind::ToChar, SearchDirection::Forward)),
        ("F", MotionEntry::CharSearch(CharSearchKind::ToChar, SearchDirection::Backward)),
        ("t", MotionEntry::CharSearch(CharSearchKind::TillChar, SearchDirection::Forward)),
        ("T", MotionEntry::CharSearch(CharSearchKind::TillChar, SearchDirection::Backward)),
        ("/", MotionEntry::Search(SearchDirection::Forward)),
        ("?", MotionEntry::Search(SearchDirection::Backward)),
    ];
    entries
        .into_iter()
        .map(|(name, entry)| (KeyInputSet::from_notation(name), entry))
        .collect()
}

/// Text objects, accepted after an operator and in Visual mode.
pub(crate) fn text_object_table() -> Vec<(KeyInputSet, MotionEntry)> {
    let mut entries = Vec::new();
    for (around, prefix) in [(false, 'i'), (true, 'a')] {
        let mut add = |suffix: &str, object: TextObject| {
            let name = KeyInputSet::from_notation(&format!("{prefix}{suffix}"));
            entries.push((name, MotionEntry::Simple(Motion::TextObject(object))));
        };
        add("w", TextObject::Word { kind: WordKind::NormalWord, around });
        add("W", TextObject::Word { kind: WordKind::BigWord, around });
        add("p", TextObject::Paragraph { around });
        for (keys, open, close) in [
            (&["(", ")", "b"][..], '(', ')'),
            (&["[", "]"][..], '[', ']'),
            (&["{", "}", "B"][..], '{', '}'),
            (&["<lt>", ">"][..], '<', '>'),
        ] {
            for suffix in keys {
                add(suffix, TextObject::Block { open, close, around });
            }
        }
        for quote in ['"', '\'', '`'] {
            add(&quote.to_string(), TextObject::Quote { quote, around });
        }
    }
    entries
}

struct CaptureTable {
    entries: Vec<(KeyInputSet, MotionEntry)>,
    line_keys: Vec<KeyInputSet>,
}

/// Continuation reading the motion that follows an operator: an optional
/// count, then a motion, a text object, or one of `line_keys` for whole
/// lines.
pub fn motion_bind_data(line_keys: Vec<KeyInputSet>) -> BindData<MotionData> {
    let mut entries = motion_table();
    entries.extend(text_object_table());
    capture(Rc::new(CaptureTable { entries, line_keys }), None, KeyInputSet::empty())
}

fn capture(table: Rc<CaptureTable>, count: Option<usize>, typed: KeyInputSet) -> BindData<MotionData> {
    BindData::new(Some(KeyRemapMode::OperatorPending), move |key| {
        if key.is_escape() {
            return BindResult::Cancelled;
        }
        if typed.is_empty() {
            if let Some(digit) = key.digit() {
                if digit != 0 || count.is_some() {
                    let count = count.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize);
                    return BindResult::NeedMoreInput(capture(Rc::clone(&table), Some(count), typed.clone()));
                }
            }
        }

        let keys = typed.add(key);
        let argument = MotionArgument::new(MotionContext::AfterOperator, count, None);
        if table.line_keys.contains(&keys) {
            return BindResult::Complete(MotionData::new(Motion::WholeLine, argument));
        }

        let mut longer = table
            .line_keys
            .iter()
            .any(|name| name.len() > keys.len() && name.starts_with(&keys));
        let mut exact = None;
        for (name, entry) in table.entries.iter().filter(|(name, _)| name.starts_with(&keys)) {
            if name.len() == keys.len() {
                exact = Some(entry);
            } else {
                longer = true;
            }
        }

        match exact {
            Some(entry) => entry.resolve(Rc::new(move |motion| MotionData::new(motion, argument))),
            None if longer => BindResult::NeedMoreInput(capture(Rc::clone(&table), count, keys)),
            None => BindResult::Error,
        }
    })
}

/// Movement bindings for a mode: every motion becomes a command through
/// `convert`. The command's count is the motion's count.
pub(crate) fn movement_bindings<T: Clone + 'static>(
    text_objects: bool,
    convert: impl Fn(Motion) -> T + 'static,
) -> Vec<CommandBinding<T>> {
    let convert: Rc<dyn Fn(Motion) -> T> = Rc::new(convert);
    let mut entries = motion_table();
    if text_objects {
        entries.extend(text_object_table());
    }

    entries
        .into_iter()
        .map(|(name, entry)| {
            let kind = match entry {
                MotionEntry::Simple(motion) => BindingKind::Normal(convert(motion)),
                MotionEntry::CharSearch(..) => {
                    BindingKind::Complex(BindDataStorage::Simple(entry.argument_bind_data(Rc::clone(&convert))))
                }
                MotionEntry::Search(_) => {
                    let convert = Rc::clone(&convert);
                    BindingKind::Complex(BindDataStorage::complex(move || {
                        entry.argument_bind_data(Rc::clone(&convert))
                    }))
                }
            };
            CommandBinding {
                name,
                flags: CommandFlags::MOVEMENT,
                kind,
            }
        })
        .collect()
}
