//! Advisory warning channel
//!
//! Warnings never abort construction; they are purely observational. The
//! channel is a per-thread hook so tests can intercept messages instead
//! of scraping stderr. The engine is single-threaded by design, so a
//! thread-local hook covers every caller.

use std::cell::RefCell;
use std::rc::Rc;

type Hook = Box<dyn FnMut(&str)>;

thread_local! {
    static HOOK: RefCell<Option<Hook>> = const { RefCell::new(None) };
}

/// Emit an advisory warning.
///
/// Routed through the installed hook when one is present, otherwise
/// written to stderr.
pub fn emit(msg: impl AsRef<str>) {
    let msg = msg.as_ref();
    let handled = HOOK.with(|hook| {
        if let Some(hook) = hook.borrow_mut().as_mut() {
            hook(msg);
            true
        } else {
            false
        }
    });
    if !handled {
        eprintln!("warning: {msg}");
    }
}

/// Run `f` with a collecting hook installed and return its output
/// together with every warning emitted on this thread while it ran.
///
/// The previously installed hook (if any) is put back afterwards, so
/// captures nest.
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let sink: Rc<RefCell<Vec<String>>> = Rc::default();
    let collector = {
        let sink = Rc::clone(&sink);
        Box::new(move |msg: &str| sink.borrow_mut().push(msg.to_string())) as Hook
    };
    let previous = HOOK.with(|hook| hook.borrow_mut().replace(collector));
    let out = f();
    HOOK.with(|hook| *hook.borrow_mut() = previous);
    let messages = sink.borrow().clone();
    (out, messages)
}
