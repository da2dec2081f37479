//! Argument Signature Parsing
//!
//! Splits the raw argument list of a call into positional data (`rest`) and
//! the completion handlers a paradigm expects at the tail of the list.

use tracing::warn;

use crate::callable::{Arg, Handler};
use crate::paradigm::Paradigm;

/// A call's arguments as seen by one paradigm
#[derive(Debug, Clone, Default)]
pub struct ArgumentSignature {
    /// Positional arguments preceding the handlers
    pub rest: Vec<Arg>,
    /// Success handler (classical, baroque) or combined handler (modern)
    pub callback: Option<Handler>,
    /// Failure handler (classical, baroque)
    pub errback: Option<Handler>,
}

/// Parse `args` according to the conventions of `paradigm`
pub fn parse(paradigm: Paradigm, args: Vec<Arg>) -> ArgumentSignature {
    match paradigm {
        Paradigm::Classical => {
            let (callback, errback, rest) = split_pair(args);
            ArgumentSignature { rest, callback, errback }
        }
        Paradigm::Baroque => {
            let (errback, callback, rest) = split_pair(args);
            ArgumentSignature { rest, callback, errback }
        }
        Paradigm::Modern => parse_modern(args),
        Paradigm::Promise | Paradigm::Deferred => ArgumentSignature {
            rest: args,
            ..Default::default()
        },
    }
}

/// Number of handler arguments in the list, capped at two
fn handler_count(args: &[Arg]) -> usize {
    args.iter().filter(|a| a.is_handler()).take(2).count()
}

/// Slot extraction shared by classical and baroque.
///
/// Returns `(first, second, rest)` in positional order. With a single handler
/// it occupies the first slot and the second is a no-op. With two or more, the
/// literal last two positions are taken whatever they hold.
fn split_pair(mut args: Vec<Arg>) -> (Option<Handler>, Option<Handler>, Vec<Arg>) {
    match handler_count(&args) {
        0 => (None, None, args),
        1 => {
            let first = args.pop().and_then(slot_handler);
            (first, Some(Handler::noop()), args)
        }
        _ => {
            let second = args.pop().and_then(slot_handler);
            let first = args.pop().and_then(slot_handler);
            (first, second, args)
        }
    }
}

fn parse_modern(mut args: Vec<Arg>) -> ArgumentSignature {
    let callback = args.pop().and_then(slot_handler);
    ArgumentSignature {
        rest: args,
        callback,
        errback: None,
    }
}

fn slot_handler(arg: Arg) -> Option<Handler> {
    match arg {
        Arg::Handler(h) => Some(h),
        Arg::Value(v) => {
            warn!("Data value {} found in a handler position, ignoring it", v);
            None
        }
    }
}
