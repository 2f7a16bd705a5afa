use std::fmt;

/// Signals a watcher can listen for.
///
/// On non-unix platforms only [`Signal::Interrupt`] (Ctrl-C) is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT` (Ctrl-C in a terminal).
    Interrupt,
    /// `SIGTERM` (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`.
    Hangup,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
}

impl Signal {
    /// Every signal known to this crate; used when a watcher listens for "all".
    pub const ALL: [Signal; 6] = [
        Signal::Interrupt,
        Signal::Terminate,
        Signal::Quit,
        Signal::Hangup,
        Signal::User1,
        Signal::User2,
    ];

    /// Conventional name, e.g. `SIGTERM`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Hangup => "SIGHUP",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }

    /// True if `self` is selected by `set` (an empty set selects everything).
    pub fn matches(&self, set: &[Signal]) -> bool {
        set.is_empty() || set.contains(self)
    }

    #[cfg(unix)]
    pub(crate) fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Quit => SignalKind::quit(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_matches_everything() {
        for sig in Signal::ALL {
            assert!(sig.matches(&[]));
        }
    }

    #[test]
    fn non_empty_set_is_exact() {
        let set = [Signal::Terminate];
        assert!(Signal::Terminate.matches(&set));
        assert!(!Signal::Interrupt.matches(&set));
        assert_eq!(Signal::Terminate.to_string(), "SIGTERM");
    }
}
