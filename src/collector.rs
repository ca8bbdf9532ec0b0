/// Collector identity: the closed set of garbage collectors this tool reports on.
///
/// Every classification path (log content, log file names, latency file names,
/// GC-summary rows) resolves to one of these or to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collector {
    G1,
    Zgc,
    Shenandoah,
}

impl Collector {
    /// Report order: G1, ZGC, Shenandoah.
    pub const ALL: [Collector; 3] = [Collector::G1, Collector::Zgc, Collector::Shenandoah];

    /// Canonical lowercase token (`g1`, `zgc`, `shen`).
    pub fn token(self) -> &'static str {
        match self {
            Collector::G1 => "g1",
            Collector::Zgc => "zgc",
            Collector::Shenandoah => "shen",
        }
    }

    /// Name reported when the identity is inferred from a file name.
    pub fn display_name(self) -> &'static str {
        match self {
            Collector::G1 => "G1",
            Collector::Zgc => "ZGC",
            Collector::Shenandoah => "Shenandoah",
        }
    }

    /// Exact token match, case-insensitive. Used for latency file prefixes.
    pub fn from_token(token: &str) -> Option<Collector> {
        let token = token.to_lowercase();
        Collector::ALL.into_iter().find(|c| c.token() == token)
    }

    /// Substring inference: "shen" beats "zgc" beats "g1".
    ///
    /// `gc-shen-g1.log` is Shenandoah; names without any marker are unresolved.
    pub fn infer(name: &str) -> Option<Collector> {
        let name = name.to_lowercase();
        if name.contains("shen") {
            Some(Collector::Shenandoah)
        } else if name.contains("zgc") {
            Some(Collector::Zgc)
        } else if name.contains("g1") {
            Some(Collector::G1)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}
