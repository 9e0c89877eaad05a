use std::fmt;

/// Raw flags recognized on the command line. Independent booleans; any
/// combination is legal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    pub publish: bool,
    pub test: bool,
    pub clean: bool,
}

impl RunFlags {
    /// Pick `publish`, `test` and `clean` out of free-form tokens. Anything
    /// else is ignored.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = RunFlags::default();
        for token in tokens {
            match token.as_ref() {
                "publish" => flags.publish = true,
                "test" => flags.test = true,
                "clean" => flags.clean = true,
                _ => {}
            }
        }
        flags
    }

    /// The recognized tokens that were set
    pub fn tokens(&self) -> Vec<&'static str> {
        [
            (self.publish, "publish"),
            (self.test, "test"),
            (self.clean, "clean"),
        ]
        .into_iter()
        .filter_map(|(set, token)| set.then_some(token))
        .collect()
    }
}

/// How the migration pass treats the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// No remote writes; every source id maps to itself
    Preview,
    /// Create items remotely and map to the ids they get
    Write,
}

impl WriteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteMode::Preview => "preview",
            WriteMode::Write => "write",
        }
    }
}

/// One step of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Teardown,
    Migrate(WriteMode),
    Seed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Teardown => f.write_str("teardown"),
            Stage::Migrate(mode) => write!(f, "migrate ({})", mode.as_str()),
            Stage::Seed => f.write_str("seed fixtures"),
        }
    }
}

/// Every behavior a combination of flags can select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// `clean` present: wipe the destination and stop, whatever else was given
    Clean,
    /// No flags: dry run of the migration pass
    Preview,
    /// `publish`: wipe, then migrate for real
    Publish,
    /// `test`: dry run, then wipe and seed fixtures
    PreviewThenSeed,
    /// `publish test`: wipe, migrate, wipe again, seed fixtures
    PublishThenSeed,
}

impl RunMode {
    pub fn resolve<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RunFlags::from_tokens(tokens).into()
    }

    /// Stages executed for this mode, in order
    pub fn stages(self) -> &'static [Stage] {
        match self {
            RunMode::Clean => &[Stage::Teardown],
            RunMode::Preview => &[Stage::Migrate(WriteMode::Preview)],
            RunMode::Publish => &[Stage::Teardown, Stage::Migrate(WriteMode::Write)],
            RunMode::PreviewThenSeed => &[
                Stage::Migrate(WriteMode::Preview),
                Stage::Teardown,
                Stage::Seed,
            ],
            RunMode::PublishThenSeed => &[
                Stage::Teardown,
                Stage::Migrate(WriteMode::Write),
                Stage::Teardown,
                Stage::Seed,
            ],
        }
    }

    /// Whether any stage reads the source catalog
    pub fn reads_source(self) -> bool {
        self.stages().iter().any(|stage| matches!(stage, Stage::Migrate(_)))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Clean => "clean",
            RunMode::Preview => "preview",
            RunMode::Publish => "publish",
            RunMode::PreviewThenSeed => "preview + test",
            RunMode::PublishThenSeed => "publish + test",
        }
    }
}

impl From<RunFlags> for RunMode {
    fn from(flags: RunFlags) -> Self {
        match flags {
            RunFlags { clean: true, .. } => RunMode::Clean,
            RunFlags { publish: false, test: false, .. } => RunMode::Preview,
            RunFlags { publish: true, test: false, .. } => RunMode::Publish,
            RunFlags { publish: false, test: true, .. } => RunMode::PreviewThenSeed,
            RunFlags { publish: true, test: true, .. } => RunMode::PublishThenSeed,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
