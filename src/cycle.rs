use crate::catalog::{self, ReadCommand, Tier};
use crate::snapshot::Section;

/// Which half of the staged refresh the next poll performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Next poll issues the base reads.
    AwaitingFullRefresh,
    /// Next poll issues the crosspoint-gain reads.
    AwaitingIncrementalRefresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Base,
    Crosspoint,
    /// Lite mode: monitoring reads every call, nothing staged.
    Monitoring,
}

impl Stage {
    pub fn reads(&self) -> Vec<ReadCommand> {
        match self {
            Stage::Base => {
                let mut reads = catalog::reads(Tier::Lite);
                reads.extend(catalog::reads(Tier::Core));
                reads
            }
            Stage::Crosspoint => catalog::reads(Tier::Crosspoint),
            Stage::Monitoring => catalog::reads(Tier::Lite),
        }
    }

    /// Section rebuilt by this stage once a snapshot exists.
    pub fn section(&self) -> Section {
        match self {
            Stage::Base => Section::Base,
            Stage::Crosspoint => Section::Crosspoint,
            Stage::Monitoring => Section::Monitoring,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollCycle {
    state: CycleState,
    config_management: bool,
}

impl PollCycle {
    pub fn new(config_management: bool) -> Self {
        Self {
            state: CycleState::AwaitingFullRefresh,
            config_management,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn stage(&self) -> Stage {
        match (self.config_management, self.state) {
            (false, _) => Stage::Monitoring,
            (true, CycleState::AwaitingFullRefresh) => Stage::Base,
            (true, CycleState::AwaitingIncrementalRefresh) => Stage::Crosspoint,
        }
    }

    /// Called exactly once per completed poll.
    pub fn advance(&mut self) {
        if !self.config_management {
            return;
        }
        self.state = match self.state {
            CycleState::AwaitingFullRefresh => CycleState::AwaitingIncrementalRefresh,
            CycleState::AwaitingIncrementalRefresh => CycleState::AwaitingFullRefresh,
        };
    }

    /// Returns true when the mode actually changed; staging restarts from scratch.
    pub fn set_config_management(&mut self, enabled: bool) -> bool {
        if self.config_management == enabled {
            return false;
        }
        self.config_management = enabled;
        self.reset();
        true
    }

    pub fn reset(&mut self) {
        self.state = CycleState::AwaitingFullRefresh;
    }
}
