use std::fmt;

/// Setup and run phases, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    ContextReady,
    GeometryUploaded,
    ShadersCompiled,
    Linked,
    Validated,
    Rendering,
    Terminated,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::Uninitialized => Stage::ContextReady,
            Stage::ContextReady => Stage::GeometryUploaded,
            Stage::GeometryUploaded => Stage::ShadersCompiled,
            Stage::ShadersCompiled => Stage::Linked,
            Stage::Linked => Stage::Validated,
            Stage::Validated => Stage::Rendering,
            Stage::Rendering | Stage::Terminated => Stage::Terminated,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug)]
pub struct Lifecycle {
    stage: Stage,
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle {
            stage: Stage::Uninitialized,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Moves to the following stage and returns it.
    pub fn advance(&mut self) -> Stage {
        let next = self.stage.next();
        if next != self.stage {
            log::info!("{} -> {}", self.stage, next);
        }
        self.stage = next;
        next
    }

    /// Any failure ends the program from whatever stage it was in.
    pub fn fail(&mut self) {
        log::info!("{} -> {} (failed)", self.stage, Stage::Terminated);
        self.stage = Stage::Terminated;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_path_visits_every_stage_in_order() {
        let mut lifecycle = Lifecycle::new();
        let mut visited = vec![lifecycle.stage()];
        while lifecycle.stage() != Stage::Terminated {
            visited.push(lifecycle.advance());
        }
        assert_eq!(
            visited,
            vec![
                Stage::Uninitialized,
                Stage::ContextReady,
                Stage::GeometryUploaded,
                Stage::ShadersCompiled,
                Stage::Linked,
                Stage::Validated,
                Stage::Rendering,
                Stage::Terminated,
            ]
        );
    }

    #[test]
    fn failure_skips_rendering() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance();
        lifecycle.advance();
        assert_eq!(lifecycle.stage(), Stage::GeometryUploaded);

        lifecycle.fail();
        assert_eq!(lifecycle.stage(), Stage::Terminated);
        assert_eq!(lifecycle.advance(), Stage::Terminated);
    }

    #[test]
    fn terminated_is_final() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.fail();
        assert_eq!(lifecycle.advance(), Stage::Terminated);
        assert_eq!(lifecycle.advance(), Stage::Terminated);
    }
}
