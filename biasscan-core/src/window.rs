use crate::error::InvalidWindowSpec;
use crate::stimulus::Action;
use crate::trial::ResponseAlphabet;

/// Window length plus the action counted as biased
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    tau: usize,
    target: Action,
}

impl WindowSpec {
    pub fn new(tau: usize, target: Action) -> Result<Self, InvalidWindowSpec> {
        if tau == 0 {
            return Err(InvalidWindowSpec::ZeroTau);
        }
        Ok(Self { tau, target })
    }

    /// Like [`WindowSpec::new`], but also requires `target` to be a known response.
    pub fn within(
        tau: usize,
        target: Action,
        alphabet: &ResponseAlphabet,
    ) -> Result<Self, InvalidWindowSpec> {
        let spec = Self::new(tau, target)?;
        if !alphabet.contains(target) {
            return Err(InvalidWindowSpec::UnknownTarget {
                action: target.label(),
                alphabet: alphabet.to_string(),
            });
        }
        Ok(spec)
    }

    /// Always at least 1
    pub fn tau(&self) -> usize {
        self.tau
    }

    pub fn target(&self) -> Action {
        self.target
    }
}
