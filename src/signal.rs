use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Over,
    Under,
    NoEdge,
    NoLine,
}

impl Signal {
    pub fn label(self) -> &'static str {
        match self {
            Signal::Over => "Over",
            Signal::Under => "Under",
            Signal::NoEdge => "No Edge",
            Signal::NoLine => "No Line",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compares a sportsbook line against the model projection and the live pace.
///
/// Any missing input suppresses the signal. Otherwise a line strictly above
/// both references is an Under, strictly below both is an Over, and anything
/// in between (inclusive) has no edge.
pub fn betting_signal(line: Option<f64>, projection: Option<f64>, pace: Option<f64>) -> Signal {
    let (Some(line), Some(projection), Some(pace)) = (
        present(line),
        present(projection),
        present(pace),
    ) else {
        return Signal::NoLine;
    };
    if line > projection.max(pace) {
        return Signal::Under;
    }
    if line < projection.min(pace) {
        return Signal::Over;
    }
    Signal::NoEdge
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}
