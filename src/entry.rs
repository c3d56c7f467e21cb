//! Statistic entry points
//!
//! Each entry point takes the context lock for its whole run: it checks the
//! handle, hands the buffer (uncopied) to the matching kernel and returns the
//! scalar. The guard drops on every path, so a failing call never leaves the
//! context locked.

use crate::error::{Result, RuntimeError};
use crate::runtime::{ArrayF64, Context};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// The closed set of statistics this runtime computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Sum,
    Mean,
    Variance,
    Skew,
    Kurtosis,
    Stddev,
}

impl Statistic {
    /// All statistics, in entry-point order.
    pub const ALL: [Statistic; 6] = [
        Statistic::Sum,
        Statistic::Mean,
        Statistic::Variance,
        Statistic::Skew,
        Statistic::Kurtosis,
        Statistic::Stddev,
    ];

    /// Entry-point name.
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Sum => "sum",
            Statistic::Mean => "mean",
            Statistic::Variance => "variance",
            Statistic::Skew => "skew",
            Statistic::Kurtosis => "kurtosis",
            Statistic::Stddev => "stddev",
        }
    }

    /// Parse an entry-point name or a common alias.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sum" => Some(Statistic::Sum),
            "mean" | "avg" | "average" => Some(Statistic::Mean),
            "variance" | "var" => Some(Statistic::Variance),
            "skew" | "skewness" => Some(Statistic::Skew),
            "kurtosis" | "kurt" => Some(Statistic::Kurtosis),
            "stddev" | "std" | "sd" => Some(Statistic::Stddev),
            _ => None,
        }
    }

    /// Kernel implementing this statistic.
    pub fn kernel(&self) -> fn(&[f64]) -> f64 {
        match self {
            Statistic::Sum => statrt_kernels::sum,
            Statistic::Mean => statrt_kernels::mean,
            Statistic::Variance => statrt_kernels::variance,
            Statistic::Skew => statrt_kernels::skewness,
            Statistic::Kurtosis => statrt_kernels::kurtosis,
            Statistic::Stddev => statrt_kernels::stddev,
        }
    }

    /// Passes the kernel makes over the data.
    pub fn passes(&self) -> u8 {
        match self {
            Statistic::Sum | Statistic::Mean => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self> {
        Statistic::from_name(s).ok_or_else(|| RuntimeError::UnknownStatistic(s.to_string()))
    }
}

impl Context {
    /// Run `stat` over `array`.
    pub fn entry(&self, stat: Statistic, array: &ArrayF64) -> Result<f64> {
        let mut state = self.lock();
        if !array.belongs_to(&self.ledger) {
            return self.fail(&mut state, RuntimeError::ForeignArray);
        }

        let config = self.config();
        let start = (config.debugging || config.logging).then(Instant::now);
        let result = (stat.kernel())(array.values());

        if let Some(start) = start {
            let elapsed = start.elapsed();
            if config.debugging {
                let timing = state.timings.entry(stat).or_default();
                timing.runs += 1;
                timing.total += elapsed;
            }
            if config.logging {
                info!(
                    target: "statrt::entry",
                    "Entry point '{}' on {} elements took {} us",
                    stat,
                    array.len(),
                    elapsed.as_micros()
                );
            }
        }
        Ok(result)
    }

    pub fn sum(&self, array: &ArrayF64) -> Result<f64> {
        self.entry(Statistic::Sum, array)
    }

    pub fn mean(&self, array: &ArrayF64) -> Result<f64> {
        self.entry(Statistic::Mean, array)
    }

    pub fn variance(&self, array: &ArrayF64) -> Result<f64> {
        self.entry(Statistic::Variance, array)
    }

    pub fn skew(&self, array: &ArrayF64) -> Result<f64> {
        self.entry(Statistic::Skew, array)
    }

    pub fn kurtosis(&self, array: &ArrayF64) -> Result<f64> {
        self.entry(Statistic::Kurtosis, array)
    }

    pub fn stddev(&self, array: &ArrayF64) -> Result<f64> {
        self.entry(Statistic::Stddev, array)
    }
}
