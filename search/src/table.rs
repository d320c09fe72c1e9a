//! `SearchTableV1`: the result of a search and its wire format.
//!
//! On the wire a table is a JSON array of `[action, gflops, elapsed_seconds]`
//! triples in step order. The first row is the root and carries an empty
//! action.

/// One row of a search table.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStepV1 {
    pub action: String,
    pub gflops: f64,
    pub elapsed: f64,
}

/// Best path found by a search.
///
/// `actions[0]` is always `""` (the root). `times` is the time-to-reach-depth
/// curve and may be longer than `actions` when the search went deeper than
/// the best node; rows pair entries by index and stop at the shortest list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchTableV1 {
    pub actions: Vec<String>,
    pub rewards: Vec<f64>,
    pub times: Vec<f64>,
}

impl SearchTableV1 {
    /// Build a table from rows.
    #[must_use]
    pub fn from_rows(rows: &[SearchStepV1]) -> Self {
        Self {
            actions: rows.iter().map(|r| r.action.clone()).collect(),
            rewards: rows.iter().map(|r| r.gflops).collect(),
            times: rows.iter().map(|r| r.elapsed).collect(),
        }
    }

    /// Rows in step order.
    #[must_use]
    pub fn rows(&self) -> Vec<SearchStepV1> {
        self.actions
            .iter()
            .zip(&self.rewards)
            .zip(&self.times)
            .map(|((action, gflops), elapsed)| SearchStepV1 {
                action: action.clone(),
                gflops: *gflops,
                elapsed: *elapsed,
            })
            .collect()
    }

    /// Actions after the root row.
    #[must_use]
    pub fn path(&self) -> &[String] {
        self.actions.get(1..).unwrap_or(&[])
    }

    /// Reward at the last step of the best path.
    #[must_use]
    pub fn final_reward(&self) -> Option<f64> {
        self.rewards.last().copied()
    }

    /// Append `next` (whose root row is the last state of `self`), shifting
    /// its times by `time_offset` seconds. `next`'s root row is dropped.
    #[must_use]
    pub fn concat(&self, next: &Self, time_offset: f64) -> Self {
        let mut rows = self.rows();
        rows.extend(next.rows().into_iter().skip(1).map(|mut r| {
            r.elapsed += time_offset;
            r
        }));
        Self::from_rows(&rows)
    }

    /// Wire representation.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.rows()
                .into_iter()
                .map(|r| serde_json::json!([r.action, r.gflops, r.elapsed]))
                .collect(),
        )
    }

    /// Wire representation as a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_json_value())
    }

    /// Parse the wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the input is not an array of
    /// `[string, number, number]` triples.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let triples: Vec<(String, f64, f64)> = serde_json::from_str(s)?;
        let rows: Vec<SearchStepV1> = triples
            .into_iter()
            .map(|(action, gflops, elapsed)| SearchStepV1 {
                action,
                gflops,
                elapsed,
            })
            .collect();
        Ok(Self::from_rows(&rows))
    }
}
