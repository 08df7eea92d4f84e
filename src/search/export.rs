use core::fmt;

use super::SearchResult;

impl<M> SearchResult<M> {
    /// Write every candidate to a writer in CSV format.
    ///
    /// Columns: `index`, `rank`, `state`, `mean_score`, `std_score`,
    /// `mean_train_score`, `std_train_score`, `mean_fit_time_s`, one
    /// `split<i>_score` column per fold, one column per parameter name (in
    /// first-seen order), then `error`.
    ///
    /// Cells with no value (failed folds, missing train scores, parameters a
    /// sampled candidate does not set) are left empty.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn to_csv(&self, mut writer: impl std::io::Write) -> std::io::Result<()> {
        let mut param_names: Vec<&str> = Vec::new();
        for candidate in &self.candidates {
            for name in candidate.params.names() {
                if !param_names.contains(&name) {
                    param_names.push(name);
                }
            }
        }

        write!(
            writer,
            "index,rank,state,mean_score,std_score,mean_train_score,std_train_score,mean_fit_time_s"
        )?;
        for i in 0..self.n_splits() {
            write!(writer, ",split{i}_score")?;
        }
        for name in &param_names {
            write!(writer, ",{}", csv_escape(name))?;
        }
        writeln!(writer, ",error")?;

        for c in &self.candidates {
            write!(writer, "{}", c.index)?;
            write!(writer, ",{}", opt_cell(c.rank))?;
            write!(writer, ",{}", c.state.as_str())?;
            write!(writer, ",{}", opt_cell(c.mean_score))?;
            write!(writer, ",{}", opt_cell(c.std_score))?;
            write!(writer, ",{}", opt_cell(c.mean_train_score))?;
            write!(writer, ",{}", opt_cell(c.std_train_score))?;
            write!(writer, ",{}", c.mean_fit_time.as_secs_f64())?;
            for score in &c.fold_scores {
                write!(writer, ",{}", opt_cell(*score))?;
            }
            for name in &param_names {
                match c.params.get(name) {
                    Some(value) => write!(writer, ",{}", csv_escape(&value.to_string()))?,
                    None => write!(writer, ",")?,
                }
            }
            writeln!(writer, ",{}", csv_escape(c.error.as_deref().unwrap_or("")))?;
        }

        Ok(())
    }

    /// Export every candidate to a CSV file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn export_csv(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_csv(std::io::BufWriter::new(file))
    }

    /// Return a human-readable summary of the search.
    ///
    /// Includes the candidate and fold counts, the number of failures, the
    /// best mean score with its standard deviation, and the best parameters.
    #[must_use]
    pub fn summary(&self) -> String {
        use fmt::Write;

        let mut s = format!(
            "Search: {} candidates x {} folds | metric: {}",
            self.n_candidates(),
            self.n_splits(),
            self.metric_name
        );
        let n_failed = self.n_failed();
        if n_failed > 0 {
            let _ = write!(s, " ({n_failed} failed)");
        }

        let best = self.best();
        let _ = write!(
            s,
            "\nBest score: {:.4} (+/- {:.4}, candidate #{})",
            self.best_score(),
            best.std_score.unwrap_or(0.0),
            best.index
        );
        if !best.params.is_empty() {
            s.push_str("\nBest parameters:");
            for (name, value) in best.params.iter() {
                let _ = write!(s, "\n  {name} = {value}");
            }
        }
        let _ = write!(s, "\nElapsed: {:.3}s", self.elapsed.as_secs_f64());
        if let Some(refit) = self.refit_time {
            let _ = write!(s, " (refit {:.3}s)", refit.as_secs_f64());
        }
        s
    }
}

impl<M> fmt::Display for SearchResult<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize)]
struct JsonReport<'a> {
    metric: &'a str,
    best_index: usize,
    n_splits: usize,
    elapsed: core::time::Duration,
    folds: &'a [crate::split::Fold],
    candidates: &'a [super::CandidateResult],
}

#[cfg(feature = "serde")]
impl<M> SearchResult<M> {
    /// Serialize the search outcome as pretty-printed JSON.
    ///
    /// The object holds the metric name, best index, folds and every
    /// candidate. Requires the `serde` feature.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn to_json(&self, writer: impl std::io::Write) -> std::io::Result<()> {
        let report = JsonReport {
            metric: &self.metric_name,
            best_index: self.best_index,
            n_splits: self.n_splits(),
            elapsed: self.elapsed,
            folds: &self.folds,
            candidates: &self.candidates,
        };
        serde_json::to_writer_pretty(writer, &report).map_err(std::io::Error::other)
    }

    /// Export the search outcome as pretty-printed JSON to a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn export_json(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_json(std::io::BufWriter::new(file))
    }
}

fn opt_cell<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// Escape a string for CSV output. If the value contains a comma, quote, or
/// newline, wrap it in double-quotes and double any embedded quotes.
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
