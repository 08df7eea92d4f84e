use std::sync::Arc;
use std::time::Instant;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::estimator::Estimator;

use super::pool::resolve_jobs;
use super::{CellOutcome, Plan, Search, SearchResult, aggregate, evaluate_cell};

impl<E> Search<E>
where
    E: Estimator + 'static,
    E::Model: 'static,
{
    /// Run the search on a tokio runtime.
    ///
    /// Like [`fit`](Self::fit), but every candidate × fold cell runs inside
    /// [`spawn_blocking`](tokio::task::spawn_blocking), with at most
    /// `n_jobs` cells in flight at once. The refit of the best combination is
    /// also moved off the async threads. Results are identical to `fit` for
    /// the same seed.
    ///
    /// # Errors
    ///
    /// Same as [`fit`](Self::fit), plus `Error::TaskError` if the semaphore
    /// is closed or a blocking task panics.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use hypertune::prelude::*;
    ///
    /// struct Constant;
    /// struct Always(usize);
    ///
    /// impl Predictor for Always {
    ///     fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
    ///         vec![self.0; records.len()]
    ///     }
    /// }
    ///
    /// impl Estimator for Constant {
    ///     type Model = Always;
    ///     type Error = String;
    ///
    ///     fn param_names(&self) -> &[&'static str] {
    ///         &["label"]
    ///     }
    ///
    ///     fn fit(&self, params: &Params, _: &DatasetView<'_>) -> Result<Always, String> {
    ///         Ok(Always(params.get_i64("label").unwrap_or(0) as usize))
    ///     }
    /// }
    ///
    /// # #[cfg(feature = "async")]
    /// # async fn example() -> hypertune::Result<()> {
    /// let data = Arc::new(Dataset::new(vec![vec![0.0]; 6], vec![0, 0, 0, 0, 1, 1])?);
    /// let search = Search::builder(Constant)
    ///     .grid(ParameterGrid::builder().add("label", [0_i64, 1]).build()?)
    ///     .n_folds(3)
    ///     .n_jobs(2)
    ///     .build()?;
    ///
    /// let result = search.fit_async(data).await?;
    /// assert_eq!(result.best_params().get_i64("label"), Some(0));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fit_async(&self, dataset: Arc<Dataset>) -> Result<SearchResult<E::Model>> {
        let start = Instant::now();
        let plan = self.plan(&dataset.view(), self.config.seed)?;

        #[cfg(feature = "tracing")]
        {
            use tracing::Instrument;

            let span = tracing::info_span!(
                "search_async",
                n_candidates = plan.candidates.len(),
                n_splits = plan.folds.len(),
                n_jobs = self.config.n_jobs
            );
            self.run_plan_async(plan, dataset, start)
                .instrument(span)
                .await
        }
        #[cfg(not(feature = "tracing"))]
        {
            self.run_plan_async(plan, dataset, start).await
        }
    }

    async fn run_plan_async(
        &self,
        plan: Plan,
        dataset: Arc<Dataset>,
        start: Instant,
    ) -> Result<SearchResult<E::Model>> {
        use tokio::sync::Semaphore;
        use tokio::task::JoinSet;

        let deadline = self.config.timeout.map(|t| start + t);
        let view = dataset.view();

        let n_splits = plan.folds.len();
        let n_cells = plan.candidates.len() * n_splits;
        let semaphore = Arc::new(Semaphore::new(resolve_jobs(self.config.n_jobs)));
        let mut join_set: JoinSet<(usize, CellOutcome)> = JoinSet::new();
        let mut cells: Vec<Option<CellOutcome>> = (0..n_cells).map(|_| None).collect();
        let mut timed_out = false;

        for cell in 0..n_cells {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| Error::TaskError(e.to_string()))?;
            if deadline.is_some_and(|d| Instant::now() >= d) {
                timed_out = true;
                break;
            }

            let estimator = Arc::clone(&self.estimator);
            let metric = Arc::clone(&self.metric);
            let data = Arc::clone(&dataset);
            let params = plan.candidates[cell / n_splits].clone();
            let fold = plan.folds[cell % n_splits].clone();
            let return_train_score = self.config.return_train_score;

            join_set.spawn_blocking(move || {
                let _permit = permit;
                let outcome = evaluate_cell(
                    estimator.as_ref(),
                    metric.as_ref(),
                    &params,
                    &fold,
                    &data.view(),
                    return_train_score,
                );
                (cell, outcome)
            });

            while let Some(done) = join_set.try_join_next() {
                let (i, outcome) = done.map_err(|e| Error::TaskError(e.to_string()))?;
                cells[i] = Some(outcome);
            }
        }

        while let Some(done) = join_set.join_next().await {
            let (i, outcome) = done.map_err(|e| Error::TaskError(e.to_string()))?;
            cells[i] = Some(outcome);
        }

        let candidates = aggregate(&plan, cells);
        let mut result = self.finish(&plan, candidates, timed_out, start, &view, false)?;

        if self.config.refit {
            let estimator = Arc::clone(&self.estimator);
            let params = result.best_params().clone();
            let data = Arc::clone(&dataset);
            let candidate = result.best_index;
            let refit_start = Instant::now();

            let model = tokio::task::spawn_blocking(move || {
                estimator
                    .fit(&params, &data.view())
                    .map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| Error::TaskError(e.to_string()))?
            .map_err(|message| Error::EstimatorFit {
                candidate,
                fold: None,
                message,
            })?;

            result.best_model = Some(model);
            result.refit_time = Some(refit_start.elapsed());
            result.elapsed = start.elapsed();
        }

        Ok(result)
    }
}
