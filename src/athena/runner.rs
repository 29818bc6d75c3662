use anyhow::{Context, Result, anyhow, bail};
use aws_sdk_athena::types::{
    QueryExecution, QueryExecutionContext, QueryExecutionState, ResultConfiguration,
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::storage::S3Location;

/// Polling behaviour while waiting on a query.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Outcome of a query that reached `SUCCEEDED`.
#[derive(Debug, Clone)]
pub struct CompletedQuery {
    pub execution_id: String,
    /// Where Athena wrote the result CSV, if it reported one.
    pub output_location: Option<String>,
}

/// Submits statements to Athena and waits for them to finish.
pub struct QueryRunner {
    client: aws_sdk_athena::Client,
    output_location: String,
    poll: PollConfig,
}

impl QueryRunner {
    /// `output_location` is the `s3://` prefix query results are written to.
    pub fn new(config: &aws_config::SdkConfig, output_location: String, poll: PollConfig) -> Self {
        Self {
            client: aws_sdk_athena::Client::new(config),
            output_location,
            poll,
        }
    }

    /// Runs `sql`, optionally in the context of `database`, and blocks until
    /// the execution reaches a terminal state.
    #[tracing::instrument(skip(self, sql), fields(statement = %first_line(sql)))]
    pub async fn run(&self, sql: &str, database: Option<&str>) -> Result<CompletedQuery> {
        let execution_id = self.start(sql, database).await?;
        info!(execution_id = %execution_id, "Query submitted");
        self.wait(&execution_id).await
    }

    async fn start(&self, sql: &str, database: Option<&str>) -> Result<String> {
        let context = database.map(|db| QueryExecutionContext::builder().database(db).build());

        let resp = self
            .client
            .start_query_execution()
            .query_string(sql)
            .set_query_execution_context(context)
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&self.output_location)
                    .build(),
            )
            .send()
            .await
            .context("Athena StartQueryExecution failed")?;

        resp.query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Athena returned no query execution id"))
    }

    async fn wait(&self, execution_id: &str) -> Result<CompletedQuery> {
        let started = Instant::now();

        loop {
            let resp = self
                .client
                .get_query_execution()
                .query_execution_id(execution_id)
                .send()
                .await
                .with_context(|| format!("Athena GetQueryExecution failed for {execution_id}"))?;

            let execution = resp
                .query_execution()
                .ok_or_else(|| anyhow!("Athena returned no execution for {execution_id}"))?;

            if let Some(done) =
                poll_outcome(execution_id, execution, started.elapsed(), self.poll.timeout)?
            {
                return Ok(done);
            }
            tokio::time::sleep(self.poll.interval).await;
        }
    }
}

impl CompletedQuery {
    /// Location of the result CSV, falling back to `{output}/{id}.csv`.
    pub fn result_location(&self, output_prefix: &str) -> Result<S3Location> {
        match &self.output_location {
            Some(uri) => S3Location::parse(uri),
            None => S3Location::parse(&format!(
                "{}/{}.csv",
                output_prefix.trim_end_matches('/'),
                self.execution_id
            )),
        }
    }
}

/// Decides what one `GetQueryExecution` answer means: done, failed (with
/// Athena's state-change reason), timed out, or keep polling (`None`).
fn poll_outcome(
    execution_id: &str,
    execution: &QueryExecution,
    elapsed: Duration,
    timeout: Duration,
) -> Result<Option<CompletedQuery>> {
    let status = execution.status();
    let state = status.and_then(|s| s.state());
    let reason = status
        .and_then(|s| s.state_change_reason())
        .unwrap_or("no reason given");

    match classify(state) {
        Progress::Succeeded => {
            let output_location = execution
                .result_configuration()
                .and_then(|r| r.output_location())
                .map(str::to_string);
            info!(
                execution_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "Query succeeded"
            );
            Ok(Some(CompletedQuery {
                execution_id: execution_id.to_string(),
                output_location,
            }))
        }
        Progress::Failed(state) => {
            bail!("Athena query {execution_id} ended in state {state}: {reason}")
        }
        Progress::Pending if elapsed >= timeout => bail!(
            "Athena query {execution_id} did not finish within {}s",
            timeout.as_secs()
        ),
        Progress::Pending => {
            debug!(execution_id, state = ?state, "Query still running");
            Ok(None)
        }
    }
}

#[derive(Debug, PartialEq)]
enum Progress {
    Succeeded,
    Failed(&'static str),
    Pending,
}

fn classify(state: Option<&QueryExecutionState>) -> Progress {
    match state {
        Some(QueryExecutionState::Succeeded) => Progress::Succeeded,
        Some(QueryExecutionState::Failed) => Progress::Failed("FAILED"),
        Some(QueryExecutionState::Cancelled) => Progress::Failed("CANCELLED"),
        _ => Progress::Pending,
    }
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or("").trim()
}
