//! Logging and metrics for the reward pipeline. Keeps the domain code free
//! of observability details.

use {
    crate::domain::{
        eth,
        operation::{self, Operation},
        reward::{self, Reward, Stage},
    },
    std::time::Duration,
};

pub mod metrics;

pub fn stage(stage: Stage) {
    tracing::debug!(?stage, "entering stage");
    metrics::get()
        .stages
        .with_label_values(&[<&'static str>::from(stage)])
        .inc();
}

fn operation_state(state: operation::State) {
    metrics::get()
        .operations
        .with_label_values(&[<&'static str>::from(state)])
        .inc();
}

pub fn estimated(operation: &Operation, estimate: eth::Gas, gas_limit: eth::Gas) {
    tracing::debug!(%operation, %estimate, %gas_limit, "estimated gas");
    operation_state(operation::State::Estimated);
}

pub fn submitted(operation: &Operation, tx: eth::TxId) {
    tracing::info!(%operation, %tx, "submitted transaction");
    operation_state(operation::State::Submitted);
}

pub fn processed(result: &Result<Reward, reward::Error>, elapsed: Duration) {
    let metrics = metrics::get();
    metrics.processing_seconds.observe(elapsed.as_secs_f64());
    match result {
        Ok(reward) => {
            let state = reward.receipt.state();
            tracing::info!(
                player = %reward.claim.player,
                quiz = %reward.claim.quiz_id,
                tx = %reward.receipt.tx,
                block = %reward.receipt.block,
                gas_used = %reward.receipt.gas_used,
                ?state,
                ?elapsed,
                "reward confirmed"
            );
            operation_state(state);
            metrics.claims.with_label_values(&["success"]).inc();
            metrics.gas_used.observe(reward.receipt.gas_used.0 as f64);
        }
        Err(err) => {
            let kind = err.kind();
            let state = err.operation_state();
            match kind {
                reward::Kind::InvalidInput => tracing::debug!(?err, "rejected claim"),
                _ => tracing::warn!(?err, tx = ?err.tx(), ?state, ?elapsed, "reward failed"),
            }
            if let Some(state) = state {
                operation_state(state);
            }
            metrics
                .claims
                .with_label_values(&[<&'static str>::from(kind)])
                .inc();
        }
    }
}
