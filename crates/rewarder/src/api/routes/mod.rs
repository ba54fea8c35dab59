mod health;
mod healthz;
mod reward;

pub(super) use {health::health, healthz::healthz, reward::reward};
