use {std::future::Future, tokio::sync::Mutex};

/// Nonces of the owner account. A send holds the lock from picking its nonce
/// until the node answered, so concurrent sends never share a nonce.
#[derive(Debug, Default)]
pub struct Nonces(Mutex<Option<u64>>);

impl Nonces {
    /// Runs `send` with the next nonce. The cached nonce only advances when
    /// `send` succeeded, after a failure the next call fetches it again.
    pub async fn with_next<T, E, F, S>(
        &self,
        fetch: F,
        send: impl FnOnce(u64) -> S,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<u64, E>>,
        S: Future<Output = Result<T, E>>,
    {
        let mut cached = self.0.lock().await;
        let nonce = match *cached {
            Some(nonce) => nonce,
            None => fetch.await?,
        };
        let result = send(nonce).await;
        *cached = match result {
            Ok(_) => nonce.checked_add(1),
            Err(_) => None,
        };
        result
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::atomic::{AtomicUsize, Ordering},
    };

    #[tokio::test]
    async fn concurrent_sends_get_consecutive_nonces() {
        let nonces = Nonces::default();
        let fetches = AtomicUsize::new(0);
        let fetch = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(7)
        };
        let send = |nonce: u64| async move {
            tokio::task::yield_now().await;
            Ok::<_, ()>(nonce)
        };

        let (a, b, c) = tokio::join!(
            nonces.with_next(fetch(), send),
            nonces.with_next(fetch(), send),
            nonces.with_next(fetch(), send),
        );
        let mut used = vec![a.unwrap(), b.unwrap(), c.unwrap()];
        used.sort_unstable();
        assert_eq!(used, [7, 8, 9]);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_send_refetches_nonce() {
        let nonces = Nonces::default();
        let rejected = nonces
            .with_next(async { Ok(3) }, |_| async { Err::<u64, _>("nonce too low") })
            .await;
        assert_eq!(rejected, Err("nonce too low"));

        let sent = nonces
            .with_next(async { Ok::<_, &str>(5) }, |nonce| async move { Ok(nonce) })
            .await;
        assert_eq!(sent, Ok(5));

        let cached = nonces
            .with_next(async { Err("not fetched") }, |nonce| async move { Ok(nonce) })
            .await;
        assert_eq!(cached, Ok(6));
    }
}
