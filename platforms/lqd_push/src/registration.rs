use common::{Availability, MessagingProvider, PushError, TokenSink};
use log::*;
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinError, JoinHandle};

/// 后台注册任务句柄，丢弃句柄不会取消任务
pub struct Registration {
    work: AbortHandle,
    handle: JoinHandle<Result<String, PushError>>,
}

impl Registration {
    /// 取消注册任务，on_complete 会收到 `Err(PushError::Cancelled)`
    pub fn cancel(&self) {
        self.work.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 等待注册结果
    pub async fn outcome(self) -> Result<String, PushError> {
        join_result(self.handle.await)
    }
}

fn join_result(
    joined: Result<Result<String, PushError>, JoinError>,
) -> Result<String, PushError> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(PushError::Cancelled),
        Err(e) => Err(PushError::Platform(e.to_string())),
    }
}

/// 在后台向消息服务注册设备，必须在tokio运行时中调用
pub fn register_device(
    provider: Arc<dyn MessagingProvider>,
    tokens: Arc<dyn TokenSink>,
    sender_id: impl Into<String>,
) -> Registration {
    register_device_with(provider, tokens, sender_id, |_| {})
}

/// 同register_device，注册结束后调用on_complete
pub fn register_device_with<F>(
    provider: Arc<dyn MessagingProvider>,
    tokens: Arc<dyn TokenSink>,
    sender_id: impl Into<String>,
    on_complete: F,
) -> Registration
where
    F: FnOnce(&Result<String, PushError>) + Send + 'static,
{
    let sender_id = sender_id.into();
    let work = tokio::spawn(async move {
        run_registration(provider.as_ref(), tokens.as_ref(), &sender_id).await
    });
    let abort = work.abort_handle();
    // The callback lives outside the work task so it still runs after abort.
    let handle = tokio::spawn(async move {
        let result = join_result(work.await);
        match &result {
            Ok(_) => {}
            Err(PushError::Io(e)) => error!("Cannot register for push messaging: {}", e),
            Err(PushError::ProviderUnavailable(e)) => {
                error!("Messaging client library cannot be found: {}", e)
            }
            Err(e) => debug!("Push registration did not complete: {}", e),
        }
        on_complete(&result);
        result
    });
    Registration {
        work: abort,
        handle,
    }
}

async fn run_registration(
    provider: &dyn MessagingProvider,
    tokens: &dyn TokenSink,
    sender_id: &str,
) -> Result<String, PushError> {
    let availability = provider.availability().await?;
    if availability != Availability::Available {
        // Registration is still attempted.
        error!("Messaging service is not available: {:?}", availability);
    }

    let token = provider
        .register(sender_id)
        .await?
        .filter(|token| !token.is_empty())
        .ok_or(PushError::EmptyToken)?;

    info!("Push registration id received: {}", token);
    tokens.set_push_registration_token(&token);
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::ProviderInfo;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct MockTokens {
        tokens: Mutex<Vec<String>>,
    }

    impl TokenSink for MockTokens {
        fn set_push_registration_token(&self, token: &str) {
            self.tokens.lock().unwrap().push(token.to_string());
        }
    }

    enum Outcome {
        Token(&'static str),
        Empty,
        Io,
        Unavailable,
        Hang,
    }

    struct MockProvider {
        availability: Availability,
        outcome: Outcome,
        register_calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(availability: Availability, outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                availability,
                outcome,
                register_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MessagingProvider for MockProvider {
        async fn availability(&self) -> Result<Availability, PushError> {
            match self.outcome {
                Outcome::Unavailable => Err(PushError::ProviderUnavailable("missing".to_string())),
                _ => Ok(self.availability),
            }
        }

        async fn register(&self, sender_id: &str) -> Result<Option<String>, PushError> {
            assert_eq!(sender_id, "sender-1");
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Token(t) => Ok(Some(t.to_string())),
                Outcome::Empty => Ok(Some(String::new())),
                Outcome::Io => Err(PushError::Io("connection reset".to_string())),
                Outcome::Unavailable => unreachable!(),
                Outcome::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }

        fn provider_info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "mock".to_string(),
                version: "0".to_string(),
                endpoint: "mock://".to_string(),
            }
        }
    }

    #[tokio::test]
    async fn test_register_forwards_token() {
        let provider = MockProvider::new(Availability::Available, Outcome::Token("tok-9"));
        let tokens = Arc::new(MockTokens::default());

        let result = register_device(provider, tokens.clone(), "sender-1")
            .outcome()
            .await;

        assert_eq!(result.unwrap(), "tok-9");
        assert_eq!(*tokens.tokens.lock().unwrap(), vec!["tok-9".to_string()]);
    }

    #[tokio::test]
    async fn test_register_continues_when_service_unavailable() {
        let provider = MockProvider::new(Availability::ServiceMissing, Outcome::Token("tok-2"));
        let tokens = Arc::new(MockTokens::default());

        let result = register_device(provider.clone(), tokens.clone(), "sender-1")
            .outcome()
            .await;

        assert_eq!(result.unwrap(), "tok-2");
        assert_eq!(provider.register_calls.load(Ordering::SeqCst), 1);
        assert_eq!(tokens.tokens.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_failures_are_not_forwarded() {
        for outcome in [Outcome::Empty, Outcome::Io, Outcome::Unavailable] {
            let provider = MockProvider::new(Availability::Available, outcome);
            let tokens = Arc::new(MockTokens::default());

            let result = register_device(provider, tokens.clone(), "sender-1")
                .outcome()
                .await;

            assert!(result.is_err());
            assert!(tokens.tokens.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_completion_callback_receives_result() {
        let provider = MockProvider::new(Availability::Available, Outcome::Io);
        let tokens = Arc::new(MockTokens::default());
        let (tx, rx) = tokio::sync::oneshot::channel();

        register_device_with(provider, tokens, "sender-1", move |result| {
            let _ = tx.send(matches!(result, Err(PushError::Io(_))));
        });

        assert!(rx.await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_registration() {
        let provider = MockProvider::new(Availability::Available, Outcome::Hang);
        let tokens = Arc::new(MockTokens::default());

        let registration = register_device(provider, tokens.clone(), "sender-1");
        registration.cancel();

        assert!(matches!(
            registration.outcome().await,
            Err(PushError::Cancelled)
        ));
        assert!(tokens.tokens.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_runs_completion_callback() {
        let provider = MockProvider::new(Availability::Available, Outcome::Hang);
        let tokens = Arc::new(MockTokens::default());
        let (tx, rx) = tokio::sync::oneshot::channel();

        let registration =
            register_device_with(provider, tokens.clone(), "sender-1", move |result| {
                let _ = tx.send(matches!(result, Err(PushError::Cancelled)));
            });
        registration.cancel();

        assert!(matches!(
            registration.outcome().await,
            Err(PushError::Cancelled)
        ));
        assert!(rx.await.unwrap());
        assert!(tokens.tokens.lock().unwrap().is_empty());
    }
}
