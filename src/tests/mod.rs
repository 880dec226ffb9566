
#[cfg(test)]
mod tests {
    use crate::config::DispatchOrdering;

    #[test]
    fn test_ordering_default() {
        assert_eq!(
            DispatchOrdering::default(),
            DispatchOrdering::ExactThenWildcard
        );
    }

    #[tokio::test]
    async fn test_create_dispatcher_smoke() {
        use crate::dispatcher::{create_dispatcher, sync_listener};
        use serde_json::json;

        let dispatcher = create_dispatcher();
        dispatcher
            .listen(
                "smoke.test",
                sync_listener(|_event| Ok(Some(json!("ok")))),
                0,
            )
            .await;

        let results = dispatcher.dispatch_named("smoke.test", Vec::new()).await;
        assert_eq!(results, vec![json!("ok")]);
    }
}
