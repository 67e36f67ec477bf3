use gw_store::Store;

pub async fn run(store: &Store, provider: Option<String>, limit: i64) -> anyhow::Result<()> {
    let requests = store.requests().find_all(provider.as_deref(), limit, 0).await?;
    if requests.is_empty() {
        println!("(no requests)");
        return Ok(());
    }
    for r in requests {
        let response = store.responses().get_by_request_id(r.id).await?;
        let status = match &response {
            Some(resp) if resp.error.is_some() => "error",
            Some(_) => "ok",
            None => "pending",
        };
        println!(
            "{:<6} {:<36} {:<20} model={:<20} stream={:<5} {}",
            r.id,
            r.request_id,
            r.provider_id.unwrap_or_else(|| "-".into()),
            r.model,
            r.stream,
            status,
        );
    }
    Ok(())
}
