use gw_domain::capability::CapabilitySet;
use gw_domain::models::{ConfigValue, Model, Provider, ProviderConfig, ProviderModel, ProviderType};
use gw_store::Store;

async fn fresh_store() -> (Store, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gw.db");
    let store = Store::open(path.to_str().unwrap()).await.unwrap();
    (store, dir)
}

fn sample_provider(id: &str, priority: i64) -> Provider {
    Provider {
        id: id.to_string(),
        name: format!("{id}-name"),
        kind: ProviderType::Openai,
        enabled: true,
        priority,
        description: None,
        created_at: 1,
        updated_at: 1,
    }
}

#[tokio::test]
async fn idempotent_touch_extends_expiry_without_duplicating_rows() {
    let (store, _dir) = fresh_store().await;
    let sessions = store.sessions();

    let id = "abc123";
    let (s1, created1) = sessions.resolve_or_create(id, "Hello", 1_000, 30_000).await.unwrap();
    assert!(created1);
    let (s2, created2) = sessions.resolve_or_create(id, "Hello", 2_000, 30_000).await.unwrap();
    assert!(!created2);
    assert_eq!(s1.id, s2.id);
    assert!(s2.expires_at >= 2_000 + 30_000 - 1);

    let all = sessions.list(10, 0).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn cascade_integrity_on_provider_delete() {
    let (store, _dir) = fresh_store().await;
    let providers = store.providers();
    let models = store.models();

    providers.create(&sample_provider("p1", 1)).await.unwrap();
    providers
        .set_config(&ProviderConfig {
            provider_id: "p1".into(),
            key: "base_url".into(),
            value: ConfigValue::String("https://example.com".into()),
            is_sensitive: false,
        })
        .await
        .unwrap();
    models
        .create(&Model {
            id: "m1".into(),
            name: "m1".into(),
            description: None,
            capabilities: CapabilitySet(vec![]),
        })
        .await
        .unwrap();
    models
        .link(&ProviderModel {
            provider_id: "p1".into(),
            model_id: "m1".into(),
            is_default: true,
            config: None,
        })
        .await
        .unwrap();

    providers.delete("p1").await.unwrap();

    assert!(providers.get_configs("p1").await.unwrap().is_empty());
    assert!(models.links_for_provider("p1").await.unwrap().is_empty());
}

#[tokio::test]
async fn collision_resolution_picks_latest_created_at() {
    let (store, _dir) = fresh_store().await;
    let sessions = store.sessions();

    let (s1, _) = sessions.resolve_or_create("s1", "Hello", 1_000, 60_000).await.unwrap();
    sessions
        .set_conversation_hash(&s1.id, "hash-x", "reply one")
        .await
        .unwrap();

    let (s2, _) = sessions.resolve_or_create("s2", "Hello again", 2_000, 60_000).await.unwrap();
    sessions
        .set_conversation_hash(&s2.id, "hash-x", "reply two")
        .await
        .unwrap();

    // s2 was created later (created_at defaults to resolve_or_create's `now`).
    let winner = sessions.continue_by_conversation("hash-x", 3_000).await.unwrap().unwrap();
    assert_eq!(winner.id, s2.id);
}

#[tokio::test]
async fn at_most_one_default_model_per_provider() {
    let (store, _dir) = fresh_store().await;
    let providers = store.providers();
    let models = store.models();

    providers.create(&sample_provider("p1", 1)).await.unwrap();
    for mid in ["m1", "m2"] {
        models
            .create(&Model {
                id: mid.into(),
                name: mid.into(),
                description: None,
                capabilities: CapabilitySet(vec![]),
            })
            .await
            .unwrap();
    }

    models
        .link(&ProviderModel {
            provider_id: "p1".into(),
            model_id: "m1".into(),
            is_default: true,
            config: None,
        })
        .await
        .unwrap();
    models
        .link(&ProviderModel {
            provider_id: "p1".into(),
            model_id: "m2".into(),
            is_default: true,
            config: None,
        })
        .await
        .unwrap();

    let links = models.links_for_provider("p1").await.unwrap();
    let defaults: Vec<_> = links.iter().filter(|l| l.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].model_id, "m2");
}
