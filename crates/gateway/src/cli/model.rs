use clap::Subcommand;
use gw_domain::capability::CapabilitySet;
use gw_domain::models::{Model, ProviderModel};
use gw_store::Store;

#[derive(Debug, Subcommand)]
pub enum ModelCommand {
    /// Register a model id the aggregated `/v1/models` listing can surface.
    Add {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    List,
    /// Link a model to a provider, optionally as that provider's default.
    Link {
        provider: String,
        model: String,
        #[arg(long)]
        default: bool,
    },
    Unlink { provider: String, model: String },
}

pub async fn run(store: &Store, cmd: ModelCommand) -> anyhow::Result<()> {
    match cmd {
        ModelCommand::Add { id, name, description } => {
            store
                .models()
                .create(&Model { id: id.clone(), name, description, capabilities: CapabilitySet::default() })
                .await?;
            println!("model '{id}' added");
        }
        ModelCommand::List => {
            for m in store.models().find_all().await? {
                println!("{:<24} {}", m.id, m.name);
            }
        }
        ModelCommand::Link { provider, model, default } => {
            store
                .models()
                .link(&ProviderModel { provider_id: provider.clone(), model_id: model.clone(), is_default: default, config: None })
                .await?;
            println!("linked '{model}' to provider '{provider}'{}", if default { " (default)" } else { "" });
        }
        ModelCommand::Unlink { provider, model } => {
            store.models().unlink(&provider, &model).await?;
            println!("unlinked '{model}' from provider '{provider}'");
        }
    }
    Ok(())
}
