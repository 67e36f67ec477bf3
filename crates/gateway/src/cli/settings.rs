use clap::Subcommand;
use gw_domain::models::SettingValue;
use gw_store::repo::settings::RECOGNISED_KEYS;
use gw_store::{now_ms, Store};

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Get { key: String },
    /// Sets a setting; the store always wins over env/CLI defaults once set.
    Set { key: String, value: String },
}

pub async fn run(store: &Store, cmd: SettingsCommand) -> anyhow::Result<()> {
    match cmd {
        SettingsCommand::Get { key } => match store.settings().get(&key).await? {
            Some(s) => println!("{}", display(&s.value)),
            None => println!("(unset)"),
        },
        SettingsCommand::Set { key, value } => {
            if !RECOGNISED_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "setting an unrecognised key; the router will ignore it");
            }
            store.settings().set(&key, &coerce(&value), now_ms()).await?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}

fn coerce(raw: &str) -> SettingValue {
    if let Ok(b) = raw.parse::<bool>() {
        return SettingValue::Bool(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return SettingValue::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return SettingValue::Float(f);
    }
    SettingValue::String(raw.to_string())
}

fn display(value: &SettingValue) -> String {
    match value {
        SettingValue::String(s) => s.clone(),
        SettingValue::Int(i) => i.to_string(),
        SettingValue::Bool(b) => b.to_string(),
        SettingValue::Float(f) => f.to_string(),
    }
}
