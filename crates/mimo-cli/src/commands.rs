//! Maps parsed subcommands onto [`BdevService`] operations

use anyhow::Result;
use mimo_rpc::{BdevError, BdevService, CreateRaidBdevRequest};
use serde_json::Value;

use crate::cli::Commands;

pub async fn execute(svc: &BdevService, command: Commands) -> Result<Value, BdevError> {
    match command {
        Commands::Bdevs { name, timeout_ms } => {
            svc.get_bdevs(name.as_deref(), Some(timeout_ms)).await
        }
        Commands::NvmeAttach {
            name,
            traddr,
            trtype,
        } => svc.attach_nvme_controller(&name, &trtype, &traddr).await,
        Commands::NvmeDetach {
            name,
            trtype,
            traddr,
        } => {
            svc.detach_nvme_controller(&name, trtype.as_deref(), traddr.as_deref())
                .await
        }
        Commands::MallocCreate {
            total_size_mb,
            block_size,
            name,
            uuid,
        } => {
            svc.create_malloc_bdev(name.as_deref(), uuid.as_deref(), total_size_mb, block_size)
                .await
        }
        Commands::MallocDelete { name } => svc.delete_malloc_bdev(&name).await,
        Commands::RaidCreate {
            name,
            raid_level,
            base_bdevs,
            strip_size_kb,
            uuid,
            superblock,
        } => {
            let req = CreateRaidBdevRequest {
                name,
                raid_level,
                base_bdevs,
                strip_size_kb,
                uuid,
                superblock,
            };
            svc.create_raid_bdev(&req).await
        }
        Commands::RaidDelete { name } => svc.delete_raid_bdev(&name).await,
        Commands::RaidAddBase {
            raid_bdev,
            base_bdev,
        } => svc.add_raid_base_bdev(&raid_bdev, &base_bdev).await,
        Commands::RaidRemoveBase { name } => svc.remove_raid_base_bdev(&name).await,
        Commands::WipeSuperblock { name, size } => svc.wipe_superblock(&name, size).await,
    }
}

/// Indented JSON for stdout
pub fn render(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
